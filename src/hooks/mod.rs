pub mod context;
pub mod use_nominations;
pub mod use_query;
pub mod use_screen;
pub mod use_session;

pub use context::{use_app_context, AppContext, AppContextProvider};
pub use use_nominations::{use_nominations, UseNominationsHandle};
pub use use_query::{use_query, QueryState};
pub use use_screen::{use_screen, UseScreenHandle};
pub use use_session::{use_session, UseSessionHandle};

// ============================================================================
// STATE MODULE - State Management con Rc<RefCell> + notificaciones
// ============================================================================

pub mod nomination_state;
pub mod reactivity;
pub mod screen_state;
pub mod session_state;
pub mod team_state;

pub use nomination_state::*;
pub use reactivity::*;
pub use screen_state::*;
pub use session_state::*;
pub use team_state::*;

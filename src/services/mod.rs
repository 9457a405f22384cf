pub mod account_api;
pub mod api_client;
pub mod auth_service;
pub mod network_monitor;
pub mod push_service;
pub mod query_client;
pub mod rpc_error;
pub mod secure_store;
pub mod team_api;

pub use api_client::{HttpClient, UnaryClient};
pub use auth_service::AuthService;
pub use network_monitor::NetworkMonitor;
pub use query_client::{QueryClient, QueryOptions, Tag};
pub use rpc_error::{RpcCode, RpcError};
pub use secure_store::{BrowserStore, KeyValueStore};

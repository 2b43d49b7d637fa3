//! Document server for GymWay: accounts, sessions and JSON collections.

pub mod config;
pub mod email;
pub mod routes;
pub mod storage;
pub mod tokens;
pub mod users;

pub use config::ServerConfig;
pub use routes::{router, AppState, AuthUser};
pub use storage::{Document, DocumentStore, StorageError};
pub use users::{Account, AccountError, AccountStore};

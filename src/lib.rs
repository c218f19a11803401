pub mod error;
pub mod config;
pub mod storage;
pub mod identity;
pub mod gateway;
pub mod router;
pub mod app;
pub mod cli;

pub use app::App;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use identity::{Session, SessionStore, SharedSession};

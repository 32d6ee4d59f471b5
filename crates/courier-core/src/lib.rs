pub mod config;
pub mod error;
pub mod session;
pub mod types;

pub use config::CourierConfig;
pub use error::{CourierError, ErrorKind, Result};
pub use session::{SessionId, SessionStore};
pub use types::*;

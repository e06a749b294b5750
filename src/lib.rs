#![doc = include_str!("../README.md")]

pub mod alert;
pub mod api;
pub mod config;
pub mod console;
pub mod context;
pub mod error;
pub mod gate;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

// Re-exports for convenient access
pub use alert::{Alert, AlertChannel, AlertVariant};
#[cfg(feature = "http")]
pub use api::HttpBackend;
pub use api::{BackofficeApi, TaskProgress, TaskStatus, User, WhiteboardState, WhiteboardStatus};
pub use config::BackofficeConfig;
pub use console::Console;
pub use context::AppContext;
pub use error::Error;
pub use gate::{GateOutcome, GateState, PermissionGate, Rendered, UnmountHandle};
pub use session::{CookieStore, CredentialProvider, FileCookieStore, MemoryCookieStore, SessionStore};
pub use types::{AuthProvider, Permission, SessionId, UserCredentials, UserId};

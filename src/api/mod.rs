//! Typed client for the backoffice REST endpoints.
//!
//! All endpoints are `POST` with camelCase JSON bodies. The console talks to
//! them only through [`BackofficeApi`], so tests can swap the transport.

#[cfg(feature = "http")]
mod http;
mod traits;
mod types;

#[cfg(feature = "http")]
pub use http::HttpBackend;
pub use traits::BackofficeApi;
pub use types::{TaskProgress, TaskStatus, User, WhiteboardState, WhiteboardStatus};

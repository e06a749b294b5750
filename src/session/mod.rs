//! Session id and credential handling.
//!
//! Two cookies make up the console's durable state: `sessionId`, minted by
//! the backend on first use, and `userId`, written on sign-in. Both are
//! removed on sign-out.

mod cookies;
mod credentials;
mod store;

pub use cookies::{CookieStore, FileCookieStore, MemoryCookieStore};
pub use credentials::CredentialProvider;
pub use store::SessionStore;

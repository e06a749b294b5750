use std::future::Future;

use url::Url;

use super::types::{TaskStatus, User, WhiteboardStatus};
use crate::error::Error;
use crate::types::{AuthProvider, Permission, SessionId, UserCredentials, UserId};

/// The backoffice REST surface.
///
/// [`HttpBackend`](super::HttpBackend) is the production implementation;
/// tests substitute in-memory fakes.
///
/// Transport failures and malformed payloads are returned as errors.
/// A `false` from [`check_permission`](BackofficeApi::check_permission) is a
/// denial, not an error.
pub trait BackofficeApi: Send + Sync + 'static {
    /// `POST /auth/generate_session`: mint a new anonymous session.
    fn generate_session(&self) -> impl Future<Output = Result<SessionId, Error>> + Send;

    /// `POST /auth/login`: OAuth redirect URL for `session_id`.
    ///
    /// After the provider round-trip the backend redirects to `redirect_url`
    /// with `userId` and `sessionId` query parameters.
    fn login_url(
        &self,
        session_id: &SessionId,
        provider: AuthProvider,
        redirect_url: &Url,
    ) -> impl Future<Output = Result<Url, Error>> + Send;

    /// `POST /auth/check_permission`.
    fn check_permission(
        &self,
        credentials: &UserCredentials,
        permission: Permission,
    ) -> impl Future<Output = Result<bool, Error>> + Send;

    /// `POST /users/list`.
    fn list_users(
        &self,
        credentials: &UserCredentials,
    ) -> impl Future<Output = Result<Vec<User>, Error>> + Send;

    /// `POST /users/create`.
    fn create_user(
        &self,
        credentials: &UserCredentials,
        user: &User,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// `POST /users/delete`.
    fn delete_user(
        &self,
        credentials: &UserCredentials,
        user_id: &UserId,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// `POST /public_key/list`: names of the caller's public keys.
    fn list_keys(
        &self,
        credentials: &UserCredentials,
    ) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    /// `POST /public_key/add`.
    fn add_key(
        &self,
        credentials: &UserCredentials,
        key_name: &str,
        public_key: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// `POST /public_key/delete`.
    fn delete_key(
        &self,
        credentials: &UserCredentials,
        key_name: &str,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// `POST /tasks/get`, optionally narrowed to one workflow.
    fn get_tasks(
        &self,
        credentials: &UserCredentials,
        workflow_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<TaskStatus>, Error>> + Send;

    /// `POST /whiteboards/get`.
    fn get_whiteboards(
        &self,
        credentials: &UserCredentials,
    ) -> impl Future<Output = Result<Vec<WhiteboardStatus>, Error>> + Send;
}

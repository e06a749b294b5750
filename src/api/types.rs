//! Request and response schemas of the backoffice REST endpoints.
//!
//! Every response is deserialized strictly: a missing required field or an
//! unknown enum value is a decode error, never a default.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::types::{AuthProvider, Permission, SessionId, UserCredentials, UserId};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerateSessionResponse {
    pub(crate) session_id: SessionId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub(crate) session_id: &'a SessionId,
    pub(crate) provider: AuthProvider,
    pub(crate) redirect_url: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub(crate) redirect_url: String,
}

impl LoginResponse {
    /// Parsed provider URL; an unparsable one is a malformed response.
    pub(crate) fn into_url(self, operation: &'static str) -> Result<Url, Error> {
        Url::parse(&self.redirect_url).map_err(|source| Error::InvalidUrl { operation, source })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CheckPermissionRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    pub(crate) permission_name: Permission,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CheckPermissionResponse {
    pub(crate) granted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CredentialsRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreateUserRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    pub(crate) user: &'a User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteUserRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    pub(crate) user_id: &'a UserId,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ListUsersResponse {
    pub(crate) users: Vec<User>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AddKeyRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    pub(crate) key_name: &'a str,
    pub(crate) public_key: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeleteKeyRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    pub(crate) key_name: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListKeysResponse {
    pub(crate) key_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GetTasksRequest<'a> {
    pub(crate) credentials: &'a UserCredentials,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) workflow_id: Option<&'a str>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetTasksResponse {
    pub(crate) tasks: Vec<TaskStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct GetWhiteboardsResponse {
    pub(crate) whiteboards: Vec<WhiteboardStatus>,
}

/// Backoffice user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct User {
    pub user_id: UserId,
}

impl User {
    #[must_use]
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }
}

/// Execution phase of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum TaskProgress {
    Queue,
    Preparing,
    Executing,
    CommunicationCompleted,
    Suspended,
    Finished,
    Error,
}

/// Status of a task visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct TaskStatus {
    pub task_id: String,
    pub owner: UserId,
    pub status: TaskProgress,
    #[serde(default)]
    pub servant: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub zygote_name: Option<String>,
}

/// Lifecycle state of a whiteboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum WhiteboardState {
    Created,
    Completed,
    NotCompleted,
    Errored,
}

/// Status of a whiteboard visible to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct WhiteboardStatus {
    pub id: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub status: WhiteboardState,
}

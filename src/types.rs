use derive_more::{Display, From, Into};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Backoffice user identifier (opaque string, e.g. the GitHub login).
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Server-issued session identifier (opaque string).
///
/// Minted once per cookie profile by `/auth/generate_session` and bound to a
/// user after a successful OAuth login.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From, Into,
)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Credentials of an authenticated backoffice principal.
///
/// Guaranteed complete by construction: both fields are non-empty.
/// Use [`UserCredentials::new`] to create; deserialization applies the same check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCredentials", rename_all = "camelCase")]
pub struct UserCredentials {
    user_id: UserId,
    session_id: SessionId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCredentials {
    user_id: String,
    session_id: String,
}

impl UserCredentials {
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if either field is empty.
    pub fn new(user_id: impl Into<UserId>, session_id: impl Into<SessionId>) -> Result<Self, Error> {
        let user_id = user_id.into();
        let session_id = session_id.into();
        if user_id.0.is_empty() {
            return Err(Error::InvalidCredentials("empty user id".into()));
        }
        if session_id.0.is_empty() {
            return Err(Error::InvalidCredentials("empty session id".into()));
        }
        Ok(Self {
            user_id,
            session_id,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }
}

impl TryFrom<RawCredentials> for UserCredentials {
    type Error = Error;

    fn try_from(raw: RawCredentials) -> Result<Self, Self::Error> {
        Self::new(raw.user_id, raw.session_id)
    }
}

/// Named capability checked by `/auth/check_permission`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "&'static str")]
#[non_exhaustive]
pub enum Permission {
    UsersCreate,
    UsersDelete,
    UsersList,
    InternalPrivateApi,
    BackofficeInternal,
}

impl Permission {
    pub const ALL: [Permission; 5] = [
        Self::UsersCreate,
        Self::UsersDelete,
        Self::UsersList,
        Self::InternalPrivateApi,
        Self::BackofficeInternal,
    ];

    /// Wire name sent as `permissionName`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UsersCreate => "users.create",
            Self::UsersDelete => "users.delete",
            Self::UsersList => "users.list",
            Self::InternalPrivateApi => "internal.privateApi",
            Self::BackofficeInternal => "backoffice.internal.privateApi",
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::UnknownPermission(s.to_owned()))
    }
}

impl TryFrom<String> for Permission {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Permission> for &'static str {
    fn from(p: Permission) -> Self {
        p.as_str()
    }
}

/// External identity provider used for the OAuth login redirect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum AuthProvider {
    #[default]
    Github,
}

impl AuthProvider {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Github => "github",
        }
    }
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Self::Github),
            other => Err(Error::Config(format!("unsupported auth provider: {other}"))),
        }
    }
}

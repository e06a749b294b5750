use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::traits::BackofficeApi;
use super::types::{
    AddKeyRequest, CheckPermissionRequest, CheckPermissionResponse, CreateUserRequest,
    CredentialsRequest, DeleteKeyRequest, DeleteUserRequest, GenerateSessionResponse,
    GetTasksRequest, GetTasksResponse, GetWhiteboardsResponse, ListKeysResponse,
    ListUsersResponse, LoginRequest, LoginResponse, TaskStatus, User, WhiteboardStatus,
};
use crate::config::BackofficeConfig;
use crate::error::Error;
use crate::types::{AuthProvider, Permission, SessionId, UserCredentials, UserId};

/// `reqwest`-backed client for the backoffice REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: Url,
    http: reqwest::Client,
}

impl HttpBackend {
    /// Create a backend client for the URL resolved from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no backend URL can be resolved, or
    /// [`Error::Request`] if the HTTP client cannot be built.
    pub fn new(config: &BackofficeConfig) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            base_url: normalize_base(config.base_url()?),
            http: builder.build()?,
        })
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("endpoint {path}: {e}")))
    }

    async fn post<B>(
        &self,
        path: &str,
        operation: &'static str,
        body: &B,
    ) -> Result<reqwest::Response, Error>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(path)?;
        tracing::debug!(url = %url, operation, "Backoffice request");
        let response = self.http.post(url).json(body).send().await?;
        Self::ensure_success(response, operation).await
    }

    async fn post_json<B, T>(
        &self,
        path: &str,
        operation: &'static str,
        body: &B,
    ) -> Result<T, Error>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post(path, operation, body).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode { operation, source })
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        tracing::error!(operation, status, detail = %detail, "Backoffice request failed");
        Err(Error::Http {
            operation,
            status,
            detail,
        })
    }
}

/// `Url::join` replaces the last segment unless the base ends with `/`.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

impl BackofficeApi for HttpBackend {
    async fn generate_session(&self) -> Result<SessionId, Error> {
        let response: GenerateSessionResponse = self
            .post_json(
                "auth/generate_session",
                "generate session",
                &serde_json::json!({}),
            )
            .await?;
        Ok(response.session_id)
    }

    async fn login_url(
        &self,
        session_id: &SessionId,
        provider: AuthProvider,
        redirect_url: &Url,
    ) -> Result<Url, Error> {
        let body = LoginRequest {
            session_id,
            provider,
            redirect_url: redirect_url.as_str(),
        };
        let response: LoginResponse = self.post_json("auth/login", "login", &body).await?;
        response.into_url("login")
    }

    async fn check_permission(
        &self,
        credentials: &UserCredentials,
        permission: Permission,
    ) -> Result<bool, Error> {
        let body = CheckPermissionRequest {
            credentials,
            permission_name: permission,
        };
        let response: CheckPermissionResponse = self
            .post_json("auth/check_permission", "check permission", &body)
            .await?;
        Ok(response.granted)
    }

    async fn list_users(&self, credentials: &UserCredentials) -> Result<Vec<User>, Error> {
        let response: ListUsersResponse = self
            .post_json("users/list", "list users", &CredentialsRequest { credentials })
            .await?;
        Ok(response.users)
    }

    async fn create_user(&self, credentials: &UserCredentials, user: &User) -> Result<(), Error> {
        let body = CreateUserRequest { credentials, user };
        self.post("users/create", "create user", &body).await?;
        Ok(())
    }

    async fn delete_user(
        &self,
        credentials: &UserCredentials,
        user_id: &UserId,
    ) -> Result<(), Error> {
        let body = DeleteUserRequest {
            credentials,
            user_id,
        };
        self.post("users/delete", "delete user", &body).await?;
        Ok(())
    }

    async fn list_keys(&self, credentials: &UserCredentials) -> Result<Vec<String>, Error> {
        let response: ListKeysResponse = self
            .post_json(
                "public_key/list",
                "list public keys",
                &CredentialsRequest { credentials },
            )
            .await?;
        Ok(response.key_names)
    }

    async fn add_key(
        &self,
        credentials: &UserCredentials,
        key_name: &str,
        public_key: &str,
    ) -> Result<(), Error> {
        let body = AddKeyRequest {
            credentials,
            key_name,
            public_key,
        };
        self.post("public_key/add", "add public key", &body).await?;
        Ok(())
    }

    async fn delete_key(&self, credentials: &UserCredentials, key_name: &str) -> Result<(), Error> {
        let body = DeleteKeyRequest {
            credentials,
            key_name,
        };
        self.post("public_key/delete", "delete public key", &body)
            .await?;
        Ok(())
    }

    async fn get_tasks(
        &self,
        credentials: &UserCredentials,
        workflow_id: Option<&str>,
    ) -> Result<Vec<TaskStatus>, Error> {
        let body = GetTasksRequest {
            credentials,
            workflow_id,
        };
        let response: GetTasksResponse = self.post_json("tasks/get", "get tasks", &body).await?;
        Ok(response.tasks)
    }

    async fn get_whiteboards(
        &self,
        credentials: &UserCredentials,
    ) -> Result<Vec<WhiteboardStatus>, Error> {
        let response: GetWhiteboardsResponse = self
            .post_json(
                "whiteboards/get",
                "get whiteboards",
                &CredentialsRequest { credentials },
            )
            .await?;
        Ok(response.whiteboards)
    }
}

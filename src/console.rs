//! Operations behind the console views.
//!
//! Each operation resolves credentials (through a [`PermissionGate`] where
//! the view is permission-gated), performs one backend call, and turns any
//! failure into a danger alert. `None` means nothing should be shown; the
//! reason is already in the alert slot.

use url::Url;

use crate::api::{BackofficeApi, TaskStatus, User, WhiteboardStatus};
use crate::context::AppContext;
use crate::error::Error;
use crate::gate::{GateOutcome, PermissionGate};
use crate::types::{Permission, UserCredentials, UserId};

pub struct Console<A> {
    ctx: AppContext<A>,
}

impl<A: BackofficeApi> Console<A> {
    #[must_use]
    pub fn new(ctx: AppContext<A>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn context(&self) -> &AppContext<A> {
        &self.ctx
    }

    /// Credentials for a permission-gated view; `None` unless granted.
    async fn gated(&self, permission: Permission) -> Option<UserCredentials> {
        let mut gate = PermissionGate::new(&self.ctx, permission);
        match gate.resolve().await {
            GateOutcome::Granted => gate.credentials().cloned(),
            GateOutcome::Denied | GateOutcome::Failed | GateOutcome::Discarded => None,
        }
    }

    /// Credentials for a view that only requires sign-in.
    async fn signed_in(&self) -> Option<UserCredentials> {
        match self.ctx.credentials().credentials().await {
            Ok(Some(credentials)) => Some(credentials),
            Ok(None) => {
                self.ctx
                    .alerts()
                    .show_danger("Not signed in", "Sign in to continue");
                None
            }
            Err(e) => self.report("resolve credentials", Err(e)),
        }
    }

    fn report<T>(&self, operation: &'static str, result: Result<T, Error>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!(error = %e, operation, "Console operation failed");
                self.ctx.alerts().show_danger("Error", e.to_string());
                None
            }
        }
    }

    // ── Users ──────────────────────────────────────────────────────────

    pub async fn users(&self) -> Option<Vec<User>> {
        let credentials = self.gated(Permission::UsersList).await?;
        let result = self.ctx.api().list_users(&credentials).await;
        self.report("list users", result)
    }

    pub async fn create_user(&self, user_id: impl Into<UserId>) -> Option<()> {
        let user = User::new(user_id);
        let credentials = self.gated(Permission::UsersCreate).await?;
        let result = self.ctx.api().create_user(&credentials, &user).await;
        self.report("create user", result)?;
        self.ctx
            .alerts()
            .show_success("User created", format!("User {} created", user.user_id));
        Some(())
    }

    pub async fn delete_user(&self, user_id: impl Into<UserId>) -> Option<()> {
        let user_id = user_id.into();
        let credentials = self.gated(Permission::UsersDelete).await?;
        let result = self.ctx.api().delete_user(&credentials, &user_id).await;
        self.report("delete user", result)?;
        self.ctx
            .alerts()
            .show_success("User deleted", format!("User {user_id} deleted"));
        Some(())
    }

    // ── Public keys ────────────────────────────────────────────────────

    pub async fn public_keys(&self) -> Option<Vec<String>> {
        let credentials = self.signed_in().await?;
        let result = self.ctx.api().list_keys(&credentials).await;
        self.report("list public keys", result)
    }

    pub async fn add_public_key(&self, key_name: &str, public_key: &str) -> Option<()> {
        let credentials = self.signed_in().await?;
        let result = self
            .ctx
            .api()
            .add_key(&credentials, key_name, public_key)
            .await;
        self.report("add public key", result)?;
        self.ctx
            .alerts()
            .show_success("Key added", format!("Key {key_name} added"));
        Some(())
    }

    pub async fn delete_public_key(&self, key_name: &str) -> Option<()> {
        let credentials = self.signed_in().await?;
        let result = self.ctx.api().delete_key(&credentials, key_name).await;
        self.report("delete public key", result)?;
        self.ctx
            .alerts()
            .show_success("Key deleted", format!("Key {key_name} deleted"));
        Some(())
    }

    // ── Tasks & whiteboards ────────────────────────────────────────────

    pub async fn tasks(&self, workflow_id: Option<&str>) -> Option<Vec<TaskStatus>> {
        let credentials = self.signed_in().await?;
        let result = self.ctx.api().get_tasks(&credentials, workflow_id).await;
        self.report("get tasks", result)
    }

    pub async fn whiteboards(&self) -> Option<Vec<WhiteboardStatus>> {
        let credentials = self.signed_in().await?;
        let result = self.ctx.api().get_whiteboards(&credentials).await;
        self.report("get whiteboards", result)
    }

    // ── Login ──────────────────────────────────────────────────────────

    /// Provider URL the login button sends the browser to.
    pub async fn login_url(&self) -> Option<Url> {
        let result = self.request_login_url().await;
        self.report("login", result)
    }

    async fn request_login_url(&self) -> Result<Url, Error> {
        let session_id = self.ctx.sessions().session_id().await?;
        let redirect = self.ctx.config().login_redirect()?;
        self.ctx
            .api()
            .login_url(&session_id, self.ctx.config().auth_provider(), &redirect)
            .await
    }

    /// Handle the backend's post-login redirect to `redirect`.
    pub async fn complete_login(&self, redirect: &Url) -> Option<UserCredentials> {
        let result = self.ctx.credentials().complete_login(redirect).await;
        self.report("complete login", result)
    }

    pub async fn sign_out(&self) -> Option<()> {
        let result = self.ctx.credentials().sign_out(|| {}).await;
        self.report("sign out", result)
    }
}

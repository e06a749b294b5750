//! Fail-closed permission gating.
//!
//! A [`PermissionGate`] walks `Pending → Checking → Resolved` once per mount.
//! Progress is published on a watch channel, see [`PermissionGate::subscribe`].
//! Guarded content is produced only for [`GateOutcome::Granted`]; denial,
//! errors, and results that arrive after the gate was unmounted all render
//! nothing of the guarded content.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::api::BackofficeApi;
use crate::context::AppContext;
use crate::types::{Permission, UserCredentials};

/// Alert header raised when a permission is denied.
pub const PERMISSION_DENIED: &str = "Permission denied";

/// Where a gate is in its check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Credentials not resolved yet.
    Pending,
    /// Credentials resolved, permission check in flight.
    Checking,
    Resolved(GateOutcome),
}

/// Final answer of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Granted,
    /// Backend said no, or nobody is signed in.
    Denied,
    /// Credentials or the permission check errored.
    Failed,
    /// The gate was unmounted before the check finished.
    Discarded,
}

/// What a gate renders in place of its guarded content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    /// Denial placeholder.
    Denied,
    /// Nothing at all (error, discarded or unresolved).
    Empty,
}

impl<T> Rendered<T> {
    #[must_use]
    pub fn content(self) -> Option<T> {
        match self {
            Self::Content(t) => Some(t),
            Self::Denied | Self::Empty => None,
        }
    }
}

/// Marks a gate as no longer displayed so a late result is dropped.
#[derive(Debug, Clone)]
pub struct UnmountHandle(Arc<AtomicBool>);

impl UnmountHandle {
    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Guards content behind a single permission.
pub struct PermissionGate<A> {
    ctx: AppContext<A>,
    permission: Permission,
    state: watch::Sender<GateState>,
    credentials: Option<UserCredentials>,
    mounted: Arc<AtomicBool>,
}

impl<A: BackofficeApi> PermissionGate<A> {
    #[must_use]
    pub fn new(ctx: &AppContext<A>, permission: Permission) -> Self {
        Self {
            ctx: ctx.clone(),
            permission,
            state: watch::Sender::new(GateState::Pending),
            credentials: None,
            mounted: Arc::new(AtomicBool::new(true)),
        }
    }

    #[must_use]
    pub fn permission(&self) -> Permission {
        self.permission
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        *self.state.borrow()
    }

    /// Watch the gate move through its states while a check runs.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<GateState> {
        self.state.subscribe()
    }

    /// Credentials the permission was granted to. `None` unless granted.
    #[must_use]
    pub fn credentials(&self) -> Option<&UserCredentials> {
        match self.state() {
            GateState::Resolved(GateOutcome::Granted) => self.credentials.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn unmount_handle(&self) -> UnmountHandle {
        UnmountHandle(self.mounted.clone())
    }

    fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Run the check, or return the outcome of the one already run.
    pub async fn resolve(&mut self) -> GateOutcome {
        if let GateState::Resolved(outcome) = self.state() {
            return outcome;
        }
        let outcome = self.run().await;
        self.state.send_replace(GateState::Resolved(outcome));
        outcome
    }

    /// Forget the previous outcome and check again.
    pub async fn refresh(&mut self) -> GateOutcome {
        self.state.send_replace(GateState::Pending);
        self.credentials = None;
        self.resolve().await
    }

    async fn run(&mut self) -> GateOutcome {
        let permission = self.permission;
        let alerts = self.ctx.alerts();

        self.state.send_replace(GateState::Pending);
        let credentials = self.ctx.credentials().credentials().await;
        if !self.is_mounted() {
            return self.discard();
        }

        let credentials = match credentials {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                tracing::warn!(permission = %permission, "Not signed in, permission denied");
                alerts.show_danger(PERMISSION_DENIED, format!("Sign in to access {permission}"));
                return GateOutcome::Denied;
            }
            Err(e) => {
                tracing::error!(error = %e, permission = %permission, "Credentials unavailable");
                alerts.show_danger("Error", e.to_string());
                return GateOutcome::Failed;
            }
        };

        self.state.send_replace(GateState::Checking);
        let result = self.ctx.check_permission(&credentials, permission).await;
        if !self.is_mounted() {
            return self.discard();
        }

        match result {
            Ok(true) => {
                self.credentials = Some(credentials);
                GateOutcome::Granted
            }
            Ok(false) => {
                tracing::warn!(
                    user_id = %credentials.user_id(),
                    permission = %permission,
                    "Permission denied"
                );
                alerts.show_danger(
                    PERMISSION_DENIED,
                    format!("{} lacks {permission}", credentials.user_id()),
                );
                GateOutcome::Denied
            }
            Err(e) => {
                tracing::error!(error = %e, permission = %permission, "Permission check failed");
                alerts.show_danger("Error", e.to_string());
                GateOutcome::Failed
            }
        }
    }

    fn discard(&self) -> GateOutcome {
        tracing::debug!(permission = %self.permission, "Gate unmounted, result discarded");
        GateOutcome::Discarded
    }

    /// Resolve, then build the guarded content only if granted.
    pub async fn render<T>(&mut self, content: impl FnOnce(&UserCredentials) -> T) -> Rendered<T> {
        match self.resolve().await {
            GateOutcome::Granted => match &self.credentials {
                Some(credentials) => Rendered::Content(content(credentials)),
                None => Rendered::Empty,
            },
            GateOutcome::Denied => Rendered::Denied,
            GateOutcome::Failed | GateOutcome::Discarded => Rendered::Empty,
        }
    }
}

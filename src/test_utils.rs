use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use url::Url;

use crate::api::{BackofficeApi, TaskProgress, TaskStatus, User, WhiteboardState, WhiteboardStatus};
use crate::error::Error;
use crate::types::{AuthProvider, Permission, SessionId, UserCredentials, UserId};

/// In-memory backoffice counting every call it receives.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    mint_calls: AtomicUsize,
    check_calls: AtomicUsize,
    mint_failures: AtomicUsize,
    mint_delay: Mutex<Option<Duration>>,
    check_delay: Mutex<Option<Duration>>,
    granted: Mutex<HashSet<Permission>>,
    check_unavailable: Mutex<bool>,
    users: Mutex<Vec<User>>,
    keys: Mutex<BTreeMap<String, String>>,
}

fn unavailable(operation: &'static str) -> Error {
    Error::Http {
        operation,
        status: 503,
        detail: "backend unavailable".into(),
    }
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn grant(self, permission: Permission) -> Self {
        self.inner.granted.lock().insert(permission);
        self
    }

    pub(crate) fn with_mint_delay(self, delay: Duration) -> Self {
        *self.inner.mint_delay.lock() = Some(delay);
        self
    }

    pub(crate) fn with_check_delay(self, delay: Duration) -> Self {
        *self.inner.check_delay.lock() = Some(delay);
        self
    }

    /// Fail the next `n` mint requests.
    pub(crate) fn failing_mints(self, n: usize) -> Self {
        self.inner.mint_failures.store(n, Ordering::SeqCst);
        self
    }

    pub(crate) fn with_check_unavailable(self) -> Self {
        *self.inner.check_unavailable.lock() = true;
        self
    }

    pub(crate) fn with_users(self, users: &[&str]) -> Self {
        *self.inner.users.lock() = users.iter().map(|u| User::new(*u)).collect();
        self
    }

    pub(crate) fn mint_calls(&self) -> usize {
        self.inner.mint_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn check_calls(&self) -> usize {
        self.inner.check_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn user_ids(&self) -> Vec<String> {
        self.inner
            .users
            .lock()
            .iter()
            .map(|u| u.user_id.to_string())
            .collect()
    }
}

impl BackofficeApi for FakeBackend {
    async fn generate_session(&self) -> Result<SessionId, Error> {
        let n = self.inner.mint_calls.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = *self.inner.mint_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failures = self.inner.mint_failures.load(Ordering::SeqCst);
        if failures > 0 {
            self.inner.mint_failures.store(failures - 1, Ordering::SeqCst);
            return Err(unavailable("generate session"));
        }
        Ok(SessionId(format!("session-{n}")))
    }

    async fn login_url(
        &self,
        session_id: &SessionId,
        provider: AuthProvider,
        redirect_url: &Url,
    ) -> Result<Url, Error> {
        let mut url: Url = "https://github.com/login/oauth/authorize"
            .parse()
            .map_err(|e| Error::Config(format!("{e}")))?;
        url.query_pairs_mut()
            .append_pair("provider", provider.as_str())
            .append_pair("state", &format!("{session_id},{redirect_url}"));
        Ok(url)
    }

    async fn check_permission(
        &self,
        _credentials: &UserCredentials,
        permission: Permission,
    ) -> Result<bool, Error> {
        self.inner.check_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.inner.check_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if *self.inner.check_unavailable.lock() {
            return Err(unavailable("check permission"));
        }
        Ok(self.inner.granted.lock().contains(&permission))
    }

    async fn list_users(&self, _credentials: &UserCredentials) -> Result<Vec<User>, Error> {
        Ok(self.inner.users.lock().clone())
    }

    async fn create_user(&self, _credentials: &UserCredentials, user: &User) -> Result<(), Error> {
        let mut users = self.inner.users.lock();
        if users.iter().any(|u| u.user_id == user.user_id) {
            return Err(Error::Http {
                operation: "create user",
                status: 400,
                detail: "INVALID_ARGUMENT".into(),
            });
        }
        users.push(user.clone());
        Ok(())
    }

    async fn delete_user(
        &self,
        _credentials: &UserCredentials,
        user_id: &UserId,
    ) -> Result<(), Error> {
        self.inner.users.lock().retain(|u| &u.user_id != user_id);
        Ok(())
    }

    async fn list_keys(&self, _credentials: &UserCredentials) -> Result<Vec<String>, Error> {
        Ok(self.inner.keys.lock().keys().cloned().collect())
    }

    async fn add_key(
        &self,
        _credentials: &UserCredentials,
        key_name: &str,
        public_key: &str,
    ) -> Result<(), Error> {
        self.inner
            .keys
            .lock()
            .insert(key_name.to_string(), public_key.to_string());
        Ok(())
    }

    async fn delete_key(&self, _credentials: &UserCredentials, key_name: &str) -> Result<(), Error> {
        match self.inner.keys.lock().remove(key_name) {
            Some(_) => Ok(()),
            None => Err(Error::Http {
                operation: "delete public key",
                status: 404,
                detail: "NOT_FOUND".into(),
            }),
        }
    }

    async fn get_tasks(
        &self,
        credentials: &UserCredentials,
        workflow_id: Option<&str>,
    ) -> Result<Vec<TaskStatus>, Error> {
        let task_id = workflow_id.map_or_else(|| "task-1".to_string(), |w| format!("{w}-task-1"));
        Ok(vec![TaskStatus {
            task_id,
            owner: credentials.user_id().clone(),
            status: TaskProgress::Executing,
            servant: None,
            explanation: None,
            zygote_name: Some("train".into()),
        }])
    }

    async fn get_whiteboards(
        &self,
        _credentials: &UserCredentials,
    ) -> Result<Vec<WhiteboardStatus>, Error> {
        Ok(vec![WhiteboardStatus {
            id: "wb-1".into(),
            namespace: Some("default".into()),
            tags: vec!["nightly".into()],
            status: WhiteboardState::Completed,
        }])
    }
}

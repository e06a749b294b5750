use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use url::Url;

use super::store::SessionStore;
use crate::api::BackofficeApi;
use crate::error::Error;
use crate::types::{SessionId, UserCredentials};

/// Current user's credentials, cached in memory and mirrored into cookies.
///
/// Many consumers may call [`credentials`](Self::credentials) at once; each
/// resolves independently and only the session mint is serialized.
/// Sign-in and sign-out bump an epoch, and a resolution that started before
/// the bump is never cached.
pub struct CredentialProvider<A> {
    sessions: Arc<SessionStore<A>>,
    cached: RwLock<Option<UserCredentials>>,
    epoch: AtomicU64,
}

impl<A: BackofficeApi> CredentialProvider<A> {
    pub fn new(sessions: Arc<SessionStore<A>>) -> Self {
        Self {
            sessions,
            cached: RwLock::new(None),
            epoch: AtomicU64::new(0),
        }
    }

    /// Credentials of the signed-in user, or `None` when nobody is signed in.
    ///
    /// A cached value is returned without I/O. Otherwise the session id is
    /// resolved (minting one if needed) and combined with the stored user id.
    ///
    /// # Errors
    ///
    /// Propagates session mint and cookie storage failures.
    pub async fn credentials(&self) -> Result<Option<UserCredentials>, Error> {
        loop {
            let cached = self.cached.read().clone();
            if cached.is_some() {
                return Ok(cached);
            }

            let epoch = self.epoch.load(Ordering::SeqCst);
            let (session_id, user_id) = self.sessions.resolve().await?;
            let credentials = user_id
                .map(|user_id| UserCredentials::new(user_id, session_id.clone()))
                .transpose()?;

            let mut cache = self.cached.write();
            if self.epoch.load(Ordering::SeqCst) != epoch {
                tracing::debug!("Sign-in state changed while resolving, retrying");
                continue;
            }
            match &credentials {
                Some(credentials) => *cache = Some(credentials.clone()),
                None => tracing::debug!(session_id = %session_id, "No signed-in user"),
            }
            return Ok(credentials);
        }
    }

    /// Cached credentials without touching storage.
    #[must_use]
    pub fn cached(&self) -> Option<UserCredentials> {
        self.cached.read().clone()
    }

    /// Store `credentials` durably and in memory, then call `on_complete`.
    ///
    /// Waits for an in-flight session mint, so the minted id never overwrites
    /// the signed-in one. `on_complete` runs exactly once, and only after
    /// both cookies were written.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the cookies cannot be written; the
    /// in-memory cache is left untouched and `on_complete` is not called.
    pub async fn sign_in(
        &self,
        credentials: UserCredentials,
        on_complete: impl FnOnce(),
    ) -> Result<(), Error> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.sessions.persist(&credentials).await?;
        tracing::info!(
            user_id = %credentials.user_id(),
            session_id = %credentials.session_id(),
            "Signed in"
        );
        *self.cached.write() = Some(credentials);
        on_complete();
        Ok(())
    }

    /// Forget the credentials in memory and in storage, then call `on_complete`.
    ///
    /// Like [`sign_in`](Self::sign_in) this waits for an in-flight mint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the cookies cannot be removed. The
    /// in-memory cache is cleared regardless.
    pub async fn sign_out(&self, on_complete: impl FnOnce()) -> Result<(), Error> {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        let previous = self.cached.write().take();
        self.sessions.clear().await?;
        if let Some(previous) = previous {
            tracing::info!(user_id = %previous.user_id(), "Signed out");
        }
        on_complete();
        Ok(())
    }

    /// Finish an OAuth login from the redirect the backend sends back.
    ///
    /// The backend appends `userId` and `sessionId` query parameters to the
    /// login redirect URL once the provider confirmed the user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Login`] if either parameter is missing or empty, and
    /// propagates storage failures from [`sign_in`](Self::sign_in).
    pub async fn complete_login(&self, redirect: &Url) -> Result<UserCredentials, Error> {
        let mut user_id = None;
        let mut session_id = None;
        for (key, value) in redirect.query_pairs() {
            match key.as_ref() {
                "userId" => user_id = Some(value.into_owned()),
                "sessionId" => session_id = Some(value.into_owned()),
                _ => {}
            }
        }

        let user_id = user_id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Login("redirect is missing userId".into()))?;
        let session_id = session_id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Login("redirect is missing sessionId".into()))?;

        let credentials = UserCredentials::new(user_id, SessionId(session_id))?;
        self.sign_in(credentials.clone(), || {}).await?;
        Ok(credentials)
    }
}

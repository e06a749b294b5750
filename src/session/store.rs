use std::sync::Arc;

use tokio::sync::Mutex;

use super::cookies::{CookieStore, SESSION_ID_COOKIE, USER_ID_COOKIE};
use crate::api::BackofficeApi;
use crate::error::Error;
use crate::types::{SessionId, UserCredentials, UserId};

/// Name of the lock guarding the session mint.
const SESSION_LOCK: &str = "sessionId";

/// Durable `sessionId`/`userId` storage with a lazily minted session id.
pub struct SessionStore<A> {
    api: Arc<A>,
    cookies: Arc<dyn CookieStore>,
    mint_lock: Mutex<()>,
}

impl<A: BackofficeApi> SessionStore<A> {
    pub fn new(api: Arc<A>, cookies: Arc<dyn CookieStore>) -> Self {
        Self {
            api,
            cookies,
            mint_lock: Mutex::new(()),
        }
    }

    /// The durable session id, minted by the backend on first use.
    ///
    /// Read, mint and persist all run under one lock, so concurrent callers
    /// issue at most one `generate_session` request and all observe the id
    /// that was actually stored. The guard drops on every path, so a failed
    /// mint leaves the next call free to retry.
    ///
    /// # Errors
    ///
    /// Propagates the mint failure or a cookie storage failure.
    pub async fn session_id(&self) -> Result<SessionId, Error> {
        let _guard = self.mint_lock.lock().await;
        self.load_or_mint().await
    }

    /// Session id and signed-in user id, read together under the session lock.
    ///
    /// # Errors
    ///
    /// Same as [`session_id`](Self::session_id).
    pub(crate) async fn resolve(&self) -> Result<(SessionId, Option<UserId>), Error> {
        let _guard = self.mint_lock.lock().await;
        let session_id = self.load_or_mint().await?;
        Ok((session_id, self.user_id()?))
    }

    // Caller holds `mint_lock`.
    async fn load_or_mint(&self) -> Result<SessionId, Error> {
        if let Some(existing) = self.cookies.get(SESSION_ID_COOKIE)? {
            return Ok(SessionId(existing));
        }

        tracing::debug!(lock = SESSION_LOCK, "No session id stored, minting");
        let session_id = self.api.generate_session().await.map_err(|e| {
            tracing::error!(error = %e, "Session mint failed");
            e
        })?;
        if session_id.as_str().is_empty() {
            return Err(Error::InvalidCredentials(
                "backend minted an empty session id".into(),
            ));
        }

        // A cookie written while the mint was in flight wins over the minted id.
        if let Some(existing) = self.cookies.get(SESSION_ID_COOKIE)? {
            tracing::debug!(session_id = %existing, "Session id stored during mint, keeping it");
            return Ok(SessionId(existing));
        }
        self.cookies.set(SESSION_ID_COOKIE, session_id.as_str())?;

        tracing::info!(session_id = %session_id, "Session id minted");
        Ok(session_id)
    }

    /// Signed-in user id, if one is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the cookie store cannot be read.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        Ok(self.cookies.get(USER_ID_COOKIE)?.map(UserId))
    }

    /// Persist both halves of `credentials`. Waits for an in-flight mint.
    pub(crate) async fn persist(&self, credentials: &UserCredentials) -> Result<(), Error> {
        let _guard = self.mint_lock.lock().await;
        self.cookies
            .set(USER_ID_COOKIE, credentials.user_id().as_str())?;
        self.cookies
            .set(SESSION_ID_COOKIE, credentials.session_id().as_str())
    }

    /// Remove both cookies. Waits for an in-flight mint.
    pub(crate) async fn clear(&self) -> Result<(), Error> {
        let _guard = self.mint_lock.lock().await;
        self.cookies.remove(USER_ID_COOKIE)?;
        self.cookies.remove(SESSION_ID_COOKIE)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::session::cookies::{FileCookieStore, MemoryCookieStore};
    use crate::test_utils::FakeBackend;

    fn store(api: &FakeBackend, cookies: &Arc<MemoryCookieStore>) -> Arc<SessionStore<FakeBackend>> {
        Arc::new(SessionStore::new(Arc::new(api.clone()), cookies.clone()))
    }

    #[tokio::test]
    async fn mints_once_and_persists() {
        let api = FakeBackend::new();
        let cookies = Arc::new(MemoryCookieStore::default());
        let store = store(&api, &cookies);

        let first = store.session_id().await.unwrap();
        let second = store.session_id().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(api.mint_calls(), 1);
        assert_eq!(
            cookies.get(SESSION_ID_COOKIE).unwrap().as_deref(),
            Some(first.as_str())
        );
    }

    #[tokio::test]
    async fn stored_session_skips_backend() {
        let api = FakeBackend::new();
        let cookies = Arc::new(MemoryCookieStore::default());
        cookies.set(SESSION_ID_COOKIE, "session-existing").unwrap();

        let id = store(&api, &cookies).session_id().await.unwrap();

        assert_eq!(id.as_str(), "session-existing");
        assert_eq!(api.mint_calls(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_mint() {
        let api = FakeBackend::new().with_mint_delay(Duration::from_millis(20));
        let cookies = Arc::new(MemoryCookieStore::default());
        let store = store(&api, &cookies);

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.session_id().await })
            })
            .collect();

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(api.mint_calls(), 1);
        assert!(ids.iter().all(|id| id == &ids[0]));
        assert_eq!(
            cookies.get(SESSION_ID_COOKIE).unwrap().as_deref(),
            Some(ids[0].as_str())
        );
    }

    #[tokio::test]
    async fn failed_mint_releases_lock_and_retries() {
        let api = FakeBackend::new().failing_mints(1);
        let cookies = Arc::new(MemoryCookieStore::default());
        let store = store(&api, &cookies);

        assert!(store.session_id().await.is_err());
        assert_eq!(cookies.get(SESSION_ID_COOKIE).unwrap(), None);

        let id = store.session_id().await.unwrap();
        assert_eq!(api.mint_calls(), 2);
        assert_eq!(id.as_str(), "session-2");
    }

    #[tokio::test]
    async fn persist_and_clear_touch_both_cookies() {
        let api = FakeBackend::new();
        let cookies = Arc::new(MemoryCookieStore::default());
        let store = store(&api, &cookies);
        let creds = UserCredentials::new("alice", "session-9").unwrap();

        store.persist(&creds).await.unwrap();
        assert_eq!(store.user_id().unwrap(), Some(UserId::from("alice")));
        assert_eq!(
            cookies.get(SESSION_ID_COOKIE).unwrap().as_deref(),
            Some("session-9")
        );

        store.clear().await.unwrap();
        assert_eq!(store.user_id().unwrap(), None);
        assert_eq!(cookies.get(SESSION_ID_COOKIE).unwrap(), None);
    }

    #[tokio::test]
    async fn persist_waits_for_inflight_mint() {
        let api = FakeBackend::new().with_mint_delay(Duration::from_millis(50));
        let cookies = Arc::new(MemoryCookieStore::default());
        let store = store(&api, &cookies);
        let creds = UserCredentials::new("alice", "session-login").unwrap();

        let (minted, persisted) = tokio::join!(store.session_id(), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            store.persist(&creds).await
        });

        assert_eq!(minted.unwrap().as_str(), "session-1");
        persisted.unwrap();
        assert_eq!(api.mint_calls(), 1);
        // the later sign-in write is the one left in storage
        assert_eq!(
            cookies.get(SESSION_ID_COOKIE).unwrap().as_deref(),
            Some("session-login")
        );
    }

    /// Cookie store that slips a session id in on the first read, as an
    /// external writer would while a mint is in flight.
    struct LateWriter {
        inner: MemoryCookieStore,
        reads: std::sync::atomic::AtomicUsize,
    }

    impl CookieStore for LateWriter {
        fn get(&self, name: &str) -> Result<Option<String>, Error> {
            let value = self.inner.get(name)?;
            let n = self
                .reads
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 && name == SESSION_ID_COOKIE {
                self.inner.set(SESSION_ID_COOKIE, "session-external")?;
            }
            Ok(value)
        }

        fn set(&self, name: &str, value: &str) -> Result<(), Error> {
            self.inner.set(name, value)
        }

        fn remove(&self, name: &str) -> Result<(), Error> {
            self.inner.remove(name)
        }
    }

    #[tokio::test]
    async fn mint_keeps_cookie_written_meanwhile() {
        let api = FakeBackend::new();
        let cookies = Arc::new(LateWriter {
            inner: MemoryCookieStore::default(),
            reads: std::sync::atomic::AtomicUsize::new(0),
        });
        let store = SessionStore::new(Arc::new(api.clone()), cookies.clone());

        let id = store.session_id().await.unwrap();

        assert_eq!(api.mint_calls(), 1);
        assert_eq!(id.as_str(), "session-external");
        assert_eq!(
            cookies.get(SESSION_ID_COOKIE).unwrap().as_deref(),
            Some("session-external")
        );
    }

    #[tokio::test]
    async fn failed_cookie_write_is_retried_on_next_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cookies.json");
        let api = FakeBackend::new();
        let cookies = Arc::new(FileCookieStore::open(&path).unwrap());
        let store = SessionStore::new(Arc::new(api.clone()), cookies.clone());

        std::fs::create_dir(dir.path().join("cookies.json.tmp")).unwrap();
        assert!(matches!(store.session_id().await, Err(Error::Storage(_))));
        assert_eq!(cookies.get(SESSION_ID_COOKIE).unwrap(), None);

        std::fs::remove_dir(dir.path().join("cookies.json.tmp")).unwrap();
        let id = store.session_id().await.unwrap();
        assert_eq!(id.as_str(), "session-2");
        assert_eq!(api.mint_calls(), 2);
    }
}

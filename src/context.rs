use std::sync::Arc;

use crate::alert::AlertChannel;
use crate::api::BackofficeApi;
use crate::config::BackofficeConfig;
use crate::error::Error;
use crate::session::{CookieStore, CredentialProvider, SessionStore};
use crate::types::{Permission, UserCredentials};

/// Everything the console shares between its views.
///
/// Built once at application start and handed to every consumer; cloning is
/// cheap and all clones share the same session, credentials and alert slot.
pub struct AppContext<A> {
    config: Arc<BackofficeConfig>,
    api: Arc<A>,
    sessions: Arc<SessionStore<A>>,
    credentials: Arc<CredentialProvider<A>>,
    alerts: Arc<AlertChannel>,
}

// Manual Clone: avoid derive adding an `A: Clone` bound.
impl<A> Clone for AppContext<A> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            api: self.api.clone(),
            sessions: self.sessions.clone(),
            credentials: self.credentials.clone(),
            alerts: self.alerts.clone(),
        }
    }
}

impl<A: BackofficeApi> AppContext<A> {
    pub fn new(config: BackofficeConfig, api: A, cookies: Arc<dyn CookieStore>) -> Self {
        let api = Arc::new(api);
        let sessions = Arc::new(SessionStore::new(api.clone(), cookies));
        let credentials = Arc::new(CredentialProvider::new(sessions.clone()));
        tracing::info!(origin = %config.origin(), "Backoffice context started");
        Self {
            config: Arc::new(config),
            api,
            sessions,
            credentials,
            alerts: Arc::new(AlertChannel::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &BackofficeConfig {
        &self.config
    }

    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore<A> {
        &self.sessions
    }

    #[must_use]
    pub fn credentials(&self) -> &CredentialProvider<A> {
        &self.credentials
    }

    #[must_use]
    pub fn alerts(&self) -> &AlertChannel {
        &self.alerts
    }

    /// Ask the backend whether `credentials` hold `permission`.
    ///
    /// One request per call; nothing is cached. A transport failure is an
    /// error and must not be read as a denial.
    ///
    /// # Errors
    ///
    /// Propagates the backend error.
    pub async fn check_permission(
        &self,
        credentials: &UserCredentials,
        permission: Permission,
    ) -> Result<bool, Error> {
        let granted = self.api.check_permission(credentials, permission).await?;
        tracing::debug!(
            user_id = %credentials.user_id(),
            permission = %permission,
            granted,
            "Permission checked"
        );
        Ok(granted)
    }

    /// Tear the context down: any open alert is dismissed.
    pub fn shutdown(self) {
        self.alerts.close();
        tracing::info!("Backoffice context stopped");
    }
}

#[cfg(feature = "http")]
impl AppContext<crate::api::HttpBackend> {
    /// Build the production context from `config`.
    ///
    /// Cookies go to the configured cookie file, or stay in memory when none
    /// is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no backend URL can be resolved and
    /// [`Error::Storage`] if the cookie file cannot be opened.
    pub fn from_config(config: BackofficeConfig) -> Result<Self, Error> {
        let api = crate::api::HttpBackend::new(&config)?;
        let cookies: Arc<dyn CookieStore> = match config.cookie_file() {
            Some(path) => Arc::new(crate::session::FileCookieStore::open(path)?),
            None => Arc::new(crate::session::MemoryCookieStore::new(
                config.cookie_ttl_days(),
            )),
        };
        Ok(Self::new(config, api, cookies))
    }
}

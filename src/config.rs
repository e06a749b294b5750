use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::types::AuthProvider;

/// Backend port used when the console is served over plain HTTP.
pub const HTTP_BACKEND_PORT: u16 = 8080;
/// Backend port used when the console is served over HTTPS.
pub const HTTPS_BACKEND_PORT: u16 = 8443;

/// Backoffice console configuration.
///
/// Required field (`origin`) is a constructor parameter; everything else has
/// a default and a `with_*` override.
///
/// ```rust,ignore
/// use backoffice::BackofficeConfig;
///
/// let config = BackofficeConfig::new("https://backoffice.example.com".parse()?)
///     .with_cookie_ttl_days(7);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BackofficeConfig {
    pub(crate) origin: Url,
    pub(crate) base_url: Option<Url>,
    pub(crate) cookie_ttl_days: i64,
    pub(crate) cookie_file: Option<PathBuf>,
    pub(crate) request_timeout: Option<Duration>,
    pub(crate) auth_provider: AuthProvider,
    pub(crate) login_redirect: Option<Url>,
}

impl BackofficeConfig {
    /// Create config for a console served from `origin`.
    #[must_use]
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            base_url: None,
            cookie_ttl_days: 365,
            cookie_file: None,
            request_timeout: None,
            auth_provider: AuthProvider::default(),
            login_redirect: None,
        }
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `BACKOFFICE_ORIGIN`: origin the console is served from
    ///
    /// # Optional env vars
    /// - `BACKOFFICE_BASE_URL`: explicit backend URL (skips port resolution)
    /// - `BACKOFFICE_COOKIE_TTL_DAYS`: lifetime of the `userId`/`sessionId` cookies
    /// - `BACKOFFICE_COOKIE_FILE`: persist cookies to this JSON file
    /// - `BACKOFFICE_TIMEOUT_SECS`: per-request timeout
    /// - `BACKOFFICE_AUTH_PROVIDER`: OAuth provider name (default `github`)
    /// - `BACKOFFICE_LOGIN_REDIRECT`: page the OAuth callback returns to
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if required env vars are missing or values are invalid.
    pub fn from_env() -> Result<Self, Error> {
        let origin = std::env::var("BACKOFFICE_ORIGIN")
            .map_err(|_| Error::Config("BACKOFFICE_ORIGIN is required".into()))?;
        let origin: Url = origin
            .parse()
            .map_err(|e| Error::Config(format!("BACKOFFICE_ORIGIN: {e}")))?;

        let mut config = Self::new(origin);

        if let Ok(url_str) = std::env::var("BACKOFFICE_BASE_URL") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("BACKOFFICE_BASE_URL: {e}")))?;
            config = config.with_base_url(url);
        }
        if let Ok(days) = std::env::var("BACKOFFICE_COOKIE_TTL_DAYS") {
            let days: i64 = days
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("BACKOFFICE_COOKIE_TTL_DAYS: {e}")))?;
            config = config.with_cookie_ttl_days(days);
        }
        if let Ok(path) = std::env::var("BACKOFFICE_COOKIE_FILE") {
            config = config.with_cookie_file(path);
        }
        if let Ok(secs) = std::env::var("BACKOFFICE_TIMEOUT_SECS") {
            let secs: u64 = secs
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("BACKOFFICE_TIMEOUT_SECS: {e}")))?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }
        if let Ok(provider) = std::env::var("BACKOFFICE_AUTH_PROVIDER") {
            config = config.with_auth_provider(provider.parse()?);
        }
        if let Ok(url_str) = std::env::var("BACKOFFICE_LOGIN_REDIRECT") {
            let url: Url = url_str
                .parse()
                .map_err(|e| Error::Config(format!("BACKOFFICE_LOGIN_REDIRECT: {e}")))?;
            config = config.with_login_redirect(url);
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    #[must_use]
    pub fn with_cookie_ttl_days(mut self, days: i64) -> Self {
        self.cookie_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_cookie_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.cookie_file = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_auth_provider(mut self, provider: AuthProvider) -> Self {
        self.auth_provider = provider;
        self
    }

    #[must_use]
    pub fn with_login_redirect(mut self, url: Url) -> Self {
        self.login_redirect = Some(url);
        self
    }

    /// Origin the console is served from.
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Backend base URL.
    ///
    /// An explicit override wins. Otherwise the origin's host is kept and the
    /// port follows the scheme: `http` uses 8080, `https` uses 8443.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the origin is neither `http` nor `https`.
    pub fn base_url(&self) -> Result<Url, Error> {
        if let Some(url) = &self.base_url {
            return Ok(url.clone());
        }
        let port = match self.origin.scheme() {
            "http" => HTTP_BACKEND_PORT,
            "https" => HTTPS_BACKEND_PORT,
            other => {
                return Err(Error::Config(format!(
                    "cannot resolve backend for origin scheme '{other}'"
                )));
            }
        };
        let mut url = self.origin.clone();
        url.set_port(Some(port))
            .map_err(|()| Error::Config(format!("origin has no host: {}", self.origin)))?;
        url.set_path("/");
        url.set_query(None);
        url.set_fragment(None);
        Ok(url)
    }

    /// Page the OAuth callback redirects back to (default: `<origin>/login`).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the default cannot be derived from the origin.
    pub fn login_redirect(&self) -> Result<Url, Error> {
        match &self.login_redirect {
            Some(url) => Ok(url.clone()),
            None => self
                .origin
                .join("/login")
                .map_err(|e| Error::Config(format!("login redirect: {e}"))),
        }
    }

    #[must_use]
    pub fn cookie_ttl_days(&self) -> i64 {
        self.cookie_ttl_days
    }

    #[must_use]
    pub fn cookie_file(&self) -> Option<&std::path::Path> {
        self.cookie_file.as_deref()
    }

    #[must_use]
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    #[must_use]
    pub fn auth_provider(&self) -> AuthProvider {
        self.auth_provider
    }
}

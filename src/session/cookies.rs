use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cookie::{Cookie, CookieJar, SameSite};
use parking_lot::Mutex;
use time::Duration;

use crate::error::Error;

pub(crate) const USER_ID_COOKIE: &str = "userId";
pub(crate) const SESSION_ID_COOKIE: &str = "sessionId";

/// Durable client-side storage for the console cookies.
///
/// Empty values are treated as absent by every implementation.
pub trait CookieStore: Send + Sync + 'static {
    /// Read a cookie value.
    fn get(&self, name: &str) -> Result<Option<String>, Error>;

    /// Write a cookie value, replacing any previous one.
    fn set(&self, name: &str, value: &str) -> Result<(), Error>;

    /// Delete a cookie. Deleting a missing cookie succeeds.
    fn remove(&self, name: &str) -> Result<(), Error>;
}

/// Build a console cookie.
pub(crate) fn console_cookie(name: &str, value: &str, ttl_days: i64) -> Cookie<'static> {
    Cookie::build((name.to_string(), value.to_string()))
        .same_site(SameSite::Lax)
        .path("/".to_string())
        .max_age(Duration::days(ttl_days))
        .build()
}

/// Build a removal cookie.
pub(crate) fn clear_cookie(name: &str) -> Cookie<'static> {
    Cookie::build((name.to_string(), ""))
        .path("/".to_string())
        .max_age(Duration::ZERO)
        .build()
}

/// In-memory cookie jar. Lives as long as the process.
pub struct MemoryCookieStore {
    jar: Mutex<CookieJar>,
    ttl_days: i64,
}

impl MemoryCookieStore {
    #[must_use]
    pub fn new(ttl_days: i64) -> Self {
        Self {
            jar: Mutex::new(CookieJar::new()),
            ttl_days,
        }
    }
}

impl Default for MemoryCookieStore {
    fn default() -> Self {
        Self::new(365)
    }
}

impl CookieStore for MemoryCookieStore {
    fn get(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self
            .jar
            .lock()
            .get(name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty()))
    }

    fn set(&self, name: &str, value: &str) -> Result<(), Error> {
        self.jar
            .lock()
            .add(console_cookie(name, value, self.ttl_days));
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), Error> {
        self.jar.lock().remove(clear_cookie(name));
        Ok(())
    }
}

/// Cookie jar persisted as a JSON object `{name: value}`.
///
/// The whole file is rewritten through a `<path>.tmp` sibling and a rename
/// on every mutation. A failed write leaves the jar unchanged.
pub struct FileCookieStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileCookieStore {
    /// Open the jar at `path`. A missing file is an empty jar.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file exists but cannot be read or parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let entries = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::Storage(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Storage(format!("{}: {e}", path.display()))),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling the jar is written to before the rename.
    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), Error> {
        let bytes = serde_json::to_vec_pretty(entries)
            .map_err(|e| Error::Storage(e.to_string()))?;
        let tmp = self.tmp_path();
        fs::write(&tmp, bytes)
            .and_then(|()| fs::rename(&tmp, &self.path))
            .map_err(|e| Error::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, name: &str) -> Result<Option<String>, Error> {
        Ok(self
            .entries
            .lock()
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned())
    }

    // The in-memory map only changes once the new contents are on disk.
    fn set(&self, name: &str, value: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock();
        let mut updated = entries.clone();
        updated.insert(name.to_string(), value.to_string());
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), Error> {
        let mut entries = self.entries.lock();
        if !entries.contains_key(name) {
            return Ok(());
        }
        let mut updated = entries.clone();
        updated.remove(name);
        self.flush(&updated)?;
        *entries = updated;
        Ok(())
    }
}

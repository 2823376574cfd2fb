//! Cache stores for the discovered catalog.

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::{Arc, LazyLock, Mutex},
    time::{Duration, Instant, SystemTime, UNIX_EPOCH},
};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    tokio::fs,
};

use crate::{Error, Result, catalog::Catalog};

/// The single key under which the discovery result is cached.
pub const CACHE_KEY: &str = "quiver_skills";

/// Name of the implicit default store.
pub const DEFAULT_STORE: &str = "memory";

/// Key/value storage for catalogs with expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// The cached catalog, or `None` when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Catalog>>;
    async fn put(&self, key: &str, catalog: &Catalog, ttl: Duration) -> Result<()>;
    async fn forget(&self, key: &str) -> Result<()>;
}

// ── Memory ──────────────────────────────────────────────────────────────────

struct MemoryEntry {
    catalog: Catalog,
    expires_at: Instant,
}

/// In-process store. Shared by every discovery facade holding the same `Arc`.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, MemoryEntry>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Catalog>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.catalog.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            },
            None => Ok(None),
        }
    }

    async fn put(&self, key: &str, catalog: &Catalog, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), MemoryEntry {
            catalog: catalog.clone(),
            expires_at: Instant::now() + ttl,
        });
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }
}

// ── File ────────────────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize)]
struct FileEntry {
    /// Unix timestamp (seconds) after which the entry is stale.
    expires_at: u64,
    catalog: Catalog,
}

/// One JSON file per key, written atomically. Survives process restarts.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// `<data_dir>/cache`.
    #[must_use]
    pub fn default_path() -> Self {
        Self::new(quiver_config::data_dir().join("cache"))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl CacheStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Catalog>> {
        let path = self.path_for(key);
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Ok(None);
        }
        let data = fs::read_to_string(&path).await?;
        let entry: FileEntry = serde_json::from_str(&data)?;
        if entry.expires_at <= now_secs() {
            let _ = fs::remove_file(&path).await;
            return Ok(None);
        }
        Ok(Some(entry.catalog))
    }

    async fn put(&self, key: &str, catalog: &Catalog, ttl: Duration) -> Result<()> {
        fs::create_dir_all(&self.dir).await?;
        let entry = FileEntry {
            expires_at: now_secs().saturating_add(ttl.as_secs()),
            catalog: catalog.clone(),
        };
        let json = serde_json::to_string(&entry)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json.as_bytes()).await?;
        fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn forget(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Named stores ────────────────────────────────────────────────────────────

/// Registry of cache stores addressable by name.
///
/// `memory` is always present and is the default; `file` is registered by
/// [`CacheStores::with_defaults`].
pub struct CacheStores {
    stores: HashMap<String, Arc<dyn CacheStore>>,
}

impl Default for CacheStores {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStores {
    /// Only the in-memory default store.
    #[must_use]
    pub fn new() -> Self {
        let mut stores: HashMap<String, Arc<dyn CacheStore>> = HashMap::new();
        stores.insert(DEFAULT_STORE.to_string(), Arc::new(MemoryStore::new()));
        Self { stores }
    }

    /// Memory plus a file store under `<data_dir>/cache`.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut stores = Self::new();
        stores.register("file", Arc::new(FileStore::default_path()));
        stores
    }

    /// The process-wide stores ([`CacheStores::with_defaults`]) used by
    /// every facade built from configuration.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        static SHARED: LazyLock<Arc<CacheStores>> =
            LazyLock::new(|| Arc::new(CacheStores::with_defaults()));
        Arc::clone(&SHARED)
    }

    pub fn register(&mut self, name: impl Into<String>, store: Arc<dyn CacheStore>) {
        self.stores.insert(name.into(), store);
    }

    /// Look up a store. `None` or a blank name selects the default store; an
    /// unknown name is a configuration error.
    pub fn resolve(&self, name: Option<&str>) -> Result<Arc<dyn CacheStore>> {
        let name = name.map(str::trim).filter(|n| !n.is_empty()).unwrap_or(DEFAULT_STORE);
        self.stores.get(name).cloned().ok_or_else(|| {
            let mut known: Vec<&str> = self.stores.keys().map(String::as_str).collect();
            known.sort_unstable();
            Error::invalid_configuration(format!(
                "unknown cache store \"{name}\" (available: {})",
                known.join(", ")
            ))
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::types::{SkillDefinition, SkillSource},
    };

    fn catalog() -> Catalog {
        vec![SkillDefinition::new("Cached", "d", SkillSource::Local)].into()
    }

    #[tokio::test]
    async fn memory_store_round_trip_and_expiry() {
        let store = MemoryStore::new();
        store.put(CACHE_KEY, &catalog(), Duration::from_secs(60)).await.unwrap();
        assert!(store.get(CACHE_KEY).await.unwrap().unwrap().contains("cached"));

        store.put(CACHE_KEY, &catalog(), Duration::ZERO).await.unwrap();
        assert!(store.get(CACHE_KEY).await.unwrap().is_none());

        store.put(CACHE_KEY, &catalog(), Duration::from_secs(60)).await.unwrap();
        store.forget(CACHE_KEY).await.unwrap();
        assert!(store.get(CACHE_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_round_trip_and_expiry() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::new(tmp.path().join("cache"));
        assert!(store.get(CACHE_KEY).await.unwrap().is_none());

        store.put(CACHE_KEY, &catalog(), Duration::from_secs(60)).await.unwrap();
        assert!(tmp.path().join("cache/quiver_skills.json").is_file());
        assert!(!tmp.path().join("cache/quiver_skills.json.tmp").exists());

        // A second store on the same directory sees the entry.
        let other = FileStore::new(tmp.path().join("cache"));
        assert_eq!(other.get(CACHE_KEY).await.unwrap(), Some(catalog()));

        store.put(CACHE_KEY, &catalog(), Duration::ZERO).await.unwrap();
        assert!(store.get(CACHE_KEY).await.unwrap().is_none());

        store.forget(CACHE_KEY).await.unwrap();
        store.forget(CACHE_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_entries() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("quiver_skills.json"), "{not json").unwrap();
        let store = FileStore::new(tmp.path().to_path_buf());
        assert!(store.get(CACHE_KEY).await.is_err());
    }

    #[test]
    fn named_store_resolution() {
        let stores = CacheStores::new();
        assert!(stores.resolve(None).is_ok());
        assert!(stores.resolve(Some("  ")).is_ok());
        assert!(stores.resolve(Some("memory")).is_ok());

        let err = stores.resolve(Some("redis")).err().unwrap();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(err.to_string().contains("redis"));

        let mut stores = CacheStores::new();
        stores.register("shared", Arc::new(MemoryStore::new()));
        assert!(stores.resolve(Some("shared")).is_ok());
    }
}

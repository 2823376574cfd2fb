//! Cached discovery facade over a [`SkillScanner`].

use std::{path::Path, sync::Arc, time::Duration};

use {
    quiver_config::SkillsConfig,
    tracing::{debug, warn},
};

use crate::{
    Result,
    cache::{CACHE_KEY, CacheStore, CacheStores},
    catalog::Catalog,
    discover::{SkillScanner, SourceScanner},
    parse::{self, SKILL_FILE},
    slug::slugify,
    types::SkillDefinition,
};

/// Caching policy for [`SkillDiscovery`].
#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub ttl: Duration,
    /// Store name; `None` selects the default store.
    pub store: Option<String>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: Duration::from_secs(3600),
            store: None,
        }
    }
}

impl CacheSettings {
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }
}

/// Discovers skills through the scanner and caches the result set.
pub struct SkillDiscovery {
    scanner: Arc<dyn SkillScanner>,
    cache: CacheSettings,
    stores: Arc<CacheStores>,
}

impl SkillDiscovery {
    #[must_use]
    pub fn new(
        scanner: Arc<dyn SkillScanner>,
        cache: CacheSettings,
        stores: Arc<CacheStores>,
    ) -> Self {
        Self {
            scanner,
            cache,
            stores,
        }
    }

    /// Wire a [`SourceScanner`] and the process-wide [`CacheStores::shared`]
    /// stores from configuration, so every facade sees the same cache.
    pub fn from_config(config: &SkillsConfig) -> Result<Self> {
        Self::from_config_with_stores(config, CacheStores::shared())
    }

    /// Like [`SkillDiscovery::from_config`] with an explicit store registry.
    pub fn from_config_with_stores(
        config: &SkillsConfig,
        stores: Arc<CacheStores>,
    ) -> Result<Self> {
        let scanner = SourceScanner::from_config(config)?;
        let cache = CacheSettings {
            enabled: config.cache.enabled,
            ttl: Duration::from_secs(config.cache.ttl_secs),
            store: config.cache.store_name().map(str::to_string),
        };
        Ok(Self::new(Arc::new(scanner), cache, stores))
    }

    #[must_use]
    pub fn cache_settings(&self) -> &CacheSettings {
        &self.cache
    }

    /// The configured store, or `None` when caching is off.
    fn store(&self) -> Result<Option<Arc<dyn CacheStore>>> {
        if !self.cache.enabled {
            return Ok(None);
        }
        self.stores.resolve(self.cache.store.as_deref()).map(Some)
    }

    /// All available skills, served from the cache when possible.
    ///
    /// Only an unknown cache store is an error; store I/O failures count as
    /// a miss.
    pub async fn discover(&self) -> Result<Catalog> {
        let Some(store) = self.store()? else {
            return Ok(self.scanner.scan().await);
        };

        match store.get(CACHE_KEY).await {
            Ok(Some(catalog)) => {
                debug!(count = catalog.len(), "skill cache hit");
                return Ok(catalog);
            },
            Ok(None) => debug!("skill cache miss"),
            Err(e) => warn!(error = %e, "failed to read skill cache, rescanning"),
        }

        let catalog = self.scanner.scan().await;
        if let Err(e) = store.put(CACHE_KEY, &catalog, self.cache.ttl).await {
            warn!(error = %e, "failed to write skill cache");
        }
        Ok(catalog)
    }

    /// Drop the cached result and scan again.
    pub async fn fresh(&self) -> Result<Catalog> {
        self.clear_cache().await?;
        self.discover().await
    }

    /// Forget the cached result. No-op when caching is disabled.
    pub async fn clear_cache(&self) -> Result<()> {
        if let Some(store) = self.store()?
            && let Err(e) = store.forget(CACHE_KEY).await
        {
            warn!(error = %e, "failed to clear skill cache");
        }
        Ok(())
    }

    /// Resolve a skill directory path, a slug, or a name.
    ///
    /// An existing directory containing `SKILL.md` is parsed directly;
    /// otherwise the identifier is looked up in the catalog as given, then by
    /// its slug.
    pub async fn resolve(&self, name_or_path: &str) -> Result<Option<SkillDefinition>> {
        let dir = Path::new(name_or_path);
        if dir.is_dir() && dir.join(SKILL_FILE).is_file() {
            return Ok(match parse::read_definition_dir(dir) {
                Ok(skill) if skill.slug().is_empty() => {
                    warn!(path = %dir.display(), "skill name has no slug, ignoring directory");
                    None
                },
                Ok(skill) => Some(skill),
                Err(e) => {
                    warn!(path = %dir.display(), error = %e, "failed to parse skill directory");
                    None
                },
            });
        }

        let catalog = self.discover().await?;
        if let Some(skill) = catalog.get(name_or_path) {
            return Ok(Some(skill.clone()));
        }
        Ok(catalog.get(&slugify(name_or_path)).cloned())
    }
}

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    Error, Result,
    env_subst::substitute_env,
    schema::{DiscoveryMode, QuiverConfig},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["quiver.toml", "quiver.yaml", "quiver.yml", "quiver.json"];

/// Load config from the given path (any supported format), then apply
/// environment overrides.
pub fn load_config(path: &Path) -> Result<QuiverConfig> {
    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let raw = substitute_env(&raw);
    let mut config = parse_config(&raw, path)?;
    apply_env_overrides(&mut config);
    Ok(config)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./quiver.{toml,yaml,yml,json}` (project-local)
/// 2. `<config dir>/quiver.{toml,yaml,yml,json}` (user-global)
///
/// Returns defaults (with env overrides) if no file is found or it fails to load.
pub fn discover_and_load() -> QuiverConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    let mut config = QuiverConfig::default();
    apply_env_overrides(&mut config);
    config
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    for name in CONFIG_FILENAMES {
        let p = PathBuf::from(name);
        if p.exists() {
            return Some(p);
        }
    }

    let dir = config_dir()?;
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

/// Returns the user-global config directory (e.g. `~/.config/quiver/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "quiver").map(|d| d.config_dir().to_path_buf())
}

/// Returns the data directory used for on-disk caches.
///
/// Falls back to `./.quiver` when no home directory can be determined.
pub fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "quiver")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".quiver"))
}

/// Apply `QUIVER_SKILLS_*` environment variables on top of `config`.
pub fn apply_env_overrides(config: &mut QuiverConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut QuiverConfig, lookup: impl Fn(&str) -> Option<String>) {
    let skills = &mut config.skills;

    if let Some(raw) = lookup("QUIVER_SKILLS_ENABLED") {
        set_bool("QUIVER_SKILLS_ENABLED", &raw, &mut skills.enabled);
    }
    if let Some(raw) = lookup("QUIVER_SKILLS_INCLUSION_MODE") {
        skills.inclusion_mode = raw;
    }
    if let Some(raw) = lookup("QUIVER_SKILLS_MODE") {
        match DiscoveryMode::parse(&raw) {
            Some(mode) => skills.mode = mode,
            None => warn!(value = %raw, "ignoring invalid QUIVER_SKILLS_MODE"),
        }
    }
    if let Some(url) = lookup("QUIVER_SKILLS_REMOTE_URL") {
        skills.remote.url = Some(url);
    }
    if let Some(token) = lookup("QUIVER_SKILLS_REMOTE_TOKEN") {
        skills.remote.token = Some(token.into());
    }
    if let Some(raw) = lookup("QUIVER_SKILLS_CACHE_ENABLED") {
        set_bool("QUIVER_SKILLS_CACHE_ENABLED", &raw, &mut skills.cache.enabled);
    }
    if let Some(raw) = lookup("QUIVER_SKILLS_CACHE_TTL") {
        match raw.trim().parse::<u64>() {
            Ok(ttl) => skills.cache.ttl_secs = ttl,
            Err(e) => warn!(value = %raw, error = %e, "ignoring invalid QUIVER_SKILLS_CACHE_TTL"),
        }
    }
    if let Some(raw) = lookup("QUIVER_SKILLS_CACHE_STORE") {
        let name = raw.trim();
        skills.cache.store = (!name.is_empty()).then(|| name.to_string());
    }
}

fn set_bool(var: &str, raw: &str, target: &mut bool) {
    match parse_bool(raw) {
        Some(value) => *target = value,
        None => warn!(var, value = %raw, "ignoring non-boolean value"),
    }
}

/// Lenient boolean parsing for env values.
pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

fn parse_config(raw: &str, path: &Path) -> Result<QuiverConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

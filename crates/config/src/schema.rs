/// Config schema types for the skills engine.
use std::path::PathBuf;

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuiverConfig {
    pub skills: SkillsConfig,
}

/// Where skills are discovered from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Scan the configured directories only.
    #[default]
    Local,
    /// Fetch from the remote endpoint only.
    Remote,
    /// Scan directories, then merge the remote catalog on top.
    Dual,
}

impl DiscoveryMode {
    #[must_use]
    pub fn includes_local(self) -> bool {
        matches!(self, Self::Local | Self::Dual)
    }

    #[must_use]
    pub fn includes_remote(self) -> bool {
        matches!(self, Self::Remote | Self::Dual)
    }

    /// Parse a mode name as written in env overrides (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "remote" => Some(Self::Remote),
            "dual" => Some(Self::Dual),
            _ => None,
        }
    }
}

impl std::fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
            Self::Dual => write!(f, "dual"),
        }
    }
}

/// Skills engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillsConfig {
    /// Whether the skills system is enabled.
    pub enabled: bool,
    /// Default inclusion mode for loaded skills: `lite` (name + description)
    /// or `full` (complete instructions). `lazy`/`eager` are accepted aliases.
    /// Kept as a string so an invalid value can be reported and replaced at use time.
    pub inclusion_mode: String,
    /// Directories scanned for `<dir>/<skill>/SKILL.md`, in override order.
    pub paths: Vec<PathBuf>,
    /// Which sources take part in discovery.
    pub mode: DiscoveryMode,
    pub remote: RemoteConfig,
    pub cache: CacheConfig,
    /// Skills the agent component loads on first use.
    pub auto_load: Vec<String>,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inclusion_mode: "lite".into(),
            paths: vec![PathBuf::from(".quiver/skills")],
            mode: DiscoveryMode::Local,
            remote: RemoteConfig::default(),
            cache: CacheConfig::default(),
            auto_load: Vec::new(),
        }
    }
}

/// Remote skill catalog endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Catalog URL; a `GET` must return `{ "skills": [...] }`.
    pub url: Option<String>,
    /// Bearer token sent in the `Authorization` header.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token: Option<Secret<String>>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            timeout_secs: 5,
        }
    }
}

/// Discovery cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Time-to-live of the cached discovery result, in seconds.
    pub ttl_secs: u64,
    /// Named cache store. `None` uses the default in-process store.
    pub store: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 3600,
            store: None,
        }
    }
}

impl CacheConfig {
    /// The configured store name, treating blank strings as "use the default".
    #[must_use]
    pub fn store_name(&self) -> Option<&str> {
        self.store
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::slug::slugify;

/// Extensions listed by [`SkillDefinition::reference_files`].
const REFERENCE_EXTENSIONS: &[&str] = &["md", "txt", "yaml", "yml", "json"];

/// Where a skill definition came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillSource {
    /// A `SKILL.md` inside a scanned directory.
    Local,
    /// An entry of the remote catalog.
    Remote,
}

impl std::fmt::Display for SkillSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Remote => f.write_str("remote"),
        }
    }
}

/// How a loaded skill is rendered into the system prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InclusionMode {
    /// Name and description only.
    #[default]
    Lite,
    /// Complete instructions.
    Full,
}

impl InclusionMode {
    /// Parse a configured or user-supplied mode. `lazy` and `eager` are
    /// accepted as aliases for `lite` and `full`.
    #[must_use]
    pub fn parse_flexible(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "lite" | "lazy" => Some(Self::Lite),
            "full" | "eager" => Some(Self::Full),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lite => "lite",
            Self::Full => "full",
        }
    }
}

impl std::fmt::Display for InclusionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed skill: frontmatter fields plus the markdown instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub instructions: String,
    /// Tool identifiers resolved by the registry's tool resolver.
    #[serde(default)]
    pub tools: Vec<String>,
    /// Keywords that suggest this skill, matched case-insensitively.
    #[serde(default)]
    pub triggers: Vec<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub mcp: Vec<serde_json::Value>,
    #[serde(default)]
    pub constraints: Vec<serde_json::Value>,
    pub source: SkillSource,
    /// Directory holding `SKILL.md`. Only meaningful for local skills.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_path: Option<PathBuf>,
}

impl SkillDefinition {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        source: SkillSource,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            instructions: String::new(),
            tools: Vec::new(),
            triggers: Vec::new(),
            version: None,
            mcp: Vec::new(),
            constraints: Vec::new(),
            source,
            base_path: None,
        }
    }

    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = instructions.into();
        self
    }

    #[must_use]
    pub fn with_tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn with_triggers(mut self, triggers: Vec<String>) -> Self {
        self.triggers = triggers;
        self
    }

    /// Attach the skill directory. Ignored for remote skills.
    #[must_use]
    pub fn with_base_path(mut self, base_path: Option<PathBuf>) -> Self {
        self.base_path = match self.source {
            SkillSource::Local => base_path,
            SkillSource::Remote => None,
        };
        self
    }

    /// The skill directory, always `None` for remote skills.
    #[must_use]
    pub fn base_path(&self) -> Option<&Path> {
        match self.source {
            SkillSource::Local => self.base_path.as_deref(),
            SkillSource::Remote => None,
        }
    }

    #[must_use]
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }

    #[must_use]
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Whether any trigger occurs in `text`, ignoring case.
    #[must_use]
    pub fn matches_trigger(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        self.triggers
            .iter()
            .map(|t| t.trim().to_lowercase())
            .any(|t| !t.is_empty() && haystack.contains(&t))
    }

    /// Relative paths (forward slashes, sorted) of the auxiliary files shipped
    /// with a local skill. Hidden files and the root `SKILL.md` are skipped.
    #[must_use]
    pub fn reference_files(&self) -> Vec<String> {
        let Some(base) = self.base_path().filter(|p| p.is_dir()) else {
            return Vec::new();
        };

        let mut files: Vec<String> = walkdir::WalkDir::new(base)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!(
                        base = %base.display(),
                        error = %e,
                        "skipping unreadable entry"
                    );
                    None
                },
            })
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .map(str::to_ascii_lowercase)
                    .is_some_and(|ext| REFERENCE_EXTENSIONS.contains(&ext.as_str()))
            })
            .filter_map(|entry| {
                let relative = entry.path().strip_prefix(base).ok()?;
                let parts: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                Some(parts.join("/"))
            })
            .filter(|relative| relative != "SKILL.md")
            .collect();

        files.sort();
        files
    }
}

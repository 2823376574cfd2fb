//! Activated ("loaded") skills for one agent, rendered into prompt text and tools.

use std::{collections::HashMap, sync::Arc};

use {
    tokio::sync::RwLock,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    catalog::Catalog,
    discovery::SkillDiscovery,
    path::resolve_secure_path,
    prompt,
    slug::slugify,
    tool::{AgentTool, ToolResolver},
    types::{InclusionMode, SkillDefinition},
};

/// A loaded skill and its per-load inclusion mode.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub slug: String,
    pub skill: SkillDefinition,
    /// `None` defers to the configured default at render time.
    pub mode: Option<InclusionMode>,
}

#[derive(Default)]
struct LoadedSkills {
    entries: Vec<RegistryEntry>,
    index: HashMap<String, usize>,
}

impl LoadedSkills {
    fn position(&self, key: &str) -> Option<usize> {
        self.index
            .get(key)
            .or_else(|| self.index.get(&slugify(key)))
            .copied()
    }

    fn get(&self, key: &str) -> Option<&RegistryEntry> {
        self.position(key).map(|pos| &self.entries[pos])
    }
}

/// Tracks which discovered skills are active and how they render.
pub struct SkillRegistry {
    discovery: Arc<SkillDiscovery>,
    default_mode: String,
    tools: Arc<dyn ToolResolver>,
    loaded: RwLock<LoadedSkills>,
}

impl SkillRegistry {
    /// `default_mode` is the configured inclusion mode as written; an invalid
    /// value falls back to lite when rendering.
    pub fn new(
        discovery: Arc<SkillDiscovery>,
        default_mode: impl Into<String>,
        tools: Arc<dyn ToolResolver>,
    ) -> Self {
        Self {
            discovery,
            default_mode: default_mode.into(),
            tools,
            loaded: RwLock::new(LoadedSkills::default()),
        }
    }

    #[must_use]
    pub fn discovery(&self) -> &Arc<SkillDiscovery> {
        &self.discovery
    }

    /// Load a skill by slug, name or directory path.
    ///
    /// `mode` of `None` keeps the mode of an earlier load of the same skill.
    /// An unrecognised mode is logged and replaced by the configured default.
    /// Returns `Ok(None)` for unknown skills.
    pub async fn load(
        &self,
        identifier: &str,
        mode: Option<&str>,
    ) -> Result<Option<SkillDefinition>> {
        let parsed = match mode {
            None => ModeRequest::Keep,
            Some(raw) => match InclusionMode::parse_flexible(raw) {
                Some(mode) => ModeRequest::Set(Some(mode)),
                None => {
                    warn!(
                        mode = raw,
                        skill = identifier,
                        "invalid skill inclusion mode, falling back to the configured default"
                    );
                    ModeRequest::Set(None)
                },
            },
        };
        self.load_inner(identifier, parsed).await
    }

    /// Typed variant of [`SkillRegistry::load`].
    pub async fn load_with_mode(
        &self,
        identifier: &str,
        mode: Option<InclusionMode>,
    ) -> Result<Option<SkillDefinition>> {
        let request = match mode {
            Some(mode) => ModeRequest::Set(Some(mode)),
            None => ModeRequest::Keep,
        };
        self.load_inner(identifier, request).await
    }

    async fn load_inner(
        &self,
        identifier: &str,
        request: ModeRequest,
    ) -> Result<Option<SkillDefinition>> {
        let Some(skill) = self.discovery.resolve(identifier).await? else {
            debug!(skill = identifier, "skill not found");
            return Ok(None);
        };

        let slug = skill.slug();
        let mut loaded = self.loaded.write().await;
        match loaded.index.get(&slug).copied() {
            Some(pos) => {
                let entry = &mut loaded.entries[pos];
                entry.skill = skill.clone();
                if let ModeRequest::Set(mode) = request {
                    entry.mode = mode;
                }
            },
            None => {
                let mode = match request {
                    ModeRequest::Set(mode) => mode,
                    ModeRequest::Keep => None,
                };
                let pos = loaded.entries.len();
                loaded.index.insert(slug.clone(), pos);
                loaded.entries.push(RegistryEntry {
                    slug: slug.clone(),
                    skill: skill.clone(),
                    mode,
                });
            },
        }
        debug!(%slug, "skill loaded");
        Ok(Some(skill))
    }

    pub async fn is_loaded(&self, slug: &str) -> bool {
        self.loaded.read().await.get(slug).is_some()
    }

    /// A loaded skill by slug (or by name, via its slug).
    pub async fn get(&self, slug: &str) -> Option<SkillDefinition> {
        self.loaded.read().await.get(slug).map(|e| e.skill.clone())
    }

    /// Loaded skills in activation order.
    pub async fn loaded(&self) -> Vec<RegistryEntry> {
        self.loaded.read().await.entries.clone()
    }

    /// Every discoverable skill, loaded or not.
    pub async fn available(&self) -> Result<Catalog> {
        self.discovery.discover().await
    }

    /// Tools declared by loaded skills, in activation then declaration order.
    /// Identifiers the resolver does not know are skipped.
    pub async fn tools(&self) -> Vec<Arc<dyn AgentTool>> {
        let loaded = self.loaded.read().await;
        let mut tools = Vec::new();
        for entry in &loaded.entries {
            for identifier in &entry.skill.tools {
                match self.tools.resolve(identifier) {
                    Some(tool) => tools.push(tool),
                    None => {
                        warn!(tool = %identifier, skill = %entry.skill.name, "tool not found for skill");
                    },
                }
            }
        }
        tools
    }

    fn configured_mode(&self) -> InclusionMode {
        InclusionMode::parse_flexible(&self.default_mode).unwrap_or_else(|| {
            warn!(
                value = %self.default_mode,
                "invalid configured inclusion mode, defaulting to lite"
            );
            InclusionMode::Lite
        })
    }

    /// Prompt text for all loaded skills.
    ///
    /// A valid `mode_override` applies to every skill; otherwise each skill
    /// uses its per-load mode, then the configured default.
    pub async fn instructions(&self, mode_override: Option<&str>) -> String {
        let global = mode_override.and_then(|raw| {
            let parsed = InclusionMode::parse_flexible(raw);
            if parsed.is_none() {
                warn!(mode = raw, "invalid instructions mode override, ignoring");
            }
            parsed
        });

        let loaded = self.loaded.read().await;
        let mut configured = None;
        let blocks: Vec<String> = loaded
            .entries
            .iter()
            .map(|entry| {
                let mode = global
                    .or(entry.mode)
                    .unwrap_or_else(|| *configured.get_or_insert_with(|| self.configured_mode()));
                prompt::render(&entry.skill, mode)
            })
            .collect();
        blocks.join("\n").trim().to_string()
    }

    /// Read a reference file shipped with a loaded local skill.
    pub async fn read_reference(&self, slug: &str, file: &str) -> Result<String> {
        let skill = self
            .get(slug)
            .await
            .ok_or_else(|| Error::not_found(format!("loaded skill [{slug}]")))?;
        let base = skill.base_path().ok_or_else(|| Error::MissingBasePath {
            skill: slug.to_string(),
        })?;

        let path = resolve_secure_path(base, file)?;
        if !path.is_file() {
            return Err(Error::not_found(format!("file \"{file}\" in skill [{slug}]")));
        }
        // Reference files may be in any encoding; invalid UTF-8 is replaced.
        let bytes = tokio::fs::read(&path).await?;
        let content = String::from_utf8_lossy(&bytes);
        Ok(prompt::render_reference(&skill, file, &content))
    }
}

enum ModeRequest {
    /// Keep the previous mode on reload.
    Keep,
    Set(Option<InclusionMode>),
}

//! Skill discovery, parsing, caching and registry for AI agents.
//!
//! A skill is a directory holding a `SKILL.md` file: YAML frontmatter
//! (`name`, `description`, optional `tools`, `triggers`, `version`, `mcp`,
//! `constraints`) followed by markdown instructions. Skills are discovered
//! from local roots and/or a remote catalog, cached as a set, and activated
//! per agent through the [`registry::SkillRegistry`].

pub mod agent;
pub mod cache;
pub mod catalog;
pub mod discover;
pub mod discovery;
pub mod error;
pub mod parse;
pub mod path;
pub mod prompt;
pub mod registry;
pub mod remote;
pub mod scaffold;
pub mod skill_tools;
pub mod slug;
pub mod tool;
pub mod types;
#[cfg(feature = "file-watcher")]
pub mod watcher;

pub use {
    agent::AgentSkills,
    cache::{CacheStore, CacheStores, FileStore, MemoryStore},
    catalog::Catalog,
    discover::{SkillScanner, SourceScanner},
    discovery::{CacheSettings, SkillDiscovery},
    error::{Error, Result},
    registry::{RegistryEntry, SkillRegistry},
    slug::slugify,
    tool::{AgentTool, ToolFactory, ToolResolver},
    types::{InclusionMode, SkillDefinition, SkillSource},
};

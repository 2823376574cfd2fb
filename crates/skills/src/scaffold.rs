//! Scaffolding for new local skills.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::{
    Error, Result,
    parse::{SKILL_FILE, parse_definition},
    slug::slugify,
    types::SkillSource,
};

pub const DEFAULT_DESCRIPTION: &str = "A new AI skill";

/// Frontmatter scalar: plain when YAML reads it back unchanged, quoted otherwise.
fn yaml_scalar(value: &str) -> String {
    let plain = !value.contains('\n')
        && serde_yaml::from_str::<serde_yaml::Value>(value)
            .ok()
            .and_then(|v| v.as_str().map(|s| s == value))
            .unwrap_or(false);
    if plain {
        value.to_string()
    } else {
        serde_json::to_string(value).unwrap_or_else(|_| format!("{value:?}"))
    }
}

/// The default `SKILL.md` content for a new skill.
#[must_use]
pub fn skill_template(name: &str, description: &str) -> String {
    format!(
        "---\nname: {}\ndescription: {}\n---\n# {name}\n\nThis is a new skill. Describe what it does here.\n",
        yaml_scalar(name),
        yaml_scalar(description)
    )
}

/// Create `<root>/<slug>/SKILL.md` and return its path.
///
/// Refuses to overwrite an existing definition. The written file is checked
/// with the same parser discovery uses.
pub fn create_skill(root: &Path, name: &str, description: Option<&str>) -> Result<PathBuf> {
    let name = name.trim();
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(Error::message(format!(
            "skill name `{name}` has no usable characters"
        )));
    }
    let description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .unwrap_or(DEFAULT_DESCRIPTION);

    let dir = root.join(&slug);
    let file = dir.join(SKILL_FILE);
    if file.exists() {
        return Err(Error::AlreadyExists { path: file });
    }

    let content = skill_template(name, description);
    parse_definition(&content, SkillSource::Local, Some(dir.clone()))?;

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&file, content)?;
    info!(path = %file.display(), "created skill");
    Ok(file)
}

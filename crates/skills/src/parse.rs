use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::{
    Error, Result,
    types::{SkillDefinition, SkillSource},
};

/// File name of a skill definition inside its directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// Parse `SKILL.md` text into a definition.
///
/// `base_path` is kept only for [`SkillSource::Local`]. Failures are returned
/// as [`Error::MalformedDefinition`] with a reason naming the problem.
pub fn parse_definition(
    content: &str,
    source: SkillSource,
    base_path: Option<PathBuf>,
) -> Result<SkillDefinition> {
    let (frontmatter, body) = split_frontmatter(content)?;
    if frontmatter.trim().is_empty() {
        return Err(Error::malformed("frontmatter must be a mapping"));
    }

    let data: Value = serde_yaml::from_str(&frontmatter)
        .map_err(|e| Error::malformed(format!("invalid frontmatter syntax: {e}")))?;
    let Value::Mapping(map) = data else {
        return Err(Error::malformed("frontmatter must be a mapping"));
    };

    let mut skill = SkillDefinition::new(
        required_string(&map, "name")?,
        required_string(&map, "description")?,
        source,
    )
    .with_instructions(body)
    .with_tools(string_list(&map, "tools")?)
    .with_triggers(string_list(&map, "triggers")?)
    .with_base_path(base_path);
    skill.version = version(&map)?;
    skill.mcp = json_list(&map, "mcp")?;
    skill.constraints = json_list(&map, "constraints")?;

    Ok(skill)
}

/// Read and parse `<dir>/SKILL.md` as a local definition rooted at `dir`.
pub fn read_definition_dir(dir: &Path) -> Result<SkillDefinition> {
    let content = std::fs::read_to_string(dir.join(SKILL_FILE))?;
    parse_definition(&content, SkillSource::Local, Some(dir.to_path_buf()))
}

/// Split into (frontmatter, trimmed body). The opening fence must be the very
/// first line; the first `\n---\n` after it closes the block.
fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");

    if !content.starts_with("---\n") {
        return Err(Error::malformed("missing opening frontmatter delimiter"));
    }

    let Some((head, body)) = content.split_once("\n---\n") else {
        return Err(Error::malformed(
            "missing closing frontmatter delimiter or body",
        ));
    };

    // YAML end-of-document markers are not part of the mapping.
    let head = head.replace("\n...", "");
    let frontmatter = head.get(4..).unwrap_or_default().to_string();

    Ok((frontmatter, body.trim().to_string()))
}

fn field<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|v| !v.is_null())
}

fn required_string(map: &Mapping, key: &str) -> Result<String> {
    match field(map, key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.clone()),
        _ => Err(Error::malformed(format!(
            "missing or invalid '{key}' field"
        ))),
    }
}

fn string_list(map: &Mapping, key: &str) -> Result<Vec<String>> {
    let Some(value) = field(map, key) else {
        return Ok(Vec::new());
    };
    let Value::Sequence(items) = value else {
        return Err(Error::malformed(format!("'{key}' must be a list")));
    };
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Ok(s.clone()),
            _ => Err(Error::malformed(format!("'{key}' must contain only strings"))),
        })
        .collect()
}

fn json_list(map: &Mapping, key: &str) -> Result<Vec<serde_json::Value>> {
    let Some(value) = field(map, key) else {
        return Ok(Vec::new());
    };
    let Value::Sequence(items) = value else {
        return Err(Error::malformed(format!("'{key}' must be a list")));
    };
    items
        .iter()
        .map(|item| {
            serde_json::to_value(item)
                .map_err(|e| Error::malformed(format!("'{key}' entry is not representable: {e}")))
        })
        .collect()
}

fn version(map: &Mapping) -> Result<Option<String>> {
    match field(map, "version") {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(Error::malformed("'version' must be a string or number")),
    }
}

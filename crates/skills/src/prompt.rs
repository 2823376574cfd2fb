//! Prompt fragments and display tables for skills.

use std::{collections::HashMap, path::Path};

use crate::{
    Error, Result,
    catalog::Catalog,
    types::{InclusionMode, SkillDefinition},
};

/// Escape a value for use inside a double-quoted XML attribute.
#[must_use]
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// `<skill name="…" description="…" />`
#[must_use]
pub fn render_lite(skill: &SkillDefinition) -> String {
    format!(
        "<skill name=\"{}\" description=\"{}\" />",
        escape_attr(&skill.name),
        escape_attr(&skill.description)
    )
}

/// `<skill name="…">` block with the trimmed instructions.
#[must_use]
pub fn render_full(skill: &SkillDefinition) -> String {
    format!(
        "<skill name=\"{}\">\n{}\n</skill>",
        escape_attr(&skill.name),
        skill.instructions.trim()
    )
}

#[must_use]
pub fn render(skill: &SkillDefinition, mode: InclusionMode) -> String {
    match mode {
        InclusionMode::Lite => render_lite(skill),
        InclusionMode::Full => render_full(skill),
    }
}

/// Wrap the content of a reference file.
#[must_use]
pub fn render_reference(skill: &SkillDefinition, file: &str, content: &str) -> String {
    format!(
        "<skill_reference skill=\"{}\" file=\"{}\">\n{}\n</skill_reference>",
        escape_attr(&skill.name),
        escape_attr(file),
        content.trim()
    )
}

/// List of reference files with a usage hint for the `skill_read` tool.
/// Empty when `files` is empty.
#[must_use]
pub fn render_reference_listing(skill: &SkillDefinition, files: &[String]) -> String {
    let Some(example) = files.first() else {
        return String::new();
    };
    let name = escape_attr(&skill.name);
    let listing: Vec<String> = files.iter().map(|f| format!("  - {f}")).collect();
    format!(
        "<skill_references skill=\"{name}\">\n\
         Available reference files (use `skill_read` tool to read them):\n\
         {}\n\n\
         To read a reference file, call skill_read with BOTH required parameters:\n  \
         skill: \"{name}\"\n  \
         file: \"{example}\"\n\
         </skill_references>",
        listing.join("\n")
    )
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

/// Markdown table of the catalog with a Loaded/Available status column.
#[must_use]
pub fn render_catalog_table(catalog: &Catalog, is_loaded: impl Fn(&str) -> bool) -> String {
    let mut lines = vec![
        "| Name | Description | Triggers | Status |".to_string(),
        "|---|---|---|---|".to_string(),
    ];
    for (slug, skill) in catalog.iter() {
        let status = if is_loaded(slug) {
            "Loaded"
        } else {
            "Available"
        };
        lines.push(format!(
            "| {} | {} | {} | {status} |",
            escape_cell(&skill.name),
            escape_cell(&skill.description),
            escape_cell(&skill.triggers.join(", "))
        ));
    }
    lines.join("\n")
}

/// Prompt text with `{{key}}` placeholders bound from a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    content: String,
}

impl PromptTemplate {
    /// Inline text. Unknown placeholders are left in place.
    #[must_use]
    pub fn text(template: &str, data: &HashMap<&str, String>) -> Self {
        Self {
            content: bind(template, data),
        }
    }

    /// Read a prompt file (any text format), trim it and bind placeholders.
    pub fn file(path: &Path, data: &HashMap<&str, String>) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::not_found(format!("prompt file {}", path.display())));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Self::text(content.trim(), data))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.content
    }
}

impl std::fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.content)
    }
}

fn bind(template: &str, data: &HashMap<&str, String>) -> String {
    if data.is_empty() {
        return template.to_string();
    }
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) if data.contains_key(&after[..end]) => {
                out.push_str(&data[&after[..end]]);
                rest = &after[end + 2..];
            },
            _ => {
                out.push_str("{{");
                rest = after;
            },
        }
    }
    out.push_str(rest);
    out
}

//! Agent tools for browsing, loading and reading skills at runtime.

use std::sync::Arc;

use {
    anyhow::Result,
    async_trait::async_trait,
    serde_json::{Value, json},
};

use crate::{Error, prompt, registry::SkillRegistry, tool::AgentTool};

fn str_param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(|v| v.as_str()).map(str::trim).unwrap_or_default()
}

/// Lists every discoverable skill with its load status.
pub struct ListSkillsTool {
    registry: Arc<SkillRegistry>,
}

impl ListSkillsTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl AgentTool for ListSkillsTool {
    fn name(&self) -> &str {
        "list_skills"
    }

    fn description(&self) -> &str {
        "List all available skills that can be loaded to provide specialized capabilities. \
         Returns a table of skills with their descriptions, triggers, and current status."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {}
        })
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        let catalog = self.registry.available().await?;
        let loaded: Vec<String> = self
            .registry
            .loaded()
            .await
            .into_iter()
            .map(|entry| entry.slug)
            .collect();
        let table = prompt::render_catalog_table(&catalog, |slug| loaded.iter().any(|s| s == slug));
        Ok(json!(table))
    }
}

/// Loads a skill and returns its full instructions.
pub struct SkillLoaderTool {
    registry: Arc<SkillRegistry>,
}

impl SkillLoaderTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl AgentTool for SkillLoaderTool {
    fn name(&self) -> &str {
        "skill"
    }

    fn description(&self) -> &str {
        "Load a specific skill by its name (slug) to gain its capabilities and instructions."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {
                    "type": "string",
                    "description": "The unique name/slug of the skill to load (e.g. \"doc-writer\", \"git-helper\")"
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let name = str_param(&params, "name");
        if name.is_empty() {
            return Ok(json!("Error: Skill name is required."));
        }

        let Some(skill) = self.registry.load(name, None).await? else {
            return Ok(json!(format!("Skill [{name}] not found.")));
        };

        let mut output = prompt::render_full(&skill);
        let files = skill.reference_files();
        if !files.is_empty() {
            output.push_str("\n\n");
            output.push_str(&prompt::render_reference_listing(&skill, &files));
        }
        Ok(json!(output))
    }
}

/// Reads a reference file from a loaded skill's directory.
pub struct SkillReadTool {
    registry: Arc<SkillRegistry>,
}

impl SkillReadTool {
    pub fn new(registry: Arc<SkillRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl AgentTool for SkillReadTool {
    fn name(&self) -> &str {
        "skill_read"
    }

    fn description(&self) -> &str {
        "Read a reference file from a loaded skill's directory. Requires BOTH parameters: \
         \"skill\" (the skill slug, e.g. \"wind-ui\") AND \"file\" (the relative path, e.g. \
         \"references/utilities.md\"). The skill must be loaded first via the \"skill\" tool. \
         Available reference files are listed when a skill is loaded."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["skill", "file"],
            "properties": {
                "skill": {
                    "type": "string",
                    "description": "REQUIRED. The name/slug of the already-loaded skill (e.g. \"wind-ui\", \"git-helper\")."
                },
                "file": {
                    "type": "string",
                    "description": "REQUIRED. Relative file path within the skill directory (e.g. \"references/utilities.md\"). See the file list from the skill loading response."
                }
            }
        })
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let skill = str_param(&params, "skill");
        let file = str_param(&params, "file");
        if skill.is_empty() || file.is_empty() {
            return Ok(json!("Error: Both \"skill\" and \"file\" parameters are required."));
        }

        if !self.registry.is_loaded(skill).await {
            return Ok(json!(format!(
                "Error: Skill [{skill}] is not loaded. Load it first using the \"skill\" tool."
            )));
        }

        let text = match self.registry.read_reference(skill, file).await {
            Ok(text) => text,
            Err(Error::MissingBasePath { .. }) => format!(
                "Error: Skill [{skill}] has no base path (remote skills do not support file references)."
            ),
            Err(Error::AccessDenied { .. }) => format!(
                "Error: Access denied. The file path \"{file}\" escapes the skill's directory boundary."
            ),
            Err(Error::NotFound { .. }) => {
                format!("Error: File \"{file}\" not found in skill [{skill}].")
            },
            Err(Error::Io(e)) => {
                tracing::warn!(skill, file, error = %e, "failed to read skill reference");
                format!("Error: Unable to read file \"{file}\" from skill [{skill}].")
            },
            Err(e) => return Err(e.into()),
        };
        Ok(json!(text))
    }
}

/// The three built-in skill tools, in their canonical order.
#[must_use]
pub fn builtin_tools(registry: &Arc<SkillRegistry>) -> Vec<Arc<dyn AgentTool>> {
    vec![
        Arc::new(ListSkillsTool::new(Arc::clone(registry))),
        Arc::new(SkillLoaderTool::new(Arc::clone(registry))),
        Arc::new(SkillReadTool::new(Arc::clone(registry))),
    ]
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            cache::CacheStores,
            catalog::Catalog,
            discover::SkillScanner,
            discovery::{CacheSettings, SkillDiscovery},
            parse::read_definition_dir,
            tool::ToolFactory,
            types::{SkillDefinition, SkillSource},
        },
        std::path::Path,
    };

    struct FixedScanner(Catalog);

    #[async_trait]
    impl SkillScanner for FixedScanner {
        async fn scan(&self) -> Catalog {
            self.0.clone()
        }
    }

    fn write_skill(root: &Path, dir: &str, name: &str) -> std::path::PathBuf {
        let skill_dir = root.join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join("SKILL.md"),
            format!("---\nname: {name}\ndescription: {name} | desc\ntriggers: [go]\n---\n{name} body\n"),
        )
        .unwrap();
        skill_dir
    }

    fn setup() -> (tempfile::TempDir, Arc<SkillRegistry>) {
        let tmp = tempfile::tempdir().unwrap();
        let docs = write_skill(tmp.path(), "docs", "docs");
        std::fs::create_dir_all(docs.join("references")).unwrap();
        std::fs::write(docs.join("references/theme.md"), "Theme notes").unwrap();
        std::fs::write(docs.join("references/api.md"), "API notes").unwrap();
        write_skill(tmp.path(), "plain", "plain");

        let mut catalog: Catalog = ["docs", "plain"]
            .iter()
            .map(|dir| read_definition_dir(&tmp.path().join(dir)).unwrap())
            .collect();
        catalog.insert(
            SkillDefinition::new("remote", "from afar", SkillSource::Remote)
                .with_instructions("Remote body"),
        );

        let discovery = SkillDiscovery::new(
            Arc::new(FixedScanner(catalog)),
            CacheSettings::disabled(),
            Arc::new(CacheStores::new()),
        );
        let registry =
            SkillRegistry::new(Arc::new(discovery), "lite", Arc::new(ToolFactory::new()));
        (tmp, Arc::new(registry))
    }

    async fn run(tool: &dyn AgentTool, params: Value) -> String {
        tool.execute(params).await.unwrap().as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn list_skills_shows_status() {
        let (_tmp, registry) = setup();
        registry.load("plain", None).await.unwrap();
        let table = run(&ListSkillsTool::new(registry), json!({})).await;
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[2], r"| docs | docs \| desc | go | Available |");
        assert_eq!(lines[3], r"| plain | plain \| desc | go | Loaded |");
    }

    #[tokio::test]
    async fn skill_tool_loads_and_lists_references() {
        let (_tmp, registry) = setup();
        let tool = SkillLoaderTool::new(Arc::clone(&registry));

        let output = run(&tool, json!({ "name": "docs" })).await;
        assert!(output.starts_with("<skill name=\"docs\">\ndocs body\n</skill>\n\n<skill_references skill=\"docs\">"));
        assert!(output.contains("  - references/api.md\n  - references/theme.md\n"));
        assert!(output.contains("  file: \"references/api.md\"\n</skill_references>"));
        assert!(registry.is_loaded("docs").await);

        let output = run(&tool, json!({ "name": "plain" })).await;
        assert_eq!(output, "<skill name=\"plain\">\nplain body\n</skill>");
    }

    #[tokio::test]
    async fn skill_tool_errors() {
        let (_tmp, registry) = setup();
        let tool = SkillLoaderTool::new(registry);
        assert_eq!(run(&tool, json!({})).await, "Error: Skill name is required.");
        assert_eq!(run(&tool, json!({ "name": "ghost" })).await, "Skill [ghost] not found.");
    }

    #[tokio::test]
    async fn skill_read_messages() {
        let (_tmp, registry) = setup();
        let tool = SkillReadTool::new(Arc::clone(&registry));

        assert_eq!(
            run(&tool, json!({ "skill": "docs" })).await,
            "Error: Both \"skill\" and \"file\" parameters are required."
        );
        assert_eq!(
            run(&tool, json!({ "skill": "docs", "file": "references/api.md" })).await,
            "Error: Skill [docs] is not loaded. Load it first using the \"skill\" tool."
        );

        registry.load("docs", None).await.unwrap();
        registry.load("remote", None).await.unwrap();

        assert_eq!(
            run(&tool, json!({ "skill": "docs", "file": "references/api.md" })).await,
            "<skill_reference skill=\"docs\" file=\"references/api.md\">\nAPI notes\n</skill_reference>"
        );
        assert_eq!(
            run(&tool, json!({ "skill": "docs", "file": "../plain/SKILL.md" })).await,
            "Error: Access denied. The file path \"../plain/SKILL.md\" escapes the skill's directory boundary."
        );
        assert_eq!(
            run(&tool, json!({ "skill": "docs", "file": "nope.md" })).await,
            "Error: File \"nope.md\" not found in skill [docs]."
        );
        assert_eq!(
            run(&tool, json!({ "skill": "remote", "file": "a.md" })).await,
            "Error: Skill [remote] has no base path (remote skills do not support file references)."
        );
    }

    #[test]
    fn builtin_tool_names() {
        let (_tmp, registry) = setup();
        let names: Vec<String> = builtin_tools(&registry)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["list_skills", "skill", "skill_read"]);
    }
}

//! Skills for an agent: auto-loading plus the tool and prompt surface.

use std::sync::Arc;

use {
    quiver_config::SkillsConfig,
    tokio::sync::OnceCell,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    discovery::SkillDiscovery,
    registry::SkillRegistry,
    skill_tools::builtin_tools,
    tool::{AgentTool, ToolResolver},
};

/// Composes a [`SkillRegistry`] into an agent.
///
/// The first call to [`AgentSkills::skill_tools`] or
/// [`AgentSkills::skill_instructions`] loads the auto-load skills once. A
/// missing or broken auto-load skill is logged and skipped; an invalid cache
/// configuration fails the call and the next call retries the boot.
pub struct AgentSkills {
    registry: Arc<SkillRegistry>,
    auto_load: Vec<String>,
    booted: OnceCell<()>,
}

impl AgentSkills {
    #[must_use]
    pub fn new(registry: Arc<SkillRegistry>, auto_load: Vec<String>) -> Self {
        Self {
            registry,
            auto_load,
            booted: OnceCell::new(),
        }
    }

    /// Discovery, registry and auto-load list from configuration.
    pub fn from_config(config: &SkillsConfig, tools: Arc<dyn ToolResolver>) -> Result<Self> {
        let discovery = SkillDiscovery::from_config(config)?;
        let registry =
            SkillRegistry::new(Arc::new(discovery), config.inclusion_mode.clone(), tools);
        Ok(Self::new(Arc::new(registry), config.auto_load.clone()))
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SkillRegistry> {
        &self.registry
    }

    async fn boot(&self) -> Result<()> {
        self.booted
            .get_or_try_init(|| async {
                for identifier in &self.auto_load {
                    match self.registry.load(identifier, None).await {
                        Ok(Some(_)) => debug!(skill = %identifier, "auto-loaded skill"),
                        Ok(None) => warn!(skill = %identifier, "auto-load skill not found"),
                        Err(e @ Error::InvalidConfiguration { .. }) => return Err(e),
                        Err(e) => {
                            warn!(skill = %identifier, error = %e, "failed to auto-load skill");
                        },
                    }
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// `list_skills`, `skill`, `skill_read`, then the tools of loaded skills.
    pub async fn skill_tools(&self) -> Result<Vec<Arc<dyn AgentTool>>> {
        self.boot().await?;
        let mut tools = builtin_tools(&self.registry);
        tools.extend(self.registry.tools().await);
        Ok(tools)
    }

    /// Prompt text for loaded skills in their configured modes.
    pub async fn skill_instructions(&self) -> Result<String> {
        self.boot().await?;
        Ok(self.registry.instructions(None).await)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            cache::CacheStores,
            discover::SourceScanner,
            discovery::CacheSettings,
            tool::ToolFactory,
        },
        async_trait::async_trait,
        quiver_config::DiscoveryMode,
        serde_json::{Value, json},
    };

    struct Search;

    #[async_trait]
    impl AgentTool for Search {
        fn name(&self) -> &str {
            "search"
        }

        fn description(&self) -> &str {
            "Search."
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object" })
        }

        async fn execute(&self, _params: Value) -> anyhow::Result<Value> {
            Ok(json!([]))
        }
    }

    fn agent(root: &std::path::Path, auto_load: &[&str]) -> AgentSkills {
        let scanner = SourceScanner::new(vec![root.to_path_buf()], DiscoveryMode::Local, None);
        let discovery = SkillDiscovery::new(
            Arc::new(scanner),
            CacheSettings::default(),
            Arc::new(CacheStores::new()),
        );
        let tools = ToolFactory::new().with("search", || Arc::new(Search));
        let registry = SkillRegistry::new(Arc::new(discovery), "full", Arc::new(tools));
        AgentSkills::new(
            Arc::new(registry),
            auto_load.iter().map(|s| s.to_string()).collect(),
        )
    }

    fn fixture() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("research")).unwrap();
        std::fs::write(
            tmp.path().join("research/SKILL.md"),
            "---\nname: research\ndescription: Find things\ntools: [search]\n---\nSearch first.\n",
        )
        .unwrap();
        tmp
    }

    #[tokio::test]
    async fn boot_loads_auto_skills_once() {
        let tmp = fixture();
        let agent = agent(tmp.path(), &["research", "missing"]);

        let names: Vec<String> = agent
            .skill_tools()
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["list_skills", "skill", "skill_read", "search"]);
        assert_eq!(
            agent.skill_instructions().await.unwrap(),
            "<skill name=\"research\">\nSearch first.\n</skill>"
        );
        assert_eq!(agent.registry().loaded().await.len(), 1);
    }

    #[tokio::test]
    async fn from_config_wires_paths_and_auto_load() {
        let tmp = fixture();
        let mut config = SkillsConfig {
            paths: vec![tmp.path().to_path_buf()],
            inclusion_mode: "lite".into(),
            auto_load: vec!["research".into()],
            ..SkillsConfig::default()
        };
        config.cache.enabled = false;
        let agent = AgentSkills::from_config(&config, Arc::new(ToolFactory::new())).unwrap();
        assert_eq!(
            agent.skill_instructions().await.unwrap(),
            r#"<skill name="research" description="Find things" />"#
        );
        assert_eq!(agent.skill_tools().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_cache_store_fails_the_agent_surface() {
        let tmp = fixture();
        let mut config = SkillsConfig {
            paths: vec![tmp.path().to_path_buf()],
            auto_load: vec!["research".into()],
            ..SkillsConfig::default()
        };
        config.cache.store = Some("redis".into());
        let agent = AgentSkills::from_config(&config, Arc::new(ToolFactory::new())).unwrap();

        let err = agent.skill_instructions().await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
        assert!(matches!(
            agent.skill_tools().await,
            Err(Error::InvalidConfiguration { .. })
        ));
        assert!(agent.registry().loaded().await.is_empty());
    }

    #[tokio::test]
    async fn no_auto_load_gives_builtins_only() {
        let tmp = fixture();
        let agent = agent(tmp.path(), &[]);
        assert_eq!(agent.skill_tools().await.unwrap().len(), 3);
        assert_eq!(agent.skill_instructions().await.unwrap(), "");
    }
}

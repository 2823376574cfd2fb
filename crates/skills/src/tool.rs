use std::{collections::HashMap, sync::Arc};

use {anyhow::Result, async_trait::async_trait};

/// Agent-callable tool.
#[async_trait]
pub trait AgentTool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> serde_json::Value;
    async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value>;
}

/// Maps a tool identifier declared by a skill to a callable tool.
pub trait ToolResolver: Send + Sync {
    fn resolve(&self, identifier: &str) -> Option<Arc<dyn AgentTool>>;
}

type Constructor = Box<dyn Fn() -> Arc<dyn AgentTool> + Send + Sync>;

/// Resolver backed by explicitly registered constructors.
#[derive(Default)]
pub struct ToolFactory {
    constructors: HashMap<String, Constructor>,
}

impl ToolFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor under `identifier`, replacing any previous one.
    pub fn register<F>(&mut self, identifier: impl Into<String>, constructor: F)
    where
        F: Fn() -> Arc<dyn AgentTool> + Send + Sync + 'static,
    {
        self.constructors.insert(identifier.into(), Box::new(constructor));
    }

    #[must_use]
    pub fn with<F>(mut self, identifier: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Arc<dyn AgentTool> + Send + Sync + 'static,
    {
        self.register(identifier, constructor);
        self
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.constructors.contains_key(identifier)
    }
}

impl ToolResolver for ToolFactory {
    fn resolve(&self, identifier: &str) -> Option<Arc<dyn AgentTool>> {
        self.constructors.get(identifier).map(|construct| construct())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    struct Echo;

    #[async_trait]
    impl AgentTool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the input back."
        }

        fn parameters_schema(&self) -> serde_json::Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, params: serde_json::Value) -> Result<serde_json::Value> {
            Ok(params)
        }
    }

    #[tokio::test]
    async fn factory_resolves_registered_tools_only() {
        let factory = ToolFactory::new().with("echo", || Arc::new(Echo));
        assert!(factory.contains("echo"));
        assert!(factory.resolve("missing").is_none());

        let tool = factory.resolve("echo").unwrap();
        assert_eq!(tool.name(), "echo");
        assert_eq!(tool.execute(json!({"x": 1})).await.unwrap(), json!({"x": 1}));
    }
}

//! Remote skill catalog: a single authenticated `GET` returning
//! `{ "skills": [...] }`.

use std::time::Duration;

use {
    quiver_config::RemoteConfig,
    secrecy::{ExposeSecret, Secret},
    serde::Deserialize,
    serde_json::Value,
    tracing::{debug, warn},
};

use crate::{
    Error, Result,
    catalog::Catalog,
    parse,
    types::{SkillDefinition, SkillSource},
};

#[derive(Debug, Deserialize)]
struct RemoteCatalog {
    #[serde(default)]
    skills: Vec<Value>,
}

/// A pre-structured remote entry.
#[derive(Debug, Deserialize)]
struct StructuredEntry {
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    instructions: Option<String>,
    #[serde(default)]
    tools: Option<Vec<String>>,
    #[serde(default)]
    triggers: Option<Vec<String>>,
    #[serde(default)]
    version: Option<Value>,
    #[serde(default)]
    mcp: Option<Vec<Value>>,
    #[serde(default)]
    constraints: Option<Vec<Value>>,
}

/// HTTP client for the remote skill catalog.
pub struct RemoteSource {
    client: reqwest::Client,
    url: String,
    token: Option<Secret<String>>,
}

impl RemoteSource {
    pub fn new(
        url: impl Into<String>,
        token: Option<Secret<String>>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("quiver/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::message(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
            token,
        })
    }

    /// Build from config. The caller checks that a URL is present.
    pub fn from_config(config: &RemoteConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .ok_or_else(|| Error::invalid_configuration("remote discovery requires a url"))?;
        Self::new(url, config.token.clone(), Duration::from_secs(config.timeout_secs))
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the remote catalog. Any failure yields an empty catalog and a warning.
    pub async fn fetch(&self) -> Catalog {
        match self.try_fetch().await {
            Ok(catalog) => {
                debug!(url = %self.url, count = catalog.len(), "fetched remote skills");
                catalog
            },
            Err(e) => {
                warn!(url = %self.url, error = %e, "remote skill discovery failed");
                Catalog::new()
            },
        }
    }

    async fn try_fetch(&self) -> Result<Catalog> {
        let mut request = self.client.get(&self.url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::SourceUnavailable {
                message: format!("remote responded with status {status}"),
            });
        }

        let body: RemoteCatalog = response.json().await.map_err(unavailable)?;
        Ok(body.skills.into_iter().filter_map(decode_entry).collect())
    }
}

fn unavailable(e: reqwest::Error) -> Error {
    Error::SourceUnavailable {
        message: e.to_string(),
    }
}

/// Decode one catalog entry; `{ "content": ... }` is parsed as a definition.
fn decode_entry(entry: Value) -> Option<SkillDefinition> {
    let result = match entry.get("content") {
        Some(Value::String(content)) => parse::parse_definition(content, SkillSource::Remote, None),
        Some(_) => Err(Error::malformed("'content' must be a string")),
        None => structured_entry(entry),
    };
    match result {
        Ok(skill) if skill.slug().is_empty() => {
            warn!(name = %skill.name, "skipping remote skill whose name has no slug");
            None
        },
        Ok(skill) => Some(skill),
        Err(e) => {
            warn!(error = %e, "skipping remote skill entry");
            None
        },
    }
}

fn structured_entry(entry: Value) -> Result<SkillDefinition> {
    let entry: StructuredEntry =
        serde_json::from_value(entry).map_err(|e| Error::malformed(format!("invalid entry: {e}")))?;

    if entry.name.trim().is_empty() {
        return Err(Error::malformed("missing or invalid 'name' field"));
    }
    if entry.description.trim().is_empty() {
        return Err(Error::malformed("missing or invalid 'description' field"));
    }

    let version = match entry.version {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => return Err(Error::malformed("'version' must be a string or number")),
    };

    let mut skill = SkillDefinition::new(entry.name, entry.description, SkillSource::Remote)
        .with_instructions(entry.instructions.unwrap_or_default().trim())
        .with_tools(entry.tools.unwrap_or_default())
        .with_triggers(entry.triggers.unwrap_or_default());
    skill.version = version;
    skill.mcp = entry.mcp.unwrap_or_default();
    skill.constraints = entry.constraints.unwrap_or_default();
    Ok(skill)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn source(url: String, token: Option<&str>) -> RemoteSource {
        let token = token.map(|t| Secret::new(t.to_string()));
        RemoteSource::new(url, token, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn fetches_content_and_structured_entries() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/skills")
            .match_header("authorization", "Bearer s3cret")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "skills": [
                        { "content": "---\nname: Raw Skill\ndescription: parsed\n---\nDo raw things." },
                        {
                            "name": "Structured",
                            "description": "built",
                            "instructions": "  Step one.  ",
                            "tools": ["search"],
                            "version": 2
                        },
                        { "name": "No Description" },
                        { "content": "not a definition" },
                        { "name": "Bad", "description": "d", "tools": "oops" }
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let catalog = source(format!("{}/skills", server.url()), Some("s3cret")).fetch().await;
        mock.assert_async().await;

        assert_eq!(catalog.slugs().collect::<Vec<_>>(), vec!["raw-skill", "structured"]);
        let raw = catalog.get("raw-skill").unwrap();
        assert_eq!(raw.source, SkillSource::Remote);
        assert_eq!(raw.instructions, "Do raw things.");
        assert!(raw.base_path().is_none());

        let structured = catalog.get("structured").unwrap();
        assert_eq!(structured.instructions, "Step one.");
        assert_eq!(structured.tools, vec!["search"]);
        assert_eq!(structured.version.as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn no_token_sends_no_authorization_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/")
            .match_header("authorization", mockito::Matcher::Missing)
            .with_status(200)
            .with_body(r#"{"skills": []}"#)
            .create_async()
            .await;

        let catalog = source(server.url(), None).fetch().await;
        mock.assert_async().await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn failed_status_yields_empty_catalog() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/skills")
            .with_status(500)
            .create_async()
            .await;

        let catalog = source(format!("{}/skills", server.url()), None).fetch().await;
        mock.assert_async().await;
        assert!(catalog.is_empty());
    }

    #[tokio::test]
    async fn undecodable_body_and_missing_key() {
        let mut server = mockito::Server::new_async().await;
        let _garbage = server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("<html>")
            .create_async()
            .await;
        let _no_key = server
            .mock("GET", "/empty")
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        assert!(source(format!("{}/garbage", server.url()), None).fetch().await.is_empty());
        assert!(source(format!("{}/empty", server.url()), None).fetch().await.is_empty());
    }

    #[test]
    fn entries_without_slug_are_skipped() {
        let cyrillic = decode_entry(json!({ "name": "Привет мир", "description": "hi" }));
        assert_eq!(cyrillic.unwrap().slug(), "privet-mir");
        assert!(decode_entry(json!({ "name": "???", "description": "d" })).is_none());
        let content = "---\nname: '!!!'\ndescription: d\n---\nB";
        assert!(decode_entry(json!({ "content": content })).is_none());
    }

    #[tokio::test]
    async fn unreachable_host_yields_empty_catalog() {
        let catalog = source("http://127.0.0.1:9/skills".into(), None).fetch().await;
        assert!(catalog.is_empty());
    }

    #[test]
    fn from_config_requires_url() {
        let err = RemoteSource::from_config(&RemoteConfig::default()).err().unwrap();
        assert!(matches!(err, Error::InvalidConfiguration { .. }));
    }
}

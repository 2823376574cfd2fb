//! `quiver skills`: list, scaffold, inspect and render skills.

use std::{path::PathBuf, sync::Arc};

use {
    anyhow::{Result, bail},
    clap::Subcommand,
    quiver_config::SkillsConfig,
    quiver_skills::{
        Catalog, SkillDefinition, SkillDiscovery, SkillRegistry, ToolFactory, scaffold,
    },
};

#[derive(Subcommand)]
pub enum SkillAction {
    /// List all discovered skills.
    List {
        /// Bypass the discovery cache.
        #[arg(long)]
        fresh: bool,
    },
    /// Create a new skill in the first configured skills directory.
    Make {
        /// Skill name; the directory is its slug.
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Clear the discovery cache.
    Clear,
    /// Show details about a skill.
    Show {
        /// Skill slug, name or directory path.
        name: String,
    },
    /// Load skills and print the prompt block an agent would receive.
    Prompt {
        /// Skill slugs, names or directory paths.
        #[arg(required = true)]
        ids: Vec<String>,
        /// `lite` or `full`; defaults to the configured inclusion mode.
        #[arg(long)]
        mode: Option<String>,
    },
    /// Watch the skill directories and clear the cache on every change.
    #[cfg(feature = "file-watcher")]
    Watch,
}

pub async fn handle_skills(action: SkillAction, config: &SkillsConfig) -> Result<()> {
    if !config.enabled {
        eprintln!("Skills are disabled in the configuration.");
        return Ok(());
    }
    let config = &with_persistent_cache(config);

    match action {
        SkillAction::Make { name, description } => {
            let root = make_root(config);
            let path = scaffold::create_skill(&root, &name, description.as_deref())?;
            println!("Skill [{name}] created at {}.", path.display());
        },
        SkillAction::List { fresh } => {
            let discovery = SkillDiscovery::from_config(config)?;
            let catalog = if fresh {
                discovery.fresh().await?
            } else {
                discovery.discover().await?
            };
            if catalog.is_empty() {
                println!("No skills found.");
            } else {
                println!("{}", render_list(&catalog));
            }
        },
        SkillAction::Clear => {
            SkillDiscovery::from_config(config)?.clear_cache().await?;
            println!("Skills cache cleared successfully.");
        },
        SkillAction::Show { name } => {
            let discovery = SkillDiscovery::from_config(config)?;
            let Some(skill) = discovery.resolve(&name).await? else {
                bail!("skill [{name}] not found");
            };
            println!("{}", render_details(&skill));
        },
        SkillAction::Prompt { ids, mode } => {
            let discovery = SkillDiscovery::from_config(config)?;
            let registry = SkillRegistry::new(
                Arc::new(discovery),
                config.inclusion_mode.clone(),
                Arc::new(ToolFactory::new()),
            );
            for id in &ids {
                if registry.load(id, None).await?.is_none() {
                    eprintln!("Skill [{id}] not found.");
                }
            }
            println!("{}", registry.instructions(mode.as_deref()).await);
        },
        #[cfg(feature = "file-watcher")]
        SkillAction::Watch => watch(config).await?,
    }

    Ok(())
}

#[cfg(feature = "file-watcher")]
async fn watch(config: &SkillsConfig) -> Result<()> {
    use quiver_skills::watcher::{SkillWatchEvent, SkillWatcher};

    let discovery = SkillDiscovery::from_config(config)?;
    let (watcher, mut events) = SkillWatcher::start(&config.paths)?;
    if watcher.roots().is_empty() {
        bail!("none of the configured skill directories exist");
    }
    for root in watcher.roots() {
        eprintln!("Watching {}", root.display());
    }

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(SkillWatchEvent::Changed(path)) = event else {
                    break;
                };
                discovery.clear_cache().await?;
                println!("Changed: {}", path.display());
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

/// Each invocation is a new process, so the in-memory store would never be
/// reused. Without an explicit store the CLI caches in the `file` store.
fn with_persistent_cache(config: &SkillsConfig) -> SkillsConfig {
    let mut config = config.clone();
    if config.cache.store_name().is_none() {
        config.cache.store = Some("file".into());
    }
    config
}

/// Where `make` writes: the first configured root.
fn make_root(config: &SkillsConfig) -> PathBuf {
    config
        .paths
        .first()
        .cloned()
        .unwrap_or_else(|| SkillsConfig::default().paths.into_iter().next().unwrap_or_default())
}

fn render_list(catalog: &Catalog) -> String {
    let rows: Vec<[String; 4]> = catalog
        .iter()
        .map(|(slug, skill)| {
            [
                slug.to_string(),
                skill.description.clone(),
                skill.tools.join(", "),
                skill.source.to_string(),
            ]
        })
        .collect();

    let header = ["Slug", "Description", "Tools", "Source"];
    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |cells: [&str; 4]| {
        cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(header)];
    for row in &rows {
        out.push(line([row[0].as_str(), row[1].as_str(), row[2].as_str(), row[3].as_str()]));
    }
    out.join("\n")
}

fn render_details(skill: &SkillDefinition) -> String {
    let mut out = vec![
        format!("Name:        {}", skill.name),
        format!("Slug:        {}", skill.slug()),
        format!("Description: {}", skill.description),
        format!("Source:      {}", skill.source),
    ];
    if let Some(version) = &skill.version {
        out.push(format!("Version:     {version}"));
    }
    if !skill.tools.is_empty() {
        out.push(format!("Tools:       {}", skill.tools.join(", ")));
    }
    if !skill.triggers.is_empty() {
        out.push(format!("Triggers:    {}", skill.triggers.join(", ")));
    }
    if let Some(path) = skill.base_path() {
        out.push(format!("Path:        {}", path.display()));
        let files = skill.reference_files();
        if !files.is_empty() {
            out.push(format!("References:  {}", files.join(", ")));
        }
    }
    out.push(String::new());
    out.push(skill.instructions.clone());
    out.join("\n")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, quiver_skills::SkillSource};

    #[test]
    fn list_aligns_columns() {
        let catalog: Catalog = vec![
            SkillDefinition::new("Code Review", "Review diffs", SkillSource::Local)
                .with_tools(vec!["git".into(), "grep".into()]),
            SkillDefinition::new("ops", "Deploy", SkillSource::Remote),
        ]
        .into();
        let table = render_list(&catalog);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "Slug         Description   Tools      Source");
        assert_eq!(lines[1], "code-review  Review diffs  git, grep  local");
        assert_eq!(lines[2], "ops          Deploy                   remote");
    }

    #[test]
    fn details_include_references() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("guide.md"), "g").unwrap();
        let skill = SkillDefinition::new("docs", "Write docs", SkillSource::Local)
            .with_instructions("Be brief.")
            .with_base_path(Some(tmp.path().to_path_buf()));
        let text = render_details(&skill);
        assert!(text.contains("Slug:        docs\n"));
        assert!(text.contains("References:  guide.md\n"));
        assert!(text.ends_with("\n\nBe brief."));
    }

    #[test]
    fn cli_defaults_to_file_cache() {
        let config = with_persistent_cache(&SkillsConfig::default());
        assert_eq!(config.cache.store_name(), Some("file"));

        let mut explicit = SkillsConfig::default();
        explicit.cache.store = Some("memory".into());
        assert_eq!(with_persistent_cache(&explicit).cache.store_name(), Some("memory"));
    }

    #[test]
    fn make_root_prefers_first_path() {
        let config = SkillsConfig {
            paths: vec!["a".into(), "b".into()],
            ..SkillsConfig::default()
        };
        assert_eq!(make_root(&config), PathBuf::from("a"));

        let empty = SkillsConfig {
            paths: Vec::new(),
            ..SkillsConfig::default()
        };
        assert_eq!(make_root(&empty), PathBuf::from(".quiver/skills"));
    }
}

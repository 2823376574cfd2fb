use std::path::{Path, PathBuf};

use {
    async_trait::async_trait,
    quiver_config::{DiscoveryMode, SkillsConfig},
    tracing::{debug, info, warn},
};

use crate::{
    Result,
    catalog::Catalog,
    parse::{self, SKILL_FILE},
    remote::RemoteSource,
    types::SkillSource,
};

/// Produces the full set of available skills. Scanning never fails: broken
/// entries and unreachable sources are logged and left out.
#[async_trait]
pub trait SkillScanner: Send + Sync {
    async fn scan(&self) -> Catalog;
}

/// Scans local directories and/or the remote catalog according to the
/// configured [`DiscoveryMode`].
pub struct SourceScanner {
    paths: Vec<PathBuf>,
    mode: DiscoveryMode,
    remote: Option<RemoteSource>,
}

impl SourceScanner {
    #[must_use]
    pub fn new(paths: Vec<PathBuf>, mode: DiscoveryMode, remote: Option<RemoteSource>) -> Self {
        Self {
            paths,
            mode,
            remote,
        }
    }

    /// Build from configuration. A remote-enabled mode without a URL scans
    /// nothing remotely.
    pub fn from_config(config: &SkillsConfig) -> Result<Self> {
        let remote = match (config.mode.includes_remote(), config.remote.url.as_deref()) {
            (true, Some(url)) if !url.trim().is_empty() => {
                Some(RemoteSource::from_config(&config.remote)?)
            },
            (true, _) => {
                warn!(mode = %config.mode, "remote discovery enabled without a url");
                None
            },
            (false, _) => None,
        };
        Ok(Self::new(config.paths.clone(), config.mode, remote))
    }

    #[must_use]
    pub fn mode(&self) -> DiscoveryMode {
        self.mode
    }

    #[must_use]
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[async_trait]
impl SkillScanner for SourceScanner {
    async fn scan(&self) -> Catalog {
        let mut catalog = Catalog::new();

        if self.mode.includes_local() {
            catalog.merge(scan_local(&self.paths));
        }
        if self.mode.includes_remote()
            && let Some(remote) = &self.remote
        {
            catalog.merge(remote.fetch().await);
        }

        info!(mode = %self.mode, count = catalog.len(), "skill scan complete");
        catalog
    }
}

/// Scan each directory one level deep for `<dir>/<skill>/SKILL.md`.
///
/// Directories are processed in the given order and subdirectories in file
/// name order, so a later definition with the same slug overrides an earlier one.
#[must_use]
pub fn scan_local(paths: &[PathBuf]) -> Catalog {
    let mut catalog = Catalog::new();
    for root in paths {
        if !root.is_dir() {
            debug!(path = %root.display(), "skills directory missing, skipping");
            continue;
        }
        scan_root(root, &mut catalog);
    }
    catalog
}

fn scan_root(root: &Path, catalog: &mut Catalog) {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(path = %root.display(), error = %e, "failed to read skills directory");
            return;
        },
    };

    let mut dirs: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    for skill_dir in dirs {
        let skill_md = skill_dir.join(SKILL_FILE);
        if !skill_md.is_file() {
            continue;
        }
        let content = match std::fs::read_to_string(&skill_md) {
            Ok(c) => c,
            Err(e) => {
                warn!(path = %skill_md.display(), error = %e, "failed to read SKILL.md");
                continue;
            },
        };
        match parse::parse_definition(&content, SkillSource::Local, Some(skill_dir.clone())) {
            Ok(skill) if skill.slug().is_empty() => {
                warn!(
                    path = %skill_md.display(),
                    name = %skill.name,
                    "skipping skill whose name has no slug"
                );
            },
            Ok(skill) => {
                debug!(slug = %skill.slug(), path = %skill_dir.display(), "discovered skill");
                catalog.insert(skill);
            },
            Err(e) => {
                warn!(path = %skill_md.display(), error = %e, "skipping invalid SKILL.md");
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write_skill(root: &Path, dir: &str, name: &str, description: &str) {
        let skill_dir = root.join(dir);
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join(SKILL_FILE),
            format!("---\nname: {name}\ndescription: {description}\n---\nInstructions for {name}.\n"),
        )
        .unwrap();
    }

    #[test]
    fn scans_one_level_deep() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "alpha", "Alpha", "first");
        write_skill(tmp.path(), "nested/deeper", "Deep", "too deep");
        let root_skill = "---\nname: root\ndescription: d\n---\nB";
        std::fs::write(tmp.path().join("SKILL.md"), root_skill).unwrap();

        let catalog = scan_local(&[tmp.path().to_path_buf()]);
        assert_eq!(catalog.slugs().collect::<Vec<_>>(), vec!["alpha"]);
        let alpha = catalog.get("alpha").unwrap();
        assert_eq!(alpha.base_path(), Some(tmp.path().join("alpha").as_path()));
        assert_eq!(alpha.instructions, "Instructions for Alpha.");
    }

    #[test]
    fn later_root_overrides_earlier() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        write_skill(first.path(), "common", "common-skill", "from first");
        write_skill(first.path(), "first-only", "first-only", "f");
        write_skill(second.path(), "common", "common-skill", "from second");

        let catalog = scan_local(&[first.path().to_path_buf(), second.path().to_path_buf()]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("common-skill").unwrap().description, "from second");
    }

    #[test]
    fn invalid_and_missing_entries_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "good", "good", "ok");
        std::fs::create_dir_all(tmp.path().join("bad")).unwrap();
        std::fs::write(tmp.path().join("bad/SKILL.md"), "no frontmatter").unwrap();
        std::fs::create_dir_all(tmp.path().join("empty")).unwrap();

        let catalog = scan_local(&[tmp.path().join("does-not-exist"), tmp.path().to_path_buf()]);
        assert_eq!(catalog.slugs().collect::<Vec<_>>(), vec!["good"]);
    }

    #[test]
    fn non_latin_names_keep_distinct_slugs() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "greeting", "Привет мир", "cyrillic");
        write_skill(tmp.path(), "greek", "Ελληνικά", "greek");
        write_skill(tmp.path(), "symbols", "'!!!'", "no slug");

        let catalog = scan_local(&[tmp.path().to_path_buf()]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get("privet-mir").unwrap().description, "cyrillic");
        assert!(catalog.skills().any(|s| s.description == "greek"));
        assert!(!catalog.contains(""));
    }

    #[cfg(unix)]
    #[test]
    fn follows_symlinked_skill_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let elsewhere = tempfile::tempdir().unwrap();
        write_skill(elsewhere.path(), "linked", "linked", "via symlink");
        std::os::unix::fs::symlink(elsewhere.path().join("linked"), tmp.path().join("linked"))
            .unwrap();

        let catalog = scan_local(&[tmp.path().to_path_buf()]);
        assert!(catalog.contains("linked"));
    }

    #[tokio::test]
    async fn remote_mode_without_source_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(tmp.path(), "alpha", "alpha", "a");
        let scanner =
            SourceScanner::new(vec![tmp.path().to_path_buf()], DiscoveryMode::Remote, None);
        assert!(scanner.scan().await.is_empty());

        let scanner = SourceScanner::new(vec![tmp.path().to_path_buf()], DiscoveryMode::Dual, None);
        assert_eq!(scanner.scan().await.len(), 1);
    }

    #[test]
    fn from_config_without_url_has_no_remote() {
        let config = SkillsConfig {
            mode: DiscoveryMode::Dual,
            ..SkillsConfig::default()
        };
        let scanner = SourceScanner::from_config(&config).unwrap();
        assert!(scanner.remote.is_none());
        assert_eq!(scanner.mode(), DiscoveryMode::Dual);
    }
}

//! Filesystem watcher for skill roots.
//!
//! Debounces create/modify/delete events under the configured roots and
//! invalidates the discovery cache so the next `discover()` rescans.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use {
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer,
        notify::{EventKind, RecommendedWatcher, RecursiveMode},
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

use crate::{Error, Result, discovery::SkillDiscovery, parse::SKILL_FILE};

const DEBOUNCE: Duration = Duration::from_millis(500);

/// Events emitted by [`SkillWatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillWatchEvent {
    /// A definition or one of its reference files changed.
    Changed(PathBuf),
}

/// Definitions and the reference files listed for them.
fn is_relevant(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    name == SKILL_FILE
        || path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| {
                ["md", "txt", "yaml", "yml", "json"]
                    .iter()
                    .any(|known| e.eq_ignore_ascii_case(known))
            })
}

/// Keeps the debouncer alive; dropping it stops the events.
pub struct SkillWatcher {
    debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    roots: Vec<PathBuf>,
}

impl SkillWatcher {
    /// Watch every existing root recursively. Missing roots are skipped.
    pub fn start(roots: &[PathBuf]) -> Result<(Self, mpsc::UnboundedReceiver<SkillWatchEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(DEBOUNCE, None, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    for event in events {
                        if !matches!(
                            event.kind,
                            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                        ) {
                            continue;
                        }
                        if let Some(path) = event.paths.iter().find(|p| is_relevant(p)) {
                            debug!(path = %path.display(), "skill watcher event");
                            let _ = tx.send(SkillWatchEvent::Changed(path.clone()));
                        }
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "skill watcher error");
                    }
                },
            }
        })
        .map_err(|e| Error::message(format!("failed to start skill watcher: {e}")))?;

        let mut watcher = Self {
            debouncer,
            roots: Vec::new(),
        };

        for root in roots {
            if !root.is_dir() {
                debug!(root = %root.display(), "skill watcher: root missing, skipping");
                continue;
            }
            watcher
                .debouncer
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| {
                    Error::message(format!("failed to watch {}: {e}", root.display()))
                })?;
            info!(root = %root.display(), "skill watcher: watching directory");
            watcher.roots.push(root.clone());
        }

        Ok((watcher, rx))
    }

    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

/// Clear the discovery cache for every event until the channel closes.
pub async fn invalidate_on_change(
    discovery: Arc<SkillDiscovery>,
    mut events: mpsc::UnboundedReceiver<SkillWatchEvent>,
) {
    while let Some(SkillWatchEvent::Changed(path)) = events.recv().await {
        debug!(path = %path.display(), "skill source changed, clearing cache");
        if let Err(e) = discovery.clear_cache().await {
            warn!(error = %e, "failed to clear skill cache after change");
        }
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
        },
        quiver_config::DiscoveryMode,
    };

    #[test]
    fn relevant_paths() {
        assert!(is_relevant(Path::new("/s/docs/SKILL.md")));
        assert!(is_relevant(Path::new("/s/docs/references/api.MD")));
        assert!(!is_relevant(Path::new("/s/docs/.SKILL.md.swp")));
        assert!(!is_relevant(Path::new("/s/docs/logo.png")));
    }

    #[test]
    fn missing_roots_are_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let (watcher, _rx) =
            SkillWatcher::start(&[tmp.path().to_path_buf(), tmp.path().join("missing")]).unwrap();
        assert_eq!(watcher.roots(), &[tmp.path().to_path_buf()]);
    }

    #[tokio::test]
    async fn change_event_invalidates_cache() {
        let tmp = tempfile::tempdir().unwrap();
        let skill_dir = tmp.path().join("notes");
        std::fs::create_dir_all(&skill_dir).unwrap();
        std::fs::write(
            skill_dir.join(SKILL_FILE),
            "---\nname: notes\ndescription: Take notes\n---\nBody\n",
        )
        .unwrap();

        let scanner =
            SourceScanner::new(vec![tmp.path().to_path_buf()], DiscoveryMode::Local, None);
        let discovery = Arc::new(SkillDiscovery::new(
            Arc::new(scanner),
            CacheSettings::default(),
            Arc::new(CacheStores::new()),
        ));
        assert_eq!(discovery.discover().await.unwrap().len(), 1);

        std::fs::remove_dir_all(&skill_dir).unwrap();
        assert_eq!(discovery.discover().await.unwrap().len(), 1);

        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(SkillWatchEvent::Changed(skill_dir.join(SKILL_FILE)))
            .unwrap();
        drop(tx);
        invalidate_on_change(Arc::clone(&discovery), rx).await;

        assert!(discovery.discover().await.unwrap().is_empty());
    }
}

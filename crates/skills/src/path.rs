//! Containment checks for files read from a skill directory.

use std::path::{Component, Path, PathBuf};

use crate::{Error, Result};

/// Resolve `relative` inside `base`, refusing anything that could escape it.
///
/// Traversal segments, absolute paths and drive prefixes are rejected before
/// the filesystem is touched. An existing target is canonicalised and must sit
/// strictly below the canonical base, which also catches symlinks pointing
/// outside. A target that does not exist is returned as-is so the caller can
/// report it as missing.
pub fn resolve_secure_path(base: &Path, relative: &str) -> Result<PathBuf> {
    let normalized = relative.replace('\\', "/");
    let denied = || Error::access_denied(relative);

    if normalized.is_empty()
        || normalized.starts_with('/')
        || normalized.split('/').any(|segment| segment == "..")
    {
        return Err(denied());
    }

    let relative_path = Path::new(&normalized);
    if relative_path
        .components()
        .any(|c| matches!(c, Component::Prefix(_) | Component::RootDir | Component::ParentDir))
    {
        return Err(denied());
    }

    let canonical_base = base.canonicalize().map_err(|_| denied())?;
    let candidate = canonical_base.join(relative_path);

    if !candidate.exists() {
        return Ok(candidate);
    }

    let resolved = candidate.canonicalize().map_err(|_| denied())?;
    if resolved != canonical_base && resolved.starts_with(&canonical_base) {
        Ok(resolved)
    } else {
        Err(denied())
    }
}

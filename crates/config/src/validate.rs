//! Configuration validation.
//!
//! Detects unknown/misspelled keys in raw TOML and reports semantic problems
//! in a parsed [`QuiverConfig`].

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::schema::QuiverConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "type-error", "remote", "cache", "paths"
    pub category: &'static str,
    /// Dotted path, e.g. "skills.remote.url"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub config_path: Option<PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

const INCLUSION_MODES: &[&str] = &["lite", "full", "lazy", "eager"];

// ── Schema tree for unknown-field detection ─────────────────────────────────

enum KnownKeys {
    Struct(HashMap<&'static str, KnownKeys>),
    Leaf,
}

fn build_schema_map() -> KnownKeys {
    use KnownKeys::{Leaf, Struct};

    let remote = Struct(HashMap::from([
        ("url", Leaf),
        ("token", Leaf),
        ("timeout_secs", Leaf),
    ]));
    let cache = Struct(HashMap::from([
        ("enabled", Leaf),
        ("ttl_secs", Leaf),
        ("store", Leaf),
    ]));
    let skills = Struct(HashMap::from([
        ("enabled", Leaf),
        ("inclusion_mode", Leaf),
        ("paths", Leaf),
        ("mode", Leaf),
        ("remote", remote),
        ("cache", cache),
        ("auto_load", Leaf),
    ]));

    Struct(HashMap::from([("skills", skills)]))
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    let mut best: Option<(&'a str, usize)> = None;
    for &candidate in candidates {
        let d = levenshtein(needle, candidate);
        if d > 0 && d <= max_distance && best.as_ref().is_none_or(|(_, bd)| d < *bd) {
            best = Some((candidate, d));
        }
    }
    best.map(|(s, _)| s)
}

// ── Core validation ─────────────────────────────────────────────────────────

/// Validate a config file at the given path, or the discovered config file
/// if `path` is `None`.
#[must_use]
pub fn validate_file(path: Option<&Path>) -> ValidationResult {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => crate::loader::find_config_file(),
    };

    let Some(actual_path) = config_path else {
        let mut result = validate(&QuiverConfig::default());
        result.diagnostics.insert(0, Diagnostic {
            severity: Severity::Info,
            category: "paths",
            path: String::new(),
            message: "no config file found; using defaults".into(),
        });
        return result;
    };

    let is_toml = actual_path
        .extension()
        .and_then(|e| e.to_str())
        .is_none_or(|e| e == "toml");

    let mut result = if is_toml {
        match std::fs::read_to_string(&actual_path) {
            Ok(content) => validate_toml_str(&crate::env_subst::substitute_env(&content)),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: format!("failed to read config file: {e}"),
                }],
                config_path: None,
            },
        }
    } else {
        match crate::loader::load_config(&actual_path) {
            Ok(config) => validate(&config),
            Err(e) => ValidationResult {
                diagnostics: vec![Diagnostic {
                    severity: Severity::Error,
                    category: "syntax",
                    path: String::new(),
                    message: e.to_string(),
                }],
                config_path: None,
            },
        }
    };
    result.config_path = Some(actual_path);
    result
}

/// Validate raw TOML: syntax, unknown keys, types, then semantics.
#[must_use]
pub fn validate_toml_str(toml_str: &str) -> ValidationResult {
    let mut diagnostics = Vec::new();

    let toml_value: toml::Value = match toml::from_str(toml_str) {
        Ok(v) => v,
        Err(e) => {
            diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "syntax",
                path: String::new(),
                message: format!("TOML syntax error: {e}"),
            });
            return ValidationResult {
                diagnostics,
                config_path: None,
            };
        },
    };

    check_unknown_fields(&toml_value, &build_schema_map(), "", &mut diagnostics);

    match toml::from_str::<QuiverConfig>(toml_str) {
        Ok(mut config) => {
            crate::loader::apply_env_overrides(&mut config);
            check_semantics(&config, &mut diagnostics);
        },
        Err(e) => diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "type-error",
            path: String::new(),
            message: format!("type error: {e}"),
        }),
    }

    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

/// Semantic checks on an already-parsed config.
#[must_use]
pub fn validate(config: &QuiverConfig) -> ValidationResult {
    let mut diagnostics = Vec::new();
    check_semantics(config, &mut diagnostics);
    ValidationResult {
        diagnostics,
        config_path: None,
    }
}

fn check_unknown_fields(
    value: &toml::Value,
    schema: &KnownKeys,
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let (toml::Value::Table(table), KnownKeys::Struct(fields)) = (value, schema) else {
        return;
    };
    let known_keys: Vec<&str> = fields.keys().copied().collect();
    for (key, child_value) in table {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        if let Some(child_schema) = fields.get(key.as_str()) {
            check_unknown_fields(child_value, child_schema, &path, diagnostics);
            continue;
        }
        let message = match suggest(key, &known_keys, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic {
            severity: Severity::Error,
            category: "unknown-field",
            path,
            message,
        });
    }
}

fn check_semantics(config: &QuiverConfig, diagnostics: &mut Vec<Diagnostic>) {
    let skills = &config.skills;

    let mode = skills.inclusion_mode.trim().to_ascii_lowercase();
    if !INCLUSION_MODES.contains(&mode.as_str()) {
        let hint = suggest(&mode, INCLUSION_MODES, 2)
            .map(|s| format!(" (did you mean \"{s}\"?)"))
            .unwrap_or_default();
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "type-error",
            path: "skills.inclusion_mode".into(),
            message: format!(
                "unknown inclusion mode \"{}\"{hint}; \"lite\" will be used",
                skills.inclusion_mode
            ),
        });
    }

    if skills.mode.includes_remote() {
        match skills.remote.url.as_deref().map(str::trim) {
            None | Some("") => diagnostics.push(Diagnostic {
                severity: Severity::Error,
                category: "remote",
                path: "skills.remote.url".into(),
                message: format!("discovery mode \"{}\" requires a remote url", skills.mode),
            }),
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                diagnostics.push(Diagnostic {
                    severity: Severity::Error,
                    category: "remote",
                    path: "skills.remote.url".into(),
                    message: format!("remote url must use http or https, got \"{url}\""),
                });
            },
            Some(_) => {},
        }
    }

    if skills.cache.enabled && skills.cache.ttl_secs == 0 {
        diagnostics.push(Diagnostic {
            severity: Severity::Warning,
            category: "cache",
            path: "skills.cache.ttl_secs".into(),
            message: "cache is enabled with a ttl of 0; every lookup rescans".into(),
        });
    }

    if matches!(&skills.cache.store, Some(name) if name.trim().is_empty()) {
        diagnostics.push(Diagnostic {
            severity: Severity::Info,
            category: "cache",
            path: "skills.cache.store".into(),
            message: "blank store name; the default memory store is used".into(),
        });
    }

    if skills.mode.includes_local() {
        for (i, path) in skills.paths.iter().enumerate() {
            if !path.exists() {
                diagnostics.push(Diagnostic {
                    severity: Severity::Info,
                    category: "paths",
                    path: format!("skills.paths[{i}]"),
                    message: format!(
                        "directory {} does not exist and will be skipped",
                        path.display()
                    ),
                });
            }
        }
    }
}

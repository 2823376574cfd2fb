//! Default configuration template with all options documented.
//!
//! Written by `quiver config init` so users can see everything that can be
//! configured even if they keep the defaults.

/// Generate the default config template.
#[must_use]
pub fn default_config_template() -> String {
    r##"# Quiver Configuration
# ====================
# Every option is listed with its default value.
#
# Environment variable substitution is supported: ${ENV_VAR} or ${ENV_VAR:-fallback}
# Example: token = "${SKILLS_TOKEN}"
#
# Any value can also be overridden with QUIVER_SKILLS_* variables, e.g.
# QUIVER_SKILLS_MODE=dual or QUIVER_SKILLS_CACHE_TTL=60.

# ══════════════════════════════════════════════════════════════════════════════
# SKILLS
# ══════════════════════════════════════════════════════════════════════════════

[skills]
enabled = true                    # Master switch for discovery and the agent tools
inclusion_mode = "lite"           # "lite" (name + description) or "full" (instructions)
                                  # "lazy" and "eager" are accepted aliases
paths = [".quiver/skills"]        # Scanned in order; later directories override earlier ones
mode = "local"                    # "local", "remote" or "dual" (local first, then remote)
auto_load = []                    # Skills loaded automatically by the agent component

# ══════════════════════════════════════════════════════════════════════════════
# REMOTE CATALOG
# ══════════════════════════════════════════════════════════════════════════════
# GET <url> must return { "skills": [ ... ] }.

[skills.remote]
# url = "https://skills.example.com/api/skills"
# token = "${SKILLS_TOKEN}"       # Sent as "Authorization: Bearer <token>"
timeout_secs = 5

# ══════════════════════════════════════════════════════════════════════════════
# DISCOVERY CACHE
# ══════════════════════════════════════════════════════════════════════════════

[skills.cache]
enabled = true
ttl_secs = 3600                   # Seconds before the catalog is rescanned
# store = "file"                  # "memory" (default) or "file" (shared across runs)
"##
    .to_string()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::validate::validate_toml_str};

    #[test]
    fn template_parses_to_defaults() {
        let cfg: crate::QuiverConfig = toml::from_str(&default_config_template()).unwrap();
        let defaults = crate::QuiverConfig::default();
        assert_eq!(cfg.skills.inclusion_mode, defaults.skills.inclusion_mode);
        assert_eq!(cfg.skills.paths, defaults.skills.paths);
        assert_eq!(cfg.skills.mode, defaults.skills.mode);
        assert_eq!(cfg.skills.cache.ttl_secs, defaults.skills.cache.ttl_secs);
        assert!(cfg.skills.remote.url.is_none());
    }

    #[test]
    fn template_has_no_unknown_fields() {
        let result = validate_toml_str(&default_config_template());
        assert!(
            !result.diagnostics.iter().any(|d| d.category == "unknown-field"),
            "{:?}",
            result.diagnostics
        );
    }
}

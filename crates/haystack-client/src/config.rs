//! Client configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Error, Result};

/// Configuration shared by session implementations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Project name, used in log output.
    pub project: String,
    /// Cap applied to queries that do not pass an explicit limit
    /// (None = unlimited).
    #[serde(default)]
    pub default_limit: Option<usize>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            project: "demo".to_string(),
            default_limit: None,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables
    ///
    /// Reads:
    /// - `HAYSTACK_PROJECT`: project name (default: "demo")
    /// - `HAYSTACK_DEFAULT_LIMIT`: default query row cap (default: none)
    pub fn from_env() -> Self {
        let project =
            std::env::var("HAYSTACK_PROJECT").unwrap_or_else(|_| "demo".to_string());

        let default_limit = std::env::var("HAYSTACK_DEFAULT_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok());

        Self {
            project,
            default_limit,
        }
    }

    /// Load config from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::Config(e.to_string()))
    }

    /// Effective row cap for a query: the caller's limit when given,
    /// otherwise the configured default.
    pub fn effective_limit(&self, requested: Option<usize>) -> Option<usize> {
        requested.or(self.default_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ClientConfig::default();
        assert_eq!(cfg.project, "demo");
        assert_eq!(cfg.default_limit, None);
    }

    #[test]
    fn test_parse_toml() {
        let cfg: ClientConfig = toml::from_str(
            r#"
            project = "hq"
            default_limit = 100
            "#,
        )
        .unwrap();
        assert_eq!(cfg.project, "hq");
        assert_eq!(cfg.default_limit, Some(100));
    }

    #[test]
    fn test_effective_limit() {
        let cfg = ClientConfig {
            project: "hq".to_string(),
            default_limit: Some(50),
        };
        assert_eq!(cfg.effective_limit(Some(5)), Some(5));
        assert_eq!(cfg.effective_limit(None), Some(50));
        assert_eq!(ClientConfig::default().effective_limit(None), None);
    }
}

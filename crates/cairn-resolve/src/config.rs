//! Resolver configuration
//!
//! Stored in `~/.config/cairn/config.yaml`

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ResolveError, Result};

/// Resolver configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Base URL of the definition catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_url: Option<String>,

    /// Bearer token sent to the catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_token: Option<String>,

    /// Timeout for each HTTP fetch
    #[serde(default = "default_http_timeout", with = "humantime_serde")]
    pub http_timeout: Duration,

    /// Upper bound on in-flight HTTP fetches during one resolution
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
}

fn default_http_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_concurrent_fetches() -> usize {
    8
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog_url: None,
            catalog_token: None,
            http_timeout: default_http_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
        }
    }
}

impl ResolverConfig {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| ResolveError::InvalidConfig {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to default location
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self).map_err(|e| ResolveError::InvalidConfig {
            message: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| ResolveError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("cairn").join("config.yaml"))
    }

    /// Check values that would make resolution misbehave
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == 0 {
            return Err(ResolveError::InvalidConfig {
                message: "max_concurrent_fetches must be at least 1".to_string(),
            });
        }

        if let Some(raw) = &self.catalog_url {
            let url = url::Url::parse(raw).map_err(|e| ResolveError::InvalidConfig {
                message: format!("catalog_url `{raw}`: {e}"),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ResolveError::InvalidConfig {
                    message: format!("catalog_url `{raw}` must be http or https"),
                });
            }
        }

        Ok(())
    }

    /// Apply overrides from flags or environment
    pub fn with_overrides(mut self, catalog_url: Option<String>, catalog_token: Option<String>) -> Self {
        if catalog_url.is_some() {
            self.catalog_url = catalog_url;
        }
        if catalog_token.is_some() {
            self.catalog_token = catalog_token;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::default();
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.max_concurrent_fetches, 8);
        assert!(config.catalog_url.is_none());
    }

    #[test]
    fn test_load_humantime() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "catalog_url: https://catalog.example.com\nhttp_timeout: 5s\n",
        )
        .unwrap();

        let config = ResolverConfig::load_from(&path).unwrap();
        assert_eq!(config.http_timeout, Duration::from_secs(5));
        assert_eq!(config.max_concurrent_fetches, 8);
        assert_eq!(
            config.catalog_url.as_deref(),
            Some("https://catalog.example.com")
        );
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.yaml");

        let config = ResolverConfig {
            catalog_token: Some("secret".to_string()),
            max_concurrent_fetches: 2,
            ..Default::default()
        };
        config.save_to(&path).unwrap();

        assert_eq!(ResolverConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = ResolverConfig {
            max_concurrent_fetches: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ResolveError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_catalog_url() {
        let config = ResolverConfig {
            catalog_url: Some("ftp://catalog".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ResolverConfig {
            catalog_url: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = ResolverConfig {
            catalog_url: Some("https://a.example.com".to_string()),
            ..Default::default()
        }
        .with_overrides(None, Some("t".to_string()));

        assert_eq!(config.catalog_url.as_deref(), Some("https://a.example.com"));
        assert_eq!(config.catalog_token.as_deref(), Some("t"));
    }
}

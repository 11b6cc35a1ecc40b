//! Configuration system for Rankwise.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> overrides.
//! Configuration is loaded from `~/.config/rankwise/config.toml` and/or `.rankwise/config.toml`
//! in the workspace directory.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::ranking::{DEFAULT_ALTERNATIVES_LIMIT, PRICE_PLACEHOLDER};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankwiseConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
}

/// Where catalog data comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON or TOML catalog file. The bundled seed catalog is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// Products listed on an alternatives page.
    pub alternatives_limit: usize,
    /// Products listed in "top picks" sections.
    pub top_rated_limit: usize,
    /// Shown instead of a price when a product has no plans.
    pub price_placeholder: String,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            alternatives_limit: DEFAULT_ALTERNATIVES_LIMIT,
            top_rated_limit: 5,
            price_placeholder: PRICE_PLACEHOLDER.to_string(),
        }
    }
}

/// Leak probe settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// STUN server used for ICE gathering, as `host:port`.
    pub stun_server: String,
    /// Endpoint returning the caller's IP and network metadata as JSON.
    pub ip_info_url: String,
    /// Hard upper bound on ICE gathering.
    pub ice_timeout_ms: u64,
    /// Hard upper bound on the IP lookup.
    pub fetch_timeout_ms: u64,
    /// Provider names that indicate a residential connection without a VPN.
    pub consumer_isp_keywords: Vec<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            stun_server: "stun.l.google.com:19302".to_string(),
            ip_info_url: "https://ipapi.co/json/".to_string(),
            ice_timeout_ms: 5000,
            fetch_timeout_ms: 5000,
            consumer_isp_keywords: [
                "comcast",
                "xfinity",
                "spectrum",
                "charter",
                "at&t",
                "verizon",
                "cox communications",
                "centurylink",
                "lumen",
                "frontier",
                "optimum",
                "altice",
                "t-mobile",
                "windstream",
                "mediacom",
                "suddenlink",
                "rogers",
                "bell canada",
                "virgin media",
                "british telecommunications",
                "sky broadband",
                "deutsche telekom",
                "orange",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl RankwiseConfig {
    /// Reject settings that would make the ranking or probe misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ranking.alternatives_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "ranking.alternatives_limit must be at least 1".into(),
            });
        }
        if self.ranking.top_rated_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "ranking.top_rated_limit must be at least 1".into(),
            });
        }
        if self.probe.ice_timeout_ms == 0 || self.probe.fetch_timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                message: "probe timeouts must be greater than zero".into(),
            });
        }
        if self.probe.stun_server.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "probe.stun_server must not be empty".into(),
            });
        }
        match url::Url::parse(&self.probe.ip_info_url) {
            Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
            _ => Err(ConfigError::Invalid {
                message: format!(
                    "probe.ip_info_url is not an http(s) URL: {}",
                    self.probe.ip_info_url
                ),
            }),
        }
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides (passed as argument)
/// 2. Environment variables (prefixed with `RANKWISE_`)
/// 3. Workspace-local config (`.rankwise/config.toml`)
/// 4. User config (`~/.config/rankwise/config.toml`)
/// 5. Built-in defaults
///
/// `overrides` is merged as a whole config, so every one of its fields,
/// defaults included, replaces the file and environment layers. Callers
/// that only want to change a few keys should pass `None` and set those
/// fields on the returned config.
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&RankwiseConfig>,
) -> Result<RankwiseConfig, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(RankwiseConfig::default()));

    // User-level config
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "rankwise", "rankwise") {
        let user_config = config_dir.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    // Workspace-level config
    if let Some(ws) = workspace {
        let ws_config = ws.join(".rankwise").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // Environment variables (RANKWISE_PROBE__STUN_SERVER, RANKWISE_CATALOG__PATH, etc.)
    figment = figment.merge(Env::prefixed("RANKWISE_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    let config: RankwiseConfig = figment.extract().map_err(|e| ConfigError::ParseError {
        message: e.to_string(),
    })?;
    config.validate()?;
    Ok(config)
}

/// Check whether any Rankwise configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if let Some(config_dir) = directories::ProjectDirs::from("dev", "rankwise", "rankwise") {
        if config_dir.config_dir().join("config.toml").exists() {
            return true;
        }
    }

    if let Some(ws) = workspace {
        if ws.join(".rankwise").join("config.toml").exists() {
            return true;
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RankwiseConfig::default();
        assert_eq!(config.ranking.alternatives_limit, 7);
        assert_eq!(config.ranking.price_placeholder, "N/A");
        assert_eq!(config.probe.ice_timeout_ms, 5000);
        assert_eq!(config.probe.fetch_timeout_ms, 5000);
        assert!(config.catalog.path.is_none());
        assert!(config.probe.consumer_isp_keywords.iter().any(|k| k == "comcast"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = RankwiseConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: RankwiseConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.probe.stun_server, config.probe.stun_server);
        assert_eq!(parsed.ranking.top_rated_limit, config.ranking.top_rated_limit);
    }

    #[test]
    fn test_validate_rejects_zero_limits_and_timeouts() {
        let mut config = RankwiseConfig::default();
        config.ranking.alternatives_limit = 0;
        assert!(config.validate().is_err());

        let mut config = RankwiseConfig::default();
        config.probe.fetch_timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_ip_info_url() {
        let mut config = RankwiseConfig::default();
        config.probe.ip_info_url = "file:///etc/hosts".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ip_info_url"));
    }

    #[test]
    fn test_load_config_workspace_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".rankwise");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            r#"
[ranking]
alternatives_limit = 3

[probe]
ice_timeout_ms = 2500
"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.ranking.alternatives_limit, 3);
        assert_eq!(config.probe.ice_timeout_ms, 2500);
        // Untouched keys keep their defaults.
        assert_eq!(config.probe.fetch_timeout_ms, 5000);
        assert!(config_exists(Some(dir.path())));
    }

    #[test]
    fn test_load_config_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        let mut overrides = RankwiseConfig::default();
        overrides.catalog.path = Some(PathBuf::from("/srv/catalog.json"));
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.catalog.path, Some(PathBuf::from("/srv/catalog.json")));
    }

    #[test]
    fn test_load_config_overrides_replace_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".rankwise");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[ranking]\nalternatives_limit = 3\n",
        )
        .unwrap();

        let overrides = RankwiseConfig::default();
        let config = load_config(Some(dir.path()), Some(&overrides)).unwrap();
        assert_eq!(config.ranking.alternatives_limit, 7);

        let config = load_config(Some(dir.path()), None).unwrap();
        assert_eq!(config.ranking.alternatives_limit, 3);
    }

    #[test]
    fn test_load_config_invalid_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config_dir = dir.path().join(".rankwise");
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(
            config_dir.join("config.toml"),
            "[ranking]\nalternatives_limit = 0\n",
        )
        .unwrap();
        assert!(matches!(
            load_config(Some(dir.path()), None),
            Err(ConfigError::Invalid { .. })
        ));
    }
}

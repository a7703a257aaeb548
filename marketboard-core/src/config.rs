//! Board configuration loaded from TOML.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::board::FallbackPolicy;
use crate::data::polygon::{PolygonSettings, DEFAULT_BASE_URL};
use crate::data::DataError;
use crate::domain::AssetClass;
use crate::rank::RankPolicy;
use crate::window::Horizon;

const BUNDLED_CONFIG: &str = include_str!("../config/board.toml");

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Live provider settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Max observations per symbol and window.
    pub limit: usize,
    pub fallback: FallbackPolicy,
    /// Snapshot file for the fallback source. The bundled snapshot is used when absent.
    pub fallback_file: Option<PathBuf>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key_env: "POLYGON_API_KEY".to_string(),
            timeout_secs: 30,
            limit: 5000,
            fallback: FallbackPolicy::default(),
            fallback_file: None,
        }
    }
}

impl ProviderConfig {
    /// Polygon settings with the API key read from `api_key_env`.
    pub fn polygon_settings(&self) -> Result<PolygonSettings, DataError> {
        Ok(PolygonSettings::from_env(&self.api_key_env)?
            .with_base_url(self.base_url.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs)))
    }
}

fn default_horizons() -> Vec<Horizon> {
    Horizon::ALL.to_vec()
}

fn default_true() -> bool {
    true
}

/// One board: an asset category with its ticker list and presentation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    #[serde(default)]
    pub asset_class: AssetClass,
    /// Authoritative ticker list, in display order before ranking.
    pub symbols: Vec<String>,
    /// Display names keyed by ticker.
    #[serde(default)]
    pub names: BTreeMap<String, String>,
    #[serde(default = "default_horizons")]
    pub horizons: Vec<Horizon>,
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub sort_by: Option<Horizon>,
    #[serde(default = "default_true")]
    pub drop_non_positive: bool,
}

impl Category {
    pub fn new(name: impl Into<String>, asset_class: AssetClass, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            asset_class,
            symbols,
            names: BTreeMap::new(),
            horizons: default_horizons(),
            top_n: None,
            sort_by: None,
            drop_non_positive: true,
        }
    }

    /// Display name for a listed symbol. Names for unlisted symbols are never returned.
    pub fn display_name(&self, symbol: &str) -> Option<&str> {
        if !self.symbols.iter().any(|s| s == symbol) {
            return None;
        }
        self.names.get(symbol).map(String::as_str)
    }

    pub fn rank_policy(&self) -> RankPolicy {
        RankPolicy {
            drop_non_positive: self.drop_non_positive,
            sort_by: self.sort_by.map(|h| h.label().to_string()),
            top_n: self.top_n,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("category with empty name".into()));
        }
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has no symbols",
                self.name
            )));
        }
        if self.horizons.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has no horizons",
                self.name
            )));
        }
        if let Some(sort_by) = self.sort_by {
            if !self.horizons.contains(&sort_by) {
                return Err(ConfigError::Invalid(format!(
                    "category '{}' sorts by {sort_by}, which is not one of its horizons",
                    self.name
                )));
            }
        }
        if self.top_n == Some(0) {
            return Err(ConfigError::Invalid(format!(
                "category '{}' has top_n = 0",
                self.name
            )));
        }
        for symbol in self.names.keys() {
            if !self.symbols.contains(symbol) {
                debug!(category = %self.name, %symbol, "ignoring name for unlisted symbol");
            }
        }
        Ok(())
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(rename = "category", default)]
    pub categories: Vec<Category>,
}

impl BoardConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// The configuration shipped with the crate.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_toml(BUNDLED_CONFIG)
    }

    pub fn category(&self, name: &str) -> Option<&Category> {
        self.categories
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.limit == 0 {
            return Err(ConfigError::Invalid("provider.limit must be positive".into()));
        }
        let mut seen = HashSet::new();
        for category in &self.categories {
            category.validate()?;
            if !seen.insert(category.name.to_ascii_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate category '{}'",
                    category.name
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[[category]]
name = "fx"
asset_class = "forex"
symbols = ["C:EURUSD", "C:GBPUSD"]
horizons = ["1M", "1Y"]
top_n = 1
sort_by = "1M"
[category.names]
"C:EURUSD" = "Euro"
"CADX" = "Canadian Dollar Index"
"#;

    #[test]
    fn bundled_config_is_valid() {
        let config = BoardConfig::bundled().unwrap();
        let tops: Vec<Option<usize>> = config.categories.iter().map(|c| c.top_n).collect();
        assert_eq!(tops, vec![Some(4), Some(6), Some(7), Some(8), Some(11)]);
        assert_eq!(config.category("CURRENCIES").unwrap().asset_class, AssetClass::Forex);
    }

    #[test]
    fn parses_minimal_config_with_defaults() {
        let config = BoardConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.provider, ProviderConfig::default());
        let fx = config.category("fx").unwrap();
        assert_eq!(fx.horizons, vec![Horizon::OneMonth, Horizon::OneYear]);
        assert!(fx.drop_non_positive);
        assert_eq!(
            fx.rank_policy(),
            RankPolicy {
                drop_non_positive: true,
                sort_by: Some("1M".into()),
                top_n: Some(1),
            }
        );
    }

    #[test]
    fn ticker_list_is_authoritative_for_names() {
        let config = BoardConfig::from_toml(MINIMAL).unwrap();
        let fx = config.category("fx").unwrap();
        assert_eq!(fx.display_name("C:EURUSD"), Some("Euro"));
        assert_eq!(fx.display_name("C:GBPUSD"), None);
        assert_eq!(fx.display_name("CADX"), None);
    }

    #[test]
    fn default_horizons_are_all_eight() {
        let config = BoardConfig::from_toml("[[category]]\nname = \"a\"\nsymbols = [\"X\"]\n").unwrap();
        assert_eq!(config.categories[0].horizons.len(), 8);
        assert_eq!(config.categories[0].asset_class, AssetClass::Equity);
    }

    #[test]
    fn rejects_unknown_horizon() {
        let toml = "[[category]]\nname = \"a\"\nsymbols = [\"X\"]\nhorizons = [\"2W\"]\n";
        assert!(matches!(BoardConfig::from_toml(toml), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_sort_by_outside_horizons() {
        let toml = "[[category]]\nname = \"a\"\nsymbols = [\"X\"]\nhorizons = [\"1M\"]\nsort_by = \"1Y\"\n";
        assert!(matches!(BoardConfig::from_toml(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_duplicate_and_empty_categories() {
        let dup = "[[category]]\nname = \"a\"\nsymbols = [\"X\"]\n[[category]]\nname = \"A\"\nsymbols = [\"Y\"]\n";
        assert!(matches!(BoardConfig::from_toml(dup), Err(ConfigError::Invalid(_))));
        let empty = "[[category]]\nname = \"a\"\nsymbols = []\n";
        assert!(matches!(BoardConfig::from_toml(empty), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_top_n() {
        let toml = "[[category]]\nname = \"a\"\nsymbols = [\"X\"]\ntop_n = 0\n";
        assert!(matches!(BoardConfig::from_toml(toml), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_zero_provider_limit() {
        let toml = "[provider]\nlimit = 0\n\n[[category]]\nname = \"a\"\nsymbols = [\"X\"]\n";
        match BoardConfig::from_toml(toml) {
            Err(ConfigError::Invalid(msg)) => assert!(msg.contains("limit")),
            other => panic!("expected Invalid, got: {other:?}"),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BoardConfig::from_file(Path::new("/nonexistent/board.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}

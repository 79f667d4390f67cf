// Handles configuration loading, saving, and defaults.
use crate::context::AppContext;
use crate::model::CountryTable;
use crate::time::{REFERENCE_TIMEZONE, TimeConverter};
use anyhow::{Context, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::time::Duration;

fn default_api_url() -> String {
    "http://localhost:8080/api".to_string()
}

fn default_reference_timezone() -> String {
    REFERENCE_TIMEZONE.to_string()
}

fn default_viewer_timezone() -> String {
    "UTC".to_string()
}

fn default_cascade_delay() -> u64 {
    250
}

fn default_feedback_delay() -> u64 {
    400
}

fn default_user_agent() -> String {
    format!("cmsprobe/{}", env!("CARGO_PKG_VERSION"))
}

fn default_countries() -> BTreeMap<String, String> {
    [
        ("US", "United States"),
        ("CA", "Canada"),
        ("MX", "Mexico"),
        ("GB", "United Kingdom"),
        ("FR", "France"),
        ("DE", "Germany"),
        ("ES", "Spain"),
        ("UA", "Ukraine"),
        ("CN", "China"),
        ("BD", "Bangladesh"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_reference_timezone")]
    pub reference_timezone: String,
    #[serde(default = "default_viewer_timezone")]
    pub viewer_timezone: String,
    #[serde(default = "default_cascade_delay")]
    pub cascade_delay_ms: u64,
    #[serde(default = "default_feedback_delay")]
    pub feedback_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_countries")]
    pub countries: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: None,
            reference_timezone: default_reference_timezone(),
            viewer_timezone: default_viewer_timezone(),
            cascade_delay_ms: default_cascade_delay(),
            feedback_delay_ms: default_feedback_delay(),
            user_agent: default_user_agent(),
            countries: default_countries(),
        }
    }
}

impl Config {
    /// Load the configuration from disk using an explicit context.
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        if !path.exists() {
            return Err(anyhow::anyhow!("Config file not found"));
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))?;

        Ok(config)
    }

    /// Like `load`, but a missing file yields the defaults.
    pub fn load_or_default(ctx: &dyn AppContext) -> Result<Self> {
        match Self::load(ctx) {
            Ok(cfg) => Ok(cfg),
            Err(e) if Self::is_missing_config_error(&e) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Whether `err` means the config file was missing, either through the
    /// explicit message or an io NotFound anywhere in the chain.
    pub fn is_missing_config_error(err: &Error) -> bool {
        if err.to_string().contains("Config file not found") {
            return true;
        }

        for cause in err.chain() {
            if let Some(io_err) = cause.downcast_ref::<std::io::Error>()
                && io_err.kind() == std::io::ErrorKind::NotFound
            {
                return true;
            }
        }

        false
    }

    /// Writes to a sibling temp file first, then renames over the target.
    pub fn save(&self, ctx: &dyn AppContext) -> Result<()> {
        let path = ctx.get_config_file_path()?;
        let toml_str = toml::to_string_pretty(self)?;
        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, toml_str)
            .with_context(|| format!("Failed to write '{}'", tmp.display()))?;
        fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace '{}'", path.display()))?;
        Ok(())
    }

    pub fn get_path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn converter(&self) -> Result<TimeConverter, String> {
        TimeConverter::from_names(&self.reference_timezone, &self.viewer_timezone)
    }

    pub fn country_table(&self) -> CountryTable {
        CountryTable::from_map(&self.countries)
    }

    pub fn cascade_delay(&self) -> Duration {
        Duration::from_millis(self.cascade_delay_ms)
    }

    pub fn feedback_delay(&self) -> Duration {
        Duration::from_millis(self.feedback_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TestContext;

    #[test]
    fn test_missing_file_is_detected() {
        let ctx = TestContext::new();
        let err = Config::load(&ctx).unwrap_err();
        assert!(Config::is_missing_config_error(&err));
        assert_eq!(Config::load_or_default(&ctx).unwrap(), Config::default());
    }

    #[test]
    fn test_save_then_load() {
        let ctx = TestContext::new();
        let cfg = Config {
            api_url: "https://cms.example.org/api".to_string(),
            access_token: Some("secret".to_string()),
            cascade_delay_ms: 10,
            ..Default::default()
        };
        cfg.save(&ctx).unwrap();
        assert_eq!(Config::load(&ctx).unwrap(), cfg);
    }

    #[test]
    fn test_partial_file_gets_defaults() {
        let ctx = TestContext::new();
        let path = ctx.get_config_file_path().unwrap();
        fs::write(&path, "viewer_timezone = \"Europe/Paris\"\n").unwrap();
        let cfg = Config::load(&ctx).unwrap();
        assert_eq!(cfg.viewer_timezone, "Europe/Paris");
        assert_eq!(cfg.reference_timezone, "America/New_York");
        assert_eq!(cfg.feedback_delay_ms, 400);
        assert!(cfg.converter().is_ok());
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let cfg = Config {
            viewer_timezone: "Mars/Olympus".to_string(),
            ..Default::default()
        };
        assert!(cfg.converter().is_err());
    }
}

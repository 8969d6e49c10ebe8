#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::module_name_repetitions
)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use alvin_core::{DEFAULT_BATCH_SIZE, ErrorPolicy, TransformerSettings};

/// Key of the transformer section; matches `AlvinTransformer::SCOPE`.
pub const TRANSFORMER_SECTION: &str = "transformer.alvin_transformer";

/// Optional dotenv file with credentials, looked up in the working directory.
pub const CREDENTIALS_FILE: &str = "credentials.env";

const MAX_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(rename = "transformer.alvin_transformer")]
    pub alvin: AlvinConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub task: TaskConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AlvinConfig {
    #[serde(default)]
    pub platform_id: String,
    #[serde(default)]
    pub platform_type: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub alvin_instance_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tableau_site_name: Option<String>,
    #[serde(default = "AlvinConfig::default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "AlvinConfig::default_concurrency")]
    pub concurrency: usize,
}

impl AlvinConfig {
    const fn default_batch_size() -> usize {
        DEFAULT_BATCH_SIZE
    }

    const fn default_concurrency() -> usize {
        1
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    #[serde(default = "HttpConfig::default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "HttpConfig::default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout_secs(),
            retry_delays_ms: Self::default_retry_delays_ms(),
        }
    }
}

impl HttpConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    fn default_retry_delays_ms() -> Vec<u64> {
        vec![500, 1000, 2000]
    }

    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    #[must_use]
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .copied()
            .map(Duration::from_millis)
            .collect()
    }

    /// Upper bound for one batch call: every attempt timing out plus every
    /// pause between attempts.
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        let attempts = u32::try_from(self.retry_delays_ms.len() + 1).unwrap_or(u32::MAX);
        self.timeout().saturating_mul(attempts) + self.retry_delays().iter().sum::<Duration>()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TaskConfig {
    #[serde(default)]
    pub error_policy: ErrorPolicy,
}

impl Config {
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("alvin"))
    }

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }

    /// Load the config file, apply environment overrides and validate.
    ///
    /// `credentials.env` in the working directory, when present, is loaded
    /// into the environment first.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'alvin init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let mut config = Self::from_json(&content)?;

        match dotenvy::from_filename(CREDENTIALS_FILE) {
            Ok(path) => info!("Loaded credentials from {}", path.display()),
            Err(e) if e.not_found() => debug!("No {CREDENTIALS_FILE} found"),
            Err(e) => return Err(e.into()),
        }
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Override transformer options from `lookup`, which maps environment
    /// variable names to values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let alvin = &mut self.alvin;
        let targets: [(&str, &mut String); 4] = [
            ("ALVIN_API_KEY", &mut alvin.api_key),
            ("ALVIN_PLATFORM_ID", &mut alvin.platform_id),
            ("ALVIN_PLATFORM_TYPE", &mut alvin.platform_type),
            ("ALVIN_INSTANCE_URL", &mut alvin.alvin_instance_url),
        ];
        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.is_empty()) {
                debug!("Overriding {key} from environment");
                *target = value;
            }
        }
        if let Some(site) = lookup("TABLEAU_SITE_NAME") {
            alvin.tableau_site_name = Some(site);
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let alvin = &self.alvin;
        for (name, value) in [
            ("platform_id", &alvin.platform_id),
            ("platform_type", &alvin.platform_type),
            ("api_key", &alvin.api_key),
            ("alvin_instance_url", &alvin.alvin_instance_url),
        ] {
            if value.trim().is_empty() {
                anyhow::bail!("{TRANSFORMER_SECTION}.{name} is required");
            }
        }

        let url = url::Url::parse(&alvin.alvin_instance_url).map_err(|e| {
            anyhow::anyhow!("Invalid alvin_instance_url {}: {e}", alvin.alvin_instance_url)
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("alvin_instance_url must be http or https, got {}", url.scheme());
        }

        if !(1..=MAX_BATCH_SIZE).contains(&alvin.batch_size) {
            anyhow::bail!(
                "batch_size must be between 1 and {MAX_BATCH_SIZE}, got {}",
                alvin.batch_size
            );
        }
        if alvin.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        Ok(())
    }

    #[must_use]
    pub fn transformer_settings(&self) -> TransformerSettings {
        TransformerSettings {
            platform_id: self.alvin.platform_id.clone(),
            platform_type: self.alvin.platform_type.clone(),
            dashboard_site_name: self
                .alvin
                .tableau_site_name
                .clone()
                .filter(|site| !site.is_empty()),
            batch_size: self.alvin.batch_size,
            concurrency: self.alvin.concurrency,
        }
    }

    /// Copy with the API key masked, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if !config.alvin.api_key.is_empty() {
            config.alvin.api_key = "********".to_string();
        }
        config
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = Self::config_dir()?;
        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<PathBuf> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");
        Self::write_template(&config_path)?;
        Ok(config_path)
    }

    /// Write the template config to `path`, refusing to overwrite.
    pub fn write_template(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }

        let config_template = r#"{
  "transformer.alvin_transformer": {
    "platform_id": "your-platform-id",
    "platform_type": "bigquery",
    "api_key": "your-alvin-api-key-here",
    "alvin_instance_url": "https://app.alvin.ai",
    "batch_size": 10,
    "concurrency": 1
  },
  "http": {
    "timeout_secs": 30,
    "retry_delays_ms": [500, 1000, 2000]
  },
  "task": {
    "error_policy": "skip"
  }
}"#;

        std::fs::write(path, config_template)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "transformer.alvin_transformer": {
            "platform_id": "bq-prod",
            "platform_type": "bigquery",
            "api_key": "k",
            "alvin_instance_url": "https://alvin.example.com"
        }
    }"#;

    #[test]
    fn section_key_matches_transformer_scope() {
        assert_eq!(TRANSFORMER_SECTION, alvin_core::AlvinTransformer::SCOPE);
    }

    #[test]
    fn minimal_config_gets_defaults() -> anyhow::Result<()> {
        let config = Config::from_json(MINIMAL)?;
        config.validate()?;

        assert_eq!(config.alvin.batch_size, 10);
        assert_eq!(config.alvin.concurrency, 1);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.task.error_policy, ErrorPolicy::Skip);
        assert_eq!(config.transformer_settings().dashboard_site_name, None);
        Ok(())
    }

    #[test]
    fn missing_required_option_fails_validation() -> anyhow::Result<()> {
        let config = Config::from_json(
            r#"{"transformer.alvin_transformer": {"platform_id": "p", "platform_type": "bigquery"}}"#,
        )?;
        let err = config.validate().err().map(|e| e.to_string()).unwrap_or_default();
        assert!(err.contains("api_key"), "{err}");
        Ok(())
    }

    #[test]
    fn environment_overrides_file_values() -> anyhow::Result<()> {
        let mut config = Config::from_json(MINIMAL)?;
        config.apply_overrides(|key| match key {
            "ALVIN_API_KEY" => Some("from-env".to_string()),
            "ALVIN_PLATFORM_ID" => Some(String::new()),
            "TABLEAU_SITE_NAME" => Some("analytics".to_string()),
            _ => None,
        });

        assert_eq!(config.alvin.api_key, "from-env");
        assert_eq!(config.alvin.platform_id, "bq-prod");
        assert_eq!(
            config.transformer_settings().dashboard_site_name.as_deref(),
            Some("analytics")
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_url_and_batch_size() -> anyhow::Result<()> {
        let mut config = Config::from_json(MINIMAL)?;
        config.alvin.alvin_instance_url = "ftp://alvin.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::from_json(MINIMAL)?;
        config.alvin.batch_size = 0;
        assert!(config.validate().is_err());
        Ok(())
    }

    #[test]
    fn empty_site_name_is_absent() -> anyhow::Result<()> {
        let mut config = Config::from_json(MINIMAL)?;
        config.alvin.tableau_site_name = Some(String::new());
        assert_eq!(config.transformer_settings().dashboard_site_name, None);
        Ok(())
    }

    #[test]
    fn call_timeout_covers_every_attempt() {
        let http = HttpConfig {
            timeout_secs: 10,
            retry_delays_ms: vec![500, 1500],
        };
        assert_eq!(http.call_timeout(), Duration::from_secs(32));
    }

    #[test]
    fn redacted_masks_api_key() -> anyhow::Result<()> {
        let config = Config::from_json(MINIMAL)?.redacted();
        assert_eq!(config.alvin.api_key, "********");
        Ok(())
    }

    #[test]
    fn template_round_trips_and_is_not_overwritten() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("config.json");

        Config::write_template(&path)?;
        let config = Config::load(Some(&path))?;
        assert_eq!(config.alvin.platform_type, "bigquery");

        assert!(Config::write_template(&path).is_err());
        Ok(())
    }
}

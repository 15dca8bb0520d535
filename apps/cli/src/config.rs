//! Configuration for the `ddcc` command line

use serde::Deserialize;
use std::time::Duration;
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub registry: RegistryConfig,
    pub identifiers: IdentifiersConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// FHIR base of the registry; historical documents are read from here.
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,
    /// Transaction endpoint. Defaults to `base_url`.
    #[serde(default)]
    pub submission_url: Option<String>,
    /// Per-request timeout in seconds. 0 disables the timeout.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentifiersConfig {
    /// System of the submission set `usual`/`official` identifiers
    #[serde(default = "default_submission_set_system")]
    pub submission_set_system: String,
    /// System of the folder identifiers, keyed by the holder's certificate id
    #[serde(default = "default_folder_system")]
    pub folder_system: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON formatting for logs
    #[serde(default)]
    pub json: bool,
}

fn default_registry_base_url() -> String {
    "http://localhost:8080/fhir/".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_submission_set_system() -> String {
    "urn:ietf:rfc:3986".to_string()
}

fn default_folder_system() -> String {
    "http://worldhealthorganization.github.io/ddcc/folder".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from defaults, an optional `ddcc` config file and the environment
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("registry.base_url", default_registry_base_url())?
            .set_default("registry.timeout_seconds", default_timeout_seconds())?
            .set_default(
                "identifiers.submission_set_system",
                default_submission_set_system(),
            )?
            .set_default("identifiers.folder_system", default_folder_system())?
            .set_default("logging.level", default_log_level())?
            .set_default("logging.json", false)?
            .add_source(config::File::with_name("ddcc").required(false))
            // DDCC__REGISTRY__BASE_URL -> registry.base_url
            .add_source(
                config::Environment::with_prefix("DDCC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.registry_base_url()?;
        self.submission_url()?;

        if self.identifiers.submission_set_system.trim().is_empty() {
            return Err("identifiers.submission_set_system must not be empty".to_string());
        }
        if self.identifiers.folder_system.trim().is_empty() {
            return Err("identifiers.folder_system must not be empty".to_string());
        }

        let level = self.logging.level.to_ascii_lowercase();
        if !["trace", "debug", "info", "warn", "error"].contains(&level.as_str()) {
            return Err(format!(
                "logging.level must be one of trace, debug, info, warn, error (got {})",
                self.logging.level
            ));
        }

        Ok(())
    }

    pub fn registry_base_url(&self) -> Result<Url, String> {
        parse_http_url("registry.base_url", &self.registry.base_url)
    }

    pub fn submission_url(&self) -> Result<Option<Url>, String> {
        self.registry
            .submission_url
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_http_url("registry.submission_url", s))
            .transpose()
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.registry.timeout_seconds > 0)
            .then(|| Duration::from_secs(self.registry.timeout_seconds))
    }
}

fn parse_http_url(key: &str, value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("{key} is not a valid URL: {e}"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(format!("{key} must be an http(s) URL"));
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            registry: RegistryConfig {
                base_url: default_registry_base_url(),
                submission_url: None,
                timeout_seconds: default_timeout_seconds(),
            },
            identifiers: IdentifiersConfig {
                submission_set_system: default_submission_set_system(),
                folder_system: default_folder_system(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
            },
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = config();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.submission_url(), Ok(None));
    }

    #[test]
    fn test_rejects_non_http_base() {
        let mut config = config();
        config.registry.base_url = "ftp://registry/fhir".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blank_submission_url_means_base() {
        let mut config = config();
        config.registry.submission_url = Some("  ".to_string());
        assert_eq!(config.submission_url(), Ok(None));
    }

    #[test]
    fn test_zero_timeout_disables_it() {
        let mut config = config();
        config.registry.timeout_seconds = 0;
        assert_eq!(config.timeout(), None);
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let mut config = config();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }
}

//! Configuration management for the prompt relay.
//!
//! Configuration is read once from the process environment at startup and
//! passed into handler state explicitly, so tests can build an [`AppConfig`]
//! with a fake key without touching the environment.

use crate::transformer::ExtractionMode;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port)
    #[serde(default)]
    pub server: ServerConfig,

    /// Upstream generative API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Whether to verify SSL certificates for upstream requests
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,

    /// Request timeout in seconds for the upstream exchange
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Connect timeout in seconds for the upstream
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// How text fragments are pulled out of the upstream byte stream
    #[serde(default)]
    pub extraction_mode: ExtractionMode,
}

/// Upstream (Gemini) endpoint configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL, without trailing slash
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Model path segment used in `models/{model}:streamGenerateContent`
    #[serde(default = "default_model")]
    pub model: String,

    /// API key passed as the `key` query parameter. `None` is a request-time
    /// configuration error, not a startup failure.
    #[serde(default)]
    pub api_key: Option<String>,
}

// Keep the key out of debug logs.
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl UpstreamConfig {
    /// Returns the configured key if it is present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.is_empty())
    }

    /// Streaming generation URL, without the key.
    pub fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent",
            self.api_base, self.model
        )
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
        }
    }
}

/// Server-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            upstream: UpstreamConfig::default(),
            verify_ssl: default_verify_ssl(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            extraction_mode: ExtractionMode::default(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    18000
}

fn default_api_base() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_verify_ssl() -> bool {
    true
}

fn default_request_timeout() -> u64 {
    300
}

fn default_connect_timeout() -> u64 {
    10
}

impl AppConfig {
    /// Build configuration from environment variables.
    ///
    /// Unset or unparsable numeric and boolean values fall back to their
    /// defaults. An unknown `STREAM_EXTRACTION_MODE` is an error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prompt_relay::core::config::AppConfig;
    ///
    /// let config = AppConfig::from_env().expect("Failed to load config");
    /// ```
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            let key = key.trim().to_string();
            if !key.is_empty() {
                config.upstream.api_key = Some(key);
            }
        }

        if let Ok(base) = std::env::var("GEMINI_API_BASE") {
            let base = base.trim().trim_end_matches('/');
            if !base.is_empty() {
                config.upstream.api_base = base.to_string();
            }
        }

        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            let model = model.trim();
            if !model.is_empty() {
                config.upstream.model = model.to_string();
            }
        }

        if let Ok(host) = std::env::var("HOST") {
            config.server.host = host;
        }

        if let Ok(port_str) = std::env::var("PORT") {
            if let Ok(port) = port_str.parse::<u16>() {
                config.server.port = port;
            }
        }

        if let Ok(verify_ssl_str) = std::env::var("VERIFY_SSL") {
            config.verify_ssl = str_to_bool(&verify_ssl_str);
        }

        if let Ok(timeout_str) = std::env::var("REQUEST_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                config.request_timeout_secs = timeout;
            }
        }

        if let Ok(timeout_str) = std::env::var("CONNECT_TIMEOUT_SECS") {
            if let Ok(timeout) = timeout_str.parse::<u64>() {
                config.connect_timeout_secs = timeout;
            }
        }

        if let Ok(mode) = std::env::var("STREAM_EXTRACTION_MODE") {
            config.extraction_mode = mode
                .parse::<ExtractionMode>()
                .map_err(|e| anyhow!("Invalid STREAM_EXTRACTION_MODE: {}", e))?;
        }

        Ok(config)
    }
}

/// Convert string to boolean.
///
/// Accepts: true, 1, yes, on (case-insensitive)
fn str_to_bool(s: &str) -> bool {
    matches!(s.to_lowercase().as_str(), "true" | "1" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: &[&str] = &[
        "GEMINI_API_KEY",
        "GEMINI_API_BASE",
        "GEMINI_MODEL",
        "HOST",
        "PORT",
        "VERIFY_SSL",
        "REQUEST_TIMEOUT_SECS",
        "CONNECT_TIMEOUT_SECS",
        "STREAM_EXTRACTION_MODE",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    fn test_str_to_bool() {
        assert!(str_to_bool("true"));
        assert!(str_to_bool("True"));
        assert!(str_to_bool("1"));
        assert!(str_to_bool("yes"));
        assert!(str_to_bool("ON"));
        assert!(!str_to_bool("false"));
        assert!(!str_to_bool("0"));
        assert!(!str_to_bool("off"));
        assert!(!str_to_bool(""));
        assert!(!str_to_bool("invalid"));
    }

    #[test]
    fn test_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 18000);
        assert!(config.verify_ssl);
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.extraction_mode, ExtractionMode::Incremental);
        assert!(config.upstream.api_key().is_none());
    }

    #[test]
    fn test_stream_url() {
        let upstream = UpstreamConfig {
            api_base: "http://localhost:9000".to_string(),
            model: "gemini-pro".to_string(),
            api_key: Some("secret".to_string()),
        };
        assert_eq!(
            upstream.stream_url(),
            "http://localhost:9000/v1beta/models/gemini-pro:streamGenerateContent"
        );
    }

    #[test]
    fn test_empty_api_key_is_absent() {
        let upstream = UpstreamConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(upstream.api_key().is_none());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let upstream = UpstreamConfig {
            api_key: Some("super-secret".to_string()),
            ..Default::default()
        };
        let debug = format!("{:?}", upstream);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = AppConfig::from_env().unwrap();
        assert!(config.upstream.api_key.is_none());
        assert_eq!(
            config.upstream.api_base,
            "https://generativelanguage.googleapis.com"
        );
        assert_eq!(config.server.port, 18000);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "env_key");
        std::env::set_var("GEMINI_API_BASE", "http://127.0.0.1:8080/");
        std::env::set_var("GEMINI_MODEL", "gemini-pro");
        std::env::set_var("PORT", "9999");
        std::env::set_var("VERIFY_SSL", "false");
        std::env::set_var("STREAM_EXTRACTION_MODE", "per_chunk");

        let config = AppConfig::from_env().unwrap();

        assert_eq!(config.upstream.api_key(), Some("env_key"));
        assert_eq!(config.upstream.api_base, "http://127.0.0.1:8080");
        assert_eq!(config.upstream.model, "gemini-pro");
        assert_eq!(config.server.port, 9999);
        assert!(!config.verify_ssl);
        assert_eq!(config.extraction_mode, ExtractionMode::PerChunk);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_port_keeps_default() {
        clear_env();
        std::env::set_var("PORT", "not-a-port");
        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.server.port, 18000);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_blank_key_is_absent() {
        clear_env();
        std::env::set_var("GEMINI_API_KEY", "   ");
        let config = AppConfig::from_env().unwrap();
        assert!(config.upstream.api_key.is_none());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_mode_fails() {
        clear_env();
        std::env::set_var("STREAM_EXTRACTION_MODE", "regex");
        assert!(AppConfig::from_env().is_err());
        clear_env();
    }
}

use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Termbridge
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream chat model configuration
    #[serde(default)]
    pub model: ModelConfig,
    /// Intent detection policy configuration
    #[serde(default)]
    pub intent: IntentConfig,
    /// Request validation limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "127.0.0.1:8080")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}

/// Upstream chat model configuration (OpenAI-compatible API)
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model name to request
    #[serde(default = "default_model")]
    pub model: String,
    /// Ceiling in seconds for a single model call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ModelConfig {
    /// Read the API key from the configured environment variable.
    ///
    /// Returns an empty string when the variable is not set; the server
    /// rejects translation requests until a key is available.
    pub fn api_key(&self) -> String {
        std::env::var(&self.api_key_env).unwrap_or_default()
    }

    /// Model call ceiling as a [`Duration`]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://api.deepseek.com".to_string()
}

fn default_api_key_env() -> String {
    "DEEPSEEK_API_KEY".to_string()
}

fn default_model() -> String {
    "deepseek-chat".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Intent detection policy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IntentConfig {
    /// Sampling temperature for the classification call
    #[serde(default = "default_intent_temperature")]
    pub temperature: f32,
    /// Below this confidence the request is rejected back to the caller
    #[serde(default = "default_reject_threshold")]
    pub reject_threshold: f32,
    /// Below this confidence an advisory notice precedes the translation
    #[serde(default = "default_advisory_threshold")]
    pub advisory_threshold: f32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            temperature: default_intent_temperature(),
            reject_threshold: default_reject_threshold(),
            advisory_threshold: default_advisory_threshold(),
        }
    }
}

fn default_intent_temperature() -> f32 {
    0.1
}

fn default_reject_threshold() -> f32 {
    0.5
}

fn default_advisory_threshold() -> f32 {
    0.8
}

/// Request validation limits
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Minimum accepted content length in characters
    #[serde(default = "default_content_min_chars")]
    pub content_min_chars: usize,
    /// Maximum accepted content length in characters
    #[serde(default = "default_content_max_chars")]
    pub content_max_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            content_min_chars: default_content_min_chars(),
            content_max_chars: default_content_max_chars(),
        }
    }
}

fn default_content_min_chars() -> usize {
    10
}

fn default_content_max_chars() -> usize {
    2000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.model.api_url, "https://api.deepseek.com");
        assert_eq!(config.model.api_key_env, "DEEPSEEK_API_KEY");
        assert_eq!(config.model.model, "deepseek-chat");
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.intent.reject_threshold, 0.5);
        assert_eq!(config.intent.advisory_threshold, 0.8);
        assert_eq!(config.limits.content_min_chars, 10);
        assert_eq!(config.limits.content_max_chars, 2000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [model]
            model = "deepseek-reasoner"
            timeout_secs = 60

            [intent]
            advisory_threshold = 0.9
            "#,
        )
        .unwrap();

        assert_eq!(config.model.model, "deepseek-reasoner");
        assert_eq!(config.model.timeout_secs, 60);
        assert_eq!(config.model.api_url, "https://api.deepseek.com");
        assert_eq!(config.intent.advisory_threshold, 0.9);
        assert_eq!(config.intent.reject_threshold, 0.5);
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.listen_addr, Config::default().server.listen_addr);
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [server]
            listen_addr = "0.0.0.0:9090"

            [limits]
            content_max_chars = 500
            "#,
        )
        .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let config: Config = toml::from_str(&content).unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:9090");
        assert_eq!(config.limits.content_max_chars, 500);
        assert_eq!(config.limits.content_min_chars, 10);
    }

    #[test]
    fn test_api_key_missing_env_is_empty() {
        let config = ModelConfig {
            api_key_env: "TERMBRIDGE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..ModelConfig::default()
        };
        assert_eq!(config.api_key(), "");
    }

    #[test]
    fn test_timeout_duration() {
        let config = ModelConfig {
            timeout_secs: 45,
            ..ModelConfig::default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(45));
    }
}

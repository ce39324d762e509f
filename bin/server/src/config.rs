//! Centralized server configuration.
//!
//! Loaded via the `config` crate from environment variables, with `__`
//! separating nested keys (`WHATSAPP__ACCESS_TOKEN`, `PRICING__FALLBACK_PRICE`).
//!
//! See [`DialogConfig`] and [`PricingConfig`] for the library-level tunables.

use budget_chat_dialog::DialogConfig;
use budget_chat_pricing::PricingConfig;
use serde::Deserialize;
use std::path::PathBuf;

/// Server configuration composed from library configs.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server listens on.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// PostgreSQL database connection URL.
    pub database_url: String,

    /// Token required by admin endpoints. Admin endpoints are disabled when
    /// unset.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// WhatsApp Cloud API configuration.
    pub whatsapp: WhatsAppConfig,

    /// Chat-completion and transcription provider.
    pub llm: LlmConfig,

    /// Account directory configuration.
    #[serde(default)]
    pub directory: DirectoryConfig,

    /// Price resolution.
    #[serde(default)]
    pub pricing: PricingConfig,

    /// Dialog behaviour.
    #[serde(default)]
    pub dialog: DialogConfig,
}

fn default_bind_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    /// Phone number ID messages are sent from.
    pub phone_number_id: String,
    /// Graph API access token.
    pub access_token: String,
    /// Token Meta echoes during webhook subscription.
    pub verify_token: String,
    /// Graph API base URL, including the version.
    #[serde(default = "default_graph_api_base")]
    pub api_base: String,
}

fn default_graph_api_base() -> String {
    "https://graph.facebook.com/v18.0".to_string()
}

/// OpenAI-compatible provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key sent as a bearer token.
    pub api_key: String,
    /// API base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Chat-completion model.
    #[serde(default = "default_llm_model")]
    pub model: String,
    /// Speech-to-text model.
    #[serde(default = "default_transcription_model")]
    pub transcription_model: String,
    /// Language hint for transcription.
    #[serde(default = "default_transcription_language")]
    pub transcription_language: String,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_transcription_model() -> String {
    "whisper-1".to_string()
}

fn default_transcription_language() -> String {
    "es".to_string()
}

/// Account directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectoryConfig {
    /// Path of the JSON directory file.
    #[serde(default = "default_directory_path")]
    pub path: PathBuf,
}

fn default_directory_path() -> PathBuf {
    PathBuf::from("accounts.json")
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            path: default_directory_path(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if required configuration is missing or invalid.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_sections_have_defaults() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "database_url": "postgres://localhost/budget_chat",
            "whatsapp": {
                "phone_number_id": "123",
                "access_token": "token",
                "verify_token": "verify"
            },
            "llm": { "api_key": "sk-test" }
        }))
        .expect("deserialize");

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.admin_token.is_none());
        assert_eq!(config.whatsapp.api_base, "https://graph.facebook.com/v18.0");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.transcription_model, "whisper-1");
        assert_eq!(config.directory.path, PathBuf::from("accounts.json"));
        assert_eq!(config.pricing.fallback_price, 1000);
        assert_eq!(config.dialog.history_keep, 50);
    }

    #[test]
    fn nested_overrides_apply() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "database_url": "postgres://localhost/budget_chat",
            "whatsapp": {
                "phone_number_id": "123",
                "access_token": "token",
                "verify_token": "verify"
            },
            "llm": { "api_key": "sk-test", "model": "gpt-4o" },
            "pricing": { "freshness_hours": 6 },
            "dialog": { "confirmation_window_turns": 3 }
        }))
        .expect("deserialize");

        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.pricing.freshness_hours, 6);
        assert_eq!(config.pricing.fallback_price, 1000);
        assert_eq!(config.dialog.confirmation_window_turns, 3);
    }
}

use serde::Deserialize;
use std::time::Duration;

use crate::services::providers::{openai::OpenAiConfig, tripadvisor::TripAdvisorConfig};

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// OpenAI API key
    pub openai_api_key: String,

    /// OpenAI API base URL
    #[serde(default = "default_openai_api_url")]
    pub openai_api_url: String,

    /// Chat model used for recommendations and overviews
    #[serde(default = "default_openai_model")]
    pub openai_model: String,

    /// TripAdvisor Content API key
    pub tripadvisor_api_key: String,

    /// TripAdvisor Content API base URL
    #[serde(default = "default_tripadvisor_api_url")]
    pub tripadvisor_api_url: String,

    /// Referer sent with TripAdvisor requests; keys are domain-restricted
    #[serde(default)]
    pub tripadvisor_referer: Option<String>,

    /// Redis connection URL; location lookups are cached when set
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Destinations requested per batch
    #[serde(default = "default_recommendation_count")]
    pub recommendation_count: usize,

    /// Where trips start from
    #[serde(default = "default_trip_origin")]
    pub trip_origin: String,

    #[serde(default = "default_display_currency")]
    pub display_currency: String,

    #[serde(default = "default_recommendation_timeout_secs")]
    pub recommendation_timeout_secs: u64,

    #[serde(default = "default_location_timeout_secs")]
    pub location_timeout_secs: u64,

    /// Sessions idle for longer than this are dropped
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: i64,

    /// JSON file replacing the built-in questionnaire
    #[serde(default)]
    pub questionnaire_path: Option<String>,
}

fn default_openai_api_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_tripadvisor_api_url() -> String {
    "https://api.content.tripadvisor.com/api/v1".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_recommendation_count() -> usize {
    5
}

fn default_trip_origin() -> String {
    "Switzerland".to_string()
}

fn default_display_currency() -> String {
    "CHF".to_string()
}

fn default_recommendation_timeout_secs() -> u64 {
    60
}

fn default_location_timeout_secs() -> u64 {
    10
}

fn default_session_idle_minutes() -> i64 {
    60
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn recommendation_timeout(&self) -> Duration {
        Duration::from_secs(self.recommendation_timeout_secs)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout_secs)
    }

    pub fn session_idle(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_idle_minutes)
    }

    pub fn openai(&self) -> OpenAiConfig {
        OpenAiConfig {
            api_key: self.openai_api_key.clone(),
            api_url: self.openai_api_url.clone(),
            model: self.openai_model.clone(),
            recommendation_count: self.recommendation_count,
            trip_origin: self.trip_origin.clone(),
            display_currency: self.display_currency.clone(),
            timeout: self.recommendation_timeout(),
        }
    }

    pub fn tripadvisor(&self) -> TripAdvisorConfig {
        TripAdvisorConfig {
            api_key: self.tripadvisor_api_key.clone(),
            api_url: self.tripadvisor_api_url.clone(),
            referer: self.tripadvisor_referer.clone(),
            currency: self.display_currency.clone(),
            timeout: self.location_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut vars = vec![
            ("OPENAI_API_KEY".to_string(), "sk-test".to_string()),
            ("TRIPADVISOR_API_KEY".to_string(), "ta-test".to_string()),
        ];
        vars.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        vars
    }

    #[test]
    fn test_defaults() {
        let config: Config = envy::from_iter(vars(&[])).unwrap();

        assert_eq!(config.openai_model, "gpt-4o");
        assert_eq!(config.port, 3000);
        assert_eq!(config.recommendation_count, 5);
        assert_eq!(config.trip_origin, "Switzerland");
        assert_eq!(config.redis_url, None);
        assert_eq!(config.location_timeout(), Duration::from_secs(10));
        assert_eq!(config.session_idle(), chrono::Duration::minutes(60));
    }

    #[test]
    fn test_overrides() {
        let config: Config = envy::from_iter(vars(&[
            ("PORT", "8080"),
            ("REDIS_URL", "redis://cache:6379"),
            ("TRIPADVISOR_REFERER", "https://holidaymatch.example"),
            ("DISPLAY_CURRENCY", "EUR"),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.redis_url.as_deref(), Some("redis://cache:6379"));

        let tripadvisor = config.tripadvisor();
        assert_eq!(tripadvisor.currency, "EUR");
        assert_eq!(
            tripadvisor.referer.as_deref(),
            Some("https://holidaymatch.example")
        );
        assert_eq!(config.openai().display_currency, "EUR");
    }

    #[test]
    fn test_missing_api_key_fails() {
        let result: Result<Config, _> =
            envy::from_iter(vec![("OPENAI_API_KEY".to_string(), "sk".to_string())]);
        assert!(result.is_err());
    }
}

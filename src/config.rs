use std::time::Duration;

const ENV_API_KEY: &str = "AI_API_KEY";

pub const MODEL_ID: &str = "claude-3-5-sonnet-20241022";
pub const MAX_OUTPUT_TOKENS: u32 = 1000;
/// Pinned low so repeated runs over the same complaint agree.
pub const TEMPERATURE: f32 = 0.1;
pub const API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const API_VERSION: &str = "2023-06-01";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_BATCH_DELAY_MS: u64 = 500;
const DEFAULT_MAX_COMPLAINT_CHARS: usize = 20_000;

pub fn default_log_filter() -> &'static str {
    "meditriage=info"
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub request_timeout: Duration,
    /// Pause between external-model calls in a batch.
    pub batch_delay: Duration,
    pub max_complaint_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            batch_delay: Duration::from_millis(DEFAULT_BATCH_DELAY_MS),
            max_complaint_chars: DEFAULT_MAX_COMPLAINT_CHARS,
        }
    }
}

impl Config {
    /// The provider credential is the only value read from the environment.
    pub fn from_env() -> Self {
        Self::default().with_api_key(std::env::var(ENV_API_KEY).ok())
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }

    pub fn rules_only() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_mean_rules_only() {
        let config = Config::default().with_api_key(Some("   ".to_string()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn keys_are_trimmed() {
        let config = Config::default().with_api_key(Some(" sk-test \n".to_string()));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn defaults_bound_the_external_call() {
        let config = Config::rules_only();
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.batch_delay, Duration::from_millis(500));
    }
}

use std::time::Duration;

/// Connection settings for one provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub base_url: String,
    /// Environment variable holding the API token.
    pub token_env: Option<String>,
    /// Token used when `token_env` is unset.
    pub fallback_token: Option<String>,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            token_env: None,
            fallback_token: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn diia() -> Self {
        Self::new("Diia", env_or("DIIA_BASE_URL", "https://api.diia.gov.ua"))
            .with_token_env("DIIA_API_TOKEN", "mock_diia_token")
    }

    pub fn opendatabot() -> Self {
        Self::new(
            "OpenDataBot",
            env_or("OPENDATABOT_BASE_URL", "https://opendatabot.ua/api/v3"),
        )
        .with_token_env("OPENDATABOT_API_TOKEN", "mock_opendatabot_token")
    }

    pub fn monobank() -> Self {
        Self::new("Monobank", env_or("MONOBANK_BASE_URL", "https://api.monobank.ua"))
            .with_token_env("MONOBANK_API_TOKEN", "mock_monobank_token")
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_token_env(mut self, var: impl Into<String>, fallback: impl Into<String>) -> Self {
        self.token_env = Some(var.into());
        self.fallback_token = Some(fallback.into());
        self
    }

    /// Token must come from `var`; authentication fails while it is unset.
    pub fn with_required_token_env(mut self, var: impl Into<String>) -> Self {
        self.token_env = Some(var.into());
        self.fallback_token = None;
        self
    }

    /// Use a fixed token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token_env = None;
        self.fallback_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Token from the environment, else the fallback.
    pub fn resolve_token(&self) -> Option<String> {
        self.token_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|token| !token.is_empty())
            .or_else(|| self.fallback_token.clone())
    }

    /// A token env var is configured and there is nothing to fall back to.
    pub fn requires_token(&self) -> bool {
        self.token_env.is_some() && self.fallback_token.is_none()
    }
}

fn env_or(var: &str, default: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Retry policy for network failures and 5xx responses
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl RetryPolicy {
    pub fn attempts(max_attempts: u32, delay_ms: u64) -> Self {
        Self {
            max_attempts,
            delay_ms,
            backoff_multiplier: 2.0,
        }
    }

    /// Delay before the given retry (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        Duration::from_millis((self.delay_ms as f64 * factor) as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay_ms: 500,
            backoff_multiplier: 2.0,
        }
    }
}

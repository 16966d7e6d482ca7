use std::time::Duration;

use dotenv::dotenv;

/// Public base of the EC "Have Your Say" portal.
pub const DEFAULT_BASE_URL: &str = "https://ec.europa.eu/info/law/better-regulation";

/// Hard ceiling on attempts per request, first try included.
pub const MAX_ATTEMPTS: u32 = 5;

#[derive(Clone, Debug)]
pub struct HysConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub download_timeout: Duration,
    pub retry_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub user_agent: String,
}

impl Default for HysConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.into(),
            timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(60),
            retry_attempts: MAX_ATTEMPTS,
            retry_base_delay_ms: 500,
            user_agent: format!("hys-client/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HysConfig {
    /// Defaults overlaid with `HYS_*` environment variables (a `.env` file is
    /// loaded first if present). Unparseable values keep the default.
    pub fn from_env() -> Self {
        dotenv().ok();
        let mut cfg = Self::default();
        if let Some(v) = env_str("HYS_BASE_URL") {
            cfg.base_url = v;
        }
        if let Some(secs) = env_num::<u64>("HYS_TIMEOUT_SECS") {
            cfg.timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_num::<u64>("HYS_DOWNLOAD_TIMEOUT_SECS") {
            cfg.download_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_num::<u32>("HYS_RETRY_ATTEMPTS") {
            cfg.retry_attempts = n;
        }
        if let Some(ms) = env_num::<u64>("HYS_RETRY_BASE_DELAY_MS") {
            cfg.retry_base_delay_ms = ms;
        }
        if let Some(ua) = env_str("HYS_USER_AGENT") {
            cfg.user_agent = ua;
        }
        cfg.normalized()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self.normalized()
    }

    /// Trailing slashes stripped from the base, attempts clamped to `1..=MAX_ATTEMPTS`.
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.retry_attempts = self.retry_attempts.clamp(1, MAX_ATTEMPTS);
        self
    }

    pub fn feedback_endpoint(&self) -> String {
        format!("{}/api/allFeedback", self.base_url)
    }

    /// Delay to wait before `attempt` (1-based). Zero for the first attempt,
    /// then `base * 2^(attempt-2)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        let factor = 1u64 << (attempt - 2).min(16);
        Duration::from_millis(self.retry_base_delay_ms.max(1).saturating_mul(factor))
    }
}

fn env_str(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_num<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_str(key).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempts_are_clamped() {
        let cfg = HysConfig {
            retry_attempts: 12,
            ..HysConfig::default()
        }
        .normalized();
        assert_eq!(cfg.retry_attempts, MAX_ATTEMPTS);

        let cfg = HysConfig {
            retry_attempts: 0,
            ..HysConfig::default()
        }
        .normalized();
        assert_eq!(cfg.retry_attempts, 1);
    }

    #[test]
    fn backoff_grows_with_attempts() {
        let cfg = HysConfig {
            retry_base_delay_ms: 100,
            ..HysConfig::default()
        };
        assert_eq!(cfg.backoff_delay(1), Duration::ZERO);
        assert_eq!(cfg.backoff_delay(2), Duration::from_millis(100));
        assert_eq!(cfg.backoff_delay(3), Duration::from_millis(200));
        assert_eq!(cfg.backoff_delay(5), Duration::from_millis(800));
    }

    #[test]
    fn base_url_is_injectable() {
        let cfg = HysConfig::default().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(cfg.feedback_endpoint(), "http://127.0.0.1:9000/api/allFeedback");
    }
}

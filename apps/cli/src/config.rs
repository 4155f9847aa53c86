use std::time::Duration;

use fundamentals_core::{RateConverter, ReportOptions};
use fundamentals_market_data::{RetryPolicy, YahooProvider};

pub struct Config {
    pub rate_timeout: Duration,
    pub symbol_timeout: Duration,
    pub http_timeout: Duration,
    pub retry: RetryPolicy,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let defaults = RetryPolicy::default();
        Self {
            rate_timeout: env_millis(
                "FUNDAMENTALS_RATE_TIMEOUT_MS",
                RateConverter::DEFAULT_LIVE_TIMEOUT,
            ),
            symbol_timeout: env_millis(
                "FUNDAMENTALS_SYMBOL_TIMEOUT_MS",
                ReportOptions::DEFAULT_SYMBOL_TIMEOUT,
            ),
            http_timeout: env_millis(
                "FUNDAMENTALS_HTTP_TIMEOUT_MS",
                YahooProvider::DEFAULT_HTTP_TIMEOUT,
            ),
            retry: RetryPolicy {
                max_attempts: parse_or(
                    std::env::var("FUNDAMENTALS_RETRY_ATTEMPTS").ok(),
                    defaults.max_attempts,
                ),
                base_delay: env_millis("FUNDAMENTALS_RETRY_DELAY_MS", defaults.base_delay),
            },
            log_format: std::env::var("FUNDAMENTALS_LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string()),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            symbol_timeout: self.symbol_timeout,
            retry: self.retry.clone(),
        }
    }
}

fn env_millis(key: &str, default: Duration) -> Duration {
    let default_ms = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(parse_or(std::env::var(key).ok(), default_ms))
}

/// Parsed value, or `default` when unset or malformed.
fn parse_or<T: std::str::FromStr>(raw: Option<String>, default: T) -> T {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(Some("2500".to_string()), 5000u64), 2500);
        assert_eq!(parse_or(Some(" 7 ".to_string()), 3u32), 7);
        assert_eq!(parse_or(Some("soon".to_string()), 5000u64), 5000);
        assert_eq!(parse_or(Some("-1".to_string()), 3u32), 3);
        assert_eq!(parse_or::<u64>(None, 20000), 20000);
    }

    #[test]
    fn test_unset_millis_use_default() {
        let timeout = env_millis("FUNDAMENTALS_TEST_UNSET_TIMEOUT_MS", Duration::from_secs(5));
        assert_eq!(timeout, Duration::from_millis(5000));
    }
}

//! Startup configuration.
//!
//! Read once from the environment when the session starts and immutable
//! afterwards. Numeric limits fall back to defaults; send credentials do not.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_MAX_FEEDBACK_LENGTH: usize = 1000;
pub const DEFAULT_RATE_LIMIT_REQUESTS: u32 = 5;
pub const DEFAULT_RATE_LIMIT_WINDOW_MINUTES: u64 = 60;
pub const DEFAULT_DRAFT_SAVE_DEBOUNCE_MS: u64 = 1000;
pub const DEFAULT_NOTIFICATION_DISMISS_MS: u64 = 5000;
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_EMAILJS_API_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";
pub const DEFAULT_DRAFT_PATH: &str = ".feedback/draft.json";
/// Upper bound for the debounce and dismiss timers.
pub const MAX_TIMER_MS: u64 = 24 * 60 * 60 * 1000;

/// Workflow limits and timer settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackConfig {
    pub max_feedback_length: usize,
    pub rate_limit_requests: u32,
    pub rate_limit_window_minutes: u64,
    pub draft_save_debounce: Duration,
    pub notification_dismiss: Duration,
    pub send_timeout: Duration,
    pub draft_path: PathBuf,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            max_feedback_length: DEFAULT_MAX_FEEDBACK_LENGTH,
            rate_limit_requests: DEFAULT_RATE_LIMIT_REQUESTS,
            rate_limit_window_minutes: DEFAULT_RATE_LIMIT_WINDOW_MINUTES,
            draft_save_debounce: Duration::from_millis(DEFAULT_DRAFT_SAVE_DEBOUNCE_MS),
            notification_dismiss: Duration::from_millis(DEFAULT_NOTIFICATION_DISMISS_MS),
            send_timeout: Duration::from_secs(DEFAULT_SEND_TIMEOUT_SECS),
            draft_path: PathBuf::from(DEFAULT_DRAFT_PATH),
        }
    }
}

impl FeedbackConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary key lookup (environment, `.env` map, tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            max_feedback_length: parse_or(
                &lookup,
                "MAX_FEEDBACK_LENGTH",
                defaults.max_feedback_length,
            )?,
            rate_limit_requests: parse_or(
                &lookup,
                "RATE_LIMIT_REQUESTS",
                defaults.rate_limit_requests,
            )?,
            rate_limit_window_minutes: parse_or(
                &lookup,
                "RATE_LIMIT_WINDOW_MINUTES",
                defaults.rate_limit_window_minutes,
            )?,
            draft_save_debounce: timer_ms(
                &lookup,
                "DRAFT_SAVE_DEBOUNCE_MS",
                DEFAULT_DRAFT_SAVE_DEBOUNCE_MS,
            )?,
            notification_dismiss: timer_ms(
                &lookup,
                "NOTIFICATION_DISMISS_MS",
                DEFAULT_NOTIFICATION_DISMISS_MS,
            )?,
            send_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SEND_TIMEOUT_SECS",
                DEFAULT_SEND_TIMEOUT_SECS,
            )?),
            draft_path: lookup("FEEDBACK_DRAFT_PATH")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.draft_path),
        })
    }
}

/// EmailJS credentials and endpoint.
#[derive(Clone, PartialEq)]
pub struct EmailJsConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    pub api_url: String,
}

impl std::fmt::Debug for EmailJsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailJsConfig")
            .field("service_id", &self.service_id)
            .field("template_id", &self.template_id)
            .field("public_key", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl EmailJsConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Missing or blank credentials are an error, never a silent no-op sender.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            service_id: require(&lookup, "EMAILJS_SERVICE_ID")?,
            template_id: require(&lookup, "EMAILJS_TEMPLATE_ID")?,
            public_key: require(&lookup, "EMAILJS_PUBLIC_KEY")?,
            api_url: lookup("EMAILJS_API_URL")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_EMAILJS_API_URL.to_string()),
        })
    }
}

fn require<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or(ConfigError::MissingCredential(var))
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var, value: raw }),
    }
}

fn timer_ms<F>(lookup: &F, var: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms = parse_or(lookup, var, default)?;
    if ms > MAX_TIMER_MS {
        return Err(ConfigError::InvalidValue {
            var,
            value: ms.to_string(),
        });
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = FeedbackConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, FeedbackConfig::default());
        assert_eq!(config.max_feedback_length, 1000);
        assert_eq!(config.rate_limit_requests, 5);
        assert_eq!(config.rate_limit_window_minutes, 60);
    }

    #[test]
    fn test_overrides() {
        let config = FeedbackConfig::from_lookup(lookup_from(&[
            ("MAX_FEEDBACK_LENGTH", "250"),
            ("RATE_LIMIT_REQUESTS", "2"),
            ("RATE_LIMIT_WINDOW_MINUTES", " 15 "),
            ("FEEDBACK_DRAFT_PATH", "/tmp/x.json"),
        ]))
        .unwrap();
        assert_eq!(config.max_feedback_length, 250);
        assert_eq!(config.rate_limit_requests, 2);
        assert_eq!(config.rate_limit_window_minutes, 15);
        assert_eq!(config.draft_path, PathBuf::from("/tmp/x.json"));
    }

    #[test]
    fn test_invalid_number_names_variable() {
        let err = FeedbackConfig::from_lookup(lookup_from(&[("RATE_LIMIT_REQUESTS", "five")]))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "RATE_LIMIT_REQUESTS",
                value: "five".to_string()
            }
        );
    }

    #[test]
    fn test_timer_beyond_one_day_rejected() {
        let err = FeedbackConfig::from_lookup(lookup_from(&[(
            "NOTIFICATION_DISMISS_MS",
            "18446744073709551615",
        )]))
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                var: "NOTIFICATION_DISMISS_MS",
                value: "18446744073709551615".to_string()
            }
        );

        let config = FeedbackConfig::from_lookup(lookup_from(&[(
            "DRAFT_SAVE_DEBOUNCE_MS",
            "86400000",
        )]))
        .unwrap();
        assert_eq!(config.draft_save_debounce, Duration::from_secs(86_400));
    }

    #[test]
    fn test_missing_credentials_are_errors() {
        let err = EmailJsConfig::from_lookup(lookup_from(&[
            ("EMAILJS_SERVICE_ID", "service_x"),
            ("EMAILJS_TEMPLATE_ID", "  "),
            ("EMAILJS_PUBLIC_KEY", "key"),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingCredential("EMAILJS_TEMPLATE_ID"));
    }

    #[test]
    fn test_credentials_loaded_and_key_redacted() {
        let config = EmailJsConfig::from_lookup(lookup_from(&[
            ("EMAILJS_SERVICE_ID", "service_x"),
            ("EMAILJS_TEMPLATE_ID", "template_y"),
            ("EMAILJS_PUBLIC_KEY", "secret-key"),
        ]))
        .unwrap();
        assert_eq!(config.api_url, DEFAULT_EMAILJS_API_URL);
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}

//! Studio configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STUDIO_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `GEMINI_API_KEY` - Google Gemini API key
//! - `SUPABASE_URL` - Supabase project URL (e.g., <https://abc.supabase.co>)
//! - `SUPABASE_ANON_KEY` - Supabase anon key, sent as `apikey` on auth lookups
//!
//! ## Optional
//! - `STUDIO_HOST` - Bind address (default: 127.0.0.1)
//! - `STUDIO_PORT` - Listen port (default: 3000)
//! - `GEMINI_IMAGE_MODEL` - Image model (default: gemini-2.5-flash-image)
//! - `GEMINI_TEXT_MODEL` - Stylist model for mixtapes (default: gemini-2.5-flash)
//! - `GEMINI_TIMEOUT_SECS` - Per-request timeout for Gemini calls (default: 120)
//! - `STUDIO_SESSION_IDLE_SECS` - Idle time before a studio session is dropped (default: 3600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (payments - all or nothing)
//! - `DODO_PAYMENTS_API_KEY` - Dodo Payments API key
//! - `DODO_WEBHOOK_KEY` - Standard Webhooks signing secret (`whsec_...`)
//! - `DODO_API_BASE_URL` - API base (default: <https://live.dodopayments.com>)
//! - `CHECKOUT_RETURN_URL` - Where the buyer lands after checkout
//! - `DODO_PRODUCT_ID_10_CREDITS`, `DODO_PRODUCT_ID_50_CREDITS`,
//!   `DODO_PRODUCT_ID_100_CREDITS` - Product IDs for each credit package

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_DODO_BASE_URL: &str = "https://live.dodopayments.com";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Studio application configuration.
#[derive(Debug, Clone)]
pub struct StudioConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Gemini API configuration
    pub gemini: GeminiConfig,
    /// Supabase auth configuration
    pub supabase: SupabaseConfig,
    /// Payments configuration (optional - disables checkout and webhooks)
    pub payments: Option<PaymentsConfig>,
    /// How long an untouched studio session stays in memory
    pub session_idle: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    pub api_key: SecretString,
    /// Model used for every image generation
    pub image_model: String,
    /// Model used for mixtape outfit suggestions
    pub text_model: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"[REDACTED]")
            .field("image_model", &self.image_model)
            .field("text_model", &self.text_model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Supabase project configuration.
#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: Url,
    pub anon_key: SecretString,
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url.as_str())
            .field("anon_key", &"[REDACTED]")
            .finish()
    }
}

/// Dodo Payments configuration.
///
/// Implements `Debug` manually to redact secrets.
#[derive(Clone)]
pub struct PaymentsConfig {
    pub api_key: SecretString,
    /// Standard Webhooks secret (`whsec_` + base64)
    pub webhook_key: SecretString,
    pub api_base_url: Url,
    pub return_url: Url,
    /// Product ID per credit package size
    pub product_ids: HashMap<u32, String>,
}

impl std::fmt::Debug for PaymentsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentsConfig")
            .field("api_key", &"[REDACTED]")
            .field("webhook_key", &"[REDACTED]")
            .field("api_base_url", &self.api_base_url.as_str())
            .field("return_url", &self.return_url.as_str())
            .field("product_ids", &self.product_ids)
            .finish()
    }
}

impl PaymentsConfig {
    const PRODUCT_VARS: [(u32, &'static str); 3] = [
        (10, "DODO_PRODUCT_ID_10_CREDITS"),
        (50, "DODO_PRODUCT_ID_50_CREDITS"),
        (100, "DODO_PRODUCT_ID_100_CREDITS"),
    ];

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let api_key = get_optional_env("DODO_PAYMENTS_API_KEY");
        let webhook_key = get_optional_env("DODO_WEBHOOK_KEY");

        let (api_key, webhook_key) = match (api_key, webhook_key) {
            (Some(api_key), Some(webhook_key)) => (api_key, webhook_key),
            (None, None) => return Ok(None),
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "DODO_*".to_string(),
                    "Both DODO_PAYMENTS_API_KEY and DODO_WEBHOOK_KEY must be set together"
                        .to_string(),
                ));
            }
        };
        validate_secret_strength(&api_key, "DODO_PAYMENTS_API_KEY")?;
        validate_secret_strength(&webhook_key, "DODO_WEBHOOK_KEY")?;

        let api_base_url = parse_url(
            "DODO_API_BASE_URL",
            &get_env_or_default("DODO_API_BASE_URL", DEFAULT_DODO_BASE_URL),
        )?;
        let return_url = parse_url(
            "CHECKOUT_RETURN_URL",
            &get_required_env("CHECKOUT_RETURN_URL")?,
        )?;

        let mut product_ids = HashMap::new();
        for (credits, var) in Self::PRODUCT_VARS {
            product_ids.insert(credits, get_required_env(var)?);
        }

        Ok(Some(Self {
            api_key: SecretString::from(api_key),
            webhook_key: SecretString::from(webhook_key),
            api_base_url,
            return_url,
            product_ids,
        }))
    }

    /// Product ID for a credit package size.
    #[must_use]
    pub fn product_id(&self, credits: u32) -> Option<&str> {
        self.product_ids.get(&credits).map(String::as_str)
    }
}

impl StudioConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STUDIO_DATABASE_URL")?;
        let host = get_env_or_default("STUDIO_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("STUDIO_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("STUDIO_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("STUDIO_PORT".to_string(), e.to_string()))?;

        let gemini = GeminiConfig::from_env()?;
        let supabase = SupabaseConfig::from_env()?;
        let payments = PaymentsConfig::from_env()?;
        let session_idle = Duration::from_secs(parse_secs("STUDIO_SESSION_IDLE_SECS", 3600)?);
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_optional_env("SENTRY_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(1.0);
        let sentry_traces_sample_rate = get_optional_env("SENTRY_TRACES_SAMPLE_RATE")
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.1);

        Ok(Self {
            database_url,
            host,
            port,
            gemini,
            supabase,
            payments,
            session_idle,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Returns the payments configuration, if checkout is enabled.
    #[must_use]
    pub const fn payments(&self) -> Option<&PaymentsConfig> {
        self.payments.as_ref()
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_key: get_validated_secret("GEMINI_API_KEY")?,
            image_model: get_env_or_default("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
            text_model: get_env_or_default("GEMINI_TEXT_MODEL", DEFAULT_TEXT_MODEL),
            timeout: Duration::from_secs(parse_secs("GEMINI_TIMEOUT_SECS", 120)?),
        })
    }
}

impl SupabaseConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: parse_url("SUPABASE_URL", &get_required_env("SUPABASE_URL")?)?,
            anon_key: get_validated_secret("SUPABASE_ANON_KEY")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL` (used by Fly.io postgres attach).
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_secs(key: &str, default: u64) -> Result<u64, ConfigError> {
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

fn parse_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the provider."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-gemini-key-here", "GEMINI_API_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
        assert!(validate_secret_strength("changeme123", "GEMINI_API_KEY").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength(&"a".repeat(40), "DODO_WEBHOOK_KEY");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("AIzaSyB3xY9mK2nL5pQ7rT0uW4zC6dF8hJ1", "GEMINI_API_KEY");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_url_rejects_garbage() {
        assert!(parse_url("SUPABASE_URL", "not a url").is_err());
        assert_eq!(
            parse_url("SUPABASE_URL", "https://abc.supabase.co")
                .unwrap()
                .host_str(),
            Some("abc.supabase.co")
        );
    }

    #[test]
    fn test_socket_addr() {
        let config = StudioConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            gemini: GeminiConfig {
                api_key: SecretString::from("AIza-test"),
                image_model: DEFAULT_IMAGE_MODEL.to_string(),
                text_model: DEFAULT_TEXT_MODEL.to_string(),
                timeout: Duration::from_secs(120),
            },
            supabase: SupabaseConfig {
                url: Url::parse("https://abc.supabase.co").unwrap(),
                anon_key: SecretString::from("anon"),
            },
            payments: None,
            session_idle: Duration::from_secs(3600),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
        assert!(config.payments().is_none());
    }

    #[test]
    fn test_gemini_config_debug_redacts_secrets() {
        let config = GeminiConfig {
            api_key: SecretString::from("AIza-super-secret-key"),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("gemini-2.5-flash-image"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIza-super-secret-key"));
    }

    #[test]
    fn test_payments_config_debug_redacts_secrets() {
        let config = PaymentsConfig {
            api_key: SecretString::from("dodo-live-key-123"),
            webhook_key: SecretString::from("whsec_c2VjcmV0"),
            api_base_url: Url::parse(DEFAULT_DODO_BASE_URL).unwrap(),
            return_url: Url::parse("https://fittingroom.app/payment-success").unwrap(),
            product_ids: HashMap::from([(10, "pdt_10".to_string())]),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("pdt_10"));
        assert!(!debug_output.contains("dodo-live-key-123"));
        assert!(!debug_output.contains("whsec_c2VjcmV0"));
        assert_eq!(config.product_id(10), Some("pdt_10"));
        assert_eq!(config.product_id(50), None);
    }
}

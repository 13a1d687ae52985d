//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `AB_API_BASE_URL` - Backend base address (default: `http://localhost:5000`)
//! - `AB_API_TIMEOUT_MS` - Request deadline in milliseconds (default: 10000)
//! - `AB_TOKEN_STORE_PATH` - Token file for the CLI (default: `.am-botanics/tokens.json`)
//! - `AB_SITE_TITLE` - Document title
//! - `AB_SITE_DESCRIPTION` - Meta description
//! - `AB_CONTACT_PHONE` - `WhatsApp` number for the contact widget
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag

use std::path::PathBuf;
use std::time::Duration;

use am_botanics_client::ApiClientConfig;
use thiserror::Error;
use url::Url;

const DEFAULT_TOKEN_STORE_PATH: &str = ".am-botanics/tokens.json";

const DEFAULT_SITE_TITLE: &str =
    "Am-Botonics - Premium Skincare Products | Natural Beauty Solutions";

const DEFAULT_SITE_DESCRIPTION: &str = "Discover AM-Botnics premium skincare collection. \
     Transform your skin with our natural face creams, body creams, and anti-aging solutions. \
     Free delivery across Pakistan.";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront shell configuration.
#[derive(Clone)]
pub struct StorefrontConfig {
    /// Backend client settings
    pub api: ApiClientConfig,
    /// Where the CLI persists bearer tokens
    pub token_store_path: PathBuf,
    /// Document head and chrome content
    pub site: SiteConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag
    pub sentry_environment: Option<String>,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("api", &self.api)
            .field("token_store_path", &self.token_store_path)
            .field("site", &self.site)
            .field("sentry_dsn", &self.sentry_dsn.as_ref().map(|_| "[REDACTED]"))
            .field("sentry_environment", &self.sentry_environment)
            .finish()
    }
}

/// Content shared by every page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// `<title>` text
    pub title: String,
    /// `<meta name="description">` content
    pub description: String,
    /// Phone number the floating contact widget opens in `WhatsApp`
    pub contact_phone: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_SITE_TITLE.to_string(),
            description: DEFAULT_SITE_DESCRIPTION.to_string(),
            contact_phone: None,
        }
    }
}

impl SiteConfig {
    /// Target of the contact widget: a `wa.me` link when a phone number is
    /// configured, the contact page otherwise.
    #[must_use]
    pub fn contact_href(&self) -> String {
        self.contact_phone
            .as_deref()
            .map(|phone| phone.chars().filter(char::is_ascii_digit).collect::<String>())
            .filter(|digits| !digits.is_empty())
            .map_or_else(
                || "/contact".to_string(),
                |digits| format!("https://wa.me/{digits}"),
            )
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url_raw = get("AB_API_BASE_URL")
            .unwrap_or_else(|| ApiClientConfig::DEFAULT_BASE_URL.to_string());
        let base_url = Url::parse(&base_url_raw).map_err(|e| {
            ConfigError::InvalidEnvVar("AB_API_BASE_URL".to_string(), e.to_string())
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "AB_API_BASE_URL".to_string(),
                format!("unsupported scheme {:?}", base_url.scheme()),
            ));
        }

        let timeout = match get("AB_API_TIMEOUT_MS") {
            Some(raw) => {
                let millis = raw.parse::<u64>().map_err(|e| {
                    ConfigError::InvalidEnvVar("AB_API_TIMEOUT_MS".to_string(), e.to_string())
                })?;
                if millis == 0 {
                    return Err(ConfigError::InvalidEnvVar(
                        "AB_API_TIMEOUT_MS".to_string(),
                        "must be greater than zero".to_string(),
                    ));
                }
                Duration::from_millis(millis)
            }
            None => ApiClientConfig::DEFAULT_TIMEOUT,
        };

        let defaults = SiteConfig::default();
        let site = SiteConfig {
            title: get("AB_SITE_TITLE").unwrap_or(defaults.title),
            description: get("AB_SITE_DESCRIPTION").unwrap_or(defaults.description),
            contact_phone: get("AB_CONTACT_PHONE"),
        };

        Ok(Self {
            api: ApiClientConfig::new(base_url).with_timeout(timeout),
            token_store_path: get("AB_TOKEN_STORE_PATH")
                .map_or_else(|| PathBuf::from(DEFAULT_TOKEN_STORE_PATH), PathBuf::from),
            site,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        })
    }
}

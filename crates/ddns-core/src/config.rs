//! Configuration types for the DDNS reconciler
//!
//! This module defines the typed, validated configuration for one run.
//! Raw flag/environment parsing lives in the daemon; everything here is
//! re-validated before any network call.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::{Error, Result};

/// Default IP echo endpoint (plain-text body)
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org";

/// Default provider API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudflare.com/client/v4";

/// Provider TTL sentinel meaning "automatic"
pub const AUTOMATIC_TTL: i64 = 1;

/// Default overall run timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Provider credential
///
/// Exactly one variant is active per client. The `Debug` implementation
/// never prints secret material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    /// Bearer API token
    Token(String),

    /// Legacy account email + global API key
    GlobalKey {
        /// Account email
        email: String,
        /// Global API key
        key: String,
    },
}

impl Credential {
    /// Fold optional raw credential fields into exactly one variant
    ///
    /// Blank strings count as absent. Fails when both variants are present,
    /// when neither is, and when only half of the email/key pair is set.
    pub fn from_parts(
        token: Option<&str>,
        email: Option<&str>,
        key: Option<&str>,
    ) -> Result<Self> {
        fn present(v: Option<&str>) -> Option<&str> {
            v.map(str::trim).filter(|v| !v.is_empty())
        }

        match (present(token), present(email), present(key)) {
            (Some(token), None, None) => Ok(Credential::Token(token.to_string())),
            (None, Some(email), Some(key)) => Ok(Credential::GlobalKey {
                email: email.to_string(),
                key: key.to_string(),
            }),
            (Some(_), _, _) => Err(Error::invalid_argument(
                "provide either api-token or email+global-key, not both",
            )),
            (None, Some(_), None) | (None, None, Some(_)) => Err(Error::invalid_argument(
                "global key auth needs both email and global-key",
            )),
            (None, None, None) => Err(Error::invalid_argument(
                "missing credentials: set CF_API_TOKEN or CF_EMAIL and CF_GLOBAL_KEY",
            )),
        }
    }

    /// Check that the active variant's fields are non-blank
    pub fn validate(&self) -> Result<()> {
        match self {
            Credential::Token(token) if token.trim().is_empty() => {
                Err(Error::invalid_argument("api token cannot be empty"))
            }
            Credential::GlobalKey { email, key }
                if email.trim().is_empty() || key.trim().is_empty() =>
            {
                Err(Error::invalid_argument(
                    "global key auth needs both email and global-key",
                ))
            }
            _ => Ok(()),
        }
    }

    /// Name of the authentication scheme (safe to log)
    pub fn scheme(&self) -> &'static str {
        match self {
            Credential::Token(_) => "api-token",
            Credential::GlobalKey { .. } => "global-key",
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Token(_) => f.debug_tuple("Token").field(&"<REDACTED>").finish(),
            Credential::GlobalKey { email, .. } => f
                .debug_struct("GlobalKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

/// The A record to keep in sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Zone (apex domain), e.g. `example.com`
    pub zone: String,

    /// Record label within the zone, e.g. `home`
    pub name: String,

    /// TTL in seconds (1 = automatic)
    #[serde(default = "default_ttl")]
    pub ttl: i64,

    /// Whether the record is proxied through the provider's edge
    #[serde(default)]
    pub proxied: bool,
}

impl RecordConfig {
    /// Create a record configuration with automatic TTL, not proxied
    pub fn new(zone: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            zone: zone.into(),
            name: name.into(),
            ttl: default_ttl(),
            proxied: false,
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the proxied flag
    pub fn with_proxied(mut self, proxied: bool) -> Self {
        self.proxied = proxied;
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<()> {
        if self.zone.trim().is_empty() {
            return Err(Error::invalid_argument("zone is required"));
        }
        if self.name.trim().is_empty() {
            return Err(Error::invalid_argument("name is required"));
        }
        if self.ttl < 0 {
            return Err(Error::invalid_argument("ttl must be >= 0 (1 for auto)"));
        }
        if u32::try_from(self.ttl).is_err() {
            return Err(Error::invalid_argument(format!(
                "ttl must be <= {}",
                u32::MAX
            )));
        }
        Ok(())
    }

    /// Fully-qualified record name: `name.zone`
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.name, self.zone)
    }

    /// TTL as sent to the provider
    pub fn ttl_seconds(&self) -> Result<u32> {
        u32::try_from(self.ttl)
            .map_err(|_| Error::invalid_argument(format!("ttl out of range: {}", self.ttl)))
    }
}

fn default_ttl() -> i64 {
    AUTOMATIC_TTL
}

/// Complete configuration for one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Record to keep in sync
    pub record: RecordConfig,

    /// Provider credential
    pub credential: Credential,

    /// Overall run timeout
    #[serde(default = "default_timeout")]
    pub timeout: Duration,

    /// IP echo endpoint
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,

    /// Provider API base URL
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// User-Agent override (`None` = client default)
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl DdnsConfig {
    /// Create a configuration with defaults for everything but record and credential
    pub fn new(record: RecordConfig, credential: Credential) -> Self {
        Self {
            record,
            credential,
            timeout: default_timeout(),
            ip_echo_url: default_ip_echo_url(),
            api_base_url: default_api_base_url(),
            user_agent: None,
        }
    }

    /// Set the overall timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.record.validate()?;
        self.credential.validate()?;

        if self.timeout.is_zero() {
            return Err(Error::invalid_argument("timeout must be > 0"));
        }
        if self.ip_echo_url.trim().is_empty() {
            return Err(Error::invalid_argument("IP echo URL cannot be empty"));
        }
        if self.api_base_url.trim().is_empty() {
            return Err(Error::invalid_argument("API base URL cannot be empty"));
        }

        Ok(())
    }
}

fn default_timeout() -> Duration {
    DEFAULT_TIMEOUT
}

fn default_ip_echo_url() -> String {
    DEFAULT_IP_ECHO_URL.to_string()
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

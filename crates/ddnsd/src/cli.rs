//! Command-line flags with environment fallbacks

use clap::{ArgAction, Parser};
use ddns_core::config::{AUTOMATIC_TTL, DEFAULT_API_BASE_URL, DEFAULT_IP_ECHO_URL};
use ddns_core::{Credential, DdnsConfig, RecordConfig, Result};
use std::time::Duration;

/// Point a Cloudflare A record at this host's public IPv4, once.
#[derive(Parser, Debug)]
#[command(name = "ddnsd")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Cloudflare zone (apex domain)
    #[arg(long, env = "ZONE")]
    pub zone: Option<String>,

    /// Record name/label within the zone
    #[arg(long, env = "NAME")]
    pub name: Option<String>,

    /// TTL in seconds (1 = automatic)
    #[arg(long, env = "TTL", default_value_t = AUTOMATIC_TTL, allow_negative_numbers = true)]
    pub ttl: i64,

    /// Whether the record is proxied
    #[arg(
        long,
        env = "PROXIED",
        action = ArgAction::Set,
        value_parser = parse_bool,
        num_args = 0..=1,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub proxied: bool,

    /// Cloudflare account email (global key auth)
    #[arg(long, env = "CF_EMAIL")]
    pub email: Option<String>,

    /// Cloudflare global API key
    #[arg(long, env = "CF_GLOBAL_KEY", hide_env_values = true)]
    pub global_key: Option<String>,

    /// Cloudflare API token (preferred)
    #[arg(long, env = "CF_API_TOKEN", hide_env_values = true)]
    pub api_token: Option<String>,

    /// Overall timeout, e.g. 30s, 1500ms, 2m
    #[arg(long, env = "TIMEOUT", value_parser = parse_duration, default_value = "30s")]
    pub timeout: Duration,

    /// IP echo service queried for the public address
    #[arg(long, env = "DDNS_IP_ECHO_URL", default_value = DEFAULT_IP_ECHO_URL)]
    pub ip_echo_url: String,

    /// Cloudflare API base URL
    #[arg(long, env = "CF_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// User-Agent sent to the Cloudflare API
    #[arg(long, env = "DDNS_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Log filter (trace, debug, info, warn, error or a tracing directive)
    #[arg(long, env = "DDNS_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl Args {
    /// Build and validate the run configuration
    pub fn to_config(&self) -> Result<DdnsConfig> {
        let record = RecordConfig::new(
            self.zone.clone().unwrap_or_default(),
            self.name.clone().unwrap_or_default(),
        )
        .with_ttl(self.ttl)
        .with_proxied(self.proxied);

        // Record problems are reported ahead of credential problems.
        record.validate()?;

        let credential = Credential::from_parts(
            self.api_token.as_deref(),
            self.email.as_deref(),
            self.global_key.as_deref(),
        )?;

        let mut config = DdnsConfig::new(record, credential).with_timeout(self.timeout);
        config.ip_echo_url = self.ip_echo_url.clone();
        config.api_base_url = self.api_base_url.clone();
        config.user_agent = self.user_agent.clone();

        config.validate()?;
        Ok(config)
    }
}

/// Parse a boolean flag value
fn parse_bool(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" => Ok(true),
        "0" | "f" | "false" | "n" | "no" => Ok(false),
        other => Err(format!("invalid boolean: {:?}", other)),
    }
}

/// Parse `<n>`, `<n>ms`, `<n>s`, `<n>m` or `<n>h`; a bare number is seconds
pub fn parse_duration(s: &str) -> std::result::Result<Duration, String> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (digits, unit) = s.split_at(split);

    if digits.is_empty() {
        return Err(format!("invalid duration: {:?}", s));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| format!("invalid duration: {:?}", s))?;

    let duration = match unit {
        "" | "s" => Duration::from_secs(value),
        "ms" => Duration::from_millis(value),
        "m" => value.checked_mul(60).map(Duration::from_secs).ok_or("duration too large")?,
        "h" => value
            .checked_mul(3600)
            .map(Duration::from_secs)
            .ok_or("duration too large")?,
        _ => return Err(format!("invalid duration unit in {:?} (use ms, s, m or h)", s)),
    };

    Ok(duration)
}

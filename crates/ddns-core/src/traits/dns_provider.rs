// # DNS Provider Trait
//
// Defines the interface for zone lookup and A record CRUD via a provider API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{Context, DnsProvider};
//
// async fn show(provider: &dyn DnsProvider) -> ddns_core::Result<()> {
//     let ctx = Context::background();
//     let zone_id = provider.find_zone_id(&ctx, "example.com").await?;
//     let record = provider.get_a_record(&ctx, &zone_id, "home.example.com").await?;
//     println!("{:?}", record);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

use crate::context::Context;

/// A DNS zone hosted by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Opaque provider-assigned identifier
    pub id: String,
    /// Fully-qualified zone name, e.g. `example.com`
    #[serde(default)]
    pub name: String,
}

/// DNS record type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[default]
    A,
}

impl RecordType {
    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single DNS A record as the provider sees it
///
/// `name` is the record label (`home`) when sent in a create or update
/// payload, and the fully-qualified name (`home.example.com`) when returned
/// by a lookup. The provider's response is authoritative; records are never
/// mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider identifier, empty until created
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Record type
    #[serde(rename = "type", default)]
    pub record_type: RecordType,
    /// Label or FQDN depending on context
    pub name: String,
    /// Dotted-decimal IPv4 address
    pub content: String,
    /// TTL in seconds; 1 means automatic
    #[serde(default)]
    pub ttl: u32,
    /// Traffic proxied through the provider's edge
    #[serde(default)]
    pub proxied: bool,
}

impl DnsRecord {
    /// Build an A record payload for create/update
    ///
    /// `label` is the name relative to the zone, not the FQDN.
    pub fn a(label: impl Into<String>, ip: Ipv4Addr, ttl: u32, proxied: bool) -> Self {
        Self {
            id: String::new(),
            record_type: RecordType::A,
            name: label.into(),
            content: ip.to_string(),
            ttl,
            proxied,
        }
    }
}

/// Trait for DNS provider implementations
///
/// Providers are stateless and single-shot: one call is one API request,
/// with no retries and no caching across calls. Deciding whether a write
/// is needed is owned by [`crate::DdnsEngine`].
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Look up a zone's id by its exact name
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for an empty name
    /// - `UpstreamStatus` for a non-2xx response
    /// - `Decode` for a malformed envelope
    /// - `NotFound` when the envelope is unsuccessful or lists no zones
    async fn find_zone_id(&self, ctx: &Context, zone_name: &str) -> Result<String, crate::Error>;

    /// Fetch the A record whose fully-qualified name is `fqdn`
    ///
    /// Absence is `Ok(None)`, not an error.
    async fn get_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        fqdn: &str,
    ) -> Result<Option<DnsRecord>, crate::Error>;

    /// Create an A record; `record.name` is the label
    ///
    /// Returns the provider's copy, with `id` populated.
    async fn create_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord, crate::Error>;

    /// Replace the A record `record_id`; `record.name` is the label
    ///
    /// Returns the provider's copy of the updated record.
    async fn update_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

//! Zone lookup and A record operations

use async_trait::async_trait;
use ddns_core::{Context, DnsProvider, DnsRecord, Error, RecordType, Result, Zone};
use serde::Deserialize;
use std::fmt;

use crate::client::CloudflareClient;

const OP_FIND_ZONE: &str = "zones lookup";
const OP_GET_RECORD: &str = "get dns record";
const OP_CREATE_RECORD: &str = "create dns record";
const OP_UPDATE_RECORD: &str = "update dns record";

/// Standard v4 response wrapper
///
/// `result` is null on failed calls, so it is optional for every payload.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<ApiMessage>,
    #[serde(default)]
    pub messages: Vec<ApiMessage>,
    pub result: Option<T>,
}

/// One entry of an envelope's `errors` or `messages` list
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ApiMessage {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl<T> Envelope<T> {
    /// Join the reported errors, falling back to informational messages
    fn describe_failure(&self) -> String {
        let entries = if self.errors.is_empty() {
            &self.messages
        } else {
            &self.errors
        };

        if entries.is_empty() {
            return "no error details".to_string();
        }

        entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Unwrap a write response: unsuccessful or empty envelopes are failures
    fn into_written(self, operation: &str) -> Result<T> {
        if !self.success {
            return Err(Error::operation_failed(operation, self.describe_failure()));
        }
        self.result
            .ok_or_else(|| Error::operation_failed(operation, "missing result"))
    }
}

fn require(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::invalid_argument(format!("{} cannot be empty", what)));
    }
    Ok(())
}

#[async_trait]
impl DnsProvider for CloudflareClient {
    /// Look up a zone id by exact name
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones?name=example.com
    /// ```
    async fn find_zone_id(&self, ctx: &Context, zone_name: &str) -> Result<String> {
        require(zone_name, "zone name")?;

        let mut url = self.endpoint(&[])?;
        url.query_pairs_mut().append_pair("name", zone_name);

        let response = self.send(ctx, OP_FIND_ZONE, self.http().get(url)).await?;
        let envelope: Envelope<Vec<Zone>> = self.read_envelope(ctx, OP_FIND_ZONE, response).await?;

        if !envelope.success {
            tracing::debug!(
                "Zone lookup for {} unsuccessful: {}",
                zone_name,
                envelope.describe_failure()
            );
            return Err(Error::not_found(format!("zone not found: {}", zone_name)));
        }

        let zone = envelope
            .result
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID {} for {}", zone.id, zone_name);
        Ok(zone.id)
    }

    /// Fetch the first A record with exactly this FQDN
    ///
    /// An unsuccessful envelope is treated the same as an empty list.
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// ```
    async fn get_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        fqdn: &str,
    ) -> Result<Option<DnsRecord>> {
        require(zone_id, "zone id")?;
        require(fqdn, "record name")?;

        let mut url = self.endpoint(&[zone_id, "dns_records"])?;
        url.query_pairs_mut()
            .append_pair("type", RecordType::A.as_str())
            .append_pair("name", fqdn);

        let response = self.send(ctx, OP_GET_RECORD, self.http().get(url)).await?;
        let envelope: Envelope<Vec<DnsRecord>> =
            self.read_envelope(ctx, OP_GET_RECORD, response).await?;

        if !envelope.success {
            tracing::debug!(
                "Record lookup for {} unsuccessful: {}",
                fqdn,
                envelope.describe_failure()
            );
            return Ok(None);
        }

        let record = envelope.result.unwrap_or_default().into_iter().next();
        match &record {
            Some(record) => tracing::debug!("Found record {} for {}", record.id, fqdn),
            None => tracing::debug!("No A record for {}", fqdn),
        }
        Ok(record)
    }

    /// Create a new A record
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /zones/:zone_id/dns_records
    /// {"type":"A","name":"home","content":"203.0.113.7","ttl":1,"proxied":false}
    /// ```
    async fn create_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord> {
        require(zone_id, "zone id")?;

        let url = self.endpoint(&[zone_id, "dns_records"])?;
        let request = self.http().post(url).json(record);

        let response = self.send(ctx, OP_CREATE_RECORD, request).await?;
        let envelope: Envelope<DnsRecord> =
            self.read_envelope(ctx, OP_CREATE_RECORD, response).await?;

        let created = envelope.into_written(OP_CREATE_RECORD)?;
        tracing::debug!("Created record {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Replace an existing A record by id
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /zones/:zone_id/dns_records/:record_id
    /// ```
    async fn update_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord> {
        require(zone_id, "zone id")?;
        require(record_id, "record id")?;

        let url = self.endpoint(&[zone_id, "dns_records", record_id])?;
        let request = self.http().put(url).json(record);

        let response = self.send(ctx, OP_UPDATE_RECORD, request).await?;
        let envelope: Envelope<DnsRecord> =
            self.read_envelope(ctx, OP_UPDATE_RECORD, response).await?;

        let updated = envelope.into_written(OP_UPDATE_RECORD)?;
        tracing::debug!("Updated record {} ({})", updated.id, updated.name);
        Ok(updated)
    }

    fn provider_name(&self) -> &'static str {
        "cloudflare"
    }
}

//! Test doubles and common utilities for reconciliation contract tests
//!
//! This module provides minimal test doubles that record every call the
//! engine makes, so tests can assert exactly which reads and writes happened.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::{Context, DnsProvider, DnsRecord, IpSource, RecordConfig, RecordType};
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source that always reports the same address
pub struct FixedIpSource {
    ip: Ipv4Addr,
    call_count: Arc<AtomicUsize>,
}

impl FixedIpSource {
    pub fn new(ip: Ipv4Addr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle on the call counter
    pub fn counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait::async_trait]
impl IpSource for FixedIpSource {
    async fn current(&self, ctx: &Context) -> Result<Ipv4Addr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        ctx.run(async { self.ip }).await.map_err(Error::from)
    }

    fn source_name(&self) -> &str {
        "fixed"
    }
}

/// An IP source that always fails
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self, _ctx: &Context) -> Result<Ipv4Addr> {
        Err(Error::upstream_status(
            "discover public IPv4",
            503,
            "Service Unavailable",
        ))
    }

    fn source_name(&self) -> &str {
        "failing"
    }
}

/// A provider call, as recorded by [`MockDnsProvider`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    FindZone(String),
    GetRecord { zone_id: String, fqdn: String },
    Create { zone_id: String, record: DnsRecord },
    Update { zone_id: String, record_id: String, record: DnsRecord },
}

/// Which provider step should fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nowhere,
    FindZone,
    GetRecord,
    Write,
}

/// A mock DnsProvider backed by at most one existing record
#[derive(Clone)]
pub struct MockDnsProvider {
    zone_id: Option<String>,
    existing: Arc<Mutex<Option<DnsRecord>>>,
    calls: Arc<Mutex<Vec<Call>>>,
    fail_at: FailAt,
}

impl MockDnsProvider {
    /// Provider hosting `zone_id` with no A record yet
    pub fn new(zone_id: &str) -> Self {
        Self {
            zone_id: Some(zone_id.to_string()),
            existing: Arc::new(Mutex::new(None)),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_at: FailAt::Nowhere,
        }
    }

    /// Provider that hosts no zones at all
    pub fn without_zone() -> Self {
        Self {
            zone_id: None,
            ..Self::new("unused")
        }
    }

    /// Seed an existing record
    pub fn with_record(self, id: &str, fqdn: &str, content: &str) -> Self {
        *self.existing.lock().unwrap() = Some(DnsRecord {
            id: id.to_string(),
            record_type: RecordType::A,
            name: fqdn.to_string(),
            content: content.to_string(),
            ttl: 300,
            proxied: false,
        });
        self
    }

    /// Make one step fail with an upstream error
    pub fn failing_at(mut self, step: FailAt) -> Self {
        self.fail_at = step;
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of create/update calls made so far
    pub fn write_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Create { .. } | Call::Update { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail(&self, step: FailAt, operation: &str) -> Result<()> {
        if self.fail_at == step {
            return Err(Error::upstream_status(operation, 500, "Internal Server Error"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn find_zone_id(&self, ctx: &Context, zone_name: &str) -> Result<String> {
        ctx.run(async {}).await?;
        self.record(Call::FindZone(zone_name.to_string()));
        self.fail(FailAt::FindZone, "zones lookup")?;

        self.zone_id
            .clone()
            .ok_or_else(|| Error::not_found(format!("zone not found: {}", zone_name)))
    }

    async fn get_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        fqdn: &str,
    ) -> Result<Option<DnsRecord>> {
        ctx.run(async {}).await?;
        self.record(Call::GetRecord {
            zone_id: zone_id.to_string(),
            fqdn: fqdn.to_string(),
        });
        self.fail(FailAt::GetRecord, "get dns record")?;

        let existing = self.existing.lock().unwrap().clone();
        Ok(existing.filter(|record| record.name == fqdn))
    }

    async fn create_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord> {
        ctx.run(async {}).await?;
        self.record(Call::Create {
            zone_id: zone_id.to_string(),
            record: record.clone(),
        });
        self.fail(FailAt::Write, "create dns record")?;

        let created = DnsRecord {
            id: "new-rid".to_string(),
            ..record.clone()
        };
        Ok(created)
    }

    async fn update_a_record(
        &self,
        ctx: &Context,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecord,
    ) -> Result<DnsRecord> {
        ctx.run(async {}).await?;
        self.record(Call::Update {
            zone_id: zone_id.to_string(),
            record_id: record_id.to_string(),
            record: record.clone(),
        });
        self.fail(FailAt::Write, "update dns record")?;

        Ok(DnsRecord {
            id: record_id.to_string(),
            ..record.clone()
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Helper to create the record configuration used across tests
pub fn home_record() -> RecordConfig {
    RecordConfig::new("example.com", "home")
}

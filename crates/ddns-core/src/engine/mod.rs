//! Core reconciliation engine
//!
//! The DdnsEngine is responsible for:
//! - Discovering the current public IPv4 via IpSource
//! - Resolving the zone and fetching the existing A record via DnsProvider
//! - Deciding between no-op, update and create
//! - Performing at most one write per run
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐        ┌──────────────┐        ┌─────────────┐
//! │  IpSource   │◀───────│  DdnsEngine  │───────▶│ DnsProvider │
//! │ (discover)  │   ip   │  (decide)    │  r/w   │ (zone, A)   │
//! └─────────────┘        └──────────────┘        └─────────────┘
//! ```
//!
//! ## Flow
//!
//! 1. Validate the record configuration (at construction, before any I/O)
//! 2. Discover the public IPv4
//! 3. Resolve the zone id by name
//! 4. Fetch the A record by FQDN (`label.zone`)
//! 5. Absent → create; same content → no-op; different → update by id
//!
//! Every failure aborts the run. There is no retry and nothing to roll back.

use std::fmt;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::config::RecordConfig;
use crate::context::Context;
use crate::error::Result;
use crate::traits::{DnsProvider, DnsRecord, IpSource};

/// Terminal outcome of a successful run
///
/// `Display` renders the one-line operator status message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The record already points at the discovered address
    Unchanged {
        /// Fully-qualified record name
        fqdn: String,
        /// Discovered address
        ip: Ipv4Addr,
    },

    /// The existing record was rewritten
    Updated {
        /// Fully-qualified record name
        fqdn: String,
        /// Discovered address
        ip: Ipv4Addr,
        /// Content the record held before
        previous: String,
        /// The provider's copy after the update
        record: DnsRecord,
    },

    /// No record existed and one was created
    Created {
        /// Fully-qualified record name
        fqdn: String,
        /// Discovered address
        ip: Ipv4Addr,
        /// The provider's copy, with its new id
        record: DnsRecord,
    },
}

impl ReconcileOutcome {
    /// True when a write was issued
    pub fn wrote(&self) -> bool {
        !matches!(self, ReconcileOutcome::Unchanged { .. })
    }
}

impl fmt::Display for ReconcileOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileOutcome::Unchanged { fqdn, ip } => {
                write!(f, "No change: {} already points to {}", fqdn, ip)
            }
            ReconcileOutcome::Updated { fqdn, ip, .. } => write!(f, "Updated A {} -> {}", fqdn, ip),
            ReconcileOutcome::Created { fqdn, ip, .. } => write!(f, "Created A {} -> {}", fqdn, ip),
        }
    }
}

/// Single-record reconciliation engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`] (validates the record configuration)
/// 2. Call [`DdnsEngine::reconcile()`] once per run
///
/// The engine holds no state between runs; calling `reconcile` again with no
/// address change always lands on [`ReconcileOutcome::Unchanged`].
pub struct DdnsEngine {
    /// Source of the current public IPv4
    ip_source: Box<dyn IpSource>,

    /// Provider API
    provider: Box<dyn DnsProvider>,

    /// Record to keep in sync
    record: RecordConfig,

    /// Validated TTL
    ttl: u32,
}

impl DdnsEngine {
    /// Create a new engine
    ///
    /// Fails with `InvalidArgument` when the record configuration is invalid.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        record: RecordConfig,
    ) -> Result<Self> {
        record.validate()?;
        let ttl = record.ttl_seconds()?;

        Ok(Self {
            ip_source,
            provider,
            record,
            ttl,
        })
    }

    /// The record this engine manages
    pub fn record(&self) -> &RecordConfig {
        &self.record
    }

    /// Run one read-then-decide-then-write cycle
    pub async fn reconcile(&self, ctx: &Context) -> Result<ReconcileOutcome> {
        let fqdn = self.record.fqdn();

        let ip = self.ip_source.current(ctx).await?;
        info!("Current public IPv4: {} (via {})", ip, self.ip_source.source_name());

        let zone_id = self.provider.find_zone_id(ctx, &self.record.zone).await?;
        debug!("Zone {} has id {}", self.record.zone, zone_id);

        let existing = self.provider.get_a_record(ctx, &zone_id, &fqdn).await?;
        let payload = DnsRecord::a(self.record.name.clone(), ip, self.ttl, self.record.proxied);

        match existing {
            Some(existing) if existing.content == payload.content => {
                info!("Record {} already points to {}, nothing to do", fqdn, ip);
                Ok(ReconcileOutcome::Unchanged { fqdn, ip })
            }
            Some(existing) => {
                info!(
                    "Updating {} ({}): {} -> {}",
                    fqdn, existing.id, existing.content, ip
                );
                let record = self
                    .provider
                    .update_a_record(ctx, &zone_id, &existing.id, &payload)
                    .await?;
                Ok(ReconcileOutcome::Updated {
                    fqdn,
                    ip,
                    previous: existing.content,
                    record,
                })
            }
            None => {
                info!("No A record for {}, creating it -> {}", fqdn, ip);
                let record = self
                    .provider
                    .create_a_record(ctx, &zone_id, &payload)
                    .await?;
                Ok(ReconcileOutcome::Created { fqdn, ip, record })
            }
        }
    }
}

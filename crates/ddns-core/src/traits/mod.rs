//! Core traits for the DDNS reconciler
//!
//! This module defines the abstract interfaces the engine is written against.
//!
//! - [`IpSource`]: Discover the current public IPv4 address
//! - [`DnsProvider`]: Zone lookup and A record reads/writes via a provider API

pub mod dns_provider;
pub mod ip_source;

pub use dns_provider::{DnsProvider, DnsRecord, RecordType, Zone};
pub use ip_source::IpSource;

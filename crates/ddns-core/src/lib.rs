// # ddns-core
//
// Core library for the single-record DDNS reconciler.
//
// ## Architecture Overview
//
// This library provides the pieces shared by every other crate:
// - **Context**: Cancellation and deadline carried into every network call
// - **IpSource**: Trait for discovering the current public IPv4 address
// - **DnsProvider**: Trait for zone lookup and A record reads/writes
// - **DdnsEngine**: Read-then-decide-then-write reconciliation of one A record
// - **Config**: Typed, validated run configuration
//
// ## Design Principles
//
// 1. **Stateless**: Every run reads the provider fresh; nothing is persisted
// 2. **Fail Fast**: No retries inside the core, the caller decides
// 3. **At Most One Write**: A run either does nothing, creates, or updates
// 4. **Library-First**: The daemon is a thin adapter over this crate

pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credential, DdnsConfig, RecordConfig};
pub use context::{Context, ContextError};
pub use engine::{DdnsEngine, ReconcileOutcome};
pub use error::{Error, Result};
pub use traits::{DnsProvider, DnsRecord, IpSource, RecordType, Zone};

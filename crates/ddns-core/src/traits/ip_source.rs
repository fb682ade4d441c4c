// # IP Source Trait
//
// Defines the interface for discovering the host's public IPv4 address.
//
// ## Implementations
//
// - HTTP echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{Context, IpSource};
//
// async fn show(source: &dyn IpSource) -> ddns_core::Result<()> {
//     let ctx = Context::background();
//     let ip = source.current(&ctx).await?;
//     println!("public IPv4: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::Ipv4Addr;

use crate::context::Context;

/// Trait for IP source implementations
///
/// One call is one discovery attempt. Implementations must not retry and
/// must not cache results between calls; the caller decides whether to try
/// again.
///
/// Only IPv4 is in scope. A source that learns an IPv6 address must fail
/// with [`crate::Error::InvalidResponse`] rather than return it.
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Discover the current public IPv4 address
    ///
    /// # Returns
    ///
    /// - `Ok(Ipv4Addr)`: The current address
    /// - `Err(Error)`: Transport failure, non-2xx status, context expiry or a
    ///   body that is not an IPv4 literal
    async fn current(&self, ctx: &Context) -> Result<Ipv4Addr, crate::Error>;

    /// Human-readable name of the source (for logging)
    fn source_name(&self) -> &str;
}

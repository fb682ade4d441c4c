// # Cloudflare DNS Provider
//
// Minimal Cloudflare v4 API client covering what a single-record DDNS run
// needs: zone lookup by name and A record read/create/update.
//
// ## Behavior
//
// - One HTTP request per call; no retries, no caching
// - Exactly one credential: bearer API token, or email + global API key
// - Every call runs under the caller's `Context`
// - Non-2xx answers are reported by status; 2xx bodies are decoded as the
//   standard `{success, errors, messages, result}` envelope
//
// ## Security Requirements
//
// - Credentials NEVER appear in logs or `Debug` output
// - Construction fails fast on missing or conflicting credentials
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::{Context, DnsProvider};
// use ddns_provider_cloudflare::CloudflareClient;
//
// let client = CloudflareClient::builder().api_token(token).build()?;
// let zone_id = client.find_zone_id(&Context::background(), "example.com").await?;
// ```

mod client;
mod dns;

pub use client::{CLOUDFLARE_API_BASE, ClientBuilder, CloudflareClient, DEFAULT_USER_AGENT, TlsOptions};

// # HTTP IP Source
//
// This crate discovers the host's public IPv4 address by asking a
// third-party echo service (e.g. api.ipify.org) which address the request
// came from.
//
// ## Behavior
//
// - One GET per call; no retries and no caching
// - The body must be a bare IPv4 literal (surrounding whitespace allowed)
// - IPv6 answers are rejected: only A records are maintained
// - Every request runs under the caller's `Context`

use ddns_core::config::DEFAULT_IP_ECHO_URL;
use ddns_core::{Context, Error, IpSource, Result};

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

/// Timeout of the internally constructed HTTP client
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Operation name used in errors
const OPERATION: &str = "discover public IPv4";

/// Longest slice of a rejected body echoed back in errors
const MAX_ECHOED_BODY: usize = 64;

/// Largest body accepted from the echo service
const MAX_BODY_BYTES: usize = 1024;

/// Discover the public IPv4 address via the default echo service
///
/// With `client == None` a client with a 10 second timeout is built.
pub async fn discover_public_ipv4(
    ctx: &Context,
    client: Option<&reqwest::Client>,
) -> Result<Ipv4Addr> {
    let source = match client {
        Some(client) => HttpIpSource::with_client(DEFAULT_IP_ECHO_URL, client.clone()),
        None => HttpIpSource::new(DEFAULT_IP_ECHO_URL)?,
    };

    source.current(ctx).await
}

/// HTTP-based public IPv4 source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// Echo endpoint
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a source for `url` with a 10 second client timeout
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| Error::transport(OPERATION, e))?;

        Ok(Self::with_client(url, client))
    }

    /// Create a source for `url` using a caller-supplied client
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }

    /// The echo endpoint
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch and parse one answer from the echo service
    async fn fetch_ip(&self) -> Result<Ipv4Addr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::transport(OPERATION, e))?;

        let status = response.status();
        if !status.is_success() {
            // Body is dropped unread, releasing the connection.
            return Err(Error::upstream_status(
                OPERATION,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body = read_body(response).await?;
        parse_ipv4(&body)
    }
}

/// Read the whole body, refusing anything larger than `MAX_BODY_BYTES`
async fn read_body(mut response: reqwest::Response) -> Result<String> {
    if response
        .content_length()
        .is_some_and(|len| len > MAX_BODY_BYTES as u64)
    {
        return Err(Error::invalid_response(format!(
            "body larger than {} bytes",
            MAX_BODY_BYTES
        )));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::transport(OPERATION, e))?
    {
        if body.len() + chunk.len() > MAX_BODY_BYTES {
            return Err(Error::invalid_response(format!(
                "body larger than {} bytes",
                MAX_BODY_BYTES
            )));
        }
        body.extend_from_slice(&chunk);
    }

    String::from_utf8(body).map_err(|_| Error::invalid_response("body is not UTF-8"))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, ctx: &Context) -> Result<Ipv4Addr> {
        tracing::debug!("Querying IP echo service {}", self.url);

        let ip = ctx.run(self.fetch_ip()).await??;

        tracing::debug!("Echo service reported {}", ip);
        Ok(ip)
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}

/// Parse an echo-service body as an IPv4 literal
///
/// Returns the canonical dotted-decimal form on success.
pub fn parse_ipv4(body: &str) -> Result<Ipv4Addr> {
    let text = body.trim();

    match text.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => Ok(ip),
        Ok(IpAddr::V6(ip)) => Err(Error::invalid_response(format!(
            "expected IPv4, got IPv6 address {}",
            ip
        ))),
        Err(_) if text.is_empty() => Err(Error::invalid_response("empty body")),
        Err(_) => Err(Error::invalid_response(format!(
            "not an IP address: {:?}",
            truncate(text)
        ))),
    }
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_ECHOED_BODY) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

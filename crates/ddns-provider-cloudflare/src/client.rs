//! Client construction and the shared request dispatch path
//!
//! Every request goes through [`CloudflareClient::send`], which attaches the
//! JSON content type, the user agent and the credential headers, and runs
//! the round trip under the caller's [`Context`].

use ddns_core::{Context, Credential, Error, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use url::Url;

use crate::dns::Envelope;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = ddns_core::config::DEFAULT_API_BASE_URL;

/// User-Agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("ddns-provider-cloudflare/", env!("CARGO_PKG_VERSION"));

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// TCP connect timeout of the internal transport
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP keepalive of the internal transport
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);

const HEADER_AUTH_EMAIL: HeaderName = HeaderName::from_static("x-auth-email");
const HEADER_AUTH_KEY: HeaderName = HeaderName::from_static("x-auth-key");

/// Root of every endpoint, relative to the base URL
const ZONES_PATH: &str = "zones";

/// TLS settings for the internally built transport
///
/// Ignored when a custom `reqwest::Client` is injected.
#[derive(Debug, Clone, Default)]
pub struct TlsOptions {
    /// Minimum accepted TLS version
    pub min_version: Option<reqwest::tls::Version>,

    /// Extra trusted root certificates
    pub root_certificates: Vec<reqwest::Certificate>,

    /// Skip certificate verification (lab setups only)
    pub accept_invalid_certs: bool,
}

/// Builder for [`CloudflareClient`]
///
/// Settings are collected first and validated once, in [`ClientBuilder::build`].
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    http_client: Option<reqwest::Client>,
    user_agent: Option<String>,
    tls: TlsOptions,
    timeout: Option<Duration>,
    api_token: Option<String>,
    global_key: Option<(String, String)>,
}

impl ClientBuilder {
    /// Override the API base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Use a caller-built HTTP client (timeout and TLS settings are then not applied)
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Override the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// TLS settings for the internal transport
    pub fn tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    /// Overall per-request timeout for the internal transport
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Authenticate with a bearer API token
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Authenticate with the legacy email + global API key pair
    pub fn global_key(mut self, email: impl Into<String>, key: impl Into<String>) -> Self {
        self.global_key = Some((email.into(), key.into()));
        self
    }

    /// Authenticate with an already-resolved credential
    pub fn credential(self, credential: Credential) -> Self {
        match credential {
            Credential::Token(token) => self.api_token(token),
            Credential::GlobalKey { email, key } => self.global_key(email, key),
        }
    }

    /// Validate the collected settings and build the client
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when zero or both credential variants are set, when
    /// the key pair is incomplete, or when the base URL or user agent is
    /// unusable.
    pub fn build(self) -> Result<CloudflareClient> {
        let (email, key) = match &self.global_key {
            Some((email, key)) => (Some(email.as_str()), Some(key.as_str())),
            None => (None, None),
        };
        let credential = Credential::from_parts(self.api_token.as_deref(), email, key)?;

        let base_url = parse_base_url(self.base_url.as_deref().unwrap_or(CLOUDFLARE_API_BASE))?;

        let user_agent = self
            .user_agent
            .as_deref()
            .map(str::trim)
            .filter(|ua| !ua.is_empty())
            .unwrap_or(DEFAULT_USER_AGENT);
        let user_agent = HeaderValue::from_str(user_agent)
            .map_err(|_| Error::invalid_argument(format!("invalid user agent: {:?}", user_agent)))?;

        let http = match self.http_client {
            Some(client) => client,
            None => build_transport(self.tls, self.timeout)?,
        };

        Ok(CloudflareClient {
            credential,
            base_url,
            http,
            user_agent,
        })
    }
}

/// Cloudflare v4 API client for zones and A records
///
/// Constructed once per run and immutable afterwards.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose credentials.
#[derive(Clone)]
pub struct CloudflareClient {
    credential: Credential,
    base_url: Url,
    http: reqwest::Client,
    user_agent: HeaderValue,
}

// Custom Debug implementation that hides the credential
impl fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("auth", &self.credential.scheme())
            .field("base_url", &self.base_url.as_str())
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl CloudflareClient {
    /// Start building a client
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// The normalized base URL (always ends with `/`)
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client
    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Resolve `zones/<segments...>` against the base URL
    ///
    /// Segments are percent-encoded individually, so ids can never escape
    /// their path position.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(ZONES_PATH)
            .map_err(|e| Error::invalid_argument(format!("cannot resolve endpoint: {}", e)))?;

        if !segments.is_empty() {
            url.path_segments_mut()
                .map_err(|_| Error::invalid_argument("base URL cannot carry a path"))?
                .extend(segments);
        }

        Ok(url)
    }

    /// Dispatch one request with the standard headers under `ctx`
    pub(crate) async fn send(
        &self,
        ctx: &Context,
        operation: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response> {
        let mut request = request.build().map_err(|e| request_error(operation, e))?;

        let headers = request.headers_mut();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(USER_AGENT, self.user_agent.clone());
        self.authorize(headers)?;

        tracing::debug!(
            "{}: {} {}",
            operation,
            request.method(),
            request.url().path()
        );

        ctx.run(self.http.execute(request))
            .await?
            .map_err(|e| request_error(operation, e))
    }

    /// Attach exactly the headers of the active credential variant
    fn authorize(&self, headers: &mut HeaderMap) -> Result<()> {
        match &self.credential {
            Credential::Token(token) => {
                if token.trim().is_empty() {
                    return Err(Error::MissingCredential("api token"));
                }
                let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|_| Error::invalid_argument("api token contains invalid characters"))?;
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Credential::GlobalKey { email, key } => {
                if email.trim().is_empty() || key.trim().is_empty() {
                    return Err(Error::MissingCredential("global key credentials"));
                }
                let email = HeaderValue::from_str(email)
                    .map_err(|_| Error::invalid_argument("email contains invalid characters"))?;
                let mut key = HeaderValue::from_str(key)
                    .map_err(|_| Error::invalid_argument("global key contains invalid characters"))?;
                key.set_sensitive(true);
                headers.insert(HEADER_AUTH_EMAIL, email);
                headers.insert(HEADER_AUTH_KEY, key);
            }
        }
        Ok(())
    }

    /// Check the status, read the whole body under `ctx` and decode the envelope
    pub(crate) async fn read_envelope<T: DeserializeOwned>(
        &self,
        ctx: &Context,
        operation: &str,
        response: reqwest::Response,
    ) -> Result<Envelope<T>> {
        let status = response.status();
        if !status.is_success() {
            // Dropping the response here releases its connection.
            return Err(Error::upstream_status(
                operation,
                status.as_u16(),
                status.canonical_reason().unwrap_or_default(),
            ));
        }

        let body = ctx
            .run(response.bytes())
            .await?
            .map_err(|e| request_error(operation, e))?;

        serde_json::from_slice(&body).map_err(|e| Error::decode(operation, e))
    }
}

/// Parse and normalize the base URL so relative references resolve beneath it
fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| Error::invalid_argument(format!("invalid base URL {:?}: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::invalid_argument(format!(
            "invalid base URL {:?}: expected an http(s) URL",
            raw
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

fn build_transport(tls: TlsOptions, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let timeout = timeout
        .filter(|t| !t.is_zero())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT);

    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .tcp_keepalive(TCP_KEEPALIVE)
        .timeout(timeout)
        .danger_accept_invalid_certs(tls.accept_invalid_certs);

    if let Some(version) = tls.min_version {
        builder = builder.min_tls_version(version);
    }
    for certificate in tls.root_certificates {
        builder = builder.add_root_certificate(certificate);
    }

    builder
        .build()
        .map_err(|e| Error::invalid_argument(format!("cannot build HTTP client: {}", e)))
}

fn request_error(operation: &str, err: reqwest::Error) -> Error {
    if err.is_builder() {
        Error::invalid_argument(format!("{}: {}", operation, err))
    } else {
        Error::transport(operation, err)
    }
}

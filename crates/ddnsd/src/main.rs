// # ddnsd - one-shot DDNS runner
//
// Keeps a single Cloudflare A record (`<name>.<zone>`) pointed at this
// host's public IPv4 address. Each invocation runs exactly one
// read-then-decide-then-write cycle and exits.
//
// This binary is a THIN integration layer: flags, logging, runtime and
// signal handling live here; all DDNS logic lives in ddns-core.
//
// ## Configuration
//
// Every flag has an environment fallback:
//
// - `--zone` / `ZONE`: zone (apex domain)
// - `--name` / `NAME`: record label within the zone
// - `--ttl` / `TTL`: TTL in seconds, 1 = automatic (default 1)
// - `--proxied` / `PROXIED`: proxy through Cloudflare (default false)
// - `--api-token` / `CF_API_TOKEN`: API token (preferred)
// - `--email` / `CF_EMAIL` + `--global-key` / `CF_GLOBAL_KEY`: legacy auth
// - `--timeout` / `TIMEOUT`: overall deadline (default 30s)
// - `--log-level` / `DDNS_LOG_LEVEL`: log filter (default warn)
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_token
// ddnsd --zone example.com --name home
// ```
//
// ## Exit codes
//
// - 0: record already current, updated or created (status line on stdout)
// - 1: invalid configuration or failed run (error on stderr)

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser;
use ddns_core::{Context, DdnsConfig, DdnsEngine, ReconcileOutcome};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareClient;
use std::process::ExitCode;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// Process exit codes
#[derive(Debug, Clone, Copy)]
enum DdnsExitCode {
    /// Run completed (no-op, update or create)
    Success = 0,
    /// Configuration error or failed run
    Failure = 1,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = match cli::Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                DdnsExitCode::Failure.into()
            } else {
                // --help / --version
                DdnsExitCode::Success.into()
            };
        }
    };

    // Configuration problems are reported before any network call.
    let config = match args.to_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return DdnsExitCode::Failure.into();
        }
    };

    if let Err(e) = init_tracing(&args.log_level) {
        eprintln!("{:#}", e);
        return DdnsExitCode::Failure.into();
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {}", e);
            return DdnsExitCode::Failure.into();
        }
    };

    let result = runtime.block_on(async {
        let ctx = Context::background().with_timeout(config.timeout);
        let signals = match with_signal_cancel(&ctx) {
            Ok(listener) => Some(listener),
            Err(e) => {
                warn!("Signal handling unavailable: {:#}", e);
                None
            }
        };

        let result = run(&ctx, config).await;

        if let Some(listener) = signals {
            listener.abort();
        }
        result
    });

    match result {
        Ok(outcome) => {
            println!("{}", outcome);
            DdnsExitCode::Success.into()
        }
        Err(e) => {
            eprintln!("{}", describe_failure(&e));
            DdnsExitCode::Failure.into()
        }
    }
}

/// Install the stderr log subscriber
fn init_tracing(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).with_context(|| format!("invalid log level {:?}", level))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to set tracing subscriber: {}", e))
}

/// Build the collaborators and run one reconciliation under `ctx`
async fn run(ctx: &Context, config: DdnsConfig) -> Result<ReconcileOutcome> {
    let ip_source = HttpIpSource::new(config.ip_echo_url.as_str())
        .context("failed to build IP echo client")?;

    let mut builder = CloudflareClient::builder()
        .credential(config.credential.clone())
        .base_url(config.api_base_url.as_str())
        .timeout(config.timeout);
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }
    let client = builder.build().context("failed to build Cloudflare client")?;
    debug!("Using {:?}", client);

    let engine = DdnsEngine::new(Box::new(ip_source), Box::new(client), config.record)?;
    info!("Reconciling A record {}", engine.record().fqdn());

    Ok(engine.reconcile(ctx).await?)
}

/// Render a failed run for stderr, marking deadline and signal aborts
fn describe_failure(err: &anyhow::Error) -> String {
    match err.downcast_ref::<ddns_core::Error>() {
        Some(e) if e.is_timeout() => format!("timed out: {:#}", err),
        Some(e) if e.is_cancelled() => format!("interrupted: {:#}", err),
        _ => format!("{:#}", err),
    }
}

/// Cancel `ctx` on SIGINT/SIGTERM
///
/// The handlers are installed before this returns, so a signal arriving
/// before the listener is first polled still cancels the run. The listener
/// stops on its own once `ctx` is done.
fn with_signal_cancel(ctx: &Context) -> Result<tokio::task::JoinHandle<()>> {
    let signals = ShutdownSignals::install()?;
    let ctx = ctx.clone();

    Ok(tokio::spawn(async move {
        tokio::select! {
            name = signals.recv() => {
                warn!("Received {}, cancelling run", name);
                ctx.cancel();
            }
            _ = ctx.done() => {}
        }
    }))
}

/// SIGTERM and SIGINT streams
#[cfg(unix)]
struct ShutdownSignals {
    sigterm: Signal,
    sigint: Signal,
}

#[cfg(unix)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            sigterm: signal(SignalKind::terminate()).context("failed to setup SIGTERM handler")?,
            sigint: signal(SignalKind::interrupt()).context("failed to setup SIGINT handler")?,
        })
    }

    async fn recv(mut self) -> &'static str {
        tokio::select! {
            _ = self.sigterm.recv() => "SIGTERM",
            _ = self.sigint.recv() => "SIGINT",
        }
    }
}

/// Ctrl-C stream
///
/// Fallback implementation for Windows.
#[cfg(windows)]
struct ShutdownSignals {
    ctrl_c: tokio::signal::windows::CtrlC,
}

#[cfg(windows)]
impl ShutdownSignals {
    fn install() -> Result<Self> {
        Ok(Self {
            ctrl_c: tokio::signal::windows::ctrl_c().context("failed to setup Ctrl-C handler")?,
        })
    }

    async fn recv(mut self) -> &'static str {
        self.ctrl_c.recv().await;
        "Ctrl-C"
    }
}

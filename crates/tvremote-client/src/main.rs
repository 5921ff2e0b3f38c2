//! tvremote binary.
//!
//! # Usage
//!
//! ```bash
//! # Pair (first run prompts on the TV) and open the service menu
//! tvremote 192.168.1.20
//!
//! # Pair only, keeping the credential somewhere else
//! tvremote 192.168.1.20 --pair-only --credential-file ~/.config/tvremote/key
//! ```
//!
//! Runs until Ctrl-C, then closes the connection.

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use tvremote_client::{
    ClientConfig, ClientError, DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT, PairingOutcome, Session,
    interrupt_channel, transport::websocket,
};
use tvremote_core::FileCredentialStore;
use tvremote_proto::commands;

/// webOS TV remote control
#[derive(Parser, Debug)]
#[command(name = "tvremote")]
#[command(about = "Pair with a webOS TV and send remote-control commands")]
#[command(version)]
struct Args {
    /// TV host name or IP address
    host: String,

    /// Secure WebSocket port
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Where the pairing credential is stored
    #[arg(long, default_value = FileCredentialStore::DEFAULT_PATH)]
    credential_file: PathBuf,

    /// Pairing manifest (JSON) replacing the built-in one
    #[arg(long)]
    manifest: Option<PathBuf>,

    /// Pair, then wait for Ctrl-C without opening the service menu
    #[arg(long)]
    pair_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "debug")]
    log_level: String,
}

impl From<Args> for ClientConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            credential_path: args.credential_file,
            manifest_path: args.manifest,
            send_service_menu: !args.pair_only,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

/// Fatal error tagged with the step that failed.
struct Fatal {
    step: &'static str,
    error: ClientError,
}

fn at<E: Into<ClientError>>(step: &'static str) -> impl FnOnce(E) -> Fatal {
    move |e| Fatal { step, error: e.into() }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    match run(args.into()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(Fatal { step, error }) => {
            tracing::error!(step, %error, "fatal error");
            ExitCode::FAILURE
        },
    }
}

async fn run(config: ClientConfig) -> Result<(), Fatal> {
    let register = config.register_payload().map_err(at("handshake"))?;
    let store = config.credential_store();

    let (handle, mut interrupt) = interrupt_channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => handle.trigger(),
            Err(e) => tracing::warn!(error = %e, "cannot listen for Ctrl-C"),
        }
    });

    let url = config.url();
    tracing::info!(%url, "connecting");
    let dial = websocket::connect(&url, config.connect_timeout);
    let Some(connected) = interrupt.guard(dial).await else {
        tracing::info!("interrupted while connecting");
        return Ok(());
    };
    let (sink, source) = connected.map_err(at("connect"))?;
    let mut session = Session::open(sink, source, interrupt);

    match session.pair(&store, register).await.map_err(at("handshake"))? {
        PairingOutcome::Registered { path, .. } => tracing::info!(?path, "paired"),
        PairingOutcome::Interrupted => {
            session.finish().await;
            return Ok(());
        },
    }

    if config.send_service_menu {
        match session.issuer_mut().send(&commands::service_menu(0)).await {
            Err(e) if session.is_interrupted() => {
                tracing::debug!(error = %e, "service menu skipped, interrupted");
            },
            other => other.map_err(at("command"))?,
        }
    }

    session.run().await.map_err(at("main-loop"))?;
    session.finish().await;

    tracing::info!("disconnected");
    Ok(())
}

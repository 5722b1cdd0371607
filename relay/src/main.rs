use std::error::Error;
use std::net::SocketAddr;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tracing::{debug, instrument, trace};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod cli;

use relay_api::{self as api, ProcessEnv, Settings};
use relay_webhook::InboundEvent;

fn initialize_tracing() -> Result<(), Box<dyn Error>> {
    // Initialize tracing subscriber for human-readable logs. Logs go to
    // stderr so stdout stays free for one-shot responses
    tracing_subscriber::registry()
        .with(
            // Use some log defaults. These can be overriden using
            // RUST_LOG
            EnvFilter::try_from_default_env().unwrap_or(
                EnvFilter::default()
                    .add_directive("debug".parse()?)
                    .add_directive("hyper=error".parse()?)
                    .add_directive("hyper_util=error".parse()?)
                    .add_directive("reqwest=info".parse()?),
            ),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .event_format(fmt::format().compact().with_target(false).without_time()),
        )
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    initialize_tracing()?;

    let cli = cli::parse();
    let settings = cli.settings();
    trace!(settings = ?settings, "using config:");

    match &cli.event {
        Some(path) => invoke_once(path, &settings).await,
        None => serve(cli.listen_address, settings).await,
    }
}

/// Handle a single trigger event and print the response event.
///
/// This is how a serverless runtime calls us: the invocation outcome,
/// failures included, is carried in the printed response, so the process
/// only fails if the event itself cannot be read.
#[instrument(name = "relay", skip_all, err)]
async fn invoke_once(path: &Path, settings: &Settings) -> Result<(), Box<dyn Error>> {
    let raw = if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin().read_to_string(&mut raw).await?;
        raw
    } else {
        tokio::fs::read_to_string(path).await?
    };
    let event: InboundEvent = serde_json::from_str(&raw)?;

    let response = api::invoke(&event, &ProcessEnv, settings).await;
    println!("{}", serde_json::to_string(&response)?);

    Ok(())
}

#[instrument(name = "relay", skip_all, err)]
async fn serve(addr: SocketAddr, settings: Settings) -> Result<(), Box<dyn Error>> {
    let listener = TcpListener::bind(addr).await?;
    debug!("bound to {addr}");

    api::start(listener, settings, ProcessEnv).await?;

    Ok(())
}

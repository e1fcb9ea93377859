//! warelay — WhatsApp automation bridge.
//!
//! Wires together the WhatsApp channel (via a bridge sidecar), the
//! completion provider, the shared bridge state, and the HTTP surface.

mod api;
mod gateway;

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use warelay_channels::whatsapp::WhatsAppChannel;
use warelay_core::config::Config;
use warelay_core::policy::ReplyPolicy;
use warelay_core::shellexpand;
use warelay_core::state::BridgeState;
use warelay_core::traits::{Channel, Provider};
use warelay_providers::openai::OpenAiProvider;

#[derive(Parser, Debug)]
#[command(name = "warelay", version, about = "WhatsApp automation bridge")]
struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml", env = "WARELAY_CONFIG")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let _log_guard = init_tracing(&config);

    info!("warelay starting (config: {})", args.config);

    let state = BridgeState::new(config.log.capacity);
    let channel: Arc<dyn Channel> = Arc::new(WhatsAppChannel::new(&config.whatsapp));
    let provider: Arc<dyn Provider> = Arc::new(OpenAiProvider::from_config(&config.provider));
    let policy = ReplyPolicy::from_config(&config.reply);

    // HTTP surface runs beside the gateway.
    let api_state = api::ApiState::new(channel.clone(), state.clone());
    tokio::spawn(api::serve(
        config.http.host.clone(),
        config.http.port,
        api_state,
    ));

    let gateway = gateway::Gateway::new(
        channel,
        provider,
        policy,
        state,
        config.reply.apology.clone(),
    );
    gateway.run().await
}

/// Initialize tracing: stdout by default, a daily-rolling file when
/// `[log] dir` is configured. `RUST_LOG` overrides the configured level.
fn init_tracing(config: &Config) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.relay.log_level));

    if let Some(dir) = &config.log.dir {
        let appender = tracing_appender::rolling::daily(shellexpand(dir), "warelay.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}

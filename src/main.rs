mod app;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use paynet_explorer::pipeline::{DEFAULT_BACKEND_URL, DEFAULT_MAX_RETRIES, PollConfig};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Metrics endpoint returning the network snapshot document.
    #[arg(long, default_value = DEFAULT_BACKEND_URL)]
    backend_url: String,
    #[arg(long, default_value_t = 10_000)]
    poll_interval_ms: u64,
    #[arg(long, default_value_t = 60_000)]
    http_timeout_ms: u64,
    /// Retries per cycle after a failed fetch.
    #[arg(long, default_value_t = DEFAULT_MAX_RETRIES)]
    max_retries: usize,
    /// Node address shown with an "Echo Node" banner.
    #[arg(long)]
    echo_node_address: Option<String>,
}

impl Args {
    fn poll_config(&self) -> PollConfig {
        PollConfig {
            backend_url: self.backend_url.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            http_timeout: Duration::from_millis(self.http_timeout_ms),
            max_retries: self.max_retries,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = app::ExplorerConfig {
        poll: args.poll_config(),
        echo_node_address: args.echo_node_address.clone(),
    };
    tracing::info!(backend = %config.poll.backend_url, "starting explorer");

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "paynet-explorer",
        options,
        Box::new(move |cc| Ok(Box::new(app::ExplorerApp::new(cc, config)))),
    )
    .map_err(|error| anyhow::anyhow!("{error}"))
    .context("explorer window failed")
}

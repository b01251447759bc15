use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use annex_config::Config;
use annex_index::ElasticsearchClient;
use annex_service::AnnexService;

#[derive(Debug, Parser)]
#[command(
	version = annex_cli::VERSION,
	rename_all = "kebab",
	styles = annex_cli::styles(),
	after_help = annex_cli::env_help(),
)]
pub struct Args {
	/// TOML configuration file. Settings are read from the environment (and `.env`) when omitted.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = load_config(&args)?;

	init_tracing(&config);

	let index = ElasticsearchClient::new(&config.index)?;
	let mut service = AnnexService::new(&config, Arc::new(index))?;

	service.run(shutdown_signal()).await?;
	tracing::info!("Annotation worker stopped.");

	Ok(())
}

/// Reads the configuration file when one is given, the process environment otherwise.
pub fn load_config(args: &Args) -> annex_config::Result<Config> {
	match &args.config {
		Some(path) => annex_config::load(path),
		None => {
			dotenvy::dotenv().ok();

			annex_config::from_env()
		},
	}
}

fn init_tracing(config: &Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

		std::future::pending::<()>().await;
	}
}

//! Main entry point for the orderdesk service.
//!
//! Serves the order form's backend: checkout session creation and order
//! recording, with backends chosen by the configuration file.

use clap::Parser;
use orderdesk_config::Config;
use std::path::PathBuf;
use std::sync::Arc;

mod factory_registry;
mod server;

/// Command-line arguments for the orderdesk service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "ORDERDESK_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started orderdesk");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let api_config = config.api.clone();
	let desk = Arc::new(factory_registry::build_desk_from_config(config)?);
	let cleanup = desk.spawn_cleanup();

	tokio::select! {
		result = server::start_server(api_config, Arc::clone(&desk)) => {
			tracing::info!("API server finished");
			cleanup.abort();
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Shutdown signal received");
			cleanup.abort();
		}
	}

	tracing::info!("Stopped orderdesk");
	Ok(())
}

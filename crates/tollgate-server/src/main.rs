// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Tollgate SSO broker binary.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tollgate_server::{create_app_state, create_router, jobs};
use tollgate_server_config::{LogFormat, LoggingConfig, ServerConfig};
use tollgate_server_provisioning::ProvisioningService;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tollgate - single sign-on broker issuing signed ticket cookies.
#[derive(Parser, Debug)]
#[command(name = "tollgate-server", about = "Tollgate SSO broker", version)]
struct Args {
	/// Configuration file (defaults to /etc/tollgate/server.toml)
	#[arg(long, short, env = "TOLLGATE_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Print a password hash for a static user entry
	HashPassword {
		/// Password to hash
		password: String,
	},
	/// Create placeholder Gerrit and Redmine accounts for a user
	PreRegister {
		/// Login of the user to create
		username: String,
	},
}

fn init_tracing(logging: &LoggingConfig) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));
	let registry = tracing_subscriber::registry().with(filter);

	match logging.format {
		LogFormat::Json => registry
			.with(tracing_subscriber::fmt::layer().json())
			.init(),
		LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
	}
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "failed to listen for shutdown signal");
		std::future::pending::<()>().await;
	}
	tracing::info!("received shutdown signal");
}

async fn pre_register(config: &ServerConfig, username: &str) -> Result<(), Box<dyn std::error::Error>> {
	let client = tollgate_common_http::client_with_timeout(Duration::from_secs(
		config.http.outbound_timeout_secs,
	))?;
	let service = ProvisioningService::from_config(
		config.gerrit.as_ref(),
		config.redmine.as_ref(),
		&config.session.cookie_domain,
		client,
	)?;
	if !service.is_enabled() {
		return Err("neither gerrit nor redmine is configured".into());
	}
	let report = service.pre_register(username).await;
	println!("{}", serde_json::to_string_pretty(&report)?);
	Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::HashPassword { password }) = &args.command {
		let hash = tollgate_server_auth::hash_password(password)?;
		println!("{hash}");
		return Ok(());
	}

	// Load .env file if present
	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => tollgate_server_config::load_config_with_file(path)?,
		None => tollgate_server_config::load_config()?,
	};

	init_tracing(&config.logging);

	if let Some(Command::PreRegister { username }) = &args.command {
		return pre_register(&config, username).await;
	}

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		"starting tollgate-server"
	);

	let state = create_app_state(&config)?;

	let cleanup = jobs::spawn_state_cleanup(
		state.oauth_state_store.clone(),
		Duration::from_secs(config.auth.oauth_state_cleanup_interval_secs),
	);

	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!("listening on {}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(shutdown_signal())
		.await?;

	cleanup.abort();
	tracing::info!("server shutdown complete");
	Ok(())
}

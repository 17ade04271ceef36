// SPDX-License-Identifier: GPL-3.0-only

//! hubview - browse IoT hubs, their devices and modules
//!
//! One-shot subcommands print a listing and exit; `watch` keeps the
//! selection-driven lists alive and prints them as they change.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;

mod app;
mod cli;
mod config;
mod logging;
mod prompt;
mod providers;
mod session;

use app::App;
use cli::{Cli, Command};
use config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(&config, cli.verbose);

    tracing::info!("Starting hubview v{}", env!("CARGO_PKG_VERSION"));

    let kind = cli.provider.unwrap_or(config.provider);
    let backend = providers::build(&config, kind)?;
    let retry = config.retry_policy();
    tracing::debug!(provider = backend.name, ?retry, "configuration loaded");

    let app = App::new(
        backend,
        retry,
        Duration::from_secs(cli.timeout_secs),
        cli.json,
    );

    let result = match cli.command {
        Command::Hubs => app.list_hubs().await,
        Command::Devices { hub } => app.list_devices(&hub).await,
        Command::Modules { hub, device } => app.list_modules(&hub, &device).await,
        Command::CreateDevice { hub, name } => app.create_device(&hub, &name).await,
        Command::DeleteDevice { hub, device, yes } => app.delete_device(&hub, &device, yes).await,
        Command::Monitor { hub, device, count } => app.monitor(&hub, &device, count).await,
        Command::Watch => session::run(&app).await,
    };

    app.shutdown();
    result
}

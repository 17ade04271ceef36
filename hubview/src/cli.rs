// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::ProviderKind;

#[derive(Debug, Parser)]
#[command(name = "hubview", version)]
#[command(about = "Browse IoT hubs, their devices and modules")]
pub struct Cli {
    /// Configuration file (default: $XDG_CONFIG_HOME/hubview/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured provider
    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderKind>,

    /// Print listings as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Give up waiting for a listing after this many seconds
    #[arg(long, global = true, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List hubs
    Hubs,
    /// List the devices of a hub
    Devices {
        #[arg(long)]
        hub: String,
    },
    /// List the modules of a device
    Modules {
        #[arg(long)]
        hub: String,
        #[arg(long)]
        device: String,
    },
    /// Create a device and print the refreshed device list
    CreateDevice {
        #[arg(long)]
        hub: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a device and print the refreshed device list
    DeleteDevice {
        #[arg(long)]
        hub: String,
        #[arg(long)]
        device: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Print the messages a device sends until Ctrl-C
    Monitor {
        #[arg(long)]
        hub: String,
        #[arg(long)]
        device: String,
        /// Stop after this many messages
        #[arg(long)]
        count: Option<usize>,
    },
    /// Interactive session driven by commands on stdin
    Watch,
}

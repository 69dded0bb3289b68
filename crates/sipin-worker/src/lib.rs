//! SIP-in Worker
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Consumes watchfolder deliveries and turns each one into a SIP.
//!
//! # Overview
//!
//! - **Configuration**: settings from file, environment and `.env`
//! - **Messages**: JSON watchfolder message decoding
//! - **Organization lookup**: GraphQL client resolving producer labels
//! - **Pool**: bounded concurrent runs on blocking threads
//! - **Delivery / Publisher**: transport seams for ack/nack and events

pub mod commands;
pub mod config;
pub mod delivery;
pub mod error;
pub mod message;
pub mod org_api;
pub mod pool;
pub mod publisher;

// Re-export commonly used types
pub use error::{Result, WorkerError};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Create BagIt SIPs from watchfolder deliveries
#[derive(Parser, Debug)]
#[command(name = "sipin-sip-creator")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file (TOML)
    #[arg(short, long, env = "SIPIN_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one watchfolder message
    Create {
        /// Message file (JSON)
        #[arg(short, long)]
        message: PathBuf,
    },

    /// Process every message in an inbox directory
    Drain {
        /// Directory of `*.json` messages
        #[arg(short, long)]
        inbox: PathBuf,
    },
}

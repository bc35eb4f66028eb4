//! CLI command definitions.

use clap::{Parser, Subcommand};
use peroot::Tier;
use std::path::PathBuf;

/// Peroot - prompt enhancement with ordered LLM fallback
#[derive(Parser, Debug)]
#[command(name = "peroot")]
#[command(about = "Prompt enhancement with ordered LLM fallback and per-caller quotas", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Read configuration from this file instead of the layered sources
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the backend catalog with availability under the current credentials
    Backends,

    /// Generate text through the fallback chain
    Generate {
        /// System instruction text
        #[arg(long)]
        system: String,

        /// User instruction text
        #[arg(long)]
        prompt: String,

        /// Sampling temperature
        #[arg(long)]
        temperature: Option<f32>,

        /// Caller identity charged against the quota
        #[arg(long, default_value = "anonymous")]
        caller: String,

        /// Subscription tier of the caller
        #[arg(long, default_value = "guest")]
        tier: Tier,
    },
}

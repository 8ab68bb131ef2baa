//! Command-line interface for flagd.

mod commands;

use clap::{Parser, Subcommand};

pub use commands::*;

/// flagd - feature flag service over HTTP and gRPC
#[derive(Parser)]
#[command(name = "flagd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search paths
    #[arg(long, global = true, env = "FLAGD_CONFIG", value_name = "PATH")]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP and gRPC servers (default)
    Serve,

    /// Create default config file
    Init {
        /// Where to write the config
        #[arg(long, default_value = "config.toml")]
        path: std::path::PathBuf,
    },

    /// Manage API tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },
}

#[derive(Subcommand)]
pub enum TokenCommands {
    /// Issue a new token and print its secret once
    Issue {
        /// Token label
        #[arg(long)]
        name: String,
        /// Principal recorded as the token's creator
        #[arg(long, default_value = "cli")]
        principal: String,
    },
    /// List issued tokens
    #[command(alias = "ls")]
    List,
    /// Revoke a token
    #[command(alias = "rm")]
    Revoke {
        /// Token ID
        id: String,
    },
}

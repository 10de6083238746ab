use clap::{Parser, Subcommand};
use observability::LogFormat;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "openindex")]
#[command(about = "OpenIndex - a multi-source index price engine")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Log output format (pretty, json, compact)
    #[arg(long, global = true, default_value = "pretty")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the engine with the given configuration
    Start {
        /// Path to the configuration file
        #[arg(short, long, default_value = "openindex.yaml")]
        config: PathBuf,

        /// Override the metrics port from the configuration
        #[arg(long)]
        metrics_port: Option<u16>,
    },

    /// Validate configuration without starting the engine
    Validate {
        /// Path to the configuration file
        #[arg(short, long, default_value = "openindex.yaml")]
        config: PathBuf,
    },

    /// Initialize a new configuration file with defaults
    Init {
        /// Output path for the new configuration file
        #[arg(short, long, default_value = "openindex.yaml")]
        output: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

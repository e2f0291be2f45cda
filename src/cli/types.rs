//! CLI type definitions
//!
//! Clap command structures defining the command line interface.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::domain::models::StoreBackend;

#[derive(Parser)]
#[command(name = "overlord")]
#[command(about = "Overlord - colony task prioritization and assignment engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .overlord/
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a scenario through the engine
    Simulate {
        /// Path to the scenario YAML file
        scenario: PathBuf,

        /// Number of cycles to run
        #[arg(short = 'n', long, default_value = "100")]
        cycles: u64,

        /// Override the configured zone store
        #[arg(short, long)]
        store: Option<StoreArg>,

        /// Only report cycles with a decision pass
        #[arg(long)]
        decisions_only: bool,
    },

    /// List the objective catalog
    Catalog,

    /// Show the stored state of a zone
    Inspect {
        /// Zone name, e.g. W1N1
        zone: String,
    },

    /// Clear every blockage of a zone, including permanent ones
    Reset {
        /// Zone name, e.g. W1N1
        zone: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreArg {
    Memory,
    Sqlite,
}

impl From<StoreArg> for StoreBackend {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => Self::Memory,
            StoreArg::Sqlite => Self::Sqlite,
        }
    }
}

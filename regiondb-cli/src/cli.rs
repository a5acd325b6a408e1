use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "regiondb", about = "Administrative boundary database builder", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output (also respects NO_COLOR env var)
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import a flat boundary table into the division database
    Import {
        /// Source database with the flat boundary table
        #[arg(long)]
        source: PathBuf,

        /// Division database to create or extend
        #[arg(long)]
        db: PathBuf,

        /// Import structure only, without leaf geometries
        #[arg(long)]
        no_geometry: bool,

        /// Skip the single-child collapse pass
        #[arg(long)]
        no_collapse: bool,
    },

    /// Compute missing aggregate geometries bottom-up
    Aggregate {
        /// Division database
        #[arg(long)]
        db: PathBuf,

        /// Worker threads per depth level
        #[arg(long, default_value_t = 8)]
        workers: usize,
    },

    /// Print database statistics as JSON
    Stats {
        /// Division database
        #[arg(long)]
        db: PathBuf,
    },
}

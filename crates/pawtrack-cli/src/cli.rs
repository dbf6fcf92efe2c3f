use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pawtrack")]
#[command(author, version, about = "Detect pets and likely breeds in a photo")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decide whether the photo shows a pet and rank the top breeds
    Detect {
        /// Image file (JPEG, PNG or WebP)
        image: PathBuf,

        #[command(flatten)]
        opts: RunArgs,
    },

    /// List likely breeds without applying the detection threshold
    Breeds {
        /// Image file (JPEG, PNG or WebP)
        image: PathBuf,

        #[command(flatten)]
        opts: RunArgs,
    },
}

impl Commands {
    pub fn opts(&self) -> &RunArgs {
        match self {
            Commands::Detect { opts, .. } | Commands::Breeds { opts, .. } => opts,
        }
    }
}

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Detector config file (YAML)
    #[arg(short, long, env = "PAWTRACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Route model downloads through the relay at this base URL
    #[arg(short, long, env = "PAWTRACK_RELAY")]
    pub relay: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

//! metarepo - signed metapackage repository builder.
//!
//! Entry point for the command-line application.

use anyhow::Result;
use clap::{Parser, Subcommand};

use metarepo::commands;
use metarepo::config::Config;

#[derive(Parser)]
#[command(name = "metarepo")]
#[command(about = "Builds signed metapackage repositories for Ubuntu and Arch Linux")]
#[command(
    after_help = "QUICK START:\n  metarepo deps   List host packages needed for building\n  metarepo build  Build the signed repository under output/\n  metarepo sync   Mirror output/ to a remote host"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the full repository for the running distribution
    Build {
        /// Retain the transient work directory on failure for inspection
        #[arg(long)]
        keep_workdir: bool,
    },

    /// Print required host packages, one per line (for provisioning)
    Deps,

    /// Mirror the built repository to an rsync destination
    Sync {
        /// rsync destination (e.g. user@host:/srv/www/repo)
        destination: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env if present
    dotenvy::dotenv().ok();
    let base_dir = std::env::current_dir()?;
    let config = Config::load(&base_dir);

    match cli.command {
        Commands::Build { keep_workdir } => commands::cmd_build(&config, keep_workdir),
        Commands::Deps => commands::cmd_deps(&config),
        Commands::Sync { destination } => commands::cmd_sync(&config, &destination),
    }
}

//! Sync command - publish the built repository.
//!
//! Mirrors the output tree to a remote host (or another local path) with
//! rsync, streaming progress to the terminal.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::process::{self, Cmd};

/// Execute the sync command.
pub fn cmd_sync(config: &Config, destination: &str) -> Result<()> {
    if !config.output_dir.is_dir() {
        bail!(
            "No repository at {}. Run 'metarepo build' first.",
            config.output_dir.display()
        );
    }
    if process::lookup("rsync").is_none() {
        bail!("rsync not found on PATH; install it to publish the repository");
    }

    println!("=== Publishing repository to {} ===\n", destination);

    // Trailing slash: sync the tree's contents, not the directory itself.
    Cmd::new("rsync")
        .args(["--archive", "--delete", "--compress", "--verbose"])
        .arg(format!("{}/", config.output_dir.display()))
        .arg(destination)
        .error_msg("rsync failed")
        .run_interactive()?;

    println!("\nPublished.");
    Ok(())
}

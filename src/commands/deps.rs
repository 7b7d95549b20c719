//! Deps command - list required host packages.
//!
//! Prints the packages the detected distribution's build path needs, one
//! per line, so provisioning scripts can install them before `build` runs.

use anyhow::Result;

use crate::backend;
use crate::config::Config;
use crate::distro::Distro;

/// Execute the deps command.
pub fn cmd_deps(config: &Config) -> Result<()> {
    let distro = Distro::detect(&config.os_release)?;
    for package in backend::required_packages_for(distro) {
        println!("{}", package);
    }
    Ok(())
}

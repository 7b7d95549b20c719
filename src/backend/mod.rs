//! Repository backends.
//!
//! One backend per supported distribution family. A backend knows how to
//! query the host's package database, build a rendered recipe into an
//! installable artifact with the family's native tooling, and ingest the
//! artifact into the signed on-disk repository index.

mod arch;
mod debian;

pub use arch::ArchBackend;
pub use debian::DebianBackend;

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::distro::Distro;
use crate::signing::Keyring;

/// Common contract of the Debian-family and Arch-family backends.
pub trait RepoBackend {
    /// Distribution family id; also the repository subdirectory name.
    fn distro_name(&self) -> &'static str;

    /// Host packages that must be installed before a build can start.
    fn required_packages(&self) -> &'static [&'static str];

    /// Package names currently installed on the host, from the native
    /// package query tool.
    fn installed_packages(&self) -> Result<HashSet<String>>;

    /// Required host packages that are not installed, sorted. Non-empty
    /// means the orchestrator must abort before any build step.
    fn missing_packages(&self) -> Result<Vec<String>> {
        let installed = self.installed_packages()?;
        let mut missing: Vec<String> = self
            .required_packages()
            .iter()
            .filter(|pkg| !installed.contains(**pkg))
            .map(|pkg| pkg.to_string())
            .collect();
        missing.sort();
        Ok(missing)
    }

    /// The repository directory this backend writes.
    fn repo_dir(&self) -> &Path;

    /// Discard any previous repository for this family and recreate the
    /// output and transient build directories from scratch.
    fn setup(&self) -> Result<()>;

    /// Build every rendered recipe into a package artifact and ingest it
    /// into the signed repository index. Aborts on the first tool failure.
    fn build_and_import(&self, recipes: &[PathBuf], keyring: &Keyring) -> Result<()>;
}

/// Instantiate the backend matching the detected distribution.
pub fn for_distro(distro: Distro, config: &Config, workdir: &Path) -> Box<dyn RepoBackend> {
    match distro {
        Distro::Ubuntu => Box::new(DebianBackend::new(config, workdir)),
        Distro::Arch => Box::new(ArchBackend::new(config, workdir)),
    }
}

/// Host packages a family's backend requires, without instantiating one
/// (the `deps` command needs the list before any build state exists).
pub fn required_packages_for(distro: Distro) -> &'static [&'static str] {
    match distro {
        Distro::Ubuntu => debian::REQUIRED_PACKAGES,
        Distro::Arch => arch::REQUIRED_PACKAGES,
    }
}

/// Files directly inside a directory, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read build directory {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .collect();
    files.sort();
    Ok(files)
}

/// Parse the one-package-per-line output of a package query tool.
fn parse_package_lines(stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

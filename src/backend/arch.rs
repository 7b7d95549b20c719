//! Arch-family repository backend.
//!
//! Builds each rendered PKGBUILD with `makepkg` in a staging directory
//! (makepkg insists on the canonical filename), copies the signed package
//! archives into the repository, and regenerates the signed database with
//! `repo-add`. The database is regenerated once per build over every
//! imported artifact rather than once per artifact.

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::fsutil;
use crate::process::Cmd;
use crate::signing::Keyring;

use super::{list_files, parse_package_lines, RepoBackend};

/// Host packages the Arch build path shells out to. makepkg and repo-add
/// ship with pacman itself.
pub(crate) const REQUIRED_PACKAGES: &[&str] = &["fakeroot", "gnupg", "pacman"];

pub struct ArchBackend {
    repo_dir: PathBuf,
    build_dir: PathBuf,
    db_name: String,
}

impl ArchBackend {
    pub fn new(config: &Config, workdir: &Path) -> Self {
        Self {
            repo_dir: config.output_dir.join("arch"),
            build_dir: workdir.join("makepkg"),
            db_name: format!("{}.db.tar.gz", config.repo_name),
        }
    }

    /// Move a built package archive and its detached signature into the
    /// repository, returning the archive's new path.
    fn import_package(&self, package: &Path) -> Result<PathBuf> {
        let file_name = package
            .file_name()
            .context("package archive has no file name")?;
        let dest = self.repo_dir.join(file_name);
        fs::copy(package, &dest)
            .with_context(|| format!("Failed to copy {} into repository", package.display()))?;

        let sig = signature_path(package);
        if !sig.is_file() {
            bail!(
                "makepkg produced no signature for {} (expected {})",
                package.display(),
                sig.display()
            );
        }
        fs::copy(&sig, self.repo_dir.join(sig.file_name().unwrap_or_default()))
            .with_context(|| format!("Failed to copy {} into repository", sig.display()))?;

        Ok(dest)
    }
}

impl RepoBackend for ArchBackend {
    fn distro_name(&self) -> &'static str {
        "arch"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        REQUIRED_PACKAGES
    }

    fn installed_packages(&self) -> Result<HashSet<String>> {
        let result = Cmd::new("pacman")
            .args(["-Qq"])
            .error_msg("Querying installed packages with pacman failed")
            .run()?;
        Ok(parse_package_lines(&result.stdout))
    }

    fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn setup(&self) -> Result<()> {
        fsutil::prepare_fresh_dir(&self.repo_dir)?;
        fsutil::prepare_fresh_dir(&self.build_dir)?;
        Ok(())
    }

    fn build_and_import(&self, recipes: &[PathBuf], keyring: &Keyring) -> Result<()> {
        let mut imported = Vec::new();

        for recipe in recipes {
            let stem = recipe
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| recipe.display().to_string());

            let staged = self.build_dir.join("PKGBUILD");
            fs::copy(recipe, &staged).with_context(|| {
                format!("Failed to stage {} as PKGBUILD", recipe.display())
            })?;

            println!("  {}: building metapackage", stem);
            let build_result = Cmd::new("makepkg")
                .args(["--force", "--nodeps", "--sign"])
                .dir(&self.build_dir)
                .env_keyring(keyring.home())
                .error_msg(format!("makepkg failed for {}", stem))
                .run();

            // The staged recipe never outlives its build, pass or fail.
            let _ = fs::remove_file(&staged);
            build_result?;

            let packages: Vec<PathBuf> = list_files(&self.build_dir)?
                .into_iter()
                .filter(|p| is_package_archive(p))
                .collect();
            if packages.is_empty() {
                bail!("makepkg produced no package archive for {}", stem);
            }

            for package in packages {
                println!(
                    "  {}: importing {}",
                    stem,
                    package.file_name().unwrap_or_default().to_string_lossy()
                );
                imported.push(self.import_package(&package)?);
                // Clear the staging area so the next recipe's artifact
                // discovery starts clean.
                fs::remove_file(&package)?;
                let _ = fs::remove_file(signature_path(&package));
            }
        }

        // One signed database regeneration over the whole batch.
        println!("  Regenerating repository database {}", self.db_name);
        let mut cmd = Cmd::new("repo-add")
            .arg("--sign")
            .arg_path(&self.repo_dir.join(&self.db_name));
        for package in &imported {
            cmd = cmd.arg_path(package);
        }
        cmd.env_keyring(keyring.home())
            .error_msg("repo-add failed")
            .run()?;

        Ok(())
    }
}

/// A makepkg output archive (any compression), excluding signatures.
fn is_package_archive(path: &Path) -> bool {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return false,
    };
    name.contains(".pkg.tar") && !name.ends_with(".sig")
}

/// Detached signature path makepkg writes next to an archive.
fn signature_path(package: &Path) -> PathBuf {
    let mut sig = package.as_os_str().to_owned();
    sig.push(".sig");
    PathBuf::from(sig)
}

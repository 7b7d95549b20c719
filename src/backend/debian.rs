//! Debian-family repository backend (Ubuntu).
//!
//! Builds each rendered equivs control file into a metapackage with
//! `equivs-build --full`, then feeds the binary and source artifacts into
//! a persistent reprepro index. The reprepro configuration directory
//! (release tracks, architectures, SignWith) ships with the project.

use anyhow::{bail, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::fsutil;
use crate::process::Cmd;
use crate::signing::Keyring;

use super::{list_files, parse_package_lines, RepoBackend};

/// Host packages the Debian build path shells out to.
pub(crate) const REQUIRED_PACKAGES: &[&str] = &["equivs", "gnupg", "reprepro"];

/// The single release track all metapackages are published under.
const RELEASE_TRACK: &str = "stable";

pub struct DebianBackend {
    repo_dir: PathBuf,
    conf_dir: PathBuf,
    build_dir: PathBuf,
}

impl DebianBackend {
    pub fn new(config: &Config, workdir: &Path) -> Self {
        Self {
            repo_dir: config.output_dir.join("ubuntu"),
            conf_dir: config.reprepro_conf_dir.clone(),
            build_dir: workdir.join("equivs"),
        }
    }

    /// Ingest one artifact into the index. `mode` is the reprepro command
    /// (`includedeb` for binary metadata, `includedsc` for source).
    fn import_artifact(&self, mode: &str, artifact: &Path, keyring: &Keyring) -> Result<()> {
        Cmd::new("reprepro")
            .arg("--basedir")
            .arg_path(&self.repo_dir)
            .arg("--confdir")
            .arg_path(&self.conf_dir)
            .args([mode, RELEASE_TRACK])
            .arg_path(artifact)
            .env_keyring(keyring.home())
            .error_msg(format!(
                "reprepro {} failed for {}",
                mode,
                artifact.display()
            ))
            .run()?;
        Ok(())
    }
}

impl RepoBackend for DebianBackend {
    fn distro_name(&self) -> &'static str {
        "ubuntu"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        REQUIRED_PACKAGES
    }

    fn installed_packages(&self) -> Result<HashSet<String>> {
        let result = Cmd::new("dpkg-query")
            .args(["-W", "-f", "${Package}\n"])
            .error_msg("Querying installed packages with dpkg-query failed")
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
        if !self.conf_dir.join("distributions").exists() {
            bail!(
                "reprepro configuration not found at {}/distributions",
                self.conf_dir.display()
            );
        }

        for recipe in recipes {
            let stem = recipe
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| recipe.display().to_string());

            // Each recipe builds in its own transient directory so artifact
            // discovery never picks up a previous package's files.
            let pkg_dir = fsutil::prepare_work_dir(&self.build_dir, &stem)?;

            println!("  {}: building metapackage", stem);
            Cmd::new("equivs-build")
                .arg("--full")
                .arg_path(recipe)
                .dir(&pkg_dir)
                .env_keyring(keyring.home())
                .error_msg(format!("equivs-build failed for {}", stem))
                .run()?;

            let artifacts = list_files(&pkg_dir)?;
            let debs: Vec<&PathBuf> = artifacts
                .iter()
                .filter(|p| p.extension().map(|e| e == "deb").unwrap_or(false))
                .collect();
            let dscs: Vec<&PathBuf> = artifacts
                .iter()
                .filter(|p| p.extension().map(|e| e == "dsc").unwrap_or(false))
                .collect();

            if debs.is_empty() {
                bail!("equivs-build produced no .deb for {}", stem);
            }

            for deb in debs {
                println!(
                    "  {}: importing {}",
                    stem,
                    deb.file_name().unwrap_or_default().to_string_lossy()
                );
                self.import_artifact("includedeb", deb, keyring)?;
            }
            for dsc in dscs {
                self.import_artifact("includedsc", dsc, keyring)?;
            }
        }

        Ok(())
    }
}

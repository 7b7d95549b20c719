//! Configuration management.
//!
//! All fixed paths the build reads or writes hang off one base directory
//! (normally the project root the tool is invoked from) so tests can
//! inject temporary roots. Environment variables override the defaults;
//! a `.env` file is honored via the entry point.

use std::env;
use std::path::{Path, PathBuf};

/// Resolved build configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Project root; all relative paths resolve against this.
    pub base_dir: PathBuf,
    /// Directory of declarative metapackage definitions (one TOML each).
    pub packages_dir: PathBuf,
    /// Directory of per-distribution recipe templates.
    pub templates_dir: PathBuf,
    /// Static files copied verbatim into the repository.
    pub static_dir: PathBuf,
    /// reprepro configuration directory (Debian family only).
    pub reprepro_conf_dir: PathBuf,
    /// Repository output root; one subdirectory per distribution family.
    pub output_dir: PathBuf,
    /// Private signing key imported into the ephemeral keyring.
    pub key_file: PathBuf,
    /// System identification file used for distribution detection.
    pub os_release: PathBuf,
    /// Repository name (Arch database filename, reprepro origin).
    pub repo_name: String,
}

impl Config {
    /// Build configuration for a base directory, applying environment
    /// overrides.
    pub fn load(base_dir: &Path) -> Self {
        let resolve = |var: &str, default: &str| -> PathBuf {
            match env::var(var) {
                Ok(value) if !value.is_empty() => {
                    let path = PathBuf::from(value);
                    if path.is_absolute() {
                        path
                    } else {
                        base_dir.join(path)
                    }
                }
                _ => base_dir.join(default),
            }
        };

        let os_release = match env::var("METAREPO_OS_RELEASE") {
            Ok(value) if !value.is_empty() => PathBuf::from(value),
            _ => PathBuf::from("/etc/os-release"),
        };

        let repo_name = env::var("METAREPO_REPO_NAME")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "devkit".to_string());

        Self {
            base_dir: base_dir.to_path_buf(),
            packages_dir: base_dir.join("packages"),
            templates_dir: base_dir.join("templates"),
            static_dir: base_dir.join("static"),
            reprepro_conf_dir: base_dir.join("config/reprepro"),
            output_dir: resolve("METAREPO_OUTPUT_DIR", "output"),
            key_file: resolve("METAREPO_KEY_FILE", "keys/private.asc"),
            os_release,
            repo_name,
        }
    }
}

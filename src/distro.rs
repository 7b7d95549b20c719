//! Target distribution detection and per-family constants.
//!
//! Exactly two distribution families are supported: Ubuntu (Debian
//! packaging) and Arch. The running distribution is read from the host's
//! os-release file; anything else is a fatal error.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    Ubuntu,
    Arch,
}

impl Distro {
    /// The os-release `ID` value and the key used in per-distro dependency
    /// mappings.
    pub fn id(&self) -> &'static str {
        match self {
            Distro::Ubuntu => "ubuntu",
            Distro::Arch => "arch",
        }
    }

    /// Separator used when joining a normalized dependency list into the
    /// recipe's `dependencies` slot (Debian control files are
    /// comma-separated, PKGBUILD depends arrays are space-separated).
    pub fn dependency_separator(&self) -> &'static str {
        match self {
            Distro::Ubuntu => ", ",
            Distro::Arch => " ",
        }
    }

    /// Recipe template filename under the templates directory.
    pub fn template_name(&self) -> &'static str {
        match self {
            Distro::Ubuntu => "ubuntu.control",
            Distro::Arch => "arch.PKGBUILD",
        }
    }

    /// Filename extension for rendered recipes in the work directory.
    pub fn recipe_extension(&self) -> &'static str {
        match self {
            Distro::Ubuntu => "control",
            Distro::Arch => "PKGBUILD",
        }
    }

    /// Resolve an os-release `ID` value.
    pub fn from_id(id: &str) -> Result<Self> {
        match id {
            "ubuntu" => Ok(Distro::Ubuntu),
            "arch" => Ok(Distro::Arch),
            other => bail!(
                "Unsupported distribution '{}'. Supported: ubuntu, arch.",
                other
            ),
        }
    }

    /// Detect the running distribution from an os-release file
    /// (normally /etc/os-release).
    pub fn detect(os_release: &Path) -> Result<Self> {
        let content = fs::read_to_string(os_release).with_context(|| {
            format!("Failed to read os-release file at {}", os_release.display())
        })?;

        let id = parse_os_release_id(&content).with_context(|| {
            format!("No ID= entry in os-release file at {}", os_release.display())
        })?;

        Self::from_id(&id)
    }
}

impl std::fmt::Display for Distro {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Extract the `ID` value from os-release content. Values may be quoted.
fn parse_os_release_id(content: &str) -> Option<String> {
    for line in content.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ID=") {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

//! Declarative metapackage definitions.
//!
//! Each metapackage is described by one TOML file in the packages
//! directory. A dependency entry is either a plain package name (valid on
//! every distribution) or a table mapping distribution ids to the
//! distro-specific name. Entries with no mapping for the target
//! distribution are silently omitted there.
//!
//! ```toml
//! name = "devkit-core"
//! version = "1.2.0"
//! description = "Core development tools"
//!
//! dependencies = [
//!     "git",
//!     { ubuntu = "build-essential", arch = "base-devel" },
//! ]
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::distro::Distro;

/// One dependency entry of a package definition.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Dependency {
    /// Same package name on every distribution.
    Common(String),
    /// Distribution id -> distro-specific package name.
    PerDistro(BTreeMap<String, String>),
}

/// A metapackage definition, loaded from one TOML file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageDef {
    pub name: String,
    pub version: String,
    pub description: String,
    pub dependencies: Vec<Dependency>,
}

impl PackageDef {
    /// Parse a definition from TOML text.
    pub fn parse(text: &str) -> Result<Self> {
        let def: PackageDef = toml::from_str(text)?;
        if def.name.is_empty() {
            bail!("package definition has an empty name");
        }
        Ok(def)
    }

    /// Load a definition from a file, with the path in any error.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read package definition {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("Malformed package definition {}", path.display()))
    }

    /// Resolve the dependency list for one distribution: plain entries
    /// verbatim, mapped entries through their per-distro name, entries
    /// without a mapping dropped. Sorted for deterministic recipes.
    pub fn dependencies_for(&self, distro: Distro) -> Vec<String> {
        let mut deps: Vec<String> = self
            .dependencies
            .iter()
            .filter_map(|dep| match dep {
                Dependency::Common(name) => Some(name.clone()),
                Dependency::PerDistro(map) => map.get(distro.id()).cloned(),
            })
            .collect();
        deps.sort();
        deps
    }

    /// The resolved dependency list joined with the distribution's list
    /// syntax, ready for the template's `{{dependencies}}` slot.
    pub fn dependency_string(&self, distro: Distro) -> String {
        self.dependencies_for(distro)
            .join(distro.dependency_separator())
    }
}

/// Load every package definition in a directory, sorted by file name so
/// builds process metapackages in a stable order.
pub fn load_all(dir: &Path) -> Result<Vec<PackageDef>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read packages directory {}", dir.display()))?;

    let mut paths: Vec<_> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|e| e == "toml").unwrap_or(false))
        .collect();
    paths.sort();

    if paths.is_empty() {
        bail!("No package definitions (*.toml) found in {}", dir.display());
    }

    paths.iter().map(|p| PackageDef::load(p)).collect()
}

//! Build command - the end-to-end repository build.
//!
//! Linear orchestration: detect the distribution, import the signing key,
//! preflight the host, recreate the output directory, render every
//! metapackage definition into a distro-native recipe, build and import
//! them all, and stage the public key and static files. Any failure aborts
//! the whole build; there is no partial success.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::backend::{self, RepoBackend};
use crate::config::Config;
use crate::distro::Distro;
use crate::fsutil;
use crate::manifest;
use crate::signing::Keyring;
use crate::template::Template;

/// Execute the build command.
pub fn cmd_build(config: &Config, keep_workdir: bool) -> Result<()> {
    println!("=== Metapackage Repository Build ===\n");

    let distro = Distro::detect(&config.os_release)?;
    println!("Target distribution: {}", distro);

    let workdir = tempfile::Builder::new()
        .prefix("metarepo-")
        .tempdir()
        .context("Failed to create build work directory")?;

    let backend = backend::for_distro(distro, config, workdir.path());
    let result = run_steps(config, distro, backend.as_ref(), workdir.path());

    // The work directory (keyring included) is always discarded on
    // success; on failure it can be retained for post-mortem inspection.
    if result.is_err() && keep_workdir {
        let retained = workdir.keep();
        eprintln!("Work directory retained at {}", retained.display());
    }

    result
}

/// The orchestration steps after distribution detection and backend
/// selection. Split out so tests can drive it with an injected backend.
pub fn run_steps(
    config: &Config,
    distro: Distro,
    backend: &dyn RepoBackend,
    workdir: &Path,
) -> Result<()> {
    println!("\nImporting signing key...");
    let keyring = Keyring::import(workdir, &config.key_file)?;
    println!("  Key {}", keyring.fingerprint());

    let missing = backend.missing_packages()?;
    if !missing.is_empty() {
        bail!(
            "Missing required host packages: {}. Run 'metarepo deps' to list them for provisioning.",
            missing.join(", ")
        );
    }

    println!("\nPreparing output directory...");
    backend.setup()?;
    println!("  {}", backend.repo_dir().display());

    println!("\nRendering recipes...");
    let recipes = render_recipes(config, distro, workdir)?;

    println!("\nBuilding and importing metapackages...");
    backend.build_and_import(&recipes, &keyring)?;

    println!("\nStaging repository files...");
    let pubkey = backend.repo_dir().join(format!("{}.asc", config.repo_name));
    keyring.export_public_key(&pubkey)?;
    println!("  Exported public key {}", pubkey.display());

    let copied = fsutil::copy_tree(&config.static_dir, backend.repo_dir())?;
    if copied > 0 {
        println!("  Copied {} static file(s)", copied);
    }

    println!("\nRepository ready at {}", backend.repo_dir().display());
    Ok(())
}

/// Normalize and render every package definition into the work directory.
/// Returns the rendered recipe paths in definition order.
pub fn render_recipes(config: &Config, distro: Distro, workdir: &Path) -> Result<Vec<PathBuf>> {
    let template_path = config.templates_dir.join(distro.template_name());
    let template = Template::load(&template_path)?;
    let defs = manifest::load_all(&config.packages_dir)?;

    let recipes_dir = fsutil::prepare_work_dir(workdir, "recipes")?;
    let mut rendered = Vec::new();

    for def in &defs {
        let mut context = BTreeMap::new();
        context.insert("name", def.name.clone());
        context.insert("version", def.version.clone());
        context.insert("description", def.description.clone());
        context.insert("dependencies", def.dependency_string(distro));

        let text = template.render(&context)?;
        let path = recipes_dir.join(format!("{}.{}", def.name, distro.recipe_extension()));
        fs::write(&path, &text)
            .with_context(|| format!("Failed to write rendered recipe {}", path.display()))?;

        println!("  {} ({} dependencies)", def.name, def.dependencies_for(distro).len());
        rendered.push(path);
    }

    Ok(rendered)
}

//! Integration tests for the build orchestration.
//!
//! External packaging tools are not assumed present: the signing tool is
//! stubbed on PATH where a scenario must advance past key import, and the
//! repository backend is replaced with a recording mock. Real
//! equivs/reprepro/makepkg runs are exercised manually, not here.

mod helpers;

use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serial_test::serial;

use helpers::{install_stub_gpg, TestEnv};
use metarepo::backend::{self, RepoBackend};
use metarepo::commands::build::{render_recipes, run_steps};
use metarepo::distro::Distro;
use metarepo::signing::Keyring;

// =============================================================================
// Recipe rendering
// =============================================================================

#[test]
fn test_render_recipes_ubuntu() {
    let env = TestEnv::new();
    let config = env.config();

    let recipes = render_recipes(&config, Distro::Ubuntu, &env.workdir).unwrap();

    assert_eq!(recipes.len(), 1);
    assert!(recipes[0].ends_with("recipes/devkit-core.control"));

    let content = fs::read_to_string(&recipes[0]).unwrap();
    assert!(content.contains("Package: devkit-core"));
    assert!(content.contains("Depends: build-essential, curl, git"));
}

#[test]
fn test_render_recipes_arch() {
    let env = TestEnv::new();
    let config = env.config();

    let recipes = render_recipes(&config, Distro::Arch, &env.workdir).unwrap();

    assert_eq!(recipes.len(), 1);
    assert!(recipes[0].ends_with("recipes/devkit-core.PKGBUILD"));

    let content = fs::read_to_string(&recipes[0]).unwrap();
    let depends = Regex::new(r"(?m)^depends=\(base-devel curl git\)$").unwrap();
    assert!(depends.is_match(&content), "unexpected depends in:\n{}", content);
    // Shell function braces must survive rendering.
    assert!(content.contains("package() {"));
}

#[test]
fn test_render_recipes_is_deterministic() {
    let env = TestEnv::new();
    let config = env.config();

    let first = render_recipes(&config, Distro::Arch, &env.workdir).unwrap();
    let first_content = fs::read_to_string(&first[0]).unwrap();

    let second = render_recipes(&config, Distro::Arch, &env.workdir).unwrap();
    let second_content = fs::read_to_string(&second[0]).unwrap();

    assert_eq!(first_content, second_content);
}

#[test]
fn test_render_fails_on_unknown_template_field() {
    let env = TestEnv::new();
    let config = env.config();
    fs::write(
        env.base_dir.join("templates/arch.PKGBUILD"),
        "pkgname={{name}}\nchecksum={{sha256}}\n",
    )
    .unwrap();

    let err = render_recipes(&config, Distro::Arch, &env.workdir).unwrap_err();
    assert!(err.to_string().contains("unknown field 'sha256'"));
}

// =============================================================================
// Orchestration against a mock backend
// =============================================================================

/// Backend double that records the orchestrator's calls.
struct MockBackend {
    repo_dir: PathBuf,
    installed: Vec<&'static str>,
    fail_build: bool,
    calls: RefCell<Vec<String>>,
}

impl MockBackend {
    fn new(repo_dir: PathBuf) -> Self {
        Self {
            repo_dir,
            installed: vec!["equivs", "gnupg", "reprepro"],
            fail_build: false,
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl RepoBackend for MockBackend {
    fn distro_name(&self) -> &'static str {
        "mock"
    }

    fn required_packages(&self) -> &'static [&'static str] {
        &["equivs", "gnupg", "reprepro"]
    }

    fn installed_packages(&self) -> anyhow::Result<HashSet<String>> {
        Ok(self.installed.iter().map(|s| s.to_string()).collect())
    }

    fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn setup(&self) -> anyhow::Result<()> {
        self.calls.borrow_mut().push("setup".to_string());
        fs::create_dir_all(&self.repo_dir)?;
        Ok(())
    }

    fn build_and_import(&self, recipes: &[PathBuf], _keyring: &Keyring) -> anyhow::Result<()> {
        self.calls
            .borrow_mut()
            .push(format!("build_and_import:{}", recipes.len()));
        if self.fail_build {
            anyhow::bail!("repo-add failed (exit code 1)");
        }
        Ok(())
    }
}

#[test]
#[serial]
fn test_missing_host_packages_abort_before_output() {
    let env = TestEnv::new();
    let config = env.config();
    install_stub_gpg(&env.base_dir.join("stub-bin"));

    let mut backend = MockBackend::new(config.output_dir.join("arch"));
    backend.installed = vec!["gnupg"];

    let err = run_steps(&config, Distro::Arch, &backend, &env.workdir).unwrap_err();

    assert!(err.to_string().contains("equivs"));
    assert!(err.to_string().contains("reprepro"));
    // Preflight failed, so nothing may have touched the output directory.
    assert!(!config.output_dir.exists());
    assert!(backend.calls.borrow().is_empty());
}

#[test]
#[serial]
fn test_full_orchestration_order_and_staging() {
    let env = TestEnv::new();
    let config = env.config();
    install_stub_gpg(&env.base_dir.join("stub-bin"));

    let backend = MockBackend::new(config.output_dir.join("arch"));
    run_steps(&config, Distro::Arch, &backend, &env.workdir).unwrap();

    // setup must precede build_and_import, which saw exactly one recipe.
    assert_eq!(
        *backend.calls.borrow(),
        vec!["setup".to_string(), "build_and_import:1".to_string()]
    );

    // The public key and static files land in the repository.
    let pubkey = fs::read_to_string(backend.repo_dir().join("devkit.asc")).unwrap();
    assert!(pubkey.contains("BEGIN PGP PUBLIC KEY BLOCK"));
    assert!(backend.repo_dir().join("index.html").is_file());
}

#[test]
#[serial]
fn test_failing_build_step_fails_the_run() {
    let env = TestEnv::new();
    let config = env.config();
    install_stub_gpg(&env.base_dir.join("stub-bin"));

    let mut backend = MockBackend::new(config.output_dir.join("arch"));
    backend.fail_build = true;

    let err = run_steps(&config, Distro::Arch, &backend, &env.workdir).unwrap_err();

    assert!(err.to_string().contains("repo-add failed"));
    // Only setup's empty directory may exist; the failure added nothing.
    assert_eq!(fs::read_dir(backend.repo_dir()).unwrap().count(), 0);
}

#[test]
#[serial]
fn test_keyring_is_scoped_to_workdir() {
    let env = TestEnv::new();
    let config = env.config();
    install_stub_gpg(&env.base_dir.join("stub-bin"));

    let keyring = Keyring::import(&env.workdir, &config.key_file).unwrap();

    assert_eq!(keyring.home(), env.workdir.join("gnupg"));
    assert_eq!(
        keyring.fingerprint(),
        "0123456789ABCDEF0123456789ABCDEF01234567"
    );
}

// =============================================================================
// Host package sets
// =============================================================================

#[test]
fn test_required_packages_per_family() {
    let ubuntu = backend::required_packages_for(Distro::Ubuntu);
    assert!(ubuntu.contains(&"equivs"));
    assert!(ubuntu.contains(&"reprepro"));

    let arch = backend::required_packages_for(Distro::Arch);
    assert!(arch.contains(&"pacman"));
    assert!(arch.contains(&"fakeroot"));

    // Both build paths sign.
    assert!(ubuntu.contains(&"gnupg"));
    assert!(arch.contains(&"gnupg"));
}

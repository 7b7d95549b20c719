//! Shared test utilities for metarepo tests.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use metarepo::config::Config;

/// Test environment with a populated project tree under a temp directory.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Simulated project root
    pub base_dir: PathBuf,
    /// Per-test work directory (stands in for the build TempDir)
    pub workdir: PathBuf,
}

impl TestEnv {
    /// Create a project tree with one package definition, both recipe
    /// templates, a static file, a key file, and an os-release file.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let base_dir = temp_dir.path().join("project");
        let workdir = temp_dir.path().join("workdir");

        for sub in ["packages", "templates", "static", "keys", "config/reprepro"] {
            fs::create_dir_all(base_dir.join(sub)).unwrap();
        }
        fs::create_dir_all(&workdir).unwrap();

        // The canonical mixed definition: plain entries plus a mapping.
        fs::write(
            base_dir.join("packages/devkit-core.toml"),
            r#"
name = "devkit-core"
version = "1.0.0"
description = "Core tools"

dependencies = [
    "git",
    { ubuntu = "build-essential", arch = "base-devel" },
    "curl",
]
"#,
        )
        .unwrap();

        fs::write(
            base_dir.join("templates/ubuntu.control"),
            "Package: {{name}}\nVersion: {{version}}\nDepends: {{dependencies}}\nDescription: {{description}}\n",
        )
        .unwrap();
        fs::write(
            base_dir.join("templates/arch.PKGBUILD"),
            "pkgname={{name}}\npkgver={{version}}\npkgdesc=\"{{description}}\"\ndepends=({{dependencies}})\npackage() {\n  :\n}\n",
        )
        .unwrap();

        fs::write(base_dir.join("static/index.html"), "<html></html>").unwrap();
        fs::write(base_dir.join("keys/private.asc"), "-----BEGIN PGP TEST KEY-----\n").unwrap();
        fs::write(base_dir.join("os-release"), "ID=arch\n").unwrap();

        Self {
            _temp_dir: temp_dir,
            base_dir,
            workdir,
        }
    }

    /// Configuration rooted at the test project tree.
    pub fn config(&self) -> Config {
        Config {
            base_dir: self.base_dir.clone(),
            packages_dir: self.base_dir.join("packages"),
            templates_dir: self.base_dir.join("templates"),
            static_dir: self.base_dir.join("static"),
            reprepro_conf_dir: self.base_dir.join("config/reprepro"),
            output_dir: self.base_dir.join("output"),
            key_file: self.base_dir.join("keys/private.asc"),
            os_release: self.base_dir.join("os-release"),
            repo_name: "devkit".to_string(),
        }
    }
}

/// Install a stub `gpg` into a directory and prepend it to PATH so
/// orchestration tests can advance past key import without a real GPG.
///
/// The stub accepts --import, answers --list-secret-keys with a fixed
/// fingerprint record, and prints an armored block for --export.
pub fn install_stub_gpg(bin_dir: &Path) {
    fs::create_dir_all(bin_dir).unwrap();
    let script = r#"#!/bin/sh
for arg in "$@"; do
    case "$arg" in
        --list-secret-keys)
            echo 'sec:u:4096:1:AABBCCDDEE112233:1700000000:::u:::scESC:'
            echo 'fpr:::::::::0123456789ABCDEF0123456789ABCDEF01234567:'
            exit 0
            ;;
        --export)
            echo '-----BEGIN PGP PUBLIC KEY BLOCK-----'
            echo 'dGVzdA=='
            echo '-----END PGP PUBLIC KEY BLOCK-----'
            exit 0
            ;;
    esac
done
exit 0
"#;
    let path = bin_dir.join("gpg");
    fs::write(&path, script).unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    let old_path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", format!("{}:{}", bin_dir.display(), old_path));
}

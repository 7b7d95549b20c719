//! Ephemeral GPG keyring management.
//!
//! Each build imports the private signing key into a keyring directory
//! created inside the per-build work directory. Every signing operation is
//! scoped to that directory (gpg via `--homedir`, tools that shell out to
//! gpg via `GNUPGHOME`), so the operator's personal keyring is never read
//! or modified. The keyring dies with the work directory.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::process::Cmd;

/// An isolated keyring holding the build's signing key.
#[derive(Debug)]
pub struct Keyring {
    home: PathBuf,
    fingerprint: String,
}

impl Keyring {
    /// Create the keyring directory under the work directory and import
    /// the private key into it. Fatal if the import fails.
    pub fn import(workdir: &Path, key_file: &Path) -> Result<Self> {
        if !key_file.is_file() {
            bail!(
                "Signing key not found at {}. Place the private key there or set METAREPO_KEY_FILE.",
                key_file.display()
            );
        }

        let home = workdir.join("gnupg");
        fs::create_dir_all(&home)
            .with_context(|| format!("Failed to create keyring directory {}", home.display()))?;

        // gpg refuses group/other-accessible home directories.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&home, fs::Permissions::from_mode(0o700))?;
        }

        Cmd::new("gpg")
            .args(["--batch", "--quiet", "--homedir"])
            .arg_path(&home)
            .arg("--import")
            .arg_path(key_file)
            .error_msg("Signing key import failed")
            .run()?;

        let listing = Cmd::new("gpg")
            .args(["--batch", "--homedir"])
            .arg_path(&home)
            .args(["--list-secret-keys", "--with-colons"])
            .error_msg("Listing imported signing key failed")
            .run()?;

        let fingerprint = parse_fingerprint(&listing.stdout)
            .context("No secret key found in keyring after import")?;

        Ok(Self { home, fingerprint })
    }

    /// The keyring directory, for tools that sign via `GNUPGHOME`.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Fingerprint of the imported signing key.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Export the armored public half of the signing key, for clients to
    /// verify the repository against.
    pub fn export_public_key(&self, dest: &Path) -> Result<()> {
        let result = Cmd::new("gpg")
            .args(["--batch", "--homedir"])
            .arg_path(&self.home)
            .args(["--armor", "--export", &self.fingerprint])
            .error_msg("Public key export failed")
            .run()?;

        if result.stdout_trimmed().is_empty() {
            bail!("gpg exported an empty public key for {}", self.fingerprint);
        }

        fs::write(dest, result.stdout.as_bytes())
            .with_context(|| format!("Failed to write public key to {}", dest.display()))?;
        Ok(())
    }
}

/// Pull the primary key fingerprint out of `--with-colons` output.
///
/// The fingerprint record is the first `fpr` line; field 10 carries the
/// fingerprint itself.
fn parse_fingerprint(colons: &str) -> Option<String> {
    for line in colons.lines() {
        let fields: Vec<&str> = line.split(':').collect();
        if fields.first() == Some(&"fpr") {
            if let Some(fpr) = fields.get(9) {
                if !fpr.is_empty() {
                    return Some(fpr.to_string());
                }
            }
        }
    }
    None
}

//! SSH key material and fallback selection
//!
//! Keys are read once when connecting. The primary key (RSA by default) is
//! tried first; if the target rejects it, the fallback key (Ed25519 by
//! default) is tried once.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::HostError;

/// Key format, used for logging which credential is in play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Rsa,
    Ed25519,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Rsa => write!(f, "ssh-rsa"),
            KeyKind::Ed25519 => write!(f, "ssh-ed25519"),
        }
    }
}

/// A private key held in memory
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub kind: KeyKind,
    /// PEM/OpenSSH private key text
    pub material: String,
}

// Never print key material
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Credential {
    pub fn new(kind: KeyKind, material: impl Into<String>) -> Self {
        Self {
            kind,
            material: material.into(),
        }
    }
}

/// Primary credential plus an optional fallback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialSet {
    pub primary: Credential,
    pub fallback: Option<Credential>,
}

impl CredentialSet {
    pub fn new(primary: Credential) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    /// Builder pattern: set the fallback credential
    pub fn with_fallback(mut self, fallback: Credential) -> Self {
        self.fallback = Some(fallback);
        self
    }
}

/// Where to find the key files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPaths {
    pub primary: PathBuf,
    pub fallback: PathBuf,
}

impl Default for KeyPaths {
    fn default() -> Self {
        let ssh_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".ssh");
        Self {
            primary: ssh_dir.join("id_rsa"),
            fallback: ssh_dir.join("id_ed25519"),
        }
    }
}

impl KeyPaths {
    /// Default paths with optional overrides
    pub fn with_overrides(primary: Option<&Path>, fallback: Option<&Path>) -> Self {
        let defaults = Self::default();
        Self {
            primary: primary.map(Path::to_path_buf).unwrap_or(defaults.primary),
            fallback: fallback.map(Path::to_path_buf).unwrap_or(defaults.fallback),
        }
    }

    /// Read both key files
    ///
    /// A missing fallback is fine. A missing primary promotes the fallback to
    /// primary; if both are missing, `HostError::NoCredentials`.
    pub fn load(&self) -> Result<CredentialSet, HostError> {
        let primary = read_key(&self.primary, KeyKind::Rsa)?;
        let fallback = read_key(&self.fallback, KeyKind::Ed25519)?;

        match (primary, fallback) {
            (Some(primary), fallback) => Ok(CredentialSet { primary, fallback }),
            (None, Some(fallback)) => {
                tracing::debug!(
                    "{} not found, using {} as primary key",
                    self.primary.display(),
                    self.fallback.display()
                );
                Ok(CredentialSet::new(fallback))
            }
            (None, None) => Err(HostError::NoCredentials {
                primary: self.primary.clone(),
                fallback: self.fallback.clone(),
            }),
        }
    }
}

fn read_key(path: &Path, kind: KeyKind) -> Result<Option<Credential>, HostError> {
    match fs::read_to_string(path) {
        Ok(material) => Ok(Some(Credential::new(kind, material.trim()))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(source) => Err(HostError::CredentialRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_primary_and_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let rsa = dir.path().join("id_rsa");
        let ed = dir.path().join("id_ed25519");
        fs::write(&rsa, "rsa-key\n").unwrap();
        fs::write(&ed, "ed-key\n").unwrap();

        let set = KeyPaths::with_overrides(Some(&rsa), Some(&ed))
            .load()
            .unwrap();
        assert_eq!(set.primary, Credential::new(KeyKind::Rsa, "rsa-key"));
        assert_eq!(
            set.fallback,
            Some(Credential::new(KeyKind::Ed25519, "ed-key"))
        );
    }

    #[test]
    fn missing_fallback_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let rsa = dir.path().join("id_rsa");
        fs::write(&rsa, "rsa-key").unwrap();

        let set = KeyPaths::with_overrides(Some(&rsa), Some(&dir.path().join("nope")))
            .load()
            .unwrap();
        assert!(set.fallback.is_none());
    }

    #[test]
    fn missing_primary_promotes_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let ed = dir.path().join("id_ed25519");
        fs::write(&ed, "ed-key").unwrap();

        let set = KeyPaths::with_overrides(Some(&dir.path().join("nope")), Some(&ed))
            .load()
            .unwrap();
        assert_eq!(set.primary.kind, KeyKind::Ed25519);
        assert!(set.fallback.is_none());
    }

    #[test]
    fn no_keys_at_all_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = KeyPaths::with_overrides(
            Some(&dir.path().join("a")),
            Some(&dir.path().join("b")),
        );
        assert!(matches!(
            paths.load(),
            Err(HostError::NoCredentials { .. })
        ));
    }

    #[test]
    fn debug_output_hides_key_material() {
        let cred = Credential::new(KeyKind::Rsa, "SECRET");
        assert!(!format!("{cred:?}").contains("SECRET"));
    }
}

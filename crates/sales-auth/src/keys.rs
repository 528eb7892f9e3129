//! Signing and verification key lookup.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};
use tracing::info;

use crate::error::AuthError;

/// Resolves key material by key id (`kid`).
pub trait KeyLookup: Send + Sync {
    fn signing_key(&self, kid: &str) -> Result<(EncodingKey, Algorithm), AuthError>;
    fn verifying_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError>;
}

#[derive(Clone)]
struct KeyEntry {
    algorithm: Algorithm,
    signing: Option<EncodingKey>,
    verifying: Option<DecodingKey>,
}

/// In-memory key set. RSA pairs are loaded from a folder; HMAC secrets can be
/// registered directly.
#[derive(Clone, Default)]
pub struct KeyStore {
    keys: HashMap<String, KeyEntry>,
}

impl KeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_hmac(mut self, kid: impl Into<String>, secret: &[u8]) -> Self {
        self.keys.insert(
            kid.into(),
            KeyEntry {
                algorithm: Algorithm::HS256,
                signing: Some(EncodingKey::from_secret(secret)),
                verifying: Some(DecodingKey::from_secret(secret)),
            },
        );
        self
    }

    /// Loads `<kid>.pem` (RSA private key) and `<kid>.pub.pem` (RSA public
    /// key) files. Other files are ignored.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, AuthError> {
        let mut store = Self::new();

        for entry in fs::read_dir(dir.as_ref())? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let (kid, public) = if let Some(kid) = name.strip_suffix(".pub.pem") {
                (kid.to_string(), true)
            } else if let Some(kid) = name.strip_suffix(".pem") {
                (kid.to_string(), false)
            } else {
                continue;
            };

            let pem = fs::read(&path)?;
            let invalid = |e: jsonwebtoken::errors::Error| AuthError::InvalidKey {
                path: path.display().to_string(),
                reason: e.to_string(),
            };

            let slot = store.keys.entry(kid.clone()).or_insert(KeyEntry {
                algorithm: Algorithm::RS256,
                signing: None,
                verifying: None,
            });
            if public {
                slot.verifying = Some(DecodingKey::from_rsa_pem(&pem).map_err(invalid)?);
            } else {
                slot.signing = Some(EncodingKey::from_rsa_pem(&pem).map_err(invalid)?);
            }

            info!(kid = %kid, public, "loaded key");
        }

        Ok(store)
    }

    pub fn contains(&self, kid: &str) -> bool {
        self.keys.contains_key(kid)
    }

    pub fn kids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    fn entry(&self, kid: &str) -> Result<&KeyEntry, AuthError> {
        self.keys
            .get(kid)
            .ok_or_else(|| AuthError::KeyNotFound(kid.to_string()))
    }
}

impl KeyLookup for KeyStore {
    fn signing_key(&self, kid: &str) -> Result<(EncodingKey, Algorithm), AuthError> {
        let entry = self.entry(kid)?;
        let key = entry.signing.clone().ok_or_else(|| AuthError::KeyUsage {
            kid: kid.to_string(),
            usage: "sign",
        })?;
        Ok((key, entry.algorithm))
    }

    fn verifying_key(&self, kid: &str) -> Result<(DecodingKey, Algorithm), AuthError> {
        let entry = self.entry(kid)?;
        let key = entry.verifying.clone().ok_or_else(|| AuthError::KeyUsage {
            kid: kid.to_string(),
            usage: "verify",
        })?;
        Ok((key, entry.algorithm))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_KID: &str = "54bb2165-71e1-41a6-af3e-7da4a0e1e2c1";

    fn dev_keys_dir() -> std::path::PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../zarf/keys")
    }

    #[test]
    fn test_hmac_key() {
        let store = KeyStore::new().with_hmac("test-kid", b"secret");
        assert!(store.contains("test-kid"));
        assert_eq!(store.signing_key("test-kid").unwrap().1, Algorithm::HS256);
        assert!(store.verifying_key("test-kid").is_ok());
    }

    #[test]
    fn test_unknown_kid() {
        let store = KeyStore::new();
        assert!(matches!(
            store.verifying_key("nope"),
            Err(AuthError::KeyNotFound(kid)) if kid == "nope"
        ));
    }

    #[test]
    fn test_loads_rsa_pair_from_dir() {
        let store = KeyStore::from_dir(dev_keys_dir()).unwrap();
        assert!(store.contains(DEV_KID));
        assert_eq!(store.signing_key(DEV_KID).unwrap().1, Algorithm::RS256);
        assert!(store.verifying_key(DEV_KID).is_ok());
    }

    #[test]
    fn test_missing_dir() {
        assert!(matches!(
            KeyStore::from_dir("/definitely/not/here"),
            Err(AuthError::Io(_))
        ));
    }
}

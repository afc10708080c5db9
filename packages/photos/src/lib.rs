#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Content-addressed photo storage for incident reports.
//!
//! Photos are named by the SHA-256 digest of their bytes, so the same
//! image always resolves to the same reference (`sha256:<hex>`). Writes
//! are idempotent: storing bytes that already exist is a no-op. References
//! are immutable once attached to an incident, which keeps the door open
//! for duplicate detection without any extra bookkeeping here.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Prefix identifying the digest algorithm in a photo reference.
const REF_PREFIX: &str = "sha256:";

/// Errors that can occur during photo storage operations.
#[derive(Debug, thiserror::Error)]
pub enum PhotoError {
    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A photo reference was not in the expected `sha256:<hex>` form.
    #[error("Invalid photo reference: {reference}")]
    InvalidReference {
        /// The malformed reference.
        reference: String,
    },
}

/// Filesystem-backed, content-addressed photo store.
///
/// Blobs live under `<root>/<first two hex chars>/<hex>` to keep directory
/// fan-out bounded.
#[derive(Debug, Clone)]
pub struct PhotoStore {
    root: PathBuf,
}

impl PhotoStore {
    /// Creates a store rooted at `root`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError`] if the root directory cannot be created.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, PhotoError> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Stores `bytes` and returns the content-addressed reference.
    ///
    /// Idempotent: if a blob with the same digest already exists, the
    /// existing file is left untouched and the same reference is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError`] if the blob cannot be written.
    pub async fn put(&self, bytes: &[u8]) -> Result<String, PhotoError> {
        let digest = hex::encode(Sha256::digest(bytes));
        let path = self.blob_path(&digest);

        if tokio::fs::try_exists(&path).await? {
            log::debug!("Photo {digest} already stored, skipping write");
            return Ok(format!("{REF_PREFIX}{digest}"));
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Write to a temp name first so a concurrent reader never observes
        // a partially-written blob under its final content address.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &path).await?;

        log::debug!("Stored photo {digest} ({} bytes)", bytes.len());
        Ok(format!("{REF_PREFIX}{digest}"))
    }

    /// Loads the bytes for a photo reference.
    ///
    /// Returns `None` if no blob exists for the reference.
    ///
    /// # Errors
    ///
    /// Returns [`PhotoError`] if the reference is malformed or the read
    /// fails for a reason other than the blob being absent.
    pub async fn get(&self, reference: &str) -> Result<Option<Vec<u8>>, PhotoError> {
        let digest = parse_reference(reference)?;
        let path = self.blob_path(digest);

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn blob_path(&self, digest: &str) -> PathBuf {
        self.root.join(&digest[..2]).join(digest)
    }

    /// Returns the store's root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Validates a `sha256:<hex>` reference and returns the hex digest.
///
/// The digest must be exactly 64 lowercase hex characters, which also
/// rules out path traversal through a crafted reference.
fn parse_reference(reference: &str) -> Result<&str, PhotoError> {
    let digest = reference
        .strip_prefix(REF_PREFIX)
        .ok_or_else(|| PhotoError::InvalidReference {
            reference: reference.to_string(),
        })?;

    if digest.len() == 64 && digest.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase())
    {
        Ok(digest)
    } else {
        Err(PhotoError::InvalidReference {
            reference: reference.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> PhotoStore {
        let dir = std::env::temp_dir().join(format!(
            "safehaven-photos-test-{}-{:?}",
            std::process::id(),
            std::thread::current().id()
        ));
        PhotoStore::new(dir).unwrap()
    }

    #[tokio::test]
    async fn same_bytes_same_reference() {
        let store = temp_store();
        let a = store.put(b"jpeg bytes").await.unwrap();
        let b = store.put(b"jpeg bytes").await.unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("sha256:"));
    }

    #[tokio::test]
    async fn different_bytes_different_reference() {
        let store = temp_store();
        let a = store.put(b"photo one").await.unwrap();
        let b = store.put(b"photo two").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn get_round_trips_bytes() {
        let store = temp_store();
        let reference = store.put(b"round trip").await.unwrap();
        let loaded = store.get(&reference).await.unwrap();
        assert_eq!(loaded.as_deref(), Some(&b"round trip"[..]));
    }

    #[tokio::test]
    async fn get_unknown_reference_is_none() {
        let store = temp_store();
        let reference = format!("sha256:{}", "0".repeat(64));
        assert!(store.get(&reference).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_references_are_rejected() {
        let store = temp_store();
        for bad in [
            "deadbeef",
            "sha256:short",
            "sha256:../../../etc/passwd",
            &format!("sha256:{}", "G".repeat(64)),
        ] {
            assert!(matches!(
                store.get(bad).await,
                Err(PhotoError::InvalidReference { .. })
            ));
        }
    }
}

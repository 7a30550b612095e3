//! Filesystem object store with public URL issuance.
//!
//! Uploaded note files are stored under a base directory, fanned out by the
//! first characters of their key to keep directories small. Writes are
//! atomic (temp file + rename). Public URLs are derived from a configured
//! base URL; serving the files is the front proxy's job.

use std::path::PathBuf;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use nursenotes_core::{Error, ObjectStore, Result};

/// Compute the SHA256 hash of stored data with a "sha256:" prefix.
pub fn compute_content_hash(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}

/// Relative path for a storage key: `objects/{first-2-chars}/{key}`.
///
/// Keys are `{uuid}.{ext}`, so the two-character fan-out keeps any one
/// directory from growing unboundedly.
pub fn object_path(key: &str) -> String {
    let prefix: String = key.chars().take(2).collect();
    format!("objects/{}/{}", prefix, key)
}

/// Reject keys that could escape the storage root.
fn check_key(key: &str) -> Result<()> {
    if key.is_empty()
        || key.contains('/')
        || key.contains('\\')
        || key.contains("..")
        || key.starts_with('.')
    {
        return Err(Error::Storage(format!("Invalid storage key '{}'", key)));
    }
    Ok(())
}

/// Filesystem-backed object store.
pub struct FilesystemStore {
    base_path: PathBuf,
    /// Base of the public URLs handed to clients, without trailing slash.
    public_base_url: String,
}

impl FilesystemStore {
    /// Create a store rooted at `base_path`, issuing URLs under
    /// `public_base_url`.
    pub fn new(base_path: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(object_path(key))
    }

    /// Validate that the store can write, read, and delete files.
    ///
    /// Full round-trip at startup to catch permission errors and missing
    /// directories before the first upload does.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("objects/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_back = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_back != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl ObjectStore for FilesystemStore {
    async fn put(&self, key: &str, data: &[u8]) -> Result<()> {
        check_key(key)?;
        let full_path = self.full_path(key);
        debug!(
            subsystem = "storage",
            component = "object_store",
            op = "put",
            storage_key = %key,
            size_bytes = data.len(),
            content_hash = %compute_content_hash(data),
            "Storing object"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "object_store: create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename.
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await.map_err(|e| {
            warn!(temp_path = %temp_path.display(), error = %e, "object_store: create failed");
            e
        })?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "object_store: rename failed");
            e
        })?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        check_key(key)?;
        let full_path = self.full_path(key);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(&full_path).await?;
            debug!(
                subsystem = "storage",
                component = "object_store",
                op = "delete",
                storage_key = %key,
                "Object deleted"
            );
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        check_key(key)?;
        Ok(fs::try_exists(self.full_path(key)).await?)
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_base_url, object_path(key))
    }
}

//! Filesystem object store.
//!
//! Buckets are directories under a root directory and keys are relative paths
//! inside them. An object is written to a temporary file next to its final
//! path and then hard-linked into place, which fails if the key already
//! exists. A failed write never leaves a partial object behind, and an
//! existing object is never replaced even when two writers race on the same
//! key.

use std::io::{self, ErrorKind};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::errors::StorageError;
use crate::interfaces::{ObjectStore, PutOutcome};

/// Distinguishes temporary files of concurrent writers within one process.
static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Object store writing each object to its own file.
#[derive(Debug, Clone)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    /// Create a store rooted at `root`. The directory is created lazily.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_path(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        if bucket.is_empty() || bucket.contains('/') || bucket.contains('\\') || bucket == ".." {
            return Err(StorageError::invalid_key(format!(
                "invalid bucket name: {:?}",
                bucket
            )));
        }
        Ok(self.root.join(bucket))
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StorageError> {
        let bucket_path = self.bucket_path(bucket)?;
        let relative = Path::new(key);

        if key.is_empty() {
            return Err(StorageError::invalid_key("empty object key"));
        }

        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(StorageError::invalid_key(format!(
                "object key escapes its bucket: {:?}",
                key
            )));
        }

        Ok(bucket_path.join(relative))
    }

    async fn require_bucket(&self, bucket: &str) -> Result<PathBuf, StorageError> {
        let path = self.bucket_path(bucket)?;
        match fs::metadata(&path).await {
            Ok(meta) if meta.is_dir() => Ok(path),
            Ok(_) => Err(StorageError::bucket_not_found(bucket)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::bucket_not_found(bucket))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn ensure_bucket(&self, bucket: &str) -> Result<(), StorageError> {
        let path = self.bucket_path(bucket)?;
        fs::create_dir_all(&path).await?;
        info!(bucket = %bucket, path = %path.display(), "Bucket ready");
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> Result<PutOutcome, StorageError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if fs::try_exists(&path).await? {
            debug!(bucket = %bucket, key = %key, "Object already exists");
            return Ok(PutOutcome::AlreadyExists);
        }

        let outcome = publish_new(&temp_path_for(&path), &path, &body).await?;
        if outcome == PutOutcome::AlreadyExists {
            debug!(bucket = %bucket, key = %key, "Object already exists");
        }
        Ok(outcome)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        self.require_bucket(bucket).await?;
        let path = self.object_path(bucket, key)?;

        match fs::read(&path).await {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(bucket, key)),
            Err(e) => Err(e.into()),
        }
    }
}

/// Hidden sibling of `path` used while its content is being written.
fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        ".{}.{}.{}.tmp",
        name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ))
}

/// Write `body` to `temp`, then link it to `path` unless `path` exists.
///
/// `temp` is removed afterwards whatever the outcome.
async fn publish_new(temp: &Path, path: &Path, body: &[u8]) -> Result<PutOutcome, StorageError> {
    let result: io::Result<PutOutcome> = async {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(temp)
            .await?;
        file.write_all(body).await?;
        file.sync_all().await?;
        drop(file);

        match fs::hard_link(temp, path).await {
            Ok(()) => Ok(PutOutcome::Created),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(PutOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }
    .await;

    if let Err(e) = fs::remove_file(temp).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %temp.display(), error = %e, "Failed to remove temporary file");
        }
    }

    Ok(result?)
}

//! Configuration types for the object store.

use std::path::PathBuf;

/// Default bucket holding raw museum records.
pub const DEFAULT_BUCKET: &str = "museums";

/// Default root directory for the filesystem store.
pub const DEFAULT_ROOT_DIR: &str = "./data";

/// Configuration for the object store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory under which the filesystem store keeps its buckets.
    pub root_dir: PathBuf,
    /// Bucket the parser writes to.
    pub bucket: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: PathBuf::from(DEFAULT_ROOT_DIR),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

impl StorageConfig {
    /// Create a config for the given root directory and bucket.
    pub fn new(root_dir: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            bucket: bucket.into(),
        }
    }
}

/// Region sent to S3-compatible servers that ignore it.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Connection settings for an S3-compatible server such as MinIO.
#[derive(Clone)]
pub struct S3Config {
    /// `host:port` of the server, or a full URL with a scheme.
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    /// Use `https` when `endpoint` carries no scheme.
    pub use_ssl: bool,
    pub region: String,
}

impl S3Config {
    /// Create a config for a plain-HTTP server in the default region.
    pub fn new(
        endpoint: impl Into<String>,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            use_ssl: false,
            region: DEFAULT_S3_REGION.to_string(),
        }
    }

    /// The endpoint as a URL.
    pub fn endpoint_url(&self) -> String {
        if self.endpoint.contains("://") {
            return self.endpoint.clone();
        }
        let scheme = if self.use_ssl { "https" } else { "http" };
        format!("{}://{}", scheme, self.endpoint)
    }
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key)
            .field("use_ssl", &self.use_ssl)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

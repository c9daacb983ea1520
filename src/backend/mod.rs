//! The storage-service seam. Everything above this module talks to a
//! `DataLakeFileSystem`; the concrete transport lives in submodules.

mod memory;
mod webhdfs;

pub use memory::MemoryFileSystem;
pub use webhdfs::{WebHdfsAuthenticator, WebHdfsFileSystem, DATALAKE_RESOURCE, DEFAULT_AUTHORITY};

use crate::config::ResolvedCredentials;
use crate::error::Result;
use crate::transfer::TransferOptions;
use std::path::Path;
use std::sync::Arc;

/// Remote filesystem operations. Paths are `/`-separated and relative to the store root.
pub trait DataLakeFileSystem: Send + Sync {
    /// Full paths of the direct children of `path`, in service order.
    /// A missing directory is `NotFound`.
    fn list(&self, path: &str) -> Result<Vec<String>>;

    fn exists(&self, path: &str) -> Result<bool>;

    /// Whole-object read.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or truncate `path` with `data`.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Append `data`, creating the object when missing.
    fn append(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Remove a file or directory tree. Missing paths are not an error.
    fn delete(&self, path: &str) -> Result<()>;

    /// Copy one local file to `remote`, chunked as `opts` describes.
    fn upload_bulk(&self, local: &Path, remote: &str, opts: &TransferOptions) -> Result<()>;

    /// Copy one remote file to `local`, chunked as `opts` describes.
    fn download_bulk(&self, remote: &str, local: &Path, opts: &TransferOptions) -> Result<()>;
}

/// Turns credentials into a live filesystem handle (one network round-trip for real backends).
pub trait Authenticator {
    fn authenticate(&self, credentials: &ResolvedCredentials) -> Result<Arc<dyn DataLakeFileSystem>>;
}

//! Whole-file upload/download between local disk and the store.
//!
//! Chunking and thread fan-out happen inside the backend; this layer checks
//! the overwrite policy, derives destination names, and walks batches one
//! file at a time.

use crate::client::StorageClient;
use crate::error::{DatalakeError, Result};
use crate::paths::{join_remote, last_segment};
use crate::progress::make_count_progress;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Remote directory used by `upload_files` callers that have no better place.
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
/// Local directory used by `download_files` callers that have no better place.
pub const DEFAULT_DOWNLOAD_DIR: &str = "datalake-downloads";

const MIN_BUFFER: usize = 64 * 1024;
const MAX_THREADS: usize = 64;

/// Transfer tuning with builder chaining. Defaults match the historical
/// large-buffer setup: 4 threads, 16 MiB buffers and blocks, overwrite on.
///
/// Fields are only reachable through the `with_*` builders, so threads stay
/// in `1..=64` and both sizes stay at or above 64 KiB.
#[derive(Clone, Debug)]
pub struct TransferOptions {
    nthreads: usize,
    buffer_size: usize, // bytes handled by one worker
    block_size: usize,  // bytes per request
    overwrite: bool,
    progress: bool,     // count bar for batch transfers
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            nthreads: 4,
            buffer_size: 1 << 24,
            block_size: 1 << 24,
            overwrite: true,
            progress: false,
        }
    }
}

impl TransferOptions {
    pub fn with_threads(mut self, n: usize) -> Self {
        self.nthreads = n.clamp(1, MAX_THREADS);
        self
    }
    pub fn with_buffer_size(mut self, bytes: usize) -> Self {
        self.buffer_size = bytes.max(MIN_BUFFER);
        self
    }
    pub fn with_block_size(mut self, bytes: usize) -> Self {
        self.block_size = bytes.max(MIN_BUFFER);
        self
    }
    pub fn with_overwrite(mut self, yes: bool) -> Self {
        self.overwrite = yes;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    pub fn nthreads(&self) -> usize {
        self.nthreads
    }
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }
    pub fn block_size(&self) -> usize {
        self.block_size
    }
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }
    pub fn progress(&self) -> bool {
        self.progress
    }
}

/// Upload one local file to `remote_path`.
/// With `overwrite` off, an existing destination fails before any bytes move.
pub fn upload_file(client: &StorageClient, local_path: &Path, remote_path: &str, opts: &TransferOptions) -> Result<()> {
    if !opts.overwrite && client.exists(remote_path)? {
        return Err(DatalakeError::AlreadyExists(remote_path.to_string()));
    }
    tracing::info!("uploading {} -> {}", local_path.display(), remote_path);
    client.filesystem().upload_bulk(local_path, remote_path, opts)
}

/// Download `remote_path` into `local_path`.
pub fn download_file(client: &StorageClient, remote_path: &str, local_path: &Path, opts: &TransferOptions) -> Result<()> {
    if !opts.overwrite && local_path.exists() {
        return Err(DatalakeError::AlreadyExists(local_path.display().to_string()));
    }
    tracing::info!("downloading {} -> {}", remote_path, local_path.display());
    client.filesystem().download_bulk(remote_path, local_path, opts)
}

/// Upload each file into `remote_dir`, keeping its file name.
/// Returns the remote paths written, in input order. Stops at the first failure.
pub fn upload_files<P: AsRef<Path>>(
    client: &StorageClient,
    local_paths: &[P],
    remote_dir: &str,
    opts: &TransferOptions,
) -> Result<Vec<String>> {
    let pb = opts.progress.then(|| make_count_progress(local_paths.len() as u64, "Uploading"));
    let mut written = Vec::with_capacity(local_paths.len());
    for local in local_paths {
        let local = local.as_ref();
        let name = local.to_string_lossy();
        let remote = join_remote(remote_dir, last_segment(&name));
        upload_file(client, local, &remote, opts)?;
        written.push(remote);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("upload complete");
    }
    Ok(written)
}

/// Download each remote file into `local_dir` (created if missing), keeping its file name.
pub fn download_files<S: AsRef<str>>(
    client: &StorageClient,
    remote_paths: &[S],
    local_dir: &Path,
    opts: &TransferOptions,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(local_dir).map_err(|e| DatalakeError::io(local_dir, e))?;
    let pb = opts.progress.then(|| make_count_progress(remote_paths.len() as u64, "Downloading"));
    let mut written = Vec::with_capacity(remote_paths.len());
    for remote in remote_paths {
        let remote = remote.as_ref();
        let local = local_dir.join(last_segment(remote));
        download_file(client, remote, &local, opts)?;
        written.push(local);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("download complete");
    }
    Ok(written)
}

/// Upload every file below `local_dir`, mirroring relative paths under `remote_dir`.
/// Files are visited in name order.
pub fn upload_directory(
    client: &StorageClient,
    local_dir: &Path,
    remote_dir: &str,
    opts: &TransferOptions,
) -> Result<Vec<String>> {
    let mut jobs = Vec::new();
    for entry in WalkDir::new(local_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(local_dir).to_path_buf();
            DatalakeError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(local_dir).unwrap_or(entry.path());
        let rel = rel.components().map(|c| c.as_os_str().to_string_lossy()).collect::<Vec<_>>().join("/");
        jobs.push((entry.into_path(), join_remote(remote_dir, &rel)));
    }

    let pb = opts.progress.then(|| make_count_progress(jobs.len() as u64, "Uploading"));
    let mut written = Vec::with_capacity(jobs.len());
    for (local, remote) in jobs {
        upload_file(client, &local, &remote, opts)?;
        written.push(remote);
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    }
    if let Some(pb) = pb {
        pb.finish_with_message("upload complete");
    }
    Ok(written)
}

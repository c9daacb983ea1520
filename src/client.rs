use crate::backend::{Authenticator, DataLakeFileSystem, WebHdfsAuthenticator};
use crate::config::{ClientOptions, ConfigSource, EnvFileSource};
use crate::error::{DatalakeError, Result};
use std::fmt;
use std::io::{self, Cursor, Read, Write};
use std::str::FromStr;
use std::sync::Arc;

/// Authenticated handle to one store. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct StorageClient {
    fs: Arc<dyn DataLakeFileSystem>,
    store_name: String,
}

impl fmt::Debug for StorageClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageClient").field("store_name", &self.store_name).finish_non_exhaustive()
    }
}

/// Build a client from `opts`, reading the env file only when credentials are incomplete.
pub fn create_client(opts: &ClientOptions) -> Result<StorageClient> {
    create_client_with(opts, &EnvFileSource::new(&opts.env_file), &WebHdfsAuthenticator::new())
}

/// Same as `create_client` with injectable defaults and transport.
pub fn create_client_with(
    opts: &ClientOptions,
    source: &dyn ConfigSource,
    auth: &dyn Authenticator,
) -> Result<StorageClient> {
    let creds = opts.resolve_with(source)?;
    let fs = auth.authenticate(&creds)?;
    Ok(StorageClient { fs, store_name: creds.store_name })
}

impl StorageClient {
    /// Wrap an already-authenticated filesystem.
    pub fn from_filesystem(store_name: impl Into<String>, fs: Arc<dyn DataLakeFileSystem>) -> Self {
        Self { fs, store_name: store_name.into() }
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn filesystem(&self) -> &dyn DataLakeFileSystem {
        self.fs.as_ref()
    }

    pub fn list(&self, path: &str) -> Result<Vec<String>> {
        self.fs.list(path)
    }

    pub fn exists(&self, path: &str) -> Result<bool> {
        self.fs.exists(path)
    }

    pub fn open(&self, path: &str, mode: FileMode) -> Result<RemoteFile> {
        let state = match mode {
            FileMode::Read => State::Read(Cursor::new(self.fs.read(path)?)),
            FileMode::Write | FileMode::Append => State::Write { buf: Vec::new(), truncate: mode == FileMode::Write },
        };
        Ok(RemoteFile { fs: Arc::clone(&self.fs), path: path.to_string(), state, closed: false })
    }

    /// `open` with a textual mode: `rb`, `wb` or `ab`.
    pub fn open_mode(&self, path: &str, mode: &str) -> Result<RemoteFile> {
        self.open(path, mode.parse()?)
    }

    pub fn open_read(&self, path: &str) -> Result<RemoteFile> {
        self.open(path, FileMode::Read)
    }

    pub fn open_write(&self, path: &str) -> Result<RemoteFile> {
        self.open(path, FileMode::Write)
    }

    pub fn open_append(&self, path: &str) -> Result<RemoteFile> {
        self.open(path, FileMode::Append)
    }
}

/// Binary access modes. Text modes are not supported.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileMode {
    Read,
    Write,
    Append,
}

impl FromStr for FileMode {
    type Err = DatalakeError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rb" => Ok(FileMode::Read),
            "wb" => Ok(FileMode::Write),
            "ab" => Ok(FileMode::Append),
            other => Err(DatalakeError::InvalidArgument(format!(
                "must use a binary file mode (\"rb\", \"wb\", or \"ab\"), got {other:?}"
            ))),
        }
    }
}

enum State {
    Read(Cursor<Vec<u8>>),
    Write { buf: Vec<u8>, truncate: bool },
}

/// Open remote object.
///
/// Read mode holds the whole object in memory. Write/append modes buffer
/// locally and commit on `flush`/`close`; the first commit of a write-mode
/// handle truncates, later ones append. Dropping an unclosed handle commits
/// best-effort and logs failures.
pub struct RemoteFile {
    fs: Arc<dyn DataLakeFileSystem>,
    path: String,
    state: State,
    closed: bool,
}

impl RemoteFile {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn mode(&self) -> FileMode {
        match &self.state {
            State::Read(_) => FileMode::Read,
            State::Write { truncate: true, .. } => FileMode::Write,
            State::Write { truncate: false, .. } => FileMode::Append,
        }
    }

    /// Whole remaining content (read mode).
    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_to_end(&mut out).map_err(|e| DatalakeError::service(&self.path, e))?;
        Ok(out)
    }

    fn commit(&mut self) -> Result<()> {
        if let State::Write { buf, truncate } = &mut self.state {
            if *truncate {
                self.fs.write(&self.path, buf)?;
                *truncate = false;
            } else if !buf.is_empty() {
                self.fs.append(&self.path, buf)?;
            }
            buf.clear();
        }
        Ok(())
    }

    /// Commit pending bytes and release the handle.
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.commit()
    }
}

impl Read for RemoteFile {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Read(cur) => cur.read(out),
            State::Write { .. } => Err(io::Error::new(io::ErrorKind::Unsupported, "file not opened for reading")),
        }
    }
}

impl Write for RemoteFile {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        match &mut self.state {
            State::Write { buf, .. } => {
                buf.extend_from_slice(data);
                Ok(data.len())
            }
            State::Read(_) => Err(io::Error::new(io::ErrorKind::Unsupported, "file not opened for writing")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.commit().map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }
}

impl Drop for RemoteFile {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        if let Err(e) = self.commit() {
            tracing::warn!("failed to commit {} on drop: {}", self.path, e);
        }
    }
}

/// Full paths under `path`.
pub fn list_datalake_files(client: &StorageClient, path: &str) -> Result<Vec<String>> {
    client.list(path)
}

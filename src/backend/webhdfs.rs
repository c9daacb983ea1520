//! Data Lake Store over its WebHDFS-compatible REST API.
//!
//! Authentication is an OAuth2 client-credentials exchange against the
//! tenant's authority. Bulk transfers split files into `buffer_size` chunks,
//! each moved by a rayon worker in `block_size` requests.

use super::{Authenticator, DataLakeFileSystem};
use crate::config::ResolvedCredentials;
use crate::error::{DatalakeError, Result};
use crate::paths::{join_remote, normalize_remote, TEMP_MARKER};
use crate::transfer::TransferOptions;
use parking_lot::Mutex;
use rayon::prelude::*;
use reqwest::blocking::{Client, Response};
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use url::Url;

pub const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
pub const DATALAKE_RESOURCE: &str = "https://datalake.azure.net/";
const API_VERSION: &str = "2018-09-01";
const REFRESH_MARGIN: Duration = Duration::from_secs(300);
const DEFAULT_EXPIRY_SECS: u64 = 3600;

/// Builds `WebHdfsFileSystem` handles. Endpoint and authority are overridable
/// for sovereign clouds and local test servers.
#[derive(Clone, Debug)]
pub struct WebHdfsAuthenticator {
    authority: String,
    endpoint: Option<String>,
    timeout: Duration,
}

impl Default for WebHdfsAuthenticator {
    fn default() -> Self {
        Self { authority: DEFAULT_AUTHORITY.to_string(), endpoint: None, timeout: Duration::from_secs(300) }
    }
}

impl WebHdfsAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }
    /// Base URL up to and including `/webhdfs/v1`. Defaults to
    /// `https://{store}.azuredatalakestore.net/webhdfs/v1`.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Authenticator for WebHdfsAuthenticator {
    fn authenticate(&self, credentials: &ResolvedCredentials) -> Result<Arc<dyn DataLakeFileSystem>> {
        let http = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| DatalakeError::Configuration(format!("cannot build HTTP client: {e}")))?;

        let endpoint = self
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}.azuredatalakestore.net/webhdfs/v1", credentials.store_name));
        let base = Url::parse(&endpoint)
            .map_err(|e| DatalakeError::Configuration(format!("invalid endpoint {endpoint}: {e}")))?;

        let tokens = TokenProvider {
            http: http.clone(),
            token_url: format!("{}/{}/oauth2/token", self.authority.trim_end_matches('/'), credentials.tenant_id),
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            current: Mutex::new(None),
        };
        // Fail fast on bad credentials rather than on the first list/open.
        tokens.bearer()?;
        tracing::info!("authenticated against store {}", credentials.store_name);

        Ok(Arc::new(WebHdfsFileSystem { http, base, tokens }))
    }
}

// ----------------------------- OAuth ------------------------------------

struct Token {
    access: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    // v1 endpoints send this as a string, v2 as a number.
    #[serde(default)]
    expires_in: Option<Value>,
}

struct TokenProvider {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    current: Mutex<Option<Token>>,
}

impl TokenProvider {
    fn bearer(&self) -> Result<String> {
        let mut guard = self.current.lock();
        if let Some(tok) = guard.as_ref() {
            if tok.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(tok.access.clone());
            }
        }
        let tok = self.fetch()?;
        let access = tok.access.clone();
        *guard = Some(tok);
        Ok(access)
    }

    fn fetch(&self) -> Result<Token> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("resource", DATALAKE_RESOURCE),
        ];
        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .map_err(|e| DatalakeError::service(&self.token_url, e))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            return Err(DatalakeError::Configuration(format!(
                "authentication rejected ({status}): {}",
                body.trim()
            )));
        }
        let parsed: TokenResponse = resp
            .json()
            .map_err(|e| DatalakeError::Configuration(format!("unreadable token response: {e}")))?;
        let secs = match parsed.expires_in {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(DEFAULT_EXPIRY_SECS),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(DEFAULT_EXPIRY_SECS),
            _ => DEFAULT_EXPIRY_SECS,
        };
        tracing::debug!("fetched access token valid for {secs}s");
        Ok(Token { access: parsed.access_token, expires_at: Instant::now() + Duration::from_secs(secs) })
    }
}

// ----------------------------- Wire types ------------------------------------

#[derive(Deserialize)]
struct ListStatusResponse {
    #[serde(rename = "FileStatuses")]
    file_statuses: FileStatuses,
}

#[derive(Deserialize)]
struct FileStatuses {
    #[serde(rename = "FileStatus", default)]
    file_status: Vec<FileStatus>,
}

#[derive(Deserialize)]
struct FileStatusResponse {
    #[serde(rename = "FileStatus")]
    file_status: FileStatus,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileStatus {
    #[serde(default)]
    path_suffix: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    length: u64,
}

impl FileStatus {
    fn is_dir(&self) -> bool {
        self.kind.eq_ignore_ascii_case("DIRECTORY")
    }
}

#[derive(serde::Serialize)]
struct ConcatSources<'a> {
    sources: &'a [String],
}

// ----------------------------- Filesystem ------------------------------------

pub struct WebHdfsFileSystem {
    http: Client,
    base: Url,
    tokens: TokenProvider,
}

impl WebHdfsFileSystem {
    fn url(&self, path: &str, op: &str, params: &[(&str, String)]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| DatalakeError::Configuration(format!("endpoint {} cannot take a path", self.base)))?;
            segs.pop_if_empty();
            segs.extend(normalize_remote(path).split('/').filter(|s| !s.is_empty()));
        }
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("op", op);
            for (k, v) in params {
                q.append_pair(k, v);
            }
            q.append_pair("api-version", API_VERSION);
        }
        Ok(url)
    }

    fn call(
        &self,
        method: Method,
        path: &str,
        op: &str,
        params: &[(&str, String)],
        body: Option<Vec<u8>>,
    ) -> Result<Response> {
        let url = self.url(path, op, params)?;
        tracing::debug!("{method} {op} {path}");
        let mut req = self.http.request(method, url).bearer_auth(self.tokens.bearer()?);
        if let Some(body) = body {
            req = req.header(reqwest::header::CONTENT_TYPE, "application/octet-stream").body(body);
        }
        let resp = req.send().map_err(|e| DatalakeError::service(path, e))?;
        check(path, resp)
    }

    fn file_status(&self, path: &str) -> Result<FileStatus> {
        let resp = self.call(Method::GET, path, "GETFILESTATUS", &[], None)?;
        let parsed: FileStatusResponse = resp.json().map_err(|e| DatalakeError::service(path, e))?;
        Ok(parsed.file_status)
    }

    fn create(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let params = [("overwrite", "true".to_string()), ("write", "true".to_string())];
        self.call(Method::PUT, path, "CREATE", &params, Some(data)).map(drop)
    }

    fn append_block(&self, path: &str, data: Vec<u8>) -> Result<()> {
        let params = [("append", "true".to_string())];
        self.call(Method::POST, path, "APPEND", &params, Some(data)).map(drop)
    }

    fn concat(&self, target: &str, sources: &[String]) -> Result<()> {
        let body = serde_json::to_vec(&ConcatSources { sources })
            .map_err(|e| DatalakeError::transfer(target, e))?;
        let url = self.url(target, "MSCONCAT", &[("deleteSourceDirectory", "true".to_string())])?;
        let resp = self
            .http
            .post(url)
            .bearer_auth(self.tokens.bearer()?)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .map_err(|e| DatalakeError::service(target, e))?;
        check(target, resp).map(drop)
    }

    /// Fetch `[offset, offset+len)` into `local` at the same offset.
    fn download_chunk(&self, remote: &str, local: &Path, offset: u64, len: u64, block: u64) -> Result<()> {
        let file = OpenOptions::new().write(true).open(local).map_err(|e| DatalakeError::io(local, e))?;
        let mut w = BufWriter::with_capacity(block.min(8 * 1024 * 1024) as usize, file);
        w.seek(SeekFrom::Start(offset)).map_err(|e| DatalakeError::io(local, e))?;
        for (off, n) in chunk_ranges(len, block) {
            let params = [
                ("read", "true".to_string()),
                ("offset", (offset + off).to_string()),
                ("length", n.to_string()),
            ];
            let mut resp = self.call(Method::GET, remote, "OPEN", &params, None)?;
            io::copy(&mut resp, &mut w).map_err(|e| DatalakeError::transfer(remote, e))?;
        }
        w.flush().map_err(|e| DatalakeError::io(local, e))
    }

    /// Write `[offset, offset+len)` of `local` to the new remote object `dest`.
    fn upload_chunk(&self, local: &Path, dest: &str, offset: u64, len: u64, block: u64) -> Result<()> {
        let mut file = File::open(local).map_err(|e| DatalakeError::io(local, e))?;
        file.seek(SeekFrom::Start(offset)).map_err(|e| DatalakeError::io(local, e))?;
        if len == 0 {
            return self.create(dest, Vec::new());
        }
        let mut reader = file.take(len);
        let mut sent = 0u64;
        for (_, n) in chunk_ranges(len, block) {
            let mut buf = Vec::with_capacity(n as usize);
            (&mut reader).take(n).read_to_end(&mut buf).map_err(|e| DatalakeError::io(local, e))?;
            if buf.len() as u64 != n {
                return Err(DatalakeError::transfer(
                    dest,
                    format!("local file ended after {} of {} bytes", sent + buf.len() as u64, len),
                ));
            }
            if sent == 0 {
                self.create(dest, buf)?;
            } else {
                self.append_block(dest, buf)?;
            }
            sent += n;
        }
        Ok(())
    }

    fn pool(&self, nthreads: usize) -> Result<rayon::ThreadPool> {
        rayon::ThreadPoolBuilder::new()
            .num_threads(nthreads)
            .build()
            .map_err(|e| DatalakeError::Configuration(format!("cannot build transfer pool: {e}")))
    }
}

impl DataLakeFileSystem for WebHdfsFileSystem {
    fn list(&self, path: &str) -> Result<Vec<String>> {
        let dir = normalize_remote(path).trim_end_matches('/');
        let resp = self.call(Method::GET, dir, "LISTSTATUS", &[], None)?;
        let parsed: ListStatusResponse = resp.json().map_err(|e| DatalakeError::service(dir, e))?;
        Ok(parsed
            .file_statuses
            .file_status
            .into_iter()
            .map(|st| if st.path_suffix.is_empty() { dir.to_string() } else { join_remote(dir, &st.path_suffix) })
            .collect())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        match self.file_status(path) {
            Ok(_) => Ok(true),
            Err(DatalakeError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let resp = self.call(Method::GET, path, "OPEN", &[("read", "true".to_string())], None)?;
        resp.bytes().map(|b| b.to_vec()).map_err(|e| DatalakeError::service(path, e))
    }

    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.create(path, data.to_vec())
    }

    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        match self.append_block(path, data.to_vec()) {
            Err(DatalakeError::NotFound(_)) => self.create(path, data.to_vec()),
            other => other,
        }
    }

    fn delete(&self, path: &str) -> Result<()> {
        match self.call(Method::DELETE, path, "DELETE", &[("recursive", "true".to_string())], None) {
            Ok(_) | Err(DatalakeError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn upload_bulk(&self, local: &Path, remote: &str, opts: &TransferOptions) -> Result<()> {
        let remote = normalize_remote(remote);
        let len = fs::metadata(local).map_err(|e| DatalakeError::io(local, e))?.len();
        if !opts.overwrite() && self.exists(remote)? {
            return Err(DatalakeError::AlreadyExists(remote.to_string()));
        }
        let (chunk, block) = (opts.buffer_size() as u64, opts.block_size() as u64);

        if len <= chunk {
            return self.upload_chunk(local, remote, 0, len, block).map_err(into_transfer(remote));
        }

        let nonce = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
        let seg_dir = format!("{remote}{TEMP_MARKER}_segments_{nonce}");
        let ranges = chunk_ranges(len, chunk);
        let segments: Vec<String> = (0..ranges.len()).map(|i| format!("{seg_dir}/{i:06}")).collect();
        tracing::debug!("uploading {} in {} segments under {}", local.display(), ranges.len(), seg_dir);

        let result = self.pool(opts.nthreads())?.install(|| {
            ranges
                .par_iter()
                .zip(segments.par_iter())
                .try_for_each(|(&(off, n), seg)| self.upload_chunk(local, seg, off, n, block))
        });
        let result = result.and_then(|_| {
            self.delete(remote)?;
            let absolute: Vec<String> = segments.iter().map(|s| format!("/{s}")).collect();
            self.concat(remote, &absolute)
        });
        if result.is_err() {
            let _ = self.delete(&seg_dir);
        }
        result.map_err(into_transfer(remote))
    }

    fn download_bulk(&self, remote: &str, local: &Path, opts: &TransferOptions) -> Result<()> {
        let remote = normalize_remote(remote);
        let status = self.file_status(remote)?;
        if status.is_dir() {
            return Err(DatalakeError::transfer(remote, "is a directory"));
        }
        if !opts.overwrite() && local.exists() {
            return Err(DatalakeError::AlreadyExists(local.display().to_string()));
        }
        if let Some(parent) = local.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| DatalakeError::io(parent, e))?;
        }

        let tmp = inprogress_path(local);
        let file = File::create(&tmp).map_err(|e| DatalakeError::io(&tmp, e))?;
        file.set_len(status.length).map_err(|e| DatalakeError::io(&tmp, e))?;
        drop(file);

        let (chunk, block) = (opts.buffer_size() as u64, opts.block_size() as u64);
        let ranges = chunk_ranges(status.length, chunk);
        let result = self.pool(opts.nthreads())?.install(|| {
            ranges
                .par_iter()
                .try_for_each(|&(off, n)| self.download_chunk(remote, &tmp, off, n, block))
        });
        let result = result.and_then(|_| fs::rename(&tmp, local).map_err(|e| DatalakeError::io(local, e)));
        if result.is_err() {
            let _ = fs::remove_file(&tmp);
        }
        result.map_err(into_transfer(remote))
    }
}

fn check(path: &str, resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(DatalakeError::NotFound(path.to_string()));
    }
    let body = resp.text().unwrap_or_default();
    Err(DatalakeError::service(path, format!("{status}: {}", body.trim())))
}

/// Service and local I/O failures during bulk transfer surface as `Transfer`.
fn into_transfer(remote: &str) -> impl Fn(DatalakeError) -> DatalakeError + '_ {
    move |e| match e {
        DatalakeError::Service { message, .. } => DatalakeError::transfer(remote, message),
        DatalakeError::Io { path, source } => DatalakeError::transfer(remote, format!("{}: {source}", path.display())),
        other => other,
    }
}

fn inprogress_path(local: &Path) -> PathBuf {
    let mut name = local.as_os_str().to_owned();
    name.push(".inprogress");
    PathBuf::from(name)
}

/// Split `[0, total)` into consecutive `(offset, len)` ranges of at most `chunk` bytes.
pub(crate) fn chunk_ranges(total: u64, chunk: u64) -> Vec<(u64, u64)> {
    let chunk = chunk.max(1);
    let mut out = Vec::with_capacity((total / chunk + 1) as usize);
    let mut off = 0;
    while off < total {
        let n = chunk.min(total - off);
        out.push((off, n));
        off += n;
    }
    out
}

#![allow(dead_code)]

use datalake_utils::{
    Authenticator, ConfigSource, Credentials, DataLakeFileSystem, DatalakeError, MemoryFileSystem,
    ResolvedCredentials, Result, StorageClient, TransferOptions,
};
use parking_lot::Mutex;
use serde_json::json;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-memory filesystem that remembers which paths were read and which bulk
/// transfers were requested, so tests can assert on delegation.
#[derive(Default)]
pub struct RecordingFs {
    pub inner: MemoryFileSystem,
    pub reads: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<String>>,
    pub downloads: Mutex<Vec<String>>,
}

impl RecordingFs {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().clone()
    }
    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().clone()
    }
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().clone()
    }
}

impl DataLakeFileSystem for RecordingFs {
    fn list(&self, path: &str) -> Result<Vec<String>> {
        self.inner.list(path)
    }
    fn exists(&self, path: &str) -> Result<bool> {
        self.inner.exists(path)
    }
    fn read(&self, path: &str) -> Result<Vec<u8>> {
        self.reads.lock().push(path.to_string());
        self.inner.read(path)
    }
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner.write(path, data)
    }
    fn append(&self, path: &str, data: &[u8]) -> Result<()> {
        self.inner.append(path, data)
    }
    fn delete(&self, path: &str) -> Result<()> {
        self.inner.delete(path)
    }
    fn upload_bulk(&self, local: &Path, remote: &str, opts: &TransferOptions) -> Result<()> {
        self.uploads.lock().push(remote.to_string());
        self.inner.upload_bulk(local, remote, opts)
    }
    fn download_bulk(&self, remote: &str, local: &Path, opts: &TransferOptions) -> Result<()> {
        self.downloads.lock().push(remote.to_string());
        self.inner.download_bulk(remote, local, opts)
    }
}

pub fn client_for(fs: &Arc<RecordingFs>) -> StorageClient {
    StorageClient::from_filesystem("teststore", fs.clone())
}

/// Config source that counts how often it was consulted.
pub struct CountingSource {
    pub creds: Credentials,
    pub calls: AtomicUsize,
}

impl CountingSource {
    pub fn new(creds: Credentials) -> Self {
        Self { creds, calls: AtomicUsize::new(0) }
    }
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ConfigSource for CountingSource {
    fn load(&self) -> Result<Credentials> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.creds.clone())
    }
}

/// Authenticator that accepts one secret and hands out an in-memory filesystem.
pub struct FakeAuth {
    pub accepted_secret: String,
    pub seen: Mutex<Vec<ResolvedCredentials>>,
}

impl FakeAuth {
    pub fn accepting(secret: &str) -> Self {
        Self { accepted_secret: secret.to_string(), seen: Mutex::new(Vec::new()) }
    }
}

impl Authenticator for FakeAuth {
    fn authenticate(&self, credentials: &ResolvedCredentials) -> Result<Arc<dyn DataLakeFileSystem>> {
        self.seen.lock().push(credentials.clone());
        if credentials.client_secret != self.accepted_secret {
            return Err(DatalakeError::Configuration("authentication rejected".into()));
        }
        Ok(Arc::new(MemoryFileSystem::new()))
    }
}

pub fn full_credentials() -> Credentials {
    Credentials {
        store_name: Some("sociallake".into()),
        tenant_id: Some("tenant".into()),
        client_id: Some("client".into()),
        client_secret: Some("secret".into()),
    }
}

/// NDJSON body for the given records, one per line, trailing newline included.
pub fn ndjson(records: &[serde_json::Value]) -> Vec<u8> {
    let mut out = String::new();
    for r in records {
        out.push_str(&r.to_string());
        out.push('\n');
    }
    out.into_bytes()
}

/// Three records, the second of them a retweet.
pub fn social_file(prefix: &str) -> Vec<u8> {
    ndjson(&[
        json!({"content": format!("{prefix} one"), "contentId": format!("{prefix}-1"),
               "connectionType": "post", "authorScreenName": "alice", "lang": "en"}),
        json!({"content": format!("{prefix} rt"), "contentId": format!("{prefix}-2"),
               "connectionType": "retweet", "authorScreenName": "bob", "lang": "en"}),
        json!({"content": format!("{prefix} two"), "contentId": format!("{prefix}-3"),
               "connectionType": "reply", "authorScreenName": "carol", "parentContentId": format!("{prefix}-1")}),
    ])
}

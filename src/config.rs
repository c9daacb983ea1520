use crate::error::{DatalakeError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

pub const STORE_NAME: &str = "STORE_NAME";
pub const TENANT_ID: &str = "TENANT_ID";
pub const CLIENT_ID: &str = "CLIENT_ID";
pub const CLIENT_SECRET: &str = "CLIENT_SECRET";

pub const DEFAULT_ENV_FILE: &str = "/data_science_datalake.env";
pub const SOCIAL_ENV_FILE: &str = "/social_datalake.env";
pub const SCIENCE_STORE: &str = "nkdsdevdatalake";
pub const SOCIAL_STORE: &str = "sociallake";

/// Partially known credentials. Empty strings count as absent.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub store_name: Option<String>,
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("store_name", &self.store_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    pub fn is_complete(&self) -> bool {
        present(&self.store_name).is_some()
            && present(&self.tenant_id).is_some()
            && present(&self.client_id).is_some()
            && present(&self.client_secret).is_some()
    }

    /// Fill every absent field from `fallback`; present fields are kept.
    pub fn or(self, fallback: &Credentials) -> Credentials {
        let pick = |mine: Option<String>, theirs: &Option<String>| {
            present(&mine).map(str::to_string).or_else(|| present(theirs).map(str::to_string))
        };
        Credentials {
            store_name: pick(self.store_name, &fallback.store_name),
            tenant_id: pick(self.tenant_id, &fallback.tenant_id),
            client_id: pick(self.client_id, &fallback.client_id),
            client_secret: pick(self.client_secret, &fallback.client_secret),
        }
    }

    /// Read the four recognized keys through `get`.
    pub fn from_lookup(mut get: impl FnMut(&str) -> Option<String>) -> Credentials {
        Credentials {
            store_name: get(STORE_NAME),
            tenant_id: get(TENANT_ID),
            client_id: get(CLIENT_ID),
            client_secret: get(CLIENT_SECRET),
        }
    }

    /// Fail with `Configuration` naming every missing key.
    pub fn resolve(&self) -> Result<ResolvedCredentials> {
        let mut missing = Vec::new();
        for (key, val) in [
            (STORE_NAME, &self.store_name),
            (TENANT_ID, &self.tenant_id),
            (CLIENT_ID, &self.client_id),
            (CLIENT_SECRET, &self.client_secret),
        ] {
            if present(val).is_none() {
                missing.push(key);
            }
        }
        if !missing.is_empty() {
            return Err(DatalakeError::Configuration(format!(
                "missing credentials: {}",
                missing.join(", ")
            )));
        }
        let get = |v: &Option<String>| present(v).unwrap_or_default().to_string();
        Ok(ResolvedCredentials {
            store_name: get(&self.store_name),
            tenant_id: get(&self.tenant_id),
            client_id: get(&self.client_id),
            client_secret: get(&self.client_secret),
        })
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Credentials with every field known; the input to authentication.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredentials {
    pub store_name: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ResolvedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredentials")
            .field("store_name", &self.store_name)
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Where default credentials come from when explicit ones are incomplete.
pub trait ConfigSource {
    fn load(&self) -> Result<Credentials>;
}

/// Environment-style `KEY=value` file, overlaid by the process environment.
///
/// Snapshots are cached per file path for the life of the process, so the
/// file is read at most once however many clients are created.
#[derive(Clone, Debug)]
pub struct EnvFileSource {
    path: PathBuf,
}

static ENV_SNAPSHOTS: OnceLock<Mutex<HashMap<PathBuf, Credentials>>> = OnceLock::new();

impl EnvFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_file(&self) -> Result<Credentials> {
        let iter = match dotenvy::from_path_iter(&self.path) {
            Ok(iter) => iter,
            Err(e) if e.not_found() => {
                tracing::debug!("env file {} not found; using process environment only", self.path.display());
                return Ok(Credentials::default());
            }
            Err(e) => {
                return Err(DatalakeError::Configuration(format!(
                    "cannot read env file {}: {e}",
                    self.path.display()
                )))
            }
        };
        let mut vars = HashMap::new();
        for item in iter {
            let (k, v) = item.map_err(|e| {
                DatalakeError::Configuration(format!("cannot parse env file {}: {e}", self.path.display()))
            })?;
            vars.insert(k, v);
        }
        Ok(Credentials::from_lookup(|k| vars.get(k).cloned()))
    }
}

impl ConfigSource for EnvFileSource {
    fn load(&self) -> Result<Credentials> {
        let cache = ENV_SNAPSHOTS.get_or_init(|| Mutex::new(HashMap::new()));
        if let Some(hit) = cache.lock().get(&self.path) {
            return Ok(hit.clone());
        }
        let from_file = self.read_file()?;
        let from_env = Credentials::from_lookup(|k| std::env::var(k).ok());
        let snapshot = from_env.or(&from_file);
        tracing::debug!("loaded credential defaults from {}", self.path.display());
        cache.lock().insert(self.path.clone(), snapshot.clone());
        Ok(snapshot)
    }
}

/// User-facing client options with builder chaining.
#[derive(Clone, Debug)]
pub struct ClientOptions {
    pub credentials: Credentials,
    pub env_file: PathBuf,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self { credentials: Credentials::default(), env_file: PathBuf::from(DEFAULT_ENV_FILE) }
    }
}

impl ClientOptions {
    /// Data-science store, defaults read from `/data_science_datalake.env`.
    pub fn science() -> Self {
        Self::default().with_store_name(SCIENCE_STORE)
    }

    /// Social-content store, defaults read from `/social_datalake.env`.
    pub fn social() -> Self {
        Self::default().with_store_name(SOCIAL_STORE).with_env_file(SOCIAL_ENV_FILE)
    }

    pub fn with_store_name(mut self, v: impl Into<String>) -> Self {
        self.credentials.store_name = Some(v.into());
        self
    }
    pub fn with_tenant_id(mut self, v: impl Into<String>) -> Self {
        self.credentials.tenant_id = Some(v.into());
        self
    }
    pub fn with_client_id(mut self, v: impl Into<String>) -> Self {
        self.credentials.client_id = Some(v.into());
        self
    }
    pub fn with_client_secret(mut self, v: impl Into<String>) -> Self {
        self.credentials.client_secret = Some(v.into());
        self
    }
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
    pub fn with_env_file(mut self, path: impl AsRef<Path>) -> Self {
        self.env_file = path.as_ref().to_path_buf();
        self
    }

    /// Explicit values win; `source` is consulted only when something is missing.
    pub fn resolve_with(&self, source: &dyn ConfigSource) -> Result<ResolvedCredentials> {
        if self.credentials.is_complete() {
            return self.credentials.resolve();
        }
        let defaults = source.load()?;
        self.credentials.clone().or(&defaults).resolve()
    }
}

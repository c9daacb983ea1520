mod backend;
mod client;
mod config;
mod date;
mod error;
mod ndjson;
mod paths;
mod progress;
mod record;
mod social;
mod transfer;
mod util;

pub use crate::error::{DatalakeError, Result};

// Credentials and client construction.
pub use crate::config::{
    ClientOptions, ConfigSource, Credentials, EnvFileSource, ResolvedCredentials, DEFAULT_ENV_FILE, SCIENCE_STORE,
    SOCIAL_ENV_FILE, SOCIAL_STORE,
};
pub use crate::client::{create_client, create_client_with, list_datalake_files, FileMode, RemoteFile, StorageClient};

// Storage-service seam and its implementations.
pub use crate::backend::{
    Authenticator, DataLakeFileSystem, MemoryFileSystem, WebHdfsAuthenticator, WebHdfsFileSystem, DATALAKE_RESOURCE,
    DEFAULT_AUTHORITY,
};

// Path resolution.
pub use crate::date::{iter_dates, ReadDate};
pub use crate::paths::{is_temp_file, last_segment, resolve_index_path, streamset_path, DEFAULT_STREAMSET};

// Record decoding.
pub use crate::ndjson::{decode_records, NdjsonWriter, Records};
pub use crate::record::{is_retweet, KeepKeys, Record, CONNECTION_TYPE, SOCIAL_KEEP_KEYS};

// Enumeration.
pub use crate::social::{list_documents_for_date, list_documents_for_range, list_social_indices, SocialDocuments};

// Transfers.
pub use crate::transfer::{
    download_file, download_files, upload_directory, upload_file, upload_files, TransferOptions, DEFAULT_DOWNLOAD_DIR,
    DEFAULT_UPLOAD_DIR,
};
pub use crate::progress::set_global_multiprogress;

pub use crate::util::init_tracing_once;

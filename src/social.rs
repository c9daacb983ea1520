//! Enumeration of social-content records for one index and date partition.
//!
//! Files are visited in listing order. Temp files are skipped by name, and a
//! file that cannot be read or decoded is logged, recorded in `skipped()`, and
//! passed over; only a failure to list the directory itself is fatal.

use crate::client::StorageClient;
use crate::date::{iter_dates, ReadDate};
use crate::error::{DatalakeError, Result};
use crate::ndjson::{decode_records, Records};
use crate::paths::{is_temp_file, resolve_index_path, streamset_path};
use crate::record::{KeepKeys, Record};
use std::collections::VecDeque;

/// Lazy stream of records across the files of one or more date partitions.
pub struct SocialDocuments {
    client: StorageClient,
    pending: VecDeque<String>,
    current: Option<Records>,
    keep_keys: Option<KeepKeys>,
    include_retweets: bool,
    files_read: usize,
    skipped: Vec<(String, DatalakeError)>,
}

impl SocialDocuments {
    fn new(client: &StorageClient, files: Vec<String>, keep_keys: Option<&KeepKeys>, include_retweets: bool) -> Self {
        Self {
            client: client.clone(),
            pending: files.into(),
            current: None,
            keep_keys: keep_keys.cloned(),
            include_retweets,
            files_read: 0,
            skipped: Vec::new(),
        }
    }

    /// Files that failed to open or decode so far, with the reason.
    pub fn skipped(&self) -> &[(String, DatalakeError)] {
        &self.skipped
    }

    /// Files decoded successfully so far.
    pub fn files_read(&self) -> usize {
        self.files_read
    }

    /// Files not yet opened.
    pub fn files_pending(&self) -> usize {
        self.pending.len()
    }

    fn open_next(&mut self) -> Option<Records> {
        while let Some(path) = self.pending.pop_front() {
            if is_temp_file(&path) {
                tracing::debug!("skipping temp file {}", path);
                continue;
            }
            tracing::debug!("reading file {}", path);
            let decoded = self
                .client
                .open_read(&path)
                .and_then(|mut file| file.read_all())
                .and_then(|raw| decode_records(&raw, self.keep_keys.as_ref(), self.include_retweets))
                .map_err(|e| e.with_source_path(&path));
            match decoded {
                Ok(records) => {
                    self.files_read += 1;
                    return Some(records);
                }
                Err(e) => {
                    tracing::warn!("skipping {} after error: {}", path, e);
                    self.skipped.push((path, e));
                }
            }
        }
        None
    }
}

impl Iterator for SocialDocuments {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            if let Some(rec) = self.current.as_mut().and_then(|r| r.next()) {
                return Some(rec);
            }
            self.current = Some(self.open_next()?);
        }
    }
}

/// Every record for `index` on `date` under `streamset`.
///
/// Listing a missing partition fails with `NotFound`; nothing is retried.
/// Per-file failures are reported through `SocialDocuments::skipped`.
pub fn list_documents_for_date<D>(
    client: &StorageClient,
    streamset: &str,
    index: &str,
    date: D,
    keep_keys: Option<&KeepKeys>,
    include_retweets: bool,
) -> Result<SocialDocuments>
where
    D: TryInto<ReadDate>,
    DatalakeError: From<D::Error>,
{
    let dir = resolve_index_path(streamset, index, date)?;
    let files = client.list(&dir)?;
    tracing::info!("found {} files under {}", files.len(), dir);
    Ok(SocialDocuments::new(client, files, keep_keys, include_retweets))
}

/// Records for every day in `[start, end]`. Days with no partition are logged and skipped.
pub fn list_documents_for_range(
    client: &StorageClient,
    streamset: &str,
    index: &str,
    start: ReadDate,
    end: ReadDate,
    keep_keys: Option<&KeepKeys>,
    include_retweets: bool,
) -> Result<SocialDocuments> {
    let mut files = Vec::new();
    for day in iter_dates(start, end) {
        let dir = resolve_index_path(streamset, index, day)?;
        match client.list(&dir) {
            Ok(found) => files.extend(found),
            Err(DatalakeError::NotFound(_)) => tracing::warn!("no partition at {}", dir),
            Err(e) => return Err(e),
        }
    }
    tracing::info!("found {} files for {} between {} and {}", files.len(), index, start, end);
    Ok(SocialDocuments::new(client, files, keep_keys, include_retweets))
}

/// Topic indices available under `streamset`.
pub fn list_social_indices(client: &StorageClient, streamset: &str) -> Result<Vec<String>> {
    client.list(&streamset_path(streamset))
}

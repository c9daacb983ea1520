//! Remote path construction for the social-content hierarchy:
//! `streamsets/{streamset}/{index}/{YYYY-MM-DD}`.

use crate::date::ReadDate;
use crate::error::{DatalakeError, Result};

/// Top-level directory holding every stream-set.
pub const STREAMSETS_ROOT: &str = "streamsets";

/// Default stream-set for production social data.
pub const DEFAULT_STREAMSET: &str = "prod";

/// Marker that flags in-progress or partial writes.
pub const TEMP_MARKER: &str = "_tmp";

/// `streamsets/{streamset}`: the directory whose children are topic indices.
pub fn streamset_path(streamset: &str) -> String {
    format!("{STREAMSETS_ROOT}/{streamset}")
}

/// Directory holding every object written for `index` on `date`.
///
/// `streamset` and `index` are passed through untouched. `date` may be a
/// `time::Date`, a `ReadDate`, or an ISO `YYYY-MM-DD` string; anything else
/// fails with `InvalidArgument`.
pub fn resolve_index_path<D>(streamset: &str, index: &str, date: D) -> Result<String>
where
    D: TryInto<ReadDate>,
    DatalakeError: From<D::Error>,
{
    let date: ReadDate = date.try_into()?;
    Ok(format!("{STREAMSETS_ROOT}/{streamset}/{index}/{date}"))
}

/// Temp files are never decoded.
pub fn is_temp_file(path: &str) -> bool {
    path.contains(TEMP_MARKER)
}

/// Final `/`-separated segment; trailing slashes are ignored.
pub fn last_segment(path: &str) -> &str {
    let trimmed = path.trim_end_matches(['/', '\\']);
    trimmed.rsplit(['/', '\\']).next().unwrap_or(trimmed)
}

/// Join a remote directory and a child name with exactly one `/`.
pub fn join_remote(dir: &str, name: &str) -> String {
    let dir = dir.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if dir.is_empty() {
        name.to_string()
    } else {
        format!("{dir}/{name}")
    }
}

/// Strip leading slashes so every remote path is relative to the store root.
pub fn normalize_remote(path: &str) -> &str {
    path.trim_start_matches('/')
}

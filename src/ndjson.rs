//! Newline-delimited JSON: decoding one remote object into records, and writing records back.

use crate::error::{DatalakeError, Result};
use crate::record::{is_retweet, KeepKeys, Record, CONNECTION_TYPE};
use serde_json::Value;
use std::io::{self, Write};

/// Decode the raw bytes of one remote object.
///
/// Every line is parsed up front, so a bad line fails the whole object with
/// `MalformedRecord` (1-based line number) before anything is yielded. Lines
/// end at `\n`, `\r\n` or a bare `\r`. Blank lines count as bad lines; a
/// trailing terminator does not. With retweets excluded every line must carry a
/// `connectionType` key, though any value is accepted. Retweet exclusion and key
/// projection happen lazily as the returned iterator is consumed.
pub fn decode_records(raw: &[u8], keep_keys: Option<&KeepKeys>, include_retweets: bool) -> Result<Records> {
    let text = std::str::from_utf8(raw)
        .map_err(|e| DatalakeError::malformed(0, format!("content is not UTF-8: {e}")))?;

    let mut rows = Vec::new();
    for (i, line) in split_lines(text).enumerate() {
        let lineno = i + 1;
        if line.trim().is_empty() {
            return Err(DatalakeError::malformed(lineno, "empty line"));
        }
        let row = match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(DatalakeError::malformed(lineno, "line is not a JSON object")),
            Err(e) => return Err(DatalakeError::malformed(lineno, e.to_string())),
        };
        if !include_retweets && !row.contains_key(CONNECTION_TYPE) {
            return Err(DatalakeError::malformed(lineno, format!("`{CONNECTION_TYPE}` missing")));
        }
        rows.push(row);
    }

    Ok(Records {
        rows: rows.into_iter(),
        keep_keys: keep_keys.cloned(),
        include_retweets,
    })
}

/// Lines of `text` split on `\n`, `\r\n` and `\r`, without the terminators.
fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let (line, tail) = match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(i) if rest[i..].starts_with("\r\n") => (&rest[..i], &rest[i + 2..]),
            Some(i) => (&rest[..i], &rest[i + 1..]),
            None => (rest, ""),
        };
        rest = tail;
        Some(line)
    })
}

/// Lazy, finite sequence of filtered records from one decoded object.
#[derive(Debug)]
pub struct Records {
    rows: std::vec::IntoIter<Record>,
    keep_keys: Option<KeepKeys>,
    include_retweets: bool,
}

impl Records {
    /// Rows still pending, before retweet filtering.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl Iterator for Records {
    type Item = Record;

    fn next(&mut self) -> Option<Record> {
        loop {
            let row = self.rows.next()?;
            if !self.include_retweets && is_retweet(&row) {
                continue;
            }
            return Some(match &self.keep_keys {
                Some(keys) => keys.project(row),
                None => row,
            });
        }
    }
}

/// Minimal NDJSON writer over any byte sink.
/// Each record becomes one compact JSON line terminated by `\n`.
pub struct NdjsonWriter<W: Write> {
    w: W,
    written: u64,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(w: W) -> Self {
        Self { w, written: 0 }
    }

    pub fn write_record(&mut self, record: &Record) -> io::Result<()> {
        serde_json::to_writer(&mut self.w, record)?;
        self.w.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.w.flush()?;
        Ok(self.w)
    }
}

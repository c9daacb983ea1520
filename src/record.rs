use ahash::AHashSet;
use serde_json::{Map, Value};

/// One decoded content item: field name -> JSON value.
pub type Record = Map<String, Value>;

/// Field carrying the record type (`post`, `retweet`, ...).
pub const CONNECTION_TYPE: &str = "connectionType";

/// Record type dropped unless retweets are requested.
pub const RETWEET: &str = "retweet";

/// Fields kept from social records by `KeepKeys::social_default`.
pub const SOCIAL_KEEP_KEYS: [&str; 11] = [
    "content",
    "collectedAt",
    "publishedAt",
    "createdAt",
    "contentId",
    "authorScreenName",
    "authorUserId",
    "connectionType",
    "parentScreenName",
    "parentUserId",
    "parentContentId",
];

/// Ordered allow-list of field names used to project records.
#[derive(Clone, Debug, Default)]
pub struct KeepKeys {
    order: Vec<String>,
    lookup: AHashSet<String>,
}

impl KeepKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out = Self::default();
        for k in keys {
            let k = k.into();
            if out.lookup.insert(k.clone()) {
                out.order.push(k);
            }
        }
        out
    }

    pub fn social_default() -> Self {
        Self::new(SOCIAL_KEEP_KEYS)
    }

    #[inline]
    pub fn contains(&self, key: &str) -> bool {
        self.lookup.contains(key)
    }

    pub fn keys(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keep only allowed fields. Allowed keys missing from the record are simply absent.
    pub fn project(&self, record: Record) -> Record {
        record.into_iter().filter(|(k, _)| self.contains(k)).collect()
    }
}

impl<S: Into<String>> FromIterator<S> for KeepKeys {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// True when the record's `connectionType` is `retweet`.
pub fn is_retweet(record: &Record) -> bool {
    record.get(CONNECTION_TYPE).and_then(|v| v.as_str()) == Some(RETWEET)
}

use crate::error::DatalakeError;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use time::macros::format_description;
use time::Date;

/// Calendar day used to address one date partition, rendered as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReadDate(Date);

impl ReadDate {
    pub fn new(date: Date) -> Self {
        Self(date)
    }
    pub fn date(self) -> Date {
        self.0
    }
    pub fn next(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }
    pub fn prev(self) -> Option<Self> {
        self.0.previous_day().map(Self)
    }
}

impl fmt::Display for ReadDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.0.year(), u8::from(self.0.month()), self.0.day())
    }
}

impl FromStr for ReadDate {
    type Err = DatalakeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fmt = format_description!("[year]-[month]-[day]");
        Date::parse(s.trim(), fmt)
            .map(Self)
            .map_err(|e| DatalakeError::InvalidArgument(format!("date {s:?} is not YYYY-MM-DD: {e}")))
    }
}

impl TryFrom<Date> for ReadDate {
    type Error = DatalakeError;
    fn try_from(d: Date) -> Result<Self, Self::Error> {
        Ok(Self(d))
    }
}

impl TryFrom<&str> for ReadDate {
    type Error = DatalakeError;
    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for ReadDate {
    type Error = DatalakeError;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&String> for ReadDate {
    type Error = DatalakeError;
    fn try_from(s: &String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Dynamic input (e.g. a date read from a JSON job description).
/// Only strings are accepted.
impl TryFrom<&Value> for ReadDate {
    type Error = DatalakeError;
    fn try_from(v: &Value) -> Result<Self, Self::Error> {
        match v {
            Value::String(s) => s.parse(),
            other => Err(not_a_date(json_type_name(other))),
        }
    }
}

impl TryFrom<Value> for ReadDate {
    type Error = DatalakeError;
    fn try_from(v: Value) -> Result<Self, Self::Error> {
        ReadDate::try_from(&v)
    }
}

macro_rules! reject_integer {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for ReadDate {
                type Error = DatalakeError;
                fn try_from(_: $t) -> Result<Self, Self::Error> {
                    Err(not_a_date(stringify!($t)))
                }
            }
        )*
    };
}

reject_integer!(i32, i64, u32, u64);

fn not_a_date(kind: &str) -> DatalakeError {
    DatalakeError::InvalidArgument(format!("date must be a string or calendar date, got {kind}"))
}

fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Inclusive iteration from `start` to `end` (if `start` <= `end`), else empty.
pub fn iter_dates(start: ReadDate, end: ReadDate) -> impl Iterator<Item = ReadDate> {
    let mut curr = if start <= end { Some(start) } else { None };
    std::iter::from_fn(move || {
        let ret = curr?;
        curr = ret.next().filter(|n| *n <= end);
        Some(ret)
    })
}

//! Structured key-value fields attached to a single log call

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    /// Encoded as a human-readable string such as `1.5s`
    Duration(Duration),
    /// Display form of an error
    Error(String),
    /// Arbitrary serializable value, already converted to JSON
    Any(serde_json::Value),
    /// A value that could not be converted; encoding an entry carrying it fails
    Unencodable(String),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Duration(d) => write!(f, "{:?}", d),
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Any(v) => write!(f, "{}", v),
            FieldValue::Unencodable(reason) => write!(f, "<unencodable: {}>", reason),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    ///
    /// Returns the failure reason for [`FieldValue::Unencodable`].
    pub fn to_json_value(&self) -> Result<serde_json::Value, &str> {
        Ok(match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Uint(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Duration(d) => serde_json::Value::String(format!("{:?}", d)),
            FieldValue::Error(e) => serde_json::Value::String(e.clone()),
            FieldValue::Any(v) => v.clone(),
            FieldValue::Unencodable(reason) => return Err(reason),
            FieldValue::Null => serde_json::Value::Null,
        })
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::Uint(u)
    }
}

impl From<usize> for FieldValue {
    fn from(u: usize) -> Self {
        FieldValue::Uint(u as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Duration> for FieldValue {
    fn from(d: Duration) -> Self {
        FieldValue::Duration(d)
    }
}

/// A typed key/value pair attached to one log call
///
/// # Example
///
/// ```
/// use layerlog::Field;
/// use std::time::Duration;
///
/// let fields = [
///     Field::string("user", "alice"),
///     Field::int("attempt", 3),
///     Field::duration("elapsed", Duration::from_millis(1500)),
/// ];
/// assert_eq!(fields[2].value.to_string(), "1.5s");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, FieldValue::String(value.into()))
    }

    pub fn int(key: impl Into<String>, value: i64) -> Self {
        Self::new(key, FieldValue::Int(value))
    }

    pub fn uint(key: impl Into<String>, value: u64) -> Self {
        Self::new(key, FieldValue::Uint(value))
    }

    pub fn float(key: impl Into<String>, value: f64) -> Self {
        Self::new(key, FieldValue::Float(value))
    }

    pub fn bool(key: impl Into<String>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn duration(key: impl Into<String>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    /// Bytes rendered as (lossy) UTF-8 text
    pub fn bytes(key: impl Into<String>, value: &[u8]) -> Self {
        Self::new(key, FieldValue::String(String::from_utf8_lossy(value).into_owned()))
    }

    /// An error under the conventional `error` key
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::named_error("error", err)
    }

    pub fn named_error(key: impl Into<String>, err: &dyn std::error::Error) -> Self {
        Self::new(key, FieldValue::Error(err.to_string()))
    }

    /// Any serializable value.
    ///
    /// The conversion happens here; a value serde cannot represent as JSON
    /// produces a field that makes the whole log call fail to encode.
    pub fn any<T: Serialize + ?Sized>(key: impl Into<String>, value: &T) -> Self {
        let value = match serde_json::to_value(value) {
            Ok(json) => FieldValue::Any(json),
            Err(e) => FieldValue::Unencodable(e.to_string()),
        };
        Self::new(key, value)
    }

    pub fn is_encodable(&self) -> bool {
        !matches!(self.value, FieldValue::Unencodable(_))
    }
}

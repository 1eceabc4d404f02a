// Argument Domain Model
// Values bound to a tool call, before they are turned into command-line tokens

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::error::DomainError;

/// Positional arguments, appended verbatim after all option tokens
pub type PosArgs = Vec<String>;

/// A keyword argument value
///
/// `Bool(true)` renders as a bare flag, `Bool(false)` is rejected when the
/// command line is prepared. `List` repeats its flag once per element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn is_flag(&self) -> bool {
        matches!(self, ArgValue::Bool(true))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

/// Parse user-supplied text (e.g. `KEY=VALUE` on a command line)
///
/// Only `true`/`false` are interpreted; everything else is kept as typed so
/// `1.0` or `007` reach the tool unchanged. Never fails.
impl FromStr for ArgValue {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "true" | "True" => ArgValue::Bool(true),
            "false" | "False" => ArgValue::Bool(false),
            _ => ArgValue::Str(s.to_string()),
        })
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<&String> for ArgValue {
    fn from(s: &String) -> Self {
        ArgValue::Str(s.clone())
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(i: i64) -> Self {
        ArgValue::Int(i)
    }
}

impl From<i32> for ArgValue {
    fn from(i: i32) -> Self {
        ArgValue::Int(i64::from(i))
    }
}

impl From<u32> for ArgValue {
    fn from(i: u32) -> Self {
        ArgValue::Int(i64::from(i))
    }
}

impl From<f64> for ArgValue {
    fn from(x: f64) -> Self {
        ArgValue::Float(x)
    }
}

impl From<&Path> for ArgValue {
    fn from(p: &Path) -> Self {
        ArgValue::Str(p.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for ArgValue {
    fn from(p: PathBuf) -> Self {
        ArgValue::from(p.as_path())
    }
}

impl From<&PathBuf> for ArgValue {
    fn from(p: &PathBuf) -> Self {
        ArgValue::from(p.as_path())
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }
}

impl TryFrom<serde_json::Value> for ArgValue {
    type Error = DomainError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        match value {
            Value::Bool(b) => Ok(ArgValue::Bool(b)),
            Value::Number(n) => n
                .as_i64()
                .map(ArgValue::Int)
                .or_else(|| n.as_f64().map(ArgValue::Float))
                .ok_or_else(|| DomainError::InvalidArgument(format!("unsupported number {}", n))),
            Value::String(s) => Ok(ArgValue::Str(s)),
            Value::Array(items) => items
                .into_iter()
                .map(ArgValue::try_from)
                .collect::<Result<Vec<_>, _>>()
                .map(ArgValue::List),
            Value::Null => Err(DomainError::InvalidArgument(
                "null is not a valid argument value".to_string(),
            )),
            Value::Object(_) => Err(DomainError::InvalidArgument(
                "objects are not valid argument values".to_string(),
            )),
        }
    }
}

/// Insertion-ordered keyword arguments
///
/// Re-inserting a key replaces its value but keeps its original position,
/// so merged options come out in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KwArgs(Vec<(String, ArgValue)>);

impl KwArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Option<ArgValue> {
        let key = key.into();
        let value = value.into();

        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<ArgValue> {
        let idx = self.0.iter().position(|(k, _)| k == key)?;
        Some(self.0.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ArgValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    /// Merge `overrides` on top of `self`; colliding keys take the override value
    pub fn merged(&self, overrides: &KwArgs) -> KwArgs {
        let mut out = self.clone();
        for (k, v) in overrides.iter() {
            out.insert(k, v.clone());
        }
        out
    }
}

impl<K: Into<String>, V: Into<ArgValue>> FromIterator<(K, V)> for KwArgs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut kwargs = KwArgs::new();
        for (k, v) in iter {
            kwargs.insert(k, v);
        }
        kwargs
    }
}

impl IntoIterator for KwArgs {
    type Item = (String, ArgValue);
    type IntoIter = std::vec::IntoIter<(String, ArgValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

//! The recursive value model shared by `merge` and `clone`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Also stands for an absent key.
    Null,
    Bool(bool),
    Number(Number),
    String(String),
}

/// A primitive, an ordered sequence or a string-keyed mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum Structure {
    Primitive(Primitive),
    Sequence(Vec<Structure>),
    Mapping(IndexMap<String, Structure>),
}

impl Structure {
    pub const NULL: Structure = Structure::Primitive(Primitive::Null);

    pub fn from_json(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn to_json_pretty(&self) -> String {
        // Value serialization into a String cannot fail
        serde_json::to_string_pretty(&Value::from(self.clone())).unwrap_or_default()
    }

    /// Look up a direct child. Sequences only answer integer-like keys.
    pub fn get(&self, key: &Key) -> Option<&Structure> {
        match self {
            Structure::Sequence(items) => key.as_index().and_then(|i| items.get(i)),
            Structure::Mapping(entries) => entries.get(key.as_name().as_ref()),
            Structure::Primitive(_) => None,
        }
    }

    /// Follow `path` from this node.
    pub fn pointer(&self, path: &[Key]) -> Option<&Structure> {
        path.iter().try_fold(self, |node, key| node.get(key))
    }
}

impl Default for Structure {
    fn default() -> Self {
        Structure::NULL
    }
}

impl From<Value> for Structure {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Structure::NULL,
            Value::Bool(b) => Structure::Primitive(Primitive::Bool(b)),
            Value::Number(n) => Structure::Primitive(Primitive::Number(n)),
            Value::String(s) => Structure::Primitive(Primitive::String(s)),
            Value::Array(items) => Structure::Sequence(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                Structure::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<Structure> for Value {
    fn from(structure: Structure) -> Self {
        match structure {
            Structure::Primitive(Primitive::Null) => Value::Null,
            Structure::Primitive(Primitive::Bool(b)) => Value::Bool(b),
            Structure::Primitive(Primitive::Number(n)) => Value::Number(n),
            Structure::Primitive(Primitive::String(s)) => Value::String(s),
            Structure::Sequence(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            Structure::Mapping(entries) => {
                Value::Object(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<bool> for Structure {
    fn from(b: bool) -> Self {
        Structure::Primitive(Primitive::Bool(b))
    }
}

impl From<i64> for Structure {
    fn from(n: i64) -> Self {
        Structure::Primitive(Primitive::Number(n.into()))
    }
}

impl From<&str> for Structure {
    fn from(s: &str) -> Self {
        Structure::Primitive(Primitive::String(s.to_string()))
    }
}

impl From<String> for Structure {
    fn from(s: String) -> Self {
        Structure::Primitive(Primitive::String(s))
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::from(self.clone()))
    }
}

/// One accessor step of a [`Path`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    /// The sequence slot this key addresses, if it is integer-like.
    ///
    /// Only canonical decimal text counts, so `"01"` and `"+1"` are names.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => {
                let index = name.parse::<usize>().ok()?;
                (index.to_string() == *name).then_some(index)
            }
        }
    }

    /// The mapping key this key addresses.
    pub fn as_name(&self) -> Cow<'_, str> {
        match self {
            Key::Index(i) => Cow::Owned(i.to_string()),
            Key::Name(name) => Cow::Borrowed(name),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "{}", i),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathParseError {
    #[error("Empty segment at position {0} in path")]
    EmptySegment(usize),
}

/// An ordered sequence of keys naming a nested location. Empty means "here".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(Vec<Key>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse dotted text such as `users.0.name`. All-digit segments become indices.
    pub fn parse(input: &str) -> Result<Self, PathParseError> {
        if input.is_empty() {
            return Ok(Self::new());
        }

        input
            .split('.')
            .enumerate()
            .map(|(i, segment)| {
                if segment.is_empty() {
                    return Err(PathParseError::EmptySegment(i));
                }
                let key = Key::Name(segment.to_string());
                Ok(match key.as_index() {
                    Some(index) => Key::Index(index),
                    None => key,
                })
            })
            .collect()
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl Deref for Path {
    type Target = [Key];

    fn deref(&self) -> &[Key] {
        &self.0
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Path(keys)
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Path(iter.into_iter().collect())
    }
}

impl FromStr for Path {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", key)?;
        }
        Ok(())
    }
}

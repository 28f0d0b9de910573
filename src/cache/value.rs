use std::fmt;
use std::hash::{Hash, Hasher};

use crate::cache::Error;

/// Kinds a remote backend accepts as keys.
pub const REMOTE_KEY_KINDS: [Kind; 2] = [Kind::Str, Kind::Bytes];

/// Kinds a remote backend accepts as values.
pub const REMOTE_VALUE_KINDS: [Kind; 4] = [Kind::Str, Kind::Int, Kind::Float, Kind::Bytes];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Kind {
    Str,
    Bytes,
    Int,
    Float,
    Bool,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Kind::Str => "str",
            Kind::Bytes => "bytes",
            Kind::Int => "int",
            Kind::Float => "float",
            Kind::Bool => "bool",
        };
        write!(f, "{name}")
    }
}

/// An opaque scalar held by the cache, either as a key or as a value.
///
/// The in-process backend stores every variant. Remote backends only accept
/// the kinds listed in [`REMOTE_KEY_KINDS`] and [`REMOTE_VALUE_KINDS`], and
/// hand back what they read as [`Value::Str`] (or [`Value::Bytes`] when the
/// stored payload is not UTF-8).
#[derive(Clone, Debug)]
pub enum Value {
    Str(String),
    Bytes(Vec<u8>),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Value {
    pub fn kind(&self) -> Kind {
        match self {
            Value::Str(_) => Kind::Str,
            Value::Bytes(_) => Kind::Bytes,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
            Value::Bool(_) => Kind::Bool,
        }
    }

    /// Normalizes a raw reply from the remote service.
    pub fn from_remote(raw: Vec<u8>) -> Self {
        match String::from_utf8(raw) {
            Ok(text) => Value::Str(text),
            Err(err) => Value::Bytes(err.into_bytes()),
        }
    }

    /// Encodes the value for the remote service, provided its kind is one of `accepted`.
    pub fn to_remote(&self, accepted: &[Kind]) -> Result<Vec<u8>, Error> {
        if !accepted.contains(&self.kind()) {
            return Err(Error::unexpected_type(accepted, self.kind()));
        }

        let encoded = match self {
            Value::Str(text) => text.as_bytes().to_vec(),
            Value::Bytes(bytes) => bytes.clone(),
            Value::Int(number) => number.to_string().into_bytes(),
            Value::Float(number) => number.to_string().into_bytes(),
            Value::Bool(flag) => flag.to_string().into_bytes(),
        };
        Ok(encoded)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            // Bitwise, so that floats can key the in-process map
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            Value::Str(text) => text.hash(state),
            Value::Bytes(bytes) => bytes.hash(state),
            Value::Int(number) => number.hash(state),
            Value::Float(number) => number.to_bits().hash(state),
            Value::Bool(flag) => flag.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Str(text) => write!(f, "{text}"),
            Value::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            Value::Int(number) => write!(f, "{number}"),
            Value::Float(number) => write!(f, "{number}"),
            Value::Bool(flag) => write!(f, "{flag}"),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Str(text)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.to_vec())
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Int(number)
    }
}

impl From<i32> for Value {
    fn from(number: i32) -> Self {
        Value::Int(i64::from(number))
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Float(number)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        Value::Bool(flag)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn test_from_remote_normalizes_utf8() {
        assert_eq!(
            Value::from_remote(b"hello".to_vec()),
            Value::Str("hello".to_string())
        );
        assert_eq!(
            Value::from_remote(vec![0xff, 0xfe]),
            Value::Bytes(vec![0xff, 0xfe])
        );
    }

    #[test]
    fn test_to_remote_encodes_accepted_kinds() {
        assert_eq!(
            Value::from("abc").to_remote(&REMOTE_VALUE_KINDS).unwrap(),
            b"abc".to_vec()
        );
        assert_eq!(
            Value::from(42).to_remote(&REMOTE_VALUE_KINDS).unwrap(),
            b"42".to_vec()
        );
        assert_eq!(
            Value::from(1.5).to_remote(&REMOTE_VALUE_KINDS).unwrap(),
            b"1.5".to_vec()
        );
        assert_eq!(
            Value::from(vec![0, 1]).to_remote(&REMOTE_KEY_KINDS).unwrap(),
            vec![0, 1]
        );
    }

    #[test]
    fn test_to_remote_rejects_other_kinds() {
        let err = Value::from(123).to_remote(&REMOTE_KEY_KINDS).unwrap_err();
        assert_eq!(err.to_string(), "Expected str or bytes but got int");

        let err = Value::from(true).to_remote(&REMOTE_VALUE_KINDS).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected str, int, float or bytes but got bool"
        );
    }

    #[test]
    fn test_values_key_a_hash_map() {
        let mut map = HashMap::new();
        map.insert(Value::from(1.5), "float");
        map.insert(Value::from(1), "int");
        map.insert(Value::from("1"), "str");

        assert_eq!(map.len(), 3);
        assert_eq!(map.get(&Value::Float(1.5)), Some(&"float"));
        assert_eq!(map.get(&Value::Int(1)), Some(&"int"));
        assert_eq!(map.get(&Value::Str("1".to_string())), Some(&"str"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from("text").to_string(), "text");
        assert_eq!(Value::from(vec![0xde, 0xad]).to_string(), "0xdead");
        assert_eq!(Value::from(false).to_string(), "false");
    }
}

//! Request identity: an ordered composite key over heterogeneous parameters.
//!
//! Two identities are equal exactly when their parts are equal element-wise,
//! in order. Each part is normalized on conversion so that equality and
//! hashing never depend on an unstable default hash of the original value.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;

/// One normalized parameter of a logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum IdentityPart {
    /// An absent value (`None`, JSON `null`).
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// IEEE-754 bits of a normalized float (`-0.0` folds to `0.0`, every NaN
    /// to the canonical NaN).
    Float(u64),
    Text(String),
    /// Raw bytes. Only `&[u8]` and [`IdentityPart::bytes`] produce this;
    /// a `Vec<u8>` converts element-wise into a `Seq` of integers.
    Bytes(Vec<u8>),
    /// A nested ordered sequence.
    Seq(Vec<IdentityPart>),
    /// Key/value entries in key order, from a JSON object.
    Map(Vec<(String, IdentityPart)>),
}

impl IdentityPart {
    /// Creates a float part from an `f64`.
    #[must_use]
    pub fn float(value: f64) -> Self {
        let normalized = if value.is_nan() {
            f64::NAN
        } else if value == 0.0 {
            0.0
        } else {
            value
        };
        Self::Float(normalized.to_bits())
    }

    /// Creates a bytes part from any byte container.
    #[must_use]
    pub fn bytes(value: impl AsRef<[u8]>) -> Self {
        Self::Bytes(value.as_ref().to_vec())
    }

    /// Returns true for the absent value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn tag(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) => 2,
            Self::UInt(_) => 3,
            Self::Float(_) => 4,
            Self::Text(_) => 5,
            Self::Bytes(_) => 6,
            Self::Seq(_) => 7,
            Self::Map(_) => 8,
        }
    }

    /// Writes a length-prefixed canonical encoding of this part.
    fn encode_into(&self, hasher: &mut Sha256) {
        hasher.update([self.tag()]);
        match self {
            Self::Null => {}
            Self::Bool(b) => hasher.update([u8::from(*b)]),
            Self::Int(i) => hasher.update(i.to_be_bytes()),
            Self::UInt(u) | Self::Float(u) => hasher.update(u.to_be_bytes()),
            Self::Text(s) => {
                hasher.update((s.len() as u64).to_be_bytes());
                hasher.update(s.as_bytes());
            }
            Self::Bytes(b) => {
                hasher.update((b.len() as u64).to_be_bytes());
                hasher.update(b);
            }
            Self::Seq(parts) => {
                hasher.update((parts.len() as u64).to_be_bytes());
                for part in parts {
                    part.encode_into(hasher);
                }
            }
            Self::Map(entries) => {
                hasher.update((entries.len() as u64).to_be_bytes());
                for (key, value) in entries {
                    hasher.update((key.len() as u64).to_be_bytes());
                    hasher.update(key.as_bytes());
                    value.encode_into(hasher);
                }
            }
        }
    }
}

impl fmt::Display for IdentityPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            Self::Seq(parts) => {
                f.write_str("[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{part}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for IdentityPart {
            fn from(value: $t) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for IdentityPart {
            fn from(value: $t) -> Self {
                Self::UInt(u64::from(value))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64);

impl From<isize> for IdentityPart {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for IdentityPart {
    fn from(value: usize) -> Self {
        Self::UInt(value as u64)
    }
}

impl From<bool> for IdentityPart {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for IdentityPart {
    fn from(value: f32) -> Self {
        Self::float(f64::from(value))
    }
}

impl From<f64> for IdentityPart {
    fn from(value: f64) -> Self {
        Self::float(value)
    }
}

impl From<&str> for IdentityPart {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for IdentityPart {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for IdentityPart {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<&[u8]> for IdentityPart {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl From<()> for IdentityPart {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl<T: Into<IdentityPart>> From<Option<T>> for IdentityPart {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<IdentityPart>> From<Vec<T>> for IdentityPart {
    fn from(values: Vec<T>) -> Self {
        Self::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl From<&Value> for IdentityPart {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(items) => Self::Seq(items.iter().map(Self::from).collect()),
            // serde_json's default map is ordered by key.
            Value::Object(map) => Self::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for IdentityPart {
    fn from(value: Value) -> Self {
        Self::from(&value)
    }
}

/// Ordered composite key identifying one logical request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestIdentity(Vec<IdentityPart>);

impl RequestIdentity {
    /// Creates an identity from already-normalized parts.
    #[must_use]
    pub fn new(parts: Vec<IdentityPart>) -> Self {
        Self(parts)
    }

    /// Creates an identity from any ordered sequence of convertible values.
    pub fn of<I, P>(values: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<IdentityPart>,
    {
        Self(values.into_iter().map(Into::into).collect())
    }

    /// Returns a new identity with `part` appended.
    #[must_use]
    pub fn with(mut self, part: impl Into<IdentityPart>) -> Self {
        self.0.push(part.into());
        self
    }

    /// Returns a new identity with every part of `other` appended.
    #[must_use]
    pub fn extended(mut self, other: &RequestIdentity) -> Self {
        self.0.extend(other.0.iter().cloned());
        self
    }

    /// The ordered parts.
    #[must_use]
    pub fn parts(&self) -> &[IdentityPart] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex SHA-256 over the canonical encoding of the parts.
    ///
    /// Stable across processes and platforms, unlike `std::hash::Hash`.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update((self.0.len() as u64).to_be_bytes());
        for part in &self.0 {
            part.encode_into(&mut hasher);
        }
        hex::encode(hasher.finalize())
    }
}

impl fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

impl<P: Into<IdentityPart>> FromIterator<P> for RequestIdentity {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self::of(iter)
    }
}

/// Computes the identity of an ordered sequence of values.
pub fn identity_of<I, P>(values: I) -> RequestIdentity
where
    I: IntoIterator<Item = P>,
    P: Into<IdentityPart>,
{
    RequestIdentity::of(values)
}

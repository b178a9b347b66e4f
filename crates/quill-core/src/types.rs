use num_bigint::BigUint;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{QuillError, QuillResult};

// ---------------------------------------------------------------------------
// ValueKind: closed set of primitive value shapes
// ---------------------------------------------------------------------------

/// The shape of a [`FlatValue`]. Graph nodes declare one of these; the
/// preparator checks values against it with a plain `match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    Bool,
    UInt,
    Bytes,
    Utf8,
    Field,
    Point,
    Signature,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::UInt => write!(f, "uint"),
            ValueKind::Bytes => write!(f, "bytes"),
            ValueKind::Utf8 => write!(f, "utf8"),
            ValueKind::Field => write!(f, "field"),
            ValueKind::Point => write!(f, "point"),
            ValueKind::Signature => write!(f, "signature"),
        }
    }
}

// ---------------------------------------------------------------------------
// CurvePoint: compressed affine point (x plus parity of y)
// ---------------------------------------------------------------------------

/// Compressed curve point. Curve membership is not checked here; point
/// arithmetic belongs to the proof system that consumes the sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CurvePoint {
    pub x: BigUint,
    pub is_odd: bool,
}

// ---------------------------------------------------------------------------
// SignatureParts: Schnorr-style (r, s) pair
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignatureParts {
    pub r: BigUint,
    pub s: BigUint,
}

// ---------------------------------------------------------------------------
// FlatValue: one slot of a prepared sequence
// ---------------------------------------------------------------------------

/// A primitive value flowing through transformation links and ending up in
/// a [`PreparedSequence`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FlatValue {
    Bool(bool),
    UInt(BigUint),
    Bytes(Vec<u8>),
    Utf8(String),
    /// Prime-field element, already reduced by the link that produced it.
    Field(BigUint),
    Point(CurvePoint),
    Signature(SignatureParts),
}

impl FlatValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            FlatValue::Bool(_) => ValueKind::Bool,
            FlatValue::UInt(_) => ValueKind::UInt,
            FlatValue::Bytes(_) => ValueKind::Bytes,
            FlatValue::Utf8(_) => ValueKind::Utf8,
            FlatValue::Field(_) => ValueKind::Field,
            FlatValue::Point(_) => ValueKind::Point,
            FlatValue::Signature(_) => ValueKind::Signature,
        }
    }

    pub fn uint(value: u64) -> Self {
        FlatValue::UInt(BigUint::from(value))
    }

    pub fn field(value: u64) -> Self {
        FlatValue::Field(BigUint::from(value))
    }

    pub fn utf8(value: impl Into<String>) -> Self {
        FlatValue::Utf8(value.into())
    }

    pub fn as_uint(&self) -> Option<&BigUint> {
        match self {
            FlatValue::UInt(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_field(&self) -> Option<&BigUint> {
        match self {
            FlatValue::Field(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FlatValue::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlatValue::Utf8(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FlatValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// JSON rendering used for logs and the CLI. Big integers are decimal
    /// strings, bytes are `0x`-prefixed hex.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{json, Value};
        match self {
            FlatValue::Bool(v) => Value::Bool(*v),
            FlatValue::UInt(v) | FlatValue::Field(v) => Value::String(v.to_str_radix(10)),
            FlatValue::Bytes(v) => Value::String(format!("0x{}", hex::encode(v))),
            FlatValue::Utf8(v) => Value::String(v.clone()),
            FlatValue::Point(p) => json!({ "x": p.x.to_str_radix(10), "isOdd": p.is_odd }),
            FlatValue::Signature(s) => {
                json!({ "r": s.r.to_str_radix(10), "s": s.s.to_str_radix(10) })
            }
        }
    }
}

impl fmt::Display for FlatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlatValue::Bool(v) => write!(f, "{}", v),
            FlatValue::UInt(v) => write!(f, "{}n", v),
            FlatValue::Field(v) => write!(f, "field({})", v),
            FlatValue::Bytes(v) => write!(f, "0x{}", hex::encode(v)),
            FlatValue::Utf8(v) => write!(f, "{:?}", v),
            FlatValue::Point(p) => write!(f, "point(x={}, odd={})", p.x, p.is_odd),
            FlatValue::Signature(s) => write!(f, "sig(r={}, s={})", s.r, s.s),
        }
    }
}

impl Serialize for FlatValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ---------------------------------------------------------------------------
// PreparedSequence: the exact payload that gets hashed, signed or verified
// ---------------------------------------------------------------------------

/// Flat, ordered output of one prepare call. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PreparedSequence {
    values: Vec<FlatValue>,
}

impl PreparedSequence {
    pub fn new(values: Vec<FlatValue>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FlatValue> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[FlatValue] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<FlatValue> {
        self.values
    }

    /// Canonical byte form: every element concatenated in order. Fails if
    /// any element is not `Bytes`, naming its position.
    pub fn to_bytes(&self) -> QuillResult<Vec<u8>> {
        let mut out = Vec::new();
        for (i, value) in self.values.iter().enumerate() {
            match value {
                FlatValue::Bytes(b) => out.extend_from_slice(b),
                other => {
                    return Err(QuillError::Encoding(format!(
                        "element {} is {}, expected bytes",
                        i,
                        other.kind()
                    )))
                }
            }
        }
        Ok(out)
    }

    /// All elements as field elements, in order. Fails on the first
    /// non-field element.
    pub fn fields(&self) -> QuillResult<Vec<BigUint>> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                v.as_field().cloned().ok_or_else(|| {
                    QuillError::Encoding(format!(
                        "element {} is {}, expected field",
                        i,
                        v.kind()
                    ))
                })
            })
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Array(self.values.iter().map(FlatValue::to_json).collect())
    }
}

impl From<Vec<FlatValue>> for PreparedSequence {
    fn from(values: Vec<FlatValue>) -> Self {
        Self::new(values)
    }
}

impl<'a> IntoIterator for &'a PreparedSequence {
    type Item = &'a FlatValue;
    type IntoIter = std::slice::Iter<'a, FlatValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

impl Serialize for PreparedSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

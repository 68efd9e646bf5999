use crate::types::TupleSchema;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One field of a tuple value, positionally matching a `TupleSchema` field.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Num(f64),
    Str(String),
    Tuple(TupleValue),
}

impl FieldValue {
    /// Name of the shape this value holds, for error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Num(_) => "float",
            Self::Str(_) => "string",
            Self::Tuple(_) => "tuple",
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

/// An ordered tuple value.
///
/// Field order mirrors the schema the value was built against; the writer
/// walks both in lockstep, so a value whose shape diverges from its schema is
/// reported as a declarative error when it is written, not silently coerced.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleValue {
    pub fields: Vec<FieldValue>,
}

impl TupleValue {
    pub fn new(fields: Vec<FieldValue>) -> Self {
        Self { fields }
    }

    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }
}

/// A set value, per item shape. Members are distinct and kept in the host's
/// iteration order.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum SetValue {
    Int(Vec<i64>),
    Num(Vec<f64>),
    Str(Vec<String>),
    Tuple {
        schema: TupleSchema,
        members: Vec<TupleValue>,
    },
}

impl SetValue {
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Num(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Tuple { members, .. } => members.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The value column of a map, one entry per key in the key domain's native
/// order. Keys themselves are never written to a row sink, so they are not
/// materialized here.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum MapValues {
    Int(Vec<i64>),
    Num(Vec<f64>),
    Str(Vec<String>),
    Tuple {
        schema: TupleSchema,
        rows: Vec<TupleValue>,
    },
}

/// A map element together with its declared index dimensionality.
///
/// Only `dims == 1` maps can be written; the dimensionality is carried so the
/// writer can reject anything else before touching the row sink.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct MapValue {
    pub dims: usize,
    pub values: MapValues,
}

impl MapValue {
    pub fn one_dim(values: MapValues) -> Self {
        Self { dims: 1, values }
    }
}

/// In-memory value of a model element, the unit the write dispatch consumes.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Int(i64),
    Num(f64),
    Str(String),
    Tuple {
        schema: TupleSchema,
        value: TupleValue,
    },
    Set(SetValue),
    Map(MapValue),
}

impl Element {
    /// Name of the element shape, for error messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Num(_) => "float",
            Self::Str(_) => "string",
            Self::Tuple { .. } => "tuple",
            Self::Set(_) => "set",
            Self::Map(_) => "map",
        }
    }
}

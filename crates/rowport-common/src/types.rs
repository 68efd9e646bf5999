use std::fmt::{self, Display};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The three scalar shapes a row column can hold.
///
/// `Display` renders the names used in model declarations (`int`, `float`,
/// `string`), which is also how they appear in error messages.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Num,
    Str,
}

impl Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::Num => "float",
            Self::Str => "string",
        })
    }
}

/// Declared shape of a model element.
///
/// This is the *definition-side* taxonomy: it describes what an element looks
/// like before any data has been loaded, and is what the reader dispatch
/// matches on. Collections nest through `Box` so arbitrary item shapes can be
/// expressed; which combinations are actually readable is the dispatcher's
/// decision, not this type's.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum ElemType {
    Int,
    Num,
    Str,
    Tuple(TupleSchema),
    Set(Box<ElemType>),
    Array { item: Box<ElemType>, dims: usize },
}

impl ElemType {
    /// Convenience constructor for a set of `item`.
    pub fn set_of(item: ElemType) -> Self {
        Self::Set(Box::new(item))
    }

    /// Convenience constructor for an array of `item` with `dims` dimensions.
    pub fn array_of(item: ElemType, dims: usize) -> Self {
        Self::Array {
            item: Box::new(item),
            dims,
        }
    }

    /// The scalar kind of this type, if it is a scalar.
    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Self::Int => Some(ScalarKind::Int),
            Self::Num => Some(ScalarKind::Num),
            Self::Str => Some(ScalarKind::Str),
            _ => None,
        }
    }
}

impl Display for ElemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Num => write!(f, "float"),
            Self::Str => write!(f, "string"),
            Self::Tuple(schema) => {
                write!(f, "tuple {{")?;
                for (i, field) in schema.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} {}", field.ty, field.name)?;
                }
                write!(f, "}}")
            }
            Self::Set(item) => write!(f, "{{{item}}}"),
            Self::Array { item, dims } => {
                write!(f, "{item}")?;
                for _ in 0..*dims {
                    write!(f, "[]")?;
                }
                Ok(())
            }
        }
    }
}

/// One named field of a tuple schema.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct TupleField {
    pub name: String,
    pub ty: ElemType,
}

impl TupleField {
    pub fn new(name: impl Into<String>, ty: ElemType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// An ordered, named record shape.
///
/// Fields are scalars or nested tuples; the flattener rejects anything else
/// when it walks the schema. Field order is significant: it is the traversal
/// order used for positional column binding and for tuple writing.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TupleSchema {
    pub fields: Vec<TupleField>,
}

impl TupleSchema {
    pub fn new(fields: Vec<TupleField>) -> Self {
        Self { fields }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

//! Shared taxonomy for the rowport marshalling engine.
//!
//! This crate holds the two vocabularies every other layer speaks:
//!
//! - **`ElemType`** : the declared shape of a model element (scalars, nested
//!   tuples, sets, arrays) as seen by the *read* side,
//! - **`Element`**  : the in-memory value of a model element (scalars, tuple
//!   values, sets, one-dimensional maps) as seen by the *write* side.
//!
//! Nothing in here performs I/O; the engine crate (`rowport`) consumes these
//! types when flattening tuple schemas and dispatching typed reads/writes.

mod types;
mod value;

pub use types::{ElemType, ScalarKind, TupleField, TupleSchema};
pub use value::{Element, FieldValue, MapValue, MapValues, SetValue, TupleValue};

//! Schema flattener: nested tuple shapes to a linear slot sequence.
//!
//! A tuple schema of arbitrary nesting depth is walked depth-first into an
//! ordered [`FieldSpec`] stream: one leaf per scalar field, `Start`/`End`
//! markers bracketing each nested tuple. The stream is built once per
//! distinct shape and reused for every row, both when reading (driving a
//! [`DataHandler`]) and when writing (driving the tuple writer in the export
//! dispatch).

use rustc_hash::FxHashMap;

use rowport_common::{ElemType, ScalarKind, TupleSchema};

use crate::error::BridgeError;
use crate::traits::{ColumnMeta, DataHandler, InputRows};

/// Separator used when building fully qualified names of nested fields.
const SEP: &str = ".";

/// One slot of a flattened tuple shape.
///
/// Leaves carry the dotted path from the root and the bound column index;
/// `Start`/`End` bracket a nested tuple and never consume a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldSpec {
    Int { name: String, column: usize },
    Num { name: String, column: usize },
    Str { name: String, column: usize },
    Start,
    End,
}

/// Unbound slot produced by the schema walk, before columns are assigned.
#[derive(Debug)]
enum Slot {
    Leaf { kind: ScalarKind, name: String },
    Start,
    End,
}

/// Flattened tuple descriptor: the ordered slot sequence plus the nesting
/// depth recorded for the writer's preallocated frame stack.
#[derive(Debug, Clone)]
pub struct TupleIo {
    fields: Vec<FieldSpec>,
    depth: usize,
}

impl TupleIo {
    /// Flatten `schema` and bind leaves positionally in traversal order.
    pub fn positional(schema: &TupleSchema) -> Result<Self, BridgeError> {
        Self::build(schema, None)
    }

    /// Flatten `schema` and bind leaves against `meta`.
    ///
    /// If `meta` names every column (checked by requiring the i-th named
    /// column to be the i-th one encountered), each leaf is bound by matching
    /// its dotted name; otherwise binding falls back to positional.
    pub fn with_columns(schema: &TupleSchema, meta: &dyn ColumnMeta) -> Result<Self, BridgeError> {
        Self::build(schema, Some(meta))
    }

    fn build(schema: &TupleSchema, meta: Option<&dyn ColumnMeta>) -> Result<Self, BridgeError> {
        let mut slots = Vec::new();
        let mut depth = 0;
        flatten(schema, "", 0, &mut slots, &mut depth)?;

        // Named binding applies only when every column carries a name.
        let mut name_to_index: FxHashMap<String, usize> = FxHashMap::default();
        if let Some(meta) = meta {
            for i in 0..meta.column_count() {
                match meta.column_name(i) {
                    Some(name) if !name.is_empty() => {
                        if name_to_index.len() != i {
                            return Err(BridgeError::MixedColumnNaming);
                        }
                        name_to_index.insert(name.to_string(), i);
                    }
                    _ => {}
                }
            }
            if !name_to_index.is_empty() && name_to_index.len() != meta.column_count() {
                return Err(BridgeError::MixedColumnNaming);
            }
        }

        let mut fields = Vec::with_capacity(slots.len());
        let mut next_column = 0;
        for slot in slots {
            let spec = match slot {
                Slot::Start => FieldSpec::Start,
                Slot::End => FieldSpec::End,
                Slot::Leaf { kind, name } => {
                    let column = if name_to_index.is_empty() {
                        let column = next_column;
                        next_column += 1;
                        column
                    } else {
                        *name_to_index
                            .get(&name)
                            .ok_or_else(|| BridgeError::UnboundField { name: name.clone() })?
                    };
                    match kind {
                        ScalarKind::Int => FieldSpec::Int { name, column },
                        ScalarKind::Num => FieldSpec::Num { name, column },
                        ScalarKind::Str => FieldSpec::Str { name, column },
                    }
                }
            };
            fields.push(spec);
        }

        Ok(Self { fields, depth })
    }

    /// The ordered slot sequence.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Maximum nesting depth of sub-tuples, known at flatten time.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Fill the current tuple from one row of `input`.
    ///
    /// Drives `handler` through begin-tuple, one push or bracket per slot,
    /// end-tuple. Consumes exactly one (already advanced-to) row.
    pub fn assign(
        &self,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError> {
        handler.start_tuple()?;
        for field in &self.fields {
            match field {
                FieldSpec::Int { column, .. } => handler.add_int(input.get_int(*column)?)?,
                FieldSpec::Num { column, .. } => handler.add_num(input.get_num(*column)?)?,
                FieldSpec::Str { column, .. } => handler.add_str(&input.get_str(*column)?)?,
                FieldSpec::Start => handler.start_tuple()?,
                FieldSpec::End => handler.end_tuple()?,
            }
        }
        handler.end_tuple()
    }

    /// Read a single tuple element named `name` from `input`.
    pub fn read(
        &self,
        name: &str,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError> {
        handler.start_element(name)?;
        if !input.advance()? {
            return Err(BridgeError::NoData {
                name: name.to_string(),
            });
        }
        self.assign(handler, input)?;
        handler.end_element()
    }
}

/// Depth-first walk of `schema`, emitting slots and tracking nesting depth.
fn flatten(
    schema: &TupleSchema,
    prefix: &str,
    level: usize,
    out: &mut Vec<Slot>,
    max_depth: &mut usize,
) -> Result<(), BridgeError> {
    for field in &schema.fields {
        let name = format!("{prefix}{}", field.name);
        match &field.ty {
            ElemType::Int => out.push(Slot::Leaf {
                kind: ScalarKind::Int,
                name,
            }),
            ElemType::Num => out.push(Slot::Leaf {
                kind: ScalarKind::Num,
                name,
            }),
            ElemType::Str => out.push(Slot::Leaf {
                kind: ScalarKind::Str,
                name,
            }),
            ElemType::Tuple(nested) => {
                out.push(Slot::Start);
                *max_depth = (*max_depth).max(level + 1);
                let nested_prefix = format!("{name}{SEP}");
                flatten(nested, &nested_prefix, level + 1, out, max_depth)?;
                out.push(Slot::End);
            }
            other => {
                return Err(BridgeError::UnsupportedTupleField {
                    name,
                    ty: other.to_string(),
                });
            }
        }
    }
    Ok(())
}

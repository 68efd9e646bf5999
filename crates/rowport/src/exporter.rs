//! Typed writer dispatch: iterate an in-memory element's values and drive
//! row production through an [`OutputRows`] sink.
//!
//! Mirrors the reader dispatch. Each member of the element produces one row
//! (scalars at column 0, tuples through the flattened slot sequence); the row
//! is marked complete after every member and the sink is committed exactly
//! once after the whole iteration. An empty collection therefore writes zero
//! rows but still commits.

use smallvec::SmallVec;

use rowport_common::{Element, FieldValue, MapValue, MapValues, SetValue, TupleSchema, TupleValue};

use crate::error::BridgeError;
use crate::traits::OutputRows;
use crate::tuple_io::{FieldSpec, TupleIo};

/// Writer for tuple values, walking the same slot sequence the flattener
/// produced for the shape. Write-then-read round trips therefore use
/// identical slot ordering on both sides.
pub struct TupleWriter {
    io: TupleIo,
}

/// Traversal frame: the parent value and the field index to resume at after
/// the matching `End`.
struct Frame<'a> {
    parent: &'a TupleValue,
    resume: usize,
}

impl TupleWriter {
    /// Flatten `schema` with positional binding; output slots are always
    /// consumed left to right.
    pub fn new(schema: &TupleSchema) -> Result<Self, BridgeError> {
        Ok(Self {
            io: TupleIo::positional(schema)?,
        })
    }

    /// Write one tuple value as one output row.
    pub fn write(
        &self,
        value: &TupleValue,
        output: &mut dyn OutputRows,
    ) -> Result<(), BridgeError> {
        // Depth is known at flatten time, so the frame stack never reallocates.
        let mut frames: SmallVec<[Frame<'_>; 4]> = SmallVec::with_capacity(self.io.depth());
        let mut current = value;
        let mut column = 0;
        let mut field_idx = 0;

        for spec in self.io.fields() {
            match spec {
                FieldSpec::Int { name, .. } => {
                    match current.field(field_idx) {
                        Some(FieldValue::Int(v)) => output.set_int(column, *v)?,
                        _ => return Err(mismatch(name, "int")),
                    }
                    column += 1;
                    field_idx += 1;
                }
                FieldSpec::Num { name, .. } => {
                    match current.field(field_idx) {
                        Some(FieldValue::Num(v)) => output.set_num(column, *v)?,
                        _ => return Err(mismatch(name, "float")),
                    }
                    column += 1;
                    field_idx += 1;
                }
                FieldSpec::Str { name, .. } => {
                    match current.field(field_idx) {
                        Some(FieldValue::Str(v)) => output.set_str(column, v)?,
                        _ => return Err(mismatch(name, "string")),
                    }
                    column += 1;
                    field_idx += 1;
                }
                FieldSpec::Start => {
                    let nested = match current.field(field_idx) {
                        Some(FieldValue::Tuple(nested)) => nested,
                        _ => return Err(mismatch("<sub-tuple>", "tuple")),
                    };
                    frames.push(Frame {
                        parent: current,
                        resume: field_idx,
                    });
                    current = nested;
                    field_idx = 0;
                }
                FieldSpec::End => {
                    let frame = frames
                        .pop()
                        .ok_or_else(|| mismatch("<sub-tuple>", "tuple"))?;
                    current = frame.parent;
                    field_idx = frame.resume + 1;
                }
            }
        }
        Ok(())
    }
}

fn mismatch(field: &str, expected: &'static str) -> BridgeError {
    BridgeError::FieldMismatch {
        field: field.to_string(),
        expected,
    }
}

/// Write the element `name` to `output`, one row per member.
///
/// Dispatch is exhaustive over the element's shape; unsupported map
/// dimensionality is rejected before anything is written.
pub fn export_element(
    name: &str,
    elem: &Element,
    output: &mut dyn OutputRows,
) -> Result<(), BridgeError> {
    match elem {
        Element::Int(v) => {
            output.set_int(0, *v)?;
            output.complete_row()?;
        }
        Element::Num(v) => {
            output.set_num(0, *v)?;
            output.complete_row()?;
        }
        Element::Str(v) => {
            output.set_str(0, v)?;
            output.complete_row()?;
        }
        Element::Tuple { schema, value } => {
            let writer = TupleWriter::new(schema)?;
            writer.write(value, output)?;
            output.complete_row()?;
        }
        Element::Set(set) => write_set(set, output)?,
        Element::Map(map) => write_map(name, map, output)?,
    }
    output.commit()
}

fn write_set(set: &SetValue, output: &mut dyn OutputRows) -> Result<(), BridgeError> {
    match set {
        SetValue::Int(members) => {
            for v in members {
                output.set_int(0, *v)?;
                output.complete_row()?;
            }
        }
        SetValue::Num(members) => {
            for v in members {
                output.set_num(0, *v)?;
                output.complete_row()?;
            }
        }
        SetValue::Str(members) => {
            for v in members {
                output.set_str(0, v)?;
                output.complete_row()?;
            }
        }
        SetValue::Tuple { schema, members } => {
            // One writer for the whole set; every member shares the shape.
            let writer = TupleWriter::new(schema)?;
            for member in members {
                writer.write(member, output)?;
                output.complete_row()?;
            }
        }
    }
    Ok(())
}

fn write_map(name: &str, map: &MapValue, output: &mut dyn OutputRows) -> Result<(), BridgeError> {
    if map.dims != 1 {
        return Err(BridgeError::UnsupportedDimension {
            name: name.to_string(),
            dims: map.dims,
        });
    }
    match &map.values {
        MapValues::Int(values) => {
            for v in values {
                output.set_int(0, *v)?;
                output.complete_row()?;
            }
        }
        MapValues::Num(values) => {
            for v in values {
                output.set_num(0, *v)?;
                output.complete_row()?;
            }
        }
        MapValues::Str(values) => {
            for v in values {
                output.set_str(0, v)?;
                output.complete_row()?;
            }
        }
        MapValues::Tuple { schema, rows } => {
            let writer = TupleWriter::new(schema)?;
            for row in rows {
                writer.write(row, output)?;
                output.complete_row()?;
            }
        }
    }
    Ok(())
}

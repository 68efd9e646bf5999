//! Typed reader dispatch: pick a read strategy from an element's declared
//! type and drive row consumption into a [`DataHandler`].
//!
//! Dispatch is an exhaustive match over [`ElemType`], recursing on item types
//! for collections. Unsupported shape combinations fail declaratively before
//! a single row is consumed. Reading streams: memory use is bounded by row
//! width plus nesting depth, never by row count.

use rowport_common::{ElemType, ScalarKind};

use crate::error::BridgeError;
use crate::traits::{DataHandler, InputRows};
use crate::tuple_io::TupleIo;

/// Collection bracketing: sets collapse duplicates on the handler side,
/// arrays preserve row order.
#[derive(Debug, Copy, Clone)]
enum Bracket {
    Set,
    Array,
}

impl Bracket {
    fn start(self, handler: &mut dyn DataHandler) -> Result<(), BridgeError> {
        match self {
            Self::Set => handler.start_set(),
            Self::Array => handler.start_array(),
        }
    }

    fn end(self, handler: &mut dyn DataHandler) -> Result<(), BridgeError> {
        match self {
            Self::Set => handler.end_set(),
            Self::Array => handler.end_array(),
        }
    }
}

/// Strategy that fills one element position from the current row.
trait Assign {
    fn assign(
        &self,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError>;
}

/// Scalar at column 0. Extra columns in the row are ignored; declaring a
/// scalar collection against a wider result consumes only the first column.
struct ScalarAssign(ScalarKind);

const INT_READER: ScalarAssign = ScalarAssign(ScalarKind::Int);
const NUM_READER: ScalarAssign = ScalarAssign(ScalarKind::Num);
const STR_READER: ScalarAssign = ScalarAssign(ScalarKind::Str);

impl Assign for ScalarAssign {
    fn assign(
        &self,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError> {
        match self.0 {
            ScalarKind::Int => handler.add_int(input.get_int(0)?),
            ScalarKind::Num => handler.add_num(input.get_num(0)?),
            ScalarKind::Str => handler.add_str(&input.get_str(0)?),
        }
    }
}

/// The whole current row as one sub-collection: every column becomes one
/// member. Used for row-expanded shapes (set of sets, array of arrays, ...).
struct RowAssign {
    kind: ScalarKind,
    bracket: Bracket,
}

impl Assign for RowAssign {
    fn assign(
        &self,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError> {
        self.bracket.start(handler)?;
        let cols = input.column_count()?;
        for i in 0..cols {
            match self.kind {
                ScalarKind::Int => handler.add_int(input.get_int(i)?)?,
                ScalarKind::Num => handler.add_num(input.get_num(i)?)?,
                ScalarKind::Str => handler.add_str(&input.get_str(i)?)?,
            }
        }
        self.bracket.end(handler)
    }
}

impl Assign for TupleIo {
    fn assign(
        &self,
        handler: &mut dyn DataHandler,
        input: &mut dyn InputRows,
    ) -> Result<(), BridgeError> {
        TupleIo::assign(self, handler, input)
    }
}

/// Single-element read: exactly one row, bracketed by the element markers.
fn read_single(
    name: &str,
    assign: &dyn Assign,
    handler: &mut dyn DataHandler,
    input: &mut dyn InputRows,
) -> Result<(), BridgeError> {
    handler.start_element(name)?;
    if !input.advance()? {
        return Err(BridgeError::NoData {
            name: name.to_string(),
        });
    }
    assign.assign(handler, input)?;
    handler.end_element()
}

/// Collection read: one assign per row until the source is exhausted.
fn read_collection(
    name: &str,
    bracket: Bracket,
    assign: &dyn Assign,
    handler: &mut dyn DataHandler,
    input: &mut dyn InputRows,
) -> Result<(), BridgeError> {
    handler.start_element(name)?;
    bracket.start(handler)?;
    while input.advance()? {
        assign.assign(handler, input)?;
    }
    bracket.end(handler)?;
    handler.end_element()
}

fn unreadable(name: &str, ty: &ElemType) -> BridgeError {
    BridgeError::UnreadableElement {
        name: name.to_string(),
        ty: ty.to_string(),
    }
}

fn scalar_reader(kind: ScalarKind) -> &'static ScalarAssign {
    match kind {
        ScalarKind::Int => &INT_READER,
        ScalarKind::Num => &NUM_READER,
        ScalarKind::Str => &STR_READER,
    }
}

/// Read a collection whose per-row strategy depends on the item type.
fn read_items(
    name: &str,
    whole: &ElemType,
    bracket: Bracket,
    item: &ElemType,
    handler: &mut dyn DataHandler,
    input: &mut dyn InputRows,
) -> Result<(), BridgeError> {
    match item {
        ElemType::Int | ElemType::Num | ElemType::Str => {
            let kind = match item {
                ElemType::Int => ScalarKind::Int,
                ElemType::Num => ScalarKind::Num,
                _ => ScalarKind::Str,
            };
            read_collection(name, bracket, scalar_reader(kind), handler, input)
        }
        ElemType::Tuple(schema) => {
            let io = input.tuple_io(schema)?;
            read_collection(name, bracket, &io, handler, input)
        }
        ElemType::Set(sub) => match sub.as_scalar() {
            Some(kind) => read_collection(
                name,
                bracket,
                &RowAssign {
                    kind,
                    bracket: Bracket::Set,
                },
                handler,
                input,
            ),
            None => Err(unreadable(name, whole)),
        },
        ElemType::Array { item: sub, .. } => match sub.as_scalar() {
            Some(kind) => read_collection(
                name,
                bracket,
                &RowAssign {
                    kind,
                    bracket: Bracket::Array,
                },
                handler,
                input,
            ),
            None => Err(unreadable(name, whole)),
        },
    }
}

/// Fill the element `name` of declared type `ty` from `input`.
///
/// The strategy is chosen before any row is consumed; shapes the row model
/// cannot express are rejected here with a declarative error.
pub fn read_element(
    name: &str,
    ty: &ElemType,
    handler: &mut dyn DataHandler,
    input: &mut dyn InputRows,
) -> Result<(), BridgeError> {
    match ty {
        ElemType::Int => read_single(name, &INT_READER, handler, input),
        ElemType::Num => read_single(name, &NUM_READER, handler, input),
        ElemType::Str => read_single(name, &STR_READER, handler, input),
        ElemType::Tuple(schema) => {
            let io = input.tuple_io(schema)?;
            io.read(name, handler, input)
        }
        ElemType::Set(item) => read_items(name, ty, Bracket::Set, item, handler, input),
        ElemType::Array { item, dims } => match dims {
            1 => read_items(name, ty, Bracket::Array, item, handler, input),
            // A two-dimensional array reads each row as one inner array.
            2 => match item.as_scalar() {
                Some(kind) => read_collection(
                    name,
                    Bracket::Array,
                    &RowAssign {
                        kind,
                        bracket: Bracket::Array,
                    },
                    handler,
                    input,
                ),
                None => Err(unreadable(name, ty)),
            },
            _ => Err(unreadable(name, ty)),
        },
    }
}

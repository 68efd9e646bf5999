//! Seams between the marshalling engine and its collaborators.
//!
//! Backends implement the row-iterator side ([`InputRows`], [`OutputRows`],
//! [`DataConnection`], [`ConnectionFactory`]); the host implements the
//! structured-data side ([`DataHandler`], [`SchemaSource`], [`ElementSource`]).
//! The engine itself owns none of these: it only drives them.

use rowport_common::{Element, ElemType, TupleSchema};

use crate::error::BridgeError;
use crate::tuple_io::TupleIo;

/// Positional read access to one tabular row source.
///
/// An iterator starts *before* the first row. Calling a getter before
/// [`advance`](Self::advance) has been called, or after it returned `false`,
/// is undefined behavior as far as this contract is concerned; implementations
/// are free to return an error. Getters must validate the column index against
/// `[0, column_count)` and fail naming the offending index.
pub trait InputRows {
    /// Get the `index`-th column of the current row as an integer.
    fn get_int(&mut self, index: usize) -> Result<i64, BridgeError>;
    /// Get the `index`-th column of the current row as a float.
    fn get_num(&mut self, index: usize) -> Result<f64, BridgeError>;
    /// Get the `index`-th column of the current row as a string.
    fn get_str(&mut self, index: usize) -> Result<String, BridgeError>;

    /// Move to the next row. Returns `false` once the source is exhausted.
    fn advance(&mut self) -> Result<bool, BridgeError>;

    /// Number of columns in the current row.
    fn column_count(&mut self) -> Result<usize, BridgeError>;

    /// Release all resources held by this iterator.
    fn close(&mut self) -> Result<(), BridgeError>;

    /// Build a tuple descriptor for `schema` against this source.
    ///
    /// Sources that expose column names override this to bind tuple fields by
    /// name; the default binds positionally in traversal order.
    fn tuple_io(&mut self, schema: &TupleSchema) -> Result<TupleIo, BridgeError> {
        TupleIo::positional(schema)
    }
}

/// Positional write access to one tabular row sink.
pub trait OutputRows {
    /// Set the `index`-th column of the current row to an integer.
    fn set_int(&mut self, index: usize, value: i64) -> Result<(), BridgeError>;
    /// Set the `index`-th column of the current row to a float.
    fn set_num(&mut self, index: usize, value: f64) -> Result<(), BridgeError>;
    /// Set the `index`-th column of the current row to a string.
    fn set_str(&mut self, index: usize, value: &str) -> Result<(), BridgeError>;

    /// Mark the current row as complete; no more columns will be set on it.
    fn complete_row(&mut self) -> Result<(), BridgeError>;

    /// Commit everything written so far. Batching, if any, is the backend's
    /// business; the dispatcher calls this exactly once per element.
    fn commit(&mut self) -> Result<(), BridgeError>;

    /// Release all resources held by this iterator.
    fn close(&mut self) -> Result<(), BridgeError>;
}

/// Column-name metadata a row source may expose for name-based binding.
pub trait ColumnMeta {
    fn column_count(&self) -> usize;
    /// Name of the zero-based column, or `None` when the column is unnamed.
    fn column_name(&self, index: usize) -> Option<&str>;
}

/// A connection to one external data source or sink.
///
/// Provides a simple table-oriented view on the medium; the engine never sees
/// anything of the backend beyond this.
pub trait DataConnection {
    /// Open a row source described by `spec` (a query, a range, a table name).
    fn open_input_rows(&mut self, spec: &str) -> Result<Box<dyn InputRows>, BridgeError>;
    /// Open a row sink described by `spec` (an update statement, a range).
    fn open_output_rows(&mut self, spec: &str) -> Result<Box<dyn OutputRows>, BridgeError>;
    /// Close this connection.
    fn close(&mut self) -> Result<(), BridgeError>;
}

/// Which phase a connection is being opened for.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OpenMode {
    Read,
    Write,
}

/// Factory that turns declared connection info into a live connection.
///
/// When `mode` is [`OpenMode::Write`] the factory must run the declared setup
/// statements (ordered, semicolon-separated) as part of the open transition;
/// the bridge opens each connection at most once per phase, so this gives the
/// exactly-once guarantee.
pub trait ConnectionFactory {
    fn connect(
        &mut self,
        info: &crate::bridge::ConnectionInfo,
        mode: OpenMode,
    ) -> Result<Box<dyn DataConnection>, BridgeError>;
}

/// Structured-data builder the read dispatch drives.
///
/// Calls arrive strictly nested: element brackets outermost, then collection
/// or tuple brackets, then scalar items.
pub trait DataHandler {
    fn start_element(&mut self, name: &str) -> Result<(), BridgeError>;
    fn end_element(&mut self) -> Result<(), BridgeError>;

    fn start_tuple(&mut self) -> Result<(), BridgeError>;
    fn end_tuple(&mut self) -> Result<(), BridgeError>;

    fn start_set(&mut self) -> Result<(), BridgeError>;
    fn end_set(&mut self) -> Result<(), BridgeError>;

    fn start_array(&mut self) -> Result<(), BridgeError>;
    fn end_array(&mut self) -> Result<(), BridgeError>;

    fn add_int(&mut self, value: i64) -> Result<(), BridgeError>;
    fn add_num(&mut self, value: f64) -> Result<(), BridgeError>;
    fn add_str(&mut self, value: &str) -> Result<(), BridgeError>;
}

/// Lookup of declared element types, consumed by manifest-driven reads.
pub trait SchemaSource {
    fn element_type(&self, name: &str) -> Option<&ElemType>;
}

/// Lookup of in-memory element values, consumed by the finalize phase.
pub trait ElementSource {
    fn element(&self, name: &str) -> Option<&Element>;
}

impl SchemaSource for std::collections::BTreeMap<String, ElemType> {
    fn element_type(&self, name: &str) -> Option<&ElemType> {
        self.get(name)
    }
}

impl ElementSource for std::collections::BTreeMap<String, Element> {
    fn element(&self, name: &str) -> Option<&Element> {
        self.get(name)
    }
}

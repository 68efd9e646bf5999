//! rowport: marshalling between a modeling runtime's structured elements and
//! row-oriented external data.
//!
//! The engine has three moving parts, all synchronous and single-threaded:
//!
//! - [`TupleIo`] flattens a nested tuple schema into an ordered slot sequence
//!   bindable to row columns, by name or by position;
//! - [`importer::read_element`] / [`exporter::export_element`] pick a typed
//!   strategy from an element's shape and stream rows through it;
//! - [`DataBridge`] tracks declared connections, opens them lazily per phase,
//!   queues publishes for the finalize pass, and guarantees cleanup under
//!   failure.
//!
//! Concrete backends live behind the [`traits`] seam; the crate ships an
//! in-memory one (`backends::mem`, feature `mem`) for tests and embedders.

pub mod backends;
pub mod bridge;
pub mod error;
pub mod exporter;
pub mod importer;
#[cfg(feature = "manifest")]
pub mod manifest;
pub mod traits;
pub mod tuple_io;

pub use bridge::{ConnectionInfo, DataBridge, PendingPublish};
pub use error::{BridgeError, ErrorKind};
pub use exporter::{TupleWriter, export_element};
pub use importer::read_element;
#[cfg(feature = "manifest")]
pub use manifest::{ConnectionDecl, Manifest, PublishDecl, ReadDecl};
pub use traits::{
    ColumnMeta, ConnectionFactory, DataConnection, DataHandler, ElementSource, InputRows,
    OpenMode, OutputRows, SchemaSource,
};
pub use tuple_io::{FieldSpec, TupleIo};

// Re-export for convenience
pub use rowport_common::{
    ElemType, Element, FieldValue, MapValue, MapValues, ScalarKind, SetValue, TupleField,
    TupleSchema, TupleValue,
};

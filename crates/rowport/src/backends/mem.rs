//! In-memory table backend.
//!
//! One concrete [`DataConnection`] the engine can be exercised against
//! without an external data source. A [`MemStore`] holds named tables (rows
//! of typed cells, with optional column names for name-based tuple binding)
//! plus journals of opens, closes, setup statements, and commits so tests can
//! assert lifecycle behavior after the fact. The store is shared behind
//! `parking_lot::Mutex` purely so it stays observable once connections have
//! consumed it; the engine itself is single-threaded.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use rowport_common::TupleSchema;

use crate::bridge::ConnectionInfo;
use crate::error::BridgeError;
use crate::traits::{
    ColumnMeta, ConnectionFactory, DataConnection, InputRows, OpenMode, OutputRows,
};
use crate::tuple_io::TupleIo;

/// One typed cell of a memory table.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Num(f64),
    Str(String),
}

impl From<i64> for CellValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for CellValue {
    fn from(v: f64) -> Self {
        Self::Num(v)
    }
}

impl From<&str> for CellValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl CellValue {
    /// Integer view. Floats are rejected rather than truncated.
    fn as_int(&self, index: usize) -> Result<i64, BridgeError> {
        match self {
            Self::Int(v) => Ok(*v),
            other => Err(BridgeError::io(format!(
                "column {index} holds {} where int was requested",
                other.kind_name()
            ))),
        }
    }

    /// Float view. Integers widen losslessly.
    fn as_num(&self, index: usize) -> Result<f64, BridgeError> {
        match self {
            Self::Int(v) => Ok(*v as f64),
            Self::Num(v) => Ok(*v),
            other => Err(BridgeError::io(format!(
                "column {index} holds {} where float was requested",
                other.kind_name()
            ))),
        }
    }

    fn as_str(&self, index: usize) -> Result<String, BridgeError> {
        match self {
            Self::Str(v) => Ok(v.clone()),
            other => Err(BridgeError::io(format!(
                "column {index} holds {} where string was requested",
                other.kind_name()
            ))),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "int",
            Self::Num(_) => "float",
            Self::Str(_) => "string",
        }
    }
}

/// A named table: optional column names plus rows of cells. An empty
/// `columns` vector means the table is unnamed and tuple binding falls back
/// to positional.
#[derive(Debug, Clone, Default)]
pub struct MemTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    tables: std::collections::BTreeMap<String, MemTable>,
    setup_log: Vec<String>,
    open_log: Vec<(String, OpenMode)>,
    close_log: Vec<String>,
    commit_log: Vec<String>,
    fail_close: BTreeSet<String>,
}

/// Shared table store behind the memory backend.
#[derive(Debug, Clone, Default)]
pub struct MemStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a table.
    pub fn insert_table(
        &self,
        name: impl Into<String>,
        columns: Vec<&str>,
        rows: Vec<Vec<CellValue>>,
    ) {
        let table = MemTable {
            columns: columns.into_iter().map(|c| c.to_string()).collect(),
            rows,
        };
        self.inner.lock().tables.insert(name.into(), table);
    }

    /// Snapshot of a table, if it exists.
    pub fn table(&self, name: &str) -> Option<MemTable> {
        self.inner.lock().tables.get(name).cloned()
    }

    /// Rows of a table, if it exists.
    pub fn rows(&self, name: &str) -> Option<Vec<Vec<CellValue>>> {
        self.table(name).map(|t| t.rows)
    }

    /// Setup statements executed so far, in execution order.
    pub fn setup_log(&self) -> Vec<String> {
        self.inner.lock().setup_log.clone()
    }

    /// Connection opens `(name, mode)` recorded so far.
    pub fn open_log(&self) -> Vec<(String, OpenMode)> {
        self.inner.lock().open_log.clone()
    }

    /// Connection closes recorded so far.
    pub fn close_log(&self) -> Vec<String> {
        self.inner.lock().close_log.clone()
    }

    /// Number of commits that targeted `table`.
    pub fn commit_count(&self, table: &str) -> usize {
        self.inner
            .lock()
            .commit_log
            .iter()
            .filter(|t| t.as_str() == table)
            .count()
    }

    /// Make `close` fail for the named connection (the attempt is still
    /// journaled).
    pub fn fail_close_of(&self, name: impl Into<String>) {
        self.inner.lock().fail_close.insert(name.into());
    }

    fn record_open(&self, name: &str, mode: OpenMode) {
        self.inner.lock().open_log.push((name.to_string(), mode));
    }

    fn run_setup(&self, statement: &str) {
        self.inner.lock().setup_log.push(statement.to_string());
    }

    fn record_close(&self, name: &str) -> Result<(), BridgeError> {
        let mut inner = self.inner.lock();
        inner.close_log.push(name.to_string());
        if inner.fail_close.contains(name) {
            return Err(BridgeError::io(format!("close failed for {name}")));
        }
        Ok(())
    }

    fn append_rows(&self, table: &str, rows: Vec<Vec<CellValue>>) {
        let mut inner = self.inner.lock();
        inner
            .tables
            .entry(table.to_string())
            .or_default()
            .rows
            .extend(rows);
        inner.commit_log.push(table.to_string());
    }
}

/// Factory that opens [`MemConnection`]s against one shared store.
///
/// Opening for write runs the declared setup statements (split on `;`,
/// trimmed, empties skipped) as part of the open transition, which is what
/// gives the engine its exactly-once setup guarantee.
#[derive(Debug, Clone)]
pub struct MemFactory {
    store: MemStore,
}

impl MemFactory {
    pub fn new(store: MemStore) -> Self {
        Self { store }
    }
}

impl ConnectionFactory for MemFactory {
    fn connect(
        &mut self,
        info: &ConnectionInfo,
        mode: OpenMode,
    ) -> Result<Box<dyn DataConnection>, BridgeError> {
        self.store.record_open(&info.name, mode);
        if mode == OpenMode::Write {
            for statement in info.setup.split(';') {
                let statement = statement.trim();
                if !statement.is_empty() {
                    self.store.run_setup(statement);
                }
            }
        }
        Ok(Box::new(MemConnection {
            name: info.name.clone(),
            store: self.store.clone(),
        }))
    }
}

/// A live connection to the memory store. Input specs and output specs are
/// both plain table names.
#[derive(Debug)]
pub struct MemConnection {
    name: String,
    store: MemStore,
}

impl DataConnection for MemConnection {
    fn open_input_rows(&mut self, spec: &str) -> Result<Box<dyn InputRows>, BridgeError> {
        let table = self
            .store
            .table(spec)
            .ok_or_else(|| BridgeError::io(format!("no table {spec}")))?;
        Ok(Box::new(MemInput::new(table.columns, table.rows)))
    }

    fn open_output_rows(&mut self, spec: &str) -> Result<Box<dyn OutputRows>, BridgeError> {
        let width_hint = self.store.table(spec).and_then(|t| {
            if !t.columns.is_empty() {
                Some(t.columns.len())
            } else {
                t.rows.first().map(|r| r.len())
            }
        });
        Ok(Box::new(MemOutput {
            store: self.store.clone(),
            table: spec.to_string(),
            width_hint,
            current: Vec::new(),
            staged: Vec::new(),
        }))
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        self.store.record_close(&self.name)
    }
}

struct ColumnsMeta<'a>(&'a [String]);

impl ColumnMeta for ColumnsMeta<'_> {
    fn column_count(&self) -> usize {
        self.0.len()
    }
    fn column_name(&self, index: usize) -> Option<&str> {
        let name = self.0[index].as_str();
        if name.is_empty() { None } else { Some(name) }
    }
}

/// Row source over a snapshot of one table.
#[derive(Debug)]
pub struct MemInput {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
    current: Option<usize>,
    next: usize,
}

impl MemInput {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Self {
            columns,
            rows,
            current: None,
            next: 0,
        }
    }

    fn cell(&self, index: usize) -> Result<&CellValue, BridgeError> {
        let row = self
            .current
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| BridgeError::io("no current row"))?;
        row.get(index).ok_or(BridgeError::ColumnOutOfRange {
            index,
            width: row.len(),
        })
    }
}

impl InputRows for MemInput {
    fn get_int(&mut self, index: usize) -> Result<i64, BridgeError> {
        self.cell(index)?.as_int(index)
    }

    fn get_num(&mut self, index: usize) -> Result<f64, BridgeError> {
        self.cell(index)?.as_num(index)
    }

    fn get_str(&mut self, index: usize) -> Result<String, BridgeError> {
        self.cell(index)?.as_str(index)
    }

    fn advance(&mut self) -> Result<bool, BridgeError> {
        if self.next < self.rows.len() {
            self.current = Some(self.next);
            self.next += 1;
            Ok(true)
        } else {
            self.current = None;
            Ok(false)
        }
    }

    fn column_count(&mut self) -> Result<usize, BridgeError> {
        match self.current.and_then(|i| self.rows.get(i)) {
            Some(row) => Ok(row.len()),
            None => Err(BridgeError::io("no current row")),
        }
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        self.current = None;
        self.next = self.rows.len();
        Ok(())
    }

    fn tuple_io(&mut self, schema: &TupleSchema) -> Result<TupleIo, BridgeError> {
        if self.columns.iter().any(|c| !c.is_empty()) {
            TupleIo::with_columns(schema, &ColumnsMeta(&self.columns))
        } else {
            TupleIo::positional(schema)
        }
    }
}

/// Row sink appending to one table. Rows are staged on `complete_row` and
/// only reach the store on `commit`; closing without committing discards
/// whatever was staged.
pub struct MemOutput {
    store: MemStore,
    table: String,
    width_hint: Option<usize>,
    current: Vec<Option<CellValue>>,
    staged: Vec<Vec<CellValue>>,
}

impl MemOutput {
    fn set(&mut self, index: usize, value: CellValue) -> Result<(), BridgeError> {
        if let Some(width) = self.width_hint
            && index >= width
        {
            return Err(BridgeError::ColumnOutOfRange { index, width });
        }
        if self.current.len() <= index {
            self.current.resize(index + 1, None);
        }
        self.current[index] = Some(value);
        Ok(())
    }
}

impl OutputRows for MemOutput {
    fn set_int(&mut self, index: usize, value: i64) -> Result<(), BridgeError> {
        self.set(index, CellValue::Int(value))
    }

    fn set_num(&mut self, index: usize, value: f64) -> Result<(), BridgeError> {
        self.set(index, CellValue::Num(value))
    }

    fn set_str(&mut self, index: usize, value: &str) -> Result<(), BridgeError> {
        self.set(index, CellValue::Str(value.to_string()))
    }

    fn complete_row(&mut self) -> Result<(), BridgeError> {
        let mut row = Vec::with_capacity(self.current.len());
        for (i, cell) in self.current.drain(..).enumerate() {
            match cell {
                Some(value) => row.push(value),
                None => return Err(BridgeError::io(format!("column {i} not set in row"))),
            }
        }
        self.staged.push(row);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), BridgeError> {
        let staged = std::mem::take(&mut self.staged);
        self.store.append_rows(&self.table, staged);
        Ok(())
    }

    fn close(&mut self) -> Result<(), BridgeError> {
        self.current.clear();
        self.staged.clear();
        Ok(())
    }
}

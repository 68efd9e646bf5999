//! Connection lifecycle manager.
//!
//! Connections are declared, never opened, until a read or publish actually
//! uses them; reads open into a read pool that lives until
//! [`DataBridge::close_read_connections`], publishes are queued and only
//! executed by [`DataBridge::finalize_publishes`], which opens a write pool
//! lazily and tears it down unconditionally before returning. Everything is
//! single-threaded: one logical thread of control owns the registries and the
//! pending list.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, VecDeque};

use rowport_common::ElemType;

use crate::error::BridgeError;
use crate::traits::{ConnectionFactory, DataConnection, DataHandler, ElementSource, OpenMode};
use crate::{exporter, importer};

/// Declared connection, recorded from the host's declaration surface. No
/// backend I/O happens at declaration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub name: String,
    /// Backend-specific connection string.
    pub connstr: String,
    /// Setup statements, ordered and semicolon-separated, run exactly once
    /// when the connection is first opened for writing.
    pub setup: String,
}

/// A queued publish, in declaration order, consumed only by finalize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPublish {
    pub connection: String,
    pub element: String,
    pub spec: String,
}

/// The lifecycle manager tying declarations, pools, and the publish queue to
/// one [`ConnectionFactory`].
pub struct DataBridge<F: ConnectionFactory> {
    factory: F,
    specs: BTreeMap<String, ConnectionInfo>,
    read_pool: BTreeMap<String, Box<dyn DataConnection>>,
    pending: VecDeque<PendingPublish>,
}

impl<F: ConnectionFactory> DataBridge<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            specs: BTreeMap::new(),
            read_pool: BTreeMap::new(),
            pending: VecDeque::new(),
        }
    }

    /// Record a connection declaration. Redeclaring a name is an error.
    pub fn declare_connection(
        &mut self,
        name: impl Into<String>,
        connstr: impl Into<String>,
        setup: impl Into<String>,
    ) -> Result<(), BridgeError> {
        let name = name.into();
        if self.specs.contains_key(&name) {
            return Err(BridgeError::DuplicateConnection { name });
        }
        let info = ConnectionInfo {
            name: name.clone(),
            connstr: connstr.into(),
            setup: setup.into(),
        };
        self.specs.insert(name, info);
        Ok(())
    }

    /// Declared info for `name`, if any.
    pub fn connection_info(&self, name: &str) -> Option<&ConnectionInfo> {
        self.specs.get(name)
    }

    /// Number of publishes still queued.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of read connections currently open.
    pub fn open_read_count(&self) -> usize {
        self.read_pool.len()
    }

    /// Read the element `name` of type `ty` through `connection`, driving
    /// `handler` with the structured data.
    ///
    /// The connection is opened lazily on first use and stays in the read
    /// pool; the row iterator is closed whatever happens, and a close failure
    /// never masks the read error.
    pub fn read_element(
        &mut self,
        connection: &str,
        name: &str,
        ty: &ElemType,
        spec: &str,
        handler: &mut dyn DataHandler,
    ) -> Result<(), BridgeError> {
        let conn = open_into(
            &mut self.factory,
            &self.specs,
            &mut self.read_pool,
            connection,
            OpenMode::Read,
        )?;
        let mut input = conn.open_input_rows(spec)?;
        let result = importer::read_element(name, ty, handler, input.as_mut());
        if let Err(close_err) = input.close() {
            log_secondary(&close_err);
        }
        result
    }

    /// Queue a publish of `element` through `connection`. Nothing is executed
    /// until [`Self::finalize_publishes`]; the connection must already be
    /// declared.
    pub fn declare_publish(
        &mut self,
        connection: &str,
        element: &str,
        spec: &str,
    ) -> Result<(), BridgeError> {
        if !self.specs.contains_key(connection) {
            return Err(BridgeError::UnknownConnection {
                name: connection.to_string(),
            });
        }
        self.pending.push_back(PendingPublish {
            connection: connection.to_string(),
            element: element.to_string(),
            spec: spec.to_string(),
        });
        Ok(())
    }

    /// Drain the publish queue in declaration order.
    ///
    /// Write connections open lazily (running their setup statements on the
    /// open transition). On any failure the remaining queue is still cleared
    /// and every write connection opened during the attempt is closed before
    /// the first error propagates; close failures on that path are logged and
    /// ignored rather than masking it.
    pub fn finalize_publishes(&mut self, source: &dyn ElementSource) -> Result<(), BridgeError> {
        let mut write_pool: BTreeMap<String, Box<dyn DataConnection>> = BTreeMap::new();
        let mut result = Ok(());
        while let Some(job) = self.pending.pop_front() {
            if let Err(err) = Self::publish_one(
                &mut self.factory,
                &self.specs,
                &mut write_pool,
                source,
                &job,
            ) {
                result = Err(err);
                break;
            }
        }
        // Even on error the next cycle starts with a clean slate.
        self.pending.clear();

        let close_result = close_pool(&mut write_pool);
        match result {
            Err(err) => {
                if let Err(close_err) = close_result {
                    log_secondary(&close_err);
                }
                Err(err)
            }
            Ok(()) => close_result,
        }
    }

    fn publish_one(
        factory: &mut F,
        specs: &BTreeMap<String, ConnectionInfo>,
        write_pool: &mut BTreeMap<String, Box<dyn DataConnection>>,
        source: &dyn ElementSource,
        job: &PendingPublish,
    ) -> Result<(), BridgeError> {
        let elem = source
            .element(&job.element)
            .ok_or_else(|| BridgeError::UnknownElement {
                name: job.element.clone(),
            })?;
        let conn = open_into(factory, specs, write_pool, &job.connection, OpenMode::Write)?;
        let mut output = conn.open_output_rows(&job.spec)?;
        let result = exporter::export_element(&job.element, elem, output.as_mut());
        if let Err(close_err) = output.close() {
            log_secondary(&close_err);
        }
        result
    }

    /// Close every open read connection.
    ///
    /// Close errors do not stop the sweep; the first one is returned after
    /// the pool has been emptied, the rest are logged.
    pub fn close_read_connections(&mut self) -> Result<(), BridgeError> {
        close_pool(&mut self.read_pool)
    }
}

/// Look up a connection in `pool`, opening it through `factory` on first use.
fn open_into<'a, F: ConnectionFactory>(
    factory: &mut F,
    specs: &BTreeMap<String, ConnectionInfo>,
    pool: &'a mut BTreeMap<String, Box<dyn DataConnection>>,
    name: &str,
    mode: OpenMode,
) -> Result<&'a mut Box<dyn DataConnection>, BridgeError> {
    match pool.entry(name.to_string()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let info = specs.get(name).ok_or_else(|| BridgeError::UnknownConnection {
                name: name.to_string(),
            })?;
            Ok(entry.insert(factory.connect(info, mode)?))
        }
    }
}

/// Close and drop every connection in `pool`, keeping the first error.
fn close_pool(pool: &mut BTreeMap<String, Box<dyn DataConnection>>) -> Result<(), BridgeError> {
    let mut first = None;
    for (_, mut conn) in std::mem::take(pool) {
        if let Err(err) = conn.close() {
            if first.is_none() {
                first = Some(err);
            } else {
                log_secondary(&err);
            }
        }
    }
    match first {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn log_secondary(err: &BridgeError) {
    #[cfg(feature = "tracing")]
    tracing::warn!(error = %err, "ignoring secondary failure during cleanup");
    #[cfg(not(feature = "tracing"))]
    let _ = err;
}

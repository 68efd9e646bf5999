//! Declarative load/publish plans.
//!
//! A manifest is the whole declaration surface as data: connections, reads,
//! and publishes in declaration order. Hosts that parse their own statement
//! syntax call the bridge directly; hosts that ship a plan as a document
//! deserialize it here, validate it, and apply it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::bridge::DataBridge;
use crate::error::BridgeError;
use crate::traits::{ConnectionFactory, DataHandler, SchemaSource};

/// A declared connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionDecl {
    pub name: String,
    pub connstr: String,
    /// Setup statements, semicolon-separated, for the write-open transition.
    #[serde(default)]
    pub setup: String,
}

/// One element to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadDecl {
    pub connection: String,
    pub element: String,
    pub spec: String,
}

/// One element to publish during finalize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishDecl {
    pub connection: String,
    pub element: String,
    pub spec: String,
}

/// A full declaration plan.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub connections: Vec<ConnectionDecl>,
    #[serde(default)]
    pub reads: Vec<ReadDecl>,
    #[serde(default)]
    pub publishes: Vec<PublishDecl>,
}

impl Manifest {
    /// Parse and validate a manifest from JSON.
    pub fn from_json_str(json: &str) -> Result<Self, BridgeError> {
        let manifest: Self = serde_json::from_str(json).map_err(|e| BridgeError::Manifest {
            message: e.to_string(),
        })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Structural validation: names are non-empty, connection names unique,
    /// every read and publish references a declared connection.
    pub fn validate(&self) -> Result<(), BridgeError> {
        let mut declared: BTreeSet<&str> = BTreeSet::new();
        for conn in &self.connections {
            if conn.name.is_empty() {
                return Err(invalid("connection with empty name"));
            }
            if !declared.insert(&conn.name) {
                return Err(invalid(format!("duplicate connection name {}", conn.name)));
            }
        }
        for read in &self.reads {
            if read.element.is_empty() {
                return Err(invalid("read with empty element name"));
            }
            if !declared.contains(read.connection.as_str()) {
                return Err(invalid(format!(
                    "read of {} references undeclared connection {}",
                    read.element, read.connection
                )));
            }
        }
        for publish in &self.publishes {
            if publish.element.is_empty() {
                return Err(invalid("publish with empty element name"));
            }
            if !declared.contains(publish.connection.as_str()) {
                return Err(invalid(format!(
                    "publish of {} references undeclared connection {}",
                    publish.element, publish.connection
                )));
            }
        }
        Ok(())
    }

    /// Declare connections and queue publishes onto `bridge`, in declaration
    /// order. No backend I/O happens here.
    pub fn declare<F: ConnectionFactory>(
        &self,
        bridge: &mut DataBridge<F>,
    ) -> Result<(), BridgeError> {
        for conn in &self.connections {
            bridge.declare_connection(conn.name.clone(), conn.connstr.clone(), conn.setup.clone())?;
        }
        for publish in &self.publishes {
            bridge.declare_publish(&publish.connection, &publish.element, &publish.spec)?;
        }
        Ok(())
    }

    /// Run every read in declaration order, resolving element types through
    /// `types` and driving `handler` with the data.
    pub fn run_reads<F: ConnectionFactory>(
        &self,
        bridge: &mut DataBridge<F>,
        types: &dyn SchemaSource,
        handler: &mut dyn DataHandler,
    ) -> Result<(), BridgeError> {
        for read in &self.reads {
            let ty = types
                .element_type(&read.element)
                .ok_or_else(|| BridgeError::UnknownElement {
                    name: read.element.clone(),
                })?;
            bridge.read_element(&read.connection, &read.element, ty, &read.spec, handler)?;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::Manifest {
        message: message.into(),
    }
}

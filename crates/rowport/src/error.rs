use thiserror::Error;

/// Coarse classification callers branch on.
///
/// `Declarative` errors are schema or declaration mistakes raised before any
/// I/O and are never worth retrying. `Io` errors come out of a backend during
/// open/fetch/write/close and are wrapped so upper layers see one taxonomy
/// regardless of which backend produced them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    Declarative,
    Io,
}

/// Error type for the whole marshalling engine.
///
/// Every variant carries a human-readable message via `Display`; callers are
/// expected to branch only on [`BridgeError::kind`], not on individual
/// variants.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("duplicate connection name {name}")]
    DuplicateConnection { name: String },

    #[error("no connection {name}")]
    UnknownConnection { name: String },

    #[error("no element {name}")]
    UnknownElement { name: String },

    #[error("no data for element {name}")]
    NoData { name: String },

    #[error("either all columns must be named or none")]
    MixedColumnNaming,

    #[error("no column for field {name}")]
    UnboundField { name: String },

    #[error("cannot fill tuple field {name} of type {ty}")]
    UnsupportedTupleField { name: String, ty: String },

    #[error("cannot read element {name} of type {ty}")]
    UnreadableElement { name: String, ty: String },

    #[error("cannot output element {name} of dimension {dims}")]
    UnsupportedDimension { name: String, dims: usize },

    #[error("tuple field {field} does not hold {expected}")]
    FieldMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("column index {index} out of range for width {width}")]
    ColumnOutOfRange { index: usize, width: usize },

    #[error("invalid manifest: {message}")]
    Manifest { message: String },

    #[error("backend error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BridgeError {
    /// Wrap a backend message without a source error.
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a backend error, keeping it as the source for diagnostics.
    pub fn from_backend<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Io {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error for the caller.
    ///
    /// Out-of-range column access and exhausted row sources surface during
    /// fetch/write, so they count as I/O; everything else is declarative.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io { .. } | Self::ColumnOutOfRange { .. } | Self::NoData { .. } => ErrorKind::Io,
            _ => ErrorKind::Declarative,
        }
    }
}

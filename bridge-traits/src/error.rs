use thiserror::Error;

/// Failure reported by a host capability.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The host cannot provide this capability at all (no settings screen,
    /// no configuration directory).
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    /// The host refused or failed a request, e.g. a service start.
    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    /// A stored setting was written with a different type than requested.
    #[error("Setting {key} holds a {actual} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
        actual: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum BackgroundError {
    #[error("Please add the WAKE_LOCK permission to the application manifest in order to run in the background.")]
    WakeLockNotGranted,

    #[error("The battery optimizations are not turned off.")]
    BatteryOptimizationsNotDisabled,

    #[error("The bridge is not attached to an interactive context")]
    NoInteractiveContext,

    #[error("Battery optimization exemption request {request_id} is already in progress")]
    RequestInProgress { request_id: Uuid },

    #[error("Battery optimization exemption request cancelled: {reason}")]
    RequestCancelled { reason: String },

    #[error("Battery optimization exemption request timed out after {0:?}")]
    RequestTimeout(Duration),

    #[error("Invalid argument {key}: {message}")]
    InvalidArgument { key: String, message: String },

    #[error("Foreground service error: {0}")]
    Service(String),

    #[error("Settings could not be persisted: {0}")]
    Persistence(String),
}

/// Machine-readable error category reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Permission,
    NoInteractiveContext,
    RequestInProgress,
    RequestCancelled,
    RequestTimeout,
    InvalidArgument,
    Service,
    Persistence,
}

impl ErrorKind {
    /// Error code surfaced on the command channel.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Permission => "PermissionError",
            ErrorKind::NoInteractiveContext => "NoInteractiveContextError",
            ErrorKind::RequestInProgress => "RequestInProgressError",
            ErrorKind::RequestCancelled => "RequestCancelledError",
            ErrorKind::RequestTimeout => "RequestTimeoutError",
            ErrorKind::InvalidArgument => "InvalidArgumentError",
            ErrorKind::Service => "ServiceError",
            ErrorKind::Persistence => "PersistenceError",
        }
    }
}

impl BackgroundError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackgroundError::WakeLockNotGranted
            | BackgroundError::BatteryOptimizationsNotDisabled => ErrorKind::Permission,
            BackgroundError::NoInteractiveContext => ErrorKind::NoInteractiveContext,
            BackgroundError::RequestInProgress { .. } => ErrorKind::RequestInProgress,
            BackgroundError::RequestCancelled { .. } => ErrorKind::RequestCancelled,
            BackgroundError::RequestTimeout(_) => ErrorKind::RequestTimeout,
            BackgroundError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            BackgroundError::Service(_) => ErrorKind::Service,
            BackgroundError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn code(&self) -> &'static str {
        self.kind().code()
    }

    /// Extra context for the caller, when there is any.
    pub fn details(&self) -> Option<String> {
        match self {
            BackgroundError::NoInteractiveContext => Some(
                "An interactive context is required in order to request battery optimizations to be off."
                    .to_string(),
            ),
            BackgroundError::RequestInProgress { request_id } => Some(request_id.to_string()),
            _ => None,
        }
    }

    pub(crate) fn invalid_argument(key: &str, message: impl Into<String>) -> Self {
        BackgroundError::InvalidArgument {
            key: key.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BackgroundError>;

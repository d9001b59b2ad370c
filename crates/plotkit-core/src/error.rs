//! Error handling for plotkit
//!
//! Provides error types for every layer of the pipeline:
//! - Layout errors (workspace and text layout parameters)
//! - Controller errors (faults reported by the motion controller)
//! - Connection errors (serial transport)
//! - Queue and job source errors (job intake)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Layout error type
///
/// Raised when layout parameters cannot describe a drawable result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The margin leaves no drawable area inside the workspace
    #[error("Margin {margin}mm leaves no drawable area in a {width}x{height}mm workspace")]
    EmptyDrawableArea {
        /// Workspace width in millimeters.
        width: f64,
        /// Workspace height in millimeters.
        height: f64,
        /// Margin in millimeters.
        margin: f64,
    },

    /// A layout parameter is out of range
    #[error("Invalid layout parameter '{param}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        param: String,
        /// The reason the parameter is invalid.
        reason: String,
    },
}

/// Controller error type
///
/// Represents the outcome of a command the controller did not acknowledge.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ControllerError {
    /// No recognized response arrived before the deadline
    #[error("Controller operation timed out after {timeout_ms}ms")]
    Timeout {
        /// The timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// Alarm condition reported by the controller
    #[error("Alarm{}: {message}", code.map(|c| format!(" {c}")).unwrap_or_default())]
    Alarm {
        /// The alarm code, when the controller reported one.
        code: Option<u8>,
        /// The alarm message.
        message: String,
    },

    /// Command was rejected by the controller
    #[error("Command rejected{}: {message}", code.map(|c| format!(" (error {c})")).unwrap_or_default())]
    CommandRejected {
        /// The error code, when the controller reported one.
        code: Option<u8>,
        /// The error message.
        message: String,
    },

    /// The session has halted and refuses further commands
    #[error("Controller session is halted")]
    Halted,

    /// The transport failed while talking to the controller
    #[error("Transport failure: {reason}")]
    Transport {
        /// The reason for the transport failure.
        reason: String,
    },
}

impl ControllerError {
    /// True when the controller itself reported the fault (alarm or error token).
    pub fn is_controller_fault(&self) -> bool {
        matches!(
            self,
            ControllerError::Alarm { .. } | ControllerError::CommandRejected { .. }
        )
    }
}

/// Connection error type
///
/// Represents errors opening or using the serial link.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionError {
    /// Port not found
    #[error("Port not found: {port}")]
    PortNotFound {
        /// The name of the port that was not found.
        port: String,
    },

    /// Failed to open port
    #[error("Failed to open port {port}: {reason}")]
    FailedToOpen {
        /// The name of the port that failed to open.
        port: String,
        /// The reason the port failed to open.
        reason: String,
    },

    /// Serial port error
    #[error("Serial port error: {reason}")]
    SerialError {
        /// The reason for the serial port error.
        reason: String,
    },

    /// Invalid connection parameters
    #[error("Invalid connection parameters: {reason}")]
    InvalidParameters {
        /// The reason the parameters are invalid.
        reason: String,
    },
}

/// Job queue error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Submitted text was empty after trimming
    #[error("Job text is empty")]
    EmptyText,

    /// The queue is at capacity
    #[error("Job queue is full (capacity {capacity})")]
    QueueFull {
        /// The queue capacity.
        capacity: usize,
    },
}

/// Job source error type
///
/// Every variant is transient: the poller logs it and tries again next tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JobSourceError {
    /// The job source could not be reached
    #[error("Job source unreachable: {reason}")]
    Unreachable {
        /// The reason the source could not be reached.
        reason: String,
    },

    /// The job source answered with something that is not a job
    #[error("Malformed job: {reason}")]
    Malformed {
        /// Why the job was rejected.
        reason: String,
    },
}

/// Main error type for plotkit
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// Layout error
    #[error(transparent)]
    Layout(#[from] LayoutError),

    /// Controller error
    #[error(transparent)]
    Controller(#[from] ControllerError),

    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Queue error
    #[error(transparent)]
    Queue(#[from] QueueError),

    /// Job source error
    #[error(transparent)]
    JobSource(#[from] JobSourceError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Controller(ControllerError::Timeout { .. }))
    }

    /// Check if this error is transient and may be retried later
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::JobSource(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

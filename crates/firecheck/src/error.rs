//! Error types for firecheck.
//!
//! Workflow failures (unknown codes, retired units, stage violations) are
//! described by [`WorkflowError`], which is cheap to clone and compare so the
//! scan loop can remember the last one it reported. Everything else, including
//! storage and configuration failures, is folded into [`Error`].

use std::path::PathBuf;
use thiserror::Error;

/// Recoverable failures of the identification and inspection workflow.
///
/// None of these is fatal: the caller surfaces the message and stays on the
/// current step, except [`WorkflowError::DeviceUnavailable`], which switches
/// the session to manual entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// No unit carries the given code.
    #[error("no fire extinguisher with code {code}")]
    NotFound {
        /// The normalized code that was looked up.
        code: String,
    },

    /// The unit has been withdrawn from service.
    #[error("{code} is retired and no longer inspected")]
    Retired {
        /// Code of the retired unit.
        code: String,
    },

    /// The unit already has a confirmed inspection this month.
    #[error("{code} has already been inspected and confirmed this month")]
    AlreadyCompliant {
        /// Code of the compliant unit.
        code: String,
    },

    /// A technician confirmation was submitted without a pending officer check.
    #[error("{code} has no officer check awaiting confirmation")]
    NoOpenInspection {
        /// Code of the unit.
        code: String,
    },

    /// An officer check was submitted while the previous one is still open.
    #[error("{code} already has an officer check awaiting technician confirmation")]
    InspectionAlreadyOpen {
        /// Code of the unit.
        code: String,
    },

    /// The camera could not be acquired.
    #[error("camera unavailable: {message}")]
    DeviceUnavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// Another unit already uses this code.
    #[error("code {code} is already in use")]
    DuplicateCode {
        /// The conflicting normalized code.
        code: String,
    },

    /// The code does not match the configured code pattern.
    #[error("code {code} does not match the required pattern {pattern}")]
    InvalidCodeFormat {
        /// The normalized code.
        code: String,
        /// The configured pattern.
        pattern: String,
    },

    /// No unit has the given identifier.
    #[error("no equipment with id {id}")]
    UnknownEquipment {
        /// The identifier that was looked up.
        id: String,
    },

    /// A mandatory input was missing or blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// An input carried a value outside its closed set.
    #[error("invalid value '{value}' for {field}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// The rejected text.
        value: String,
    },

    /// A stage was submitted that the session did not select.
    #[error("stage {requested} cannot be submitted, the selected unit is at stage {expected}")]
    StageMismatch {
        /// The stage the session selected.
        expected: u8,
        /// The stage that was submitted.
        requested: u8,
    },

    /// A submission arrived while no unit was selected.
    #[error("no fire extinguisher selected")]
    NoSelection,
}

impl WorkflowError {
    /// Create a device unavailable error.
    #[must_use]
    pub fn device_unavailable(message: impl Into<String>) -> Self {
        Self::DeviceUnavailable {
            message: message.into(),
        }
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            value: value.into(),
        }
    }

    /// Whether this failure forces the session out of scanning mode.
    #[must_use]
    pub fn forces_manual_entry(&self) -> bool {
        matches!(self, Self::DeviceUnavailable { .. })
    }
}

/// The main error type for firecheck operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Workflow Errors ===
    /// A workflow rule rejected the operation.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Capture Errors ===
    /// A frame buffer did not match its declared dimensions.
    #[error("invalid frame: expected {expected} bytes, got {actual}")]
    InvalidFrame {
        /// Byte length implied by width and height.
        expected: usize,
        /// Byte length actually supplied.
        actual: usize,
    },

    /// A still image could not be read.
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        /// Path to the image.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: image::ImageError,
    },

    /// A code could not be encoded as a QR label.
    #[error("failed to encode label: {0}")]
    Label(#[from] qrcode::types::QrError),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for firecheck operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Get the workflow error, if this is one.
    #[must_use]
    pub fn as_workflow(&self) -> Option<&WorkflowError> {
        match self {
            Self::Workflow(err) => Some(err),
            _ => None,
        }
    }

    /// Check if the user can recover by correcting input and retrying.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Workflow(_))
    }

    /// Check if this error means the camera could not be used.
    #[must_use]
    pub fn is_device_unavailable(&self) -> bool {
        self.as_workflow()
            .is_some_and(WorkflowError::forces_manual_entry)
    }
}

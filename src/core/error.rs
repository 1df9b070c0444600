use thiserror::Error;

use crate::api::RecordError;
use crate::menu::form::FormErrors;
use crate::menu::reorder::ReorderError;
use crate::menu::tree::TreeError;

/// Centralized error types for the console
///
/// Every fallible operation in the library ends up here so the binary can report
/// failures uniformly. Uses `thiserror` for conversions and display formatting.
///
/// # Example
///
/// ```no_run
/// use subadmin::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Transport-level HTTP errors (connect, timeout, decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-success status
    #[error("Backend rejected request with status {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Flat list could not be turned into a tree
    #[error("Menu integrity error: {0}")]
    Tree(#[from] TreeError),

    /// Backend row that cannot be a menu item
    #[error("Invalid menu record: {0}")]
    Record(#[from] RecordError),

    /// Drag/drop move was rejected
    #[error("Reorder rejected: {0}")]
    Reorder(#[from] ReorderError),

    /// Form validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] FormErrors),

    /// Referenced entity does not exist locally
    #[error("Not found: {0}")]
    NotFound(String),

    /// Destructive operation attempted without an explicit confirmation
    #[error("Confirmation required: {0}")]
    Confirmation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// True for failures that happened before the backend produced a response.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Http(_))
    }
}

//! All error types for the locmerge crate.
//!
//! Returned from every fallible operation (parsing, classification,
//! reconciliation setup, persistence, translation batches).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("XML parse error: {0}")]
    XmlParse(#[from] quick_xml::Error),

    #[error("CSV parse error: {0}")]
    CsvParse(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed file content: unparsable markup, no matching entries,
    /// or a structurally unusable file. Aborts the current operation.
    #[error("format error: {0}")]
    Format(String),

    /// A structural precondition failed before reconciliation could run
    /// (missing `id` column, unresolved column mapping, bad language code).
    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Malformed or non-JSON response from the translation provider.
    /// The whole batch is discarded; nothing is applied.
    #[error("translation provider error: {0}")]
    TranslationProvider(String),

    /// Storage write failure after a successful in-memory mutation.
    /// The mutation is kept; memory and disk may diverge until the next
    /// successful save.
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn format_error(message: impl Into<String>) -> Self {
        Error::Format(message.into())
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn persistence_error(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Error::Persistence {
            message: message.into(),
            source,
        }
    }
}

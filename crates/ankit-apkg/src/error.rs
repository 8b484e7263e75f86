//! Error types for ankit-apkg.

use thiserror::Error;

/// Result type for ankit-apkg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling a package.
///
/// The first five variants are the assembly failures proper. None of them is
/// retried internally; whether to skip a note or abort the whole batch is up
/// to the caller. The remaining variants wrap infrastructure failures.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed note type definition.
    #[error("invalid note type '{model}': {reason}")]
    Schema {
        /// Note type name.
        model: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A note was given the wrong number of field values.
    #[error("note type '{model}' expects {expected} fields, got {actual}")]
    Arity {
        /// Note type name.
        model: String,
        /// Field count of the note type.
        expected: usize,
        /// Field count supplied.
        actual: usize,
    },

    /// A media payload could not be written into the archive.
    #[error("cannot write media '{name}': {reason}")]
    MediaWrite {
        /// Original media filename.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The package has already produced its archive.
    #[error("package has already been finalized")]
    AlreadyFinalized,

    /// The id allocator ran past the largest id the importer accepts.
    #[error("identifier space exhausted: cannot allocate {requested} ids after {next}")]
    IdentifierOverflow {
        /// Next id that would have been handed out.
        next: i64,
        /// Number of ids requested.
        requested: usize,
    },

    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// SQLite error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// ZIP error.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl Error {
    /// Create a new schema error.
    pub fn schema(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::Schema {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Create a new media write error.
    pub fn media_write(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MediaWrite {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

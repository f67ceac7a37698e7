//! Error types for planer.

/// Everything a store, gateway or command can fail with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input was rejected before any mutation happened (e.g. an empty title).
    #[error("Validation error: {0}")]
    Validation(String),

    /// An operation referenced an id that is not in the collection.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The kind of entity, e.g. `"task"`.
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// The persistence gateway could not read or write the document.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// An import envelope was malformed. Nothing was applied.
    #[error("Invalid import: {0}")]
    InvalidImport(String),

    /// The configuration file could not be parsed.
    #[error("Invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn task_not_found(id: &str) -> Self {
        Self::NotFound { kind: "task", id: id.to_string() }
    }

    pub(crate) fn subtask_not_found(id: &str) -> Self {
        Self::NotFound { kind: "subtask", id: id.to_string() }
    }

    pub(crate) fn project_not_found(id: &str) -> Self {
        Self::NotFound { kind: "project", id: id.to_string() }
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// A specialized Result type for planer.
pub type Result<T> = std::result::Result<T, Error>;

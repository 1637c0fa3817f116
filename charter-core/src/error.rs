/// Top-level Charter error type.
///
/// All fallible operations in `charter-core` return [`Result<T, CharterError>`](Result).
/// Each variant wraps a domain-specific error enum, allowing callers to
/// match on the error source without losing type information.
#[derive(thiserror::Error, Debug)]
pub enum CharterError {
    /// Index consistency violation found while building the call graph.
    #[error("Call graph invariant violated: {0}")]
    Graph(#[from] charter_graphs::GraphError),

    /// Error reading or decoding the symbol index.
    #[error("Index load error: {0}")]
    Load(#[from] LoadError),

    /// Error in configuration parsing or validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors reading an index from disk.
#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    /// The index file does not exist.
    #[error("Index file not found: {0}")]
    NotFound(String),

    /// Filesystem I/O error reading the index.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON rendition of the index could not be parsed.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The SCIP protobuf could not be decoded.
    #[error("SCIP decode error: {0}")]
    Protobuf(#[from] protobuf::Error),

    /// A decoded occurrence carried an invalid range.
    #[error("Invalid occurrence: {0}")]
    Occurrence(charter_graphs::GraphError),
}

/// Errors in Charter configuration parsing.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The configuration file does not exist at the expected path.
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// Configuration file syntax could not be parsed (TOML error).
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Convenience alias for `Result<T, CharterError>`.
pub type Result<T> = std::result::Result<T, CharterError>;

//! Error types for the compatibility layer.

/// Result type alias for compatibility-layer operations.
pub type Result<T> = std::result::Result<T, CompatError>;

/// Errors that can occur in the compatibility layer.
///
/// The layer does not invent error categories of its own: resolution and
/// I/O failures from the underlying reactor are carried through with their
/// original messages, and the remaining variants cover construction and
/// configuration of the adapters themselves.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CompatError {
    /// Name resolution failed.
    #[error("Resolution error: {0}")]
    Resolve(String),

    /// The service name is neither a port number nor a known service.
    #[error("Unknown service '{0}'")]
    UnknownService(String),

    /// Invalid resolver configuration.
    #[error("Resolver configuration error: {0}")]
    ResolverConfig(String),

    /// Failed to create the execution context's runtime.
    #[error("Failed to create runtime: {0}")]
    RuntimeCreation(String),

    /// A timer wait was cancelled or rescheduled before it expired.
    #[error("Wait aborted")]
    Aborted,

    /// I/O error from the underlying reactor.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for CompatError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

//! Crate-wide error taxonomy.
//!
//! Transient I/O is never retried here; callers decide. Logical conditions
//! that the engine can absorb locally (duplicate members, empty spectra)
//! are logged via the `log` facade rather than surfaced as `Err`.

/// Errors that can cross a public API boundary of this crate.
#[derive(Debug, thiserror::Error)]
pub enum ClusterError {
    /// A peak-list record could not be parsed (bad header, malformed peak
    /// line, wrong extension). Fatal for the file it came from; other
    /// files in a multi-file run continue.
    #[error("input format error: {0}")]
    InputFormat(String),

    /// I/O failure from a cluster or property store backend.
    #[error("storage I/O error: {0}")]
    StorageIo(#[from] std::io::Error),

    /// A deserialized payload failed a structural check (bad magic, bad
    /// version, truncated payload). No best-effort recovery is attempted.
    #[error("integrity error: {0}")]
    Integrity(String),

    /// Snappy (de)compression failed on a stored block.
    #[error("compression error: {0}")]
    Compression(#[from] snap::Error),

    /// Configuration could not be parsed or was internally inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

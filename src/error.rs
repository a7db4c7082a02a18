//! Error types for diagmon.

use thiserror::Error;

/// Errors surfaced by discovery, selection, and dump capture.
///
/// Failures while resolving optional process metadata are never reported
/// through this type; they degrade the affected field to its sentinel value
/// instead. Only selection criteria, enumeration permission, transport, and
/// capture failures reach the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// No endpoint survived the process key filter.
    #[error("unable to discover a target process")]
    NotFound,

    /// More than one endpoint survived and nothing disambiguated them.
    #[error("multiple target processes discovered; a process key is required to select one")]
    Ambiguous,

    /// The operating system denied endpoint enumeration.
    #[error("unable to enumerate processes")]
    PermissionDenied,

    /// The diagnostics IPC transport failed.
    #[error("diagnostics transport error: {0}")]
    Transport(String),

    /// Dump capture failed after the transport accepted the command.
    #[error("dump capture failed: {0}")]
    Capture(String),

    /// The subsystem has been shut down; no further operations are served.
    #[error("diagnostic services have been shut down")]
    Shutdown,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

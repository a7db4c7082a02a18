//! The diagnostics IPC transport seam.
//!
//! The wire protocol itself lives outside this crate; discovery only needs
//! the three commands below. Implementations must be cheap to share, since
//! every endpoint snapshot entry carries a handle to its transport.

use async_trait::async_trait;
use std::path::Path;

use crate::dump::TransportDumpType;
use crate::error::Result;

/// One diagnostics IPC connection to a target process.
///
/// All commands are asynchronous and cancel-safe: dropping the returned
/// future abandons the command without blocking the calling thread.
#[async_trait]
pub trait DiagnosticTransport: Send + Sync {
    /// Asks the target runtime for its full command line.
    ///
    /// Callers time-box this; a slow or unwilling runtime is not an error at
    /// the discovery layer, it just leaves the field unresolved.
    async fn request_command_line(&self) -> Result<String>;

    /// Commands the target runtime to write a dump of itself to `dest`.
    async fn write_dump(&self, dump_type: TransportDumpType, dest: &Path) -> Result<()>;

    /// Resolves once the endpoint is accepting diagnostic connections.
    ///
    /// Used by the container-entrypoint probe to distinguish a live endpoint
    /// from a stale advertisement.
    async fn wait_for_connection(&self) -> Result<()>;
}

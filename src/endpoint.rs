//! Endpoint snapshot entities and the enumeration seam.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::transport::DiagnosticTransport;

/// One reachable diagnostics endpoint, as observed in a single snapshot.
///
/// Instances are ephemeral: each [`EndpointSource::endpoints`] call produces
/// fresh ones and nothing in this crate caches them. Every metadata field
/// except the process id is optional; older runtimes advertise little more
/// than their pid.
#[derive(Clone)]
pub struct EndpointInfo {
    /// Process id of the advertising process.
    pub pid: u32,
    /// Identifier of the specific runtime instance, stable across
    /// reconnects, disambiguating pid reuse.
    pub runtime_instance_cookie: Option<Uuid>,
    /// Operating system the target reported for itself, if any.
    pub operating_system: Option<String>,
    /// Process architecture the target reported for itself, if any.
    pub process_architecture: Option<String>,
    /// Raw command line the target reported for itself, if any.
    pub command_line: Option<String>,
    /// Transport handle for issuing IPC commands against this endpoint.
    pub transport: Arc<dyn DiagnosticTransport>,
}

impl fmt::Debug for EndpointInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointInfo")
            .field("pid", &self.pid)
            .field("runtime_instance_cookie", &self.runtime_instance_cookie)
            .field("operating_system", &self.operating_system)
            .field("process_architecture", &self.process_architecture)
            .field("command_line", &self.command_line)
            .finish_non_exhaustive()
    }
}

/// Supplies snapshots of currently reachable diagnostic endpoints.
///
/// Enumeration is cheap and safe to call repeatedly; every call returns a
/// fresh snapshot. The low-level primitive that discovers raw endpoints is
/// external to this crate.
#[async_trait]
pub trait EndpointSource: Send + Sync {
    /// Returns the current endpoint snapshot, in enumeration order.
    ///
    /// Fails with [`crate::Error::PermissionDenied`] when the operating
    /// system denies enumeration.
    async fn endpoints(&self) -> Result<Vec<EndpointInfo>>;
}

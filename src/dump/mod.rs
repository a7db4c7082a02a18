//! On-demand memory-dump capture.
//!
//! Capture is platform dispatched through the [`DumpCapture`] capability:
//! Windows hosts write the dump in-process through the native minidump
//! facility, every other host commands the target runtime to write its own
//! dump over the diagnostics transport. The capability is selected once at
//! construction, not per call.

mod stream;

#[cfg(windows)]
mod native;

pub use stream::DumpStream;

use async_trait::async_trait;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::endpoint::EndpointInfo;
use crate::error::Result;
use crate::process::ProcessInfo;

/// Semantic dump flavors exposed to the host layer.
///
/// Deliberately independent of the transport's dump enumeration; the two are
/// bridged by [`DumpType::to_transport`], which is total by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpType {
    Full,
    WithHeap,
    Triage,
    Mini,
}

/// Dump flavors as the diagnostics transport encodes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TransportDumpType {
    Normal = 1,
    WithHeap = 2,
    Triage = 3,
    Full = 4,
}

impl DumpType {
    /// Maps the semantic flavor onto the transport's enumeration. The match
    /// is exhaustive, so an unmapped flavor cannot reach the transport.
    pub fn to_transport(self) -> TransportDumpType {
        match self {
            DumpType::Full => TransportDumpType::Full,
            DumpType::WithHeap => TransportDumpType::WithHeap,
            DumpType::Triage => TransportDumpType::Triage,
            DumpType::Mini => TransportDumpType::Normal,
        }
    }
}

/// Error for a dump-type name the host layer does not recognize. Rejected
/// before any capture I/O begins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDumpTypeError(String);

impl fmt::Display for UnknownDumpTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognized dump type: {}", self.0)
    }
}

impl std::error::Error for UnknownDumpTypeError {}

impl FromStr for DumpType {
    type Err = UnknownDumpTypeError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(DumpType::Full),
            "withheap" => Ok(DumpType::WithHeap),
            "triage" => Ok(DumpType::Triage),
            "mini" => Ok(DumpType::Mini),
            _ => Err(UnknownDumpTypeError(s.to_string())),
        }
    }
}

/// Platform capture capability: exactly two implementations exist, selected
/// once by host-OS detection.
#[async_trait]
pub trait DumpCapture: Send + Sync {
    /// Captures a dump of the endpoint's process into `dest`.
    async fn capture(
        &self,
        endpoint: &EndpointInfo,
        dump_type: DumpType,
        dest: &Path,
    ) -> Result<()>;
}

/// Out-of-process capture over the diagnostics transport. The target runtime
/// writes the dump itself; the command is asynchronous so the caller is
/// never blocked on the IPC wait.
pub struct TransportDumpCapture;

#[async_trait]
impl DumpCapture for TransportDumpCapture {
    async fn capture(
        &self,
        endpoint: &EndpointInfo,
        dump_type: DumpType,
        dest: &Path,
    ) -> Result<()> {
        endpoint
            .transport
            .write_dump(dump_type.to_transport(), dest)
            .await
    }
}

/// Selects the capture capability for the local host.
pub(crate) fn platform_capture() -> Box<dyn DumpCapture> {
    #[cfg(windows)]
    {
        Box::new(native::NativeDumpCapture)
    }
    #[cfg(not(windows))]
    {
        Box::new(TransportDumpCapture)
    }
}

/// Orchestrates capture into a uniquely named temp file and hands the result
/// back as a self-deleting stream.
pub struct DumpCollector {
    storage: StorageConfig,
    capture: Box<dyn DumpCapture>,
}

impl DumpCollector {
    /// Collector using the capability appropriate for the local host.
    pub fn new(storage: StorageConfig) -> Self {
        Self::with_capture(storage, platform_capture())
    }

    /// Collector with an explicit capture capability. Tests inject fakes
    /// here; production construction goes through [`DumpCollector::new`].
    pub fn with_capture(storage: StorageConfig, capture: Box<dyn DumpCapture>) -> Self {
        Self { storage, capture }
    }

    /// Swaps the capture capability, keeping the storage configuration.
    pub fn set_capture(&mut self, capture: Box<dyn DumpCapture>) {
        self.capture = capture;
    }

    /// Captures a dump of `process` and returns a forward-only stream over
    /// it. The backing temp file is removed once the stream is dropped or
    /// closed, and also when capture fails partway through.
    pub async fn capture(&self, process: &ProcessInfo, dump_type: DumpType) -> Result<DumpStream> {
        let file_name = format!("{}_{}", Uuid::new_v4(), process.pid());
        let dest = self.storage.dump_temp_dir.join(file_name);

        debug!(
            pid = process.pid(),
            dump_type = ?dump_type,
            dest = %dest.display(),
            "capturing dump"
        );

        if let Err(err) = self.capture.capture(process.endpoint(), dump_type, &dest).await {
            // The writer may have gotten partway before failing; the temp
            // file must not outlive the request.
            if tokio::fs::remove_file(&dest).await.is_ok() {
                warn!(dest = %dest.display(), "removed partial dump after capture failure");
            }
            return Err(err);
        }

        DumpStream::open(dest).await
    }
}

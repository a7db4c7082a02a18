//! diagmon - process discovery and dump orchestration over diagnostics IPC
//!
//! This library identifies live target processes that expose a diagnostics
//! IPC endpoint, resolves per-process metadata with a bounded-latency
//! fallback, selects a single "default" target process (including the
//! containerized single-process heuristic), and captures memory dumps into
//! self-deleting streams.
//!
//! # Features
//!
//! - **Concurrent listing**: every endpoint in a snapshot is resolved in
//!   parallel under one shared metadata deadline
//! - **Partial success**: metadata that cannot be resolved in time degrades
//!   to the `"unknown"` sentinel instead of failing the call
//! - **Typed selection errors**: zero matches and ambiguous matches are
//!   distinct, mappable outcomes
//! - **Platform-dispatched capture**: native minidumps on Windows hosts,
//!   transport-commanded dumps everywhere else
//!
//! Every operation is an independently cancellable future: drop it to
//! cancel, or wrap it in [`tokio::time::timeout`] to impose a deadline.
//! Caller cancellation always wins over the internal metadata budgets.
//!
//! # Usage
//!
//! ```no_run
//! use diagmon::{DiagnosticServices, DiscoveryConfig, DumpType, ProcessKey, StorageConfig};
//! # use diagmon::{EndpointInfo, EndpointSource, Result};
//! # use async_trait::async_trait;
//! # struct NoEndpoints;
//! # #[async_trait]
//! # impl EndpointSource for NoEndpoints {
//! #     async fn endpoints(&self) -> Result<Vec<EndpointInfo>> { Ok(Vec::new()) }
//! # }
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let services = DiagnosticServices::new(
//!     NoEndpoints,
//!     StorageConfig::default(),
//!     DiscoveryConfig::default(),
//! );
//!
//! // Enumerate every process advertising a diagnostics endpoint.
//! for process in services.list_processes().await? {
//!     println!("{} {}", process.pid(), process.process_name());
//! }
//!
//! // Select one process by pid and capture a triage dump.
//! let process = services.get_process(Some(ProcessKey::from_pid(1234))).await?;
//! let stream = services.capture_dump(&process, DumpType::Triage).await?;
//! stream.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod cmdline;
pub mod config;
pub mod container;
pub mod dump;
pub mod endpoint;
pub mod error;
pub mod process;
pub mod services;
pub mod transport;

// Re-export main types for convenience
pub use config::{DiscoveryConfig, StorageConfig};
pub use dump::{
    DumpCapture, DumpCollector, DumpStream, DumpType, TransportDumpCapture, TransportDumpType,
};
pub use endpoint::{EndpointInfo, EndpointSource};
pub use error::{Error, Result};
pub use process::{ProcessInfo, ProcessKey, PROCESS_FIELD_UNKNOWN};
pub use services::{DiagnosticServices, TieBreaker, CONTAINER_ENTRYPOINT_PID};
pub use transport::DiagnosticTransport;

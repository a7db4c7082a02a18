//! Shared in-memory fakes for the integration tests.
//!
//! `FakeTransport` scripts the behavior of one diagnostics IPC connection;
//! `FakeSource` serves a fixed endpoint snapshot. Together they let the
//! tests drive discovery, selection, and capture without any live process.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use diagmon::{
    DiagnosticTransport, EndpointInfo, EndpointSource, Error, Result, TransportDumpType,
};

/// Installs a test subscriber once so tracing output is visible under
/// `cargo test -- --nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Scripted wait_for_connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connect {
    /// Accept immediately.
    Accept,
    /// Fail immediately with a transport error.
    Refuse,
    /// Never answer within any test budget.
    Hang,
}

/// One scripted diagnostics connection.
pub struct FakeTransport {
    command_line: Option<String>,
    command_line_delay: Option<Duration>,
    connect: Connect,
    dump_payload: Vec<u8>,
    fail_dump: bool,
    /// Every dump command observed, in order.
    pub dump_requests: Mutex<Vec<TransportDumpType>>,
}

impl Default for FakeTransport {
    fn default() -> Self {
        Self {
            command_line: None,
            command_line_delay: None,
            connect: Connect::Accept,
            dump_payload: b"MDMP fake dump payload".to_vec(),
            fail_dump: false,
            dump_requests: Mutex::new(Vec::new()),
        }
    }
}

impl FakeTransport {
    pub fn with_command_line(command_line: &str) -> Self {
        Self {
            command_line: Some(command_line.to_string()),
            ..Self::default()
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.command_line_delay = Some(delay);
        self
    }

    pub fn connect(mut self, connect: Connect) -> Self {
        self.connect = connect;
        self
    }

    pub fn failing_dump(mut self) -> Self {
        self.fail_dump = true;
        self
    }

    pub fn dump_payload(mut self, payload: &[u8]) -> Self {
        self.dump_payload = payload.to_vec();
        self
    }
}

#[async_trait]
impl DiagnosticTransport for FakeTransport {
    async fn request_command_line(&self) -> Result<String> {
        if let Some(delay) = self.command_line_delay {
            tokio::time::sleep(delay).await;
        }
        match &self.command_line {
            Some(command_line) => Ok(command_line.clone()),
            None => Err(Error::Transport("command line unavailable".into())),
        }
    }

    async fn write_dump(&self, dump_type: TransportDumpType, dest: &Path) -> Result<()> {
        self.dump_requests.lock().unwrap().push(dump_type);
        if self.fail_dump {
            // Leave a partial file behind, as a writer dying mid-dump would.
            tokio::fs::write(dest, b"partial").await?;
            return Err(Error::Capture("target process exited during capture".into()));
        }
        tokio::fs::write(dest, &self.dump_payload).await?;
        Ok(())
    }

    async fn wait_for_connection(&self) -> Result<()> {
        match self.connect {
            Connect::Accept => Ok(()),
            Connect::Refuse => Err(Error::Transport("connection refused".into())),
            Connect::Hang => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            }
        }
    }
}

/// Builds a snapshot entry around a scripted transport.
pub fn endpoint(pid: u32, transport: FakeTransport) -> EndpointInfo {
    EndpointInfo {
        pid,
        runtime_instance_cookie: Some(Uuid::new_v4()),
        operating_system: None,
        process_architecture: None,
        command_line: None,
        transport: Arc::new(transport),
    }
}

/// Snapshot entry with explicit metadata already advertised.
pub fn endpoint_with_metadata(
    pid: u32,
    cookie: Uuid,
    operating_system: Option<&str>,
    command_line: Option<&str>,
) -> EndpointInfo {
    EndpointInfo {
        pid,
        runtime_instance_cookie: Some(cookie),
        operating_system: operating_system.map(str::to_string),
        process_architecture: Some("x64".to_string()),
        command_line: command_line.map(str::to_string),
        transport: Arc::new(FakeTransport::default()),
    }
}

/// Endpoint source serving a fixed snapshot.
pub struct FakeSource {
    endpoints: Vec<EndpointInfo>,
    deny: bool,
}

impl FakeSource {
    pub fn new(endpoints: Vec<EndpointInfo>) -> Self {
        Self {
            endpoints,
            deny: false,
        }
    }

    /// Source whose enumeration is denied by the operating system.
    pub fn denied() -> Self {
        Self {
            endpoints: Vec::new(),
            deny: true,
        }
    }
}

#[async_trait]
impl EndpointSource for FakeSource {
    async fn endpoints(&self) -> Result<Vec<EndpointInfo>> {
        if self.deny {
            return Err(Error::PermissionDenied);
        }
        Ok(self.endpoints.clone())
    }
}

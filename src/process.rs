//! Resolved process records and the metadata resolver.
//!
//! Resolution turns one endpoint snapshot entry into a [`ProcessInfo`]. It
//! never fails for missing optional data: every textual field ends up either
//! a genuine value or exactly the [`PROCESS_FIELD_UNKNOWN`] sentinel.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::cmdline;
use crate::endpoint::EndpointInfo;

/// Sentinel for a process field whose value could not be retrieved. This is
/// the same placeholder the target runtime reports for fields it cannot
/// determine itself.
pub const PROCESS_FIELD_UNKNOWN: &str = "unknown";

/// Value of the endpoint operating-system field for Windows targets.
const OPERATING_SYSTEM_WINDOWS: &str = "windows";

/// Filter over an endpoint snapshot.
///
/// Any subset of the fields may be present; matching is conjunctive over the
/// present ones, so an empty key matches every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessKey {
    pub pid: Option<u32>,
    pub runtime_instance_cookie: Option<Uuid>,
}

impl ProcessKey {
    /// Key selecting by process id alone.
    pub fn from_pid(pid: u32) -> Self {
        Self {
            pid: Some(pid),
            runtime_instance_cookie: None,
        }
    }

    /// Key selecting by runtime instance cookie alone.
    pub fn from_cookie(cookie: Uuid) -> Self {
        Self {
            pid: None,
            runtime_instance_cookie: Some(cookie),
        }
    }

    /// Key requiring both fields to match.
    pub fn new(pid: u32, cookie: Uuid) -> Self {
        Self {
            pid: Some(pid),
            runtime_instance_cookie: Some(cookie),
        }
    }

    /// Conjunctive match against one endpoint. A key never partially
    /// matches: every present field must agree.
    pub fn matches(&self, endpoint: &EndpointInfo) -> bool {
        if let Some(pid) = self.pid {
            if endpoint.pid != pid {
                return false;
            }
        }
        if let Some(cookie) = self.runtime_instance_cookie {
            if endpoint.runtime_instance_cookie != Some(cookie) {
                return false;
            }
        }
        true
    }
}

/// Outcome of the command-line lookup: resolved text or an explicit
/// unresolved marker. The unresolved path is ordinary control flow here, not
/// an error.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CmdLine {
    Resolved(String),
    Unresolved,
}

/// A fully resolved process record.
///
/// Created fresh per resolution request, owned solely by its caller, never
/// cached. Textual fields are either genuine values or exactly
/// [`PROCESS_FIELD_UNKNOWN`].
#[derive(Debug, Clone)]
pub struct ProcessInfo {
    endpoint: EndpointInfo,
    command_line: String,
    process_name: String,
    operating_system: String,
    process_architecture: String,
}

impl ProcessInfo {
    /// Resolves one endpoint, bounding the command-line fallback round trip
    /// by `extended_info_timeout`.
    pub async fn resolve(endpoint: &EndpointInfo, extended_info_timeout: Duration) -> Self {
        Self::resolve_until(endpoint, Instant::now() + extended_info_timeout).await
    }

    /// Resolves one endpoint against an absolute deadline, so a batch of
    /// resolutions can share a single fallback budget. Holds no shared
    /// mutable state; safe to run concurrently across distinct endpoints.
    pub(crate) async fn resolve_until(endpoint: &EndpointInfo, deadline: Instant) -> Self {
        let command_line = match endpoint.command_line.as_deref() {
            Some(cmdline) if !cmdline.is_empty() => CmdLine::Resolved(cmdline.to_string()),
            _ => request_command_line_until(endpoint, deadline).await,
        };

        // Older runtimes do not report their operating system. The transport
        // requires host and target OS family to match, so the local host is a
        // sufficient stand-in for the flavor decision.
        let windows_style = match endpoint.operating_system.as_deref() {
            Some(os) if !os.is_empty() => os.eq_ignore_ascii_case(OPERATING_SYSTEM_WINDOWS),
            _ => cfg!(windows),
        };

        let process_name = match &command_line {
            CmdLine::Resolved(raw) => cmdline::extract_executable_path(raw, windows_style)
                .and_then(|path| cmdline::process_name_from_path(&path, windows_style)),
            CmdLine::Unresolved => None,
        };

        Self {
            command_line: match command_line {
                CmdLine::Resolved(raw) => raw,
                CmdLine::Unresolved => PROCESS_FIELD_UNKNOWN.to_string(),
            },
            process_name: process_name.unwrap_or_else(|| PROCESS_FIELD_UNKNOWN.to_string()),
            operating_system: sentinel_or(endpoint.operating_system.clone()),
            process_architecture: sentinel_or(endpoint.process_architecture.clone()),
            endpoint: endpoint.clone(),
        }
    }

    /// The endpoint this record was resolved from.
    pub fn endpoint(&self) -> &EndpointInfo {
        &self.endpoint
    }

    pub fn pid(&self) -> u32 {
        self.endpoint.pid
    }

    pub fn runtime_instance_cookie(&self) -> Option<Uuid> {
        self.endpoint.runtime_instance_cookie
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    pub fn operating_system(&self) -> &str {
        &self.operating_system
    }

    pub fn process_architecture(&self) -> &str {
        &self.process_architecture
    }
}

fn sentinel_or(value: Option<String>) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => PROCESS_FIELD_UNKNOWN.to_string(),
    }
}

/// Exactly one time-boxed IPC round trip for the command line. Timeout,
/// permission failure, and transport errors all degrade to `Unresolved`;
/// listing and selection must never fail over missing deep metadata.
async fn request_command_line_until(endpoint: &EndpointInfo, deadline: Instant) -> CmdLine {
    match tokio::time::timeout_at(deadline, endpoint.transport.request_command_line()).await {
        Ok(Ok(cmdline)) if !cmdline.is_empty() => CmdLine::Resolved(cmdline),
        Ok(Ok(_)) => {
            debug!(pid = endpoint.pid, "target reported an empty command line");
            CmdLine::Unresolved
        }
        Ok(Err(err)) => {
            debug!(pid = endpoint.pid, "command line lookup failed: {}", err);
            CmdLine::Unresolved
        }
        Err(_) => {
            debug!(
                pid = endpoint.pid,
                "command line lookup exceeded the extended-info budget"
            );
            CmdLine::Unresolved
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::EndpointInfo;
    use crate::error::{Error, Result};
    use crate::transport::DiagnosticTransport;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::Arc;

    struct NoTransport;

    #[async_trait]
    impl DiagnosticTransport for NoTransport {
        async fn request_command_line(&self) -> Result<String> {
            Err(Error::Transport("not connected".into()))
        }

        async fn write_dump(
            &self,
            _dump_type: crate::dump::TransportDumpType,
            _dest: &Path,
        ) -> Result<()> {
            Err(Error::Transport("not connected".into()))
        }

        async fn wait_for_connection(&self) -> Result<()> {
            Err(Error::Transport("not connected".into()))
        }
    }

    fn endpoint(pid: u32, cookie: Option<Uuid>) -> EndpointInfo {
        EndpointInfo {
            pid,
            runtime_instance_cookie: cookie,
            operating_system: None,
            process_architecture: None,
            command_line: None,
            transport: Arc::new(NoTransport),
        }
    }

    #[test]
    fn test_empty_key_matches_everything() {
        let key = ProcessKey::default();
        assert!(key.matches(&endpoint(1, None)));
        assert!(key.matches(&endpoint(42, Some(Uuid::new_v4()))));
    }

    #[test]
    fn test_pid_key_matches_only_that_pid() {
        let key = ProcessKey::from_pid(42);
        assert!(key.matches(&endpoint(42, None)));
        assert!(!key.matches(&endpoint(43, None)));
    }

    #[test]
    fn test_cookie_key_requires_cookie_presence() {
        let cookie = Uuid::new_v4();
        let key = ProcessKey::from_cookie(cookie);
        assert!(key.matches(&endpoint(1, Some(cookie))));
        assert!(!key.matches(&endpoint(1, Some(Uuid::new_v4()))));
        assert!(!key.matches(&endpoint(1, None)));
    }

    #[test]
    fn test_full_key_is_conjunctive() {
        let cookie = Uuid::new_v4();
        let key = ProcessKey::new(42, cookie);
        assert!(key.matches(&endpoint(42, Some(cookie))));
        // Right pid, wrong cookie: no partial match.
        assert!(!key.matches(&endpoint(42, Some(Uuid::new_v4()))));
        // Right cookie, wrong pid: no partial match.
        assert!(!key.matches(&endpoint(7, Some(cookie))));
    }

    #[tokio::test]
    async fn test_transport_failure_degrades_to_sentinel() {
        let info = ProcessInfo::resolve(&endpoint(9, None), Duration::from_millis(50)).await;
        assert_eq!(info.command_line(), PROCESS_FIELD_UNKNOWN);
        assert_eq!(info.process_name(), PROCESS_FIELD_UNKNOWN);
        assert_eq!(info.operating_system(), PROCESS_FIELD_UNKNOWN);
        assert_eq!(info.process_architecture(), PROCESS_FIELD_UNKNOWN);
    }

    #[tokio::test]
    async fn test_endpoint_command_line_used_verbatim() {
        let mut ep = endpoint(9, None);
        ep.command_line = Some("\"/usr/bin/dotnet\" myapp.dll".to_string());
        ep.operating_system = Some("linux".to_string());
        let info = ProcessInfo::resolve(&ep, Duration::from_millis(50)).await;
        assert_eq!(info.command_line(), "\"/usr/bin/dotnet\" myapp.dll");
        assert_eq!(info.process_name(), "dotnet");
        assert_eq!(info.operating_system(), "linux");
    }

    #[tokio::test]
    async fn test_windows_flavor_strips_extension() {
        let mut ep = endpoint(9, None);
        ep.command_line = Some(r"C:\dir\app.exe --flag".to_string());
        ep.operating_system = Some("Windows".to_string());
        let info = ProcessInfo::resolve(&ep, Duration::from_millis(50)).await;
        assert_eq!(info.process_name(), "app");
    }
}

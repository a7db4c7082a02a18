//! Discovery and selection services over the endpoint snapshot.
//!
//! [`DiagnosticServices`] is the crate's front door: it lists resolved
//! processes, selects exactly one process for a request, and orchestrates
//! dump capture. It owns the subsystem's only piece of process-wide mutable
//! state, the shutdown cancellation token, which transitions exactly once.

use futures::future::join_all;
use std::future::Future;
use tokio::time::{timeout, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DiscoveryConfig, StorageConfig};
use crate::container::detect_container;
use crate::dump::{DumpCapture, DumpCollector, DumpStream, DumpType};
use crate::endpoint::{EndpointInfo, EndpointSource};
use crate::error::{Error, Result};
use crate::process::{ProcessInfo, ProcessKey};

/// A container's entrypoint process id is 1.
pub const CONTAINER_ENTRYPOINT_PID: u32 = 1;

/// Outcome of probing the container-entrypoint endpoint. Everything but
/// `Live` falls through to generic selection instead of failing the call.
#[derive(Debug)]
enum ProbeOutcome {
    /// Pid 1 advertises an endpoint and accepted a diagnostic connection
    /// within the probe budget.
    Live(EndpointInfo),
    /// Pid 1 advertises an endpoint but it did not prove live in time.
    Unreachable,
    /// No endpoint for pid 1 in the snapshot.
    Absent,
}

/// Breaks a multi-candidate tie during selection.
///
/// The production selector never disambiguates on its own; this seam exists
/// for development-host conveniences and is injected explicitly by the host
/// layer or by tests.
pub trait TieBreaker: Send + Sync {
    /// Picks one of the candidates, or `None` to leave the tie standing.
    fn break_tie<'a>(&self, candidates: &[&'a EndpointInfo]) -> Option<&'a EndpointInfo>;
}

/// Process discovery, selection, and dump orchestration.
pub struct DiagnosticServices<S> {
    source: S,
    discovery: DiscoveryConfig,
    collector: DumpCollector,
    in_container: bool,
    tie_breaker: Option<Box<dyn TieBreaker>>,
    cancel: CancellationToken,
}

impl<S: EndpointSource> DiagnosticServices<S> {
    /// Builds the services over an endpoint source. Container mode and the
    /// dump capture capability are both decided here, once.
    pub fn new(source: S, storage: StorageConfig, discovery: DiscoveryConfig) -> Self {
        Self {
            source,
            discovery,
            collector: DumpCollector::new(storage),
            in_container: detect_container(),
            tie_breaker: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides container-mode detection. Tests exercise the entrypoint
    /// rule with this regardless of where they run.
    pub fn with_container_mode(mut self, in_container: bool) -> Self {
        self.in_container = in_container;
        self
    }

    /// Injects a tie-breaking strategy for multi-candidate selection.
    pub fn with_tie_breaker(mut self, tie_breaker: Box<dyn TieBreaker>) -> Self {
        self.tie_breaker = Some(tie_breaker);
        self
    }

    /// Overrides the dump capture capability, keeping the configured
    /// storage. Tests use this to capture through a fake transport.
    pub fn with_dump_capture(mut self, capture: Box<dyn DumpCapture>) -> Self {
        self.collector.set_capture(capture);
        self
    }

    /// Resolves every endpoint in a fresh snapshot, concurrently.
    ///
    /// The extended-info fallback shares one deadline across the batch, so
    /// listing latency stays bounded: endpoints that miss the deadline come
    /// back with sentinel fields rather than failing the batch. The result
    /// has exactly one entry per endpoint, in enumeration order.
    pub async fn list_processes(&self) -> Result<Vec<ProcessInfo>> {
        self.guard(async {
            let endpoints = self.source.endpoints().await?;
            debug!(count = endpoints.len(), "resolving endpoint snapshot");

            let deadline = Instant::now() + self.discovery.extended_info_timeout();
            let infos = join_all(
                endpoints
                    .iter()
                    .map(|endpoint| ProcessInfo::resolve_until(endpoint, deadline)),
            )
            .await;

            Ok(infos)
        })
        .await
    }

    /// Selects exactly one process and resolves it.
    ///
    /// With a key, the snapshot is filtered conjunctively over the key's
    /// present fields and must leave exactly one endpoint. Without a key,
    /// a containerized host first tries the entrypoint process, probing
    /// that its endpoint is actually live; any probe failure falls through
    /// to the same exactly-one rule over the whole snapshot.
    pub async fn get_process(&self, key: Option<ProcessKey>) -> Result<ProcessInfo> {
        self.guard(async {
            let endpoints = self.source.endpoints().await?;

            if key.is_none() && self.in_container {
                match self.probe_entrypoint(&endpoints).await {
                    ProbeOutcome::Live(endpoint) => {
                        info!(pid = endpoint.pid, "selected container entrypoint process");
                        return Ok(self.resolve_one(&endpoint).await);
                    }
                    outcome => {
                        debug!(?outcome, "container entrypoint unavailable, using generic selection");
                    }
                }
            }

            self.select_single(&endpoints, key.as_ref()).await
        })
        .await
    }

    /// Captures a dump of an already-selected process.
    pub async fn capture_dump(
        &self,
        process: &ProcessInfo,
        dump_type: DumpType,
    ) -> Result<DumpStream> {
        self.guard(self.collector.capture(process, dump_type)).await
    }

    /// Shuts the subsystem down. Idempotent: the cancellation owner
    /// transitions once and is never reset; in-flight and later calls fail
    /// with [`Error::Shutdown`].
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("diagnostic services shutting down");
        }
        self.cancel.cancel();
    }

    async fn probe_entrypoint(&self, endpoints: &[EndpointInfo]) -> ProbeOutcome {
        let Some(endpoint) = endpoints
            .iter()
            .find(|endpoint| endpoint.pid == CONTAINER_ENTRYPOINT_PID)
        else {
            return ProbeOutcome::Absent;
        };

        match timeout(
            self.discovery.entrypoint_probe_timeout(),
            endpoint.transport.wait_for_connection(),
        )
        .await
        {
            Ok(Ok(())) => ProbeOutcome::Live(endpoint.clone()),
            Ok(Err(err)) => {
                debug!(pid = endpoint.pid, "entrypoint probe failed: {}", err);
                ProbeOutcome::Unreachable
            }
            Err(_) => {
                debug!(pid = endpoint.pid, "entrypoint probe timed out");
                ProbeOutcome::Unreachable
            }
        }
    }

    async fn select_single(
        &self,
        endpoints: &[EndpointInfo],
        key: Option<&ProcessKey>,
    ) -> Result<ProcessInfo> {
        let candidates: Vec<&EndpointInfo> = endpoints
            .iter()
            .filter(|endpoint| key.map_or(true, |key| key.matches(endpoint)))
            .collect();

        match candidates.as_slice() {
            [] => Err(Error::NotFound),
            [endpoint] => Ok(self.resolve_one(endpoint).await),
            _ => {
                if let Some(tie_breaker) = &self.tie_breaker {
                    if let Some(endpoint) = tie_breaker.break_tie(&candidates) {
                        debug!(pid = endpoint.pid, "tie broken by injected strategy");
                        return Ok(self.resolve_one(endpoint).await);
                    }
                }
                Err(Error::Ambiguous)
            }
        }
    }

    async fn resolve_one(&self, endpoint: &EndpointInfo) -> ProcessInfo {
        ProcessInfo::resolve(endpoint, self.discovery.extended_info_timeout()).await
    }

    /// Races an operation against subsystem shutdown; shutdown always wins.
    async fn guard<T>(&self, op: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Shutdown),
            result = op => result,
        }
    }
}

impl<S> Drop for DiagnosticServices<S> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

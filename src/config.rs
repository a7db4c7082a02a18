//! Configuration consumed by the discovery subsystem.
//!
//! These types are owned and populated by the surrounding host layer; this
//! crate only defines their shape and defaults. Both structs deserialize with
//! per-field defaults so a partial document is always valid.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default bound on the command-line fallback IPC round trip, in milliseconds.
pub const DEFAULT_EXTENDED_INFO_TIMEOUT_MS: u64 = 500;

/// Default bound on the container-entrypoint liveness probe, in milliseconds.
pub const DEFAULT_ENTRYPOINT_PROBE_TIMEOUT_MS: u64 = 250;

/// Storage locations used by dump capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that receives dump temp files before they are streamed out.
    #[serde(default = "default_dump_temp_dir")]
    pub dump_temp_dir: PathBuf,
}

fn default_dump_temp_dir() -> PathBuf {
    std::env::temp_dir()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dump_temp_dir: default_dump_temp_dir(),
        }
    }
}

/// Timing knobs for process discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Bound on the per-process extended-info fallback (command line lookup)
    /// in milliseconds (default: 500).
    #[serde(default = "default_extended_info_timeout_ms")]
    pub extended_info_timeout_ms: u64,

    /// Bound on the container-entrypoint liveness probe in milliseconds
    /// (default: 250).
    #[serde(default = "default_entrypoint_probe_timeout_ms")]
    pub entrypoint_probe_timeout_ms: u64,
}

fn default_extended_info_timeout_ms() -> u64 {
    DEFAULT_EXTENDED_INFO_TIMEOUT_MS
}

fn default_entrypoint_probe_timeout_ms() -> u64 {
    DEFAULT_ENTRYPOINT_PROBE_TIMEOUT_MS
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            extended_info_timeout_ms: default_extended_info_timeout_ms(),
            entrypoint_probe_timeout_ms: default_entrypoint_probe_timeout_ms(),
        }
    }
}

impl DiscoveryConfig {
    /// The extended-info fallback bound as a [`Duration`].
    pub fn extended_info_timeout(&self) -> Duration {
        Duration::from_millis(self.extended_info_timeout_ms)
    }

    /// The entrypoint probe bound as a [`Duration`].
    pub fn entrypoint_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.entrypoint_probe_timeout_ms)
    }
}

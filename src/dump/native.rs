//! In-process minidump capture for Windows hosts.

use async_trait::async_trait;
use std::fs::File;
use std::os::windows::io::AsRawHandle;
use std::path::Path;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::{
    MiniDumpNormal, MiniDumpWithDataSegs, MiniDumpWithFullMemory, MiniDumpWithFullMemoryInfo,
    MiniDumpWithHandleData, MiniDumpWithPrivateReadWriteMemory, MiniDumpWithThreadInfo,
    MiniDumpWithUnloadedModules, MiniDumpWriteDump, MINIDUMP_TYPE,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_DUP_HANDLE, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use super::{DumpCapture, DumpType};
use crate::endpoint::EndpointInfo;
use crate::error::{Error, Result};

/// Native capture through `MiniDumpWriteDump`, opening the target by pid.
pub struct NativeDumpCapture;

#[async_trait]
impl DumpCapture for NativeDumpCapture {
    async fn capture(
        &self,
        endpoint: &EndpointInfo,
        dump_type: DumpType,
        dest: &Path,
    ) -> Result<()> {
        let pid = endpoint.pid;
        let dest = dest.to_path_buf();

        // MiniDumpWriteDump is synchronous and can take a while for large
        // targets; keep it off the async workers.
        tokio::task::spawn_blocking(move || write_minidump(pid, &dest, dump_type))
            .await
            .map_err(|err| Error::Capture(format!("dump task failed: {err}")))?
    }
}

fn write_minidump(pid: u32, dest: &Path, dump_type: DumpType) -> Result<()> {
    let file = File::create(dest)?;

    unsafe {
        let process = OpenProcess(
            PROCESS_QUERY_INFORMATION | PROCESS_VM_READ | PROCESS_DUP_HANDLE,
            false,
            pid,
        )
        .map_err(|err| Error::Capture(format!("failed to open process {pid}: {err}")))?;

        let result = MiniDumpWriteDump(
            process,
            pid,
            HANDLE(file.as_raw_handle() as _),
            minidump_flags(dump_type),
            None,
            None,
            None,
        );

        let _ = CloseHandle(process);

        result.map_err(|err| Error::Capture(format!("minidump write failed: {err}")))
    }
}

/// Minidump flag sets per semantic flavor, mirroring what the diagnostics
/// transport requests for the equivalent dump commands.
fn minidump_flags(dump_type: DumpType) -> MINIDUMP_TYPE {
    match dump_type {
        DumpType::Full => MINIDUMP_TYPE(
            MiniDumpWithFullMemory.0
                | MiniDumpWithDataSegs.0
                | MiniDumpWithHandleData.0
                | MiniDumpWithUnloadedModules.0
                | MiniDumpWithFullMemoryInfo.0
                | MiniDumpWithThreadInfo.0,
        ),
        DumpType::WithHeap => MINIDUMP_TYPE(
            MiniDumpWithPrivateReadWriteMemory.0
                | MiniDumpWithDataSegs.0
                | MiniDumpWithHandleData.0
                | MiniDumpWithUnloadedModules.0
                | MiniDumpWithFullMemoryInfo.0
                | MiniDumpWithThreadInfo.0,
        ),
        DumpType::Triage | DumpType::Mini => MiniDumpNormal,
    }
}

//! Self-deleting dump stream.
//!
//! The host layer streams dumps out while compressing on the fly, so the
//! final size is never known upfront and the stream is forward-only: this
//! type implements `AsyncRead` but deliberately not `AsyncSeek`. The backing
//! temp file is removed on every exit path.

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::fs::File;
use tokio::io::{AsyncRead, ReadBuf};
use tracing::debug;

use crate::error::Result;

/// Readable, forward-only stream over a captured dump file.
///
/// Dropping the stream removes the backing file; [`DumpStream::close`] does
/// the same with an observable result. There is no way to reopen or seek.
#[derive(Debug)]
pub struct DumpStream {
    file: Option<File>,
    path: PathBuf,
    deleted: bool,
}

impl DumpStream {
    /// Opens a freshly captured dump for streaming. If the file cannot be
    /// opened the stream object never exists, and the file is removed here
    /// so the failure leaves nothing behind.
    pub(crate) async fn open(path: PathBuf) -> Result<Self> {
        match File::open(&path).await {
            Ok(file) => Ok(Self {
                file: Some(file),
                path,
                deleted: false,
            }),
            Err(err) => {
                let _ = tokio::fs::remove_file(&path).await;
                Err(err.into())
            }
        }
    }

    /// Path of the backing temp file, valid until the stream is closed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the stream and removes the backing file.
    ///
    /// Equivalent to dropping the stream, but surfaces removal errors. The
    /// file handle is released before the unlink so the removal also
    /// succeeds on platforms that refuse to delete open files.
    pub async fn close(mut self) -> Result<()> {
        self.file.take();
        self.deleted = true;
        tokio::fs::remove_file(&self.path).await?;
        debug!(path = %self.path.display(), "dump stream closed, backing file removed");
        Ok(())
    }
}

impl AsyncRead for DumpStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.file.as_mut() {
            Some(file) => Pin::new(file).poll_read(cx, buf),
            // Closed: plain EOF.
            None => Poll::Ready(Ok(())),
        }
    }
}

impl Drop for DumpStream {
    fn drop(&mut self) {
        if !self.deleted {
            // Release the handle first; best effort beyond that.
            self.file.take();
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

//! Capture worker
//!
//! One OS thread per running capture. The thread opens the stream, records
//! its frame size once, then decodes frames into the session's [`FrameSlot`]
//! until it is cancelled or the stream fails. Stopping is cooperative: the
//! cancellation token is checked between reads, so a stop waits for at most
//! one blocking read.

use std::sync::Arc;
use std::thread::JoinHandle;

use tokio_util::sync::CancellationToken;

use crate::device::redact_uri;
use crate::stats::CaptureCounters;

use super::frame::{Frame, FrameSlot};
use super::source::{CaptureError, StreamOpener};

/// How a capture thread finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureExit {
    /// Cancelled by its owner
    Stopped,
    /// The stream failed; the error was also published to the slot
    Failed(CaptureError),
}

/// Handle to a running capture thread
///
/// Dropping the handle cancels the thread without waiting for it; use
/// [`FrameCapture::stop`] to wait until the stream is released.
#[derive(Debug)]
pub struct FrameCapture {
    label: String,
    cancel: CancellationToken,
    thread: Option<JoinHandle<CaptureExit>>,
}

impl FrameCapture {
    /// Spawn a capture thread for `uri`
    pub fn start(
        label: impl Into<String>,
        uri: String,
        opener: Arc<dyn StreamOpener>,
        slot: Arc<FrameSlot>,
        counters: Arc<CaptureCounters>,
    ) -> Result<Self, CaptureError> {
        let label = label.into();
        let cancel = CancellationToken::new();

        let worker = Worker {
            label: label.clone(),
            uri,
            opener,
            slot,
            counters,
            cancel: cancel.clone(),
        };

        let thread = std::thread::Builder::new()
            .name(format!("capture-{}", label))
            .spawn(move || worker.run())
            .map_err(|e| CaptureError::Spawn(e.to_string()))?;

        tracing::debug!(capture = %label, "Capture thread started");

        Ok(Self {
            label,
            cancel,
            thread: Some(thread),
        })
    }

    /// Label used for the thread name and logs
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the thread has already exited (stream failure)
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().map_or(true, |t| t.is_finished())
    }

    /// Cancel the thread and wait for it to exit
    ///
    /// The join runs on the blocking pool so the calling task's runtime thread
    /// stays free while the worker finishes its current read.
    pub async fn stop(mut self) -> Result<CaptureExit, CaptureError> {
        self.cancel.cancel();

        let Some(thread) = self.thread.take() else {
            return Ok(CaptureExit::Stopped);
        };

        let exit = match tokio::task::spawn_blocking(move || thread.join()).await {
            Ok(Ok(exit)) => Ok(exit),
            Ok(Err(_)) | Err(_) => Err(CaptureError::WorkerPanicked),
        };

        tracing::debug!(capture = %self.label, exit = ?exit, "Capture thread joined");
        exit
    }
}

impl Drop for FrameCapture {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Worker {
    label: String,
    uri: String,
    opener: Arc<dyn StreamOpener>,
    slot: Arc<FrameSlot>,
    counters: Arc<CaptureCounters>,
    cancel: CancellationToken,
}

impl Worker {
    fn run(self) -> CaptureExit {
        if self.cancel.is_cancelled() {
            return CaptureExit::Stopped;
        }

        let mut source = match self.opener.open(&self.uri) {
            Ok(source) => source,
            Err(e) => return self.fail(e),
        };

        let (width, height) = source.dimensions();
        self.counters.stream_opened(width, height);

        tracing::info!(
            capture = %self.label,
            uri = %redact_uri(&self.uri),
            width = width,
            height = height,
            "Stream opened"
        );

        let exit = loop {
            if self.cancel.is_cancelled() {
                break CaptureExit::Stopped;
            }

            match source.read_frame() {
                Ok(data) => {
                    // A read that straddles a stop must not publish into a
                    // slot that the next capture is about to own.
                    if self.cancel.is_cancelled() {
                        break CaptureExit::Stopped;
                    }

                    let len = data.len();
                    let sequence = self.counters.frames_decoded();
                    match Frame::rgb(data, width, height, sequence) {
                        Some(frame) => {
                            self.counters.record_frame(len);
                            self.slot.publish(frame);
                        }
                        None => {
                            self.counters.record_drop();
                            tracing::warn!(
                                capture = %self.label,
                                len = len,
                                width = width,
                                height = height,
                                "Dropped frame with unexpected size"
                            );
                        }
                    }
                }
                Err(_) if self.cancel.is_cancelled() => break CaptureExit::Stopped,
                Err(e) => break self.fail(e),
            }
        };

        drop(source);
        tracing::debug!(capture = %self.label, "Stream released");

        exit
    }

    fn fail(&self, error: CaptureError) -> CaptureExit {
        tracing::error!(capture = %self.label, error = %error, "Stream ended");
        self.slot.end(error.clone());
        CaptureExit::Failed(error)
    }
}

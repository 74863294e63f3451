//! Fakes for the device-control and video boundaries
//!
//! The fake camera exposes two profiles, `main` and `sub`, whose stream URIs
//! end in the profile name. The fake opener sizes frames by that suffix and
//! counts open streams, which is how tests observe worker overlap.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::capture::{CaptureError, Feed, FrameSlot, StreamOpener, VideoSource};
use crate::device::{
    CommandOutput, Credentials, DeviceConnector, DeviceError, Endpoint, PtzCommand, PtzDevice,
    PtzPosition,
};
use crate::session::{Session, Snapshot};

const FRAME_INTERVAL: Duration = Duration::from_millis(2);

/// Wait until the slot holds a feed matching `pred`
pub(crate) async fn wait_for_feed<F>(slot: &FrameSlot, pred: F) -> Feed
where
    F: Fn(&Feed) -> bool,
{
    let mut rx = slot.subscribe();
    let feed = tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|f| pred(f)))
        .await
        .expect("timed out waiting for feed")
        .expect("frame slot closed");
    feed.clone()
}

/// Poll snapshots until one of the given size arrives
pub(crate) async fn poll_snapshot(session: &Session, size: (u32, u32)) -> Snapshot {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(snapshot) = session.snapshot().await.expect("snapshot failed") {
            if (snapshot.width, snapshot.height) == size {
                return snapshot;
            }
        }
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for a {:?} snapshot",
            size
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[derive(Default)]
struct OpenerState {
    live: AtomicUsize,
    max_live: AtomicUsize,
    opened: AtomicUsize,
    fail_open: AtomicBool,
    fail_after: AtomicU64,
    first_frame_delay_ms: AtomicU64,
    panic_on_failure: AtomicBool,
}

/// Stream opener producing solid-color frames
#[derive(Default)]
pub(crate) struct FakeOpener {
    state: Arc<OpenerState>,
    uris: Mutex<Vec<String>>,
}

impl FakeOpener {
    pub const MAIN_SIZE: (u32, u32) = (64, 36);
    pub const SUB_SIZE: (u32, u32) = (32, 18);

    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Streams currently open
    pub fn live(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }

    /// Highest number of streams open at once
    pub fn max_live(&self) -> usize {
        self.state.max_live.load(Ordering::SeqCst)
    }

    /// Streams opened in total
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// URIs passed to `open`, in order
    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }

    pub fn fail_open(&self, fail: bool) {
        self.state.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make streams opened from now on fail after `frames` reads
    pub fn fail_after(&self, frames: u64) {
        self.state.fail_after.store(frames, Ordering::SeqCst);
    }

    /// Make streams opened from now on panic instead of returning the
    /// `fail_after` read error
    pub fn panic_on_failure(&self, panic: bool) {
        self.state.panic_on_failure.store(panic, Ordering::SeqCst);
    }

    /// Hold back the first frame of each stream opened from now on
    pub fn first_frame_delay(&self, delay: Duration) {
        self.state
            .first_frame_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    fn size_for(uri: &str) -> (u32, u32) {
        if uri.ends_with("/sub") {
            Self::SUB_SIZE
        } else {
            Self::MAIN_SIZE
        }
    }
}

impl StreamOpener for FakeOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn VideoSource>, CaptureError> {
        self.uris.lock().unwrap().push(uri.to_string());

        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(CaptureError::open(uri, "connection refused"));
        }

        let live = self.state.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_live.fetch_max(live, Ordering::SeqCst);
        self.state.opened.fetch_add(1, Ordering::SeqCst);

        let fail_after = self.state.fail_after.load(Ordering::SeqCst);
        let delay = self.state.first_frame_delay_ms.load(Ordering::SeqCst);
        Ok(Box::new(FakeSource {
            state: self.state.clone(),
            first_delay: Some(Duration::from_millis(delay)),
            panic_on_failure: self.state.panic_on_failure.load(Ordering::SeqCst),
            size: Self::size_for(uri),
            corrupt: uri.ends_with("/broken"),
            remaining: (fail_after > 0).then_some(fail_after),
        }))
    }
}

struct FakeSource {
    state: Arc<OpenerState>,
    first_delay: Option<Duration>,
    panic_on_failure: bool,
    size: (u32, u32),
    corrupt: bool,
    remaining: Option<u64>,
}

impl VideoSource for FakeSource {
    fn dimensions(&self) -> (u32, u32) {
        self.size
    }

    fn read_frame(&mut self) -> Result<Bytes, CaptureError> {
        std::thread::sleep(FRAME_INTERVAL);
        if let Some(delay) = self.first_delay.take() {
            std::thread::sleep(delay);
        }

        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                if self.panic_on_failure {
                    panic!("decoder crashed");
                }
                return Err(CaptureError::Read("connection reset".into()));
            }
            *remaining -= 1;
        }

        let (width, height) = self.size;
        let mut len = (width * height * 3) as usize;
        if self.corrupt {
            len -= 1;
        }
        Ok(Bytes::from(vec![0x40; len]))
    }
}

impl Drop for FakeSource {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Camera with `main` and `sub` profiles that records forwarded commands
#[derive(Default)]
pub(crate) struct FakeDevice {
    fail_uri: AtomicBool,
    commands: Mutex<Vec<(String, PtzCommand)>>,
}

impl FakeDevice {
    pub fn fail_uri(&self, fail: bool) {
        self.fail_uri.store(fail, Ordering::SeqCst);
    }

    /// Commands received, with the profile they were sent under
    pub fn commands(&self) -> Vec<(String, PtzCommand)> {
        self.commands.lock().unwrap().clone()
    }
}

#[async_trait]
impl PtzDevice for FakeDevice {
    fn profiles(&self) -> Vec<String> {
        vec!["main".to_string(), "sub".to_string()]
    }

    fn default_profile(&self) -> String {
        "main".to_string()
    }

    async fn stream_uri(&self, profile: &str) -> Result<String, DeviceError> {
        if self.fail_uri.load(Ordering::SeqCst) {
            return Err(DeviceError::Unreachable("no route to host".into()));
        }
        Ok(format!("rtsp://camera.local:554/{}", profile))
    }

    async fn send_command(
        &self,
        profile: &str,
        command: PtzCommand,
    ) -> Result<CommandOutput, DeviceError> {
        self.commands
            .lock()
            .unwrap()
            .push((profile.to_string(), command.clone()));

        match command {
            PtzCommand::GetPosition => Ok(CommandOutput::Position(PtzPosition {
                pan: 0.5,
                tilt: -0.25,
                zoom: 0.0,
            })),
            PtzCommand::GotoPreset(id) if id == "missing" => {
                Err(DeviceError::Rejected(format!("no preset {}", id)))
            }
            PtzCommand::GotoPreset(id) => Ok(CommandOutput::PresetReached(id)),
            _ => Ok(CommandOutput::Ack),
        }
    }
}

/// Connector handing out one shared [`FakeDevice`]
pub(crate) struct FakeConnector {
    pub device: Arc<FakeDevice>,
    connects: AtomicUsize,
    fail: AtomicBool,
    delay: Duration,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::ZERO)
    }

    /// Connector whose handshake takes `delay`
    pub fn with_delay(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            device: Arc::new(FakeDevice::default()),
            connects: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay,
        })
    }

    /// Successful and failed connection attempts
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DeviceConnector for FakeConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn PtzDevice>, DeviceError> {
        self.connects.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(DeviceError::Unreachable(format!("{} timed out", endpoint)));
        }

        Ok(self.device.clone())
    }
}

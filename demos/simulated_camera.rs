//! Session lifecycle against a simulated camera
//!
//! Run with: cargo run --example simulated_camera [TIMEOUT_SECS]
//!
//! The simulated camera has two profiles, `main` (640x360) and `sub`
//! (320x180), and renders a moving gradient. The demo:
//!
//! - creates a session twice for the same endpoint and gets one token back
//! - forwards a few PTZ commands
//! - takes snapshots before and after a profile switch
//! - stops touching the session and watches the reaper remove it
//!
//! Set `RUST_LOG=ptz_session=debug` for per-operation logs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use ptz_session::capture::{CaptureError, StreamOpener, VideoSource};
use ptz_session::device::{
    CommandOutput, DeviceConnector, DeviceError, PtzDevice, PtzPosition, PtzVector,
};
use ptz_session::{Credentials, Endpoint, PtzCommand, PtzService, RegistryConfig};

const FRAME_INTERVAL: Duration = Duration::from_millis(40);

/// Camera head that tracks its position from relative moves
struct SimulatedCamera {
    host: String,
    position: Mutex<PtzPosition>,
}

impl SimulatedCamera {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            position: Mutex::new(PtzPosition::default()),
        }
    }

    fn apply(&self, pan: f64, tilt: f64, zoom: f64, relative: bool) -> PtzPosition {
        let mut position = self.position.lock().unwrap_or_else(|e| e.into_inner());
        if relative {
            position.pan = (position.pan + pan as f32).clamp(-1.0, 1.0);
            position.tilt = (position.tilt + tilt as f32).clamp(-1.0, 1.0);
            position.zoom = (position.zoom + zoom as f32).clamp(0.0, 1.0);
        } else {
            position.pan = (pan as f32).clamp(-1.0, 1.0);
            position.tilt = (tilt as f32).clamp(-1.0, 1.0);
            position.zoom = (zoom as f32).clamp(0.0, 1.0);
        }
        *position
    }
}

#[async_trait]
impl PtzDevice for SimulatedCamera {
    fn profiles(&self) -> Vec<String> {
        vec!["main".to_string(), "sub".to_string()]
    }

    fn default_profile(&self) -> String {
        "main".to_string()
    }

    async fn stream_uri(&self, profile: &str) -> Result<String, DeviceError> {
        Ok(format!("rtsp://{}:554/{}", self.host, profile))
    }

    async fn send_command(
        &self,
        profile: &str,
        command: PtzCommand,
    ) -> Result<CommandOutput, DeviceError> {
        println!("  camera <- {} ({})", command.name(), profile);

        match command {
            PtzCommand::MoveRelative(v) => {
                self.apply(v.pan, v.tilt, v.zoom, true);
                Ok(CommandOutput::Ack)
            }
            PtzCommand::GotoPosition(v) => {
                self.apply(v.pan, v.tilt, v.zoom, false);
                Ok(CommandOutput::Ack)
            }
            PtzCommand::GotoHome => {
                self.apply(0.0, 0.0, 0.0, false);
                Ok(CommandOutput::Ack)
            }
            PtzCommand::GetPosition => {
                let position = *self.position.lock().unwrap_or_else(|e| e.into_inner());
                Ok(CommandOutput::Position(position))
            }
            PtzCommand::GotoPreset(id) => Err(DeviceError::Rejected(format!("no preset {}", id))),
            _ => Ok(CommandOutput::Ack),
        }
    }
}

struct SimulatedConnector {
    connects: AtomicU64,
}

#[async_trait]
impl DeviceConnector for SimulatedConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        _credentials: &Credentials,
    ) -> Result<Arc<dyn PtzDevice>, DeviceError> {
        self.connects.fetch_add(1, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Arc::new(SimulatedCamera::new(&endpoint.address)))
    }
}

/// Renders a gradient that scrolls one column per frame
struct GradientSource {
    width: u32,
    height: u32,
    tick: u32,
}

impl VideoSource for GradientSource {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn read_frame(&mut self) -> Result<Bytes, CaptureError> {
        std::thread::sleep(FRAME_INTERVAL);
        self.tick = self.tick.wrapping_add(1);

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                let r = ((x + self.tick % self.width) % self.width * 255 / self.width) as u8;
                let g = (y * 255 / self.height) as u8;
                data.extend_from_slice(&[r, g, 128]);
            }
        }
        Ok(Bytes::from(data))
    }
}

struct GradientOpener;

impl StreamOpener for GradientOpener {
    fn open(&self, uri: &str) -> Result<Box<dyn VideoSource>, CaptureError> {
        let (width, height) = if uri.ends_with("/sub") {
            (320, 180)
        } else if uri.ends_with("/main") {
            (640, 360)
        } else {
            return Err(CaptureError::open(uri, "unknown stream"));
        };

        Ok(Box::new(GradientSource {
            width,
            height,
            tick: 0,
        }))
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let timeout_secs: u64 = match std::env::args().nth(1) {
        Some(arg) => arg.parse()?,
        None => 3,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("ptz_session=info".parse()?),
        )
        .init();

    let connector = Arc::new(SimulatedConnector {
        connects: AtomicU64::new(0),
    });
    let config = RegistryConfig::default()
        .session_timeout(Duration::from_secs(timeout_secs))
        .reap_interval(Duration::from_millis(250));
    let service = PtzService::with_config(connector.clone(), Arc::new(GradientOpener), config);
    let reaper = service.spawn_reaper();

    let endpoint = Endpoint::new("192.168.1.64", 80);
    let credentials = Credentials::new("admin", "admin123");

    println!("=== Two clients connect ===");
    let (a, b) = tokio::join!(
        service.create_session(&endpoint, &credentials),
        service.create_session(&endpoint, &credentials),
    );
    let (a, b) = (a?, b?);
    println!(
        "client A: {}\nclient B: {}\ndevice connections: {}",
        a,
        b,
        connector.connects.load(Ordering::Relaxed)
    );

    println!();
    println!("=== PTZ control ===");
    service
        .forward_command(&a, PtzCommand::MoveRelative(PtzVector::new(0.2, -0.1, 0.0)))
        .await?;
    service
        .forward_command(&a, PtzCommand::MoveRelative(PtzVector::new(0.2, 0.0, 0.3)))
        .await?;
    if let CommandOutput::Position(p) = service.forward_command(&a, PtzCommand::GetPosition).await? {
        println!("  position: pan={:.2} tilt={:.2} zoom={:.2}", p.pan, p.tilt, p.zoom);
    }
    if let Err(e) = service
        .forward_command(&a, PtzCommand::GotoPreset("7".into()))
        .await
    {
        println!("  preset failed: {}", e);
    }

    println!();
    println!("=== Snapshots ===");
    match service.get_snapshot(&a).await? {
        Some(s) => println!("  immediately: {}x{}", s.width, s.height),
        None => println!("  immediately: not available yet"),
    }
    tokio::time::sleep(Duration::from_millis(300)).await;
    if let Some(s) = service.get_snapshot(&a).await? {
        println!(
            "  main: {}x{} frame #{} ({} bytes JPEG, data URI {} chars)",
            s.width,
            s.height,
            s.sequence,
            s.jpeg.len(),
            s.to_data_uri().len()
        );
    }

    service.switch_profile(&a, "sub").await?;
    tokio::time::sleep(Duration::from_millis(300)).await;
    if let Some(s) = service.get_snapshot(&a).await? {
        println!("  sub:  {}x{} frame #{}", s.width, s.height, s.sequence);
    }

    let stats = service.session_stats(&a).await?;
    println!(
        "  decoded={} dropped={} captures={} fps={:.1}",
        stats.frames_decoded, stats.frames_dropped, stats.captures_started, stats.framerate
    );

    println!();
    println!("=== Idle for {}s ===", timeout_secs);
    while service.registry().lookup(&a).await.is_some() {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
    match service.touch_session(&a).await {
        Ok(()) => println!("  session still alive"),
        Err(e) => println!("  touch after timeout: {}", e),
    }
    println!("  registry: {:?}", service.stats().await);

    reaper.abort();
    service.shutdown().await;
    Ok(())
}

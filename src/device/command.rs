//! Camera control commands and their results
//!
//! These mirror the operations a PTZ camera exposes over ONVIF. The session
//! layer does not interpret them; it only forwards them under the session's
//! selected profile.

/// Normalized pan/tilt/zoom coordinates with per-axis speeds
///
/// Coordinates follow the ONVIF generic spaces: pan and tilt in `-1.0..=1.0`,
/// zoom in `0.0..=1.0`, speeds in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PtzVector {
    pub pan: f64,
    pub tilt: f64,
    pub zoom: f64,
    pub pan_speed: f64,
    pub tilt_speed: f64,
    pub zoom_speed: f64,
}

impl PtzVector {
    /// Create a vector with full speed on every axis
    pub fn new(pan: f64, tilt: f64, zoom: f64) -> Self {
        Self {
            pan,
            tilt,
            zoom,
            pan_speed: 1.0,
            tilt_speed: 1.0,
            zoom_speed: 1.0,
        }
    }

    /// Set per-axis speeds
    pub fn with_speed(mut self, pan: f64, tilt: f64, zoom: f64) -> Self {
        self.pan_speed = pan;
        self.tilt_speed = tilt;
        self.zoom_speed = zoom;
        self
    }

    /// The home position (centered, fully zoomed out, full speed)
    pub fn home() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// A device-control request forwarded by a session
#[derive(Debug, Clone, PartialEq)]
pub enum PtzCommand {
    /// Move by an offset from the current position
    MoveRelative(PtzVector),
    /// Move to an absolute position
    GotoPosition(PtzVector),
    /// Move to the home position
    GotoHome,
    /// Move to a stored preset
    GotoPreset(String),
    /// Stop any pan/tilt/zoom movement
    Stop,
    /// Read the camera's stream profiles and PTZ ranges
    GetConfigs,
    /// List stored presets
    GetPresets,
    /// Read the current position
    GetPosition,
    /// Read the movement status
    IsMoving,
}

impl PtzCommand {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            PtzCommand::MoveRelative(_) => "move_relative",
            PtzCommand::GotoPosition(_) => "goto_position",
            PtzCommand::GotoHome => "goto_home",
            PtzCommand::GotoPreset(_) => "goto_preset",
            PtzCommand::Stop => "stop",
            PtzCommand::GetConfigs => "get_configs",
            PtzCommand::GetPresets => "get_presets",
            PtzCommand::GetPosition => "get_position",
            PtzCommand::IsMoving => "is_moving",
        }
    }

    /// Whether the command moves the camera
    pub fn is_motion(&self) -> bool {
        matches!(
            self,
            PtzCommand::MoveRelative(_)
                | PtzCommand::GotoPosition(_)
                | PtzCommand::GotoHome
                | PtzCommand::GotoPreset(_)
                | PtzCommand::Stop
        )
    }
}

/// Inclusive range of an axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

/// A media profile advertised by the camera
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamProfile {
    /// Profile name, used to select the profile
    pub name: String,
    /// Device-side profile token
    pub token: String,
    /// Video encoding (e.g. "H264")
    pub encoding: String,
    pub width: u32,
    pub height: u32,
    pub frame_rate_limit: u32,
    pub bitrate_limit: u32,
}

/// Camera configuration: profiles and PTZ axis ranges
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceConfigs {
    pub streams: Vec<StreamProfile>,
    pub pan: AxisRange,
    pub tilt: AxisRange,
    pub zoom: AxisRange,
}

/// Current position of the camera head
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PtzPosition {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

/// A stored preset
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Preset {
    pub id: String,
    pub name: String,
    pub position: PtzPosition,
}

/// Movement status as reported by the camera
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MovingStatus {
    pub moving: bool,
    /// Raw pan/tilt move status (e.g. "IDLE", "MOVING")
    pub pan_tilt: String,
    /// Raw zoom move status
    pub zoom: String,
}

/// Result of a forwarded command
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// Command accepted, nothing to report
    Ack,
    Configs(DeviceConfigs),
    Presets(Vec<Preset>),
    Position(PtzPosition),
    Moving(MovingStatus),
    /// Preset the camera is moving to
    PresetReached(String),
}

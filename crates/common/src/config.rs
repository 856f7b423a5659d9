//! Device-tier profiles.
//!
//! Every size, count and factor the scene uses lives here so that the
//! constrained/standard split is decided in exactly one place. Profiles can be
//! built from a tier or read from YAML; missing YAML keys fall back to the
//! standard tier's values.

use std::path::Path;
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::types::Color;

/// Characters the field cycles through by default. Repeats weight the draw.
pub const DEFAULT_ALPHABET: &str =
    "blaneherndonBLANEHERNDON1234567890-=[]\\;',./!@#$%^&*()_+{}|:<>?";

/// Largest accepted spawn half-extent, in world units.
pub const MAX_HALF_EXTENT: f32 = 1.0e6;
/// Largest accepted swap interval: one day.
pub const MAX_SWAP_INTERVAL_MS: u64 = 86_400_000;
/// Largest accepted minimum frame interval: one minute.
pub const MAX_FRAME_INTERVAL_MS: f64 = 60_000.0;
/// Upper limit on curve subdivision per outline segment.
pub const MAX_CURVE_SEGMENTS: u32 = 256;

/// Errors from loading or validating a profile.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// Coarse device classification consulted once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceTier {
    Constrained,
    #[default]
    Standard,
}

impl DeviceTier {
    /// Classify a user-agent string. Phones and tablets are constrained.
    pub fn from_user_agent(user_agent: &str) -> Self {
        let ua = user_agent.to_ascii_lowercase();
        let mobile = ["iphone", "ipad", "ipod", "android"]
            .iter()
            .any(|needle| ua.contains(needle));
        if mobile {
            Self::Constrained
        } else {
            Self::Standard
        }
    }
}

impl std::str::FromStr for DeviceTier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constrained" | "mobile" => Ok(Self::Constrained),
            "standard" | "desktop" => Ok(Self::Standard),
            other => Err(ConfigError::Invalid(format!("unknown device tier: {other}"))),
        }
    }
}

impl std::fmt::Display for DeviceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Constrained => f.write_str("constrained"),
            Self::Standard => f.write_str("standard"),
        }
    }
}

/// Closed interval used for every clamp in the scroll rig.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f32,
    pub max: f32,
}

impl Bounds {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// Clamp `value` into the interval. Never panics, even on inverted bounds.
    pub fn clamp(&self, value: f32) -> f32 {
        self.min.max(self.max.min(value))
    }

    pub fn contains(&self, value: f32) -> bool {
        value >= self.min && value <= self.max
    }

    fn check(&self, name: &str) -> Result<(), ConfigError> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(ConfigError::Invalid(format!("{name} bounds must be finite")));
        }
        if self.min > self.max {
            return Err(ConfigError::Invalid(format!(
                "{name} bounds inverted: min {} > max {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// Text geometry detail: glyph size, extrusion depth and curve subdivision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphParams {
    /// Em size in world units.
    pub size: f32,
    /// Extrusion depth in world units.
    pub height: f32,
    /// Segments per quadratic/cubic curve.
    pub curve_segments: u32,
}

impl Default for GlyphParams {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl GlyphParams {
    pub fn for_tier(tier: DeviceTier) -> Self {
        match tier {
            DeviceTier::Constrained => Self {
                size: 0.5,
                height: 0.2,
                curve_segments: 6,
            },
            DeviceTier::Standard => Self {
                size: 1.0,
                height: 0.2,
                curve_segments: 12,
            },
        }
    }
}

/// Character field sizing and appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub agent_count: usize,
    /// Half-extent of the axis-aligned spawn cube centred on the origin.
    pub half_extent: f32,
    pub swap_interval_min_ms: u64,
    pub swap_interval_max_ms: u64,
    pub alphabet: String,
    pub front_color: Color,
    pub side_color: Color,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl FieldConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        let (agent_count, half_extent) = match tier {
            DeviceTier::Constrained => (200, 25.0),
            DeviceTier::Standard => (1000, 50.0),
        };
        Self {
            agent_count,
            half_extent,
            swap_interval_min_ms: 250,
            swap_interval_max_ms: 2250,
            alphabet: DEFAULT_ALPHABET.to_string(),
            front_color: Color(0x00ff41),
            side_color: Color(0x008f11),
        }
    }

    pub fn swap_interval(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.swap_interval_min_ms),
            Duration::from_millis(self.swap_interval_max_ms),
        )
    }
}

/// Perspective camera parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Where the camera (and the point light) start before the first scroll.
    pub initial_position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl CameraConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        let (fov_degrees, far) = match tier {
            DeviceTier::Constrained => (60.0, 500.0),
            DeviceTier::Standard => (75.0, 1000.0),
        };
        Self {
            fov_degrees,
            near: 0.1,
            far,
            initial_position: Vec3::new(-3.0, 0.0, 30.0),
        }
    }
}

/// Scroll-to-camera mapping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub scroll_factor: f32,
    pub rotation_factor: f32,
    pub z_bounds: Bounds,
    pub x_bounds: Bounds,
    pub rotation_bounds: Bounds,
    /// Radians added to the avatar's Y and Z rotation per scroll event.
    pub avatar_step: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl ScrollConfig {
    pub fn for_tier(tier: DeviceTier) -> Self {
        let (scroll_factor, rotation_factor) = match tier {
            DeviceTier::Constrained => (0.005, 0.0001),
            DeviceTier::Standard => (0.01, 0.0002),
        };
        Self {
            scroll_factor,
            rotation_factor,
            z_bounds: Bounds::new(-100.0, 30.0),
            x_bounds: Bounds::new(-20.0, 5.0),
            rotation_bounds: Bounds::new(-1.0, 1.0),
            avatar_step: 0.01,
        }
    }
}

/// Render loop pacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    pub min_frame_interval_ms: f64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            min_frame_interval_ms: 16.67,
        }
    }
}

impl FrameConfig {
    /// Saturates into `0..=MAX_FRAME_INTERVAL_MS`; NaN reads as zero.
    pub fn min_frame_interval(&self) -> Duration {
        let ms = self.min_frame_interval_ms.clamp(0.0, MAX_FRAME_INTERVAL_MS);
        Duration::try_from_secs_f64(ms / 1000.0).unwrap_or(Duration::ZERO)
    }
}

/// Asset paths relative to the loader's root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetPaths {
    pub font: String,
    pub avatar_texture: String,
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            font: "fonts/helvetiker_regular.typeface.json".into(),
            avatar_texture: "img/blane.png".into(),
        }
    }
}

/// Everything the stage needs to know about the device it runs on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub tier: DeviceTier,
    pub field: FieldConfig,
    pub glyph: GlyphParams,
    pub camera: CameraConfig,
    pub scroll: ScrollConfig,
    pub frame: FrameConfig,
    pub assets: AssetPaths,
}

impl Default for Profile {
    fn default() -> Self {
        Self::for_tier(DeviceTier::Standard)
    }
}

impl Profile {
    pub fn for_tier(tier: DeviceTier) -> Self {
        Self {
            tier,
            field: FieldConfig::for_tier(tier),
            glyph: GlyphParams::for_tier(tier),
            camera: CameraConfig::for_tier(tier),
            scroll: ScrollConfig::for_tier(tier),
            frame: FrameConfig::default(),
            assets: AssetPaths::default(),
        }
    }

    /// Parse and validate a YAML profile.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let profile: Self = serde_yaml::from_str(yaml)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Load and validate a YAML profile from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&data)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.field.alphabet.is_empty() {
            return Err(ConfigError::Invalid("alphabet is empty".into()));
        }
        if !(self.field.half_extent >= 0.0 && self.field.half_extent <= MAX_HALF_EXTENT) {
            return Err(ConfigError::Invalid(format!(
                "half_extent must be within 0..={MAX_HALF_EXTENT}, got {}",
                self.field.half_extent
            )));
        }
        if self.field.swap_interval_min_ms == 0 {
            return Err(ConfigError::Invalid("swap interval must be positive".into()));
        }
        if self.field.swap_interval_min_ms > self.field.swap_interval_max_ms {
            return Err(ConfigError::Invalid(format!(
                "swap interval inverted: {} > {}",
                self.field.swap_interval_min_ms, self.field.swap_interval_max_ms
            )));
        }
        if self.field.swap_interval_max_ms > MAX_SWAP_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "swap interval max {} ms exceeds {MAX_SWAP_INTERVAL_MS} ms",
                self.field.swap_interval_max_ms
            )));
        }
        let glyph = &self.glyph;
        if !(glyph.size.is_finite() && glyph.size > 0.0 && glyph.height.is_finite() && glyph.height >= 0.0)
        {
            return Err(ConfigError::Invalid("glyph size must be positive and finite".into()));
        }
        if !(1..=MAX_CURVE_SEGMENTS).contains(&glyph.curve_segments) {
            return Err(ConfigError::Invalid(format!(
                "curve_segments must be within 1..={MAX_CURVE_SEGMENTS}, got {}",
                glyph.curve_segments
            )));
        }
        if !(self.camera.near > 0.0 && self.camera.far > self.camera.near && self.camera.far.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "camera planes invalid: near {} far {}",
                self.camera.near, self.camera.far
            )));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "fov out of range: {}",
                self.camera.fov_degrees
            )));
        }
        if !self.camera.initial_position.is_finite() {
            return Err(ConfigError::Invalid("camera initial_position must be finite".into()));
        }
        let interval = self.frame.min_frame_interval_ms;
        if !(interval >= 0.0 && interval <= MAX_FRAME_INTERVAL_MS) {
            return Err(ConfigError::Invalid(format!(
                "min_frame_interval_ms must be within 0..={MAX_FRAME_INTERVAL_MS}, got {interval}"
            )));
        }
        self.scroll.z_bounds.check("z")?;
        self.scroll.x_bounds.check("x")?;
        self.scroll.rotation_bounds.check("rotation")?;
        Ok(())
    }
}

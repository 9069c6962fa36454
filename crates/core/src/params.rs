//! Render parameter snapshot carried by every job.
//!
//! The batch core never interprets these values beyond validation; they
//! are threaded through to the renderer unmodified.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

/// Default camera steadiness (lower = more movement).
pub const DEFAULT_STEADY: f64 = 0.1;
/// Default preset intensity.
pub const DEFAULT_INTENSITY: f64 = 0.5;
/// Default output frame rate.
pub const DEFAULT_FPS: u32 = 24;
/// Default clip length in seconds.
pub const DEFAULT_DURATION_SECS: f64 = 6.0;
/// Default output height; capped to keep VRAM usage predictable.
pub const DEFAULT_OUTPUT_HEIGHT: u32 = 1080;

// ---------------------------------------------------------------------------
// Camera
// ---------------------------------------------------------------------------

/// Base camera configuration applied before the motion preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraParams {
    /// Isometric tilt of the camera.
    pub isometric: f64,
    /// How tall the camera sits above the scene.
    pub height: f64,
    /// Camera steadiness.
    pub steady: f64,
}

impl Default for CameraParams {
    fn default() -> Self {
        CameraProfile::Balanced.camera()
    }
}

/// Named (isometric, height) pairs, from least to most 3D distortion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraProfile {
    Minimal,
    #[default]
    Balanced,
    Dramatic,
}

impl CameraProfile {
    pub fn camera(self) -> CameraParams {
        let (isometric, height) = match self {
            Self::Minimal => (0.8, 0.1),
            Self::Balanced => (0.6, 0.2),
            Self::Dramatic => (0.4, 0.3),
        };
        CameraParams {
            isometric,
            height,
            steady: DEFAULT_STEADY,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Balanced => "balanced",
            Self::Dramatic => "dramatic",
        }
    }

    /// Parse a profile name, case-insensitively.
    pub fn parse(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Self::Minimal),
            "balanced" => Ok(Self::Balanced),
            "dramatic" => Ok(Self::Dramatic),
            other => Err(CoreError::Validation(format!(
                "Invalid camera profile '{other}'. Must be one of: minimal, balanced, dramatic"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Preset + output
// ---------------------------------------------------------------------------

/// Payload shared by every motion preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetParams {
    /// Strength of the motion.
    pub intensity: f64,
    /// Play the animation backwards.
    pub reverse: bool,
    /// Number of animation loops within the clip.
    pub loops: u32,
}

impl Default for PresetParams {
    fn default() -> Self {
        Self {
            intensity: DEFAULT_INTENSITY,
            reverse: false,
            loops: 1,
        }
    }
}

/// Encoding-side settings for the rendered clip.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputParams {
    pub fps: u32,
    pub duration_secs: f64,
    /// Target height in pixels; width follows the source aspect ratio.
    pub height: u32,
    pub loops: u32,
    /// Supersampling factor.
    pub ssaa: u32,
    pub turbo: bool,
}

impl Default for OutputParams {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            duration_secs: DEFAULT_DURATION_SECS,
            height: DEFAULT_OUTPUT_HEIGHT,
            loops: 1,
            ssaa: 1,
            turbo: true,
        }
    }
}

/// Full configuration snapshot stored in a [`Job`](crate::job::Job).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RenderParameters {
    pub camera: CameraParams,
    pub preset: PresetParams,
    pub output: OutputParams,
}

impl RenderParameters {
    /// Reject values no renderer can honour.
    pub fn validate(&self) -> Result<(), CoreError> {
        let finite = [
            ("isometric", self.camera.isometric),
            ("height", self.camera.height),
            ("steady", self.camera.steady),
            ("intensity", self.preset.intensity),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(CoreError::Validation(format!(
                    "{name} must be a finite number"
                )));
            }
        }
        if self.preset.intensity < 0.0 {
            return Err(CoreError::Validation(
                "intensity must not be negative".to_string(),
            ));
        }
        if self.output.fps == 0 {
            return Err(CoreError::Validation("fps must be positive".to_string()));
        }
        if !(self.output.duration_secs.is_finite() && self.output.duration_secs > 0.0) {
            return Err(CoreError::Validation(
                "duration must be a positive number of seconds".to_string(),
            ));
        }
        if self.output.height == 0 {
            return Err(CoreError::Validation(
                "output height must be positive".to_string(),
            ));
        }
        if self.output.ssaa == 0 {
            return Err(CoreError::Validation("ssaa must be at least 1".to_string()));
        }
        if self.preset.loops == 0 || self.output.loops == 0 {
            return Err(CoreError::Validation(
                "loop count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

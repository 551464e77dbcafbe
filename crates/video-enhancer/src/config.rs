//! Persisted settings consumed at construction
//!
//! Where the blob is stored is up to the host; this module only defines its shape and
//! defaults. Every field is optional in the serialized form.

use serde::{Deserialize, Serialize};

use crate::{EnhancerResult, option::PipelineOption};

/// A sample later than `1.5 x` the target frame interval counts as a dropped frame
pub const FRAME_DROP_TOLERANCE: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EnhancerConfig {
    pub frame_drop: FrameDropConfig,
    /// Delay before canvas creation is announced, letting layout settle
    pub settle_delay_ms: u64,
    pub comparison: ComparisonConfig,
}

impl Default for EnhancerConfig {
    fn default() -> Self {
        Self {
            frame_drop: FrameDropConfig::default(),
            settle_delay_ms: 100,
            comparison: ComparisonConfig::default(),
        }
    }
}

impl EnhancerConfig {
    pub fn from_json(json: &str) -> EnhancerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> EnhancerResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameDropConfig {
    pub enabled: bool,
    /// Consecutive late frames that trigger the fallback
    pub threshold: u32,
    pub target_fps: f64,
    /// Detection is suppressed for this long after a session starts
    pub grace_period_ms: f64,
}

impl Default for FrameDropConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: 10,
            target_fps: 60.0,
            grace_period_ms: 3000.0,
        }
    }
}

impl FrameDropConfig {
    pub fn target_interval_ms(&self) -> f64 {
        1000.0 / self.target_fps.max(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonConfig {
    pub enabled: bool,
    pub left: PipelineOption,
    pub right: PipelineOption,
    pub divider_position: f64,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            left: PipelineOption::Off,
            right: PipelineOption::Off,
            divider_position: 50.0,
        }
    }
}

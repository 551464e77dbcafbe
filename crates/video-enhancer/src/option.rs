//! Pipeline option tags and their static routing
//!
//! Which per-frame branch handles an option is decided by the variant alone:
//! [`PipelineOption::Raw`] goes through the cached stable-texture path,
//! [`PipelineOption::Preset`] through the direct frame path, and
//! [`PipelineOption::Off`] never reaches either.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
pub use upscale_kernels::{PresetMode, RawMode};

use crate::EnhancerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PipelineOption {
    #[default]
    Off,
    Preset(PresetMode),
    Raw(RawMode),
}

/// Per-frame branch taken for an option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    None,
    Raw(RawMode),
    Preset(PresetMode),
}

const TAGS: [(&str, PipelineOption); 13] = [
    ("off", PipelineOption::Off),
    ("mode-a", PipelineOption::Preset(PresetMode::ModeA)),
    ("mode-b", PipelineOption::Preset(PresetMode::ModeB)),
    ("mode-c", PipelineOption::Preset(PresetMode::ModeC)),
    ("mode-aa", PipelineOption::Preset(PresetMode::ModeAA)),
    ("mode-bb", PipelineOption::Preset(PresetMode::ModeBB)),
    ("mode-ca", PipelineOption::Preset(PresetMode::ModeCA)),
    ("cnn-x2-m", PipelineOption::Raw(RawMode::CnnX2M)),
    ("cnn-x2-vl", PipelineOption::Raw(RawMode::CnnX2Vl)),
    ("cnn-x2-ul", PipelineOption::Raw(RawMode::CnnX2Ul)),
    ("denoise-cnn-x2-vl", PipelineOption::Raw(RawMode::DenoiseCnnX2Vl)),
    ("gan-x3-l", PipelineOption::Raw(RawMode::GanX3L)),
    ("gan-x4-uul", PipelineOption::Raw(RawMode::GanX4Uul)),
];

impl PipelineOption {
    pub const ALL: [PipelineOption; 13] = {
        let mut all = [PipelineOption::Off; 13];
        let mut i = 0;
        while i < TAGS.len() {
            all[i] = TAGS[i].1;
            i += 1;
        }
        all
    };

    /// Kebab-case tag used in configuration and the web API
    pub fn name(&self) -> &'static str {
        match self {
            PipelineOption::Off => "off",
            PipelineOption::Preset(mode) => match mode {
                PresetMode::ModeA => "mode-a",
                PresetMode::ModeB => "mode-b",
                PresetMode::ModeC => "mode-c",
                PresetMode::ModeAA => "mode-aa",
                PresetMode::ModeBB => "mode-bb",
                PresetMode::ModeCA => "mode-ca",
            },
            PipelineOption::Raw(mode) => match mode {
                RawMode::CnnX2M => "cnn-x2-m",
                RawMode::CnnX2Vl => "cnn-x2-vl",
                RawMode::CnnX2Ul => "cnn-x2-ul",
                RawMode::DenoiseCnnX2Vl => "denoise-cnn-x2-vl",
                RawMode::GanX3L => "gan-x3-l",
                RawMode::GanX4Uul => "gan-x4-uul",
            },
        }
    }

    pub fn is_off(&self) -> bool {
        matches!(self, PipelineOption::Off)
    }

    pub fn route(&self) -> Route {
        match *self {
            PipelineOption::Off => Route::None,
            PipelineOption::Raw(mode) => Route::Raw(mode),
            PipelineOption::Preset(mode) => Route::Preset(mode),
        }
    }
}

impl fmt::Display for PipelineOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PipelineOption {
    type Err = EnhancerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TAGS.iter()
            .find(|(tag, _)| *tag == s)
            .map(|(_, option)| *option)
            .ok_or_else(|| EnhancerError::UnknownOption(s.to_owned()))
    }
}

impl Serialize for PipelineOption {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for PipelineOption {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

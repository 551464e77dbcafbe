//! Enhancement mode catalogues
//!
//! [`RawMode`] maps each stand-alone enhancement kernel to its static pipeline.
//! [`PresetMode`] composes multi-stage chains from the auxiliary building blocks and
//! always ends in a target-sized downscale.

use crate::{
    ExecutablePipeline,
    pipelines::{aux, raw},
};

/// Stand-alone enhancement kernels operating on a stable input texture
///
/// Raw kernels upscale by a fixed factor and need a separate downscale stage to
/// reach the display size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawMode {
    CnnX2M,
    CnnX2Vl,
    CnnX2Ul,
    DenoiseCnnX2Vl,
    GanX3L,
    GanX4Uul,
}

impl RawMode {
    pub const ALL: [RawMode; 6] = [
        RawMode::CnnX2M,
        RawMode::CnnX2Vl,
        RawMode::CnnX2Ul,
        RawMode::DenoiseCnnX2Vl,
        RawMode::GanX3L,
        RawMode::GanX4Uul,
    ];

    /// Returns the human-readable name of this kernel
    pub fn name(&self) -> &'static str {
        self.pipeline().name()
    }

    /// Returns the static pipeline implementing this kernel
    pub fn pipeline(&self) -> &'static ExecutablePipeline {
        match self {
            RawMode::CnnX2M => &raw::CNN_X2_M,
            RawMode::CnnX2Vl => &raw::CNN_X2_VL,
            RawMode::CnnX2Ul => &raw::CNN_X2_UL,
            RawMode::DenoiseCnnX2Vl => &raw::DENOISE_CNN_X2_VL,
            RawMode::GanX3L => &raw::GAN_X3_L,
            RawMode::GanX4Uul => &raw::GAN_X4_UUL,
        }
    }

    /// Integer upscale factor applied by the kernel
    pub fn scale_factor(&self) -> u32 {
        match self {
            RawMode::CnnX2M | RawMode::CnnX2Vl | RawMode::CnnX2Ul | RawMode::DenoiseCnnX2Vl => 2,
            RawMode::GanX3L => 3,
            RawMode::GanX4Uul => 4,
        }
    }
}

/// Composite enhancement presets accepting the frame texture directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresetMode {
    /// Restore then upscale
    ModeA,
    /// Soft restore then upscale
    ModeB,
    /// Denoise then upscale
    ModeC,
    /// Mode A with an additional restore after upscaling
    ModeAA,
    /// Mode B with an additional soft restore after upscaling
    ModeBB,
    /// Mode C with an additional restore after upscaling
    ModeCA,
}

impl PresetMode {
    pub const ALL: [PresetMode; 6] = [
        PresetMode::ModeA,
        PresetMode::ModeB,
        PresetMode::ModeC,
        PresetMode::ModeAA,
        PresetMode::ModeBB,
        PresetMode::ModeCA,
    ];

    /// Returns the human-readable name of this preset
    pub fn name(&self) -> &'static str {
        match self {
            PresetMode::ModeA => "Mode A",
            PresetMode::ModeB => "Mode B",
            PresetMode::ModeC => "Mode C",
            PresetMode::ModeAA => "Mode AA",
            PresetMode::ModeBB => "Mode BB",
            PresetMode::ModeCA => "Mode CA",
        }
    }

    /// Creates the complete processing chain for this preset
    ///
    /// Additional 2x upscaling passes are appended until the scale between `native`
    /// and `target` is reached, and the chain always ends in a downscale to exactly
    /// `target`.
    pub fn create_pipelines(&self, native: (u32, u32), target: (u32, u32)) -> Vec<&'static ExecutablePipeline> {
        let mut base: Vec<&'static ExecutablePipeline> = match self {
            PresetMode::ModeA => vec![&aux::RESTORE, &aux::UPSCALE_X2],
            PresetMode::ModeB => vec![&aux::RESTORE_SOFT, &aux::UPSCALE_X2],
            PresetMode::ModeC => vec![&aux::DENOISE, &aux::UPSCALE_X2],
            PresetMode::ModeAA => vec![&aux::RESTORE, &aux::UPSCALE_X2, &aux::RESTORE],
            PresetMode::ModeBB => vec![&aux::RESTORE_SOFT, &aux::UPSCALE_X2, &aux::RESTORE_SOFT],
            PresetMode::ModeCA => vec![&aux::DENOISE, &aux::UPSCALE_X2, &aux::RESTORE],
        };

        let target_scale_factor = target_scale_factor(native, target);
        let mut current_scale_factor = 2.0;
        while current_scale_factor < target_scale_factor {
            base.push(&aux::UPSCALE_X2);
            current_scale_factor *= 2.0;
        }

        base.push(&aux::DOWNSCALE);
        base
    }
}

/// Largest per-axis ratio between `target` and `native`
fn target_scale_factor(native: (u32, u32), target: (u32, u32)) -> f64 {
    let x = target.0 as f64 / native.0.max(1) as f64;
    let y = target.1 as f64 / native.1.max(1) as f64;
    x.max(y)
}

//! Built-in kernel catalogue
//!
//! `aux` holds single-pass building blocks used to compose presets, `raw` holds the
//! self-contained enhancement pipelines that run on a stable input texture.
//! Every pipeline reads from [`SOURCE_TEXTURE_ID`] and writes its result to the
//! output of its last pass.

use crate::executable_pipeline::*;

const SHARPEN_RESAMPLE_WGSL: &str = include_str!("shaders/sharpen_resample.wgsl");
const DENOISE_BILATERAL_WGSL: &str = include_str!("shaders/denoise_bilateral.wgsl");
const DOWNSCALE_AREA_WGSL: &str = include_str!("shaders/downscale_area.wgsl");

const ONE: ScaleFactor = ScaleFactor::new(1, 1);
const TWO: ScaleFactor = ScaleFactor::new(2, 1);
const THREE: ScaleFactor = ScaleFactor::new(3, 1);
const FOUR: ScaleFactor = ScaleFactor::new(4, 1);

const SOURCE: PhysicalTexture = PhysicalTexture {
    id: SOURCE_TEXTURE_ID,
    size: TextureSize::Scaled(ONE, ONE),
    is_source: true,
};

const LINEAR_SAMPLER_AT_1: &[SamplerBinding] = &[SamplerBinding {
    binding: 1,
    filter_mode: SamplerFilterMode::Linear,
}];

const READ_SOURCE: &[InputTextureBinding] = &[InputTextureBinding {
    binding: 0,
    physical_texture_id: SOURCE_TEXTURE_ID,
}];

const READ_0: &[InputTextureBinding] = &[InputTextureBinding {
    binding: 0,
    physical_texture_id: 0,
}];

const WRITE_0_AT_1: &[OutputTextureBinding] = &[OutputTextureBinding {
    binding: 1,
    physical_texture_id: 0,
}];

const WRITE_0_AT_2: &[OutputTextureBinding] = &[OutputTextureBinding {
    binding: 2,
    physical_texture_id: 0,
}];

const WRITE_1_AT_2: &[OutputTextureBinding] = &[OutputTextureBinding {
    binding: 2,
    physical_texture_id: 1,
}];

/// Single sharpen/resample pass from the source into texture 0
const fn sharpen_pass(name: &'static str, defines: &'static [(&'static str, f32)]) -> ExecutablePass {
    ExecutablePass {
        name,
        shader: SHARPEN_RESAMPLE_WGSL,
        defines,
        input_textures: READ_SOURCE,
        output_textures: WRITE_0_AT_2,
        samplers: LINEAR_SAMPLER_AT_1,
    }
}

/// Composable single-pass stages
pub mod aux {
    use super::*;

    /// Resamples to the explicit target size
    pub const DOWNSCALE: ExecutablePipeline = ExecutablePipeline {
        name: "Downscale",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Target,
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[ExecutablePass {
            name: "Downscale Area",
            shader: DOWNSCALE_AREA_WGSL,
            defines: &[],
            input_textures: READ_SOURCE,
            output_textures: WRITE_0_AT_2,
            samplers: LINEAR_SAMPLER_AT_1,
        }],
    };

    pub const RESTORE: ExecutablePipeline = ExecutablePipeline {
        name: "Restore",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[sharpen_pass("Restore Sharpen", &[("STRENGTH", 0.6)])],
    };

    pub const RESTORE_SOFT: ExecutablePipeline = ExecutablePipeline {
        name: "Restore Soft",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[sharpen_pass("Restore Soft Sharpen", &[("STRENGTH", 0.3)])],
    };

    pub const DENOISE: ExecutablePipeline = ExecutablePipeline {
        name: "Denoise",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
        ],
        samplers: &[],
        passes: &[ExecutablePass {
            name: "Denoise Bilateral",
            shader: DENOISE_BILATERAL_WGSL,
            defines: &[("SIGMA", 0.1)],
            input_textures: READ_SOURCE,
            output_textures: WRITE_0_AT_1,
            samplers: &[],
        }],
    };

    pub const UPSCALE_X2: ExecutablePipeline = ExecutablePipeline {
        name: "Upscale x2",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[sharpen_pass("Upscale x2 Sharpen", &[("STRENGTH", 0.5)])],
    };
}

/// Stand-alone enhancement pipelines operating on a stable input texture
pub mod raw {
    use super::*;

    pub const CNN_X2_M: ExecutablePipeline = ExecutablePipeline {
        name: "CNN x2 M",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[sharpen_pass("CNN x2 M Upscale", &[("STRENGTH", 0.5)])],
    };

    pub const CNN_X2_VL: ExecutablePipeline = ExecutablePipeline {
        name: "CNN x2 VL",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
            PhysicalTexture {
                id: 1,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[
            sharpen_pass("CNN x2 VL Restore", &[("STRENGTH", 0.4)]),
            ExecutablePass {
                name: "CNN x2 VL Upscale",
                shader: SHARPEN_RESAMPLE_WGSL,
                defines: &[("STRENGTH", 0.6)],
                input_textures: READ_0,
                output_textures: WRITE_1_AT_2,
                samplers: LINEAR_SAMPLER_AT_1,
            },
        ],
    };

    pub const CNN_X2_UL: ExecutablePipeline = ExecutablePipeline {
        name: "CNN x2 UL",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
            PhysicalTexture {
                id: 1,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[
            sharpen_pass("CNN x2 UL Restore", &[("STRENGTH", 0.6)]),
            ExecutablePass {
                name: "CNN x2 UL Upscale",
                shader: SHARPEN_RESAMPLE_WGSL,
                defines: &[("STRENGTH", 0.8)],
                input_textures: READ_0,
                output_textures: WRITE_1_AT_2,
                samplers: LINEAR_SAMPLER_AT_1,
            },
        ],
    };

    pub const DENOISE_CNN_X2_VL: ExecutablePipeline = ExecutablePipeline {
        name: "Denoise CNN x2 VL",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(ONE, ONE),
                is_source: false,
            },
            PhysicalTexture {
                id: 1,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[
            ExecutablePass {
                name: "Denoise CNN x2 VL Denoise",
                shader: DENOISE_BILATERAL_WGSL,
                defines: &[("SIGMA", 0.08)],
                input_textures: READ_SOURCE,
                output_textures: WRITE_0_AT_1,
                samplers: &[],
            },
            ExecutablePass {
                name: "Denoise CNN x2 VL Upscale",
                shader: SHARPEN_RESAMPLE_WGSL,
                defines: &[("STRENGTH", 0.6)],
                input_textures: READ_0,
                output_textures: WRITE_1_AT_2,
                samplers: LINEAR_SAMPLER_AT_1,
            },
        ],
    };

    pub const GAN_X3_L: ExecutablePipeline = ExecutablePipeline {
        name: "GAN x3 L",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(THREE, THREE),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[sharpen_pass("GAN x3 L Upscale", &[("STRENGTH", 0.7)])],
    };

    pub const GAN_X4_UUL: ExecutablePipeline = ExecutablePipeline {
        name: "GAN x4 UUL",
        textures: &[
            SOURCE,
            PhysicalTexture {
                id: 0,
                size: TextureSize::Scaled(TWO, TWO),
                is_source: false,
            },
            PhysicalTexture {
                id: 1,
                size: TextureSize::Scaled(FOUR, FOUR),
                is_source: false,
            },
        ],
        samplers: &[SamplerFilterMode::Linear],
        passes: &[
            sharpen_pass("GAN x4 UUL Upscale 1", &[("STRENGTH", 0.8)]),
            ExecutablePass {
                name: "GAN x4 UUL Upscale 2",
                shader: SHARPEN_RESAMPLE_WGSL,
                defines: &[("STRENGTH", 0.5)],
                input_textures: READ_0,
                output_textures: WRITE_1_AT_2,
                samplers: LINEAR_SAMPLER_AT_1,
            },
        ],
    };
}

/// Every built-in pipeline, for validation and inspection
pub const ALL: &[&ExecutablePipeline] = &[
    &aux::DOWNSCALE,
    &aux::RESTORE,
    &aux::RESTORE_SOFT,
    &aux::DENOISE,
    &aux::UPSCALE_X2,
    &raw::CNN_X2_M,
    &raw::CNN_X2_VL,
    &raw::CNN_X2_UL,
    &raw::DENOISE_CNN_X2_VL,
    &raw::GAN_X3_L,
    &raw::GAN_X4_UUL,
];

//! wgpu compute kernels for real-time video enhancement
//!
//! This crate provides static descriptions of compute shader chains (sharpening
//! upscalers, a bilateral denoiser and an area downscaler) together with an executor
//! that binds them to wgpu resources. Callers pick a chain through [`RawMode`] or
//! [`PresetMode`], bind it with [`PipelineExecutor::new`] and record it each frame with
//! [`PipelineExecutor::pass`].

pub mod executable_pipeline;
mod pipeline_executor;

pub mod pipelines;
pub mod presets;

pub use executable_pipeline::ExecutablePipeline;
pub use pipeline_executor::{INTERMEDIATE_FORMAT, PipelineExecutor};
pub use presets::{PresetMode, RawMode};

/// Pipeline binding failures
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    #[error("no pipelines to bind")]
    EmptyChain,

    #[error("pipeline {0} has no passes")]
    EmptyPipeline(&'static str),

    #[error("pass {0} writes no output texture")]
    NoOutput(&'static str),

    #[error("pass {0} uses a sampler its pipeline does not declare")]
    MissingSampler(&'static str),

    #[error("pipeline {pipeline} refers to unknown texture {id}")]
    UnknownTexture { pipeline: &'static str, id: u32 },

    #[error("pipeline {pipeline} would allocate a {width}x{height} texture")]
    ZeroSizedTexture { pipeline: &'static str, width: u32, height: u32 },

    #[error("pipeline {pipeline} would allocate a {width}x{height} texture, over the device limit of {limit}")]
    TextureTooLarge { pipeline: &'static str, width: u32, height: u32, limit: u32 },
}

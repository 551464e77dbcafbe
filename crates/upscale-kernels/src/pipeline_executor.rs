//! Shader pipeline execution engine
//!
//! Binds the static pass descriptions of one or more [`ExecutablePipeline`]s to wgpu
//! resources and records them into a command encoder in sequence.

use std::collections::HashMap;

use crate::{
    ExecutablePipeline, KernelError,
    executable_pipeline::{ExecutablePass, SamplerFilterMode, TextureSize},
};

/// Every kernel runs in square 8x8 workgroups
const WORKGROUP_SIZE: u32 = 8;

/// Format of every texture allocated by the executor
///
/// Half floats are filterable without optional features and usable as write-only
/// storage on every backend.
pub const INTERMEDIATE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// One pipeline of a chain, bound to wgpu resources
#[derive(Debug)]
struct BoundPipeline {
    passes: Vec<BoundPass>,
    /// Textures allocated for this pipeline (never includes the source)
    owned_textures: Vec<wgpu::Texture>,
}

#[derive(Debug)]
struct BoundPass {
    name: &'static str,
    /// Size of the first output texture; one invocation per texel
    dispatch_size: (u32, u32),
    compute_pipeline: wgpu::ComputePipeline,
    bind_group: wgpu::BindGroup,
}

/// Physical texture id to texture and its default view
type TextureTable = HashMap<u32, (wgpu::Texture, wgpu::TextureView)>;

fn filter_mode(mode: &SamplerFilterMode) -> wgpu::FilterMode {
    match mode {
        SamplerFilterMode::Nearest => wgpu::FilterMode::Nearest,
        SamplerFilterMode::Linear => wgpu::FilterMode::Linear,
    }
}

fn create_sampler(device: &wgpu::Device, mode: &SamplerFilterMode) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some(&format!("{mode:?} Kernel Sampler")),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        mag_filter: filter_mode(mode),
        min_filter: filter_mode(mode),
        ..Default::default()
    })
}

/// Rejects sizes the device cannot allocate
fn check_size(pipeline: &'static str, width: u32, height: u32, limit: u32) -> Result<(), KernelError> {
    if width == 0 || height == 0 {
        Err(KernelError::ZeroSizedTexture { pipeline, width, height })
    } else if width > limit || height > limit {
        Err(KernelError::TextureTooLarge {
            pipeline,
            width,
            height,
            limit,
        })
    } else {
        Ok(())
    }
}

/// Allocates every non-source texture of `pipeline`
///
/// On error the textures allocated so far are destroyed before returning.
fn allocate_textures(
    pipeline: &'static ExecutablePipeline,
    device: &wgpu::Device,
    source: &wgpu::Texture,
    target: (u32, u32),
) -> Result<(TextureTable, Vec<wgpu::Texture>), KernelError> {
    let limit = device.limits().max_texture_dimension_2d;
    let mut table = TextureTable::new();
    let mut owned: Vec<wgpu::Texture> = Vec::new();

    for physical in pipeline.textures {
        let texture = if physical.is_source {
            source.clone()
        } else {
            let (width, height) = match physical.size {
                TextureSize::Scaled(x, y) => (x.apply(source.width()), y.apply(source.height())),
                TextureSize::Target => target,
            };
            if let Err(err) = check_size(pipeline.name, width, height, limit) {
                owned.iter().for_each(wgpu::Texture::destroy);
                return Err(err);
            }
            let texture = device.create_texture(&wgpu::TextureDescriptor {
                label: Some(&format!("{} Texture {}", pipeline.name, physical.id)),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: INTERMEDIATE_FORMAT,
                usage: wgpu::TextureUsages::STORAGE_BINDING | wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_SRC,
                view_formats: &[],
            });
            owned.push(texture.clone());
            texture
        };
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        table.insert(physical.id, (texture, view));
    }

    Ok((table, owned))
}

fn compute_entry(binding: u32, ty: wgpu::BindingType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty,
        count: None,
    }
}

/// Compiles one pass and binds its textures and samplers
fn bind_pass(
    device: &wgpu::Device,
    pipeline_name: &'static str,
    pass: &'static ExecutablePass,
    textures: &TextureTable,
    samplers: &HashMap<SamplerFilterMode, wgpu::Sampler>,
) -> Result<BoundPass, KernelError> {
    let lookup = |id: u32| textures.get(&id).ok_or(KernelError::UnknownTexture { pipeline: pipeline_name, id });

    let first_output = pass.output_textures.first().ok_or(KernelError::NoOutput(pass.name))?;
    let (first_output_texture, _) = lookup(first_output.physical_texture_id)?;
    let dispatch_size = (first_output_texture.width(), first_output_texture.height());

    let mut bindings: Vec<(wgpu::BindGroupLayoutEntry, wgpu::BindingResource)> = Vec::new();
    for input in pass.input_textures {
        let (_, view) = lookup(input.physical_texture_id)?;
        let ty = wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        };
        bindings.push((compute_entry(input.binding, ty), wgpu::BindingResource::TextureView(view)));
    }
    for output in pass.output_textures {
        let (texture, view) = lookup(output.physical_texture_id)?;
        let ty = wgpu::BindingType::StorageTexture {
            access: wgpu::StorageTextureAccess::WriteOnly,
            format: texture.format(),
            view_dimension: wgpu::TextureViewDimension::D2,
        };
        bindings.push((compute_entry(output.binding, ty), wgpu::BindingResource::TextureView(view)));
    }
    for binding in pass.samplers {
        let sampler = samplers.get(&binding.filter_mode).ok_or(KernelError::MissingSampler(pass.name))?;
        let ty = wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering);
        bindings.push((compute_entry(binding.binding, ty), wgpu::BindingResource::Sampler(sampler)));
    }
    bindings.sort_by_key(|(entry, _)| entry.binding);

    let layout_entries: Vec<_> = bindings.iter().map(|(entry, _)| *entry).collect();
    let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(pass.name),
        entries: &layout_entries,
    });
    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(pass.name),
        bind_group_layouts: &[&bind_group_layout],
        push_constant_ranges: &[],
    });

    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(pass.name),
        source: wgpu::ShaderSource::Wgsl(pass.shader_source().into()),
    });
    let compute_pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
        label: Some(pass.name),
        layout: Some(&pipeline_layout),
        module: &module,
        entry_point: Some("main"),
        compilation_options: Default::default(),
        cache: None,
    });

    let entries: Vec<_> = bindings
        .into_iter()
        .map(|(entry, resource)| wgpu::BindGroupEntry {
            binding: entry.binding,
            resource,
        })
        .collect();
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(pass.name),
        layout: &bind_group_layout,
        entries: &entries,
    });

    Ok(BoundPass {
        name: pass.name,
        dispatch_size,
        compute_pipeline,
        bind_group,
    })
}

impl BoundPipeline {
    /// Binds `pipeline` with `input_texture` as its source
    ///
    /// Returns the bound pipeline together with the output texture of its last pass.
    fn new(pipeline: &'static ExecutablePipeline, device: &wgpu::Device, input_texture: &wgpu::Texture, target: (u32, u32)) -> Result<(Self, wgpu::Texture), KernelError> {
        let last_pass = pipeline.passes.last().ok_or(KernelError::EmptyPipeline(pipeline.name))?;
        let (textures, owned_textures) = allocate_textures(pipeline, device, input_texture, target)?;

        let samplers: HashMap<_, _> = pipeline.samplers.iter().map(|mode| (mode.clone(), create_sampler(device, mode))).collect();

        let bound = pipeline
            .passes
            .iter()
            .map(|pass| bind_pass(device, pipeline.name, pass, &textures, &samplers))
            .collect::<Result<Vec<_>, _>>()
            .and_then(|passes| {
                let output_id = last_pass.output_textures.first().ok_or(KernelError::NoOutput(last_pass.name))?.physical_texture_id;
                let (output, _) = textures.get(&output_id).ok_or(KernelError::UnknownTexture {
                    pipeline: pipeline.name,
                    id: output_id,
                })?;
                Ok((passes, output.clone()))
            });

        match bound {
            Ok((passes, output_texture)) => Ok((Self { passes, owned_textures }, output_texture)),
            Err(err) => {
                owned_textures.iter().for_each(wgpu::Texture::destroy);
                Err(err)
            }
        }
    }

    fn pass(&self, encoder: &mut wgpu::CommandEncoder) {
        for pass in &self.passes {
            let mut compute_pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(pass.name),
                timestamp_writes: None,
            });
            compute_pass.set_pipeline(&pass.compute_pipeline);
            compute_pass.set_bind_group(0, &pass.bind_group, &[]);

            let (width, height) = pass.dispatch_size;
            compute_pass.dispatch_workgroups(width.div_ceil(WORKGROUP_SIZE), height.div_ceil(WORKGROUP_SIZE), 1);
        }
    }
}

/// A chain of bound pipelines executed in sequence
///
/// The output of each pipeline is the source of the next. The executor owns every
/// texture it allocated and frees them in [`PipelineExecutor::destroy`]; the source
/// texture handed to [`PipelineExecutor::new`] is never destroyed by the executor.
#[derive(Debug)]
pub struct PipelineExecutor {
    /// Collection of bound pipelines to execute in sequence
    bound_pipelines: Vec<BoundPipeline>,
    output_texture: wgpu::Texture,
}

impl PipelineExecutor {
    /// Binds a chain of executable pipelines
    ///
    /// # Arguments
    /// * `executable_pipeline` - Pipelines to chain together, in execution order
    /// * `device` - The wgpu device for resource creation
    /// * `source_texture` - The initial input texture
    /// * `target` - Dimensions used by target-sized textures
    ///
    /// # Returns
    /// A tuple of (pipeline executor, final output texture)
    pub fn new(executable_pipeline: &[&'static ExecutablePipeline], device: &wgpu::Device, source_texture: &wgpu::Texture, target: (u32, u32)) -> Result<(Self, wgpu::Texture), KernelError> {
        if executable_pipeline.is_empty() {
            return Err(KernelError::EmptyChain);
        }

        let mut bound_pipelines: Vec<BoundPipeline> = Vec::new();
        let mut current_input_texture = source_texture.clone();

        for pipeline in executable_pipeline {
            match BoundPipeline::new(pipeline, device, &current_input_texture, target) {
                Ok((bound_pipeline, output_texture)) => {
                    current_input_texture = output_texture;
                    bound_pipelines.push(bound_pipeline);
                }
                Err(err) => {
                    for bound in &bound_pipelines {
                        bound.owned_textures.iter().for_each(wgpu::Texture::destroy);
                    }
                    return Err(err);
                }
            }
        }

        tracing::debug!(
            pipelines = executable_pipeline.len(),
            output_width = current_input_texture.width(),
            output_height = current_input_texture.height(),
            "bound pipeline chain"
        );

        let executor = Self {
            bound_pipelines,
            output_texture: current_input_texture.clone(),
        };
        Ok((executor, current_input_texture))
    }

    /// Records the entire chain into `encoder`
    pub fn pass(&self, encoder: &mut wgpu::CommandEncoder) {
        for bound_pipeline in &self.bound_pipelines {
            bound_pipeline.pass(encoder);
        }
    }

    /// Output texture of the last pipeline in the chain
    pub fn output_texture(&self) -> &wgpu::Texture {
        &self.output_texture
    }

    /// Number of textures allocated by this executor
    pub fn owned_texture_count(&self) -> usize {
        self.bound_pipelines.iter().map(|b| b.owned_textures.len()).sum()
    }

    /// Explicitly frees every texture allocated by this executor
    ///
    /// Calling it twice is harmless. The executor must not be passed again afterwards.
    pub fn destroy(&mut self) {
        for bound in self.bound_pipelines.drain(..) {
            bound.owned_textures.iter().for_each(wgpu::Texture::destroy);
        }
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::FutureExt;
use upscale_kernels::{PipelineExecutor, PresetMode, RawMode, pipelines::aux};

use super::{
    acquire,
    cache::{DeviceKey, SharedResourceCache},
    convert,
};
use crate::{
    EnhancerError, EnhancerResult,
    dimensions::Dimensions,
    platform::{GpuSession, PipelineStage, PresetStage},
};

/// Format of the offscreen presentation target
pub const OFFSCREEN_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Source of the frame drawn on each render tick
pub trait FrameImporter {
    fn import(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> EnhancerResult<wgpu::Texture>;
}

pub enum Presenter {
    Surface { surface: wgpu::Surface<'static>, config: wgpu::SurfaceConfiguration },
    Offscreen { texture: Option<wgpu::Texture> },
    /// The presentation context was unconfigured
    Detached,
}

/// One dedicated device plus its presentation target
pub struct WgpuSession<I: FrameImporter> {
    key: DeviceKey,
    cache: SharedResourceCache,
    device: wgpu::Device,
    queue: wgpu::Queue,
    presenter: Presenter,
    format: wgpu::TextureFormat,
    importer: I,
    lost: Arc<AtomicBool>,
    destroyed: bool,
}

impl<I: FrameImporter> WgpuSession<I> {
    /// Acquires an adapter compatible with `surface` and a device of its own
    pub async fn connect(instance: &wgpu::Instance, surface: wgpu::Surface<'static>, size: (u32, u32), cache: SharedResourceCache, importer: I) -> EnhancerResult<Self> {
        let adapter = acquire::request_adapter(instance, Some(&surface)).await?;
        let (device, queue) = acquire::request_device(&adapter).await?;
        let config = match acquire::configure_surface(&surface, &adapter, &device, size) {
            Ok(config) => config,
            Err(err) => {
                device.destroy();
                return Err(err);
            }
        };
        let format = config.format.remove_srgb_suffix();
        Ok(Self::new(cache, device, queue, Presenter::Surface { surface, config }, format, importer))
    }

    /// A session presenting into a texture instead of a surface
    pub fn offscreen(cache: SharedResourceCache, device: wgpu::Device, queue: wgpu::Queue, importer: I) -> Self {
        Self::new(cache, device, queue, Presenter::Offscreen { texture: None }, OFFSCREEN_FORMAT, importer)
    }

    fn new(cache: SharedResourceCache, device: wgpu::Device, queue: wgpu::Queue, presenter: Presenter, format: wgpu::TextureFormat, importer: I) -> Self {
        let key = DeviceKey::next();
        let lost = Arc::new(AtomicBool::new(false));
        let flag = lost.clone();
        device.set_device_lost_callback(move |reason, message| {
            flag.store(true, Ordering::Release);
            tracing::debug!(?key, ?reason, %message, "device lost");
        });

        Self {
            key,
            cache,
            device,
            queue,
            presenter,
            format,
            importer,
            lost,
            destroyed: false,
        }
    }

    pub fn key(&self) -> DeviceKey {
        self.key
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn importer_mut(&mut self) -> &mut I {
        &mut self.importer
    }

    /// Last texture presented by an offscreen session
    pub fn presented_texture(&self) -> Option<&wgpu::Texture> {
        match &self.presenter {
            Presenter::Offscreen { texture } => texture.as_ref(),
            _ => None,
        }
    }

    pub fn is_lost(&self) -> bool {
        self.destroyed || self.lost.load(Ordering::Acquire)
    }

    fn push_error_scopes(&self) {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);
        self.device.push_error_scope(wgpu::ErrorFilter::Validation);
    }

    /// Pops the scopes pushed by [`Self::push_error_scopes`]
    ///
    /// Native backends resolve the scopes immediately. On the web the result arrives
    /// asynchronously and is only logged; a rejected resource then surfaces as an
    /// error on a later pass.
    fn pop_error_scopes(&self, what: &'static str) -> EnhancerResult<()> {
        let scopes = [self.device.pop_error_scope(), self.device.pop_error_scope()];
        for scope in scopes {
            match scope.now_or_never() {
                Some(Some(err)) => return Err(EnhancerError::ResourceCreation(format!("{what}: {err}"))),
                Some(None) => {}
                None => tracing::trace!(what, "error scope pending"),
            }
        }
        Ok(())
    }

    /// Runs `create` inside validation and out-of-memory error scopes
    ///
    /// A value created while the device reported an error is handed to `discard`.
    fn scoped<T>(&self, what: &'static str, create: impl FnOnce() -> EnhancerResult<T>, discard: impl FnOnce(T)) -> EnhancerResult<T> {
        self.push_error_scopes();
        let created = create();
        let scoped = self.pop_error_scopes(what);
        let value = created?;
        match scoped {
            Ok(()) => Ok(value),
            Err(err) => {
                discard(value);
                Err(err)
            }
        }
    }

    fn ensure_alive(&self) -> EnhancerResult<()> {
        if self.destroyed {
            Err(EnhancerError::DeviceLost("device destroyed".into()))
        } else if self.lost.load(Ordering::Acquire) {
            Err(EnhancerError::DeviceLost("device lost".into()))
        } else {
            Ok(())
        }
    }
}

impl<I: FrameImporter> GpuSession for WgpuSession<I> {
    type Texture = wgpu::Texture;
    type Frame = wgpu::Texture;
    type Encoder = wgpu::CommandEncoder;
    type Upscaler = WgpuUpscaler;
    type Preset = WgpuPreset;

    fn preferred_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    fn import_frame(&mut self) -> EnhancerResult<wgpu::Texture> {
        self.ensure_alive()?;
        self.importer.import(&self.device, &self.queue)
    }

    fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Frame Encoder") })
    }

    fn create_input_texture(&self, dims: Dimensions) -> EnhancerResult<wgpu::Texture> {
        self.ensure_alive()?;
        self.scoped("input texture", || Ok(convert::create_stable_texture(&self.device, dims)), |texture| texture.destroy())
    }

    fn destroy_texture(&self, texture: &wgpu::Texture) {
        texture.destroy();
    }

    fn convert_frame(&self, encoder: &mut wgpu::CommandEncoder, frame: &wgpu::Texture, target: &wgpu::Texture) -> EnhancerResult<()> {
        self.ensure_alive()?;
        convert::convert_into(&self.device, &mut self.cache.borrow_mut(), self.key, encoder, frame, target);
        Ok(())
    }

    fn create_upscaler(&self, mode: RawMode, input: &wgpu::Texture) -> EnhancerResult<WgpuUpscaler> {
        self.ensure_alive()?;
        let scale = mode.scale_factor();
        let target = (input.width() * scale, input.height() * scale);
        self.scoped(
            "upscaler",
            || Ok(WgpuUpscaler::new(PipelineExecutor::new(&[mode.pipeline()], &self.device, input, target)?.0)),
            |mut upscaler| upscaler.executor.destroy(),
        )
    }

    fn create_downscaler(&self, input: &wgpu::Texture, target: Dimensions) -> EnhancerResult<WgpuUpscaler> {
        self.ensure_alive()?;
        self.scoped(
            "downscaler",
            || Ok(WgpuUpscaler::new(PipelineExecutor::new(&[&aux::DOWNSCALE], &self.device, input, target.as_tuple())?.0)),
            |mut downscaler| downscaler.executor.destroy(),
        )
    }

    fn create_preset(&self, mode: PresetMode, native: Dimensions, target: Dimensions) -> EnhancerResult<WgpuPreset> {
        self.ensure_alive()?;
        let pipelines = mode.create_pipelines(native.as_tuple(), target.as_tuple());
        let preset = self.scoped(
            "preset",
            || {
                let input = convert::create_stable_texture(&self.device, native);
                let executor = match PipelineExecutor::new(&pipelines, &self.device, &input, target.as_tuple()) {
                    Ok((executor, _)) => executor,
                    Err(err) => {
                        input.destroy();
                        return Err(err.into());
                    }
                };
                Ok(WgpuPreset {
                    device: self.device.clone(),
                    cache: self.cache.clone(),
                    key: self.key,
                    input,
                    executor: Some(executor),
                })
            },
            |mut preset| preset.destroy(),
        )?;
        tracing::debug!(mode = mode.name(), stages = pipelines.len(), ?native, ?target, "preset pipeline bound");
        Ok(preset)
    }

    fn present(&mut self, mut encoder: wgpu::CommandEncoder, result: &wgpu::Texture, target: Dimensions) -> EnhancerResult<()> {
        self.ensure_alive()?;
        let format = self.format;

        match &mut self.presenter {
            Presenter::Surface { surface, config } => {
                if (config.width, config.height) != target.as_tuple() {
                    config.width = target.width;
                    config.height = target.height;
                    surface.configure(&self.device, config);
                    tracing::debug!(width = target.width, height = target.height, "surface resized");
                }

                let frame = match surface.get_current_texture() {
                    Ok(frame) => frame,
                    Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                        surface.configure(&self.device, config);
                        return Err(EnhancerError::SurfaceLost);
                    }
                    Err(wgpu::SurfaceError::Timeout) => return Err(EnhancerError::SurfaceLost),
                    Err(err) => return Err(EnhancerError::surface(err.to_string())),
                };
                let view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
                    format: Some(format),
                    ..Default::default()
                });

                convert::blit(&self.device, &mut self.cache.borrow_mut(), self.key, &mut encoder, result, &view, format);
                self.queue.submit(Some(encoder.finish()));
                frame.present();
            }
            Presenter::Offscreen { texture } => {
                if !texture.as_ref().is_some_and(|t| (t.width(), t.height()) == target.as_tuple()) {
                    if let Some(old) = texture.take() {
                        old.destroy();
                    }
                    *texture = Some(create_offscreen_texture(&self.device, target, format));
                }
                let Some(output) = texture.as_ref() else {
                    return Err(EnhancerError::TextureDestroyed);
                };
                let view = output.create_view(&wgpu::TextureViewDescriptor::default());

                convert::blit(&self.device, &mut self.cache.borrow_mut(), self.key, &mut encoder, result, &view, format);
                self.queue.submit(Some(encoder.finish()));
            }
            Presenter::Detached => return Err(EnhancerError::SurfaceLost),
        }
        Ok(())
    }

    fn unconfigure(&mut self) {
        if let Presenter::Offscreen { texture: Some(texture) } = &self.presenter {
            texture.destroy();
        }
        self.presenter = Presenter::Detached;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.unconfigure();
        let purged = self.cache.borrow_mut().purge(self.key);
        self.device.destroy();
        self.destroyed = true;
        tracing::debug!(key = ?self.key, purged, "session destroyed");
    }
}

fn create_offscreen_texture(device: &wgpu::Device, size: Dimensions, format: wgpu::TextureFormat) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Offscreen Presentation Texture"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// A raw kernel or the downscaler, bound to fixed textures
#[derive(Debug)]
pub struct WgpuUpscaler {
    executor: PipelineExecutor,
}

impl WgpuUpscaler {
    fn new(executor: PipelineExecutor) -> Self {
        Self { executor }
    }

    pub fn owned_texture_count(&self) -> usize {
        self.executor.owned_texture_count()
    }
}

impl PipelineStage for WgpuUpscaler {
    type Encoder = wgpu::CommandEncoder;
    type Texture = wgpu::Texture;

    fn pass(&self, encoder: &mut wgpu::CommandEncoder) {
        self.executor.pass(encoder);
    }

    fn output_texture(&self) -> &wgpu::Texture {
        self.executor.output_texture()
    }

    fn destroy(&mut self) {
        self.executor.destroy();
    }
}

/// A preset chain with its own stable input texture
///
/// Each pass converts the frame into the input texture before recording the chain.
pub struct WgpuPreset {
    device: wgpu::Device,
    cache: SharedResourceCache,
    key: DeviceKey,
    input: wgpu::Texture,
    executor: Option<PipelineExecutor>,
}

impl PresetStage for WgpuPreset {
    type Encoder = wgpu::CommandEncoder;
    type Texture = wgpu::Texture;
    type Frame = wgpu::Texture;

    fn pass(&mut self, encoder: &mut wgpu::CommandEncoder, frame: &wgpu::Texture) -> EnhancerResult<()> {
        let executor = self.executor.as_ref().ok_or(EnhancerError::TextureDestroyed)?;
        convert::convert_into(&self.device, &mut self.cache.borrow_mut(), self.key, encoder, frame, &self.input);
        executor.pass(encoder);
        Ok(())
    }

    fn output_texture(&self) -> Option<&wgpu::Texture> {
        self.executor.as_ref().map(PipelineExecutor::output_texture)
    }

    fn destroy(&mut self) {
        if let Some(mut executor) = self.executor.take() {
            executor.destroy();
            self.input.destroy();
        }
    }
}

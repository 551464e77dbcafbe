//! End-to-end frame path on a real device. Each test returns early when no adapter is available.

use video_enhancer::{
    Dimensions, EnhancerError, EnhancerResult, PresetMode, RawMode,
    gpu::{FrameImporter, OFFSCREEN_FORMAT, ResourceCache, WgpuSession},
    platform::{GpuSession, PipelineStage, PresetStage},
};

fn device() -> Option<(wgpu::Device, wgpu::Queue)> {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
    let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::HighPerformance,
        compatible_surface: None,
        force_fallback_adapter: false,
    }))
    .ok()?;

    pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
        label: Some("Enhancer Test Device"),
        required_features: wgpu::Features::empty(),
        required_limits: wgpu::Limits::default(),
        memory_hints: wgpu::MemoryHints::default(),
        trace: Default::default(),
    }))
    .ok()
}

/// Serves the same grey frame on every import
struct SolidImporter {
    width: u32,
    height: u32,
    value: u8,
    frame: Option<wgpu::Texture>,
}

impl SolidImporter {
    fn new(width: u32, height: u32, value: u8) -> Self {
        Self {
            width,
            height,
            value,
            frame: None,
        }
    }
}

impl FrameImporter for SolidImporter {
    fn import(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> EnhancerResult<wgpu::Texture> {
        if let Some(frame) = &self.frame {
            return Ok(frame.clone());
        }

        let frame = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("Solid Frame"),
            size: wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let data = [self.value, self.value, self.value, 255].repeat((self.width * self.height) as usize);
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &frame,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &data,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(self.width * 4),
                rows_per_image: Some(self.height),
            },
            frame.size(),
        );
        self.frame = Some(frame.clone());
        Ok(frame)
    }
}

/// Reads an 8-bit RGBA texture back; `width * 4` must be a multiple of 256
fn read_rgba8(device: &wgpu::Device, queue: &wgpu::Queue, texture: &wgpu::Texture) -> Vec<u8> {
    let wgpu::Extent3d { width, height, .. } = texture.size();
    let bytes_per_row = width * 4;

    let buffer = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Buffer"),
        size: (bytes_per_row * height) as u64,
        usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("Readback Encoder") });
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        texture.size(),
    );
    queue.submit(std::iter::once(encoder.finish()));

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = futures_intrusive::channel::shared::oneshot_channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |v| sender.send(v).unwrap());
    device.poll(wgpu::PollType::Wait).unwrap();
    pollster::block_on(receiver.receive()).unwrap().unwrap();

    let data = buffer_slice.get_mapped_range();
    data.to_vec()
}

#[test]
fn raw_frame_path_presents_the_frame() {
    let Some((device, queue)) = device() else { return };
    let cache = ResourceCache::shared();
    let mut session = WgpuSession::offscreen(cache.clone(), device, queue, SolidImporter::new(32, 32, 128));
    assert_eq!(session.preferred_format(), OFFSCREEN_FORMAT);

    let native = Dimensions::floored(32, 32);
    let target = Dimensions::floored(64, 64);
    let input = session.create_input_texture(native).unwrap();
    let upscaler = session.create_upscaler(RawMode::CnnX2M, &input).unwrap();
    let downscaler = session.create_downscaler(upscaler.output_texture(), target).unwrap();
    assert_eq!(upscaler.output_texture().width(), 64);

    let frame = session.import_frame().unwrap();
    let mut encoder = session.create_encoder();
    session.convert_frame(&mut encoder, &frame, &input).unwrap();
    upscaler.pass(&mut encoder);
    downscaler.pass(&mut encoder);
    session.present(encoder, downscaler.output_texture(), target).unwrap();
    assert_eq!(cache.borrow().len(), 2);

    let presented = session.presented_texture().unwrap();
    assert_eq!((presented.width(), presented.height()), (64, 64));
    let pixels = read_rgba8(session.device(), session.queue(), presented);
    for texel in pixels.chunks(4) {
        assert!(texel[0].abs_diff(128) <= 2, "{texel:?}");
        assert_eq!(texel[3], 255, "{texel:?}");
    }

    session.destroy();
    assert!(cache.borrow().is_empty());
    assert!(session.is_lost());
    assert!(matches!(session.import_frame(), Err(EnhancerError::DeviceLost(_))));
}

#[test]
fn preset_stage_owns_its_input_texture() {
    let Some((device, queue)) = device() else { return };
    let cache = ResourceCache::shared();
    let mut session = WgpuSession::offscreen(cache, device, queue, SolidImporter::new(32, 32, 64));

    let native = Dimensions::floored(32, 32);
    let target = Dimensions::floored(128, 128);
    let mut preset = session.create_preset(PresetMode::ModeA, native, target).unwrap();
    let output = preset.output_texture().unwrap();
    assert_eq!((output.width(), output.height()), (128, 128));

    let frame = session.import_frame().unwrap();
    let mut encoder = session.create_encoder();
    preset.pass(&mut encoder, &frame).unwrap();
    let output = preset.output_texture().unwrap().clone();
    session.present(encoder, &output, target).unwrap();

    let pixels = read_rgba8(session.device(), session.queue(), session.presented_texture().unwrap());
    assert_eq!(pixels.len(), 128 * 128 * 4);
    assert!(pixels.chunks(4).all(|texel| texel[3] == 255));

    preset.destroy();
    assert!(preset.output_texture().is_none());
    let mut encoder = session.create_encoder();
    assert!(matches!(preset.pass(&mut encoder, &frame), Err(EnhancerError::TextureDestroyed)));
    session.destroy();
}

#[test]
fn purge_only_drops_the_destroyed_session() {
    let Some((first_device, first_queue)) = device() else { return };
    let Some((second_device, second_queue)) = device() else { return };
    let cache = ResourceCache::shared();
    let mut first = WgpuSession::offscreen(cache.clone(), first_device, first_queue, SolidImporter::new(32, 32, 10));
    let mut second = WgpuSession::offscreen(cache.clone(), second_device, second_queue, SolidImporter::new(32, 32, 20));
    assert_ne!(first.key(), second.key());

    for session in [&mut first, &mut second] {
        let frame = session.import_frame().unwrap();
        let encoder = session.create_encoder();
        session.present(encoder, &frame, Dimensions::floored(64, 64)).unwrap();
    }
    assert_eq!(cache.borrow().len(), 2);

    first.destroy();
    assert_eq!(cache.borrow().len(), 1);
    first.destroy();
    assert_eq!(cache.borrow().len(), 1);

    second.destroy();
    assert!(cache.borrow().is_empty());
}

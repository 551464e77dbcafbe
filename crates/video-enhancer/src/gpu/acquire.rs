//! Adapter, device and presentation context acquisition

use crate::{EnhancerError, EnhancerResult};

/// Backends the browser binding may run on
pub fn default_backends() -> wgpu::Backends {
    if cfg!(target_arch = "wasm32") { wgpu::Backends::BROWSER_WEBGPU } else { wgpu::Backends::PRIMARY }
}

pub fn create_instance() -> wgpu::Instance {
    wgpu::Instance::new(&wgpu::InstanceDescriptor {
        backends: default_backends(),
        ..Default::default()
    })
}

pub async fn request_adapter(instance: &wgpu::Instance, surface: Option<&wgpu::Surface<'_>>) -> EnhancerResult<wgpu::Adapter> {
    instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: surface,
            force_fallback_adapter: false,
        })
        .await
        .map_err(|err| EnhancerError::unsupported(format!("no suitable GPU adapter: {err}")))
}

/// Requests a device with the adapter's own texture and buffer limits
///
/// Large upscaled intermediates exceed the downlevel defaults, so the resolution and
/// buffer limits are raised to whatever the adapter allows.
pub async fn request_device(adapter: &wgpu::Adapter) -> EnhancerResult<(wgpu::Device, wgpu::Queue)> {
    let adapter_limits = adapter.limits();
    let required_limits = wgpu::Limits {
        max_buffer_size: adapter_limits.max_buffer_size,
        max_storage_buffer_binding_size: adapter_limits.max_storage_buffer_binding_size,
        ..wgpu::Limits::downlevel_defaults().using_resolution(adapter_limits)
    };

    adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("Video Enhancer Device"),
            required_features: wgpu::Features::empty(),
            required_limits,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .map_err(|err| EnhancerError::device_request(err.to_string()))
}

/// Confirms an adapter and device can be obtained, then releases both
pub async fn probe(instance: &wgpu::Instance) -> EnhancerResult<()> {
    let adapter = request_adapter(instance, None).await?;
    let info = adapter.get_info();
    tracing::debug!(adapter = %info.name, backend = ?info.backend, "GPU probe succeeded");

    let (device, _queue) = request_device(&adapter).await?;
    device.destroy();
    Ok(())
}

/// Configures `surface` for opaque-over-page presentation
///
/// The first supported format is used, with premultiplied alpha when available. The
/// non-sRGB variant is registered as a view format so blits write values unchanged.
pub fn configure_surface(surface: &wgpu::Surface<'_>, adapter: &wgpu::Adapter, device: &wgpu::Device, size: (u32, u32)) -> EnhancerResult<wgpu::SurfaceConfiguration> {
    let capabilities = surface.get_capabilities(adapter);
    let format = *capabilities
        .formats
        .first()
        .ok_or_else(|| EnhancerError::surface("surface supports no formats on this adapter"))?;
    let alpha_mode = if capabilities.alpha_modes.contains(&wgpu::CompositeAlphaMode::PreMultiplied) {
        wgpu::CompositeAlphaMode::PreMultiplied
    } else {
        wgpu::CompositeAlphaMode::Auto
    };

    let config = wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: size.0.max(1),
        height: size.1.max(1),
        present_mode: wgpu::PresentMode::Fifo,
        alpha_mode,
        view_formats: vec![format.remove_srgb_suffix()],
        desired_maximum_frame_latency: 2,
    };
    surface.configure(device, &config);
    tracing::debug!(?format, ?alpha_mode, width = config.width, height = config.height, "surface configured");
    Ok(config)
}

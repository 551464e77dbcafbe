use video_enhancer::{EnhancerError, EnhancerResult, gpu::FrameImporter};
use web_sys::HtmlVideoElement;

/// Copies the current video frame into a reusable RGBA texture
///
/// The texture is recreated whenever the decoded resolution changes.
pub struct VideoFrameImporter {
    video: HtmlVideoElement,
    texture: Option<wgpu::Texture>,
}

impl VideoFrameImporter {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self { video, texture: None }
    }

    fn texture_for(&mut self, device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        match &self.texture {
            Some(texture) if texture.width() == width && texture.height() == height => texture.clone(),
            _ => {
                if let Some(old) = self.texture.take() {
                    old.destroy();
                }
                let texture = device.create_texture(&wgpu::TextureDescriptor {
                    label: Some("Video Frame Texture"),
                    size: wgpu::Extent3d {
                        width,
                        height,
                        depth_or_array_layers: 1,
                    },
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: wgpu::TextureDimension::D2,
                    format: wgpu::TextureFormat::Rgba8Unorm,
                    usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST | wgpu::TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                tracing::debug!(width, height, "video frame texture created");
                self.texture = Some(texture.clone());
                texture
            }
        }
    }
}

impl FrameImporter for VideoFrameImporter {
    fn import(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> EnhancerResult<wgpu::Texture> {
        let width = self.video.video_width();
        let height = self.video.video_height();
        if width == 0 || height == 0 {
            return Err(EnhancerError::platform("video has no decoded frame"));
        }

        let texture = self.texture_for(device, width, height);
        queue.copy_external_image_to_texture(
            &wgpu::CopyExternalImageSourceInfo {
                source: wgpu::ExternalImageSource::HTMLVideoElement(self.video.clone()),
                origin: wgpu::Origin2d::ZERO,
                flip_y: false,
            },
            wgpu::CopyExternalImageDestInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
                color_space: wgpu::PredefinedColorSpace::Srgb,
                premultiplied_alpha: false,
            },
            texture.size(),
        );
        Ok(texture)
    }
}

use std::time::Duration;

use video_enhancer::{
    BoxSize, EnhancerError, EnhancerResult, ObjectFit, Side, VideoLayout,
    gpu::{ResourceCache, SharedResourceCache, WgpuSession, acquire},
    platform::{Canvas, Platform, VideoState},
};
use wasm_bindgen::JsValue;
use web_sys::HtmlVideoElement;

use crate::{canvas::WebCanvas, frame::VideoFrameImporter};

/// `HTMLMediaElement.HAVE_CURRENT_DATA`
const HAVE_CURRENT_DATA: u16 = 2;

/// DOM-backed host for one video element
pub struct WebPlatform {
    video: HtmlVideoElement,
    instance: wgpu::Instance,
    cache: SharedResourceCache,
}

impl WebPlatform {
    pub fn new(video: HtmlVideoElement) -> Self {
        Self {
            video,
            instance: acquire::create_instance(),
            cache: ResourceCache::shared(),
        }
    }
}

fn object_fit(video: &HtmlVideoElement) -> ObjectFit {
    web_sys::window()
        .and_then(|window| window.get_computed_style(video).ok().flatten())
        .and_then(|style| style.get_property_value("object-fit").ok())
        .map(|value| ObjectFit::from_css(&value))
        .unwrap_or_default()
}

/// Samples the video's box relative to its offset parent, with its decoded size and fit
pub fn video_layout(video: &HtmlVideoElement) -> VideoLayout {
    VideoLayout {
        container: BoxSize::new(
            video.offset_left() as f64,
            video.offset_top() as f64,
            video.offset_width() as f64,
            video.offset_height() as f64,
        ),
        natural_width: video.video_width(),
        natural_height: video.video_height(),
        object_fit: object_fit(video),
    }
}

impl Platform for WebPlatform {
    type Canvas = WebCanvas;
    type Session = WgpuSession<VideoFrameImporter>;

    fn video_state(&self) -> VideoState {
        VideoState {
            paused: self.video.paused(),
            seeking: self.video.seeking(),
            ready: self.video.ready_state() >= HAVE_CURRENT_DATA,
            natural_width: self.video.video_width(),
            natural_height: self.video.video_height(),
        }
    }

    fn video_layout(&self) -> VideoLayout {
        video_layout(&self.video)
    }

    fn now(&self) -> f64 {
        web_sys::window().and_then(|window| window.performance()).map(|performance| performance.now()).unwrap_or(0.0)
    }

    async fn probe_gpu(&self) -> EnhancerResult<()> {
        acquire::probe(&self.instance).await
    }

    fn create_canvas(&self, side: Side, rect: BoxSize) -> EnhancerResult<WebCanvas> {
        WebCanvas::attach(&self.video, side, rect)
    }

    async fn create_session(&self, canvas: &WebCanvas) -> EnhancerResult<Self::Session> {
        let surface = self
            .instance
            .create_surface(wgpu::SurfaceTarget::Canvas(canvas.element().clone()))
            .map_err(|err| EnhancerError::surface(err.to_string()))?;
        let importer = VideoFrameImporter::new(self.video.clone());
        WgpuSession::connect(&self.instance, surface, canvas.pixel_size(), self.cache.clone(), importer).await
    }

    async fn sleep(&self, duration: Duration) {
        let millis = duration.as_millis().min(i32::MAX as u128) as i32;
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            let scheduled = web_sys::window().is_some_and(|window| window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis).is_ok());
            if !scheduled {
                let _ = resolve.call0(&JsValue::NULL);
            }
        });
        let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
    }
}

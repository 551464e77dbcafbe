//! Host and GPU seams
//!
//! The managers drive everything through these traits. The browser binding implements
//! [`Platform`] and [`Canvas`] over the DOM; [`crate::gpu::WgpuSession`] implements
//! [`GpuSession`] over wgpu. Tests substitute recording fakes.

use std::time::Duration;

use crate::{
    EnhancerResult,
    dimensions::Dimensions,
    divider::ClipInset,
    events::Side,
    layout::{BoxSize, VideoLayout},
    option::{PresetMode, RawMode},
};

/// Playback readiness of the video element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VideoState {
    pub paused: bool,
    pub seeking: bool,
    /// A decoded frame is available (`readyState >= HAVE_CURRENT_DATA`)
    pub ready: bool,
    pub natural_width: u32,
    pub natural_height: u32,
}

impl VideoState {
    /// Whether a render tick has anything to draw
    pub fn is_renderable(&self) -> bool {
        !self.paused && !self.seeking && self.ready && self.natural_width > 0 && self.natural_height > 0
    }
}

#[allow(async_fn_in_trait)]
pub trait Platform {
    type Canvas: Canvas;
    type Session: GpuSession;

    fn video_state(&self) -> VideoState;

    fn video_layout(&self) -> VideoLayout;

    /// Monotonic time in milliseconds
    fn now(&self) -> f64;

    /// Confirms a GPU adapter and device can be obtained at all
    async fn probe_gpu(&self) -> EnhancerResult<()>;

    /// Creates and attaches a canvas overlaying `rect`
    fn create_canvas(&self, side: Side, rect: BoxSize) -> EnhancerResult<Self::Canvas>;

    /// Acquires a dedicated device and a configured presentation context for `canvas`
    async fn create_session(&self, canvas: &Self::Canvas) -> EnhancerResult<Self::Session>;

    async fn sleep(&self, duration: Duration);
}

pub trait Canvas {
    /// Positions and sizes the canvas over `rect`
    fn resize(&mut self, rect: BoxSize);

    /// Backing-store size in device pixels
    fn pixel_size(&self) -> (u32, u32);

    fn set_visible(&mut self, visible: bool);

    fn is_visible(&self) -> bool;

    fn set_clip(&mut self, clip: Option<ClipInset>);

    /// Detaches the canvas from the document
    fn remove(&mut self);
}

/// A recorded pipeline bound to fixed input and output textures
pub trait PipelineStage {
    type Encoder;
    type Texture;

    fn pass(&self, encoder: &mut Self::Encoder);

    fn output_texture(&self) -> &Self::Texture;

    /// Frees every texture the stage allocated
    fn destroy(&mut self);
}

/// A composite pipeline consuming the imported frame directly
pub trait PresetStage {
    type Encoder;
    type Texture;
    type Frame;

    fn pass(&mut self, encoder: &mut Self::Encoder, frame: &Self::Frame) -> EnhancerResult<()>;

    /// Output of the most recent [`PresetStage::pass`]
    fn output_texture(&self) -> Option<&Self::Texture>;

    fn destroy(&mut self);
}

/// One device plus its presentation context, owned by exactly one side
pub trait GpuSession {
    type Texture;
    type Frame;
    type Encoder;
    type Upscaler: PipelineStage<Encoder = Self::Encoder, Texture = Self::Texture>;
    type Preset: PresetStage<Encoder = Self::Encoder, Texture = Self::Texture, Frame = Self::Frame>;

    fn preferred_format(&self) -> wgpu::TextureFormat;

    /// Imports the current video frame as a transient texture
    fn import_frame(&mut self) -> EnhancerResult<Self::Frame>;

    fn create_encoder(&self) -> Self::Encoder;

    /// Allocates a persistent texture the frame is converted into
    fn create_input_texture(&self, dims: Dimensions) -> EnhancerResult<Self::Texture>;

    fn destroy_texture(&self, texture: &Self::Texture);

    fn convert_frame(&self, encoder: &mut Self::Encoder, frame: &Self::Frame, target: &Self::Texture) -> EnhancerResult<()>;

    fn create_upscaler(&self, mode: RawMode, input: &Self::Texture) -> EnhancerResult<Self::Upscaler>;

    fn create_downscaler(&self, input: &Self::Texture, target: Dimensions) -> EnhancerResult<Self::Upscaler>;

    fn create_preset(&self, mode: PresetMode, native: Dimensions, target: Dimensions) -> EnhancerResult<Self::Preset>;

    /// Blits `result` onto the current presentable texture and submits `encoder`
    fn present(&mut self, encoder: Self::Encoder, result: &Self::Texture, target: Dimensions) -> EnhancerResult<()>;

    fn unconfigure(&mut self);

    /// Destroys the device; the session is unusable afterwards
    fn destroy(&mut self);
}

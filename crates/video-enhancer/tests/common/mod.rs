//! Recording fakes for the platform and GPU seams

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};
use std::time::Duration;

use video_enhancer::{
    BoxSize, Dimensions, EnhancerError, EnhancerEvent, EnhancerResult, ObjectFit, PresetMode, RawMode, Side, VideoLayout,
    divider::ClipInset,
    platform::{Canvas, GpuSession, PipelineStage, Platform, PresetStage, VideoState},
};

/// Completes on its second poll, waking itself in between
#[derive(Default)]
pub struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureOp {
    Create { id: u64, width: u32, height: u32 },
    Destroy { id: u64 },
}

#[derive(Debug, Default)]
pub struct Ledger {
    next_id: u64,
    pub texture_ops: Vec<TextureOp>,
    pub devices_created: usize,
    pub devices_destroyed: usize,
    pub unconfigures: usize,
    pub frames_imported: usize,
    /// `(result texture id, target)` of every submitted frame
    pub presents: Vec<(u64, Dimensions)>,
    pub sleeps: usize,
    pub canvases: Vec<Rc<RefCell<CanvasRecord>>>,
}

impl Ledger {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn create_texture(&mut self, width: u32, height: u32) -> FakeTexture {
        let id = self.next_id();
        self.texture_ops.push(TextureOp::Create { id, width, height });
        FakeTexture { id, width, height }
    }

    fn destroy_texture(&mut self, id: u64) {
        self.texture_ops.push(TextureOp::Destroy { id });
    }

    pub fn textures_created(&self) -> usize {
        self.texture_ops.iter().filter(|op| matches!(op, TextureOp::Create { .. })).count()
    }

    pub fn textures_destroyed(&self) -> usize {
        self.texture_ops.iter().filter(|op| matches!(op, TextureOp::Destroy { .. })).count()
    }

    pub fn live_textures(&self) -> usize {
        self.textures_created() - self.textures_destroyed()
    }

    pub fn live_devices(&self) -> usize {
        self.devices_created - self.devices_destroyed
    }

    pub fn attached_canvases(&self) -> usize {
        self.canvases.iter().filter(|c| !c.borrow().removed).count()
    }

    pub fn last_canvas(&self) -> Option<Rc<RefCell<CanvasRecord>>> {
        self.canvases.last().cloned()
    }
}

/// Host-side state the tests mutate while a manager owns the platform
pub struct FakeHost {
    pub ledger: RefCell<Ledger>,
    pub video: Cell<VideoState>,
    pub layout: Cell<VideoLayout>,
    pub clock: Cell<f64>,
    pub probe_error: RefCell<Option<String>>,
    pub session_error: RefCell<Option<String>>,
    pub present_error: RefCell<Option<fn() -> EnhancerError>>,
    pub upscaler_error: RefCell<Option<fn() -> EnhancerError>>,
    pub yield_in_session: Cell<bool>,
    pub yield_in_sleep: Cell<bool>,
}

impl FakeHost {
    pub fn set_natural_size(&self, width: u32, height: u32) {
        let mut video = self.video.get();
        video.natural_width = width;
        video.natural_height = height;
        self.video.set(video);

        let mut layout = self.layout.get();
        layout.natural_width = width;
        layout.natural_height = height;
        self.layout.set(layout);
    }

    pub fn set_container(&self, container: BoxSize) {
        let mut layout = self.layout.get();
        layout.container = container;
        self.layout.set(layout);
    }

    pub fn set_paused(&self, paused: bool) {
        let mut video = self.video.get();
        video.paused = paused;
        self.video.set(video);
    }

    pub fn advance(&self, ms: f64) -> f64 {
        let now = self.clock.get() + ms;
        self.clock.set(now);
        now
    }
}

pub struct FakePlatform {
    host: Rc<FakeHost>,
}

impl FakePlatform {
    /// A playing 640x360 video stretched over a 1280x720 container
    pub fn new() -> (Self, Rc<FakeHost>) {
        let host = Rc::new(FakeHost {
            ledger: RefCell::new(Ledger::default()),
            video: Cell::new(VideoState {
                paused: false,
                seeking: false,
                ready: true,
                natural_width: 640,
                natural_height: 360,
            }),
            layout: Cell::new(VideoLayout {
                container: BoxSize::new(0.0, 0.0, 1280.0, 720.0),
                natural_width: 640,
                natural_height: 360,
                object_fit: ObjectFit::Fill,
            }),
            clock: Cell::new(0.0),
            probe_error: RefCell::new(None),
            session_error: RefCell::new(None),
            present_error: RefCell::new(None),
            upscaler_error: RefCell::new(None),
            yield_in_session: Cell::new(false),
            yield_in_sleep: Cell::new(false),
        });
        (Self { host: host.clone() }, host)
    }
}

impl Platform for FakePlatform {
    type Canvas = FakeCanvas;
    type Session = FakeSession;

    fn video_state(&self) -> VideoState {
        self.host.video.get()
    }

    fn video_layout(&self) -> VideoLayout {
        self.host.layout.get()
    }

    fn now(&self) -> f64 {
        self.host.clock.get()
    }

    async fn probe_gpu(&self) -> EnhancerResult<()> {
        match self.host.probe_error.borrow().clone() {
            Some(message) => Err(EnhancerError::unsupported(message)),
            None => Ok(()),
        }
    }

    fn create_canvas(&self, side: Side, rect: BoxSize) -> EnhancerResult<FakeCanvas> {
        let record = Rc::new(RefCell::new(CanvasRecord {
            side,
            rect,
            visible: true,
            clip: None,
            removed: false,
        }));
        self.host.ledger.borrow_mut().canvases.push(record.clone());
        Ok(FakeCanvas { record })
    }

    async fn create_session(&self, _canvas: &FakeCanvas) -> EnhancerResult<FakeSession> {
        if self.host.yield_in_session.get() {
            YieldOnce::default().await;
        }
        if let Some(message) = self.host.session_error.borrow().clone() {
            return Err(EnhancerError::device_request(message));
        }
        self.host.ledger.borrow_mut().devices_created += 1;
        Ok(FakeSession {
            host: self.host.clone(),
            destroyed: false,
        })
    }

    async fn sleep(&self, _duration: Duration) {
        self.host.ledger.borrow_mut().sleeps += 1;
        if self.host.yield_in_sleep.get() {
            YieldOnce::default().await;
        }
    }
}

#[derive(Debug)]
pub struct CanvasRecord {
    pub side: Side,
    pub rect: BoxSize,
    pub visible: bool,
    pub clip: Option<ClipInset>,
    pub removed: bool,
}

pub struct FakeCanvas {
    record: Rc<RefCell<CanvasRecord>>,
}

impl Canvas for FakeCanvas {
    fn resize(&mut self, rect: BoxSize) {
        self.record.borrow_mut().rect = rect;
    }

    fn pixel_size(&self) -> (u32, u32) {
        let rect = self.record.borrow().rect;
        (rect.width.round() as u32, rect.height.round() as u32)
    }

    fn set_visible(&mut self, visible: bool) {
        self.record.borrow_mut().visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.record.borrow().visible
    }

    fn set_clip(&mut self, clip: Option<ClipInset>) {
        self.record.borrow_mut().clip = clip;
    }

    fn remove(&mut self) {
        self.record.borrow_mut().removed = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeTexture {
    pub id: u64,
    pub width: u32,
    pub height: u32,
}

pub struct FakeSession {
    host: Rc<FakeHost>,
    destroyed: bool,
}

impl GpuSession for FakeSession {
    type Texture = FakeTexture;
    type Frame = FakeTexture;
    type Encoder = Vec<&'static str>;
    type Upscaler = FakeStage;
    type Preset = FakePreset;

    fn preferred_format(&self) -> wgpu::TextureFormat {
        wgpu::TextureFormat::Bgra8Unorm
    }

    fn import_frame(&mut self) -> EnhancerResult<FakeTexture> {
        if self.destroyed {
            return Err(EnhancerError::DeviceLost("destroyed".into()));
        }
        let video = self.host.video.get();
        let mut ledger = self.host.ledger.borrow_mut();
        ledger.frames_imported += 1;
        Ok(FakeTexture {
            id: 0,
            width: video.natural_width,
            height: video.natural_height,
        })
    }

    fn create_encoder(&self) -> Vec<&'static str> {
        Vec::new()
    }

    fn create_input_texture(&self, dims: Dimensions) -> EnhancerResult<FakeTexture> {
        Ok(self.host.ledger.borrow_mut().create_texture(dims.width, dims.height))
    }

    fn destroy_texture(&self, texture: &FakeTexture) {
        self.host.ledger.borrow_mut().destroy_texture(texture.id);
    }

    fn convert_frame(&self, encoder: &mut Vec<&'static str>, _frame: &FakeTexture, _target: &FakeTexture) -> EnhancerResult<()> {
        encoder.push("convert");
        Ok(())
    }

    fn create_upscaler(&self, mode: RawMode, input: &FakeTexture) -> EnhancerResult<FakeStage> {
        if let Some(make_error) = *self.host.upscaler_error.borrow() {
            return Err(make_error());
        }
        let scale = mode.scale_factor();
        let output = self.host.ledger.borrow_mut().create_texture(input.width * scale, input.height * scale);
        Ok(FakeStage::new(self.host.clone(), "upscale", output))
    }

    fn create_downscaler(&self, _input: &FakeTexture, target: Dimensions) -> EnhancerResult<FakeStage> {
        let output = self.host.ledger.borrow_mut().create_texture(target.width, target.height);
        Ok(FakeStage::new(self.host.clone(), "downscale", output))
    }

    fn create_preset(&self, _mode: PresetMode, _native: Dimensions, target: Dimensions) -> EnhancerResult<FakePreset> {
        let output = self.host.ledger.borrow_mut().create_texture(target.width, target.height);
        Ok(FakePreset {
            host: self.host.clone(),
            output: Some(output),
        })
    }

    fn present(&mut self, encoder: Vec<&'static str>, result: &FakeTexture, target: Dimensions) -> EnhancerResult<()> {
        if self.destroyed {
            return Err(EnhancerError::DeviceLost("destroyed".into()));
        }
        if let Some(make_error) = *self.host.present_error.borrow() {
            return Err(make_error());
        }
        assert!(!encoder.is_empty(), "present without recorded passes");
        self.host.ledger.borrow_mut().presents.push((result.id, target));
        Ok(())
    }

    fn unconfigure(&mut self) {
        self.host.ledger.borrow_mut().unconfigures += 1;
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.host.ledger.borrow_mut().devices_destroyed += 1;
        }
    }
}

pub struct FakeStage {
    host: Rc<FakeHost>,
    name: &'static str,
    output: FakeTexture,
    destroyed: bool,
}

impl FakeStage {
    fn new(host: Rc<FakeHost>, name: &'static str, output: FakeTexture) -> Self {
        Self {
            host,
            name,
            output,
            destroyed: false,
        }
    }
}

impl PipelineStage for FakeStage {
    type Encoder = Vec<&'static str>;
    type Texture = FakeTexture;

    fn pass(&self, encoder: &mut Vec<&'static str>) {
        encoder.push(self.name);
    }

    fn output_texture(&self) -> &FakeTexture {
        &self.output
    }

    fn destroy(&mut self) {
        if !self.destroyed {
            self.destroyed = true;
            self.host.ledger.borrow_mut().destroy_texture(self.output.id);
        }
    }
}

pub struct FakePreset {
    host: Rc<FakeHost>,
    output: Option<FakeTexture>,
}

impl PresetStage for FakePreset {
    type Encoder = Vec<&'static str>;
    type Texture = FakeTexture;
    type Frame = FakeTexture;

    fn pass(&mut self, encoder: &mut Vec<&'static str>, _frame: &FakeTexture) -> EnhancerResult<()> {
        if self.output.is_none() {
            return Err(EnhancerError::TextureDestroyed);
        }
        encoder.push("preset");
        Ok(())
    }

    fn output_texture(&self) -> Option<&FakeTexture> {
        self.output.as_ref()
    }

    fn destroy(&mut self) {
        if let Some(output) = self.output.take() {
            self.host.ledger.borrow_mut().destroy_texture(output.id);
        }
    }
}

pub type EventLog = Rc<RefCell<Vec<EnhancerEvent>>>;

/// A log plus a listener appending to it
pub fn event_log() -> (EventLog, impl Fn(&EnhancerEvent) + 'static) {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    (log, move |event: &EnhancerEvent| sink.borrow_mut().push(event.clone()))
}

pub fn count(log: &EventLog, predicate: impl Fn(&EnhancerEvent) -> bool) -> usize {
    log.borrow().iter().filter(|event| predicate(event)).count()
}

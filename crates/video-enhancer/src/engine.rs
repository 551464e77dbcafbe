//! Per-side lifecycle engine
//!
//! A [`SideEngine`] owns one canvas, one GPU session and the caches bound to them, and
//! carries out the [`Action`]s chosen by [`decide`]. Both the single-output and the
//! comparison managers are thin wrappers around one or two engines.
//!
//! All methods take `&self`; state lives in a `RefCell` that is never borrowed across
//! an await or while listeners run, so a destroy may interleave with an in-flight
//! initialize. Each initialize owns a [`CancellationToken`] that teardown cancels; the
//! sequence checks it around every suspension point and releases whatever it created
//! locally instead of resurrecting state.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::{
    EnhancerConfig, EnhancerError, EnhancerResult,
    dimensions::Dimensions,
    divider::ClipInset,
    events::{EnhancerEvent, EventHub, Side},
    governor::FrameDropGovernor,
    layout::BoxSize,
    option::{PipelineOption, PresetMode, RawMode, Route},
    platform::{Canvas, GpuSession, PipelineStage, Platform, PresetStage},
    state_machine::{Action, DecisionInput, StateHint, decide},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No canvas or device has been created yet
    Idle,
    /// Adapter, device and canvas are being acquired
    Initializing,
    /// The render loop is active and the canvas is visible
    Rendering,
    /// The canvas exists but is not displayed
    Hidden,
    /// Torn down; a new initialize may follow
    Destroyed,
}

/// Persistent input texture plus the raw upscaler and downscaler bound to it
///
/// Valid only while the mode and both dimension pairs match; otherwise it is released
/// (input texture explicitly destroyed) before a replacement is created.
struct CachedUpscalerResources<S: GpuSession> {
    mode: RawMode,
    native: Dimensions,
    target: Dimensions,
    input: S::Texture,
    upscaler: S::Upscaler,
    downscaler: S::Upscaler,
}

impl<S: GpuSession> CachedUpscalerResources<S> {
    fn create(session: &S, mode: RawMode, native: Dimensions, target: Dimensions) -> EnhancerResult<Self> {
        let input = session.create_input_texture(native)?;
        let mut upscaler = match session.create_upscaler(mode, &input) {
            Ok(upscaler) => upscaler,
            Err(err) => {
                session.destroy_texture(&input);
                return Err(err);
            }
        };
        let downscaler = match session.create_downscaler(upscaler.output_texture(), target) {
            Ok(downscaler) => downscaler,
            Err(err) => {
                upscaler.destroy();
                session.destroy_texture(&input);
                return Err(err);
            }
        };

        Ok(Self {
            mode,
            native,
            target,
            input,
            upscaler,
            downscaler,
        })
    }

    fn is_valid_for(&self, mode: RawMode, native: Dimensions, target: Dimensions) -> bool {
        self.mode == mode && self.native == native && self.target == target
    }

    fn release(mut self, session: &S) {
        self.downscaler.destroy();
        self.upscaler.destroy();
        session.destroy_texture(&self.input);
    }
}

struct CachedPreset<S: GpuSession> {
    mode: PresetMode,
    native: Dimensions,
    target: Dimensions,
    stage: S::Preset,
}

struct SideState<P: Platform> {
    phase: Phase,
    option: PipelineOption,
    /// Option requested while the layout was unknown
    pending: Option<PipelineOption>,
    canvas: Option<P::Canvas>,
    session: Option<P::Session>,
    cached: Option<CachedUpscalerResources<P::Session>>,
    preset: Option<CachedPreset<P::Session>>,
    render_loop: bool,
    governor_loop: bool,
    governor: FrameDropGovernor,
    cancel: Option<CancellationToken>,
    clip: Option<ClipInset>,
}

pub struct SideEngine<P: Platform> {
    side: Side,
    platform: Rc<P>,
    events: EventHub,
    config: EnhancerConfig,
    state: RefCell<SideState<P>>,
}

impl<P: Platform> SideEngine<P> {
    pub fn new(side: Side, platform: Rc<P>, events: EventHub, config: &EnhancerConfig) -> Self {
        let state = SideState {
            phase: Phase::Idle,
            option: PipelineOption::Off,
            pending: None,
            canvas: None,
            session: None,
            cached: None,
            preset: None,
            render_loop: false,
            governor_loop: false,
            governor: FrameDropGovernor::new(&config.frame_drop),
            cancel: None,
            clip: None,
        };

        Self {
            side,
            platform,
            events,
            config: config.clone(),
            state: RefCell::new(state),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn option(&self) -> PipelineOption {
        self.state.borrow().option
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn is_render_loop_active(&self) -> bool {
        self.state.borrow().render_loop
    }

    pub fn is_governor_active(&self) -> bool {
        self.state.borrow().governor_loop
    }

    fn emit(&self, event: EnhancerEvent) {
        self.events.emit(event);
    }

    fn target_box(&self) -> BoxSize {
        self.platform.video_layout().content_rect()
    }

    /// Selects `option` under `hint`, running the initialize sequence when needed
    pub async fn apply(&self, option: PipelineOption, hint: StateHint) {
        if self.apply_immediate(option, hint) == Action::Reinitialize {
            self.reinitialize(option).await;
        }
    }

    /// Like [`SideEngine::apply`] for a kebab-case tag
    ///
    /// An unknown tag disables enhancement and reports the error like a failed
    /// initialization would.
    pub async fn apply_by_name(&self, name: &str, hint: StateHint) {
        match name.parse::<PipelineOption>() {
            Ok(option) => self.apply(option, hint).await,
            Err(err) => self.fail_to_off(err.to_string()),
        }
    }

    /// Decides and performs every synchronous action; `Reinitialize` is left to the caller
    fn apply_immediate(&self, option: PipelineOption, hint: StateHint) -> Action {
        let target_box = self.target_box();
        let input = {
            let s = self.state.borrow();
            DecisionInput {
                requested: option,
                current: s.option,
                hint,
                target_box,
                has_canvas: s.canvas.is_some(),
                canvas_hidden: s.canvas.as_ref().is_some_and(|canvas| !canvas.is_visible()),
            }
        };

        let action = decide(&input);
        tracing::debug!(side = self.side.name(), requested = %option, current = %input.current, ?action, "option decision");

        // Only an unresolved selection may be replayed by a later resize
        if action != Action::Wait {
            self.state.borrow_mut().pending = None;
        }

        match action {
            Action::Destroy => {
                let live = self.teardown();
                let previous = {
                    let mut s = self.state.borrow_mut();
                    let previous = s.option;
                    if option.is_off() {
                        s.option = PipelineOption::Off;
                    }
                    previous
                };
                if live {
                    self.emit(EnhancerEvent::Destroyed { side: self.side });
                }
                if option.is_off() && !previous.is_off() {
                    self.emit(EnhancerEvent::OptionChanged {
                        side: self.side,
                        option: PipelineOption::Off,
                    });
                }
            }
            Action::Hide => self.hide(),
            Action::Wait => self.state.borrow_mut().pending = Some(option),
            Action::Show => self.show(),
            Action::Reinitialize | Action::Keep => {}
        }
        action
    }

    async fn reinitialize(&self, option: PipelineOption) {
        self.teardown();

        let token = CancellationToken::new();
        {
            let mut s = self.state.borrow_mut();
            s.cancel = Some(token.clone());
            s.phase = Phase::Initializing;
            s.option = option;
            s.pending = None;
        }
        tracing::info!(side = self.side.name(), option = %option, "initializing");

        match self.initialize(&token).await {
            Ok(true) => self.emit(EnhancerEvent::OptionChanged { side: self.side, option }),
            Ok(false) => tracing::debug!(side = self.side.name(), "initialization cancelled"),
            Err(_) if token.is_cancelled() => tracing::debug!(side = self.side.name(), "initialization cancelled"),
            Err(err) => self.fail_to_off(err.to_string()),
        }
    }

    /// Runs the initialize sequence; `Ok(false)` means it was cancelled
    async fn initialize(&self, token: &CancellationToken) -> EnhancerResult<bool> {
        if token.is_cancelled() {
            return Ok(false);
        }
        self.platform.probe_gpu().await?;
        if token.is_cancelled() {
            return Ok(false);
        }

        let mut canvas = self.platform.create_canvas(self.side, self.target_box())?;
        canvas.set_clip(self.state.borrow().clip);

        let session = match self.platform.create_session(&canvas).await {
            Ok(session) => session,
            Err(err) => {
                canvas.remove();
                return Err(err);
            }
        };
        if token.is_cancelled() {
            let mut session = session;
            session.unconfigure();
            canvas.remove();
            session.destroy();
            return Ok(false);
        }

        tracing::debug!(side = self.side.name(), format = ?session.preferred_format(), "session ready");
        {
            let mut s = self.state.borrow_mut();
            s.canvas = Some(canvas);
            s.session = Some(session);
        }

        // From here on teardown owns the canvas and session
        self.platform.sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        if token.is_cancelled() {
            return Ok(false);
        }

        self.emit(EnhancerEvent::CanvasCreated { side: self.side });
        if token.is_cancelled() {
            return Ok(false);
        }

        let now = self.platform.now();
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.cancel = None;
        s.render_loop = true;
        s.phase = match &s.canvas {
            Some(canvas) if !canvas.is_visible() => Phase::Hidden,
            _ => Phase::Rendering,
        };
        if s.governor.is_enabled() {
            s.governor.reset(now);
            s.governor_loop = true;
        }
        tracing::info!(side = self.side.name(), option = %s.option, "rendering started");
        Ok(true)
    }

    /// Disables enhancement after a failure, notifying listeners
    fn fail_to_off(&self, message: String) {
        tracing::warn!(side = self.side.name(), %message, "enhancement disabled");
        self.teardown();
        self.state.borrow_mut().option = PipelineOption::Off;
        self.emit(EnhancerEvent::Error { side: self.side, message });
        self.emit(EnhancerEvent::OptionChanged {
            side: self.side,
            option: PipelineOption::Off,
        });
    }

    /// Releases everything this side owns; returns whether anything was live
    ///
    /// Order: stop loops, free cached pipeline resources, unconfigure the context,
    /// remove the canvas, destroy the device, cancel any in-flight initialize, reset
    /// the frame-drop counters.
    pub fn teardown(&self) -> bool {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        let live = s.canvas.is_some() || s.session.is_some() || s.cancel.is_some();

        s.render_loop = false;
        s.governor_loop = false;
        if let Some(session) = s.session.as_mut() {
            if let Some(cached) = s.cached.take() {
                cached.release(session);
            }
            if let Some(mut preset) = s.preset.take() {
                preset.stage.destroy();
            }
            session.unconfigure();
        }
        if let Some(mut canvas) = s.canvas.take() {
            canvas.remove();
        }
        if let Some(mut session) = s.session.take() {
            session.destroy();
        }
        if let Some(token) = s.cancel.take() {
            token.cancel();
        }
        s.governor = FrameDropGovernor::new(&self.config.frame_drop);

        if live {
            s.phase = Phase::Destroyed;
            tracing::info!(side = self.side.name(), "side destroyed");
        }
        live
    }

    pub fn hide(&self) {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        if let Some(canvas) = s.canvas.as_mut() {
            canvas.set_visible(false);
            if s.phase == Phase::Rendering {
                s.phase = Phase::Hidden;
            }
        }
    }

    pub fn show(&self) {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        if let Some(canvas) = s.canvas.as_mut() {
            canvas.set_visible(true);
            if s.phase == Phase::Hidden {
                s.phase = Phase::Rendering;
            }
        }
    }

    /// Re-fits the canvas to the current content rect
    ///
    /// An option that arrived before the layout was known is applied now.
    pub async fn resize(&self) {
        let rect = self.target_box();
        let pending = {
            let mut s = self.state.borrow_mut();
            if let Some(canvas) = s.canvas.as_mut() {
                canvas.resize(rect);
            }
            if rect.is_empty() { None } else { s.pending.take() }
        };
        if let Some(option) = pending {
            self.apply(option, StateHint::NONE).await;
        }
    }

    pub fn update_canvas_size(&self, rect: BoxSize) {
        if let Some(canvas) = self.state.borrow_mut().canvas.as_mut() {
            canvas.resize(rect);
        }
    }

    /// Stores the clip rectangle and applies it to the current and future canvases
    pub fn set_clip(&self, clip: Option<ClipInset>) {
        let mut guard = self.state.borrow_mut();
        let s = &mut *guard;
        s.clip = clip;
        if let Some(canvas) = s.canvas.as_mut() {
            canvas.set_clip(clip);
        }
    }

    /// Full teardown on behalf of the owning manager
    pub fn destroy(&self) {
        let live = self.teardown();
        {
            let mut s = self.state.borrow_mut();
            s.option = PipelineOption::Off;
            s.pending = None;
        }
        if live {
            self.emit(EnhancerEvent::Destroyed { side: self.side });
        }
    }

    /// Drives both per-refresh loops of this side
    pub fn on_animation_frame(&self, now: f64) {
        let (render, governor) = {
            let s = self.state.borrow();
            (s.render_loop, s.governor_loop)
        };
        if render {
            self.render_tick();
        }
        if governor {
            self.governor_tick(now);
        }
    }

    /// Renders one frame; failures are contained here
    pub fn render_tick(&self) {
        let video = self.platform.video_state();
        if !video.is_renderable() {
            return;
        }

        let result = {
            let mut guard = self.state.borrow_mut();
            let s = &mut *guard;
            let (Some(session), Some(canvas)) = (s.session.as_mut(), s.canvas.as_ref()) else {
                return;
            };

            let native = Dimensions::floored(video.natural_width, video.natural_height);
            let (width, height) = canvas.pixel_size();
            let target = Dimensions::floored(width, height);

            match s.option.route() {
                Route::None => return,
                Route::Raw(mode) => render_raw(session, &mut s.cached, mode, native, target),
                Route::Preset(mode) => render_preset(session, &mut s.preset, mode, native, target),
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_teardown_race() => tracing::trace!(side = self.side.name(), %err, "frame skipped during teardown"),
            Err(err) if err.disables_option() => self.fail_to_off(format!("Enhancement turned off: {err}")),
            Err(err) => tracing::warn!(side = self.side.name(), %err, "frame failed"),
        }
    }

    /// Feeds the governor; on sustained drops falls back to off
    pub fn governor_tick(&self, now: f64) {
        let fired = {
            let mut s = self.state.borrow_mut();
            s.governor_loop && s.governor.tick(now)
        };
        if !fired {
            return;
        }

        let reason = format!("{} consecutive frames exceeded the frame budget", self.config.frame_drop.threshold);
        tracing::info!(side = self.side.name(), %reason, "frame drop fallback");
        self.emit(EnhancerEvent::Fallback {
            side: self.side,
            reason: reason.clone(),
        });
        self.emit(EnhancerEvent::Error {
            side: self.side,
            message: format!("Enhancement turned off: {reason}"),
        });
        self.apply_immediate(PipelineOption::Off, StateHint::NONE);
    }
}

fn render_raw<S: GpuSession>(session: &mut S, cached: &mut Option<CachedUpscalerResources<S>>, mode: RawMode, native: Dimensions, target: Dimensions) -> EnhancerResult<()> {
    if !cached.as_ref().is_some_and(|c| c.is_valid_for(mode, native, target)) {
        if let Some(old) = cached.take() {
            tracing::debug!(?native, ?target, "releasing stale upscaler resources");
            old.release(session);
        }
        *cached = Some(CachedUpscalerResources::create(session, mode, native, target)?);
        tracing::debug!(mode = mode.name(), ?native, ?target, "upscaler resources created");
    }
    let Some(resources) = cached.as_ref() else {
        return Ok(());
    };

    let frame = session.import_frame()?;
    let mut encoder = session.create_encoder();
    session.convert_frame(&mut encoder, &frame, &resources.input)?;
    resources.upscaler.pass(&mut encoder);
    resources.downscaler.pass(&mut encoder);
    session.present(encoder, resources.downscaler.output_texture(), target)
}

fn render_preset<S: GpuSession>(session: &mut S, preset: &mut Option<CachedPreset<S>>, mode: PresetMode, native: Dimensions, target: Dimensions) -> EnhancerResult<()> {
    if !preset.as_ref().is_some_and(|p| p.mode == mode && p.native == native && p.target == target) {
        if let Some(mut old) = preset.take() {
            tracing::debug!(?native, ?target, "releasing stale preset pipeline");
            old.stage.destroy();
        }
        let stage = session.create_preset(mode, native, target)?;
        *preset = Some(CachedPreset { mode, native, target, stage });
    }
    let Some(cached) = preset.as_mut() else {
        return Ok(());
    };

    let frame = session.import_frame()?;
    let mut encoder = session.create_encoder();
    cached.stage.pass(&mut encoder, &frame)?;
    let output = cached.stage.output_texture().ok_or(EnhancerError::TextureDestroyed)?;
    session.present(encoder, output, target)
}

//! Side-by-side comparison manager
//!
//! Two fully independent [`SideEngine`]s, each with its own canvas, device and loops,
//! share one [`Divider`]. The divider only changes CSS clipping: the left canvas shows
//! `0..position`, the right canvas `position..100`.

use std::cell::RefCell;
use std::rc::Rc;

use futures::future::join;

use crate::{
    EnhancerConfig, EnhancerError, EnhancerResult,
    divider::{Divider, Track},
    engine::SideEngine,
    events::{EnhancerEvent, EventHub, Side, SubscriptionId},
    layout::BoxSize,
    option::PipelineOption,
    platform::Platform,
    state_machine::StateHint,
};

pub struct ComparisonEnhancer<P: Platform> {
    events: EventHub,
    config: EnhancerConfig,
    left: SideEngine<P>,
    right: SideEngine<P>,
    divider: RefCell<Divider>,
}

impl<P: Platform> ComparisonEnhancer<P> {
    pub fn new(platform: P, config: EnhancerConfig) -> Self {
        let platform = Rc::new(platform);
        let events = EventHub::new();
        let comparison = Self {
            left: SideEngine::new(Side::Left, platform.clone(), events.clone(), &config),
            right: SideEngine::new(Side::Right, platform, events.clone(), &config),
            divider: RefCell::new(Divider::new(config.comparison.divider_position)),
            events,
            config,
        };
        comparison.apply_clips();
        comparison
    }

    fn engine(&self, side: Side) -> EnhancerResult<&SideEngine<P>> {
        match side {
            Side::Left => Ok(&self.left),
            Side::Right => Ok(&self.right),
            Side::Main => Err(EnhancerError::platform("comparison mode has no main side")),
        }
    }

    /// Applies both selections, driving the two sides concurrently
    pub async fn set_options(&self, left: PipelineOption, right: PipelineOption, hint: StateHint) {
        join(self.left.apply(left, hint), self.right.apply(right, hint)).await;
        self.apply_clips();
    }

    pub async fn set_option(&self, side: Side, option: PipelineOption, hint: StateHint) -> EnhancerResult<()> {
        self.engine(side)?.apply(option, hint).await;
        self.apply_clips();
        Ok(())
    }

    /// Like [`ComparisonEnhancer::set_options`] for kebab-case tags
    ///
    /// A side given an unknown tag is turned off with an error event; the other side
    /// is applied normally.
    pub async fn set_options_by_name(&self, left: &str, right: &str, hint: StateHint) {
        join(self.left.apply_by_name(left, hint), self.right.apply_by_name(right, hint)).await;
        self.apply_clips();
    }

    pub async fn set_option_by_name(&self, side: Side, name: &str, hint: StateHint) -> EnhancerResult<()> {
        self.engine(side)?.apply_by_name(name, hint).await;
        self.apply_clips();
        Ok(())
    }

    /// Restores the persisted selections when comparison mode is enabled
    pub async fn restore(&self) {
        let comparison = &self.config.comparison;
        if comparison.enabled {
            tracing::debug!(left = %comparison.left, right = %comparison.right, "restoring comparison");
            self.set_options(comparison.left, comparison.right, StateHint::NONE).await;
        }
    }

    pub fn current_options(&self) -> (PipelineOption, PipelineOption) {
        (self.left.option(), self.right.option())
    }

    pub fn engine_for(&self, side: Side) -> Option<&SideEngine<P>> {
        self.engine(side).ok()
    }

    pub fn divider_position(&self) -> f64 {
        self.divider.borrow().position()
    }

    /// Sets the divider programmatically, clamped to `[0, 100]`
    pub fn set_divider_position(&self, position: f64) -> f64 {
        let position = self.divider.borrow_mut().set_position(position);
        self.divider_moved(position);
        position
    }

    /// Starts an interactive drag captured by `pointer_id`
    pub fn begin_drag(&self, pointer_id: i32, client_x: f64, track: Track) -> f64 {
        let position = self.divider.borrow_mut().begin_drag(pointer_id, client_x, track);
        self.divider_moved(position);
        position
    }

    pub fn drag(&self, pointer_id: i32, client_x: f64) -> Option<f64> {
        let position = self.divider.borrow_mut().drag(pointer_id, client_x)?;
        self.divider_moved(position);
        Some(position)
    }

    pub fn end_drag(&self, pointer_id: i32) -> bool {
        self.divider.borrow_mut().end_drag(pointer_id)
    }

    fn divider_moved(&self, position: f64) {
        self.apply_clips();
        self.events.emit(EnhancerEvent::DividerChanged { position });
    }

    fn apply_clips(&self) {
        let (left, right) = self.divider.borrow().clip_insets();
        self.left.set_clip(Some(left));
        self.right.set_clip(Some(right));
    }

    pub async fn resize(&self) {
        join(self.left.resize(), self.right.resize()).await;
        self.apply_clips();
    }

    pub fn update_canvas_size(&self, rect: BoxSize) {
        self.left.update_canvas_size(rect);
        self.right.update_canvas_size(rect);
        self.apply_clips();
    }

    /// Drives all four per-refresh loops
    pub fn on_animation_frame(&self, now: f64) {
        self.left.on_animation_frame(now);
        self.right.on_animation_frame(now);
    }

    pub fn destroy(&self) {
        self.left.destroy();
        self.right.destroy();
    }

    pub fn subscribe(&self, listener: impl Fn(&EnhancerEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn once_canvas_created(&self, listener: impl FnOnce(Side) + 'static) {
        self.events.once_canvas_created(listener);
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }
}

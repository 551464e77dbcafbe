use std::rc::Rc;

use crate::{
    EnhancerConfig,
    engine::{Phase, SideEngine},
    events::{EnhancerEvent, EventHub, Side, SubscriptionId},
    layout::BoxSize,
    option::PipelineOption,
    platform::Platform,
    state_machine::StateHint,
};

/// Single-output pipeline manager for normal playback
pub struct Enhancer<P: Platform> {
    events: EventHub,
    engine: SideEngine<P>,
}

impl<P: Platform> Enhancer<P> {
    pub fn new(platform: P, config: EnhancerConfig) -> Self {
        let events = EventHub::new();
        let engine = SideEngine::new(Side::Main, Rc::new(platform), events.clone(), &config);
        Self { events, engine }
    }

    pub async fn set_option(&self, option: PipelineOption, hint: StateHint) {
        self.engine.apply(option, hint).await;
    }

    /// Like [`Enhancer::set_option`] for a kebab-case tag
    ///
    /// An unknown tag disables enhancement and reports the error like a failed
    /// initialization would.
    pub async fn set_option_by_name(&self, name: &str, hint: StateHint) {
        self.engine.apply_by_name(name, hint).await;
    }

    pub async fn resize(&self) {
        self.engine.resize().await;
    }

    pub fn update_canvas_size(&self, rect: BoxSize) {
        self.engine.update_canvas_size(rect);
    }

    pub fn current_option(&self) -> PipelineOption {
        self.engine.option()
    }

    pub fn phase(&self) -> Phase {
        self.engine.phase()
    }

    /// Drives the render and frame-drop loops; call once per display refresh
    pub fn on_animation_frame(&self, now: f64) {
        self.engine.on_animation_frame(now);
    }

    pub fn destroy(&self) {
        self.engine.destroy();
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

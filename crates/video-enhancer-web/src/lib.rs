//! Browser bindings for the video enhancer
//!
//! [`WebEnhancer`] overlays one upscaled canvas on a `<video>` element and
//! [`WebComparison`] overlays two, split by a draggable divider. Both drive rendering
//! from their own `requestAnimationFrame` loop until destroyed.

#![cfg(target_arch = "wasm32")]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use video_enhancer::{
    BoxSize, ComparisonEnhancer, Enhancer, EnhancerConfig, EnhancerEvent, Side, StateHint, SubscriptionId,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::HtmlVideoElement;

mod canvas;
mod divider_handle;
mod frame;
mod platform;
mod render_loop;
mod utils;

use divider_handle::DividerHandle;
use platform::WebPlatform;
use render_loop::AnimationLoop;
use utils::{init_logging, set_panic_hook, to_js_error};

fn parse_config(config_json: Option<String>) -> Result<EnhancerConfig, JsValue> {
    match config_json {
        Some(json) => EnhancerConfig::from_json(&json).map_err(to_js_error),
        None => Ok(EnhancerConfig::default()),
    }
}

fn parse_side(side: &str) -> Result<Side, JsValue> {
    match side {
        "left" => Ok(Side::Left),
        "right" => Ok(Side::Right),
        other => Err(to_js_error(format!("unknown comparison side: {other}"))),
    }
}

fn hint(is_mini_player: bool, is_pip: bool, seeking: bool) -> StateHint {
    StateHint {
        is_mini_player,
        is_pip,
        seeking,
    }
}

fn event_to_js(event: &EnhancerEvent) -> JsValue {
    let object = js_sys::Object::new();
    let set = |key: &str, value: JsValue| {
        let _ = js_sys::Reflect::set(&object, &JsValue::from_str(key), &value);
    };

    let kind = match event {
        EnhancerEvent::CanvasCreated { .. } => "canvas-created",
        EnhancerEvent::OptionChanged { option, .. } => {
            set("option", option.name().into());
            "option-changed"
        }
        EnhancerEvent::Error { message, .. } => {
            set("message", message.as_str().into());
            "error"
        }
        EnhancerEvent::Fallback { reason, .. } => {
            set("reason", reason.as_str().into());
            "fallback"
        }
        EnhancerEvent::Destroyed { .. } => "destroyed",
        EnhancerEvent::DividerChanged { position } => {
            set("position", (*position).into());
            "divider-changed"
        }
    };
    set("type", kind.into());
    if let Some(side) = event.side() {
        set("side", side.name().into());
    }
    object.into()
}

/// Maps JS-visible handles onto core subscription ids
#[derive(Default)]
struct Subscriptions {
    next: Cell<u32>,
    ids: RefCell<Vec<(u32, SubscriptionId)>>,
}

impl Subscriptions {
    fn insert(&self, id: SubscriptionId) -> u32 {
        let handle = self.next.get();
        self.next.set(handle.wrapping_add(1));
        self.ids.borrow_mut().push((handle, id));
        handle
    }

    fn take(&self, handle: u32) -> Option<SubscriptionId> {
        let mut ids = self.ids.borrow_mut();
        let index = ids.iter().position(|(existing, _)| *existing == handle)?;
        Some(ids.swap_remove(index).1)
    }
}

fn js_listener(callback: js_sys::Function) -> impl Fn(&EnhancerEvent) + 'static {
    move |event| {
        if let Err(err) = callback.call1(&JsValue::NULL, &event_to_js(event)) {
            tracing::warn!(?err, "event listener threw");
        }
    }
}

#[wasm_bindgen]
pub struct WebEnhancer {
    enhancer: Rc<Enhancer<WebPlatform>>,
    frame_loop: AnimationLoop,
    subscriptions: Subscriptions,
}

#[wasm_bindgen]
impl WebEnhancer {
    /// Attaches to `video`; `config_json` overrides the default [`EnhancerConfig`]
    #[wasm_bindgen(constructor)]
    pub fn new(video: HtmlVideoElement, config_json: Option<String>) -> Result<WebEnhancer, JsValue> {
        set_panic_hook();
        init_logging();

        let config = parse_config(config_json)?;
        let enhancer = Rc::new(Enhancer::new(WebPlatform::new(video), config));
        let frame_loop = {
            let enhancer = enhancer.clone();
            AnimationLoop::start(move |timestamp| enhancer.on_animation_frame(timestamp))
        };

        Ok(Self {
            enhancer,
            frame_loop,
            subscriptions: Subscriptions::default(),
        })
    }

    /// Selects an option by tag; the promise settles once the change is applied
    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&self, name: String, is_mini_player: bool, is_pip: bool, seeking: bool) -> js_sys::Promise {
        let enhancer = self.enhancer.clone();
        let hint = hint(is_mini_player, is_pip, seeking);
        future_to_promise(async move {
            enhancer.set_option_by_name(&name, hint).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = currentOption)]
    pub fn current_option(&self) -> String {
        self.enhancer.current_option().name().to_owned()
    }

    /// Refits the overlay after the player layout changed
    pub fn resize(&self) -> js_sys::Promise {
        let enhancer = self.enhancer.clone();
        future_to_promise(async move {
            enhancer.resize().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = updateCanvasSize)]
    pub fn update_canvas_size(&self, x: f64, y: f64, width: f64, height: f64) {
        self.enhancer.update_canvas_size(BoxSize::new(x, y, width, height));
    }

    /// Registers `callback` for every lifecycle event; returns a handle for [`WebEnhancer::unsubscribe`]
    pub fn subscribe(&self, callback: js_sys::Function) -> u32 {
        self.subscriptions.insert(self.enhancer.subscribe(js_listener(callback)))
    }

    pub fn unsubscribe(&self, handle: u32) -> bool {
        self.subscriptions.take(handle).is_some_and(|id| self.enhancer.unsubscribe(id))
    }

    pub fn destroy(&self) {
        self.frame_loop.stop();
        self.enhancer.destroy();
    }
}

#[wasm_bindgen]
pub struct WebComparison {
    video: HtmlVideoElement,
    comparison: Rc<ComparisonEnhancer<WebPlatform>>,
    divider: RefCell<Option<DividerHandle>>,
    frame_loop: AnimationLoop,
    subscriptions: Subscriptions,
}

#[wasm_bindgen]
impl WebComparison {
    /// Attaches a left/right comparison to `video` with a draggable divider
    #[wasm_bindgen(constructor)]
    pub fn new(video: HtmlVideoElement, config_json: Option<String>) -> Result<WebComparison, JsValue> {
        set_panic_hook();
        init_logging();

        let config = parse_config(config_json)?;
        let comparison = Rc::new(ComparisonEnhancer::new(WebPlatform::new(video.clone()), config));
        let divider = DividerHandle::attach(comparison.clone(), &video)?;
        let frame_loop = {
            let comparison = comparison.clone();
            AnimationLoop::start(move |timestamp| comparison.on_animation_frame(timestamp))
        };

        Ok(Self {
            video,
            comparison,
            divider: RefCell::new(Some(divider)),
            frame_loop,
            subscriptions: Subscriptions::default(),
        })
    }

    /// Selects both sides by tag; an unknown tag turns only its side off
    #[wasm_bindgen(js_name = setOptions)]
    pub fn set_options(&self, left: String, right: String, is_mini_player: bool, is_pip: bool, seeking: bool) -> js_sys::Promise {
        let comparison = self.comparison.clone();
        let hint = hint(is_mini_player, is_pip, seeking);
        future_to_promise(async move {
            comparison.set_options_by_name(&left, &right, hint).await;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Changes one side; `side` is `"left"` or `"right"`
    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&self, side: String, name: String, is_mini_player: bool, is_pip: bool, seeking: bool) -> Result<js_sys::Promise, JsValue> {
        let side = parse_side(&side)?;
        let comparison = self.comparison.clone();
        let hint = hint(is_mini_player, is_pip, seeking);
        Ok(future_to_promise(async move {
            comparison.set_option_by_name(side, &name, hint).await.map_err(to_js_error)?;
            Ok(JsValue::UNDEFINED)
        }))
    }

    /// Applies the persisted left and right selections if comparison mode is enabled
    ///
    /// The divider position is left as it is.
    pub fn restore(&self) -> js_sys::Promise {
        let comparison = self.comparison.clone();
        future_to_promise(async move {
            comparison.restore().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = currentOptions)]
    pub fn current_options(&self) -> Vec<String> {
        let (left, right) = self.comparison.current_options();
        vec![left.name().to_owned(), right.name().to_owned()]
    }

    #[wasm_bindgen(js_name = dividerPosition)]
    pub fn divider_position(&self) -> f64 {
        self.comparison.divider_position()
    }

    /// Moves the divider to `position` percent; returns the clamped position
    #[wasm_bindgen(js_name = setDividerPosition)]
    pub fn set_divider_position(&self, position: f64) -> f64 {
        self.comparison.set_divider_position(position)
    }

    pub fn resize(&self) -> js_sys::Promise {
        if let Some(divider) = self.divider.borrow().as_ref() {
            divider.refresh(&self.video);
        }
        let comparison = self.comparison.clone();
        future_to_promise(async move {
            comparison.resize().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = updateCanvasSize)]
    pub fn update_canvas_size(&self, x: f64, y: f64, width: f64, height: f64) {
        self.comparison.update_canvas_size(BoxSize::new(x, y, width, height));
    }

    pub fn subscribe(&self, callback: js_sys::Function) -> u32 {
        self.subscriptions.insert(self.comparison.subscribe(js_listener(callback)))
    }

    pub fn unsubscribe(&self, handle: u32) -> bool {
        self.subscriptions.take(handle).is_some_and(|id| self.comparison.unsubscribe(id))
    }

    /// Tears down both sides and removes the divider
    pub fn destroy(&self) {
        self.frame_loop.stop();
        self.divider.borrow_mut().take();
        self.comparison.destroy();
    }
}

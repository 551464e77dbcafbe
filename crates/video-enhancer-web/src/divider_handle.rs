//! Draggable split handle for comparison mode

use std::rc::Rc;

use video_enhancer::{
    ComparisonEnhancer, EnhancerEvent, SubscriptionId,
    divider::{Track, split_x},
};
use wasm_bindgen::{JsCast, JsValue, prelude::Closure};
use web_sys::{HtmlElement, HtmlVideoElement, PointerEvent};

use crate::platform::{WebPlatform, video_layout};

type PointerListener = Closure<dyn FnMut(PointerEvent)>;

pub struct DividerHandle {
    element: HtmlElement,
    comparison: Rc<ComparisonEnhancer<WebPlatform>>,
    subscription: SubscriptionId,
    listeners: Vec<(&'static str, PointerListener)>,
}

fn place(element: &HtmlElement, video: &HtmlVideoElement, position: f64) {
    let content = video_layout(video).content_rect();
    let style = element.style();
    let _ = style.set_property("left", &format!("{}px", split_x(content, position)));
    let _ = style.set_property("top", &format!("{}px", content.y));
    let _ = style.set_property("height", &format!("{}px", content.height));
}

/// Drag track over the content rect; the offset parent's client x is recovered from
/// the video's own bounding box
fn track(video: &HtmlVideoElement) -> Track {
    let origin_x = video.get_bounding_client_rect().left() - video.offset_left() as f64;
    Track::over(video_layout(video).content_rect(), origin_x)
}

impl DividerHandle {
    pub fn attach(comparison: Rc<ComparisonEnhancer<WebPlatform>>, video: &HtmlVideoElement) -> Result<Self, JsValue> {
        let document = video.owner_document().ok_or_else(|| JsValue::from_str("video is not in a document"))?;
        let parent = video.parent_node().ok_or_else(|| JsValue::from_str("video has no parent"))?;

        let element: HtmlElement = document.create_element("div")?.dyn_into()?;
        element.set_class_name("video-enhancer-divider");
        let style = element.style();
        for (property, value) in [
            ("position", "absolute"),
            ("width", "4px"),
            ("margin-left", "-2px"),
            ("background", "rgba(255, 255, 255, 0.8)"),
            ("cursor", "ew-resize"),
            ("touch-action", "none"),
            ("z-index", "2"),
        ] {
            style.set_property(property, value)?;
        }
        parent.insert_before(&element, video.next_sibling().as_ref())?;
        place(&element, video, comparison.divider_position());

        let subscription = {
            let (element, video) = (element.clone(), video.clone());
            comparison.subscribe(move |event| {
                if let EnhancerEvent::DividerChanged { position } = event {
                    place(&element, &video, *position);
                }
            })
        };

        let mut handle = Self {
            element: element.clone(),
            comparison: comparison.clone(),
            subscription,
            listeners: Vec::new(),
        };

        let down = {
            let (comparison, element, video) = (comparison.clone(), element.clone(), video.clone());
            Closure::new(move |event: PointerEvent| {
                event.prevent_default();
                let _ = element.set_pointer_capture(event.pointer_id());
                comparison.begin_drag(event.pointer_id(), event.client_x() as f64, track(&video));
            })
        };
        let moved = {
            let comparison = comparison.clone();
            Closure::new(move |event: PointerEvent| {
                comparison.drag(event.pointer_id(), event.client_x() as f64);
            })
        };
        let up = {
            let (comparison, element) = (comparison, element);
            Closure::new(move |event: PointerEvent| {
                if comparison.end_drag(event.pointer_id()) {
                    let _ = element.release_pointer_capture(event.pointer_id());
                }
            })
        };

        handle.listen("pointerdown", down)?;
        handle.listen("pointermove", moved)?;
        handle.listen("pointerup", up)?;
        let cancel = {
            let comparison = handle.comparison.clone();
            Closure::new(move |event: PointerEvent| {
                comparison.end_drag(event.pointer_id());
            })
        };
        handle.listen("pointercancel", cancel)?;

        Ok(handle)
    }

    /// Re-places the handle after the player layout changed
    pub fn refresh(&self, video: &HtmlVideoElement) {
        place(&self.element, video, self.comparison.divider_position());
    }

    fn listen(&mut self, event: &'static str, listener: PointerListener) -> Result<(), JsValue> {
        self.element.add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())?;
        self.listeners.push((event, listener));
        Ok(())
    }
}

impl Drop for DividerHandle {
    fn drop(&mut self) {
        for (event, listener) in &self.listeners {
            let _ = self.element.remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
        self.comparison.unsubscribe(self.subscription);
        self.element.remove();
    }
}

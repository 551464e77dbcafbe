//! Overlay canvas placed over the video content rectangle

use video_enhancer::{BoxSize, EnhancerError, EnhancerResult, Side, divider::ClipInset, platform::Canvas};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, HtmlVideoElement};

pub struct WebCanvas {
    element: HtmlCanvasElement,
    visible: bool,
}

impl WebCanvas {
    /// Creates a canvas as the video's next sibling so both share an offset parent
    pub fn attach(video: &HtmlVideoElement, side: Side, rect: BoxSize) -> EnhancerResult<Self> {
        let document = video.owner_document().ok_or_else(|| EnhancerError::canvas("video is not in a document"))?;
        let parent = video.parent_node().ok_or_else(|| EnhancerError::canvas("video has no parent"))?;

        let element: HtmlCanvasElement = document
            .create_element("canvas")
            .map_err(|err| EnhancerError::canvas(format!("{err:?}")))?
            .dyn_into()
            .map_err(|_| EnhancerError::canvas("created element is not a canvas"))?;
        element.set_class_name(&format!("video-enhancer-canvas video-enhancer-{}", side.name()));

        let style = element.style();
        for (property, value) in [("position", "absolute"), ("pointer-events", "none"), ("z-index", "1"), ("display", "block")] {
            style.set_property(property, value).map_err(|err| EnhancerError::canvas(format!("{err:?}")))?;
        }

        parent
            .insert_before(&element, video.next_sibling().as_ref())
            .map_err(|err| EnhancerError::canvas(format!("{err:?}")))?;

        let mut canvas = Self { element, visible: true };
        canvas.resize(rect);
        tracing::debug!(side = side.name(), width = rect.width, height = rect.height, "canvas attached");
        Ok(canvas)
    }

    pub fn element(&self) -> &HtmlCanvasElement {
        &self.element
    }
}

fn device_pixel_ratio() -> f64 {
    web_sys::window().map(|w| w.device_pixel_ratio()).filter(|ratio| *ratio > 0.0).unwrap_or(1.0)
}

impl Canvas for WebCanvas {
    fn resize(&mut self, rect: BoxSize) {
        let style = self.element.style();
        let _ = style.set_property("left", &format!("{}px", rect.x));
        let _ = style.set_property("top", &format!("{}px", rect.y));
        let _ = style.set_property("width", &format!("{}px", rect.width));
        let _ = style.set_property("height", &format!("{}px", rect.height));

        let ratio = device_pixel_ratio();
        self.element.set_width((rect.width * ratio).round().max(1.0) as u32);
        self.element.set_height((rect.height * ratio).round().max(1.0) as u32);
    }

    fn pixel_size(&self) -> (u32, u32) {
        (self.element.width(), self.element.height())
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        let _ = self.element.style().set_property("display", if visible { "block" } else { "none" });
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn set_clip(&mut self, clip: Option<ClipInset>) {
        let style = self.element.style();
        let _ = match clip {
            Some(clip) => style.set_property("clip-path", &clip.to_string()),
            None => style.remove_property("clip-path").map(|_| ()),
        };
    }

    fn remove(&mut self) {
        self.element.remove();
    }
}

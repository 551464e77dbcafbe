use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{JsCast, prelude::Closure};

type FrameCallback = Closure<dyn FnMut(f64)>;

/// A `requestAnimationFrame` loop that stops when dropped
///
/// Stopping takes effect on the next refresh, where the callback releases itself; it
/// is never freed while it may still be running.
pub struct AnimationLoop {
    running: Rc<Cell<bool>>,
}

impl AnimationLoop {
    /// Calls `tick` with the frame timestamp on every display refresh
    pub fn start(mut tick: impl FnMut(f64) + 'static) -> Self {
        let running = Rc::new(Cell::new(true));

        let f: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        let loop_running = running.clone();

        *g.borrow_mut() = Some(Closure::new(move |timestamp: f64| {
            if !loop_running.get() {
                f.borrow_mut().take();
                return;
            }
            tick(timestamp);
            if let Some(callback) = f.borrow().as_ref() {
                request_animation_frame(callback);
            }
        }));

        if let Some(callback) = g.borrow().as_ref() {
            request_animation_frame(callback);
        }
        Self { running }
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn stop(&self) {
        self.running.set(false);
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn request_animation_frame(callback: &FrameCallback) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Err(err) = window.request_animation_frame(callback.as_ref().unchecked_ref()) {
        tracing::warn!(?err, "requestAnimationFrame failed");
    }
}

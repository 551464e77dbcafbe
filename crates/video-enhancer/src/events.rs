//! Lifecycle notifications
//!
//! An [`EventHub`] fans every [`EnhancerEvent`] out to persistent subscribers and, for
//! canvas creation, to one-shot listeners. Callbacks run after the hub's own borrow is
//! released, so a subscriber may subscribe, unsubscribe or emit from inside a callback.

use std::cell::RefCell;
use std::rc::Rc;

use crate::option::PipelineOption;

/// Which output an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The single output of [`crate::Enhancer`]
    Main,
    Left,
    Right,
}

impl Side {
    pub fn name(&self) -> &'static str {
        match self {
            Side::Main => "main",
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnhancerEvent {
    CanvasCreated { side: Side },
    OptionChanged { side: Side, option: PipelineOption },
    Error { side: Side, message: String },
    Fallback { side: Side, reason: String },
    Destroyed { side: Side },
    DividerChanged { position: f64 },
}

impl EnhancerEvent {
    pub fn side(&self) -> Option<Side> {
        match self {
            EnhancerEvent::CanvasCreated { side }
            | EnhancerEvent::OptionChanged { side, .. }
            | EnhancerEvent::Error { side, .. }
            | EnhancerEvent::Fallback { side, .. }
            | EnhancerEvent::Destroyed { side } => Some(*side),
            EnhancerEvent::DividerChanged { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&EnhancerEvent)>;
type CanvasListener = Box<dyn FnOnce(Side)>;

#[derive(Default)]
struct HubInner {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
    canvas_created_once: Vec<CanvasListener>,
}

/// Shared observer registry; clones refer to the same registry
#[derive(Clone, Default)]
pub struct EventHub {
    inner: Rc<RefCell<HubInner>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: impl Fn(&EnhancerEvent) + 'static) -> SubscriptionId {
        let mut inner = self.inner.borrow_mut();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.listeners.push((id, Rc::new(listener)));
        id
    }

    /// Returns `false` when `id` was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _)| *existing != id);
        inner.listeners.len() != before
    }

    /// Registers a listener that fires on the next canvas creation only
    pub fn once_canvas_created(&self, listener: impl FnOnce(Side) + 'static) {
        self.inner.borrow_mut().canvas_created_once.push(Box::new(listener));
    }

    pub fn emit(&self, event: EnhancerEvent) {
        let (listeners, once) = {
            let mut inner = self.inner.borrow_mut();
            let listeners: Vec<Listener> = inner.listeners.iter().map(|(_, l)| l.clone()).collect();
            let once = match event {
                EnhancerEvent::CanvasCreated { .. } => std::mem::take(&mut inner.canvas_created_once),
                _ => Vec::new(),
            };
            (listeners, once)
        };

        if let EnhancerEvent::CanvasCreated { side } = event {
            for listener in once {
                listener(side);
            }
        }
        for listener in listeners {
            listener(&event);
        }
    }
}

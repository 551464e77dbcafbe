//! Option-selection policy
//!
//! [`decide`] maps a requested option, the interaction hint and the current side state
//! to exactly one [`Action`]. It has no side effects; the engine carries the action out.

use crate::{layout::BoxSize, option::PipelineOption};

/// Interaction state accompanying an option selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateHint {
    pub is_mini_player: bool,
    pub is_pip: bool,
    pub seeking: bool,
}

impl StateHint {
    pub const NONE: StateHint = StateHint {
        is_mini_player: false,
        is_pip: false,
        seeking: false,
    };

    pub fn seeking() -> Self {
        Self { seeking: true, ..Self::NONE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionInput {
    pub requested: PipelineOption,
    pub current: PipelineOption,
    pub hint: StateHint,
    pub target_box: BoxSize,
    pub has_canvas: bool,
    pub canvas_hidden: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Full teardown of the side
    Destroy,
    /// Suppress display, keep every GPU resource
    Hide,
    /// Layout not known yet; try again on a later call
    Wait,
    /// Restore display without touching the GPU
    Show,
    /// Tear down whatever exists and run the initialize sequence
    Reinitialize,
    /// Already in the requested state
    Keep,
}

pub fn decide(input: &DecisionInput) -> Action {
    if input.requested.is_off() {
        return if !input.current.is_off() || input.has_canvas { Action::Destroy } else { Action::Keep };
    }
    if input.hint.is_mini_player || input.hint.is_pip {
        return Action::Destroy;
    }
    if input.hint.seeking {
        return Action::Hide;
    }
    if input.target_box.is_empty() {
        return Action::Wait;
    }

    let changed = input.requested != input.current;
    if input.has_canvas && input.canvas_hidden && !changed {
        return Action::Show;
    }
    if changed || !input.has_canvas {
        return Action::Reinitialize;
    }
    Action::Keep
}

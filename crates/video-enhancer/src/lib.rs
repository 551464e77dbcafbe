//! GPU upscaling pipeline manager for playing video
//!
//! An [`Enhancer`] overlays one canvas on a video element and redraws every frame
//! through a chosen upscaling chain; a [`ComparisonEnhancer`] does the same for two
//! independently configured sides split by a draggable divider. Both are driven by the
//! host through the [`platform`] traits, which the browser binding implements over the
//! DOM and [`gpu::WgpuSession`].
//!
//! Failures never propagate to the host: a failed initialization or sustained frame
//! drops turn enhancement off and are reported as [`EnhancerEvent`]s.

pub mod comparison;
pub mod config;
pub mod dimensions;
pub mod divider;
pub mod engine;
pub mod enhancer;
pub mod error;
pub mod events;
pub mod governor;
pub mod gpu;
pub mod layout;
pub mod option;
pub mod platform;
pub mod state_machine;

pub use comparison::ComparisonEnhancer;
pub use config::{ComparisonConfig, EnhancerConfig, FrameDropConfig};
pub use dimensions::Dimensions;
pub use engine::Phase;
pub use enhancer::Enhancer;
pub use error::{EnhancerError, EnhancerResult};
pub use events::{EnhancerEvent, Side, SubscriptionId};
pub use layout::{BoxSize, ObjectFit, VideoLayout};
pub use option::{PipelineOption, PresetMode, RawMode};
pub use state_machine::StateHint;

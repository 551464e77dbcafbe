//! wgpu implementation of [`crate::platform::GpuSession`]

pub mod acquire;
pub mod cache;
pub mod convert;
mod session;

pub use cache::{DeviceKey, ResourceCache, SharedResourceCache};
pub use session::{FrameImporter, OFFSCREEN_FORMAT, Presenter, WgpuPreset, WgpuSession, WgpuUpscaler};

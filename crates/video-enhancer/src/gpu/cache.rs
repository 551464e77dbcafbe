//! Memoized conversion and blit pipelines
//!
//! Entries are keyed by a [`DeviceKey`] assigned when a session is created, plus the
//! target format for blit pipelines. Nothing holds a device alive through the cache
//! longer than its session: [`ResourceCache::purge`] runs when the session destroys
//! its device.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use super::convert;

/// Process-unique identity of one session's device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceKey(u64);

impl DeviceKey {
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Compute pipeline copying a frame into a stable texture
#[derive(Debug, Clone)]
pub struct ConverterPipeline {
    pub pipeline: wgpu::ComputePipeline,
    pub layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
}

/// Full-screen triangle render pipeline for one target format
#[derive(Debug, Clone)]
pub struct BlitPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,
}

#[derive(Debug, Default)]
pub struct ResourceCache {
    converters: HashMap<DeviceKey, ConverterPipeline>,
    blits: HashMap<(DeviceKey, wgpu::TextureFormat), BlitPipeline>,
}

pub type SharedResourceCache = Rc<RefCell<ResourceCache>>;

impl ResourceCache {
    pub fn shared() -> SharedResourceCache {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn converter(&mut self, key: DeviceKey, device: &wgpu::Device) -> ConverterPipeline {
        self.converters
            .entry(key)
            .or_insert_with(|| {
                tracing::debug!(?key, "creating frame converter pipeline");
                convert::create_converter_pipeline(device)
            })
            .clone()
    }

    pub fn blit(&mut self, key: DeviceKey, device: &wgpu::Device, format: wgpu::TextureFormat) -> BlitPipeline {
        self.blits
            .entry((key, format))
            .or_insert_with(|| {
                tracing::debug!(?key, ?format, "creating blit pipeline");
                convert::create_blit_pipeline(device, format)
            })
            .clone()
    }

    /// Drops every entry of `key`; returns how many were removed
    pub fn purge(&mut self, key: DeviceKey) -> usize {
        let before = self.len();
        self.converters.remove(&key);
        self.blits.retain(|(entry_key, _), _| *entry_key != key);
        before - self.len()
    }

    pub fn len(&self) -> usize {
        self.converters.len() + self.blits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_keys_are_unique() {
        let a = DeviceKey::next();
        let b = DeviceKey::next();
        assert_ne!(a, b);
    }

    #[test]
    fn purge_of_unknown_key_is_noop() {
        let mut cache = ResourceCache::default();
        assert_eq!(cache.purge(DeviceKey::next()), 0);
        assert!(cache.is_empty());
    }
}

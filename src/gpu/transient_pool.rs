//! Transient Texture Pool
//!
//! Recycles scratch textures between frames. The effect acquires its
//! pyramid levels and composite surface during a frame and releases each
//! one before the frame ends; released textures go back to a free list
//! keyed by size and format and are handed out again on the next matching
//! request.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               TransientPool<R>                │
//! │                                               │
//! │  slots: [Option<Slot<R>>]  ←── TransientId    │
//! │  free:  FxHashMap<PoolKey, Vec<slot index>>   │
//! │                                               │
//! │  allocate(key, create) → TransientId          │
//! │  get(id)        while in use                  │
//! │  release(id)    back to the free list         │
//! │  trim(n)        drop textures idle > n frames │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The pool is generic over the pooled resource so the bookkeeping can be
//! exercised without a device.

use rustc_hash::FxHashMap;

use crate::host::{SurfaceDesc, TransientId};

/// Key for texture recycling.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
}

impl From<&SurfaceDesc> for PoolKey {
    fn from(desc: &SurfaceDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
        }
    }
}

#[derive(Debug)]
struct Slot<R> {
    key: PoolKey,
    resource: R,
    in_use: bool,
    /// Frames spent on the free list without being reused.
    idle_frames: u32,
}

/// Pool of per-frame scratch resources.
#[derive(Debug)]
pub struct TransientPool<R> {
    slots: Vec<Option<Slot<R>>>,
    free: FxHashMap<PoolKey, Vec<u32>>,
    vacant: Vec<u32>,
}

impl<R> Default for TransientPool<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> TransientPool<R> {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: FxHashMap::default(),
            vacant: Vec::new(),
        }
    }

    /// Hand out a resource matching `key`, reusing a free one if possible
    /// and calling `create` otherwise.
    pub fn allocate(
        &mut self,
        key: PoolKey,
        create: impl FnOnce() -> R,
    ) -> TransientId {
        if let Some(index) = self.free.get_mut(&key).and_then(Vec::pop) {
            if let Some(slot) = self.slot_mut(index) {
                slot.in_use = true;
                slot.idle_frames = 0;
                return TransientId(index);
            }
        }

        let slot = Slot {
            key,
            resource: create(),
            in_use: true,
            idle_frames: 0,
        };
        if let Some(index) = self.vacant.pop() {
            self.slots[index as usize] = Some(slot);
            TransientId(index)
        } else {
            self.slots.push(Some(slot));
            TransientId(self.slots.len() as u32 - 1)
        }
    }

    /// The resource behind `id`, if it is currently allocated.
    #[must_use]
    pub fn get(&self, id: TransientId) -> Option<&R> {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .filter(|slot| slot.in_use)
            .map(|slot| &slot.resource)
    }

    /// Return `id` to the free list. Releasing an id that is not allocated
    /// is ignored with a warning and returns `false`.
    pub fn release(&mut self, id: TransientId) -> bool {
        let Some(slot) = self.slot_mut(id.0).filter(|slot| slot.in_use) else {
            log::warn!("ignoring release of transient #{} (not in use)", id.0);
            return false;
        };
        slot.in_use = false;
        let key = slot.key;
        self.free.entry(key).or_default().push(id.0);
        true
    }

    /// Age every free resource by one frame and drop those idle for more
    /// than `max_idle_frames`. Returns how many were dropped.
    pub fn trim(&mut self, max_idle_frames: u32) -> usize {
        let mut dropped = 0;
        for (index, entry) in self.slots.iter_mut().enumerate() {
            let Some(slot) = entry else { continue };
            if slot.in_use {
                continue;
            }
            slot.idle_frames += 1;
            if slot.idle_frames > max_idle_frames {
                if let Some(bucket) = self.free.get_mut(&slot.key) {
                    bucket.retain(|&i| i as usize != index);
                }
                *entry = None;
                self.vacant.push(index as u32);
                dropped += 1;
            }
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
        dropped
    }

    /// Number of resources currently allocated.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| slot.in_use)
            .count()
    }

    /// Total number of resources held (allocated and free).
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    fn slot_mut(&mut self, index: u32) -> Option<&mut Slot<R>> {
        self.slots.get_mut(index as usize).and_then(Option::as_mut)
    }
}

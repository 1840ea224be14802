//! Per-device resource cache.
//!
//! The dictionary maps a [`ResourceKey`] to at most one live instance per
//! device. [`get_or_load`](ResourceDictionary::get_or_load) is the only
//! creation path; everything else only looks up, releases or unloads.
//!
//! # Ownership
//!
//! Several nodes may reference the same key. Every successful `get_or_load`
//! counts one user; [`release`](ResourceDictionary::release) drops a user and
//! unloads the instance once nobody uses it any more. Device loss and explicit
//! clears unload regardless of users, in reverse load order.
//!
//! # Threading
//!
//! Mutation happens on the update thread only. Render threads call
//! [`get`](ResourceDictionary::get) through a shared reference and only ever
//! see instances of their own device index.

use std::any::type_name;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::core::device::{DeviceIndex, DeviceSlots, RenderDevice};
use crate::errors::{Result, StrataError};
use crate::resources::resource::{Resource, ResourceCell, ResourceKey, SharedResource};

struct Entry {
    cell: Arc<dyn ResourceCell>,
    users: u32,
    /// Monotonic load sequence, used to unload in reverse order.
    sequence: u64,
}

/// Maps `(key, device)` to one loaded resource instance.
#[derive(Default)]
pub struct ResourceDictionary {
    entries: FxHashMap<ResourceKey, DeviceSlots<Entry>>,
    next_sequence: u64,
    loads: u64,
    unloads: u64,
}

impl ResourceDictionary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the instance for `key` on `device`, creating and loading it
    /// with `factory` on first request.
    ///
    /// The factory runs at most once per key and device until the instance
    /// is unloaded. Repeated calls return the same `Arc` and count one more
    /// user each.
    pub fn get_or_load<R, F>(&mut self, key: ResourceKey, device: &RenderDevice, factory: F) -> Result<SharedResource<R>>
    where
        R: Resource,
        F: FnOnce() -> R,
    {
        device.ensure_active()?;
        let index = device.index();

        if let Some(entry) = self.entries.get_mut(&key).and_then(|slots| slots.get_mut(index)) {
            let shared = downcast::<R>(key, &entry.cell)?;
            if !entry.cell.is_loaded() {
                // Unloaded behind our back (e.g. by the resource itself): load in place.
                entry.cell.reload(device).map_err(|err| StrataError::ResourceLoadFailed {
                    key,
                    device: index,
                    reason: err.to_string(),
                })?;
                self.loads += 1;
            }
            entry.users += 1;
            return Ok(shared);
        }

        let mut resource = factory();
        resource.load(device).map_err(|err| StrataError::ResourceLoadFailed {
            key,
            device: index,
            reason: err.to_string(),
        })?;

        let shared: SharedResource<R> = Arc::new(RwLock::new(resource));
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.loads += 1;

        self.entries.entry(key).or_default().insert(
            index,
            Entry {
                cell: shared.clone(),
                users: 1,
                sequence,
            },
        );
        log::debug!("Loaded {} as {key:?} on {index:?}", type_name::<R>());
        Ok(shared)
    }

    /// Looks up a loaded instance without creating it.
    pub fn get<R: Resource>(&self, key: ResourceKey, device: DeviceIndex) -> Result<SharedResource<R>> {
        let entry = self
            .entries
            .get(&key)
            .and_then(|slots| slots.get(device))
            .filter(|entry| entry.cell.is_loaded())
            .ok_or(StrataError::ResourceNotReady { key, device })?;
        downcast::<R>(key, &entry.cell)
    }

    #[must_use]
    pub fn is_loaded(&self, key: ResourceKey, device: DeviceIndex) -> bool {
        self.entries
            .get(&key)
            .and_then(|slots| slots.get(device))
            .is_some_and(|entry| entry.cell.is_loaded())
    }

    /// Number of users currently holding `key` on `device`.
    #[must_use]
    pub fn users(&self, key: ResourceKey, device: DeviceIndex) -> u32 {
        self.entries
            .get(&key)
            .and_then(|slots| slots.get(device))
            .map_or(0, |entry| entry.users)
    }

    /// Drops one user. Returns `true` if this unloaded the instance.
    pub fn release(&mut self, key: ResourceKey, device: DeviceIndex) -> bool {
        let Some(entry) = self.entries.get_mut(&key).and_then(|slots| slots.get_mut(device)) else {
            return false;
        };
        entry.users = entry.users.saturating_sub(1);
        if entry.users > 0 {
            return false;
        }
        self.unload(key, device)
    }

    /// Unloads the instance regardless of its users. Returns `true` if one
    /// was stored.
    pub fn unload(&mut self, key: ResourceKey, device: DeviceIndex) -> bool {
        let Some(slots) = self.entries.get_mut(&key) else {
            return false;
        };
        let Some(entry) = slots.remove(device) else {
            return false;
        };
        if slots.is_empty() {
            self.entries.remove(&key);
        }
        entry.cell.unload();
        self.unloads += 1;
        log::debug!("Unloaded {key:?} on {device:?}");
        true
    }

    /// Unloads every instance held for `device` (device removal or reset).
    pub fn clear_device(&mut self, device: DeviceIndex) -> usize {
        let mut removed: Vec<(ResourceKey, Entry)> = Vec::new();
        self.entries.retain(|key, slots| {
            if let Some(entry) = slots.remove(device) {
                removed.push((*key, entry));
            }
            !slots.is_empty()
        });
        let count = removed.len();
        self.unload_in_reverse_order(removed);
        if count > 0 {
            log::debug!("Cleared {count} resources on {device:?}");
        }
        count
    }

    /// Unloads everything on every device.
    pub fn clear(&mut self) {
        let removed: Vec<(ResourceKey, Entry)> = self
            .entries
            .drain()
            .flat_map(|(key, mut slots)| slots.drain().map(|(_, entry)| (key, entry)).collect::<Vec<_>>())
            .collect();
        self.unload_in_reverse_order(removed);
    }

    fn unload_in_reverse_order(&mut self, mut removed: Vec<(ResourceKey, Entry)>) {
        removed.sort_by_key(|(_, entry)| std::cmp::Reverse(entry.sequence));
        for (_, entry) in removed {
            entry.cell.unload();
            self.unloads += 1;
        }
    }

    /// Keys with a live instance on `device`.
    pub fn keys_on(&self, device: DeviceIndex) -> impl Iterator<Item = ResourceKey> + '_ {
        self.entries
            .iter()
            .filter(move |(_, slots)| slots.contains(device))
            .map(|(key, _)| *key)
    }

    /// Number of live instances across all devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(DeviceSlots::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total loads performed since creation.
    #[must_use]
    pub fn load_count(&self) -> u64 {
        self.loads
    }

    /// Total unloads performed since creation.
    #[must_use]
    pub fn unload_count(&self) -> u64 {
        self.unloads
    }
}

impl std::fmt::Debug for ResourceDictionary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceDictionary")
            .field("keys", &self.entries.len())
            .field("instances", &self.len())
            .field("loads", &self.loads)
            .field("unloads", &self.unloads)
            .finish_non_exhaustive()
    }
}

fn downcast<R: Resource>(key: ResourceKey, cell: &Arc<dyn ResourceCell>) -> Result<SharedResource<R>> {
    Arc::clone(cell)
        .into_any()
        .downcast::<RwLock<R>>()
        .map_err(|_| StrataError::ResourceTypeMismatch {
            key,
            expected: type_name::<R>(),
        })
}

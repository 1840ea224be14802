//! Rendering devices and the device registry.
//!
//! The registry plays the role of the device provider: it hands out stable
//! small-integer indices for attached devices and records attach / remove /
//! reset events. The rest of the core uses [`DeviceIndex`] purely as an
//! offset into [`DeviceSlots`](super::slots::DeviceSlots).

use serde::{Deserialize, Serialize};

use crate::core::slots::{IndexedSlots, SlotIndex};
use crate::errors::{Result, StrataError};

/// Stable index of an attached rendering device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeviceIndex(u32);

impl DeviceIndex {
    #[inline]
    #[must_use]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl SlotIndex for DeviceIndex {
    #[inline]
    fn to_offset(self) -> usize {
        self.0 as usize
    }

    #[inline]
    fn from_offset(offset: usize) -> Self {
        Self(offset as u32)
    }
}

/// One slot per attached device.
pub type DeviceSlots<T> = IndexedSlots<DeviceIndex, T>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceState {
    /// Usable for loading and rendering.
    Active,
    /// Lost by the driver; nothing may be loaded until it is reset.
    Lost,
    /// Removed from the registry. Never usable again.
    Disposed,
}

/// Notification emitted by the registry, consumed by the engine at the
/// start of the next frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    Attached(DeviceIndex),
    Removed(DeviceIndex),
    /// The device was lost; every resource it held is unloaded.
    Lost(DeviceIndex),
    /// The device was reset; every resource it held must be reloaded.
    Reset(DeviceIndex),
}

/// An attached rendering device (monitor, window or adapter).
///
/// GPU handles live in the concrete resources; the core only needs the index,
/// a label for diagnostics and whether the device can currently be used.
#[derive(Debug)]
pub struct RenderDevice {
    index: DeviceIndex,
    label: String,
    generation: u32,
    state: DeviceState,
}

impl RenderDevice {
    #[inline]
    #[must_use]
    pub fn index(&self) -> DeviceIndex {
        self.index
    }

    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Incremented on every reset.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u32 {
        self.generation
    }

    #[inline]
    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == DeviceState::Active
    }

    /// Fails with [`StrataError::DeviceUnavailable`] unless the device is active.
    pub fn ensure_active(&self) -> Result<()> {
        if self.is_active() {
            Ok(())
        } else {
            Err(StrataError::DeviceUnavailable(self.index))
        }
    }
}

/// Owns every attached [`RenderDevice`].
#[derive(Debug)]
pub struct DeviceRegistry {
    devices: DeviceSlots<RenderDevice>,
    max_devices: usize,
    events: Vec<DeviceEvent>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new(max_devices: usize) -> Self {
        Self {
            devices: DeviceSlots::with_capacity(max_devices),
            max_devices,
            events: Vec::new(),
        }
    }

    /// Attaches a new device at the lowest free index.
    pub fn attach(&mut self, label: impl Into<String>) -> Result<DeviceIndex> {
        let offset = (0..self.max_devices)
            .find(|&offset| !self.devices.contains(DeviceIndex::from_offset(offset)))
            .ok_or(StrataError::DeviceLimitReached(self.max_devices))?;
        let index = DeviceIndex::from_offset(offset);
        let label = label.into();

        log::info!("Device attached: {label} at {index:?}");
        self.devices.insert(
            index,
            RenderDevice {
                index,
                label,
                generation: 0,
                state: DeviceState::Active,
            },
        );
        self.events.push(DeviceEvent::Attached(index));
        Ok(index)
    }

    /// Removes (disposes) a device. Its index becomes free for reuse.
    pub fn remove(&mut self, index: DeviceIndex) -> Result<RenderDevice> {
        let mut device = self
            .devices
            .remove(index)
            .ok_or(StrataError::DeviceUnavailable(index))?;
        device.state = DeviceState::Disposed;
        log::info!("Device removed: {} at {index:?}", device.label);
        self.events.push(DeviceEvent::Removed(index));
        Ok(device)
    }

    /// Marks a device as lost. Loading against it fails until [`reset`](Self::reset).
    pub fn mark_lost(&mut self, index: DeviceIndex) -> Result<()> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(StrataError::DeviceUnavailable(index))?;
        log::warn!("Device lost: {} at {index:?}", device.label);
        if device.state == DeviceState::Lost {
            return Ok(());
        }
        device.state = DeviceState::Lost;
        self.events.push(DeviceEvent::Lost(index));
        Ok(())
    }

    /// Resets a device: bumps its generation, makes it active again and
    /// queues a [`DeviceEvent::Reset`] so every resource is unloaded.
    pub fn reset(&mut self, index: DeviceIndex) -> Result<()> {
        let device = self
            .devices
            .get_mut(index)
            .ok_or(StrataError::DeviceUnavailable(index))?;
        device.generation = device.generation.wrapping_add(1);
        device.state = DeviceState::Active;
        log::info!("Device reset: {} at {index:?} (generation {})", device.label, device.generation);
        self.events.push(DeviceEvent::Reset(index));
        Ok(())
    }

    pub fn get(&self, index: DeviceIndex) -> Result<&RenderDevice> {
        self.devices.get(index).ok_or(StrataError::DeviceUnavailable(index))
    }

    #[must_use]
    pub fn contains(&self, index: DeviceIndex) -> bool {
        self.devices.contains(index)
    }

    /// Devices that can currently load and render.
    pub fn active(&self) -> impl Iterator<Item = &RenderDevice> {
        self.devices.iter().map(|(_, device)| device).filter(|d| d.is_active())
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderDevice> {
        self.devices.iter().map(|(_, device)| device)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Takes all events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<DeviceEvent> {
        std::mem::take(&mut self.events)
    }
}

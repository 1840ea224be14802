//! Foundation types shared by every other module.
//!
//! - `slots`: sparse index-addressed collections (one slot per device / view)
//! - `device`: rendering devices and the device registry
//! - `math`: tolerance-based float comparison
//! - `bounds`: bounding boxes, rays and frusta
//! - `interner`: string interning for pass names
//! - `check`: debug-only precondition checks

pub mod bounds;
pub mod check;
pub mod device;
pub mod interner;
pub mod math;
pub mod slots;

pub use bounds::{BoundingBox, Frustum, Plane, Ray};
pub use device::{DeviceEvent, DeviceIndex, DeviceRegistry, DeviceSlots, DeviceState, RenderDevice};
pub use math::{Color, EQUALITY_TOLERANCE};
pub use slots::{IndexedSlots, SlotIndex};

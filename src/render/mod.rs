//! Rendering-side bookkeeping
//!
//! - `pass`: pass identifiers and the engine-wide pass order
//! - `subset`: per-(view, layer) pass subscriptions
//! - `context`: draw callbacks, draw items and recorded frames
//! - `picking`: pick query options and results
//! - `capture`: screenshot surfaces
//! - `request`: asynchronous pick/screenshot requests

pub mod capture;
pub mod context;
pub mod pass;
pub mod picking;
pub mod request;
pub mod subset;

pub use capture::{CaptureSurface, Screenshot};
pub use context::{DrawCallback, DrawCommand, DrawItem, FrameRecord, RenderContext};
pub use pass::{PassId, PassOrder};
pub use picking::{PickHit, PickOptions};
pub use request::{PendingRequest, Requester};
pub use subset::{PassSubscriptionSink, RenderPassSubset};

//! The abstract unit of device-scoped GPU state.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::core::device::RenderDevice;

/// Namespace for name-derived resource keys.
const RESOURCE_NAMESPACE: Uuid = Uuid::from_u128(0x5d1a_6c3e_8f2b_4a71_9e0d_3b7c_41f6_a28e);

/// Logical identity of a resource, shared by every device's instance.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey(Uuid);

impl ResourceKey {
    /// A fresh key nobody else can collide with.
    #[must_use]
    pub fn new_unique() -> Self {
        Self(Uuid::new_v4())
    }

    /// A deterministic key derived from a name. Equal names give equal keys,
    /// which is how several nodes end up sharing one resource.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(Uuid::new_v5(&RESOURCE_NAMESPACE, name.as_bytes()))
    }

    #[inline]
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Debug for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResourceKey({})", self.0.simple())
    }
}

/// Error returned by a concrete resource that failed to create its device objects.
pub type LoadError = Box<dyn std::error::Error + Send + Sync>;

/// A lazily created piece of device-scoped GPU state.
///
/// Implementors create their device objects in [`load`](Self::load) and
/// destroy them in [`unload`](Self::unload). The core never inspects the
/// handles; it only drives this contract through the
/// [`ResourceDictionary`](super::ResourceDictionary).
pub trait Resource: Send + Sync + 'static {
    fn load(&mut self, device: &RenderDevice) -> Result<(), LoadError>;

    fn unload(&mut self);

    fn is_loaded(&self) -> bool;
}

impl Resource for Box<dyn Resource> {
    fn load(&mut self, device: &RenderDevice) -> Result<(), LoadError> {
        (**self).load(device)
    }

    fn unload(&mut self) {
        (**self).unload();
    }

    fn is_loaded(&self) -> bool {
        (**self).is_loaded()
    }
}

/// A loaded resource as handed out by the dictionary.
///
/// The update thread takes the write lock (load/unload); render threads only
/// take read locks on instances of their own device.
pub type SharedResource<R> = Arc<RwLock<R>>;

/// Type-erased view of a stored resource.
pub(crate) trait ResourceCell: Send + Sync {
    fn reload(&self, device: &RenderDevice) -> Result<(), LoadError>;

    fn unload(&self);

    fn is_loaded(&self) -> bool;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<R: Resource> ResourceCell for RwLock<R> {
    fn reload(&self, device: &RenderDevice) -> Result<(), LoadError> {
        self.write().load(device)
    }

    fn unload(&self) {
        let mut resource = self.write();
        if resource.is_loaded() {
            resource.unload();
        }
    }

    fn is_loaded(&self) -> bool {
        self.read().is_loaded()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

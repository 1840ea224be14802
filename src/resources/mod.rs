//! Device-scoped resources and the per-device resource cache.

pub mod dictionary;
pub mod resource;

pub use dictionary::ResourceDictionary;
pub use resource::{LoadError, Resource, ResourceKey, SharedResource};

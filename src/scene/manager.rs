use std::collections::BTreeMap;

use crate::errors::{Result, StrataError};
use crate::scene::{Scene, SceneId};
use crate::settings::EngineSettings;

/// Owns every scene of an engine, iterated in creation order.
#[derive(Debug, Default)]
pub struct SceneManager {
    scenes: BTreeMap<SceneId, Scene>,
}

impl SceneManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_scene(&mut self, settings: &EngineSettings) -> SceneId {
        let scene = Scene::with_settings(settings);
        let id = scene.id();
        self.scenes.insert(id, scene);
        log::info!("Created scene {id:?}");
        id
    }

    /// Removes the scene; its nodes release their resources when it drops.
    pub fn remove_scene(&mut self, id: SceneId) -> Result<Scene> {
        let scene = self.scenes.remove(&id).ok_or(StrataError::SceneNotFound(id))?;
        log::info!("Removed scene {id:?} ({} nodes)", scene.node_count());
        Ok(scene)
    }

    pub fn get(&self, id: SceneId) -> Result<&Scene> {
        self.scenes.get(&id).ok_or(StrataError::SceneNotFound(id))
    }

    pub fn get_mut(&mut self, id: SceneId) -> Result<&mut Scene> {
        self.scenes.get_mut(&id).ok_or(StrataError::SceneNotFound(id))
    }

    #[must_use]
    pub fn contains(&self, id: SceneId) -> bool {
        self.scenes.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scene> {
        self.scenes.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Scene> {
        self.scenes.values_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }
}

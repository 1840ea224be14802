//! Engine Core Module
//!
//! [`Engine`] ties the subsystems together and drives the frame:
//!
//! - **`DeviceRegistry`**: attached rendering devices and their events
//! - **`SceneManager`**: every scene and its lifecycle
//! - **Views**: one [`ViewInformation`] per camera, bound to a scene and a
//!   device, with an optional capture surface
//! - **Requests**: the pick/screenshot queue served at frame boundaries
//!
//! # Frame
//!
//! [`Engine::frame`] runs the phases in their fixed order:
//!
//! 1. device events (unload removed/reset devices)
//! 2. update of every scene
//! 3. visibility pass of every view
//! 4. rendering of every view, concurrently if enabled
//! 5. queued requests
//!
//! # Example
//!
//! ```rust,ignore
//! use strata::{Engine, EngineSettings, Node};
//!
//! let mut engine = Engine::new(EngineSettings::default())?;
//! let device = engine.attach_device("primary")?;
//! let scene = engine.create_scene();
//! let view = engine.add_view(scene, device)?;
//!
//! engine.scene_mut(scene)?.add_node(Node::new_spatial());
//! let frames = engine.frame(1.0 / 60.0)?;
//! ```

use glam::Vec2;

use crate::core::device::{DeviceEvent, DeviceIndex, DeviceRegistry};
use crate::core::slots::IndexedSlots;
use crate::errors::{Result, StrataError};
use crate::render::capture::{CaptureSurface, Screenshot};
use crate::render::context::FrameRecord;
use crate::render::pass::PassOrder;
use crate::render::picking::{PickHit, PickOptions};
use crate::render::request::{FrameRequest, PendingRequest, Requester};
use crate::scene::manager::SceneManager;
use crate::scene::state::UpdateTime;
use crate::scene::view::{ViewId, ViewInformation};
use crate::scene::{Scene, SceneId};
use crate::settings::EngineSettings;

struct ViewEntry {
    info: ViewInformation,
    capture: Option<Box<dyn CaptureSurface>>,
    last_frame: Option<FrameRecord>,
}

/// The central coordinator of the core.
pub struct Engine {
    settings: EngineSettings,
    pass_order: PassOrder,
    devices: DeviceRegistry,
    scenes: SceneManager,
    views: IndexedSlots<ViewId, ViewEntry>,

    time: UpdateTime,

    requests_tx: flume::Sender<FrameRequest>,
    requests_rx: flume::Receiver<FrameRequest>,
}

impl Engine {
    /// Creates an engine without devices or scenes.
    pub fn new(settings: EngineSettings) -> Result<Self> {
        settings.validate()?;
        let (requests_tx, requests_rx) = flume::unbounded();
        log::info!(
            "Engine created (max {} devices, passes: {})",
            settings.max_devices,
            settings.pass_order.join(" → ")
        );
        Ok(Self {
            pass_order: settings.pass_order(),
            devices: DeviceRegistry::new(settings.max_devices),
            scenes: SceneManager::new(),
            views: IndexedSlots::new(),
            time: UpdateTime::default(),
            requests_tx,
            requests_rx,
            settings,
        })
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn pass_order(&self) -> &PassOrder {
        &self.pass_order
    }

    /// Time of the last update.
    #[inline]
    #[must_use]
    pub fn time(&self) -> UpdateTime {
        self.time
    }

    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.time.frame
    }

    // ========================================================================
    // Devices
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    pub fn attach_device(&mut self, label: impl Into<String>) -> Result<DeviceIndex> {
        let index = self.devices.attach(label)?;
        self.process_device_events();
        Ok(index)
    }

    /// Removes a device. Every resource held for it is unloaded and views
    /// rendering with it are dropped.
    pub fn remove_device(&mut self, index: DeviceIndex) -> Result<()> {
        self.devices.remove(index)?;
        self.process_device_events();
        Ok(())
    }

    /// Resets a (possibly lost) device. Its resources are unloaded now and
    /// reloaded by the next update.
    pub fn reset_device(&mut self, index: DeviceIndex) -> Result<()> {
        self.devices.reset(index)?;
        self.process_device_events();
        Ok(())
    }

    /// Marks a device lost. Its resources are unloaded now and nothing loads
    /// or renders on it until it is reset.
    pub fn mark_device_lost(&mut self, index: DeviceIndex) -> Result<()> {
        self.devices.mark_lost(index)?;
        self.process_device_events();
        Ok(())
    }

    fn process_device_events(&mut self) {
        for event in self.devices.drain_events() {
            match event {
                DeviceEvent::Attached(index) => log::debug!("Device {index:?} ready"),
                DeviceEvent::Lost(index) | DeviceEvent::Reset(index) => {
                    for scene in self.scenes.iter_mut() {
                        scene.unload_device(index);
                    }
                }
                DeviceEvent::Removed(index) => {
                    for scene in self.scenes.iter_mut() {
                        scene.unload_device(index);
                    }
                    let orphaned: Vec<ViewId> = self
                        .views
                        .iter()
                        .filter(|(_, entry)| entry.info.device() == index)
                        .map(|(id, _)| id)
                        .collect();
                    for view in orphaned {
                        log::warn!("Dropping {view:?}: its device {index:?} was removed");
                        self.drop_view(view);
                    }
                }
            }
        }
    }

    // ========================================================================
    // Scenes
    // ========================================================================

    pub fn create_scene(&mut self) -> SceneId {
        self.scenes.create_scene(&self.settings)
    }

    pub fn scene(&self, id: SceneId) -> Result<&Scene> {
        self.scenes.get(id)
    }

    pub fn scene_mut(&mut self, id: SceneId) -> Result<&mut Scene> {
        self.scenes.get_mut(id)
    }

    #[inline]
    #[must_use]
    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    /// Removes a scene together with every view bound to it.
    pub fn remove_scene(&mut self, id: SceneId) -> Result<Scene> {
        let bound: Vec<ViewId> = self
            .views
            .iter()
            .filter(|(_, entry)| entry.info.scene() == id)
            .map(|(view, _)| view)
            .collect();
        for view in bound {
            self.drop_view(view);
        }
        self.scenes.remove_scene(id)
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Creates a view of `scene` rendering with `device` and registers it
    /// with the scene. View ids are reused lowest-first.
    pub fn add_view(&mut self, scene: SceneId, device: DeviceIndex) -> Result<ViewId> {
        self.devices.get(device)?;
        let id = (0u32..)
            .map(ViewId::new)
            .find(|id| !self.views.contains(*id))
            .ok_or(StrataError::InvalidSettings("view ids exhausted".into()))?;

        let info = ViewInformation::new(id, scene, device);
        self.scenes.get_mut(scene)?.register_view(&info)?;
        self.views.insert(
            id,
            ViewEntry {
                info,
                capture: None,
                last_frame: None,
            },
        );
        log::info!("Added {id:?} for scene {scene:?} on {device:?}");
        Ok(id)
    }

    pub fn view(&self, id: ViewId) -> Result<&ViewInformation> {
        self.views
            .get(id)
            .map(|entry| &entry.info)
            .ok_or(StrataError::ViewNotRegistered(id))
    }

    /// Camera, viewport, detail level and filters may change freely; scene
    /// and device are fixed.
    pub fn view_mut(&mut self, id: ViewId) -> Result<&mut ViewInformation> {
        self.views
            .get_mut(id)
            .map(|entry| &mut entry.info)
            .ok_or(StrataError::ViewNotRegistered(id))
    }

    pub fn view_ids(&self) -> impl Iterator<Item = ViewId> + '_ {
        self.views.indices()
    }

    pub fn remove_view(&mut self, id: ViewId) -> Result<()> {
        let entry = self.views.get(id).ok_or(StrataError::ViewNotRegistered(id))?;
        if let Ok(scene) = self.scenes.get_mut(entry.info.scene()) {
            scene.unregister_view(&entry.info)?;
        }
        self.views.remove(id);
        Ok(())
    }

    fn drop_view(&mut self, id: ViewId) {
        if let Some(entry) = self.views.remove(id)
            && let Ok(scene) = self.scenes.get_mut(entry.info.scene())
        {
            scene.forget_view(id);
        }
    }

    pub fn set_capture_surface(&mut self, view: ViewId, surface: impl CaptureSurface + 'static) -> Result<()> {
        let entry = self.views.get_mut(view).ok_or(StrataError::ViewNotRegistered(view))?;
        entry.capture = Some(Box::new(surface));
        Ok(())
    }

    /// The record of the view's most recent render.
    #[must_use]
    pub fn last_frame(&self, view: ViewId) -> Option<&FrameRecord> {
        self.views.get(view)?.last_frame.as_ref()
    }

    // ========================================================================
    // Frame
    // ========================================================================

    /// Update phase: every scene, then the visibility pass of every view.
    pub fn update(&mut self, dt: f32) -> Result<()> {
        self.process_device_events();
        self.time = self.time.advance(dt);

        for scene in self.scenes.iter_mut() {
            scene.update_frame(&self.devices, self.time)?;
        }
        for (_, entry) in self.views.iter() {
            self.scenes.get_mut(entry.info.scene())?.update_for_view(&entry.info)?;
        }
        Ok(())
    }

    /// Renders one view without storing its record.
    pub fn render_view(&self, id: ViewId) -> Result<FrameRecord> {
        let entry = self.views.get(id).ok_or(StrataError::ViewNotRegistered(id))?;
        let scene = self.scenes.get(entry.info.scene())?;
        let device = self.devices.get(entry.info.device())?;

        let mut record = FrameRecord::new(id, device.index(), self.time.frame);
        scene.render(&entry.info, device, &self.pass_order, &mut record)?;
        Ok(record)
    }

    /// Render phase: every view on an active device, on scoped threads when
    /// `parallel_view_rendering` is set.
    pub fn render_all(&mut self) -> Result<Vec<FrameRecord>> {
        let ids: Vec<ViewId> = self
            .views
            .iter()
            .filter(|(_, entry)| {
                self.devices
                    .get(entry.info.device())
                    .is_ok_and(|device| device.is_active())
            })
            .map(|(id, _)| id)
            .collect();

        let records = if self.settings.parallel_view_rendering && ids.len() > 1 {
            let engine = &*self;
            std::thread::scope(|scope| {
                let handles: Vec<_> = ids
                    .iter()
                    .map(|id| scope.spawn(move || engine.render_view(*id)))
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                    .collect::<Result<Vec<_>>>()
            })?
        } else {
            ids.iter()
                .map(|id| self.render_view(*id))
                .collect::<Result<Vec<_>>>()?
        };

        for record in &records {
            if let Some(entry) = self.views.get_mut(record.view) {
                entry.last_frame = Some(record.clone());
            }
        }
        Ok(records)
    }

    /// One full frame: update, render, then serve queued requests.
    pub fn frame(&mut self, dt: f32) -> Result<Vec<FrameRecord>> {
        self.update(dt)?;
        let records = self.render_all()?;
        self.process_requests();
        Ok(records)
    }

    // ========================================================================
    // Requests
    // ========================================================================

    /// Handle for queueing requests from other threads.
    #[must_use]
    pub fn requester(&self) -> Requester {
        Requester::new(self.requests_tx.clone())
    }

    /// Queues a pick at a normalized screen point; answered at the end of
    /// the next [`frame`](Self::frame).
    pub fn request_pick(&self, view: ViewId, point: Vec2, options: PickOptions) -> PendingRequest<Option<PickHit>> {
        self.requester().pick(view, point, options)
    }

    /// Queues a screenshot; answered at the end of the next [`frame`](Self::frame).
    pub fn request_screenshot(&self, view: ViewId) -> PendingRequest<Screenshot> {
        self.requester().screenshot(view)
    }

    /// Serves every queued request. Returns how many were served.
    pub fn process_requests(&mut self) -> usize {
        let mut served = 0;
        while let Ok(request) = self.requests_rx.try_recv() {
            served += 1;
            match request {
                FrameRequest::Pick {
                    view,
                    point,
                    options,
                    reply,
                } => {
                    let answer = self.pick(view, point, &options);
                    // The requester may have dropped its handle.
                    let _ = reply.send(answer);
                }
                FrameRequest::Screenshot { view, reply } => {
                    let _ = reply.send(self.capture(view));
                }
            }
        }
        if served > 0 {
            log::debug!("Served {served} frame requests");
        }
        served
    }

    /// Synchronous pick against the state of the last update.
    pub fn pick(&self, view: ViewId, point: Vec2, options: &PickOptions) -> Result<Option<PickHit>> {
        let entry = self.views.get(view).ok_or(StrataError::ViewNotRegistered(view))?;
        self.scenes.get(entry.info.scene())?.pick(&entry.info, point, options)
    }

    fn capture(&self, view: ViewId) -> Result<Screenshot> {
        let entry = self.views.get(view).ok_or(StrataError::ViewNotRegistered(view))?;
        let surface = entry.capture.as_ref().ok_or(StrataError::CaptureUnavailable(view))?;
        surface.capture(&entry.info, entry.last_frame.as_ref())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("devices", &self.devices.len())
            .field("scenes", &self.scenes.len())
            .field("views", &self.views.len())
            .field("frame", &self.time.frame)
            .finish_non_exhaustive()
    }
}

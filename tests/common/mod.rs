//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;
use parking_lot::Mutex;

use strata::core::device::RenderDevice;
use strata::render::capture::{CaptureSurface, Screenshot};
use strata::render::context::FrameRecord;
use strata::resources::{LoadError, Resource, ResourceKey};
use strata::scene::{MeshObject, ResourceBinding, TransformSource, ViewInformation};
use strata::{BoundingBox, DeviceIndex, Engine, EngineSettings, SceneId, ViewId};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Resources
// ============================================================================

/// Load/unload/creation counters shared by every instance of a test resource.
#[derive(Debug, Default)]
pub struct Counters {
    pub created: AtomicUsize,
    pub loads: AtomicUsize,
    pub unloads: AtomicUsize,
}

impl Counters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn unloads(&self) -> usize {
        self.unloads.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct CountingResource {
    counters: Arc<Counters>,
    loaded_on: Option<DeviceIndex>,
    fail: bool,
}

impl CountingResource {
    pub fn new(counters: &Arc<Counters>) -> Self {
        counters.created.fetch_add(1, Ordering::SeqCst);
        Self {
            counters: Arc::clone(counters),
            loaded_on: None,
            fail: false,
        }
    }

    pub fn failing(counters: &Arc<Counters>) -> Self {
        Self {
            fail: true,
            ..Self::new(counters)
        }
    }

    pub fn device(&self) -> Option<DeviceIndex> {
        self.loaded_on
    }
}

impl Resource for CountingResource {
    fn load(&mut self, device: &RenderDevice) -> Result<(), LoadError> {
        if self.fail {
            return Err("out of device memory".into());
        }
        self.counters.loads.fetch_add(1, Ordering::SeqCst);
        self.loaded_on = Some(device.index());
        Ok(())
    }

    fn unload(&mut self) {
        if self.loaded_on.take().is_some() {
            self.counters.unloads.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_loaded(&self) -> bool {
        self.loaded_on.is_some()
    }
}

pub fn binding(name: &str, counters: &Arc<Counters>) -> ResourceBinding {
    let counters = Arc::clone(counters);
    ResourceBinding::new(ResourceKey::from_name(name), move || CountingResource::new(&counters))
}

/// A unit cube mesh whose geometry and material count their loads.
pub fn cube(geometry: &str, material: &str, counters: &Arc<Counters>) -> MeshObject {
    MeshObject::new(binding(geometry, counters), binding(material, counters))
        .with_bounds(BoundingBox::new(Vec3::splat(-0.5), Vec3::splat(0.5)))
}

// ============================================================================
// Hosted objects
// ============================================================================

/// A transform source whose values can be changed between frames.
#[derive(Debug)]
pub struct MovableSource {
    pub position: Mutex<Vec3>,
    pub rotation: Mutex<Vec3>,
    pub scaling: Mutex<Vec3>,
    pub opacity: Mutex<f32>,
}

impl MovableSource {
    pub fn new(position: Vec3, rotation: Vec3, scaling: Vec3) -> Arc<Self> {
        Arc::new(Self {
            position: Mutex::new(position),
            rotation: Mutex::new(rotation),
            scaling: Mutex::new(scaling),
            opacity: Mutex::new(1.0),
        })
    }
}

impl TransformSource for MovableSource {
    fn position(&self) -> Vec3 {
        *self.position.lock()
    }

    fn rotation(&self) -> Vec3 {
        *self.rotation.lock()
    }

    fn scaling(&self) -> Vec3 {
        *self.scaling.lock()
    }

    fn opacity(&self) -> f32 {
        *self.opacity.lock()
    }
}

// ============================================================================
// Capture
// ============================================================================

/// Captures a uniformly colored frame sized after the viewport.
pub struct SolidCapture(pub [u8; 4]);

impl CaptureSurface for SolidCapture {
    fn capture(&self, view: &ViewInformation, _last_frame: Option<&FrameRecord>) -> strata::Result<Screenshot> {
        Ok(Screenshot::filled(view.viewport.width, view.viewport.height, self.0))
    }
}

// ============================================================================
// Engine setup
// ============================================================================

pub struct Fixture {
    pub engine: Engine,
    pub device: DeviceIndex,
    pub scene: SceneId,
    pub view: ViewId,
}

/// One device, one scene, one view with a camera at +Z looking at the origin.
pub fn fixture(settings: EngineSettings) -> anyhow::Result<Fixture> {
    init_logging();
    let mut engine = Engine::new(settings)?;
    let device = engine.attach_device("test-device")?;
    let scene = engine.create_scene();
    let view = engine.add_view(scene, device)?;
    engine.view_mut(view)?.camera = strata::Camera::default().looking_at(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, Vec3::Y);
    Ok(Fixture {
        engine,
        device,
        scene,
        view,
    })
}

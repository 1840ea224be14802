//! Visibility & Render Pass Tests
//!
//! Tests for:
//! - Per-view visibility defaults, forced initial visibility, view binding checks
//! - Pass subscriptions: rebuilt only on pass-state changes, opacity-driven switch
//! - Detail levels and visibility filters
//! - Render order: layers by order, passes by the configured pass order
//! - Lazy shader parameter uploads during rendering

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use glam::Vec3;

use common::{Counters, cube};
use strata::core::device::DeviceIndex;
use strata::render::{DrawCommand, DrawItem, PassSubscriptionSink, RenderContext};
use strata::resources::ResourceDictionary;
use strata::scene::{
    DetailLevel, DistanceFilter, Drawable, FrustumFilter, LoadContext, Loadable, PassSubscriber, UpdateTime,
    ViewId,
};
use strata::{
    DeviceRegistry, DrawCallback, EngineSettings, FrameRecord, Node, PassId, PassOrder, Scene, StrataError,
    ViewInformation,
};

/// Content that counts how often it was asked for its passes.
struct Probe {
    subscriptions: Arc<AtomicUsize>,
    pass: &'static str,
}

impl Probe {
    fn new(pass: &'static str) -> (Self, Arc<AtomicUsize>) {
        let subscriptions = Arc::new(AtomicUsize::new(0));
        (
            Self {
                subscriptions: Arc::clone(&subscriptions),
                pass,
            },
            subscriptions,
        )
    }
}

impl Loadable for Probe {
    fn load_resources(&mut self, _ctx: &mut LoadContext<'_>) -> strata::Result<()> {
        Ok(())
    }

    fn unload_resources(&mut self, _device: DeviceIndex, _resources: &mut ResourceDictionary) {}

    fn unload_all_resources(&mut self, _resources: &mut ResourceDictionary) {}

    fn is_loaded(&self, _device: DeviceIndex) -> bool {
        true
    }
}

impl PassSubscriber for Probe {
    fn subscribe_passes(&self, _node: &Node, sink: &mut PassSubscriptionSink<'_>) {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        sink.subscribe(PassId::new(self.pass), DrawCallback::content());
    }
}

impl Drawable for Probe {
    fn render(&self, item: &DrawItem<'_>, ctx: &mut RenderContext<'_>) -> strata::Result<()> {
        ctx.submit(DrawCommand::for_item(item));
        Ok(())
    }
}

struct Setup {
    devices: DeviceRegistry,
    device: DeviceIndex,
    scene: Scene,
    view: ViewInformation,
}

fn setup() -> Setup {
    common::init_logging();
    let mut devices = DeviceRegistry::new(4);
    let device = devices.attach("test-device").unwrap();
    let mut scene = Scene::new();
    let view = ViewInformation::new(ViewId::new(0), scene.id(), device);
    scene.register_view(&view).unwrap();
    Setup {
        devices,
        device,
        scene,
        view,
    }
}

impl Setup {
    fn frame(&mut self) {
        self.scene.update_frame(&self.devices, UpdateTime::default()).unwrap();
        self.scene.update_for_view(&self.view).unwrap();
    }

    fn render(&self) -> FrameRecord {
        let mut record = FrameRecord::new(self.view.id(), self.device, 0);
        let device = self.devices.get(self.device).unwrap();
        self.scene
            .render(&self.view, device, &PassOrder::default(), &mut record)
            .unwrap();
        record
    }

    fn count_in(&self, pass: PassId) -> usize {
        self.scene
            .subset(self.view.id(), self.scene.default_layer())
            .unwrap()
            .count_pass(pass)
    }
}

// ============================================================================
// Visibility
// ============================================================================

#[test]
fn nodes_are_invisible_until_evaluated() {
    let mut s = setup();
    let node = s.scene.add_node(Node::new_spatial());
    assert!(!s.scene.is_visible(node, &s.view).unwrap());

    s.frame();
    assert!(s.scene.is_visible(node, &s.view).unwrap());
}

#[test]
fn initial_visibility_can_be_forced_once() {
    let mut s = setup();
    let node = s
        .scene
        .add_node(Node::new_spatial().with_detail_level(DetailLevel::LOW));

    assert!(s.scene.try_set_initial_visibility(node, &s.view).unwrap());
    assert!(s.scene.is_visible(node, &s.view).unwrap());

    // The view only shows high detail: the pass overrides the forced flag.
    s.frame();
    assert!(!s.scene.is_visible(node, &s.view).unwrap());
    assert!(!s.scene.try_set_initial_visibility(node, &s.view).unwrap());
}

#[test]
fn initial_visibility_setting_marks_new_nodes_visible() {
    common::init_logging();
    let settings = EngineSettings {
        initial_visibility: true,
        ..EngineSettings::default()
    };
    let mut devices = DeviceRegistry::new(1);
    let device = devices.attach("test-device").unwrap();
    let mut scene = Scene::with_settings(&settings);
    let view = ViewInformation::new(ViewId::new(3), scene.id(), device);
    scene.register_view(&view).unwrap();

    let node = scene.add_node(Node::new());
    assert!(scene.is_visible(node, &view).unwrap());
}

#[test]
fn foreign_and_unregistered_views_are_rejected() {
    let s = setup();
    let other = Scene::new();
    let foreign = ViewInformation::new(ViewId::new(1), other.id(), s.device);
    let unregistered = ViewInformation::new(ViewId::new(2), s.scene.id(), s.device);
    let mut scene = s.scene;
    let node = scene.add_node(Node::new());

    assert!(matches!(
        scene.is_visible(node, &foreign),
        Err(StrataError::ViewNotBound { view_scene, .. }) if view_scene == other.id()
    ));
    assert!(matches!(scene.update_for_view(&foreign), Err(StrataError::ViewNotBound { .. })));
    assert!(matches!(scene.register_view(&foreign), Err(StrataError::ViewNotBound { .. })));
    assert!(matches!(
        scene.is_visible(node, &unregistered),
        Err(StrataError::ViewNotRegistered(id)) if id == ViewId::new(2)
    ));
}

#[test]
fn unregistering_drops_subsets_and_records() {
    let mut s = setup();
    let (probe, _) = Probe::new("opaque");
    let node = s.scene.add_node(Node::new().with_content(probe));
    s.frame();

    s.scene.unregister_view(&s.view).unwrap();

    assert!(!s.scene.is_view_registered(s.view.id()));
    assert!(s.scene.subset(s.view.id(), s.scene.default_layer()).is_err());
    assert!(!s.scene.node(node).unwrap().is_visible_in(s.view.id()));
}

// ============================================================================
// Subscriptions
// ============================================================================

#[test]
fn subscriptions_are_rebuilt_only_on_change() {
    let mut s = setup();
    let (probe, calls) = Probe::new("opaque");
    let node = s.scene.add_node(Node::new().with_content(probe));

    s.frame();
    s.frame();
    s.frame();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(s.count_in(PassId::opaque()), 1);

    s.scene.node_mut(node).unwrap().mark_pass_state_changed();
    s.frame();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(s.count_in(PassId::opaque()), 1, "old subscriptions are replaced");
}

#[test]
fn opacity_moves_node_between_passes() {
    let mut s = setup();
    let counters = Counters::new();
    let node = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("cube", "glass", &counters)));
    s.frame();
    assert_eq!(s.count_in(PassId::opaque()), 1);
    assert_eq!(s.count_in(PassId::transparent()), 0);

    s.scene.spatial_mut(node).unwrap().set_opacity(0.4);
    s.frame();
    assert_eq!(s.count_in(PassId::opaque()), 0);
    assert_eq!(s.count_in(PassId::transparent()), 1);

    s.scene.spatial_mut(node).unwrap().set_opacity(1.0);
    s.frame();
    assert_eq!(s.count_in(PassId::opaque()), 1);
    assert_eq!(s.count_in(PassId::transparent()), 0);
}

#[test]
fn line_overlay_adds_a_line_subscription() {
    let mut s = setup();
    let counters = Counters::new();
    let node = s.scene.add_node(
        Node::new_spatial().with_content(cube("cube", "wire", &counters).with_line_overlay(true)),
    );
    s.frame();

    let subset = s.scene.subset(s.view.id(), s.scene.default_layer()).unwrap();
    assert_eq!(subset.count_subscriptions(node), 2);
    assert_eq!(subset.count_pass(PassId::line()), 1);
    assert_eq!(subset.total(), 2);
}

#[test]
fn removed_nodes_leave_no_subscriptions() {
    let mut s = setup();
    let (probe, _) = Probe::new("opaque");
    let node = s.scene.add_node(Node::new().with_content(probe));
    s.frame();
    assert_eq!(s.count_in(PassId::opaque()), 1);

    s.scene.remove_node(node).unwrap();
    assert!(
        s.scene
            .subset(s.view.id(), s.scene.default_layer())
            .unwrap()
            .is_empty()
    );
}

#[test]
fn layers_added_later_get_subsets() {
    let mut s = setup();
    let ui = s.scene.add_layer("Ui", 5).unwrap();
    let (probe, _) = Probe::new("post_process");
    s.scene.add_node_to_layer(Node::new().with_content(probe), ui).unwrap();
    s.frame();

    let subset = s.scene.subset(s.view.id(), ui).unwrap();
    assert_eq!(subset.count_pass(PassId::post_process()), 1);
    assert_eq!(subset.layer(), ui);
}

// ============================================================================
// Detail Levels & Filters
// ============================================================================

#[test]
fn detail_level_must_intersect_the_view() {
    let mut s = setup();
    let low = s
        .scene
        .add_node(Node::new_spatial().with_detail_level(DetailLevel::LOW));
    let any = s.scene.add_node(Node::new_spatial());
    s.frame();
    assert!(!s.scene.is_visible(low, &s.view).unwrap());
    assert!(s.scene.is_visible(any, &s.view).unwrap());

    s.view.detail_level = DetailLevel::LOW | DetailLevel::HIGH;
    s.frame();
    assert!(s.scene.is_visible(low, &s.view).unwrap());
}

#[test]
fn distance_filter_hides_and_unsubscribes() {
    let mut s = setup();
    s.view.add_filter(Arc::new(DistanceFilter::new(10.0)));
    let counters = Counters::new();
    let node = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("cube", "stone", &counters)));
    s.scene.spatial_mut(node).unwrap().set_position(Vec3::new(0.0, 0.0, -5.0));
    s.frame();
    assert!(s.scene.is_visible(node, &s.view).unwrap());
    assert_eq!(s.count_in(PassId::opaque()), 1);

    s.scene.spatial_mut(node).unwrap().set_position(Vec3::new(0.0, 0.0, -50.0));
    s.frame();
    assert!(!s.scene.is_visible(node, &s.view).unwrap());
    assert_eq!(s.count_in(PassId::opaque()), 0);

    s.scene.spatial_mut(node).unwrap().set_position(Vec3::new(0.0, 0.0, -2.0));
    s.frame();
    assert_eq!(s.count_in(PassId::opaque()), 1);
}

#[test]
fn frustum_filter_culls_content_behind_the_camera() {
    let mut s = setup();
    s.view.add_filter(Arc::new(FrustumFilter));
    let counters = Counters::new();
    let front = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("cube", "a", &counters)));
    let behind = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("cube", "a", &counters)));
    let bare = s.scene.add_node(Node::new_spatial());
    s.scene.spatial_mut(front).unwrap().set_position(Vec3::new(0.0, 0.0, -10.0));
    s.scene.spatial_mut(behind).unwrap().set_position(Vec3::new(0.0, 0.0, 10.0));
    s.scene.spatial_mut(bare).unwrap().set_position(Vec3::new(0.0, 0.0, 10.0));
    s.frame();

    assert!(s.scene.is_visible(front, &s.view).unwrap());
    assert!(!s.scene.is_visible(behind, &s.view).unwrap());
    assert!(s.scene.is_visible(bare, &s.view).unwrap(), "nodes without bounds pass");
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn render_walks_layers_then_passes_in_order() -> anyhow::Result<()> {
    let mut fx = common::fixture(EngineSettings::default())?;
    let counters = Counters::new();
    let scene = fx.engine.scene_mut(fx.scene)?;
    let overlay = scene.add_layer("Overlay", 10)?;
    let background = scene.add_layer("Background", -10)?;

    let hud = scene.add_node_to_layer(Node::new_spatial().with_content(cube("q", "hud", &counters)), overlay)?;
    let glass = scene.add_node(Node::new_spatial().with_content(cube("q", "glass", &counters)));
    let wall = scene.add_node(Node::new_spatial().with_content(cube("q", "wall", &counters)));
    let sky = scene.add_node_to_layer(Node::new_spatial().with_content(cube("q", "sky", &counters)), background)?;
    scene.spatial_mut(glass)?.set_opacity(0.5);

    let records = fx.engine.frame(0.016)?;
    assert_eq!(records.len(), 1);
    let order: Vec<_> = records[0].commands.iter().map(|c| c.node).collect();
    assert_eq!(order, vec![sky, wall, glass, hud]);

    let transparent = records[0].nodes_in(PassId::transparent());
    assert_eq!(transparent, vec![glass]);
    assert_eq!(records[0].commands[2].opacity, 0.5);
    assert_eq!(records[0].draws(hud), 1);
    Ok(())
}

#[test]
fn configured_pass_order_is_respected() -> anyhow::Result<()> {
    let settings = EngineSettings {
        pass_order: ["transparent", "opaque", "line", "post_process"]
            .map(String::from)
            .to_vec(),
        ..EngineSettings::default()
    };
    let mut fx = common::fixture(settings)?;
    let counters = Counters::new();
    let scene = fx.engine.scene_mut(fx.scene)?;
    let wall = scene.add_node(Node::new_spatial().with_content(cube("q", "wall", &counters)));
    let glass = scene.add_node(Node::new_spatial().with_content(cube("q", "glass", &counters)));
    scene.spatial_mut(glass)?.set_opacity(0.25);

    let records = fx.engine.frame(0.016)?;
    let order: Vec<_> = records[0].commands.iter().map(|c| c.node).collect();
    assert_eq!(order, vec![glass, wall]);
    Ok(())
}

#[test]
fn draw_commands_carry_resource_keys() {
    let mut s = setup();
    let counters = Counters::new();
    let node = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("mesh/box", "mat/red", &counters)));
    s.frame();

    let record = s.render();
    let command = record.commands_in(PassId::opaque()).next().unwrap();
    assert_eq!(command.node, node);
    assert_eq!(
        command.resources.as_slice(),
        &[
            strata::ResourceKey::from_name("mesh/box"),
            strata::ResourceKey::from_name("mat/red")
        ]
    );
}

#[test]
fn shader_constants_upload_lazily_during_render() {
    let mut s = setup();
    let (probe, _) = Probe::new("opaque");
    let node = s.scene.add_node(Node::new_spatial().with_content(probe));
    s.frame();

    let first = s.render();
    assert_eq!(first.uploads.len(), 1);
    assert_eq!(first.uploads[0].0, node);

    s.frame();
    assert!(s.render().uploads.is_empty());

    s.scene.spatial_mut(node).unwrap().set_position(Vec3::X);
    s.frame();
    let third = s.render();
    assert_eq!(third.uploads.len(), 1);
    assert_eq!(third.uploads[0].1.world.w_axis.truncate(), Vec3::X);
    assert_eq!(s.scene.spatial(node).unwrap().upload_count(s.device), 2);
}

#[test]
fn rendering_unloaded_content_reports_not_ready() {
    let mut s = setup();
    let counters = Counters::new();
    let node = s
        .scene
        .add_node(Node::new_spatial().with_content(cube("cube", "late", &counters)));
    // Visibility without an update: content was never loaded.
    s.scene.update_for_view(&s.view).unwrap();
    assert!(s.scene.is_visible(node, &s.view).unwrap());

    let mut record = FrameRecord::new(s.view.id(), s.device, 0);
    let device = s.devices.get(s.device).unwrap();
    let err = s
        .scene
        .render(&s.view, device, &PassOrder::default(), &mut record)
        .unwrap_err();
    assert!(matches!(err, StrataError::ResourceNotReady { .. }));
}

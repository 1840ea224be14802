//! Hosted Object Tests
//!
//! Tests for:
//! - Transform delegation to an external source in every host mode
//! - Change detection on pulled values
//! - Hosted opacity driving pass selection
//! - Resetting a hosted object

mod common;

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Quat, Vec3};

use common::MovableSource;
use strata::core::math::{mat4_nearly_equal, vec3_nearly_equal};
use strata::scene::{UpdateTime, ViewId};
use strata::{DeviceIndex, DeviceRegistry, HostMode, Node, NodeHandle, PassId, Rotation, Scene, ViewInformation};

fn setup() -> (DeviceRegistry, DeviceIndex, Scene) {
    common::init_logging();
    let mut devices = DeviceRegistry::new(2);
    let device = devices.attach("test-device").unwrap();
    (devices, device, Scene::new())
}

fn step(scene: &mut Scene, devices: &DeviceRegistry) {
    scene.update_frame(devices, UpdateTime::default()).unwrap();
}

fn hosted_node(scene: &mut Scene, mode: HostMode) -> (NodeHandle, std::sync::Arc<MovableSource>) {
    let source = MovableSource::new(
        Vec3::new(1.0, 2.0, 3.0),
        Vec3::new(0.0, FRAC_PI_2, 0.0),
        Vec3::splat(2.0),
    );
    let node = scene.add_node(Node::new_spatial());
    scene
        .spatial_mut(node)
        .unwrap()
        .set_hosted_object(source.clone(), mode);
    (node, source)
}

// ============================================================================
// Host Modes
// ============================================================================

#[test]
fn full_mode_takes_every_component() {
    let (devices, _, mut scene) = setup();
    let (node, _) = hosted_node(&mut scene, HostMode::Full);
    step(&mut scene, &devices);

    let expected = Mat4::from_scale_rotation_translation(
        Vec3::splat(2.0),
        Quat::from_rotation_y(FRAC_PI_2),
        Vec3::new(1.0, 2.0, 3.0),
    );
    let spatial = scene.spatial(node).unwrap();
    assert!(mat4_nearly_equal(&spatial.world_matrix(), &expected));
    assert_eq!(spatial.host_mode(), Some(HostMode::Full));
}

#[test]
fn ignore_rotation_keeps_identity_orientation() {
    let (devices, _, mut scene) = setup();
    let (node, _) = hosted_node(&mut scene, HostMode::IgnoreRotation);
    step(&mut scene, &devices);

    let spatial = scene.spatial(node).unwrap();
    let expected = Mat4::from_scale_rotation_translation(Vec3::splat(2.0), Quat::IDENTITY, Vec3::new(1.0, 2.0, 3.0));
    assert!(mat4_nearly_equal(&spatial.world_matrix(), &expected));
    assert!(spatial.rotation().nearly_equals(&Rotation::default()));
    assert_eq!(spatial.scaling(), Vec3::splat(2.0));
}

#[test]
fn ignore_scaling_keeps_unit_scale() {
    let (devices, _, mut scene) = setup();
    let (node, _) = hosted_node(&mut scene, HostMode::IgnoreScaling);
    step(&mut scene, &devices);

    let expected = Mat4::from_rotation_translation(Quat::from_rotation_y(FRAC_PI_2), Vec3::new(1.0, 2.0, 3.0));
    assert!(mat4_nearly_equal(&scene.spatial(node).unwrap().world_matrix(), &expected));
}

#[test]
fn ignore_rotation_and_scaling_takes_position_only() {
    let (devices, _, mut scene) = setup();
    let (node, _) = hosted_node(&mut scene, HostMode::IgnoreRotationAndScaling);
    step(&mut scene, &devices);

    assert!(mat4_nearly_equal(
        &scene.spatial(node).unwrap().world_matrix(),
        &Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0))
    ));
}

#[test]
fn host_mode_component_flags() {
    assert!(HostMode::Full.takes_rotation() && HostMode::Full.takes_scaling());
    assert!(!HostMode::IgnoreRotation.takes_rotation() && HostMode::IgnoreRotation.takes_scaling());
    assert!(HostMode::IgnoreScaling.takes_rotation() && !HostMode::IgnoreScaling.takes_scaling());
    assert!(!HostMode::IgnoreRotationAndScaling.takes_rotation());
    assert!(!HostMode::IgnoreRotationAndScaling.takes_scaling());
}

// ============================================================================
// Change Detection
// ============================================================================

#[test]
fn source_changes_propagate_to_children() {
    let (devices, device, mut scene) = setup();
    let (node, source) = hosted_node(&mut scene, HostMode::IgnoreRotationAndScaling);
    let child = scene.add_node_under(Node::new_spatial(), node).unwrap();
    scene.spatial_mut(child).unwrap().set_position(Vec3::Y);
    step(&mut scene, &devices);
    scene.spatial(child).unwrap().refresh_shader_params(device);

    // Unchanged source: nothing to upload.
    step(&mut scene, &devices);
    assert!(!scene.spatial(child).unwrap().needs_refresh(device));

    *source.position.lock() = Vec3::new(-4.0, 0.0, 0.0);
    step(&mut scene, &devices);
    assert!(scene.spatial(child).unwrap().needs_refresh(device));
    assert!(vec3_nearly_equal(
        scene.spatial(child).unwrap().world_position(),
        Vec3::new(-4.0, 1.0, 0.0)
    ));
}

#[test]
fn jitter_below_tolerance_is_ignored() {
    let (devices, device, mut scene) = setup();
    let (node, source) = hosted_node(&mut scene, HostMode::Full);
    step(&mut scene, &devices);
    scene.spatial(node).unwrap().refresh_shader_params(device);

    *source.position.lock() += Vec3::splat(1e-7);
    step(&mut scene, &devices);
    assert!(!scene.spatial(node).unwrap().needs_refresh(device));
}

#[test]
fn static_hosted_node_stops_pulling() {
    let (devices, _, mut scene) = setup();
    let (node, source) = hosted_node(&mut scene, HostMode::IgnoreRotationAndScaling);
    scene.node_mut(node).unwrap().set_static(true);
    step(&mut scene, &devices);

    *source.position.lock() = Vec3::ZERO;
    step(&mut scene, &devices);
    assert!(vec3_nearly_equal(
        scene.spatial(node).unwrap().world_position(),
        Vec3::new(1.0, 2.0, 3.0)
    ));
}

#[test]
fn hosted_opacity_switches_pass() {
    let (devices, device, mut scene) = setup();
    let view = ViewInformation::new(ViewId::new(0), scene.id(), device);
    scene.register_view(&view).unwrap();
    let counters = common::Counters::new();
    let source = MovableSource::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE);
    let hosted_mesh = scene.add_node(Node::new_spatial().with_content(common::cube("cube", "ghost", &counters)));
    scene
        .spatial_mut(hosted_mesh)
        .unwrap()
        .set_hosted_object(source.clone(), HostMode::Full);
    let content_node = scene
        .add_node_under(
            Node::new_spatial().with_content(common::cube("cube", "ghost", &counters)),
            hosted_mesh,
        )
        .unwrap();

    step(&mut scene, &devices);
    scene.update_for_view(&view).unwrap();
    let subset = scene.subset(view.id(), scene.default_layer()).unwrap();
    assert_eq!(subset.passes_of(hosted_mesh).collect::<Vec<_>>(), vec![PassId::opaque()]);
    assert_eq!(subset.passes_of(content_node).collect::<Vec<_>>(), vec![PassId::opaque()]);

    *source.opacity.lock() = 0.3;
    step(&mut scene, &devices);
    scene.update_for_view(&view).unwrap();
    let subset = scene.subset(view.id(), scene.default_layer()).unwrap();
    assert_eq!(subset.passes_of(hosted_mesh).collect::<Vec<_>>(), vec![PassId::transparent()]);
    // Opacity is not inherited.
    assert_eq!(subset.passes_of(content_node).collect::<Vec<_>>(), vec![PassId::opaque()]);
}

// ============================================================================
// Reset
// ============================================================================

#[test]
fn reset_restores_defaults() {
    let (devices, _, mut scene) = setup();
    let (node, source) = hosted_node(&mut scene, HostMode::Full);
    *source.opacity.lock() = 0.5;
    step(&mut scene, &devices);
    let version_before = scene.node(node).unwrap().pass_state_version();

    scene.spatial_mut(node).unwrap().reset_hosted_object();
    {
        let spatial = scene.spatial(node).unwrap();
        assert!(!spatial.has_hosted_object());
        assert_eq!(spatial.position(), Vec3::ZERO);
        assert_eq!(spatial.scaling(), Vec3::ONE);
        assert_eq!(spatial.opacity(), 1.0);
        assert!(spatial.is_transform_dirty());
    }
    assert_ne!(scene.node(node).unwrap().pass_state_version(), version_before);

    step(&mut scene, &devices);
    assert!(mat4_nearly_equal(&scene.spatial(node).unwrap().world_matrix(), &Mat4::IDENTITY));

    // The source no longer drives the node.
    *source.position.lock() = Vec3::splat(9.0);
    step(&mut scene, &devices);
    assert!(mat4_nearly_equal(&scene.spatial(node).unwrap().world_matrix(), &Mat4::IDENTITY));
}

#[test]
fn reset_without_host_is_a_no_op() {
    let (devices, _, mut scene) = setup();
    let node = scene.add_node(Node::new_spatial());
    scene.spatial_mut(node).unwrap().set_position(Vec3::X);
    step(&mut scene, &devices);

    scene.spatial_mut(node).unwrap().reset_hosted_object();
    assert_eq!(scene.spatial(node).unwrap().position(), Vec3::X);
    assert!(!scene.spatial(node).unwrap().is_transform_dirty());
}

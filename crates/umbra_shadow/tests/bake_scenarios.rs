//! Integration tests for the shadow map baker
//!
//! Drives full frames through the headless backend:
//! - Staleness detection across scene edits
//! - Cache discard on light count changes
//! - Render state and target restoration, including failed bakes
//! - Camera fitting as seen by the delegates

mod common;

use common::{init_logging, new_log, shadow_scene, RecordingDelegate};
use umbra_math::{Vec3, AABB};
use umbra_shadow::{
    BackendEvent, BakeOutcome, BakePhase, Capabilities, Capability, DrawBuffer, HeadlessBackend,
    Light, NoShadowReason, PolygonOffset, Projection, RenderState, ShadowBackend,
    ShadowBakeConfig, ShadowError, ShadowMapBaker, ShadingModel,
};

fn recording_baker(log: &common::PassLog) -> ShadowMapBaker<HeadlessBackend> {
    ShadowMapBaker::default().with_opaque_delegate(RecordingDelegate::new("opaque", log))
}

#[test]
fn test_first_frame_bakes_every_shadow_light() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    scene.lights.add(Light::headlight());
    scene
        .lights
        .add(Light::directional(Vec3::new(5.0, 0.0, 5.0), Vec3::ZERO));

    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);

    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::Baked { maps: 2, rendered_props: 2 }
    );
    assert!(baker.has_shadows());
    assert_eq!(baker.entries().len(), 2);
    assert_eq!(backend.live_textures(), 2);

    let passes = log.borrow();
    assert_eq!(passes.len(), 2);
    for (index, pass) in passes.iter().enumerate() {
        assert_eq!(pass.light_index, index);
        // only the visible occluder is submitted
        assert_eq!(pass.props, vec![ids.cube]);
        assert_eq!(pass.resolution, 256);
        let texture = baker.entries()[index].texture().unwrap();
        assert_eq!(pass.bound_texture, Some(texture.handle));
        assert_eq!(Some(&pass.camera), baker.entries()[index].camera());
    }
    assert!(passes[0].camera.is_perspective());
    assert!(!passes[1].camera.is_perspective());
    assert_eq!(baker.entries()[0].light_id(), ids.spot);

    drop(passes);
    baker.release_resources(&mut backend);
}

#[test]
fn test_delegate_sees_depth_only_state() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    backend.apply_render_state(&RenderState {
        scissor_test: true,
        ..Default::default()
    });
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    let state = log.borrow()[0].state;
    assert!(!state.color_writes);
    assert!(!state.lighting);
    assert!(state.depth_test);
    assert!(!state.scissor_test);
    assert_eq!(state.shading, ShadingModel::Flat);
    assert_eq!(
        state.polygon_offset,
        Some(PolygonOffset { factor: 1.1, units: 4.0 })
    );

    baker.release_resources(&mut backend);
}

#[test]
fn test_state_restored_after_bake() {
    init_logging();
    let (scene, _) = shadow_scene();
    let mut backend = HeadlessBackend::new();
    let original = RenderState {
        scissor_test: true,
        polygon_offset: Some(PolygonOffset { factor: 3.0, units: 3.0 }),
        ..Default::default()
    };
    backend.apply_render_state(&original);
    backend.set_draw_target(DrawBuffer::Front);

    let log = new_log();
    let mut baker = recording_baker(&log);
    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { .. }));

    assert_eq!(
        backend.render_state(),
        RenderState {
            polygon_offset: None,
            ..original
        }
    );
    assert_eq!(backend.draw_target(), DrawBuffer::Front);
    assert_eq!(backend.bound_texture(), None);

    baker.release_resources(&mut backend);
}

#[test]
fn test_unchanged_scene_is_not_rebaked() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);

    baker.render(&mut backend, &scene);
    backend.clear_events();
    for _ in 0..3 {
        assert_eq!(baker.render(&mut backend, &scene), BakeOutcome::UpToDate);
    }
    assert!(baker.has_shadows());
    assert_eq!(log.borrow().len(), 1);
    assert!(backend.events().is_empty());
    assert_eq!(baker.stats().frames, 4);
    assert_eq!(baker.stats().bakes, 1);

    baker.release_resources(&mut backend);
}

#[test]
fn test_prop_edit_rebakes_once() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    scene.props.get_mut(ids.cube).unwrap().translate(Vec3::new(0.5, 0.0, 0.0));
    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { .. }));
    assert_eq!(baker.render(&mut backend, &scene), BakeOutcome::UpToDate);
    assert_eq!(log.borrow().len(), 2);

    // textures are reused across bakes of the same light count
    assert_eq!(backend.textures_created(), 1);

    baker.release_resources(&mut backend);
}

#[test]
fn test_hidden_prop_edit_still_rebakes() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    scene.props.get_mut(ids.hidden).unwrap().translate(Vec3::Z);
    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { .. }));

    baker.release_resources(&mut backend);
}

#[test]
fn test_light_edit_rebakes() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    scene.lights.get_mut(ids.spot).unwrap().set_cone_angle(20.0);
    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { .. }));
    let camera = *baker.entries()[0].camera().unwrap();
    assert_eq!(camera.projection, Projection::Perspective { view_angle: 40.0 });

    baker.release_resources(&mut backend);
}

#[test]
fn test_light_count_change_discards_cache() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);
    let first = baker.entries()[0].texture().unwrap().handle;
    backend.clear_events();

    scene
        .lights
        .add(Light::directional(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO));
    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::Baked { maps: 2, rendered_props: 2 }
    );
    assert_eq!(backend.events()[0], BackendEvent::DestroyTexture(first));
    assert_eq!(backend.textures_created(), 2);
    assert_eq!(backend.live_textures(), 2);
    assert_eq!(baker.stats().cache_rebuilds, 2);

    // disabling a light shrinks the cache again
    scene.lights.get_mut(ids.spot).unwrap().set_enabled(false);
    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { maps: 1, .. }));
    assert_eq!(baker.entries().len(), 1);
    assert_eq!(backend.live_textures(), 1);

    baker.release_resources(&mut backend);
}

#[test]
fn test_no_visible_occluder_allocates_nothing() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    scene.props.get_mut(ids.cube).unwrap().set_visible(false);

    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);

    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::NoShadows(NoShadowReason::NoOccluder)
    );
    assert!(!baker.has_shadows());
    assert!(backend.events().is_empty());
    assert!(baker.entries().is_empty());
    assert!(log.borrow().is_empty());
    assert_eq!(baker.stats().frames_without_shadows, 1);
}

#[test]
fn test_missing_receiver_or_light() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);

    scene
        .props
        .get_mut(ids.cube)
        .unwrap()
        .set_tags(umbra_shadow::PropTags::OCCLUDER);
    scene
        .props
        .get_mut(ids.floor)
        .unwrap()
        .set_tags(umbra_shadow::PropTags::NONE);
    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::NoShadows(NoShadowReason::NoReceiver)
    );

    scene
        .props
        .get_mut(ids.floor)
        .unwrap()
        .set_tags(umbra_shadow::PropTags::RECEIVER);
    scene.lights.get_mut(ids.spot).unwrap().set_cone_angle(180.0);
    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::NoShadows(NoShadowReason::NoLight)
    );
    assert_eq!(backend.textures_created(), 0);
}

#[test]
fn test_bind_failure_restores_and_recovers() {
    init_logging();
    let (mut scene, _) = shadow_scene();
    scene
        .lights
        .add(Light::directional(Vec3::new(0.0, 5.0, 5.0), Vec3::ZERO));

    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let original = backend.render_state();
    backend.fail_bind_at(Some(1));
    let mut baker = recording_baker(&log);

    assert_eq!(baker.render(&mut backend, &scene), BakeOutcome::Failed);
    assert!(!baker.has_shadows());
    assert_eq!(baker.phase(), BakePhase::NeedsRebuild);
    assert_eq!(backend.render_state(), original);
    assert_eq!(backend.draw_target(), DrawBuffer::Back);
    assert_eq!(backend.bound_texture(), None);
    assert_eq!(backend.live_textures(), 0);
    assert!(baker.last_bake_time().is_never());

    let diagnostics = baker.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert!(matches!(diagnostics[0], ShadowError::Backend(_)));

    // the scene is still stale, so the next frame retries
    assert!(matches!(
        baker.render(&mut backend, &scene),
        BakeOutcome::Baked { maps: 2, .. }
    ));
    assert!(baker.has_shadows());
    assert_eq!(baker.stats().failures, 1);

    baker.release_resources(&mut backend);
}

#[test]
fn test_allocation_failure_touches_no_target() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    backend.fail_texture_creation(true);
    let mut baker = recording_baker(&log);

    assert_eq!(baker.render(&mut backend, &scene), BakeOutcome::Failed);
    assert!(backend.events().is_empty());
    assert!(log.borrow().is_empty());
}

#[test]
fn test_composite_delegate_shares_target() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = ShadowMapBaker::default()
        .with_opaque_delegate(RecordingDelegate::new("opaque", &log))
        .with_depth_composite_delegate(RecordingDelegate::new("composite", &log));

    assert_eq!(
        baker.render(&mut backend, &scene),
        BakeOutcome::Baked { maps: 1, rendered_props: 1 }
    );
    let passes = log.borrow();
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0].delegate, "opaque");
    assert_eq!(passes[1].delegate, "composite");
    assert_eq!(passes[0].bound_texture, passes[1].bound_texture);
    assert_eq!(passes[0].camera, passes[1].camera);

    drop(passes);
    baker.release_resources(&mut backend);
}

#[test]
fn test_release_resources_rebakes_next_frame() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let opaque = RecordingDelegate::new("opaque", &log);
    let released = opaque.released();
    let mut backend = HeadlessBackend::new();
    let mut baker = ShadowMapBaker::default().with_opaque_delegate(opaque);

    baker.render(&mut backend, &scene);
    baker.release_resources(&mut backend);

    assert_eq!(released.get(), 1);
    assert_eq!(backend.live_textures(), 0);
    assert!(backend.events().contains(&BackendEvent::ReleaseTarget));
    assert!(baker.entries().is_empty());
    assert!(!baker.has_shadows());

    assert!(matches!(baker.render(&mut backend, &scene), BakeOutcome::Baked { .. }));
    baker.release_resources(&mut backend);
}

#[test]
fn test_needs_update_acknowledgement() {
    init_logging();
    let (mut scene, ids) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);

    baker.render(&mut backend, &scene);
    assert!(baker.needs_update());
    baker.mark_up_to_date();
    assert!(!baker.needs_update());

    scene.props.get_mut(ids.cube).unwrap().translate(Vec3::Y);
    baker.render(&mut backend, &scene);
    assert!(baker.needs_update());

    baker.release_resources(&mut backend);
}

#[test]
fn test_spot_light_camera() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    // scene bounds span z in [-1, 2], light at z = 10 looking down
    let camera = *baker.entries()[0].camera().unwrap();
    assert_eq!(camera.projection, Projection::Perspective { view_angle: 60.0 });
    assert!((camera.near - 8.0).abs() < 1e-4);
    assert!((camera.far - 11.0).abs() < 1e-4);
    assert!(camera.has_valid_range());

    baker.release_resources(&mut backend);
}

#[test]
fn test_directional_light_camera() {
    init_logging();
    let mut scene = umbra_shadow::Scene::new();
    scene
        .lights
        .add(Light::directional(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO));
    scene.props.add(
        umbra_shadow::Prop::new(AABB::new(Vec3::new(-3.0, -1.0, 0.0), Vec3::new(3.0, 1.0, 5.0)))
            .with_tags(umbra_shadow::PropTags::BOTH),
    );

    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = recording_baker(&log);
    baker.render(&mut backend, &scene);

    let camera = *baker.entries()[0].camera().unwrap();
    assert_eq!(camera.projection, Projection::Orthographic { parallel_scale: 6.0 });
    assert!((camera.near - 1.0).abs() < 1e-5);
    assert!((camera.far - 6.0).abs() < 1e-5);

    let gpu = baker.gpu_shadow_maps();
    assert_eq!(gpu.len(), 1);
    assert!(gpu[0].is_orthographic());
    assert_eq!(gpu[0].far, camera.far);

    baker.release_resources(&mut backend);
}

#[test]
fn test_unsupported_context_disables_baking() {
    init_logging();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new().with_capabilities(Capabilities {
        offscreen_targets: false,
        ..Capabilities::all()
    });
    let mut baker = recording_baker(&log);

    for _ in 0..2 {
        assert_eq!(
            baker.render(&mut backend, &scene),
            BakeOutcome::Unsupported(Capability::OffscreenTargets)
        );
    }
    assert!(baker.is_disabled());
    assert!(!baker.has_shadows());
    assert!(backend.events().is_empty());
    assert_eq!(baker.take_diagnostics().len(), 1);
}

#[test]
fn test_config_from_json_drives_resolution() {
    init_logging();
    let config = ShadowBakeConfig::from_json(r#"{ "resolution": 128, "depth_format": "Depth16Unorm" }"#).unwrap();
    let (scene, _) = shadow_scene();
    let log = new_log();
    let mut backend = HeadlessBackend::new();
    let mut baker = ShadowMapBaker::new(config)
        .unwrap()
        .with_opaque_delegate(RecordingDelegate::new("opaque", &log));

    baker.render(&mut backend, &scene);
    assert_eq!(log.borrow()[0].resolution, 128);
    assert_eq!(
        backend.events()[0],
        BackendEvent::CreateTexture { handle: 1, width: 128, height: 128 }
    );

    baker.release_resources(&mut backend);
}

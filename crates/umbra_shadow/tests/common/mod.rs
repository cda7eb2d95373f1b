//! Shared fixtures for the baking integration tests

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use umbra_core::Id;
use umbra_math::{Vec3, AABB};
use umbra_shadow::{
    HeadlessBackend, Light, PassContext, Prop, PropTags, RenderDelegate, RenderState, Scene,
    ShadowBackend, ShadowCamera,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// What a delegate saw during one call
#[derive(Clone, Debug)]
pub struct PassRecord {
    pub delegate: &'static str,
    pub light_index: usize,
    pub props: Vec<Id>,
    pub camera: ShadowCamera,
    pub state: RenderState,
    pub bound_texture: Option<u32>,
    pub resolution: u32,
}

pub type PassLog = Rc<RefCell<Vec<PassRecord>>>;

/// Delegate that records every call into a shared log
pub struct RecordingDelegate {
    name: &'static str,
    log: PassLog,
    released: Rc<Cell<usize>>,
}

impl RecordingDelegate {
    pub fn new(name: &'static str, log: &PassLog) -> Self {
        Self {
            name,
            log: Rc::clone(log),
            released: Rc::new(Cell::new(0)),
        }
    }

    /// Counter bumped by `release_resources`
    pub fn released(&self) -> Rc<Cell<usize>> {
        Rc::clone(&self.released)
    }
}

impl RenderDelegate<HeadlessBackend> for RecordingDelegate {
    fn name(&self) -> &str {
        self.name
    }

    fn render(&mut self, pass: &mut PassContext<'_, HeadlessBackend>) -> usize {
        self.log.borrow_mut().push(PassRecord {
            delegate: self.name,
            light_index: pass.light_index,
            props: pass.props.iter().map(|p| p.id()).collect(),
            camera: *pass.camera,
            state: pass.backend.render_state(),
            bound_texture: pass.backend.bound_texture(),
            resolution: pass.resolution,
        });
        pass.props.len()
    }

    fn release_resources(&mut self, _backend: &mut HeadlessBackend) {
        self.released.set(self.released.get() + 1);
    }
}

pub fn new_log() -> PassLog {
    Rc::new(RefCell::new(Vec::new()))
}

/// Ids of the objects in [`shadow_scene`]
pub struct SceneIds {
    pub spot: Id,
    pub floor: Id,
    pub cube: Id,
    pub hidden: Id,
}

/// A spot light above a cube resting on a floor, plus a hidden occluder
pub fn shadow_scene() -> (Scene, SceneIds) {
    let mut scene = Scene::new();
    let spot = scene
        .lights
        .add(Light::positional(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, 30.0));
    let floor = scene.props.add(
        Prop::new(AABB::new(Vec3::new(-10.0, -10.0, -1.0), Vec3::new(10.0, 10.0, 0.0)))
            .with_tags(PropTags::RECEIVER),
    );
    let cube = scene.props.add(
        Prop::new(AABB::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 2.0)))
            .with_tags(PropTags::BOTH),
    );
    let hidden = scene.props.add(
        Prop::new(AABB::new(Vec3::new(3.0, 3.0, 0.0), Vec3::new(4.0, 4.0, 1.0)))
            .with_tags(PropTags::OCCLUDER)
            .with_visible(false),
    );
    (
        scene,
        SceneIds {
            spot,
            floor,
            cube,
            hidden,
        },
    )
}

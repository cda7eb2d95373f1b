//! Scene inputs read by the baker
//!
//! Lights and props carry a [`TimeStamp`] that moves forward on every
//! mutation, and each collection stamps its own membership changes. The
//! baker only ever reads a [`Scene`]; all setters live here.

use core::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};
use umbra_core::{Id, IdGenerator, TimeStamp};
use umbra_math::{Vec3, AABB};

static LIGHT_IDS: IdGenerator = IdGenerator::new();
static PROP_IDS: IdGenerator = IdGenerator::new();

/// How a light is attached to the scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LightKind {
    /// Follows the viewer; never casts shadows
    Headlight,
    /// Infinitely far away, parallel rays from position toward focal point
    Directional,
    /// Located at its position, emitting a cone around the focal direction
    Positional,
}

/// A scene light
#[derive(Clone, Debug)]
pub struct Light {
    id: Id,
    kind: LightKind,
    enabled: bool,
    position: Vec3,
    focal_point: Vec3,
    /// Half-aperture in degrees, measured from the cone axis
    cone_angle: f32,
    mtime: TimeStamp,
}

impl Light {
    pub fn new(kind: LightKind) -> Self {
        Self {
            id: LIGHT_IDS.next(),
            kind,
            enabled: true,
            position: Vec3::Z,
            focal_point: Vec3::ZERO,
            cone_angle: 30.0,
            mtime: TimeStamp::now(),
        }
    }

    pub fn headlight() -> Self {
        Self::new(LightKind::Headlight)
    }

    /// Directional light shining from `position` toward `focal_point`
    pub fn directional(position: Vec3, focal_point: Vec3) -> Self {
        Self::new(LightKind::Directional)
            .with_position(position)
            .with_focal_point(focal_point)
    }

    /// Spot light at `position` aimed at `focal_point`
    pub fn positional(position: Vec3, focal_point: Vec3, cone_angle: f32) -> Self {
        Self::new(LightKind::Positional)
            .with_position(position)
            .with_focal_point(focal_point)
            .with_cone_angle(cone_angle)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    pub fn with_focal_point(mut self, focal_point: Vec3) -> Self {
        self.set_focal_point(focal_point);
        self
    }

    pub fn with_cone_angle(mut self, degrees: f32) -> Self {
        self.set_cone_angle(degrees);
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> LightKind {
        self.kind
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    #[inline]
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    #[inline]
    pub fn cone_angle(&self) -> f32 {
        self.cone_angle
    }

    #[inline]
    pub fn modified_time(&self) -> TimeStamp {
        self.mtime
    }

    pub fn set_kind(&mut self, kind: LightKind) {
        self.kind = kind;
        self.mtime.modified();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.mtime.modified();
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.mtime.modified();
    }

    pub fn set_focal_point(&mut self, focal_point: Vec3) {
        self.focal_point = focal_point;
        self.mtime.modified();
    }

    pub fn set_cone_angle(&mut self, degrees: f32) {
        self.cone_angle = degrees;
        self.mtime.modified();
    }
}

/// Ordered light list; order is the discovery order of shadow maps
#[derive(Clone, Debug)]
pub struct LightCollection {
    lights: Vec<Light>,
    mtime: TimeStamp,
}

impl Default for LightCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl LightCollection {
    pub fn new() -> Self {
        Self {
            lights: Vec::new(),
            mtime: TimeStamp::now(),
        }
    }

    /// Append a light, returning its id
    pub fn add(&mut self, light: Light) -> Id {
        let id = light.id();
        self.lights.push(light);
        self.mtime.modified();
        id
    }

    pub fn remove(&mut self, id: Id) -> Option<Light> {
        let index = self.lights.iter().position(|l| l.id() == id)?;
        self.mtime.modified();
        Some(self.lights.remove(index))
    }

    pub fn clear(&mut self) {
        self.lights.clear();
        self.mtime.modified();
    }

    pub fn get(&self, id: Id) -> Option<&Light> {
        self.lights.iter().find(|l| l.id() == id)
    }

    /// Mutable access; changes go through the light's own stamp
    pub fn get_mut(&mut self, id: Id) -> Option<&mut Light> {
        self.lights.iter_mut().find(|l| l.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Light> {
        self.lights.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lights.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lights.is_empty()
    }

    /// Last time a light was added or removed
    #[inline]
    pub fn modified_time(&self) -> TimeStamp {
        self.mtime
    }
}

/// Shadow roles a prop takes part in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropTags(u8);

impl PropTags {
    pub const NONE: Self = Self(0);

    /// Rendered into shadow maps
    pub const OCCLUDER: Self = Self(1 << 0);

    /// Shaded with shadow maps by the downstream pass
    pub const RECEIVER: Self = Self(1 << 1);

    pub const BOTH: Self = Self(Self::OCCLUDER.0 | Self::RECEIVER.0);

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for PropTags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PropTags {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A renderable scene object
#[derive(Clone, Debug)]
pub struct Prop {
    id: Id,
    visible: bool,
    bounds: AABB,
    tags: PropTags,
    mtime: TimeStamp,
}

impl Prop {
    /// Visible prop with world-space `bounds` and no shadow role
    pub fn new(bounds: AABB) -> Self {
        Self {
            id: PROP_IDS.next(),
            visible: true,
            bounds,
            tags: PropTags::NONE,
            mtime: TimeStamp::now(),
        }
    }

    pub fn with_tags(mut self, tags: PropTags) -> Self {
        self.set_tags(tags);
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.set_visible(visible);
        self
    }

    #[inline]
    pub fn id(&self) -> Id {
        self.id
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub fn bounds(&self) -> AABB {
        self.bounds
    }

    #[inline]
    pub fn tags(&self) -> PropTags {
        self.tags
    }

    #[inline]
    pub fn is_occluder(&self) -> bool {
        self.tags.contains(PropTags::OCCLUDER)
    }

    #[inline]
    pub fn is_receiver(&self) -> bool {
        self.tags.contains(PropTags::RECEIVER)
    }

    #[inline]
    pub fn modified_time(&self) -> TimeStamp {
        self.mtime
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.mtime.modified();
    }

    pub fn set_tags(&mut self, tags: PropTags) {
        self.tags = tags;
        self.mtime.modified();
    }

    /// Replace the world-space bounds (e.g. after a transform change)
    pub fn set_bounds(&mut self, bounds: AABB) {
        self.bounds = bounds;
        self.mtime.modified();
    }

    /// Move the prop by `offset`
    pub fn translate(&mut self, offset: Vec3) {
        self.set_bounds(AABB::new(self.bounds.min + offset, self.bounds.max + offset));
    }
}

/// All props tracked by the renderer, visible or not
#[derive(Clone, Debug)]
pub struct PropCollection {
    props: Vec<Prop>,
    mtime: TimeStamp,
}

impl Default for PropCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl PropCollection {
    pub fn new() -> Self {
        Self {
            props: Vec::new(),
            mtime: TimeStamp::now(),
        }
    }

    pub fn add(&mut self, prop: Prop) -> Id {
        let id = prop.id();
        self.props.push(prop);
        self.mtime.modified();
        id
    }

    pub fn remove(&mut self, id: Id) -> Option<Prop> {
        let index = self.props.iter().position(|p| p.id() == id)?;
        self.mtime.modified();
        Some(self.props.remove(index))
    }

    pub fn get(&self, id: Id) -> Option<&Prop> {
        self.props.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut Prop> {
        self.props.iter_mut().find(|p| p.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Prop> {
        self.props.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.props.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    /// Last time a prop was added or removed
    #[inline]
    pub fn modified_time(&self) -> TimeStamp {
        self.mtime
    }

    /// Newest stamp of any prop, visible or not
    pub fn latest_prop_time(&self) -> TimeStamp {
        self.props
            .iter()
            .map(Prop::modified_time)
            .max()
            .unwrap_or(TimeStamp::NEVER)
    }

    /// Union of every prop's bounds
    ///
    /// Props with empty or non-finite bounds are skipped. Returns
    /// [`AABB::EMPTY`] when nothing contributes.
    pub fn bounds(&self) -> AABB {
        self.props
            .iter()
            .map(Prop::bounds)
            .filter(AABB::is_valid)
            .fold(AABB::EMPTY, |acc, b| acc.union(&b))
    }
}

/// The light and prop lists a frame is rendered from
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub lights: LightCollection,
    pub props: PropCollection,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }
}

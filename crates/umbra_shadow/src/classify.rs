//! Shadow-casting light classification

use crate::scene::{Light, LightCollection, LightKind};

/// Widest spot cone (half-angle, degrees) that still produces a shadow map
pub const MAX_CONE_ANGLE: f32 = 180.0;

/// Does `light` cast shadows?
///
/// Enabled directional lights do; enabled positional lights do when their
/// cone is narrower than a half-space. Headlights never do.
pub fn casts_shadow(light: &Light) -> bool {
    if !light.is_enabled() {
        return false;
    }
    match light.kind() {
        LightKind::Headlight => false,
        LightKind::Directional => true,
        LightKind::Positional => light.cone_angle() < MAX_CONE_ANGLE,
    }
}

/// Shadow-casting lights in discovery order
pub fn shadow_casting_lights(lights: &LightCollection) -> impl Iterator<Item = &Light> {
    lights.iter().filter(|l| casts_shadow(l))
}

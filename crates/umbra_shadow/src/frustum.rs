//! Frustum fitting
//!
//! Builds one [`ShadowCamera`] per shadow-casting light so the whole scene
//! bounding box lands inside the light's view volume.

use umbra_math::{Vec3, AABB};

use crate::camera::{Projection, ShadowCamera};
use crate::classify::casts_shadow;
use crate::scene::{Light, LightKind};

/// Clipping range used when the input cannot produce a valid one
pub const FALLBACK_RANGE: (f32, f32) = (1.0, 2.0);

/// Near plane distance of orthographic fits, in front of the box
const ORTHO_NEAR: f32 = 1.0;

/// Project the eight corners of `bounds` onto `axis`, measured from `origin`
///
/// Returns `(min, max)` of the signed distances. Corner order does not
/// matter.
pub fn box_near_far(bounds: &AABB, origin: Vec3, axis: Vec3) -> (f32, f32) {
    bounds
        .corners()
        .iter()
        .map(|&corner| (corner - origin).dot(axis))
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

/// Fit a camera for `light` around `bounds`
///
/// Positional lights get a perspective camera with an aperture of twice
/// the cone angle, capped at [`MAX_VIEW_ANGLE`](crate::camera::MAX_VIEW_ANGLE). Directional lights get an orthographic camera whose
/// near plane sits one unit in front of the box.
pub fn build_camera(light: &Light, bounds: &AABB) -> ShadowCamera {
    debug_assert!(casts_shadow(light), "build_camera called for a light without shadows");

    let position = light.position();
    let (direction, focal_point) = match (light.focal_point() - position).normalize_or_zero() {
        d if d != Vec3::ZERO && d.is_finite() => (d, light.focal_point()),
        _ => {
            log::debug!(
                "light {} has no direction (position == focal point), looking down -Z",
                light.id()
            );
            (Vec3::NEG_Z, position + Vec3::NEG_Z)
        }
    };
    let (right, up) = direction.orthonormal_pair();

    match light.kind() {
        LightKind::Positional => {
            let (near, far) = if bounds.is_valid() && position.is_finite() {
                clamp_perspective_range(box_near_far(bounds, position, direction))
            } else {
                FALLBACK_RANGE
            };
            ShadowCamera {
                position,
                focal_point,
                view_up: up,
                projection: Projection::perspective(light.cone_angle() * 2.0),
                near,
                far,
            }
        }
        LightKind::Directional | LightKind::Headlight => {
            fit_orthographic(bounds, position, direction, right, up)
        }
    }
}

/// Keep the near plane off the apex and the far plane beyond it
fn clamp_perspective_range((mut near, mut far): (f32, f32)) -> (f32, f32) {
    let min_span = (far - near) / 100.0;
    if near < min_span {
        near = min_span;
    }
    if far < min_span {
        far = 2.0 * min_span;
    }
    if near.is_finite() && far.is_finite() && near > 0.0 && far > near {
        (near, far)
    } else {
        FALLBACK_RANGE
    }
}

/// Box extents are measured about the world origin, not the light
fn fit_orthographic(bounds: &AABB, light_position: Vec3, direction: Vec3, right: Vec3, up: Vec3) -> ShadowCamera {
    if !bounds.is_valid() {
        return ShadowCamera {
            position: light_position,
            focal_point: light_position + direction,
            view_up: up,
            projection: Projection::Orthographic { parallel_scale: 1.0 },
            near: FALLBACK_RANGE.0,
            far: FALLBACK_RANGE.1,
        };
    }

    let (min_x, max_x) = box_near_far(bounds, Vec3::ZERO, right);
    let (min_y, max_y) = box_near_far(bounds, Vec3::ZERO, up);
    let (min_z, max_z) = box_near_far(bounds, Vec3::ZERO, direction);

    let position = direction * (min_z - ORTHO_NEAR)
        + right * ((min_x + max_x) / 2.0)
        + up * ((min_y + max_y) / 2.0);

    let scale = (max_x - min_x).max(max_y - min_y);
    let parallel_scale = if scale > 0.0 && scale.is_finite() { scale } else { 1.0 };

    let far = ORTHO_NEAR + (max_z - min_z);
    let (near, far) = if far > ORTHO_NEAR && far.is_finite() {
        (ORTHO_NEAR, far)
    } else {
        FALLBACK_RANGE
    };

    ShadowCamera {
        position,
        focal_point: position + direction,
        view_up: up,
        projection: Projection::Orthographic { parallel_scale },
        near,
        far,
    }
}

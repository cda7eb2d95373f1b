//! Light-space cameras

use serde::{Deserialize, Serialize};
use umbra_math::{radians, Mat4, Vec3};

/// Narrowest perspective aperture, in degrees
pub const MIN_VIEW_ANGLE: f32 = 1e-8;

/// Widest perspective aperture, in degrees
///
/// At 180 the projection degenerates and beyond it the image is mirrored.
pub const MAX_VIEW_ANGLE: f32 = 179.0;

/// Projection of a shadow camera
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// Full vertical aperture in degrees
    Perspective { view_angle: f32 },
    /// Half-height of the view volume in world units
    Orthographic { parallel_scale: f32 },
}

impl Projection {
    /// Perspective projection with `view_angle` clamped between
    /// [`MIN_VIEW_ANGLE`] and [`MAX_VIEW_ANGLE`]
    pub fn perspective(view_angle: f32) -> Self {
        Projection::Perspective {
            view_angle: clamp_view_angle(view_angle),
        }
    }
}

fn clamp_view_angle(view_angle: f32) -> f32 {
    if view_angle.is_nan() {
        MAX_VIEW_ANGLE
    } else {
        view_angle.clamp(MIN_VIEW_ANGLE, MAX_VIEW_ANGLE)
    }
}

/// The camera a shadow map was rendered from
///
/// Shadow maps are square, so projections use an aspect ratio of 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShadowCamera {
    pub position: Vec3,
    pub focal_point: Vec3,
    pub view_up: Vec3,
    pub projection: Projection,
    pub near: f32,
    pub far: f32,
}

impl ShadowCamera {
    /// Unit vector from position toward the focal point
    #[inline]
    pub fn direction(&self) -> Vec3 {
        (self.focal_point - self.position).normalize_or_zero()
    }

    #[inline]
    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, Projection::Perspective { .. })
    }

    /// `(near, far)`
    #[inline]
    pub fn clipping_range(&self) -> (f32, f32) {
        (self.near, self.far)
    }

    /// Holds for every camera produced by frustum fitting
    pub fn has_valid_range(&self) -> bool {
        self.near.is_finite() && self.far.is_finite() && self.near > 0.0 && self.far > self.near
    }

    /// World to light-view transform
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.focal_point, self.view_up)
    }

    /// Light-view to clip transform
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            Projection::Perspective { view_angle } => {
                Mat4::perspective(radians(clamp_view_angle(view_angle)), 1.0, self.near, self.far)
            }
            Projection::Orthographic { parallel_scale } => Mat4::orthographic(
                -parallel_scale,
                parallel_scale,
                -parallel_scale,
                parallel_scale,
                self.near,
                self.far,
            ),
        }
    }

    /// World to clip transform
    #[inline]
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

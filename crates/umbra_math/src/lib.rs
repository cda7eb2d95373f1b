//! # umbra_math - Math Primitives
//!
//! Vectors, matrices and bounding boxes used for shadow frustum fitting.
//! Matrices are column-major with OpenGL-style clip space.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod vector;
pub mod matrix;
pub mod bounds;

pub use vector::*;
pub use matrix::*;
pub use bounds::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

pub mod prelude {
    pub use crate::vector::{Vec3, Vec4};
    pub use crate::matrix::Mat4;
    pub use crate::bounds::AABB;
    pub use crate::radians;
}

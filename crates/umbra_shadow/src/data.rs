//! GPU Shadow Data
//!
//! Per-map uniforms for the pass that samples the baked shadow maps. All
//! structures are bytemuck Pod/Zeroable for direct GPU upload.

use serde::{Deserialize, Serialize};

use crate::camera::ShadowCamera;

/// Uniform data for one baked shadow map
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuShadowMap {
    /// World to light-view (column-major)
    pub view: [[f32; 4]; 4],

    /// Light-view to clip (column-major)
    pub projection: [[f32; 4]; 4],

    /// World to clip, `projection * view`
    pub view_projection: [[f32; 4]; 4],

    /// Near plane
    pub near: f32,

    /// Far plane
    pub far: f32,

    /// 1 for orthographic cameras, 0 for perspective
    pub orthographic: u32,

    /// Texel size (1.0 / resolution)
    pub texel_size: f32,
}

impl GpuShadowMap {
    pub fn from_camera(camera: &ShadowCamera, resolution: u32) -> Self {
        let view = camera.view_matrix();
        let projection = camera.projection_matrix();
        Self {
            view: view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            view_projection: (projection * view).to_cols_array_2d(),
            near: camera.near,
            far: camera.far,
            orthographic: u32::from(!camera.is_perspective()),
            texel_size: 1.0 / resolution.max(1) as f32,
        }
    }

    #[inline]
    pub fn is_orthographic(&self) -> bool {
        self.orthographic != 0
    }
}

/// Raw bytes of a uniform array, ready for upload
pub fn as_bytes(maps: &[GpuShadowMap]) -> &[u8] {
    bytemuck::cast_slice(maps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Projection;
    use umbra_math::{Mat4, Vec3};

    #[test]
    fn test_layout() {
        assert_eq!(core::mem::size_of::<GpuShadowMap>(), 208);
        assert_eq!(core::mem::size_of::<GpuShadowMap>() % 16, 0);
    }

    #[test]
    fn test_from_camera() {
        let camera = ShadowCamera {
            position: Vec3::new(0.0, 0.0, 4.0),
            focal_point: Vec3::new(0.0, 0.0, 3.0),
            view_up: Vec3::Y,
            projection: Projection::Orthographic { parallel_scale: 2.0 },
            near: 1.0,
            far: 7.0,
        };
        let gpu = GpuShadowMap::from_camera(&camera, 512);
        assert!(gpu.is_orthographic());
        assert_eq!(gpu.near, 1.0);
        assert_eq!(gpu.far, 7.0);
        assert_eq!(gpu.texel_size, 1.0 / 512.0);
        assert_eq!(gpu.view, camera.view_matrix().to_cols_array_2d());
        assert_ne!(gpu.view_projection, Mat4::IDENTITY.to_cols_array_2d());
    }

    #[test]
    fn test_as_bytes() {
        let maps = [GpuShadowMap::default(); 3];
        assert_eq!(as_bytes(&maps).len(), 3 * 208);
    }
}

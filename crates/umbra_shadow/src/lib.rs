//! # umbra_shadow - Shadow Map Baking
//!
//! Renders one depth map per shadow-casting light and keeps them cached
//! until the scene changes:
//! - **Classification**: which lights cast shadows
//! - **Invalidation**: coarse modification-stamp comparison against the
//!   last bake; any change anywhere rebakes everything
//! - **Frustum fitting**: perspective cameras for spot lights, orthographic
//!   cameras for directional lights, fitted to the scene bounds
//! - **Baking**: offscreen depth-only passes through a [`ShadowBackend`],
//!   with render state and target bindings restored by scope guards
//!
//! Geometry is never drawn here. A [`RenderDelegate`] receives a
//! [`PassContext`] holding the bound backend, the light camera and the
//! visible occluders.
//!
//! ## Example
//!
//! ```ignore
//! use umbra_shadow::prelude::*;
//!
//! let mut baker = ShadowMapBaker::new(ShadowBakeConfig::high_quality())?
//!     .with_opaque_delegate(MyDepthRenderer::new());
//!
//! // every frame
//! baker.render(&mut backend, &scene);
//! if baker.has_shadows() {
//!     upload(as_bytes(&baker.gpu_shadow_maps()));
//! }
//!
//! // on shutdown
//! baker.release_resources(&mut backend);
//! ```

pub mod backend;
pub mod baker;
pub mod cache;
pub mod camera;
pub mod classify;
pub mod config;
pub mod data;
pub mod delegate;
pub mod error;
pub mod frustum;
pub mod headless;
pub mod invalidation;
pub mod scene;

pub use backend::{
    AddressMode, Capabilities, Capability, DepthFormat, DepthFunc, DepthTextureDesc, FilterMode,
    OffscreenScope, PolygonOffset, RenderState, RenderStateScope, ShadingModel, ShadowBackend,
};
pub use baker::{BakeOutcome, BakePhase, BakeStats, ShadowMapBaker};
pub use cache::{ShadowMapCache, ShadowMapEntry};
pub use camera::{Projection, ShadowCamera, MAX_VIEW_ANGLE, MIN_VIEW_ANGLE};
pub use classify::{casts_shadow, shadow_casting_lights};
pub use config::ShadowBakeConfig;
pub use data::{as_bytes, GpuShadowMap};
pub use delegate::{DelegateSet, PassContext, RenderDelegate};
pub use error::{BackendError, ShadowError, ShadowResult};
pub use frustum::{box_near_far, build_camera};
pub use headless::{BackendEvent, DrawBuffer, HeadlessBackend, HeadlessTexture};
pub use invalidation::{needs_rebuild, NoShadowReason, SceneScan};
pub use scene::{Light, LightCollection, LightKind, Prop, PropCollection, PropTags, Scene};

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::backend::{Capabilities, ShadowBackend};
    pub use crate::baker::{BakeOutcome, ShadowMapBaker};
    pub use crate::camera::{Projection, ShadowCamera};
    pub use crate::config::ShadowBakeConfig;
    pub use crate::data::{as_bytes, GpuShadowMap};
    pub use crate::delegate::{PassContext, RenderDelegate};
    pub use crate::error::{ShadowError, ShadowResult};
    pub use crate::scene::{Light, LightKind, Prop, PropTags, Scene};
    pub use umbra_core::TimeStamp;
    pub use umbra_math::{Vec3, AABB};
}

//! Backend abstraction
//!
//! The baker never talks to a graphics API directly. A [`ShadowBackend`]
//! provides depth textures, an offscreen target to draw into them and the
//! handful of fixed-function state the bake toggles. Everything the baker
//! changes is saved first and restored by a scope guard, so an early `?`
//! return leaves the context exactly as it was found.

use core::fmt;
use core::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};
use umbra_core::Id;

use crate::error::BackendError;

/// Context features shadow mapping cannot work without
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capability {
    OffscreenTargets,
    TextureObjects,
    ProgrammableShading,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OffscreenTargets => write!(f, "offscreen render targets"),
            Self::TextureObjects => write!(f, "texture objects"),
            Self::ProgrammableShading => write!(f, "programmable shading"),
        }
    }
}

/// What the context supports
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub offscreen_targets: bool,
    pub texture_objects: bool,
    pub programmable_shading: bool,
}

impl Capabilities {
    pub const fn all() -> Self {
        Self {
            offscreen_targets: true,
            texture_objects: true,
            programmable_shading: true,
        }
    }

    pub const fn none() -> Self {
        Self {
            offscreen_targets: false,
            texture_objects: false,
            programmable_shading: false,
        }
    }

    /// First unsupported capability, checked in dependency order
    pub fn first_missing(&self) -> Option<Capability> {
        if !self.offscreen_targets {
            Some(Capability::OffscreenTargets)
        } else if !self.texture_objects {
            Some(Capability::TextureObjects)
        } else if !self.programmable_shading {
            Some(Capability::ProgrammableShading)
        } else {
            None
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Depth texture storage format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DepthFormat {
    Depth16Unorm,
    Depth24Plus,
    Depth32Float,
}

impl DepthFormat {
    /// Bytes per texel
    pub const fn bytes_per_texel(&self) -> u32 {
        match self {
            Self::Depth16Unorm => 2,
            Self::Depth24Plus | Self::Depth32Float => 4,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterMode {
    Nearest,
    Linear,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    ClampToEdge,
    Repeat,
}

/// Description of one shadow map texture
#[derive(Clone, Debug, PartialEq)]
pub struct DepthTextureDesc {
    pub id: Id,
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: DepthFormat,
    pub min_filter: FilterMode,
    pub mag_filter: FilterMode,
    pub address_mode: AddressMode,
}

impl DepthTextureDesc {
    /// Square shadow map for the light at `index`
    ///
    /// Depth is sampled unfiltered and never wraps.
    pub fn shadow_map(index: usize, resolution: u32, format: DepthFormat) -> Self {
        let label = format!("shadow_map_{}", index);
        Self {
            id: Id::from_name(&label),
            label,
            width: resolution,
            height: resolution,
            format,
            min_filter: FilterMode::Nearest,
            mag_filter: FilterMode::Nearest,
            address_mode: AddressMode::ClampToEdge,
        }
    }

    /// GPU memory footprint in bytes
    pub fn size_bytes(&self) -> u64 {
        self.width as u64 * self.height as u64 * self.format.bytes_per_texel() as u64
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ShadingModel {
    Flat,
    #[default]
    Smooth,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    Never,
    Less,
    Equal,
    #[default]
    LessEqual,
    Greater,
    Always,
}

/// Depth bias applied to filled polygons
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PolygonOffset {
    pub factor: f32,
    pub units: f32,
}

/// The slice of fixed-function state the bake touches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderState {
    pub color_writes: bool,
    pub shading: ShadingModel,
    pub lighting: bool,
    pub depth_test: bool,
    pub depth_func: DepthFunc,
    pub polygon_offset: Option<PolygonOffset>,
    pub scissor_test: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            color_writes: true,
            shading: ShadingModel::Smooth,
            lighting: true,
            depth_test: true,
            depth_func: DepthFunc::LessEqual,
            polygon_offset: None,
            scissor_test: false,
        }
    }
}

impl RenderState {
    /// Depth-only variant of `self` for rendering occluders
    pub fn depth_only(&self, offset: PolygonOffset) -> Self {
        Self {
            color_writes: false,
            shading: ShadingModel::Flat,
            lighting: false,
            depth_test: true,
            polygon_offset: Some(offset),
            ..*self
        }
    }
}

/// Graphics context the baker renders through
pub trait ShadowBackend {
    /// Backend handle of a depth texture
    type DepthTexture;

    /// Whatever identifies the current draw target, e.g. a draw buffer enum
    type DrawTarget: Copy;

    /// Query supported features
    fn capabilities(&self) -> Capabilities;

    /// Allocate a depth texture
    fn create_depth_texture(&mut self, desc: &DepthTextureDesc) -> Result<Self::DepthTexture, BackendError>;

    /// Free a depth texture
    fn destroy_depth_texture(&mut self, texture: Self::DepthTexture);

    /// Bind the offscreen target with `texture` as its only (depth) attachment
    fn bind_depth_target(&mut self, texture: &Self::DepthTexture, width: u32, height: u32) -> Result<(), BackendError>;

    /// Return to the default target
    fn unbind_target(&mut self);

    /// Current draw target
    fn draw_target(&self) -> Self::DrawTarget;

    /// Restore a draw target captured with [`draw_target`](Self::draw_target)
    fn set_draw_target(&mut self, target: Self::DrawTarget);

    /// Current render state
    fn render_state(&self) -> RenderState;

    /// Replace the render state
    fn apply_render_state(&mut self, state: &RenderState);

    /// Free the offscreen target object, if the backend keeps one around
    fn release_offscreen_target(&mut self) {}
}

/// Saves the render state on creation and restores it on drop
pub struct RenderStateScope<'a, B: ShadowBackend> {
    backend: &'a mut B,
    saved: RenderState,
    restore: RenderState,
}

impl<'a, B: ShadowBackend> RenderStateScope<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        let saved = backend.render_state();
        Self {
            backend,
            saved,
            restore: saved,
        }
    }

    /// State captured on entry
    #[inline]
    pub fn saved(&self) -> RenderState {
        self.saved
    }

    /// Restore with polygon offset disabled instead of its saved value
    pub fn restore_without_polygon_offset(&mut self) {
        self.restore.polygon_offset = None;
    }
}

impl<B: ShadowBackend> Deref for RenderStateScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: ShadowBackend> DerefMut for RenderStateScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: ShadowBackend> Drop for RenderStateScope<'_, B> {
    fn drop(&mut self) {
        self.backend.apply_render_state(&self.restore);
    }
}

/// Unbinds the offscreen target and restores the draw target on drop
pub struct OffscreenScope<'a, B: ShadowBackend> {
    backend: &'a mut B,
    saved_target: B::DrawTarget,
}

impl<'a, B: ShadowBackend> OffscreenScope<'a, B> {
    pub fn new(backend: &'a mut B) -> Self {
        Self {
            saved_target: backend.draw_target(),
            backend,
        }
    }
}

impl<B: ShadowBackend> Deref for OffscreenScope<'_, B> {
    type Target = B;

    fn deref(&self) -> &B {
        self.backend
    }
}

impl<B: ShadowBackend> DerefMut for OffscreenScope<'_, B> {
    fn deref_mut(&mut self) -> &mut B {
        self.backend
    }
}

impl<B: ShadowBackend> Drop for OffscreenScope<'_, B> {
    fn drop(&mut self) {
        self.backend.unbind_target();
        self.backend.set_draw_target(self.saved_target);
    }
}

//! Render delegates
//!
//! The baker owns no geometry code. For each light it binds a target,
//! installs a camera and hands a [`PassContext`] to the delegates, which
//! submit the occluders however the renderer draws them.

use crate::backend::ShadowBackend;
use crate::camera::ShadowCamera;
use crate::scene::Prop;

/// Everything a delegate needs to draw one shadow map
pub struct PassContext<'a, B: ShadowBackend> {
    /// Backend with the depth target bound and depth-only state applied
    pub backend: &'a mut B,
    /// Camera to render from
    pub camera: &'a ShadowCamera,
    /// Visible occluders, in scene order
    pub props: &'a [&'a Prop],
    /// Index of the shadow map being rendered
    pub light_index: usize,
    /// Edge length of the bound depth target
    pub resolution: u32,
}

/// Geometry submission for shadow passes
pub trait RenderDelegate<B: ShadowBackend> {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Draw into the bound target, returning the number of props rendered
    fn render(&mut self, pass: &mut PassContext<'_, B>) -> usize;

    /// Free backend resources held by the delegate
    fn release_resources(&mut self, _backend: &mut B) {}
}

/// The opaque delegate plus an optional depth-compositing delegate
pub struct DelegateSet<B: ShadowBackend> {
    opaque: Option<Box<dyn RenderDelegate<B>>>,
    depth_composite: Option<Box<dyn RenderDelegate<B>>>,
}

impl<B: ShadowBackend> Default for DelegateSet<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ShadowBackend> DelegateSet<B> {
    pub fn new() -> Self {
        Self {
            opaque: None,
            depth_composite: None,
        }
    }

    /// Replace the opaque delegate, returning the previous one
    pub fn set_opaque(&mut self, delegate: Option<Box<dyn RenderDelegate<B>>>) -> Option<Box<dyn RenderDelegate<B>>> {
        core::mem::replace(&mut self.opaque, delegate)
    }

    /// Replace the depth-compositing delegate, returning the previous one
    pub fn set_depth_composite(
        &mut self,
        delegate: Option<Box<dyn RenderDelegate<B>>>,
    ) -> Option<Box<dyn RenderDelegate<B>>> {
        core::mem::replace(&mut self.depth_composite, delegate)
    }

    #[inline]
    pub fn has_opaque(&self) -> bool {
        self.opaque.is_some()
    }

    #[inline]
    pub fn has_depth_composite(&self) -> bool {
        self.depth_composite.is_some()
    }

    /// Run the delegates for one shadow map
    ///
    /// Returns the opaque delegate's rendered count; the compositing pass
    /// draws into the same target but does not add to the count.
    pub fn render(&mut self, pass: &mut PassContext<'_, B>) -> Option<usize> {
        let opaque = self.opaque.as_mut()?;
        let rendered = opaque.render(pass);
        log::trace!(
            "shadow map {}: {} rendered {} props",
            pass.light_index,
            opaque.name(),
            rendered
        );
        if let Some(composite) = self.depth_composite.as_mut() {
            composite.render(pass);
        }
        Some(rendered)
    }

    /// Ask every delegate to free its backend resources
    pub fn release_resources(&mut self, backend: &mut B) {
        if let Some(opaque) = self.opaque.as_mut() {
            opaque.release_resources(backend);
        }
        if let Some(composite) = self.depth_composite.as_mut() {
            composite.release_resources(backend);
        }
    }
}

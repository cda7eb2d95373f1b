//! Shadow map baker
//!
//! Decides once per frame whether the cached shadow maps are stale and, if
//! so, renders one depth map per shadow-casting light.
//!
//! # Frame flow
//!
//! 1. Without an opaque delegate there is nothing to render with.
//! 2. The first frame checks backend capabilities; a missing one disables
//!    baking for the lifetime of the baker.
//! 3. A light, a receiver and a visible occluder must all be present.
//! 4. If anything in the scene changed since the last bake, every map is
//!    rebaked. Textures are allocated first; then, under scope guards,
//!    each light gets its target bound, its camera fitted and the
//!    delegates run in depth-only state.

use umbra_core::TimeStamp;

use crate::backend::{
    Capability, DepthTextureDesc, OffscreenScope, PolygonOffset, RenderState, RenderStateScope,
    ShadowBackend,
};
use crate::cache::{ShadowMapCache, ShadowMapEntry};
use crate::classify::shadow_casting_lights;
use crate::config::{ShadowBakeConfig, MAX_RESOLUTION, MIN_RESOLUTION};
use crate::data::GpuShadowMap;
use crate::delegate::{DelegateSet, PassContext, RenderDelegate};
use crate::error::{ShadowError, ShadowResult};
use crate::frustum::build_camera;
use crate::invalidation::{needs_rebuild, NoShadowReason, SceneScan};
use crate::scene::{Light, Prop, Scene};

/// Where the baker stands relative to the scene
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BakePhase {
    /// Maps match the scene as of the last bake
    UpToDate,
    /// Maps are missing or stale
    NeedsRebuild,
    /// Inside a bake
    Baking,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Support {
    Unchecked,
    Supported,
    Unsupported(Capability),
}

/// What [`ShadowMapBaker::render`] did this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BakeOutcome {
    /// Baking is disabled for the session
    Unsupported(Capability),
    /// No opaque delegate is configured
    NoDelegate,
    /// The scene cannot produce shadows this frame
    NoShadows(NoShadowReason),
    /// Cached maps are still valid
    UpToDate,
    /// Every map was rebaked
    Baked { maps: usize, rendered_props: usize },
    /// The backend failed mid-bake; see [`ShadowMapBaker::take_diagnostics`]
    Failed,
}

/// Baker statistics
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BakeStats {
    /// Calls to `render`
    pub frames: u64,
    /// Completed bakes
    pub bakes: u64,
    /// Shadow maps rendered across all bakes
    pub maps_rendered: u64,
    /// Depth textures created
    pub textures_allocated: u64,
    /// Times the cache was rebuilt for a new light count
    pub cache_rebuilds: u64,
    /// Frames skipped for lack of a light, receiver or occluder
    pub frames_without_shadows: u64,
    /// Bakes aborted by a backend error
    pub failures: u64,
}

/// Per-light shadow map baking stage
pub struct ShadowMapBaker<B: ShadowBackend> {
    config: ShadowBakeConfig,
    delegates: DelegateSet<B>,
    cache: ShadowMapCache<B::DepthTexture>,
    support: Support,
    phase: BakePhase,
    last_bake: TimeStamp,
    has_shadows: bool,
    need_update: bool,
    rendered_props: usize,
    warned_no_delegate: bool,
    stats: BakeStats,
    diagnostics: Vec<ShadowError>,
}

impl<B: ShadowBackend> Default for ShadowMapBaker<B> {
    fn default() -> Self {
        Self::with_config(ShadowBakeConfig::default())
    }
}

impl<B: ShadowBackend> ShadowMapBaker<B> {
    /// Create a baker, rejecting configurations that cannot be baked with
    pub fn new(config: ShadowBakeConfig) -> ShadowResult<Self> {
        config.check()?;
        Ok(Self::with_config(config))
    }

    fn with_config(config: ShadowBakeConfig) -> Self {
        Self {
            config,
            delegates: DelegateSet::new(),
            cache: ShadowMapCache::new(),
            support: Support::Unchecked,
            phase: BakePhase::NeedsRebuild,
            last_bake: TimeStamp::NEVER,
            has_shadows: false,
            need_update: true,
            rendered_props: 0,
            warned_no_delegate: false,
            stats: BakeStats::default(),
            diagnostics: Vec::new(),
        }
    }

    pub fn with_opaque_delegate(mut self, delegate: impl RenderDelegate<B> + 'static) -> Self {
        self.set_opaque_delegate(Some(Box::new(delegate)));
        self
    }

    pub fn with_depth_composite_delegate(mut self, delegate: impl RenderDelegate<B> + 'static) -> Self {
        self.set_depth_composite_delegate(Some(Box::new(delegate)));
        self
    }

    /// Replace the delegate that renders occluders, returning the old one
    pub fn set_opaque_delegate(
        &mut self,
        delegate: Option<Box<dyn RenderDelegate<B>>>,
    ) -> Option<Box<dyn RenderDelegate<B>>> {
        self.warned_no_delegate = false;
        self.delegates.set_opaque(delegate)
    }

    /// Replace the delegate run after the opaque one on each map
    pub fn set_depth_composite_delegate(
        &mut self,
        delegate: Option<Box<dyn RenderDelegate<B>>>,
    ) -> Option<Box<dyn RenderDelegate<B>>> {
        self.delegates.set_depth_composite(delegate)
    }

    #[inline]
    pub fn config(&self) -> &ShadowBakeConfig {
        &self.config
    }

    /// Replace the whole configuration; maps are rebaked on the next frame
    pub fn set_config(&mut self, config: ShadowBakeConfig) -> ShadowResult<()> {
        config.check()?;
        if config != self.config {
            self.config = config;
            self.invalidate();
        }
        Ok(())
    }

    /// Set the shadow map edge length
    pub fn set_resolution(&mut self, resolution: u32) -> ShadowResult<()> {
        if !(MIN_RESOLUTION..=MAX_RESOLUTION).contains(&resolution) {
            return Err(ShadowError::InvalidConfig(format!(
                "resolution {} outside {}..={}",
                resolution, MIN_RESOLUTION, MAX_RESOLUTION
            )));
        }
        self.set_config(ShadowBakeConfig {
            resolution,
            ..self.config.clone()
        })
    }

    /// Set the depth bias used while rendering occluders
    pub fn set_polygon_offset(&mut self, factor: f32, units: f32) -> ShadowResult<()> {
        self.set_config(ShadowBakeConfig {
            polygon_offset_factor: factor,
            polygon_offset_units: units,
            ..self.config.clone()
        })
    }

    /// Maps can be sampled this frame
    #[inline]
    pub fn has_shadows(&self) -> bool {
        self.has_shadows
    }

    /// Maps were rebaked and the consumer has not acknowledged it yet
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.need_update
    }

    /// Acknowledge the latest bake
    #[inline]
    pub fn mark_up_to_date(&mut self) {
        self.need_update = false;
    }

    #[inline]
    pub fn phase(&self) -> BakePhase {
        self.phase
    }

    /// Stamp of the last completed bake
    #[inline]
    pub fn last_bake_time(&self) -> TimeStamp {
        self.last_bake
    }

    /// Baking was disabled by a failed capability check
    #[inline]
    pub fn is_disabled(&self) -> bool {
        matches!(self.support, Support::Unsupported(_))
    }

    /// Props rendered by the opaque delegate during the last bake
    #[inline]
    pub fn rendered_prop_count(&self) -> usize {
        self.rendered_props
    }

    /// Shadow maps in light discovery order
    #[inline]
    pub fn entries(&self) -> &[ShadowMapEntry<B::DepthTexture>] {
        self.cache.entries()
    }

    /// Uniforms for every baked map, in entry order
    pub fn gpu_shadow_maps(&self) -> Vec<GpuShadowMap> {
        self.cache
            .entries()
            .iter()
            .filter_map(|entry| {
                entry
                    .camera()
                    .map(|camera| GpuShadowMap::from_camera(camera, entry.resolution()))
            })
            .collect()
    }

    #[inline]
    pub fn stats(&self) -> &BakeStats {
        &self.stats
    }

    /// Drain errors recorded since the last call
    pub fn take_diagnostics(&mut self) -> Vec<ShadowError> {
        core::mem::take(&mut self.diagnostics)
    }

    /// Run the stage for one frame
    pub fn render(&mut self, backend: &mut B, scene: &Scene) -> BakeOutcome {
        self.stats.frames += 1;
        self.rendered_props = 0;

        if !self.delegates.has_opaque() {
            if !self.warned_no_delegate {
                log::warn!("Shadow map baker has no delegate, shadows disabled");
                self.warned_no_delegate = true;
            }
            self.has_shadows = false;
            return BakeOutcome::NoDelegate;
        }

        if let Err(capability) = self.preflight(backend) {
            self.has_shadows = false;
            return BakeOutcome::Unsupported(capability);
        }

        let scan = SceneScan::scan(scene);
        if let Some(reason) = scan.missing() {
            log::debug!("No shadows this frame: {}", reason);
            self.has_shadows = false;
            self.stats.frames_without_shadows += 1;
            return BakeOutcome::NoShadows(reason);
        }
        self.has_shadows = true;

        self.need_update = needs_rebuild(self.last_bake, &scene.lights, &scene.props);
        if !self.need_update {
            self.phase = BakePhase::UpToDate;
            return BakeOutcome::UpToDate;
        }
        self.phase = BakePhase::NeedsRebuild;

        match self.bake(backend, scene, &scan.occluders) {
            Ok(maps) => {
                self.stats.bakes += 1;
                self.stats.maps_rendered += maps as u64;
                BakeOutcome::Baked {
                    maps,
                    rendered_props: self.rendered_props,
                }
            }
            Err(err) => {
                log::warn!("Shadow map bake failed: {}", err);
                self.has_shadows = false;
                self.phase = BakePhase::NeedsRebuild;
                self.stats.failures += 1;
                // partially rendered maps must not be sampled
                for texture in self.cache.drain_textures() {
                    backend.destroy_depth_texture(texture);
                }
                self.diagnostics.push(err);
                BakeOutcome::Failed
            }
        }
    }

    /// Release every backend resource held by the baker and its delegates
    ///
    /// The next qualifying frame rebakes from scratch.
    pub fn release_resources(&mut self, backend: &mut B) {
        self.delegates.release_resources(backend);
        backend.release_offscreen_target();
        for texture in self.cache.drain_textures() {
            backend.destroy_depth_texture(texture);
        }
        self.has_shadows = false;
        self.invalidate();
    }

    fn invalidate(&mut self) {
        self.last_bake = TimeStamp::NEVER;
        self.phase = BakePhase::NeedsRebuild;
    }

    fn preflight(&mut self, backend: &B) -> Result<(), Capability> {
        match self.support {
            Support::Supported => Ok(()),
            Support::Unsupported(capability) => Err(capability),
            Support::Unchecked => match backend.capabilities().first_missing() {
                None => {
                    self.support = Support::Supported;
                    Ok(())
                }
                Some(capability) => {
                    log::error!("{} not supported by the context. Cannot use shadow mapping.", capability);
                    self.support = Support::Unsupported(capability);
                    self.diagnostics.push(ShadowError::Unsupported(capability));
                    Err(capability)
                }
            },
        }
    }

    fn bake(&mut self, backend: &mut B, scene: &Scene, occluders: &[&Prop]) -> ShadowResult<usize> {
        debug_assert!(!occluders.is_empty());
        self.phase = BakePhase::Baking;

        let lights: Vec<&Light> = shadow_casting_lights(&scene.lights).collect();
        if let Some(discarded) = self.cache.resize(lights.len()) {
            if !discarded.is_empty() {
                log::debug!(
                    "Shadow light count changed to {}, discarding {} shadow maps",
                    lights.len(),
                    discarded.len()
                );
            }
            for texture in discarded {
                backend.destroy_depth_texture(texture);
            }
            self.stats.cache_rebuilds += 1;
        }

        // Allocate before binding anything so a failed allocation leaves
        // the context untouched
        let resolution = self.config.resolution;
        for index in 0..lights.len() {
            let entry = self
                .cache
                .get_mut(index)
                .ok_or(ShadowError::MissingTexture { index })?;
            if entry.needs_allocation(resolution) {
                let desc = DepthTextureDesc::shadow_map(index, resolution, self.config.depth_format);
                let texture = backend.create_depth_texture(&desc)?;
                if let Some(old) = entry.replace_texture(texture, resolution) {
                    backend.destroy_depth_texture(old);
                }
                self.stats.textures_allocated += 1;
            }
        }

        let bounds = scene.props.bounds();
        let offset = PolygonOffset {
            factor: self.config.polygon_offset_factor,
            units: self.config.polygon_offset_units,
        };

        let mut state = RenderStateScope::new(backend);
        state.restore_without_polygon_offset();
        let unscissored = RenderState {
            scissor_test: false,
            ..state.saved()
        };
        state.apply_render_state(&unscissored);

        let mut target = OffscreenScope::new(&mut *state);
        for (index, light) in lights.iter().enumerate() {
            let entry = self
                .cache
                .get_mut(index)
                .ok_or(ShadowError::MissingTexture { index })?;
            let texture = entry.texture().ok_or(ShadowError::MissingTexture { index })?;
            target.bind_depth_target(texture, resolution, resolution)?;

            let camera = build_camera(light, &bounds);
            let rendered = {
                let mut pass_state = RenderStateScope::new(&mut *target);
                let depth_only = pass_state.saved().depth_only(offset);
                pass_state.apply_render_state(&depth_only);

                let mut pass = PassContext {
                    backend: &mut *pass_state,
                    camera: &camera,
                    props: occluders,
                    light_index: index,
                    resolution,
                };
                self.delegates.render(&mut pass).ok_or(ShadowError::NoDelegate)?
            };
            self.rendered_props += rendered;

            log::trace!(
                "Baked shadow map {} for light {} (near {:.3}, far {:.3})",
                index,
                light.id(),
                camera.near,
                camera.far
            );
            entry.set_camera(light.id(), camera);
        }
        drop(target);
        drop(state);

        self.last_bake = TimeStamp::now();
        self.phase = BakePhase::UpToDate;
        Ok(lights.len())
    }
}

impl<B: ShadowBackend> Drop for ShadowMapBaker<B> {
    fn drop(&mut self) {
        if self.cache.allocated() > 0 {
            log::warn!(
                "Shadow map baker dropped with {} live shadow maps; call release_resources() first",
                self.cache.allocated()
            );
        }
    }
}

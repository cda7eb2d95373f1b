//! Shadow map cache
//!
//! One entry per shadow-casting light, in discovery order. Entries are never
//! patched individually: when the number of shadow-casting lights changes
//! the whole cache is thrown away and rebuilt.

use umbra_core::Id;

use crate::camera::ShadowCamera;

/// Depth texture and camera of one light
#[derive(Debug)]
pub struct ShadowMapEntry<T> {
    texture: Option<T>,
    resolution: u32,
    light: Id,
    camera: Option<ShadowCamera>,
}

impl<T> ShadowMapEntry<T> {
    fn empty() -> Self {
        Self {
            texture: None,
            resolution: 0,
            light: Id::null(),
            camera: None,
        }
    }

    #[inline]
    pub fn texture(&self) -> Option<&T> {
        self.texture.as_ref()
    }

    /// Camera the map was last rendered from
    #[inline]
    pub fn camera(&self) -> Option<&ShadowCamera> {
        self.camera.as_ref()
    }

    /// Light the map was last rendered for
    #[inline]
    pub fn light_id(&self) -> Id {
        self.light
    }

    /// Edge length of the current texture, 0 if none
    #[inline]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Both a texture and a camera are present
    #[inline]
    pub fn is_baked(&self) -> bool {
        self.texture.is_some() && self.camera.is_some()
    }

    /// Missing, or allocated at a different size
    #[inline]
    pub fn needs_allocation(&self, resolution: u32) -> bool {
        self.texture.is_none() || self.resolution != resolution
    }

    /// Install a texture, returning the one it replaces
    pub fn replace_texture(&mut self, texture: T, resolution: u32) -> Option<T> {
        self.resolution = resolution;
        self.texture.replace(texture)
    }

    /// Take the texture out, leaving the entry unallocated
    pub fn take_texture(&mut self) -> Option<T> {
        self.resolution = 0;
        self.texture.take()
    }

    pub fn set_camera(&mut self, light: Id, camera: ShadowCamera) {
        self.light = light;
        self.camera = Some(camera);
    }
}

/// Ordered shadow map storage
#[derive(Debug)]
pub struct ShadowMapCache<T> {
    entries: Vec<ShadowMapEntry<T>>,
}

impl<T> Default for ShadowMapCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ShadowMapCache<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[ShadowMapEntry<T>] {
        &self.entries
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&ShadowMapEntry<T>> {
        self.entries.get(index)
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut ShadowMapEntry<T>> {
        self.entries.get_mut(index)
    }

    /// Number of entries holding a texture
    pub fn allocated(&self) -> usize {
        self.entries.iter().filter(|e| e.texture.is_some()).count()
    }

    /// Rebuild with `count` empty entries if the size differs
    ///
    /// Returns `None` when the cache already has `count` entries. Otherwise
    /// every entry is discarded and the textures they held are returned for
    /// the caller to destroy.
    pub fn resize(&mut self, count: usize) -> Option<Vec<T>> {
        if self.entries.len() == count {
            return None;
        }
        let discarded = self.drain_textures();
        self.entries.resize_with(count, ShadowMapEntry::empty);
        Some(discarded)
    }

    /// Remove every entry, returning the textures they held
    pub fn drain_textures(&mut self) -> Vec<T> {
        self.entries
            .drain(..)
            .filter_map(|mut entry| entry.texture.take())
            .collect()
    }
}

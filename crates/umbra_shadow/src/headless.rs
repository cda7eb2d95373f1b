//! Headless backend
//!
//! Implements [`ShadowBackend`] without a GPU. Texture handles are plain
//! integers and every state change is recorded, which makes it useful for
//! tests and for running scenes on machines without a graphics context.

use crate::backend::{Capabilities, DepthTextureDesc, RenderState, ShadowBackend};
use crate::error::BackendError;

/// Texture handle of the headless backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HeadlessTexture {
    pub handle: u32,
    pub width: u32,
    pub height: u32,
}

/// Draw buffer selection
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DrawBuffer {
    #[default]
    Back,
    Front,
    None,
}

/// One recorded backend call
#[derive(Clone, Debug, PartialEq)]
pub enum BackendEvent {
    CreateTexture { handle: u32, width: u32, height: u32 },
    DestroyTexture(u32),
    BindTarget(u32),
    UnbindTarget,
    SetDrawTarget(DrawBuffer),
    ApplyState(RenderState),
    ReleaseTarget,
}

/// GPU-less [`ShadowBackend`]
#[derive(Debug)]
pub struct HeadlessBackend {
    capabilities: Capabilities,
    state: RenderState,
    draw_target: DrawBuffer,
    bound: Option<u32>,
    next_handle: u32,
    live: Vec<u32>,
    events: Vec<BackendEvent>,
    fail_create: bool,
    fail_bind_at: Option<usize>,
    bind_count: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        log::debug!("Using headless shadow backend");
        Self {
            capabilities: Capabilities::all(),
            state: RenderState::default(),
            draw_target: DrawBuffer::Back,
            bound: None,
            next_handle: 1,
            live: Vec::new(),
            events: Vec::new(),
            fail_create: false,
            fail_bind_at: None,
            bind_count: 0,
        }
    }

    /// Report a reduced feature set
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Make every texture allocation fail
    pub fn fail_texture_creation(&mut self, fail: bool) {
        self.fail_create = fail;
    }

    /// Make the `n`th target bind from now on fail (0 = the next one)
    pub fn fail_bind_at(&mut self, n: Option<usize>) {
        self.fail_bind_at = n.map(|n| self.bind_count + n);
    }

    /// Recorded calls, oldest first
    pub fn events(&self) -> &[BackendEvent] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Handle of the texture attached to the offscreen target
    pub fn bound_texture(&self) -> Option<u32> {
        self.bound
    }

    /// Textures created and not yet destroyed
    pub fn live_textures(&self) -> usize {
        self.live.len()
    }

    /// Number of texture allocations in the recorded events
    pub fn textures_created(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, BackendEvent::CreateTexture { .. }))
            .count()
    }
}

impl ShadowBackend for HeadlessBackend {
    type DepthTexture = HeadlessTexture;
    type DrawTarget = DrawBuffer;

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn create_depth_texture(&mut self, desc: &DepthTextureDesc) -> Result<HeadlessTexture, BackendError> {
        if self.fail_create {
            return Err(BackendError::new("create_depth_texture", format!("cannot allocate {}", desc.label)));
        }
        if desc.width == 0 || desc.height == 0 {
            return Err(BackendError::new("create_depth_texture", "zero-sized texture"));
        }
        let handle = self.next_handle;
        self.next_handle += 1;
        self.live.push(handle);
        self.events.push(BackendEvent::CreateTexture {
            handle,
            width: desc.width,
            height: desc.height,
        });
        Ok(HeadlessTexture {
            handle,
            width: desc.width,
            height: desc.height,
        })
    }

    fn destroy_depth_texture(&mut self, texture: HeadlessTexture) {
        self.live.retain(|&h| h != texture.handle);
        self.events.push(BackendEvent::DestroyTexture(texture.handle));
    }

    fn bind_depth_target(&mut self, texture: &HeadlessTexture, width: u32, height: u32) -> Result<(), BackendError> {
        let attempt = self.bind_count;
        self.bind_count += 1;
        if self.fail_bind_at == Some(attempt) {
            return Err(BackendError::new("bind_depth_target", "framebuffer incomplete"));
        }
        if !self.live.contains(&texture.handle) {
            return Err(BackendError::new(
                "bind_depth_target",
                format!("texture {} was destroyed", texture.handle),
            ));
        }
        if (width, height) != (texture.width, texture.height) {
            return Err(BackendError::new(
                "bind_depth_target",
                format!(
                    "viewport {}x{} does not match texture {}x{}",
                    width, height, texture.width, texture.height
                ),
            ));
        }
        self.bound = Some(texture.handle);
        self.draw_target = DrawBuffer::None;
        self.events.push(BackendEvent::BindTarget(texture.handle));
        Ok(())
    }

    fn unbind_target(&mut self) {
        self.bound = None;
        self.events.push(BackendEvent::UnbindTarget);
    }

    fn draw_target(&self) -> DrawBuffer {
        self.draw_target
    }

    fn set_draw_target(&mut self, target: DrawBuffer) {
        self.draw_target = target;
        self.events.push(BackendEvent::SetDrawTarget(target));
    }

    fn render_state(&self) -> RenderState {
        self.state
    }

    fn apply_render_state(&mut self, state: &RenderState) {
        self.state = *state;
        self.events.push(BackendEvent::ApplyState(*state));
    }

    fn release_offscreen_target(&mut self) {
        self.events.push(BackendEvent::ReleaseTarget);
    }
}

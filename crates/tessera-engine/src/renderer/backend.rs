use std::fmt;
use std::path::Path;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec4;

use super::buffer::{IndexBuffer, VertexBuffer};
use super::shader::Shader;
use super::texture::Texture2D;
use super::vertex_array::VertexArray;
use super::RenderError;

/// Process-unique handle of a backend resource.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceId(u64);

impl ResourceId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum GraphicsApi {
    Wgpu,
    Headless,
}

/// Creates every resource family for one backend.
pub trait ResourceFactory {
    fn create_vertex_buffer(&self, vertices: &[f32]) -> Result<Rc<dyn VertexBuffer>, RenderError>;

    fn create_index_buffer(&self, indices: &[u32]) -> Result<Rc<dyn IndexBuffer>, RenderError>;

    fn create_vertex_array(&self) -> Result<Rc<dyn VertexArray>, RenderError>;

    /// Empty RGBA8 texture, contents undefined until `set_data`.
    fn create_texture(&self, width: u32, height: u32) -> Result<Rc<dyn Texture2D>, RenderError>;

    fn load_texture(&self, path: &Path) -> Result<Rc<dyn Texture2D>, RenderError>;

    /// Loads a combined `#type` source file; the name is the file stem.
    fn load_shader(&self, path: &Path) -> Result<Rc<dyn Shader>, RenderError>;

    fn create_shader(
        &self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Rc<dyn Shader>, RenderError>;
}

/// Render commands.
///
/// Draws act on whatever shader and textures are currently bound, as in an
/// immediate-mode context.
pub trait RendererApi {
    fn init(&mut self) -> Result<(), RenderError>;

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn set_clear_color(&mut self, color: Vec4);

    fn clear(&mut self);

    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError>;

    /// Surface-backed implementations reconfigure here.
    fn resize_surface(&mut self, _width: u32, _height: u32) {}

    /// Finishes the frame.
    fn present(&mut self) -> Result<(), RenderError>;
}

/// A complete backend: resource creation plus commands.
pub trait RendererBackend: ResourceFactory + RendererApi {
    fn api(&self) -> GraphicsApi;
}

/// Maximum number of texture units.
pub const MAX_TEXTURE_SLOTS: usize = 16;

/// Emulated bind points shared between a backend and its resources.
pub(crate) struct BindState<P, T> {
    pub program: Option<Rc<P>>,
    pub textures: [Option<T>; MAX_TEXTURE_SLOTS],
    pub vertex_array: Option<ResourceId>,
    pub vertex_buffer: Option<ResourceId>,
    pub index_buffer: Option<ResourceId>,
}

impl<P, T> Default for BindState<P, T> {
    fn default() -> Self {
        Self {
            program: None,
            textures: std::array::from_fn(|_| None),
            vertex_array: None,
            vertex_buffer: None,
            index_buffer: None,
        }
    }
}

impl<P, T> BindState<P, T> {
    pub(crate) fn bind_texture(&mut self, slot: u32, texture: T) {
        match self.textures.get_mut(slot as usize) {
            Some(entry) => *entry = Some(texture),
            None => log::warn!("texture slot {slot} out of range (max {MAX_TEXTURE_SLOTS})"),
        }
    }

    pub(crate) fn texture(&self, slot: u32) -> Option<&T> {
        self.textures.get(slot as usize).and_then(Option::as_ref)
    }
}

use std::path::Path;
use std::rc::Rc;

use glam::{Mat4, Vec4};

use super::backend::{GraphicsApi, RendererBackend};
use super::buffer::{IndexBuffer, VertexBuffer};
use super::camera::OrthographicCamera;
use super::renderer2d::{Renderer2D, Renderer2DStorage};
use super::shader::Shader;
use super::texture::Texture2D;
use super::vertex_array::VertexArray;
use super::RenderError;

#[derive(Debug, Clone, Copy)]
struct SceneData {
    view_projection: Mat4,
}

/// Owns the bound backend and the per-scene state.
///
/// Every resource is created through here; before [`Renderer::init`] the
/// factory methods fail with [`RenderError::CreatorNotBound`].
pub struct Renderer {
    backend: Option<Box<dyn RendererBackend>>,
    scene: SceneData,
    storage_2d: Option<Renderer2DStorage>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// An unbound renderer.
    pub fn new() -> Self {
        Self {
            backend: None,
            scene: SceneData {
                view_projection: Mat4::IDENTITY,
            },
            storage_2d: None,
        }
    }

    /// Binds `backend` and builds the 2D storage. A second call is ignored.
    pub fn init(&mut self, mut backend: Box<dyn RendererBackend>) -> Result<(), RenderError> {
        if self.backend.is_some() {
            log::warn!("renderer already bound; ignoring second init");
            return Ok(());
        }

        backend.init()?;
        log::info!("renderer bound to {:?} backend", backend.api());

        let storage = Renderer2DStorage::new(backend.as_ref())?;
        self.backend = Some(backend);
        self.storage_2d = Some(storage);
        Ok(())
    }

    /// Releases 2D storage first, then the backend.
    pub fn shutdown(&mut self) {
        self.storage_2d = None;
        if self.backend.take().is_some() {
            log::info!("renderer shut down");
        }
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.backend.is_some()
    }

    pub fn api(&self) -> Option<GraphicsApi> {
        self.backend.as_ref().map(|b| b.api())
    }

    fn backend(&self) -> Result<&dyn RendererBackend, RenderError> {
        self.backend.as_deref().ok_or(RenderError::CreatorNotBound)
    }

    fn backend_mut(&mut self) -> Result<&mut (dyn RendererBackend + 'static), RenderError> {
        self.backend.as_deref_mut().ok_or(RenderError::CreatorNotBound)
    }

    pub fn create_vertex_buffer(&self, vertices: &[f32]) -> Result<Rc<dyn VertexBuffer>, RenderError> {
        self.backend()?.create_vertex_buffer(vertices)
    }

    pub fn create_index_buffer(&self, indices: &[u32]) -> Result<Rc<dyn IndexBuffer>, RenderError> {
        self.backend()?.create_index_buffer(indices)
    }

    pub fn create_vertex_array(&self) -> Result<Rc<dyn VertexArray>, RenderError> {
        self.backend()?.create_vertex_array()
    }

    pub fn create_texture(&self, width: u32, height: u32) -> Result<Rc<dyn Texture2D>, RenderError> {
        self.backend()?.create_texture(width, height)
    }

    pub fn load_texture(&self, path: impl AsRef<Path>) -> Result<Rc<dyn Texture2D>, RenderError> {
        self.backend()?.load_texture(path.as_ref())
    }

    pub fn load_shader(&self, path: impl AsRef<Path>) -> Result<Rc<dyn Shader>, RenderError> {
        self.backend()?.load_shader(path.as_ref())
    }

    pub fn create_shader(
        &self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        self.backend()?.create_shader(name, vertex_src, fragment_src)
    }

    /// Reconfigures the surface and resets the viewport to cover it.
    pub fn on_window_resize(&mut self, width: u32, height: u32) {
        let Ok(backend) = self.backend_mut() else { return };
        backend.resize_surface(width, height);
        backend.set_viewport(0, 0, width, height);
    }

    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        if let Ok(backend) = self.backend_mut() {
            backend.set_viewport(x, y, width, height);
        }
    }

    pub fn set_clear_color(&mut self, color: Vec4) {
        if let Ok(backend) = self.backend_mut() {
            backend.set_clear_color(color);
        }
    }

    pub fn clear(&mut self) {
        if let Ok(backend) = self.backend_mut() {
            backend.clear();
        }
    }

    pub fn present(&mut self) -> Result<(), RenderError> {
        self.backend_mut()?.present()
    }

    /// Opens a scene. Scenes do not nest; a second `begin_scene` simply
    /// replaces the view-projection.
    pub fn begin_scene(&mut self, camera: &OrthographicCamera) {
        let _span = tracing::trace_span!("Renderer::begin_scene").entered();
        self.scene.view_projection = camera.view_projection_matrix();
    }

    /// Flush point for the scene; draws are already submitted.
    pub fn end_scene(&mut self) {}

    pub fn scene_view_projection(&self) -> Mat4 {
        self.scene.view_projection
    }

    /// Binds `shader`, uploads the scene and model matrices and draws.
    pub fn submit(
        &mut self,
        shader: &dyn Shader,
        vertex_array: &dyn VertexArray,
        transform: Mat4,
    ) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("Renderer::submit").entered();
        let view_projection = self.scene.view_projection;
        let backend = self.backend_mut()?;
        shader.bind();
        shader.set_mat4("u_ViewProjection", view_projection);
        shader.set_mat4("u_Transform", transform);
        vertex_array.bind();
        backend.draw_indexed(vertex_array)
    }

    pub(crate) fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        self.backend_mut()?.draw_indexed(vertex_array)
    }

    pub(crate) fn storage_2d(&self) -> Option<&Renderer2DStorage> {
        self.storage_2d.as_ref()
    }

    /// Quad drawing on top of this renderer.
    pub fn renderer_2d(&mut self) -> Renderer2D<'_> {
        Renderer2D::new(self)
    }
}

use std::rc::Rc;

use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

use super::backend::RendererBackend;
use super::buffer::{BufferElement, BufferLayout, ShaderDataType};
use super::camera::OrthographicCamera;
use super::scene::Renderer;
use super::shader::{Shader, ShaderStage, preprocess};
use super::texture::Texture2D;
use super::vertex_array::VertexArray;
use super::RenderError;

const TEXTURE_SHADER: &str = include_str!("shaders/texture.wgsl");

#[rustfmt::skip]
const QUAD_VERTICES: [f32; 5 * 4] = [
    -0.5, -0.5, 0.0, 0.0, 0.0,
     0.5, -0.5, 0.0, 1.0, 0.0,
     0.5,  0.5, 0.0, 1.0, 1.0,
    -0.5,  0.5, 0.0, 0.0, 1.0,
];

const QUAD_INDICES: [u32; 6] = [0, 1, 2, 2, 3, 0];

/// Resources shared by every quad draw.
pub(crate) struct Renderer2DStorage {
    pub quad: Rc<dyn VertexArray>,
    pub white_texture: Rc<dyn Texture2D>,
    pub texture_shader: Rc<dyn Shader>,
}

impl Renderer2DStorage {
    pub(crate) fn new(backend: &dyn RendererBackend) -> Result<Self, RenderError> {
        let quad = backend.create_vertex_array()?;
        let vertices = backend.create_vertex_buffer(&QUAD_VERTICES)?;
        vertices.set_layout(BufferLayout::new([
            BufferElement::new(ShaderDataType::Float3, "a_Position"),
            BufferElement::new(ShaderDataType::Float2, "a_TexCoord"),
        ]));
        quad.add_vertex_buffer(vertices)?;
        quad.set_index_buffer(backend.create_index_buffer(&QUAD_INDICES)?);

        let white_texture = backend.create_texture(1, 1)?;
        white_texture.set_data(&[u8::MAX; 4])?;

        let sources = preprocess(TEXTURE_SHADER)?;
        let fragment = sources
            .get(ShaderStage::Fragment)
            .ok_or_else(|| RenderError::ShaderSyntax("texture shader has no fragment stage".into()))?;
        let vertex = sources
            .get(ShaderStage::Vertex)
            .ok_or_else(|| RenderError::ShaderSyntax("texture shader has no vertex stage".into()))?;
        let texture_shader = backend.create_shader("Texture", vertex, fragment)?;
        texture_shader.bind();
        texture_shader.set_int("u_Texture", 0);

        log::debug!("renderer2d storage ready");
        Ok(Self {
            quad,
            white_texture,
            texture_shader,
        })
    }
}

/// Everything one quad draw needs.
#[derive(Clone, Copy)]
pub struct QuadParams<'t> {
    pub position: Vec3,
    pub size: Vec2,
    /// Radians around +Z.
    pub rotation: f32,
    /// `None` draws with the white texture.
    pub texture: Option<&'t dyn Texture2D>,
    pub tiling: f32,
    pub tint: Vec4,
}

impl<'t> QuadParams<'t> {
    pub fn colored(position: Vec3, size: Vec2, color: Vec4) -> Self {
        Self {
            position,
            size,
            rotation: 0.0,
            texture: None,
            tiling: 1.0,
            tint: color,
        }
    }

    pub fn textured(position: Vec3, size: Vec2, texture: &'t dyn Texture2D, tiling: f32, tint: Vec4) -> Self {
        Self {
            texture: Some(texture),
            tiling,
            ..Self::colored(position, size, tint)
        }
    }

    pub fn rotated(mut self, radians: f32) -> Self {
        self.rotation = radians;
        self
    }

    /// Translate, then rotate around Z, then scale.
    pub fn transform(&self) -> Mat4 {
        let translation = Mat4::from_translation(self.position);
        let scale = Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0));
        if self.rotation == 0.0 {
            translation * scale
        } else {
            translation * Mat4::from_quat(Quat::from_rotation_z(self.rotation)) * scale
        }
    }
}

/// Quad helpers over a bound [`Renderer`].
///
/// Every variant funnels into one submission path; untextured quads use the
/// white texture so colored and textured draws share it.
pub struct Renderer2D<'r> {
    renderer: &'r mut Renderer,
}

impl<'r> Renderer2D<'r> {
    pub(crate) fn new(renderer: &'r mut Renderer) -> Self {
        Self { renderer }
    }

    pub fn white_texture(&self) -> Option<Rc<dyn Texture2D>> {
        self.renderer.storage_2d().map(|s| s.white_texture.clone())
    }

    pub fn texture_shader(&self) -> Option<Rc<dyn Shader>> {
        self.renderer.storage_2d().map(|s| s.texture_shader.clone())
    }

    pub fn begin_scene(&mut self, camera: &OrthographicCamera) {
        let _span = tracing::trace_span!("Renderer2D::begin_scene").entered();
        self.renderer.begin_scene(camera);
        let Some(storage) = self.renderer.storage_2d() else {
            not_initialized();
            return;
        };
        storage.texture_shader.bind();
        storage
            .texture_shader
            .set_mat4("u_ViewProjection", camera.view_projection_matrix());
    }

    pub fn end_scene(&mut self) {
        self.renderer.end_scene();
    }

    pub fn draw_quad(&mut self, position: Vec2, size: Vec2, color: Vec4) {
        self.draw_quad_3d(position.extend(0.0), size, color);
    }

    pub fn draw_quad_3d(&mut self, position: Vec3, size: Vec2, color: Vec4) {
        self.draw(&QuadParams::colored(position, size, color));
    }

    pub fn draw_textured_quad(
        &mut self,
        position: Vec2,
        size: Vec2,
        texture: &dyn Texture2D,
        tiling: f32,
        tint: Vec4,
    ) {
        self.draw_textured_quad_3d(position.extend(0.0), size, texture, tiling, tint);
    }

    pub fn draw_textured_quad_3d(
        &mut self,
        position: Vec3,
        size: Vec2,
        texture: &dyn Texture2D,
        tiling: f32,
        tint: Vec4,
    ) {
        self.draw(&QuadParams::textured(position, size, texture, tiling, tint));
    }

    pub fn draw_rotated_quad(&mut self, position: Vec2, size: Vec2, rotation: f32, color: Vec4) {
        self.draw_rotated_quad_3d(position.extend(0.0), size, rotation, color);
    }

    pub fn draw_rotated_quad_3d(&mut self, position: Vec3, size: Vec2, rotation: f32, color: Vec4) {
        self.draw(&QuadParams::colored(position, size, color).rotated(rotation));
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rotated_textured_quad(
        &mut self,
        position: Vec2,
        size: Vec2,
        rotation: f32,
        texture: &dyn Texture2D,
        tiling: f32,
        tint: Vec4,
    ) {
        self.draw_rotated_textured_quad_3d(position.extend(0.0), size, rotation, texture, tiling, tint);
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw_rotated_textured_quad_3d(
        &mut self,
        position: Vec3,
        size: Vec2,
        rotation: f32,
        texture: &dyn Texture2D,
        tiling: f32,
        tint: Vec4,
    ) {
        self.draw(&QuadParams::textured(position, size, texture, tiling, tint).rotated(rotation));
    }

    pub fn draw(&mut self, quad: &QuadParams<'_>) {
        if let Err(err) = self.submit_quad(quad.transform(), quad.texture, quad.tiling, quad.tint) {
            log::error!("quad draw failed: {err}");
        }
    }

    fn submit_quad(
        &mut self,
        transform: Mat4,
        texture: Option<&dyn Texture2D>,
        tiling: f32,
        tint: Vec4,
    ) -> Result<(), RenderError> {
        let _span = tracing::trace_span!("Renderer2D::submit_quad").entered();
        let Some(storage) = self.renderer.storage_2d() else {
            not_initialized();
            return Ok(());
        };
        let shader = storage.texture_shader.clone();
        let quad = storage.quad.clone();
        let white = storage.white_texture.clone();

        shader.bind();
        shader.set_mat4("u_Transform", transform);
        shader.set_float4("u_Color", tint);
        shader.set_float("u_TilingFactor", tiling);
        texture.unwrap_or(white.as_ref()).bind(0);
        quad.bind();
        self.renderer.draw_indexed(quad.as_ref())
    }
}

fn not_initialized() {
    log::error!("Renderer2D used before Renderer::init");
    debug_assert!(false, "Renderer2D used before Renderer::init");
}

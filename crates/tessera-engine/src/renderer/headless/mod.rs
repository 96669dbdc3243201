//! Backend without a GPU.
//!
//! Resources keep their data on the CPU and every command is appended to a
//! [`CommandLog`] so frames can be inspected in tests and CI.

mod command_log;
mod resources;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use glam::Vec4;

use super::backend::{GraphicsApi, RendererApi, RendererBackend, ResourceFactory};
use super::buffer::{IndexBuffer, VertexBuffer};
use super::shader::{Shader, ShaderProgram};
use super::texture::{Texture2D, TextureFormat, decode_image};
use super::vertex_array::VertexArray;
use super::RenderError;

pub use command_log::{CommandLog, DrawRecord, RenderCommand};
pub use resources::{
    HeadlessIndexBuffer, HeadlessShader, HeadlessTexture, HeadlessVertexArray,
    HeadlessVertexBuffer,
};

use resources::SharedState;

pub struct HeadlessBackend {
    state: SharedState,
    log: CommandLog,
    viewport: (u32, u32, u32, u32),
    clear_color: Vec4,
    initialized: bool,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(Default::default())),
            log: CommandLog::default(),
            viewport: (0, 0, 0, 0),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            initialized: false,
        }
    }

    /// Handle onto the command log; stays valid after the backend is boxed.
    pub fn command_log(&self) -> CommandLog {
        self.log.clone()
    }

    pub fn viewport(&self) -> (u32, u32, u32, u32) {
        self.viewport
    }

    pub fn clear_color(&self) -> Vec4 {
        self.clear_color
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl ResourceFactory for HeadlessBackend {
    fn create_vertex_buffer(&self, vertices: &[f32]) -> Result<Rc<dyn VertexBuffer>, RenderError> {
        Ok(Rc::new(HeadlessVertexBuffer::new(vertices, self.state.clone())))
    }

    fn create_index_buffer(&self, indices: &[u32]) -> Result<Rc<dyn IndexBuffer>, RenderError> {
        Ok(Rc::new(HeadlessIndexBuffer::new(indices, self.state.clone())))
    }

    fn create_vertex_array(&self) -> Result<Rc<dyn VertexArray>, RenderError> {
        Ok(Rc::new(HeadlessVertexArray::new(self.state.clone())))
    }

    fn create_texture(&self, width: u32, height: u32) -> Result<Rc<dyn Texture2D>, RenderError> {
        let format = TextureFormat::Rgba8;
        let pixels = vec![0; width as usize * height as usize * format.bytes_per_pixel()];
        Ok(Rc::new(HeadlessTexture::new(
            width,
            height,
            format,
            None,
            pixels,
            self.state.clone(),
        )))
    }

    fn load_texture(&self, path: &Path) -> Result<Rc<dyn Texture2D>, RenderError> {
        let image = decode_image(path)?;
        Ok(Rc::new(HeadlessTexture::new(
            image.width,
            image.height,
            image.format,
            Some(image.path),
            image.pixels,
            self.state.clone(),
        )))
    }

    fn load_shader(&self, path: &Path) -> Result<Rc<dyn Shader>, RenderError> {
        let program = ShaderProgram::from_file(path)?;
        log::debug!("headless: loaded shader `{}`", program.name);
        Ok(Rc::new(HeadlessShader::new(program, self.state.clone())))
    }

    fn create_shader(
        &self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        let program = ShaderProgram::from_stages(name, vertex_src, fragment_src)?;
        Ok(Rc::new(HeadlessShader::new(program, self.state.clone())))
    }
}

impl RendererApi for HeadlessBackend {
    fn init(&mut self) -> Result<(), RenderError> {
        self.initialized = true;
        self.log.push(RenderCommand::Init);
        Ok(())
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
        self.log.push(RenderCommand::SetViewport {
            x,
            y,
            width,
            height,
        });
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
        self.log.push(RenderCommand::SetClearColor(color));
    }

    fn clear(&mut self) {
        self.log.push(RenderCommand::Clear);
    }

    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        let index_buffer = vertex_array.index_buffer().ok_or(RenderError::NoIndexBuffer)?;

        let state = self.state.borrow();
        let (shader, uniforms, texture) = match state.program.as_ref() {
            Some(program) => {
                let snapshot = program.snapshot();
                let texture = state.texture(snapshot.texture_unit).copied();
                (Some(program.name.clone()), Some(snapshot), texture)
            }
            None => {
                log::warn!("draw_indexed with no shader bound");
                (None, None, state.texture(0).copied())
            }
        };
        drop(state);

        self.log.push(RenderCommand::DrawIndexed(DrawRecord {
            shader,
            vertex_array: vertex_array.native_id(),
            index_count: index_buffer.count(),
            texture,
            uniforms,
        }));
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.log.push(RenderCommand::ResizeSurface { width, height });
    }

    fn present(&mut self) -> Result<(), RenderError> {
        self.log.push(RenderCommand::Present);
        Ok(())
    }
}

impl RendererBackend for HeadlessBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Headless
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::buffer::{BufferElement, BufferLayout, ShaderDataType};

    const VS: &str = r#"
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Color: vec4<f32>,
};
@group(0) @binding(0) var<uniform> u: Uniforms;

@vertex
fn vs_main(@location(0) pos: vec3<f32>) -> @builtin(position) vec4<f32> {
    return u.u_ViewProjection * vec4<f32>(pos, 1.0);
}
"#;

    const FS: &str = r#"
struct Uniforms {
    u_ViewProjection: mat4x4<f32>,
    u_Color: vec4<f32>,
};
@group(0) @binding(0) var<uniform> u: Uniforms;
@group(1) @binding(0) var u_Texture: texture_2d<f32>;
@group(1) @binding(1) var u_Sampler: sampler;

@fragment
fn fs_main() -> @location(0) vec4<f32> {
    return u.u_Color * textureSample(u_Texture, u_Sampler, vec2<f32>(0.5, 0.5));
}
"#;

    fn triangle(backend: &HeadlessBackend) -> Rc<dyn VertexArray> {
        let vb = backend
            .create_vertex_buffer(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0])
            .unwrap();
        vb.set_layout(BufferLayout::new([BufferElement::new(
            ShaderDataType::Float3,
            "a_Position",
        )]));
        let va = backend.create_vertex_array().unwrap();
        va.add_vertex_buffer(vb).unwrap();
        va.set_index_buffer(backend.create_index_buffer(&[0, 1, 2]).unwrap());
        va
    }

    #[test]
    fn draw_without_index_buffer_fails() {
        let mut backend = HeadlessBackend::new();
        let va = backend.create_vertex_array().unwrap();
        assert!(matches!(
            backend.draw_indexed(va.as_ref()),
            Err(RenderError::NoIndexBuffer)
        ));
        assert!(backend.command_log().draws().is_empty());
    }

    #[test]
    fn draw_records_bound_state() {
        let mut backend = HeadlessBackend::new();
        let va = triangle(&backend);
        let shader = backend.create_shader("flat", VS, FS).unwrap();
        let texture = backend.create_texture(1, 1).unwrap();

        shader.bind();
        shader.set_float4("u_Color", Vec4::new(1.0, 0.5, 0.25, 1.0));
        shader.set_int("u_Texture", 3);
        texture.bind(3);
        va.bind();
        backend.draw_indexed(va.as_ref()).unwrap();

        // Later uploads must not alter what the earlier draw captured.
        shader.set_float4("u_Color", Vec4::ZERO);

        let draws = backend.command_log().draws();
        assert_eq!(draws.len(), 1);
        let draw = &draws[0];
        assert_eq!(draw.shader.as_deref(), Some("flat"));
        assert_eq!(draw.index_count, 3);
        assert_eq!(draw.texture, Some(texture.native_id()));
        let uniforms = draw.uniforms.as_ref().unwrap();
        assert_eq!(uniforms.texture_unit, 3);
        assert_eq!(uniforms.float4("u_Color"), Some(Vec4::new(1.0, 0.5, 0.25, 1.0)));
    }

    #[test]
    fn unbinding_other_shader_keeps_current() {
        let backend = HeadlessBackend::new();
        let a = backend.create_shader("a", VS, FS).unwrap();
        let b = backend.create_shader("b", VS, FS).unwrap();
        a.bind();
        b.unbind();
        assert!(backend.state.borrow().program.is_some());
        a.unbind();
        assert!(backend.state.borrow().program.is_none());
    }

    #[test]
    fn texture_set_data_checks_length() {
        let backend = HeadlessBackend::new();
        let texture = backend.create_texture(2, 2).unwrap();
        assert!(matches!(
            texture.set_data(&[0; 15]),
            Err(RenderError::TextureSizeMismatch {
                expected: 16,
                actual: 15
            })
        ));
        texture.set_data(&[0xff; 16]).unwrap();
    }

    #[test]
    fn commands_are_logged_in_order() {
        let mut backend = HeadlessBackend::new();
        backend.init().unwrap();
        backend.set_viewport(0, 0, 640, 360);
        backend.set_clear_color(Vec4::new(0.1, 0.1, 0.1, 1.0));
        backend.clear();
        backend.present().unwrap();

        let log = backend.command_log();
        assert_eq!(
            log.commands(),
            vec![
                RenderCommand::Init,
                RenderCommand::SetViewport {
                    x: 0,
                    y: 0,
                    width: 640,
                    height: 360
                },
                RenderCommand::SetClearColor(Vec4::new(0.1, 0.1, 0.1, 1.0)),
                RenderCommand::Clear,
                RenderCommand::Present,
            ]
        );
        assert_eq!(log.last_viewport(), Some((0, 0, 640, 360)));
        assert_eq!(backend.api(), GraphicsApi::Headless);
    }
}

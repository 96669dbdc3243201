//! wgpu backend.
//!
//! Commands follow immediate-mode rules: a draw uses whatever shader and
//! textures are bound when it is issued. Draws are recorded with a copy of
//! their uniforms and replayed into a single render pass on `present`, in
//! submission order with alpha blending and no depth test.

mod frame;
mod pipeline;
mod resources;

use std::path::Path;
use std::rc::Rc;

use anyhow::Context;
use glam::Vec4;

use crate::device::{Gpu, GpuInit, SurfaceErrorAction};
use crate::window::Window;

use super::backend::{GraphicsApi, RendererApi, RendererBackend, ResourceFactory};
use super::buffer::{IndexBuffer, VertexBuffer};
use super::shader::{Shader, ShaderProgram};
use super::texture::{Texture2D, TextureFormat, decode_image};
use super::vertex_array::VertexArray;
use super::RenderError;

use frame::{PendingDraw, UniformArena, encode_pass};
use pipeline::{BindLayouts, PipelineCache, vertex_layouts};
use resources::{WgpuProgram, WgpuShared};

pub use resources::{WgpuIndexBuffer, WgpuShader, WgpuTexture, WgpuVertexArray, WgpuVertexBuffer};

pub struct WgpuBackend {
    gpu: Gpu,
    shared: Rc<WgpuShared>,
    layouts: BindLayouts,
    pipelines: PipelineCache,
    arena: UniformArena,
    pending: Vec<PendingDraw>,

    /// Bound when a draw samples a unit with no texture.
    fallback: WgpuTexture,

    viewport: (u32, u32, u32, u32),
    clear_color: Vec4,
    frame_clear: Option<Vec4>,
}

impl WgpuBackend {
    /// Creates the device and surface for `window`.
    pub fn new(window: &dyn Window, init: &GpuInit) -> anyhow::Result<Self> {
        let handle = window
            .native_handle()
            .context("window has no native surface")?;
        let gpu = pollster::block_on(Gpu::new(
            handle,
            window.framebuffer_size(),
            window.is_vsync(),
            init,
        ))?;
        Self::from_gpu(gpu)
    }

    pub fn from_gpu(gpu: Gpu) -> anyhow::Result<Self> {
        let device = gpu.device().clone();
        let layouts = BindLayouts::new(&device);
        let shared = Rc::new(WgpuShared::new(
            device.clone(),
            gpu.queue().clone(),
            layouts.texture.clone(),
        ));

        let fallback = WgpuTexture::new(1, 1, TextureFormat::Rgba8, None, shared.clone());
        fallback
            .set_data(&[u8::MAX; 4])
            .context("failed to fill fallback texture")?;

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let (width, height) = gpu.size();

        Ok(Self {
            gpu,
            shared,
            layouts,
            pipelines: PipelineCache::default(),
            arena: UniformArena::new(alignment),
            pending: Vec::new(),
            fallback,
            viewport: (0, 0, width, height),
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            frame_clear: None,
        })
    }

    #[inline]
    pub fn gpu(&self) -> &Gpu {
        &self.gpu
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    fn discard_frame(&mut self) {
        self.pending.clear();
        self.arena.reset();
        self.frame_clear = None;
    }
}

impl ResourceFactory for WgpuBackend {
    fn create_vertex_buffer(&self, vertices: &[f32]) -> Result<Rc<dyn VertexBuffer>, RenderError> {
        Ok(Rc::new(WgpuVertexBuffer::new(vertices, self.shared.clone())))
    }

    fn create_index_buffer(&self, indices: &[u32]) -> Result<Rc<dyn IndexBuffer>, RenderError> {
        Ok(Rc::new(WgpuIndexBuffer::new(indices, self.shared.clone())))
    }

    fn create_vertex_array(&self) -> Result<Rc<dyn VertexArray>, RenderError> {
        Ok(Rc::new(WgpuVertexArray::new(self.shared.clone())))
    }

    fn create_texture(&self, width: u32, height: u32) -> Result<Rc<dyn Texture2D>, RenderError> {
        Ok(Rc::new(WgpuTexture::new(
            width,
            height,
            TextureFormat::Rgba8,
            None,
            self.shared.clone(),
        )))
    }

    fn load_texture(&self, path: &Path) -> Result<Rc<dyn Texture2D>, RenderError> {
        let image = decode_image(path)?;
        let texture = WgpuTexture::new(
            image.width,
            image.height,
            image.format,
            Some(image.path),
            self.shared.clone(),
        );
        texture.set_data(&image.pixels)?;
        Ok(Rc::new(texture))
    }

    fn load_shader(&self, path: &Path) -> Result<Rc<dyn Shader>, RenderError> {
        let program = ShaderProgram::from_file(path)?;
        let program = WgpuProgram::new(program, &self.shared.device)?;
        log::info!("loaded shader `{}`", program.program.name);
        Ok(Rc::new(WgpuShader::new(program, self.shared.clone())))
    }

    fn create_shader(
        &self,
        name: &str,
        vertex_src: &str,
        fragment_src: &str,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        let program = ShaderProgram::from_stages(name, vertex_src, fragment_src)?;
        let program = WgpuProgram::new(program, &self.shared.device)?;
        Ok(Rc::new(WgpuShader::new(program, self.shared.clone())))
    }
}

impl RendererApi for WgpuBackend {
    fn init(&mut self) -> Result<(), RenderError> {
        let info = self.gpu.adapter().get_info();
        log::info!(
            "wgpu renderer: {} ({:?}, {:?})",
            info.name,
            info.backend,
            self.gpu.surface_format()
        );
        Ok(())
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.viewport = (x, y, width, height);
    }

    fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
    }

    /// Everything drawn earlier in the frame would be cleared away, so it is
    /// dropped instead of encoded.
    fn clear(&mut self) {
        self.pending.clear();
        self.arena.reset();
        self.frame_clear = Some(self.clear_color);
    }

    fn draw_indexed(&mut self, vertex_array: &dyn VertexArray) -> Result<(), RenderError> {
        let index_buffer = vertex_array
            .index_buffer()
            .ok_or(RenderError::NoIndexBuffer)?;

        let (program, texture_id) = {
            let state = self.shared.state.borrow();
            let Some(program) = state.program.clone() else {
                log::warn!("draw_indexed with no shader bound; skipped");
                return Ok(());
            };
            let unit = program.program.uniforms.borrow().texture_unit(0);
            (program, state.texture(unit).copied())
        };

        let vertex_buffers = vertex_array.vertex_buffers();
        let strides: Vec<u32> = vertex_buffers.iter().map(|vb| vb.layout().stride()).collect();
        let layouts = vertex_layouts(&strides, &vertex_array.attributes())?;

        let gpu_buffers: Option<Vec<wgpu::Buffer>> = vertex_buffers
            .iter()
            .map(|vb| self.shared.buffer(vb.native_id()))
            .collect();
        let (Some(gpu_buffers), Some(gpu_index)) =
            (gpu_buffers, self.shared.buffer(index_buffer.native_id()))
        else {
            log::warn!(
                "vertex array {} holds buffers from another backend; skipped",
                vertex_array.native_id()
            );
            return Ok(());
        };

        let pipeline = self.pipelines.get_or_create(
            &self.shared.device,
            &self.layouts,
            self.gpu.surface_format(),
            &program,
            vertex_array.native_id(),
            &layouts,
        );

        let uniform_offset = self.arena.push(program.program.uniforms.borrow().bytes());
        let texture = texture_id
            .and_then(|id| self.shared.texture_bind_group(id))
            .or_else(|| self.shared.texture_bind_group(self.fallback.native_id()))
            .ok_or_else(|| RenderError::Surface("fallback texture was released".to_string()))?;

        self.pending.push(PendingDraw {
            pipeline,
            vertex_buffers: gpu_buffers,
            index_buffer: gpu_index,
            index_count: index_buffer.count(),
            uniform_offset,
            texture,
            viewport: self.viewport,
        });
        Ok(())
    }

    fn resize_surface(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
    }

    fn present(&mut self) -> Result<(), RenderError> {
        if !self.gpu.is_drawable() {
            self.discard_frame();
            return Ok(());
        }

        let mut frame = match self.gpu.begin_frame() {
            Ok(frame) => frame,
            Err(err) => {
                let message = err.to_string();
                self.discard_frame();
                return match self.gpu.handle_surface_error(err) {
                    SurfaceErrorAction::Fatal => Err(RenderError::Surface(message)),
                    SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => Ok(()),
                };
            }
        };

        let uniforms = self
            .arena
            .upload(&self.shared.device, &self.shared.queue, &self.layouts.uniforms)
            .cloned();

        encode_pass(
            &mut frame.encoder,
            &frame.view,
            self.frame_clear,
            self.gpu.size(),
            uniforms.as_ref(),
            &self.pending,
        );
        self.gpu.submit(frame);
        self.discard_frame();
        Ok(())
    }
}

impl RendererBackend for WgpuBackend {
    fn api(&self) -> GraphicsApi {
        GraphicsApi::Wgpu
    }
}

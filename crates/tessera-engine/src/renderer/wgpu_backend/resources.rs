use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use wgpu::util::DeviceExt;

use crate::renderer::backend::BindState;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::shader::{Shader, ShaderProgram, ShaderStage, UniformValue};
use crate::renderer::texture::{Texture2D, TextureFormat, check_data_len, to_rgba};
use crate::renderer::vertex_array::{VertexArray, VertexArrayStorage, VertexAttribute};
use crate::renderer::{RenderError, ResourceId};

/// Device objects and bind points shared by the backend and its resources.
///
/// GPU buffers and texture bind groups are registered by id so a draw can
/// reach them through the backend-neutral resource traits.
pub(crate) struct WgpuShared {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub texture_layout: wgpu::BindGroupLayout,
    pub sampler: wgpu::Sampler,

    pub state: RefCell<BindState<WgpuProgram, ResourceId>>,
    pub buffers: RefCell<HashMap<ResourceId, wgpu::Buffer>>,
    pub textures: RefCell<HashMap<ResourceId, wgpu::BindGroup>>,
}

impl WgpuShared {
    pub fn new(device: wgpu::Device, queue: wgpu::Queue, texture_layout: wgpu::BindGroupLayout) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tessera texture sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            device,
            queue,
            texture_layout,
            sampler,
            state: RefCell::new(BindState::default()),
            buffers: RefCell::new(HashMap::new()),
            textures: RefCell::new(HashMap::new()),
        }
    }

    pub fn buffer(&self, id: ResourceId) -> Option<wgpu::Buffer> {
        self.buffers.borrow().get(&id).cloned()
    }

    pub fn texture_bind_group(&self, id: ResourceId) -> Option<wgpu::BindGroup> {
        self.textures.borrow().get(&id).cloned()
    }

    /// Creates a texture with its bind group.
    pub fn create_gpu_texture(&self, id: ResourceId, width: u32, height: u32) -> wgpu::Texture {
        // wgpu rejects empty extents.
        let size = wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        };
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("tessera texture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("tessera texture bind group"),
            layout: &self.texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });
        self.textures.borrow_mut().insert(id, bind_group);
        texture
    }

    pub fn write_texture(&self, texture: &wgpu::Texture, width: u32, height: u32, rgba: &[u8]) {
        if width == 0 || height == 0 {
            return;
        }
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }
}

pub struct WgpuVertexBuffer {
    id: ResourceId,
    size: usize,
    layout: RefCell<BufferLayout>,
    shared: Rc<WgpuShared>,
}

impl WgpuVertexBuffer {
    pub(crate) fn new(vertices: &[f32], shared: Rc<WgpuShared>) -> Self {
        let id = ResourceId::next();
        let buffer = shared
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tessera vertex buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        shared.buffers.borrow_mut().insert(id, buffer);
        Self {
            id,
            size: std::mem::size_of_val(vertices),
            layout: RefCell::new(BufferLayout::default()),
            shared,
        }
    }
}

impl Drop for WgpuVertexBuffer {
    fn drop(&mut self) {
        self.shared.buffers.borrow_mut().remove(&self.id);
    }
}

impl VertexBuffer for WgpuVertexBuffer {
    fn bind(&self) {
        self.shared.state.borrow_mut().vertex_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.vertex_buffer == Some(self.id) {
            state.vertex_buffer = None;
        }
    }

    fn layout(&self) -> BufferLayout {
        self.layout.borrow().clone()
    }

    fn set_layout(&self, layout: BufferLayout) {
        *self.layout.borrow_mut() = layout;
    }

    fn size(&self) -> usize {
        self.size
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

pub struct WgpuIndexBuffer {
    id: ResourceId,
    count: u32,
    shared: Rc<WgpuShared>,
}

impl WgpuIndexBuffer {
    pub(crate) fn new(indices: &[u32], shared: Rc<WgpuShared>) -> Self {
        let id = ResourceId::next();
        let buffer = shared
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("tessera index buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });
        shared.buffers.borrow_mut().insert(id, buffer);
        Self {
            id,
            count: indices.len() as u32,
            shared,
        }
    }
}

impl Drop for WgpuIndexBuffer {
    fn drop(&mut self) {
        self.shared.buffers.borrow_mut().remove(&self.id);
    }
}

impl IndexBuffer for WgpuIndexBuffer {
    fn bind(&self) {
        self.shared.state.borrow_mut().index_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.index_buffer == Some(self.id) {
            state.index_buffer = None;
        }
    }

    fn count(&self) -> u32 {
        self.count
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

pub struct WgpuVertexArray {
    storage: VertexArrayStorage,
    shared: Rc<WgpuShared>,
}

impl WgpuVertexArray {
    pub(crate) fn new(shared: Rc<WgpuShared>) -> Self {
        Self {
            storage: VertexArrayStorage::new(),
            shared,
        }
    }
}

impl VertexArray for WgpuVertexArray {
    fn bind(&self) {
        let mut state = self.shared.state.borrow_mut();
        state.vertex_array = Some(self.storage.id());
        state.index_buffer = self.storage.index_buffer().map(|ib| ib.native_id());
    }

    fn unbind(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state.vertex_array == Some(self.storage.id()) {
            state.vertex_array = None;
        }
    }

    fn add_vertex_buffer(&self, buffer: Rc<dyn VertexBuffer>) -> Result<(), RenderError> {
        self.storage.add_vertex_buffer(buffer).map(|_| ())
    }

    fn set_index_buffer(&self, buffer: Rc<dyn IndexBuffer>) {
        self.storage.set_index_buffer(buffer);
    }

    fn vertex_buffers(&self) -> Vec<Rc<dyn VertexBuffer>> {
        self.storage.vertex_buffers()
    }

    fn index_buffer(&self) -> Option<Rc<dyn IndexBuffer>> {
        self.storage.index_buffer()
    }

    fn attributes(&self) -> Vec<VertexAttribute> {
        self.storage.table().attributes().to_vec()
    }

    fn native_id(&self) -> ResourceId {
        self.storage.id()
    }
}

pub struct WgpuTexture {
    id: ResourceId,
    width: u32,
    height: u32,
    format: TextureFormat,
    path: Option<PathBuf>,
    texture: wgpu::Texture,
    shared: Rc<WgpuShared>,
}

impl WgpuTexture {
    pub(crate) fn new(
        width: u32,
        height: u32,
        format: TextureFormat,
        path: Option<PathBuf>,
        shared: Rc<WgpuShared>,
    ) -> Self {
        let id = ResourceId::next();
        let texture = shared.create_gpu_texture(id, width, height);
        Self {
            id,
            width,
            height,
            format,
            path,
            texture,
            shared,
        }
    }
}

impl Drop for WgpuTexture {
    fn drop(&mut self) {
        self.shared.textures.borrow_mut().remove(&self.id);
    }
}

impl Texture2D for WgpuTexture {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn set_data(&self, data: &[u8]) -> Result<(), RenderError> {
        check_data_len(self.width, self.height, self.format, data.len())?;
        let rgba = to_rgba(self.format, data);
        self.shared
            .write_texture(&self.texture, self.width, self.height, &rgba);
        Ok(())
    }

    fn bind(&self, slot: u32) {
        self.shared.state.borrow_mut().bind_texture(slot, self.id);
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

/// Reflected program plus its compiled wgpu modules.
pub(crate) struct WgpuProgram {
    pub program: ShaderProgram,
    pub vertex: wgpu::ShaderModule,
    pub fragment: Option<wgpu::ShaderModule>,
}

impl WgpuProgram {
    /// `program` has already been validated, so module creation cannot fail
    /// on WGSL errors here.
    pub fn new(program: ShaderProgram, device: &wgpu::Device) -> Result<Self, RenderError> {
        let module = |stage: ShaderStage, source: &str| {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&format!("{} ({stage:?})", program.name)),
                source: wgpu::ShaderSource::Wgsl(source.into()),
            })
        };

        let vertex = program
            .sources
            .get(ShaderStage::Vertex)
            .map(|src| module(ShaderStage::Vertex, src))
            .ok_or_else(|| RenderError::ShaderSyntax(format!("`{}` has no vertex stage", program.name)))?;
        let fragment = program
            .sources
            .get(ShaderStage::Fragment)
            .map(|src| module(ShaderStage::Fragment, src));

        Ok(Self {
            program,
            vertex,
            fragment,
        })
    }
}

pub struct WgpuShader {
    program: Rc<WgpuProgram>,
    shared: Rc<WgpuShared>,
}

impl WgpuShader {
    pub(crate) fn new(program: WgpuProgram, shared: Rc<WgpuShared>) -> Self {
        Self {
            program: Rc::new(program),
            shared,
        }
    }
}

impl Shader for WgpuShader {
    fn name(&self) -> &str {
        &self.program.program.name
    }

    fn bind(&self) {
        self.shared.state.borrow_mut().program = Some(self.program.clone());
    }

    fn unbind(&self) {
        let mut state = self.shared.state.borrow_mut();
        if state
            .program
            .as_ref()
            .is_some_and(|p| Rc::ptr_eq(p, &self.program))
        {
            state.program = None;
        }
    }

    fn upload(&self, name: &str, value: UniformValue) {
        self.program.program.upload(name, value);
    }

    fn native_id(&self) -> ResourceId {
        self.program.program.id
    }
}

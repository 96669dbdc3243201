use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::renderer::backend::BindState;
use crate::renderer::buffer::{BufferLayout, IndexBuffer, VertexBuffer};
use crate::renderer::shader::{Shader, ShaderProgram, UniformValue};
use crate::renderer::texture::{Texture2D, TextureFormat, check_data_len};
use crate::renderer::vertex_array::{VertexArray, VertexArrayStorage, VertexAttribute};
use crate::renderer::{RenderError, ResourceId};

pub(crate) type HeadlessBindState = BindState<ShaderProgram, ResourceId>;

pub(crate) type SharedState = Rc<RefCell<HeadlessBindState>>;

pub struct HeadlessVertexBuffer {
    id: ResourceId,
    data: Vec<f32>,
    layout: RefCell<BufferLayout>,
    state: SharedState,
}

impl HeadlessVertexBuffer {
    pub(crate) fn new(vertices: &[f32], state: SharedState) -> Self {
        Self {
            id: ResourceId::next(),
            data: vertices.to_vec(),
            layout: RefCell::new(BufferLayout::default()),
            state,
        }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

impl VertexBuffer for HeadlessVertexBuffer {
    fn bind(&self) {
        self.state.borrow_mut().vertex_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.state.borrow_mut();
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
        std::mem::size_of_val(self.data.as_slice())
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

pub struct HeadlessIndexBuffer {
    id: ResourceId,
    indices: Vec<u32>,
    state: SharedState,
}

impl HeadlessIndexBuffer {
    pub(crate) fn new(indices: &[u32], state: SharedState) -> Self {
        Self {
            id: ResourceId::next(),
            indices: indices.to_vec(),
            state,
        }
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }
}

impl IndexBuffer for HeadlessIndexBuffer {
    fn bind(&self) {
        self.state.borrow_mut().index_buffer = Some(self.id);
    }

    fn unbind(&self) {
        let mut state = self.state.borrow_mut();
        if state.index_buffer == Some(self.id) {
            state.index_buffer = None;
        }
    }

    fn count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

pub struct HeadlessVertexArray {
    storage: VertexArrayStorage,
    state: SharedState,
}

impl HeadlessVertexArray {
    pub(crate) fn new(state: SharedState) -> Self {
        Self {
            storage: VertexArrayStorage::new(),
            state,
        }
    }
}

impl VertexArray for HeadlessVertexArray {
    fn bind(&self) {
        let mut state = self.state.borrow_mut();
        state.vertex_array = Some(self.storage.id());
        state.index_buffer = self.storage.index_buffer().map(|ib| ib.native_id());
    }

    fn unbind(&self) {
        let mut state = self.state.borrow_mut();
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

pub struct HeadlessTexture {
    id: ResourceId,
    width: u32,
    height: u32,
    format: TextureFormat,
    path: Option<PathBuf>,
    pixels: RefCell<Vec<u8>>,
    state: SharedState,
}

impl HeadlessTexture {
    pub(crate) fn new(
        width: u32,
        height: u32,
        format: TextureFormat,
        path: Option<PathBuf>,
        pixels: Vec<u8>,
        state: SharedState,
    ) -> Self {
        Self {
            id: ResourceId::next(),
            width,
            height,
            format,
            path,
            pixels: RefCell::new(pixels),
            state,
        }
    }

    /// Current pixel bytes in the texture's own format.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.borrow().clone()
    }
}

impl Texture2D for HeadlessTexture {
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
        self.pixels.borrow_mut().copy_from_slice(data);
        Ok(())
    }

    fn bind(&self, slot: u32) {
        self.state.borrow_mut().bind_texture(slot, self.id);
    }

    fn native_id(&self) -> ResourceId {
        self.id
    }
}

pub struct HeadlessShader {
    program: Rc<ShaderProgram>,
    state: SharedState,
}

impl HeadlessShader {
    pub(crate) fn new(program: ShaderProgram, state: SharedState) -> Self {
        Self {
            program: Rc::new(program),
            state,
        }
    }
}

impl Shader for HeadlessShader {
    fn name(&self) -> &str {
        &self.program.name
    }

    fn bind(&self) {
        self.state.borrow_mut().program = Some(self.program.clone());
    }

    fn unbind(&self) {
        let mut state = self.state.borrow_mut();
        if state
            .program
            .as_ref()
            .is_some_and(|p| Rc::ptr_eq(p, &self.program))
        {
            state.program = None;
        }
    }

    fn upload(&self, name: &str, value: UniformValue) {
        self.program.upload(name, value);
    }

    fn native_id(&self) -> ResourceId {
        self.program.id
    }
}

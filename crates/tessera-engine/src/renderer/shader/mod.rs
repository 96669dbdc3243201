//! Shader sources, uniform reflection and the `Shader` trait.
//!
//! Shaders are WGSL. One file carries every stage, split on `#type` lines.

mod library;
mod preprocess;
mod reflect;
mod uniform;

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

use super::{RenderError, ResourceId};

pub use library::ShaderLibrary;
pub use preprocess::{ShaderSources, ShaderStage, preprocess, shader_name_from_path};
pub use reflect::{TEXTURE_GROUP, UNIFORM_GROUP, reflect_program};
pub use uniform::{
    UNIFORM_SLOT_SIZE, UniformBlock, UniformField, UniformLayout, UniformSlot, UniformType,
    UniformValue,
};

/// A linked shader program.
///
/// Uploads go to the program's own uniform block and are snapshotted by
/// every draw that uses it.
pub trait Shader {
    fn name(&self) -> &str;

    fn bind(&self);
    fn unbind(&self);

    /// Writes one uniform. Unknown names are ignored after a single warning.
    fn upload(&self, name: &str, value: UniformValue);

    fn native_id(&self) -> ResourceId;

    fn set_int(&self, name: &str, value: i32) {
        self.upload(name, UniformValue::Int(value));
    }

    fn set_float(&self, name: &str, value: f32) {
        self.upload(name, UniformValue::Float(value));
    }

    fn set_float2(&self, name: &str, value: Vec2) {
        self.upload(name, UniformValue::Float2(value));
    }

    fn set_float3(&self, name: &str, value: Vec3) {
        self.upload(name, UniformValue::Float3(value));
    }

    fn set_float4(&self, name: &str, value: Vec4) {
        self.upload(name, UniformValue::Float4(value));
    }

    fn set_mat3(&self, name: &str, value: Mat3) {
        self.upload(name, UniformValue::Mat3(value));
    }

    fn set_mat4(&self, name: &str, value: Mat4) {
        self.upload(name, UniformValue::Mat4(value));
    }
}

/// Validated program state common to every backend.
#[derive(Debug)]
pub(crate) struct ShaderProgram {
    pub id: ResourceId,
    pub name: String,
    pub sources: ShaderSources,
    pub uniforms: RefCell<UniformBlock>,
}

impl ShaderProgram {
    pub(crate) fn new(name: impl Into<String>, sources: ShaderSources) -> Result<Self, RenderError> {
        let name = name.into();
        let layout = reflect_program(&name, &sources)?;
        Ok(Self {
            id: ResourceId::next(),
            name,
            sources,
            uniforms: RefCell::new(UniformBlock::new(Rc::new(layout))),
        })
    }

    pub(crate) fn from_file(path: &Path) -> Result<Self, RenderError> {
        let source = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let sources = preprocess(&source)?;
        Self::new(shader_name_from_path(path), sources)
    }

    pub(crate) fn from_stages(name: &str, vertex: &str, fragment: &str) -> Result<Self, RenderError> {
        Self::new(name, ShaderSources::new(vertex, fragment))
    }

    pub(crate) fn upload(&self, name: &str, value: UniformValue) {
        self.uniforms.borrow_mut().set(name, value);
    }

    pub(crate) fn snapshot(&self) -> UniformSnapshot {
        let block = self.uniforms.borrow();
        UniformSnapshot {
            layout: block.layout().clone(),
            bytes: block.bytes().to_vec(),
            texture_unit: block.texture_unit(0),
        }
    }
}

/// Copy of a program's uniform bytes at draw time.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformSnapshot {
    pub layout: Rc<UniformLayout>,
    pub bytes: Vec<u8>,

    /// Unit feeding the first texture binding.
    pub texture_unit: u32,
}

impl UniformSnapshot {
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.layout.read(&self.bytes, name)
    }

    pub fn mat4(&self, name: &str) -> Option<Mat4> {
        match self.get(name)? {
            UniformValue::Mat4(m) => Some(m),
            _ => None,
        }
    }

    pub fn float4(&self, name: &str) -> Option<Vec4> {
        match self.get(name)? {
            UniformValue::Float4(v) => Some(v),
            _ => None,
        }
    }

    pub fn float(&self, name: &str) -> Option<f32> {
        match self.get(name)? {
            UniformValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

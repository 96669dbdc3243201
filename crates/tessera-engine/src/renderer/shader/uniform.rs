use std::collections::HashMap;
use std::rc::Rc;

use glam::{Mat3, Mat4, Vec2, Vec3, Vec4};

/// Bytes reserved per draw for the uniform block. Shaders whose block is
/// larger are rejected at creation.
pub const UNIFORM_SLOT_SIZE: u32 = 256;

/// Uniform member types understood by the uniform block.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformType {
    Int,
    UInt,
    Float,
    Float2,
    Float3,
    Float4,
    Int2,
    Int3,
    Int4,
    Mat3,
    Mat4,
}

impl UniformType {
    /// Byte size under WGSL uniform layout (mat3 columns are padded to 16).
    pub const fn size(self) -> u32 {
        match self {
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Float2 | Self::Int2 => 8,
            Self::Float3 | Self::Int3 => 12,
            Self::Float4 | Self::Int4 => 16,
            Self::Mat3 => 48,
            Self::Mat4 => 64,
        }
    }
}

/// A value uploaded to (or read back from) a uniform.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Float2(Vec2),
    Float3(Vec3),
    Float4(Vec4),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Int(_) => UniformType::Int,
            Self::Float(_) => UniformType::Float,
            Self::Float2(_) => UniformType::Float2,
            Self::Float3(_) => UniformType::Float3,
            Self::Float4(_) => UniformType::Float4,
            Self::Mat3(_) => UniformType::Mat3,
            Self::Mat4(_) => UniformType::Mat4,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformField {
    pub name: String,
    pub ty: UniformType,
    pub offset: u32,
}

/// Reflected layout of a shader's uniform block plus its named texture
/// bindings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformLayout {
    fields: Vec<UniformField>,
    size: u32,
    textures: Vec<String>,
}

impl UniformLayout {
    pub(crate) fn from_parts(fields: Vec<UniformField>, size: u32, textures: Vec<String>) -> Self {
        Self {
            fields,
            size,
            textures,
        }
    }

    #[inline]
    pub fn fields(&self) -> &[UniformField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&UniformField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Block size in bytes, including trailing padding.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Texture binding names, in binding order.
    #[inline]
    pub fn textures(&self) -> &[String] {
        &self.textures
    }

    /// Decodes one field from raw block bytes.
    pub fn read(&self, bytes: &[u8], name: &str) -> Option<UniformValue> {
        let field = self.field(name)?;
        let at = field.offset as usize;
        let end = at + field.ty.size() as usize;
        if end > bytes.len() {
            return None;
        }
        let floats = |n: usize| -> Vec<f32> {
            (0..n)
                .map(|i| read_f32(bytes, at + i * 4))
                .collect()
        };
        let value = match field.ty {
            UniformType::Int | UniformType::UInt => UniformValue::Int(read_i32(bytes, at)),
            UniformType::Float => UniformValue::Float(read_f32(bytes, at)),
            UniformType::Float2 => UniformValue::Float2(Vec2::from_slice(&floats(2))),
            UniformType::Float3 => UniformValue::Float3(Vec3::from_slice(&floats(3))),
            UniformType::Float4 => UniformValue::Float4(Vec4::from_slice(&floats(4))),
            UniformType::Int2 | UniformType::Int3 | UniformType::Int4 => return None,
            UniformType::Mat3 => {
                let col = |c: usize| {
                    Vec3::new(
                        read_f32(bytes, at + c * 16),
                        read_f32(bytes, at + c * 16 + 4),
                        read_f32(bytes, at + c * 16 + 8),
                    )
                };
                UniformValue::Mat3(Mat3::from_cols(col(0), col(1), col(2)))
            }
            UniformType::Mat4 => UniformValue::Mat4(Mat4::from_cols_slice(&floats(16))),
        };
        Some(value)
    }
}

/// Where a uniform name resolved to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformSlot {
    /// Index into [`UniformLayout::fields`].
    Field(usize),
    /// Index into [`UniformLayout::textures`]; `set_int` selects its unit.
    Texture(usize),
}

/// CPU copy of a shader's uniform block.
///
/// Name lookups are cached on first use, misses included, so an unknown name
/// is reported once and then ignored.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: Rc<UniformLayout>,
    data: Vec<u8>,
    locations: HashMap<String, Option<UniformSlot>>,
    texture_units: Vec<u32>,
}

impl UniformBlock {
    pub fn new(layout: Rc<UniformLayout>) -> Self {
        let data = vec![0; layout.size() as usize];
        let texture_units = vec![0; layout.textures().len()];
        Self {
            layout,
            data,
            locations: HashMap::new(),
            texture_units,
        }
    }

    #[inline]
    pub fn layout(&self) -> &Rc<UniformLayout> {
        &self.layout
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// Texture unit feeding texture binding `index` (default 0).
    pub fn texture_unit(&self, index: usize) -> u32 {
        self.texture_units.get(index).copied().unwrap_or(0)
    }

    #[inline]
    pub fn cached_locations(&self) -> usize {
        self.locations.len()
    }

    pub fn locate(&mut self, name: &str) -> Option<UniformSlot> {
        if let Some(slot) = self.locations.get(name) {
            return *slot;
        }

        let slot = self
            .layout
            .fields()
            .iter()
            .position(|f| f.name == name)
            .map(UniformSlot::Field)
            .or_else(|| {
                self.layout
                    .textures()
                    .iter()
                    .position(|t| t == name)
                    .map(UniformSlot::Texture)
            });
        if slot.is_none() {
            log::warn!("uniform `{name}` does not exist in shader; uploads are ignored");
        }
        self.locations.insert(name.to_string(), slot);
        slot
    }

    /// Writes `value`. Unknown names and type mismatches are no-ops.
    pub fn set(&mut self, name: &str, value: UniformValue) -> bool {
        let Some(slot) = self.locate(name) else {
            return false;
        };

        match slot {
            UniformSlot::Texture(index) => match value {
                UniformValue::Int(unit) if unit >= 0 => {
                    self.texture_units[index] = unit as u32;
                    true
                }
                other => {
                    log::warn!("texture uniform `{name}` expects a unit index, got {other:?}");
                    false
                }
            },
            UniformSlot::Field(index) => {
                let field = &self.layout.fields()[index];
                if !accepts(field.ty, value.ty()) {
                    log::warn!(
                        "uniform `{name}` is {:?}, ignoring {:?} upload",
                        field.ty,
                        value.ty()
                    );
                    return false;
                }
                let offset = field.offset as usize;
                self.write(offset, value);
                true
            }
        }
    }

    fn write(&mut self, offset: usize, value: UniformValue) {
        match value {
            UniformValue::Int(v) => self.put(offset, bytemuck::bytes_of(&v)),
            UniformValue::Float(v) => self.put(offset, bytemuck::bytes_of(&v)),
            UniformValue::Float2(v) => self.put(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Float3(v) => self.put(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Float4(v) => self.put(offset, bytemuck::cast_slice(&v.to_array())),
            UniformValue::Mat3(m) => {
                // Each column occupies a 16-byte vec3 slot.
                for (c, col) in [m.x_axis, m.y_axis, m.z_axis].into_iter().enumerate() {
                    self.put(offset + c * 16, bytemuck::cast_slice(&col.to_array()));
                }
            }
            UniformValue::Mat4(m) => self.put(offset, bytemuck::cast_slice(&m.to_cols_array())),
        }
    }

    fn put(&mut self, offset: usize, bytes: &[u8]) {
        self.data[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
}

fn accepts(field: UniformType, value: UniformType) -> bool {
    field == value || (field == UniformType::UInt && value == UniformType::Int)
}

fn read_f32(bytes: &[u8], at: usize) -> f32 {
    bytemuck::pod_read_unaligned(&bytes[at..at + 4])
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    bytemuck::pod_read_unaligned(&bytes[at..at + 4])
}

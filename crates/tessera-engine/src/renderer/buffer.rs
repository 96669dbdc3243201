use super::ResourceId;

/// Data type of one vertex attribute or uniform, in shader terms.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderDataType {
    Float,
    Float2,
    Float3,
    Float4,
    Mat3,
    Mat4,
    Int,
    Int2,
    Int3,
    Int4,
    Bool,
}

/// Scalar family an attribute is fed as.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BaseType {
    Float,
    Int,
    Bool,
}

impl ShaderDataType {
    /// Size in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Float => 4,
            Self::Float2 => 4 * 2,
            Self::Float3 => 4 * 3,
            Self::Float4 => 4 * 4,
            Self::Mat3 => 4 * 3 * 3,
            Self::Mat4 => 4 * 4 * 4,
            Self::Int => 4,
            Self::Int2 => 4 * 2,
            Self::Int3 => 4 * 3,
            Self::Int4 => 4 * 4,
            Self::Bool => 1,
        }
    }

    pub const fn component_count(self) -> u32 {
        match self {
            Self::Float | Self::Int | Self::Bool => 1,
            Self::Float2 | Self::Int2 => 2,
            Self::Float3 | Self::Int3 => 3,
            Self::Float4 | Self::Int4 => 4,
            Self::Mat3 => 3 * 3,
            Self::Mat4 => 4 * 4,
        }
    }

    pub const fn base_type(self) -> BaseType {
        match self {
            Self::Float | Self::Float2 | Self::Float3 | Self::Float4 | Self::Mat3 | Self::Mat4 => {
                BaseType::Float
            }
            Self::Int | Self::Int2 | Self::Int3 | Self::Int4 => BaseType::Int,
            Self::Bool => BaseType::Bool,
        }
    }

    #[inline]
    pub const fn is_matrix(self) -> bool {
        matches!(self, Self::Mat3 | Self::Mat4)
    }

    /// Column type and column count for matrices.
    pub const fn matrix_columns(self) -> Option<(ShaderDataType, u32)> {
        match self {
            Self::Mat3 => Some((Self::Float3, 3)),
            Self::Mat4 => Some((Self::Float4, 4)),
            _ => None,
        }
    }
}

/// One named attribute inside a vertex buffer layout.
#[derive(Debug, Clone, PartialEq)]
pub struct BufferElement {
    pub name: String,
    pub ty: ShaderDataType,
    pub size: u32,

    /// Byte offset inside one vertex; assigned by [`BufferLayout::new`].
    pub offset: u32,
    pub normalized: bool,
}

impl BufferElement {
    pub fn new(ty: ShaderDataType, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty,
            size: ty.size(),
            offset: 0,
            normalized: false,
        }
    }

    pub fn normalized(mut self) -> Self {
        self.normalized = true;
        self
    }
}

/// Ordered attribute description of one vertex.
///
/// Offsets and stride are computed once at construction; a layout is never
/// edited afterwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferLayout {
    elements: Vec<BufferElement>,
    stride: u32,
}

impl BufferLayout {
    pub fn new(elements: impl IntoIterator<Item = BufferElement>) -> Self {
        let mut elements: Vec<BufferElement> = elements.into_iter().collect();
        let mut offset = 0;
        for element in &mut elements {
            element.offset = offset;
            offset += element.size;
        }
        Self {
            elements,
            stride: offset,
        }
    }

    #[inline]
    pub fn elements(&self) -> &[BufferElement] {
        &self.elements
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, BufferElement> {
        self.elements.iter()
    }
}

impl<'a> IntoIterator for &'a BufferLayout {
    type Item = &'a BufferElement;
    type IntoIter = std::slice::Iter<'a, BufferElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// GPU vertex storage. Shared through `Rc`; methods take `&self`.
pub trait VertexBuffer {
    fn bind(&self);
    fn unbind(&self);

    fn layout(&self) -> BufferLayout;

    /// Must be set before the buffer is added to a vertex array.
    fn set_layout(&self, layout: BufferLayout);

    /// Size in bytes.
    fn size(&self) -> usize;

    fn native_id(&self) -> ResourceId;
}

/// GPU index storage (`u32` indices).
pub trait IndexBuffer {
    fn bind(&self);
    fn unbind(&self);

    /// Number of indices.
    fn count(&self) -> u32;

    fn native_id(&self) -> ResourceId;
}

use std::cell::RefCell;
use std::rc::Rc;

use super::buffer::{BaseType, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
use super::{RenderError, ResourceId};

/// Groups vertex buffers with one index buffer.
pub trait VertexArray {
    fn bind(&self);
    fn unbind(&self);

    /// Fails with `LayoutMissing` when the buffer has no layout.
    fn add_vertex_buffer(&self, buffer: Rc<dyn VertexBuffer>) -> Result<(), RenderError>;

    /// Replaces the previous index buffer.
    fn set_index_buffer(&self, buffer: Rc<dyn IndexBuffer>);

    fn vertex_buffers(&self) -> Vec<Rc<dyn VertexBuffer>>;
    fn index_buffer(&self) -> Option<Rc<dyn IndexBuffer>>;

    /// Attribute assignments accumulated so far.
    fn attributes(&self) -> Vec<VertexAttribute>;

    fn native_id(&self) -> ResourceId;
}

/// One shader input produced from a layout element.
///
/// Matrix elements expand into one attribute per column, so `data_type` is
/// never a matrix here.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    /// Shader input location.
    pub location: u32,

    /// Index of the vertex buffer within the array.
    pub buffer_index: u32,

    pub data_type: ShaderDataType,
    pub offset: u32,
    pub normalized: bool,
}

impl VertexAttribute {
    #[inline]
    pub fn components(&self) -> u32 {
        self.data_type.component_count()
    }

    #[inline]
    pub fn base_type(&self) -> BaseType {
        self.data_type.base_type()
    }
}

/// Backend-neutral attribute assignment.
///
/// Locations and buffer indices only increase. A location is never reused,
/// even when buffers are added at different times.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    attributes: Vec<VertexAttribute>,
    strides: Vec<u32>,
    next_location: u32,
}

impl AttributeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends attributes for one buffer and returns its buffer index.
    pub fn push_layout(&mut self, layout: &BufferLayout) -> Result<u32, RenderError> {
        if layout.is_empty() {
            return Err(RenderError::LayoutMissing);
        }

        let buffer_index = self.strides.len() as u32;
        for element in layout {
            match element.ty.matrix_columns() {
                Some((column_type, columns)) => {
                    let rows = column_type.component_count();
                    for col in 0..columns {
                        self.push(VertexAttribute {
                            location: self.next_location,
                            buffer_index,
                            data_type: column_type,
                            offset: element.offset + col * 4 * rows,
                            normalized: element.normalized,
                        });
                    }
                }
                None => self.push(VertexAttribute {
                    location: self.next_location,
                    buffer_index,
                    data_type: element.ty,
                    offset: element.offset,
                    normalized: element.normalized,
                }),
            }
        }
        self.strides.push(layout.stride());
        Ok(buffer_index)
    }

    fn push(&mut self, attribute: VertexAttribute) {
        self.attributes.push(attribute);
        self.next_location += 1;
    }

    #[inline]
    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    /// Attributes sourced from buffer `index`.
    pub fn attributes_for(&self, index: u32) -> impl Iterator<Item = &VertexAttribute> {
        self.attributes
            .iter()
            .filter(move |a| a.buffer_index == index)
    }

    #[inline]
    pub fn strides(&self) -> &[u32] {
        &self.strides
    }

    #[inline]
    pub fn next_location(&self) -> u32 {
        self.next_location
    }

    #[inline]
    pub fn buffer_count(&self) -> u32 {
        self.strides.len() as u32
    }
}

/// Storage shared by the backend vertex array types.
pub(crate) struct VertexArrayStorage {
    id: ResourceId,
    vertex_buffers: RefCell<Vec<Rc<dyn VertexBuffer>>>,
    index_buffer: RefCell<Option<Rc<dyn IndexBuffer>>>,
    table: RefCell<AttributeTable>,
}

impl VertexArrayStorage {
    pub(crate) fn new() -> Self {
        Self {
            id: ResourceId::next(),
            vertex_buffers: RefCell::new(Vec::new()),
            index_buffer: RefCell::new(None),
            table: RefCell::new(AttributeTable::new()),
        }
    }

    #[inline]
    pub(crate) fn id(&self) -> ResourceId {
        self.id
    }

    pub(crate) fn add_vertex_buffer(&self, buffer: Rc<dyn VertexBuffer>) -> Result<u32, RenderError> {
        let index = self.table.borrow_mut().push_layout(&buffer.layout())?;
        self.vertex_buffers.borrow_mut().push(buffer);
        Ok(index)
    }

    pub(crate) fn set_index_buffer(&self, buffer: Rc<dyn IndexBuffer>) {
        *self.index_buffer.borrow_mut() = Some(buffer);
    }

    pub(crate) fn vertex_buffers(&self) -> Vec<Rc<dyn VertexBuffer>> {
        self.vertex_buffers.borrow().clone()
    }

    pub(crate) fn index_buffer(&self) -> Option<Rc<dyn IndexBuffer>> {
        self.index_buffer.borrow().clone()
    }

    pub(crate) fn table(&self) -> std::cell::Ref<'_, AttributeTable> {
        self.table.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::BufferElement;

    fn layout(elements: &[(ShaderDataType, &str)]) -> BufferLayout {
        BufferLayout::new(elements.iter().map(|(t, n)| BufferElement::new(*t, *n)))
    }

    #[test]
    fn float_and_int_elements_map_one_to_one() {
        let mut table = AttributeTable::new();
        let index = table
            .push_layout(&layout(&[
                (ShaderDataType::Float3, "a_Position"),
                (ShaderDataType::Int, "a_EntityId"),
            ]))
            .unwrap();
        assert_eq!(index, 0);

        let attrs = table.attributes();
        assert_eq!(attrs.len(), 2);
        assert_eq!((attrs[0].location, attrs[0].components(), attrs[0].offset), (0, 3, 0));
        assert_eq!(attrs[1].base_type(), BaseType::Int);
        assert_eq!((attrs[1].location, attrs[1].offset), (1, 12));
    }

    #[test]
    fn matrices_expand_to_columns() {
        let mut table = AttributeTable::new();
        table
            .push_layout(&layout(&[
                (ShaderDataType::Float, "a_Pad"),
                (ShaderDataType::Mat4, "a_Model"),
                (ShaderDataType::Mat3, "a_Normal"),
            ]))
            .unwrap();

        let attrs = table.attributes();
        assert_eq!(attrs.len(), 1 + 4 + 3);

        let mat4: Vec<_> = attrs[1..5].iter().map(|a| (a.location, a.offset)).collect();
        assert_eq!(mat4, vec![(1, 4), (2, 20), (3, 36), (4, 52)]);
        assert!(attrs[1..5].iter().all(|a| a.data_type == ShaderDataType::Float4));

        let mat3: Vec<_> = attrs[5..].iter().map(|a| (a.location, a.offset)).collect();
        assert_eq!(mat3, vec![(5, 68), (6, 80), (7, 92)]);
        assert!(attrs[5..].iter().all(|a| a.components() == 3));
    }

    #[test]
    fn locations_continue_across_buffers() {
        let mut table = AttributeTable::new();
        table
            .push_layout(&layout(&[(ShaderDataType::Float3, "a_Position")]))
            .unwrap();
        let second = table
            .push_layout(&layout(&[
                (ShaderDataType::Float2, "a_TexCoord"),
                (ShaderDataType::Float4, "a_Color"),
            ]))
            .unwrap();

        assert_eq!(second, 1);
        assert_eq!(table.next_location(), 3);
        assert_eq!(table.strides(), &[12, 24]);
        let locations: Vec<u32> = table.attributes_for(1).map(|a| a.location).collect();
        assert_eq!(locations, vec![1, 2]);
    }

    #[test]
    fn empty_layout_is_rejected_without_consuming_locations() {
        let mut table = AttributeTable::new();
        let err = table.push_layout(&BufferLayout::default()).unwrap_err();
        assert!(matches!(err, RenderError::LayoutMissing));
        assert_eq!(table.next_location(), 0);
        assert_eq!(table.buffer_count(), 0);
    }
}

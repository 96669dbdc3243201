use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::renderer::buffer::ShaderDataType;
use crate::renderer::shader::UNIFORM_SLOT_SIZE;
use crate::renderer::vertex_array::VertexAttribute;
use crate::renderer::{RenderError, ResourceId};

use super::resources::WgpuProgram;

pub(crate) fn vertex_format(ty: ShaderDataType) -> wgpu::VertexFormat {
    match ty {
        ShaderDataType::Float => wgpu::VertexFormat::Float32,
        ShaderDataType::Float2 => wgpu::VertexFormat::Float32x2,
        ShaderDataType::Float3 | ShaderDataType::Mat3 => wgpu::VertexFormat::Float32x3,
        ShaderDataType::Float4 | ShaderDataType::Mat4 => wgpu::VertexFormat::Float32x4,
        ShaderDataType::Int => wgpu::VertexFormat::Sint32,
        ShaderDataType::Int2 => wgpu::VertexFormat::Sint32x2,
        ShaderDataType::Int3 => wgpu::VertexFormat::Sint32x3,
        ShaderDataType::Int4 => wgpu::VertexFormat::Sint32x4,
        ShaderDataType::Bool => wgpu::VertexFormat::Uint8,
    }
}

/// Owned form of `wgpu::VertexBufferLayout`, one per vertex buffer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct OwnedVertexLayout {
    pub stride: u64,
    pub attributes: Vec<wgpu::VertexAttribute>,
}

impl OwnedVertexLayout {
    pub fn as_wgpu(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &self.attributes,
        }
    }
}

/// Groups attributes by buffer. wgpu requires 4-byte aligned strides.
pub(crate) fn vertex_layouts(
    strides: &[u32],
    attributes: &[VertexAttribute],
) -> Result<Vec<OwnedVertexLayout>, RenderError> {
    strides
        .iter()
        .enumerate()
        .map(|(index, &stride)| {
            if stride % 4 != 0 {
                return Err(RenderError::UnalignedStride { stride });
            }
            let attributes = attributes
                .iter()
                .filter(|a| a.buffer_index as usize == index)
                .map(|a| wgpu::VertexAttribute {
                    format: vertex_format(a.data_type),
                    offset: a.offset as u64,
                    shader_location: a.location,
                })
                .collect();
            Ok(OwnedVertexLayout {
                stride: stride as u64,
                attributes,
            })
        })
        .collect()
}

/// Bind group layouts shared by every program.
pub(crate) struct BindLayouts {
    pub uniforms: wgpu::BindGroupLayout,
    pub texture: wgpu::BindGroupLayout,
    pub pipeline_layout: wgpu::PipelineLayout,
}

impl BindLayouts {
    pub fn new(device: &wgpu::Device) -> Self {
        let uniforms = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera uniform bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: NonZeroU64::new(UNIFORM_SLOT_SIZE as u64),
                },
                count: None,
            }],
        });

        let texture = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("tessera texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("tessera pipeline layout"),
            bind_group_layouts: &[&uniforms, &texture],
            immediate_size: 0,
        });

        Self {
            uniforms,
            texture,
            pipeline_layout,
        }
    }
}

pub(crate) fn alpha_blend() -> wgpu::BlendState {
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

/// Render pipelines keyed by (program, vertex array, buffer count).
///
/// A program can be drawn with several vertex arrays, each with its own
/// attribute layout. Adding a buffer to an array changes its layout, hence
/// the count.
/// Single alpha-blended color attachment matching the surface format.
pub(crate) fn color_targets(format: wgpu::TextureFormat) -> [Option<wgpu::ColorTargetState>; 1] {
    [Some(wgpu::ColorTargetState {
        format,
        blend: Some(alpha_blend()),
        write_mask: wgpu::ColorWrites::ALL,
    })]
}

#[derive(Default)]
pub(crate) struct PipelineCache {
    pipelines: HashMap<(ResourceId, ResourceId, usize), wgpu::RenderPipeline>,
}

impl PipelineCache {
    pub fn len(&self) -> usize {
        self.pipelines.len()
    }

    pub fn get_or_create(
        &mut self,
        device: &wgpu::Device,
        layouts: &BindLayouts,
        format: wgpu::TextureFormat,
        program: &WgpuProgram,
        vertex_array: ResourceId,
        buffers: &[OwnedVertexLayout],
    ) -> wgpu::RenderPipeline {
        let key = (program.program.id, vertex_array, buffers.len());
        if let Some(pipeline) = self.pipelines.get(&key) {
            return pipeline.clone();
        }

        log::debug!(
            "creating pipeline for shader `{}` / vertex array {vertex_array}",
            program.program.name
        );

        let buffers: Vec<_> = buffers.iter().map(OwnedVertexLayout::as_wgpu).collect();
        let targets = color_targets(format);
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&program.program.name),
            layout: Some(&layouts.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &program.vertex,
                entry_point: None,
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: program.fragment.as_ref().map(|module| wgpu::FragmentState {
                module,
                entry_point: None,
                compilation_options: Default::default(),
                targets: &targets,
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        self.pipelines.insert(key, pipeline.clone());
        pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::buffer::{BufferElement, BufferLayout};
    use crate::renderer::vertex_array::AttributeTable;

    #[test]
    fn matrix_columns_become_separate_attributes() {
        let mut table = AttributeTable::new();
        table
            .push_layout(&BufferLayout::new([
                BufferElement::new(ShaderDataType::Float3, "a_Position"),
                BufferElement::new(ShaderDataType::Mat4, "a_Transform"),
            ]))
            .unwrap();

        let layouts = vertex_layouts(table.strides(), table.attributes()).unwrap();
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].stride, 12 + 64);

        let attrs = &layouts[0].attributes;
        assert_eq!(attrs.len(), 5);
        assert_eq!(attrs[0].format, wgpu::VertexFormat::Float32x3);
        assert_eq!(
            attrs[1..].iter().map(|a| a.offset).collect::<Vec<_>>(),
            vec![12, 28, 44, 60]
        );
        assert!(attrs[1..].iter().all(|a| a.format == wgpu::VertexFormat::Float32x4));
        assert_eq!(
            attrs.iter().map(|a| a.shader_location).collect::<Vec<_>>(),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn integer_attributes_stay_integer() {
        assert_eq!(vertex_format(ShaderDataType::Int3), wgpu::VertexFormat::Sint32x3);
        assert_eq!(vertex_format(ShaderDataType::Bool), wgpu::VertexFormat::Uint8);
    }

    #[test]
    fn unaligned_stride_is_rejected() {
        let mut table = AttributeTable::new();
        table
            .push_layout(&BufferLayout::new([
                BufferElement::new(ShaderDataType::Float2, "a_Position"),
                BufferElement::new(ShaderDataType::Bool, "a_Visible"),
            ]))
            .unwrap();
        assert!(matches!(
            vertex_layouts(table.strides(), table.attributes()),
            Err(RenderError::UnalignedStride { stride: 9 })
        ));
    }

    #[test]
    fn layouts_split_per_buffer() {
        let mut table = AttributeTable::new();
        table
            .push_layout(&BufferLayout::new([BufferElement::new(ShaderDataType::Float3, "a_Position")]))
            .unwrap();
        table
            .push_layout(&BufferLayout::new([BufferElement::new(ShaderDataType::Float2, "a_TexCoord")]))
            .unwrap();

        let layouts = vertex_layouts(table.strides(), table.attributes()).unwrap();
        assert_eq!(layouts.len(), 2);
        assert_eq!(layouts[1].stride, 8);
        assert_eq!(layouts[1].attributes[0].shader_location, 1);
        assert_eq!(layouts[1].attributes[0].offset, 0);
    }

    #[test]
    fn color_target_blends_into_surface_format() {
        let [target] = color_targets(wgpu::TextureFormat::Bgra8UnormSrgb);
        let target = target.unwrap();
        assert_eq!(target.format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(target.blend, Some(alpha_blend()));
        assert_eq!(target.write_mask, wgpu::ColorWrites::ALL);
    }
}

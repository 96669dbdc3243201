use std::num::NonZeroU64;

use glam::Vec4;

use crate::renderer::shader::UNIFORM_SLOT_SIZE;

/// Per-frame uniform storage.
///
/// Every draw copies its program's block into its own slot, so uploads made
/// between draws of the same frame never overwrite each other.
pub(crate) struct UniformArena {
    stride: u32,
    data: Vec<u8>,

    buffer: Option<wgpu::Buffer>,
    capacity: u64,
    bind_group: Option<wgpu::BindGroup>,
}

impl UniformArena {
    pub fn new(offset_alignment: u32) -> Self {
        Self {
            stride: align_up(UNIFORM_SLOT_SIZE, offset_alignment.max(1)),
            data: Vec::new(),
            buffer: None,
            capacity: 0,
            bind_group: None,
        }
    }

    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    pub fn slot_count(&self) -> usize {
        self.data.len() / self.stride as usize
    }

    /// Copies `bytes` into a fresh slot and returns its dynamic offset.
    pub fn push(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data.len();
        self.data.resize(offset + self.stride as usize, 0);
        let len = bytes.len().min(UNIFORM_SLOT_SIZE as usize);
        self.data[offset..offset + len].copy_from_slice(&bytes[..len]);
        offset as u32
    }

    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Uploads every slot. Returns `None` when nothing was pushed.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        layout: &wgpu::BindGroupLayout,
    ) -> Option<&wgpu::BindGroup> {
        if self.data.is_empty() {
            return None;
        }

        let required = self.data.len() as u64;
        if required > self.capacity || self.buffer.is_none() {
            let capacity = required.next_power_of_two().max(self.stride as u64 * 64);
            let buffer = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("tessera uniform arena"),
                size: capacity,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("tessera uniform bind group"),
                layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                        buffer: &buffer,
                        offset: 0,
                        size: NonZeroU64::new(UNIFORM_SLOT_SIZE as u64),
                    }),
                }],
            }));
            self.buffer = Some(buffer);
            self.capacity = capacity;
        }

        let buffer = self.buffer.as_ref()?;
        queue.write_buffer(buffer, 0, &self.data);
        self.bind_group.as_ref()
    }
}

#[inline]
pub(crate) fn align_up(value: u32, alignment: u32) -> u32 {
    value.div_ceil(alignment) * alignment
}

/// One recorded indexed draw, replayed when the frame is presented.
pub(crate) struct PendingDraw {
    pub pipeline: wgpu::RenderPipeline,
    pub vertex_buffers: Vec<wgpu::Buffer>,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
    pub uniform_offset: u32,
    pub texture: wgpu::BindGroup,
    pub viewport: (u32, u32, u32, u32),
}

/// Converts a bottom-left-origin viewport into wgpu's top-left space,
/// clamped to the surface. `None` when nothing remains visible.
pub(crate) fn surface_viewport(
    (x, y, width, height): (u32, u32, u32, u32),
    (surface_w, surface_h): (u32, u32),
) -> Option<(f32, f32, f32, f32)> {
    let x0 = x.min(surface_w);
    let x1 = x.saturating_add(width).min(surface_w);
    let y0 = y.min(surface_h);
    let y1 = y.saturating_add(height).min(surface_h);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some((
        x0 as f32,
        (surface_h - y1) as f32,
        (x1 - x0) as f32,
        (y1 - y0) as f32,
    ))
}

pub(crate) fn to_wgpu_color(color: Vec4) -> wgpu::Color {
    wgpu::Color {
        r: color.x as f64,
        g: color.y as f64,
        b: color.z as f64,
        a: color.w as f64,
    }
}

/// Encodes one pass containing every pending draw in submission order.
pub(crate) fn encode_pass(
    encoder: &mut wgpu::CommandEncoder,
    view: &wgpu::TextureView,
    clear: Option<Vec4>,
    surface_size: (u32, u32),
    uniforms: Option<&wgpu::BindGroup>,
    draws: &[PendingDraw],
) {
    let load = match clear {
        Some(color) => wgpu::LoadOp::Clear(to_wgpu_color(color)),
        None => wgpu::LoadOp::Load,
    };

    let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some("tessera frame pass"),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
                load,
                store: wgpu::StoreOp::Store,
            },
            depth_slice: None,
        })],
        depth_stencil_attachment: None,
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    });

    let Some(uniforms) = uniforms else { return };

    for draw in draws {
        let Some((x, y, w, h)) = surface_viewport(draw.viewport, surface_size) else {
            continue;
        };
        rpass.set_viewport(x, y, w, h, 0.0, 1.0);
        rpass.set_pipeline(&draw.pipeline);
        rpass.set_bind_group(0, uniforms, &[draw.uniform_offset]);
        rpass.set_bind_group(1, &draw.texture, &[]);
        for (slot, buffer) in draw.vertex_buffers.iter().enumerate() {
            rpass.set_vertex_buffer(slot as u32, buffer.slice(..));
        }
        rpass.set_index_buffer(draw.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        rpass.draw_indexed(0..draw.index_count, 0, 0..1);
    }
}

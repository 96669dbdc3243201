//! Renderer abstraction.
//!
//! Resources are created through one backend bound at startup
//! ([`Renderer::init`]). Handles are `Rc<dyn Trait>` and carry a
//! [`ResourceId`] so backends can resolve their own objects without
//! downcasting.

mod backend;
mod buffer;
mod camera;
mod error;
mod fx;
mod renderer2d;
mod scene;
mod texture;
mod vertex_array;

pub mod headless;
pub mod shader;
pub mod wgpu_backend;

pub use backend::{
    GraphicsApi, MAX_TEXTURE_SLOTS, RendererApi, RendererBackend, ResourceFactory, ResourceId,
};
pub use buffer::{BaseType, BufferElement, BufferLayout, IndexBuffer, ShaderDataType, VertexBuffer};
pub use camera::{CameraRebuilds, OrthographicBounds, OrthographicCamera};
pub use error::RenderError;
pub use fx::{FxSpec, FxSystem, Particle};
pub use renderer2d::{QuadParams, Renderer2D};
pub use scene::Renderer;
pub use shader::{Shader, ShaderLibrary, UniformValue};
pub use texture::{Texture2D, TextureFormat};
pub use vertex_array::{AttributeTable, VertexArray, VertexAttribute};

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced at the renderer's component boundary.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("no renderer backend is bound; call Renderer::init first")]
    CreatorNotBound,

    #[error("vertex buffer has no layout")]
    LayoutMissing,

    #[error("vertex array has no index buffer")]
    NoIndexBuffer,

    #[error("vertex buffer stride {stride} is not a multiple of 4 bytes")]
    UnalignedStride { stride: u32 },

    #[error("texture data must be exactly {expected} bytes, got {actual}")]
    TextureSizeMismatch { expected: usize, actual: usize },

    #[error("unsupported image channel count {0}")]
    UnsupportedChannels(u8),

    #[error("failed to load image {path}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("shader syntax error: {0}")]
    ShaderSyntax(String),

    #[error("unknown shader stage `{0}`")]
    UnknownShaderStage(String),

    #[error("shader sources must declare one or two stages, found {0}")]
    UnsupportedStages(usize),

    #[error("shader `{name}` failed to compile:\n{log}")]
    ShaderCompile { name: String, log: String },

    #[error("uniform layout error: {0}")]
    UniformLayout(String),

    #[error("shader `{0}` already exists")]
    ShaderExists(String),

    #[error("shader `{0}` not found")]
    ShaderNotFound(String),

    #[error("surface error: {0}")]
    Surface(String),
}

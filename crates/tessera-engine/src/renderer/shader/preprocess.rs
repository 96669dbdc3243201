use std::path::Path;

use crate::renderer::RenderError;

const TYPE_TOKEN: &str = "#type";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    /// Accepts `vertex`, `fragment` and `pixel`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "vertex" => Some(Self::Vertex),
            "fragment" | "pixel" => Some(Self::Fragment),
            _ => None,
        }
    }

    pub(crate) fn naga(self) -> naga::ShaderStage {
        match self {
            Self::Vertex => naga::ShaderStage::Vertex,
            Self::Fragment => naga::ShaderStage::Fragment,
        }
    }
}

/// Per-stage WGSL source split from one combined file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Option<String>,
    pub fragment: Option<String>,
}

impl ShaderSources {
    pub fn new(vertex: impl Into<String>, fragment: impl Into<String>) -> Self {
        Self {
            vertex: Some(vertex.into()),
            fragment: Some(fragment.into()),
        }
    }

    pub fn stage_count(&self) -> usize {
        usize::from(self.vertex.is_some()) + usize::from(self.fragment.is_some())
    }

    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_deref(),
            ShaderStage::Fragment => self.fragment.as_deref(),
        }
    }

    /// Stages in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        [ShaderStage::Vertex, ShaderStage::Fragment]
            .into_iter()
            .filter_map(|stage| self.get(stage).map(|src| (stage, src)))
    }

    fn set(&mut self, stage: ShaderStage, source: String) {
        match stage {
            ShaderStage::Vertex => self.vertex = Some(source),
            ShaderStage::Fragment => self.fragment = Some(source),
        }
    }
}

/// Splits a combined source into stages on `#type <stage>` lines.
///
/// A later section for the same stage replaces the earlier one. Text before
/// the first marker is ignored.
pub fn preprocess(source: &str) -> Result<ShaderSources, RenderError> {
    let mut sources = ShaderSources::default();

    let mut cursor = source.find(TYPE_TOKEN);
    while let Some(pos) = cursor {
        let after_token = pos + TYPE_TOKEN.len();
        let eol = source[after_token..]
            .find(['\r', '\n'])
            .map(|i| after_token + i)
            .ok_or_else(|| {
                RenderError::ShaderSyntax(format!("missing newline after `{TYPE_TOKEN}` marker"))
            })?;

        let stage_name = source[after_token..eol].trim();
        if stage_name.is_empty() {
            return Err(RenderError::ShaderSyntax(format!(
                "missing stage name after `{TYPE_TOKEN}`"
            )));
        }
        let stage = ShaderStage::from_name(stage_name)
            .ok_or_else(|| RenderError::UnknownShaderStage(stage_name.to_string()))?;

        let body_start = source[eol..]
            .find(|c| c != '\r' && c != '\n')
            .map_or(source.len(), |i| eol + i);
        cursor = source[body_start..]
            .find(TYPE_TOKEN)
            .map(|i| body_start + i);
        let body_end = cursor.unwrap_or(source.len());

        sources.set(stage, source[body_start..body_end].to_string());
    }

    match sources.stage_count() {
        0 => Err(RenderError::UnsupportedStages(0)),
        _ if sources.vertex.is_none() => Err(RenderError::ShaderSyntax(
            "shader has no vertex stage".to_string(),
        )),
        _ => Ok(sources),
    }
}

/// Shader name derived from a file path: the file name without its last
/// extension.
pub fn shader_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::renderer::{RenderError, Renderer};

use super::Shader;

/// Shaders keyed by name.
#[derive(Default)]
pub struct ShaderLibrary {
    shaders: HashMap<String, Rc<dyn Shader>>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `shader` under its own name.
    pub fn add(&mut self, shader: Rc<dyn Shader>) -> Result<(), RenderError> {
        let name = shader.name().to_string();
        self.add_named(name, shader)
    }

    pub fn add_named(&mut self, name: impl Into<String>, shader: Rc<dyn Shader>) -> Result<(), RenderError> {
        let name = name.into();
        if self.shaders.contains_key(&name) {
            return Err(RenderError::ShaderExists(name));
        }
        self.shaders.insert(name, shader);
        Ok(())
    }

    /// Loads from file and registers under the file-derived name.
    pub fn load(&mut self, renderer: &Renderer, path: impl AsRef<Path>) -> Result<Rc<dyn Shader>, RenderError> {
        let shader = renderer.load_shader(path)?;
        self.add(shader.clone())?;
        Ok(shader)
    }

    pub fn load_named(
        &mut self,
        renderer: &Renderer,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<Rc<dyn Shader>, RenderError> {
        let shader = renderer.load_shader(path)?;
        self.add_named(name, shader.clone())?;
        Ok(shader)
    }

    pub fn get(&self, name: &str) -> Result<Rc<dyn Shader>, RenderError> {
        self.shaders
            .get(name)
            .cloned()
            .ok_or_else(|| RenderError::ShaderNotFound(name.to_string()))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.shaders.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }
}

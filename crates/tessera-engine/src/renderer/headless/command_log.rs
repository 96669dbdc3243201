use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec4;

use crate::renderer::ResourceId;
use crate::renderer::shader::UniformSnapshot;

/// One backend call as seen by the headless renderer.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    Init,
    SetViewport {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    SetClearColor(Vec4),
    Clear,
    ResizeSurface {
        width: u32,
        height: u32,
    },
    DrawIndexed(DrawRecord),
    Present,
}

/// State captured by one indexed draw.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub shader: Option<String>,
    pub vertex_array: ResourceId,
    pub index_count: u32,

    /// Texture bound to the unit the shader samples from.
    pub texture: Option<ResourceId>,
    pub uniforms: Option<UniformSnapshot>,
}

/// Shared, inspectable list of recorded commands.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Rc<RefCell<Vec<RenderCommand>>>,
}

impl CommandLog {
    pub(crate) fn push(&self, command: RenderCommand) {
        log::trace!("headless: {command:?}");
        self.commands.borrow_mut().push(command);
    }

    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.commands.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.commands.borrow_mut().clear();
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.commands
            .borrow()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawIndexed(draw) => Some(draw.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn last_viewport(&self) -> Option<(u32, u32, u32, u32)> {
        self.commands.borrow().iter().rev().find_map(|c| match *c {
            RenderCommand::SetViewport {
                x,
                y,
                width,
                height,
            } => Some((x, y, width, height)),
            _ => None,
        })
    }

    pub fn last_clear_color(&self) -> Option<Vec4> {
        self.commands.borrow().iter().rev().find_map(|c| match c {
            RenderCommand::SetClearColor(color) => Some(*color),
            _ => None,
        })
    }

    pub fn count(&self, predicate: impl Fn(&RenderCommand) -> bool) -> usize {
        self.commands.borrow().iter().filter(|c| predicate(c)).count()
    }

    pub fn present_count(&self) -> usize {
        self.count(|c| matches!(c, RenderCommand::Present))
    }
}

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use crate::events::Event;
use crate::input::Input;
use crate::renderer::Renderer;
use crate::time::Timestep;

use super::overlay::OverlayFrame;

/// Process-unique layer identity. Ids start at 1 and are never reused.
pub type LayerId = u64;

fn next_layer_id() -> LayerId {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    NEXT.fetch_add(1, Ordering::Relaxed)
}

/// Identity and flags common to every layer.
#[derive(Debug, Clone)]
pub struct LayerInfo {
    id: LayerId,
    name: String,
    order_hint: i32,
    enabled: bool,
}

impl LayerInfo {
    /// `order_hint` is advisory; the stack keeps insertion order.
    pub fn new(name: impl Into<String>, order_hint: i32) -> Self {
        Self {
            id: next_layer_id(),
            name: name.into(),
            order_hint,
            enabled: true,
        }
    }

    #[inline]
    pub fn id(&self) -> LayerId {
        self.id
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn order_hint(&self) -> i32 {
        self.order_hint
    }
}

/// Handles a layer sees during attach, detach and update.
pub struct LayerCtx<'a> {
    pub renderer: &'a mut Renderer,
    pub input: &'a dyn Input,
    /// Drawable size in physical pixels.
    pub window_size: (u32, u32),
}

/// One participant in the per-frame update, overlay and event cycle.
///
/// Every hook defaults to a no-op. Disabled layers receive no updates and no
/// events.
pub trait Layer {
    fn info(&self) -> &LayerInfo;
    fn info_mut(&mut self) -> &mut LayerInfo;

    fn id(&self) -> LayerId {
        self.info().id
    }

    fn name(&self) -> &str {
        &self.info().name
    }

    fn order_hint(&self) -> i32 {
        self.info().order_hint
    }

    fn is_enabled(&self) -> bool {
        self.info().enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.info_mut().enabled = enabled;
    }

    fn on_attach(&mut self, _ctx: &mut LayerCtx<'_>) -> Result<()> {
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &mut LayerCtx<'_>) {}

    fn on_update(&mut self, _ctx: &mut LayerCtx<'_>, _ts: Timestep) {}

    fn on_overlay_render(&mut self, _frame: &mut OverlayFrame) {}

    /// Set `event.handled` to stop propagation to layers below.
    fn on_event(&mut self, _event: &mut Event) {}
}

/// Shared layer handle. The stack and the layer's creator may both hold one.
pub type LayerRef = Rc<RefCell<dyn Layer>>;

pub fn layer_ref<L: Layer + 'static>(layer: L) -> LayerRef {
    Rc::new(RefCell::new(layer))
}

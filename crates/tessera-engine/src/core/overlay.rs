use std::fmt::Display;

use crate::time::Timestep;

use super::layer::{Layer, LayerCtx, LayerInfo};

/// Lines collected from layers during one overlay pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayFrame {
    lines: Vec<(String, String)>,
}

impl OverlayFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, label: impl Into<String>, value: impl Display) {
        self.lines.push((label.into(), value.to_string()));
    }

    pub fn lines(&self) -> &[(String, String)] {
        &self.lines
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.lines
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, v)| v.as_str())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Stand-in for an immediate-mode debug UI.
///
/// Lives as the first overlay. The application opens a frame with `begin`,
/// lets every enabled layer add lines, then hands it back through `end`.
pub struct DebugOverlay {
    info: LayerInfo,
    attached: bool,
    frame_count: u64,
    /// Exponential moving average, seconds.
    smoothed_dt: f32,
    last_frame: Option<OverlayFrame>,
}

impl DebugOverlay {
    pub const NAME: &'static str = "DebugOverlay";

    const SMOOTHING: f32 = 0.1;

    pub fn new() -> Self {
        Self {
            info: LayerInfo::new(Self::NAME, i32::MAX),
            attached: false,
            frame_count: 0,
            smoothed_dt: 0.0,
            last_frame: None,
        }
    }

    pub fn begin(&mut self) -> OverlayFrame {
        OverlayFrame::new()
    }

    pub fn end(&mut self, frame: OverlayFrame) {
        self.frame_count += 1;
        for (label, value) in frame.lines() {
            log::trace!("overlay: {label}: {value}");
        }
        self.last_frame = Some(frame);
    }

    #[inline]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn smoothed_frame_time(&self) -> f32 {
        self.smoothed_dt
    }

    pub fn last_frame(&self) -> Option<&OverlayFrame> {
        self.last_frame.as_ref()
    }
}

impl Default for DebugOverlay {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for DebugOverlay {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn info_mut(&mut self) -> &mut LayerInfo {
        &mut self.info
    }

    fn on_attach(&mut self, _ctx: &mut LayerCtx<'_>) -> anyhow::Result<()> {
        if !self.attached {
            self.attached = true;
            log::debug!("debug overlay attached");
        }
        Ok(())
    }

    fn on_detach(&mut self, _ctx: &mut LayerCtx<'_>) {
        if self.attached {
            self.attached = false;
            log::debug!("debug overlay detached");
        }
    }

    fn on_update(&mut self, _ctx: &mut LayerCtx<'_>, ts: Timestep) {
        let dt = ts.seconds();
        self.smoothed_dt = if self.frame_count == 0 && self.smoothed_dt == 0.0 {
            dt
        } else {
            self.smoothed_dt + (dt - self.smoothed_dt) * Self::SMOOTHING
        };
    }

    fn on_overlay_render(&mut self, frame: &mut OverlayFrame) {
        if self.smoothed_dt > 0.0 {
            frame.text("frame time", format!("{:.2} ms", self.smoothed_dt * 1000.0));
        }
    }
}

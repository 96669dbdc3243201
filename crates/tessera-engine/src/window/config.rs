/// Initial window parameters.
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,

    /// Logical size in pixels.
    pub width: u32,
    pub height: u32,

    pub vsync: bool,
    pub resizable: bool,
    pub visible: bool,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            title: title.into(),
            width,
            height,
            ..Self::default()
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "tessera".to_string(),
            width: 1280,
            height: 720,
            vsync: true,
            resizable: true,
            visible: true,
        }
    }
}

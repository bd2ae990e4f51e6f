use serde::{Deserialize, Serialize};

/// Colors and type metrics applied to emitted scenes. The caller's canvas
/// overrides `background` with its own app theme after load, so the value
/// here is a placeholder matching the original light/dark surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    /// Excalidraw font family code (3 is the code font).
    pub font_family: u8,
    pub font_size: f32,
    pub background: String,
    pub node_fill: String,
    pub node_stroke: String,
    pub text_color: String,
    pub line_color: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_family: 3,
            font_size: 16.0,
            background: "#ffffff".to_string(),
            node_fill: "#e7f5ff".to_string(),
            node_stroke: "#1971c2".to_string(),
            text_color: "#1e1e1e".to_string(),
            line_color: "#868e96".to_string(),
        }
    }

    pub fn dark() -> Self {
        Self {
            font_family: 3,
            font_size: 16.0,
            background: "#1f2937".to_string(),
            node_fill: "#0b2942".to_string(),
            node_stroke: "#4dabf7".to_string(),
            text_color: "#e9ecef".to_string(),
            line_color: "#adb5bd".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}

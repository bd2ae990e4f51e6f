use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Constants driving box sizing and placement. Sizing uses fixed
/// per-character and per-line factors rather than real font metrics so a
/// given plan always produces the same coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Vertical distance between consecutive tree levels.
    pub level_height: f32,
    /// Horizontal gap between adjacent subtree slots.
    pub sibling_gap: f32,
    /// Character width as a fraction of the font size.
    pub char_width_factor: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
    pub box_padding_x: f32,
    pub box_padding_y: f32,
    pub min_node_width: f32,
    /// Attribute lines shown per box before eliding to `+N more`.
    pub max_visible_attrs: usize,
    /// Attribute line length cap; longer values are cut with an ellipsis.
    pub max_value_chars: usize,
    pub margin_x: f32,
    pub margin_y: f32,
    /// The diagram's horizontal midpoint is translated to sit here.
    pub center_x: f32,
    /// Translations smaller than this are skipped to avoid jitter.
    pub center_threshold: f32,
    /// Gap between the viewport origin and the diagram after scrolling.
    pub scroll_margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            level_height: 160.0,
            sibling_gap: 60.0,
            char_width_factor: 0.6,
            line_height: 1.25,
            box_padding_x: 12.0,
            box_padding_y: 10.0,
            min_node_width: 160.0,
            max_visible_attrs: 3,
            max_value_chars: 42,
            margin_x: 40.0,
            margin_y: 40.0,
            center_x: 800.0,
            center_threshold: 50.0,
            scroll_margin: 80.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub layout: LayoutConfig,
}

impl Config {
    pub fn light() -> Self {
        Self {
            theme: Theme::light(),
            layout: LayoutConfig::default(),
        }
    }

    pub fn dark() -> Self {
        Self {
            theme: Theme::dark(),
            layout: LayoutConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::light()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    layout: Option<LayoutOverrides>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ThemeVariables {
    font_family: Option<u8>,
    font_size: Option<f32>,
    background: Option<String>,
    node_fill: Option<String>,
    node_stroke: Option<String>,
    text_color: Option<String>,
    line_color: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LayoutOverrides {
    level_height: Option<f32>,
    sibling_gap: Option<f32>,
    max_visible_attrs: Option<usize>,
    max_value_chars: Option<usize>,
    center_x: Option<f32>,
    scroll_margin: Option<f32>,
}

/// Loads a config file. Strict JSON is tried first; json5 second, so the
/// file may carry comments and trailing commas.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        Err(_) => json5::from_str(&contents)?,
    };

    let mut config = match parsed.theme.as_deref() {
        Some("dark") => Config::dark(),
        _ => Config::light(),
    };

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.node_fill {
            config.theme.node_fill = v;
        }
        if let Some(v) = vars.node_stroke {
            config.theme.node_stroke = v;
        }
        if let Some(v) = vars.text_color {
            config.theme.text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
    }

    if let Some(layout) = parsed.layout {
        if let Some(v) = layout.level_height {
            config.layout.level_height = v;
        }
        if let Some(v) = layout.sibling_gap {
            config.layout.sibling_gap = v;
        }
        if let Some(v) = layout.max_visible_attrs {
            config.layout.max_visible_attrs = v;
        }
        if let Some(v) = layout.max_value_chars {
            config.layout.max_value_chars = v;
        }
        if let Some(v) = layout.center_x {
            config.layout.center_x = v;
        }
        if let Some(v) = layout.scroll_margin {
            config.layout.scroll_margin = v;
        }
    }

    Ok(config)
}

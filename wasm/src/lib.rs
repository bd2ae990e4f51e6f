use plan_viz::{Config, convert_with_config};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlanConvertOptions {
    theme: Option<String>,
    font_size: Option<f32>,
    background: Option<String>,
    center_x: Option<f32>,
    max_visible_attrs: Option<usize>,
}

fn build_config(options: PlanConvertOptions) -> Config {
    let mut config = if options.theme.as_deref() == Some("dark") {
        Config::dark()
    } else {
        Config::light()
    };

    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(background) = options.background {
        config.theme.background = background;
    }
    if let Some(center_x) = options.center_x {
        config.layout.center_x = center_x;
    }
    if let Some(max_visible_attrs) = options.max_visible_attrs {
        config.layout.max_visible_attrs = max_visible_attrs;
    }

    config
}

/// Converts plan text into an Excalidraw scene JSON string for the
/// browser shell. Errors come back as plain strings for the banner.
#[wasm_bindgen]
pub fn convert_plan_scene(plan: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<PlanConvertOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        PlanConvertOptions::default()
    };

    let config = build_config(options);
    let scene = convert_with_config(plan, &config)
        .map_err(|error| JsValue::from_str(&error.user_message()))?;
    serde_json::to_string(&scene).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod ir;
pub mod layout;
pub mod normalize;
pub mod parser;
pub mod scene;
pub mod state;
pub mod theme;

pub use config::{Config, LayoutConfig, load_config};
pub use error::PlanError;
pub use ir::{Attribute, PlanNode};
pub use layout::{LayoutTree, compute_layout};
pub use parser::parse_plan;
pub use scene::{Scene, SceneSink, emit_scene};
pub use state::{
    ConversionState, ConversionStatus, NODE_WARNING_THRESHOLD, should_show_performance_warning,
};
pub use theme::Theme;

#[cfg(feature = "cli")]
pub use cli::run;

/// Converts pasted plan text into a scene document with default settings.
pub fn convert(input: &str) -> Result<Scene, PlanError> {
    convert_with_config(input, &Config::default())
}

/// The whole pipeline: normalize and parse the text, lay the tree out,
/// emit the scene. Pure and stateless; safe to call repeatedly.
pub fn convert_with_config(input: &str, config: &Config) -> Result<Scene, PlanError> {
    let root = parser::parse_plan(input)?;
    let layout = layout::compute_layout(&root, &config.theme, &config.layout);
    Ok(scene::emit_scene(&layout, &config.theme, &config.layout))
}

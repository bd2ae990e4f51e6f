use serde::Serialize;
use std::collections::BTreeMap;

use crate::config::LayoutConfig;
use crate::layout::{LayoutTree, NodeBox};
use crate::theme::Theme;

/// Fields shared by every element kind, serialized the way the canvas
/// library expects them. Only fields the renderer tolerates are emitted;
/// binding fields live on the kind-specific variants.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementCommon {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub angle: f32,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: String,
    pub stroke_width: f32,
    pub stroke_style: String,
    pub roughness: u8,
    pub opacity: f32,
    pub group_ids: Vec<String>,
    pub frame_id: Option<String>,
    pub seed: u32,
    pub version: u32,
    pub version_nonce: u32,
    pub is_deleted: bool,
    pub bound_elements: Vec<ElementRef>,
    pub updated: u64,
    pub link: Option<String>,
    pub locked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ElementRef {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Roundness {
    #[serde(rename = "type")]
    pub kind: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_id: String,
    pub focus: f32,
    pub gap: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SceneElement {
    #[serde(rename_all = "camelCase")]
    Rectangle {
        #[serde(flatten)]
        common: ElementCommon,
        roundness: Roundness,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        #[serde(flatten)]
        common: ElementCommon,
        text: String,
        font_size: f32,
        font_family: u8,
        text_align: &'static str,
        vertical_align: &'static str,
        container_id: Option<String>,
        original_text: String,
        auto_resize: bool,
        line_height: f32,
    },
    #[serde(rename_all = "camelCase")]
    Arrow {
        #[serde(flatten)]
        common: ElementCommon,
        points: Vec<[f32; 2]>,
        last_committed_point: Option<[f32; 2]>,
        start_binding: Binding,
        end_binding: Binding,
        start_arrowhead: Option<&'static str>,
        end_arrowhead: Option<&'static str>,
    },
}

impl SceneElement {
    pub fn common(&self) -> &ElementCommon {
        match self {
            SceneElement::Rectangle { common, .. }
            | SceneElement::Text { common, .. }
            | SceneElement::Arrow { common, .. } => common,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Zoom {
    pub value: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub view_background_color: String,
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub zoom: Zoom,
}

/// One self-contained scene document, the exact JSON shape the external
/// canvas accepts for its initial load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: u32,
    pub source: String,
    pub elements: Vec<SceneElement>,
    pub app_state: AppState,
    pub files: BTreeMap<String, serde_json::Value>,
}

impl Scene {
    pub fn rectangle_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el, SceneElement::Rectangle { .. }))
            .count()
    }

    pub fn text_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el, SceneElement::Text { .. }))
            .count()
    }

    pub fn arrow_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|el| matches!(el, SceneElement::Arrow { .. }))
            .count()
    }
}

/// The external rendering surface. It accepts one scene per load and owns
/// all pan/zoom/edit state afterwards; the pipeline never reaches back in.
pub trait SceneSink {
    fn load_scene(&mut self, scene: &Scene);
}

/// Converts an annotated layout tree into the flat scene document: one
/// rectangle and one bound text per node, one bound arrow per edge.
pub fn emit_scene(layout: &LayoutTree, theme: &Theme, config: &LayoutConfig) -> Scene {
    let mut ids = IdGen::default();

    let mut slots = Vec::new();
    flatten(&layout.root, None, &mut ids, &mut slots);

    // Arrow ids are assigned after all node ids so rectangles can list
    // every element bound to them.
    let mut arrows = Vec::new();
    for (child_idx, slot) in slots.iter().enumerate() {
        if let Some(parent_idx) = slot.parent {
            arrows.push(ArrowSlot {
                id: ids.next_id("arrow"),
                seed: ids.seed(),
                nonce: ids.seed(),
                parent: parent_idx,
                child: child_idx,
            });
        }
    }

    let mut bound: Vec<Vec<ElementRef>> = slots
        .iter()
        .map(|slot| {
            vec![ElementRef {
                id: slot.text_id.clone(),
                kind: "text",
            }]
        })
        .collect();
    for arrow in &arrows {
        for idx in [arrow.parent, arrow.child] {
            bound[idx].push(ElementRef {
                id: arrow.id.clone(),
                kind: "arrow",
            });
        }
    }

    let mut elements = Vec::with_capacity(slots.len() * 2 + arrows.len());
    for (idx, slot) in slots.iter().enumerate() {
        elements.push(rectangle_element(slot, bound[idx].clone(), theme));
        elements.push(text_element(slot, theme, config));
    }
    for arrow in &arrows {
        elements.push(arrow_element(arrow, &slots, theme));
    }

    let bounds = layout.bounds;
    Scene {
        kind: "excalidraw",
        version: 2,
        source: env!("CARGO_PKG_NAME").to_string(),
        elements,
        app_state: AppState {
            view_background_color: theme.background.clone(),
            scroll_x: config.scroll_margin - bounds.min_x,
            scroll_y: config.scroll_margin - bounds.min_y,
            zoom: Zoom { value: 1.0 },
        },
        files: BTreeMap::new(),
    }
}

#[derive(Debug, Default)]
struct IdGen {
    next: u32,
}

impl IdGen {
    fn next_id(&mut self, kind: &str) -> String {
        self.next += 1;
        format!("{kind}-{}", self.next)
    }

    /// Seeds and nonces are mixed from the same counter, so a scene is
    /// byte-identical across runs for the same input.
    fn seed(&mut self) -> u32 {
        self.next = self.next.wrapping_add(1);
        let mut value = self.next.wrapping_mul(0x9e37_79b9);
        value ^= value >> 16;
        value = value.wrapping_mul(0x85eb_ca6b);
        value ^ (value >> 13)
    }
}

struct NodeSlot<'a> {
    node: &'a NodeBox,
    parent: Option<usize>,
    rect_id: String,
    text_id: String,
    rect_seed: u32,
    rect_nonce: u32,
    text_seed: u32,
    text_nonce: u32,
}

struct ArrowSlot {
    id: String,
    seed: u32,
    nonce: u32,
    parent: usize,
    child: usize,
}

fn flatten<'a>(
    node: &'a NodeBox,
    parent: Option<usize>,
    ids: &mut IdGen,
    slots: &mut Vec<NodeSlot<'a>>,
) {
    let slot = NodeSlot {
        node,
        parent,
        rect_id: ids.next_id("rect"),
        text_id: ids.next_id("text"),
        rect_seed: ids.seed(),
        rect_nonce: ids.seed(),
        text_seed: ids.seed(),
        text_nonce: ids.seed(),
    };
    let idx = slots.len();
    slots.push(slot);
    for child in &node.children {
        flatten(child, Some(idx), ids, slots);
    }
}

fn common_fields(
    id: String,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
    stroke: &str,
    fill: &str,
    seed: u32,
    nonce: u32,
    bound_elements: Vec<ElementRef>,
) -> ElementCommon {
    ElementCommon {
        id,
        x,
        y,
        width,
        height,
        angle: 0.0,
        stroke_color: stroke.to_string(),
        background_color: fill.to_string(),
        fill_style: "solid".to_string(),
        stroke_width: 1.0,
        stroke_style: "solid".to_string(),
        roughness: 1,
        opacity: 100.0,
        group_ids: Vec::new(),
        frame_id: None,
        seed,
        version: 1,
        version_nonce: nonce,
        is_deleted: false,
        bound_elements,
        updated: 1,
        link: None,
        locked: false,
    }
}

fn rectangle_element(slot: &NodeSlot<'_>, bound: Vec<ElementRef>, theme: &Theme) -> SceneElement {
    let node = slot.node;
    SceneElement::Rectangle {
        common: common_fields(
            slot.rect_id.clone(),
            node.x,
            node.y,
            node.width,
            node.height,
            &theme.node_stroke,
            &theme.node_fill,
            slot.rect_seed,
            slot.rect_nonce,
            bound,
        ),
        roundness: Roundness { kind: 3 },
    }
}

fn text_element(slot: &NodeSlot<'_>, theme: &Theme, config: &LayoutConfig) -> SceneElement {
    let node = slot.node;
    let label = &node.label;
    let text = label.lines.join("\n");
    SceneElement::Text {
        common: common_fields(
            slot.text_id.clone(),
            node.x + (node.width - label.width) / 2.0,
            node.y + (node.height - label.height) / 2.0,
            label.width,
            label.height,
            &theme.text_color,
            "transparent",
            slot.text_seed,
            slot.text_nonce,
            Vec::new(),
        ),
        original_text: text.clone(),
        text,
        font_size: theme.font_size,
        font_family: theme.font_family,
        text_align: "center",
        vertical_align: "middle",
        container_id: Some(slot.rect_id.clone()),
        auto_resize: true,
        line_height: config.line_height,
    }
}

fn arrow_element(arrow: &ArrowSlot, slots: &[NodeSlot<'_>], theme: &Theme) -> SceneElement {
    let (start_x, start_y) = slots[arrow.parent].node.bottom_center();
    let (end_x, end_y) = slots[arrow.child].node.top_center();
    SceneElement::Arrow {
        common: common_fields(
            arrow.id.clone(),
            start_x,
            start_y,
            end_x - start_x,
            end_y - start_y,
            &theme.line_color,
            "transparent",
            arrow.seed,
            arrow.nonce,
            Vec::new(),
        ),
        points: vec![[0.0, 0.0], [end_x - start_x, end_y - start_y]],
        last_committed_point: None,
        start_binding: Binding {
            element_id: slots[arrow.parent].rect_id.clone(),
            focus: 0.0,
            gap: 1.0,
        },
        end_binding: Binding {
            element_id: slots[arrow.child].rect_id.clone(),
            focus: 0.0,
            gap: 1.0,
        },
        start_arrowhead: None,
        end_arrowhead: Some("arrow"),
    }
}

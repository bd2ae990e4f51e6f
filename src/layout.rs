use crate::config::LayoutConfig;
use crate::ir::PlanNode;
use crate::theme::Theme;

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub lines: Vec<String>,
    pub width: f32,
    pub height: f32,
}

/// A plan operator with its computed box. Mirrors the parsed tree shape;
/// positions are in one global coordinate space shared by every node.
#[derive(Debug, Clone)]
pub struct NodeBox {
    pub operator: String,
    pub depth: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub label: TextBlock,
    /// Horizontal extent reserved for this subtree during placement. At
    /// least `width`, and wide enough for all child slots plus gaps.
    pub span: f32,
    pub children: Vec<NodeBox>,
}

impl NodeBox {
    pub fn top_center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y)
    }

    pub fn bottom_center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height)
    }

    /// Connector anchors for each child edge, parent side first.
    pub fn child_connectors(&self) -> Vec<((f32, f32), (f32, f32))> {
        self.children
            .iter()
            .map(|child| (self.bottom_center(), child.top_center()))
            .collect()
    }

    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(NodeBox::node_count)
            .sum::<usize>()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center_x(&self) -> f32 {
        self.min_x + self.width() / 2.0
    }
}

#[derive(Debug, Clone)]
pub struct LayoutTree {
    pub root: NodeBox,
    pub bounds: Bounds,
    pub node_count: usize,
}

/// Computes a position and size for every node of the tree. Total over any
/// valid tree; identical input always yields identical coordinates.
///
/// Orientation is top-down: the root operator sits at the top, data
/// sources at the bottom, and every node of one depth shares one y.
pub fn compute_layout(root: &PlanNode, theme: &Theme, config: &LayoutConfig) -> LayoutTree {
    let mut boxed = measure(root, theme, config);
    place(&mut boxed, config.margin_x, config);

    // Anchor the diagram's horizontal midpoint near the canvas reference,
    // unless the shift is too small to matter.
    let bounds = tree_bounds(&boxed);
    let shift = config.center_x - bounds.center_x();
    if shift.abs() > config.center_threshold {
        translate_x(&mut boxed, shift);
    }

    let bounds = tree_bounds(&boxed);
    let node_count = boxed.node_count();
    LayoutTree {
        root: boxed,
        bounds,
        node_count,
    }
}

/// The text shown inside a node's box: the operator name, then one line
/// per attribute up to the display cap, then a `+N more` marker.
fn display_lines(node: &PlanNode, config: &LayoutConfig) -> Vec<String> {
    let mut lines = vec![node.operator.clone()];
    for attr in node.attributes.iter().take(config.max_visible_attrs) {
        let text = if attr.is_flag() {
            attr.value.clone()
        } else {
            format!("{}={}", attr.key, attr.value)
        };
        lines.push(truncate_chars(&text, config.max_value_chars));
    }
    let hidden = node.attributes.len().saturating_sub(config.max_visible_attrs);
    if hidden > 0 {
        lines.push(format!("+{hidden} more"));
    }
    lines
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Post-order sizing pass. Children are measured first so each node can
/// record the span its whole subtree will occupy.
fn measure(node: &PlanNode, theme: &Theme, config: &LayoutConfig) -> NodeBox {
    let children: Vec<NodeBox> = node
        .children
        .iter()
        .map(|child| measure(child, theme, config))
        .collect();

    let lines = display_lines(node, config);
    let max_chars = lines.iter().map(|l| l.chars().count()).max().unwrap_or(1);
    let label = TextBlock {
        width: max_chars as f32 * theme.font_size * config.char_width_factor,
        height: lines.len() as f32 * theme.font_size * config.line_height,
        lines,
    };

    let width = (label.width + 2.0 * config.box_padding_x).max(config.min_node_width);
    let height = label.height + 2.0 * config.box_padding_y;
    let span = width.max(children_span(&children, config));

    NodeBox {
        operator: node.operator.clone(),
        depth: node.depth,
        x: 0.0,
        y: 0.0,
        width,
        height,
        label,
        span,
        children,
    }
}

fn children_span(children: &[NodeBox], config: &LayoutConfig) -> f32 {
    if children.is_empty() {
        return 0.0;
    }
    let gaps = config.sibling_gap * (children.len() as f32 - 1.0);
    children.iter().map(|child| child.span).sum::<f32>() + gaps
}

/// Placement pass. Each node owns the slot `[slot_left, slot_left + span]`;
/// child slots are packed left to right inside it, so sibling boxes can
/// never intersect. A parent centers on the midpoint of its children's
/// boxes, clamped to its own slot.
fn place(node: &mut NodeBox, slot_left: f32, config: &LayoutConfig) {
    node.y = config.margin_y + node.depth as f32 * config.level_height;

    if node.children.is_empty() {
        node.x = slot_left + (node.span - node.width) / 2.0;
    } else {
        let spread = children_span(&node.children, config);
        let mut cursor = slot_left + (node.span - spread) / 2.0;
        for child in &mut node.children {
            place(child, cursor, config);
            cursor += child.span + config.sibling_gap;
        }

        let first = node.children.first().expect("children is non-empty");
        let last = node.children.last().expect("children is non-empty");
        let midpoint = (first.x + last.x + last.width) / 2.0;
        node.x = (midpoint - node.width / 2.0)
            .clamp(slot_left, slot_left + node.span - node.width);
    }

    debug_assert!(node.x.is_finite() && node.y.is_finite());
}

fn tree_bounds(root: &NodeBox) -> Bounds {
    let mut bounds = Bounds {
        min_x: f32::MAX,
        min_y: f32::MAX,
        max_x: f32::MIN,
        max_y: f32::MIN,
    };
    accumulate_bounds(root, &mut bounds);
    bounds
}

fn accumulate_bounds(node: &NodeBox, bounds: &mut Bounds) {
    bounds.min_x = bounds.min_x.min(node.x);
    bounds.min_y = bounds.min_y.min(node.y);
    bounds.max_x = bounds.max_x.max(node.x + node.width);
    bounds.max_y = bounds.max_y.max(node.y + node.height);
    for child in &node.children {
        accumulate_bounds(child, bounds);
    }
}

fn translate_x(node: &mut NodeBox, shift: f32) {
    node.x += shift;
    for child in &mut node.children {
        translate_x(child, shift);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_plan;

    const JOIN_PLAN: &str = "\
HashJoinExec: mode=CollectLeft, join_type=Inner, on=[(d_dkey@0, f_dkey@0)]
  CoalescePartitionsExec
    DataSourceExec: file_groups={2 groups: [[d1.parquet], [d2.parquet]]}
  DataSourceExec: file_groups={3 groups: [[f1.parquet], [f2.parquet], [f3.parquet]]}";

    fn layout(input: &str) -> LayoutTree {
        let root = parse_plan(input).unwrap();
        compute_layout(&root, &Theme::light(), &LayoutConfig::default())
    }

    #[test]
    fn siblings_do_not_overlap() {
        let tree = layout(JOIN_PLAN);
        let left = &tree.root.children[0];
        let right = &tree.root.children[1];
        assert!(left.x + left.width <= right.x);
    }

    #[test]
    fn parent_is_centered_over_children() {
        let tree = layout(JOIN_PLAN);
        let first = &tree.root.children[0];
        let last = &tree.root.children[1];
        let midpoint = (first.x + last.x + last.width) / 2.0;
        let root_center = tree.root.x + tree.root.width / 2.0;
        assert!((root_center - midpoint).abs() < 0.5);
    }

    #[test]
    fn depth_fixes_the_vertical_coordinate() {
        let config = LayoutConfig::default();
        let tree = layout(JOIN_PLAN);
        let root = &tree.root;
        assert_eq!(root.y, config.margin_y);
        for child in &root.children {
            assert_eq!(child.y, config.margin_y + config.level_height);
        }
        let scan = &root.children[0].children[0];
        assert_eq!(scan.y, config.margin_y + 2.0 * config.level_height);
    }

    #[test]
    fn diagram_midpoint_lands_on_the_reference_x() {
        let config = LayoutConfig::default();
        let tree = layout(JOIN_PLAN);
        assert!((tree.bounds.center_x() - config.center_x).abs() <= config.center_threshold);
    }

    #[test]
    fn attribute_lines_elide_past_the_display_cap() {
        let root =
            parse_plan("SortExec: a=1, b=2, c=3, d=4, e=5\n  DataSourceExec: file_groups={1 group}")
                .unwrap();
        let tree = compute_layout(&root, &Theme::light(), &LayoutConfig::default());
        let lines = &tree.root.label.lines;
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "SortExec");
        assert_eq!(lines[4], "+2 more");
    }

    #[test]
    fn long_attribute_values_are_cut_with_an_ellipsis() {
        let config = LayoutConfig::default();
        let value = "x".repeat(200);
        let root = parse_plan(&format!("SortExec: expr={value}")).unwrap();
        let tree = compute_layout(&root, &Theme::light(), &config);
        let attr_line = &tree.root.label.lines[1];
        assert_eq!(attr_line.chars().count(), config.max_value_chars);
        assert!(attr_line.ends_with('…'));
    }

    #[test]
    fn identical_trees_lay_out_identically() {
        let a = layout(JOIN_PLAN);
        let b = layout(JOIN_PLAN);
        assert_eq!(a.root.x, b.root.x);
        assert_eq!(a.bounds.min_x, b.bounds.min_x);
        assert_eq!(a.node_count, b.node_count);
    }

    #[test]
    fn connectors_anchor_on_box_centers() {
        let tree = layout(JOIN_PLAN);
        let connectors = tree.root.child_connectors();
        assert_eq!(connectors.len(), 2);
        for ((px, py), (cx, cy)) in connectors {
            assert_eq!((px, py), tree.root.bottom_center());
            assert!(cy > py);
            assert!(cx.is_finite());
        }
    }
}

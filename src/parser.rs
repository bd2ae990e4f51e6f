use crate::error::PlanError;
use crate::ir::{Attribute, PlanNode};
use crate::normalize::{PlanLine, normalize};

/// Tabs in plan indentation count as this many spaces. Only the relative
/// ordering of indentation widths matters for tree shape.
const TAB_WIDTH: usize = 2;

/// Parses pasted plan text into its operator tree.
///
/// Normalization (EXPLAIN unboxing, SQL preamble stripping) happens first;
/// the tree shape is then recovered purely from leading whitespace.
pub fn parse_plan(input: &str) -> Result<PlanNode, PlanError> {
    let lines = normalize(input)?;
    build_tree(&lines)
}

fn build_tree(lines: &[PlanLine]) -> Result<PlanNode, PlanError> {
    // Stack of open ancestors, deepest last, each with the indentation
    // width it was found at.
    let mut stack: Vec<(usize, PlanNode)> = Vec::new();

    for line in lines {
        let width = indent_width(&line.indent);
        let mut node = parse_line(line)?;

        while let Some((top_width, _)) = stack.last() {
            if *top_width < width {
                break;
            }
            let (_, closed) = stack.pop().expect("stack is non-empty");
            match stack.last_mut() {
                Some((_, parent)) => parent.children.push(closed),
                None => {
                    return Err(PlanError::MultipleRoots {
                        line: line.number,
                        operator: node.operator,
                    });
                }
            }
        }

        node.depth = stack.len();
        stack.push((width, node));
    }

    let mut current: Option<PlanNode> = None;
    while let Some((_, mut node)) = stack.pop() {
        if let Some(child) = current.take() {
            node.children.push(child);
        }
        current = Some(node);
    }
    current.ok_or(PlanError::EmptyPlan)
}

fn indent_width(indent: &str) -> usize {
    indent
        .chars()
        .map(|ch| if ch == '\t' { TAB_WIDTH } else { 1 })
        .sum()
}

/// Splits one line into operator name and attributes. The name is the text
/// before the first `:` or the first whitespace, whichever comes first;
/// everything after the separator is the attribute remainder.
fn parse_line(line: &PlanLine) -> Result<PlanNode, PlanError> {
    let text = line.text.as_str();
    let colon = text.find(':');
    let space = text.find(char::is_whitespace);

    let (name, rest) = match (colon, space) {
        (None, None) => (text, ""),
        (Some(at), None) => (&text[..at], &text[at + 1..]),
        (None, Some(at)) => (&text[..at], text[at..].trim_start()),
        (Some(colon_at), Some(space_at)) => {
            if colon_at < space_at {
                (&text[..colon_at], &text[colon_at + 1..])
            } else {
                (&text[..space_at], text[space_at..].trim_start())
            }
        }
    };

    if name.is_empty() {
        return Err(PlanError::MalformedLine {
            line: line.number,
            text: line.text.clone(),
        });
    }

    let mut node = PlanNode::new(name, 0);
    node.attributes = parse_attributes(rest.trim(), line.number)?;
    Ok(node)
}

/// Splits the attribute remainder on top-level commas. Commas inside
/// matching `{}`, `[]` or `()` stay part of the value; values are captured
/// verbatim past the first `=`.
fn parse_attributes(rest: &str, line_number: usize) -> Result<Vec<Attribute>, PlanError> {
    if rest.is_empty() {
        return Ok(Vec::new());
    }

    let mut attributes = Vec::new();
    let mut open_stack: Vec<char> = Vec::new();
    let mut segment_start = 0;

    for (idx, ch) in rest.char_indices() {
        match ch {
            '{' | '[' | '(' => open_stack.push(ch),
            '}' | ']' | ')' => {
                // A closer with no matching opener is literal text.
                if open_stack.last().copied() == Some(matching_open(ch)) {
                    open_stack.pop();
                }
            }
            ',' if open_stack.is_empty() => {
                push_segment(&mut attributes, &rest[segment_start..idx]);
                segment_start = idx + 1;
            }
            _ => {}
        }
    }

    if let Some(open) = open_stack.first() {
        return Err(PlanError::UnbalancedDelimiter {
            line: line_number,
            open: *open,
        });
    }

    push_segment(&mut attributes, &rest[segment_start..]);
    Ok(attributes)
}

fn matching_open(close: char) -> char {
    match close {
        '}' => '{',
        ']' => '[',
        _ => '(',
    }
}

fn push_segment(attributes: &mut Vec<Attribute>, segment: &str) {
    let segment = segment.trim();
    if segment.is_empty() {
        return;
    }
    let attribute = match segment.split_once('=') {
        Some((key, value)) => Attribute {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => Attribute {
            key: String::new(),
            value: segment.to_string(),
        },
    };
    attributes.push(attribute);
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PLAN: &str = "\
ProjectionExec: expr=[id@0 as id, name@1 as name, amount@2 as amount]
  CoalesceBatchesExec: target_batch_size=8192
    FilterExec: amount@2 > 100
      RepartitionExec: partitioning=RoundRobinBatch(4)
        DataSourceExec: file_groups={1 group: [[orders.parquet]]}, projection=[id, name, amount]";

    fn chain(root: &PlanNode) -> Vec<&PlanNode> {
        let mut nodes = vec![root];
        let mut node = root;
        while let Some(child) = node.children.first() {
            nodes.push(child);
            node = child;
        }
        nodes
    }

    #[test]
    fn parses_single_chain_plan() {
        let root = parse_plan(SAMPLE_PLAN).unwrap();
        assert_eq!(root.node_count(), 5);
        let nodes = chain(&root);
        let operators: Vec<&str> = nodes.iter().map(|n| n.operator.as_str()).collect();
        assert_eq!(
            operators,
            [
                "ProjectionExec",
                "CoalesceBatchesExec",
                "FilterExec",
                "RepartitionExec",
                "DataSourceExec"
            ]
        );
        for (depth, node) in nodes.iter().enumerate() {
            assert_eq!(node.depth, depth);
        }
    }

    #[test]
    fn attribute_values_keep_nested_commas() {
        let root = parse_plan(SAMPLE_PLAN).unwrap();
        let scan = chain(&root)[4];
        assert_eq!(scan.attributes.len(), 2);
        assert_eq!(
            scan.attribute("file_groups"),
            Some("{1 group: [[orders.parquet]]}")
        );
        assert_eq!(scan.attribute("projection"), Some("[id, name, amount]"));
    }

    #[test]
    fn condition_without_equals_is_flag_attribute() {
        let root = parse_plan("FilterExec: amount@2 > 100\n  DataSourceExec").unwrap();
        assert_eq!(root.attributes.len(), 1);
        assert!(root.attributes[0].is_flag());
        assert_eq!(root.attributes[0].value, "amount@2 > 100");
    }

    #[test]
    fn operator_without_attributes_is_valid() {
        let root = parse_plan("CoalescePartitionsExec\n  DataSourceExec").unwrap();
        assert_eq!(root.operator, "CoalescePartitionsExec");
        assert!(root.attributes.is_empty());
        assert_eq!(root.children.len(), 1);
    }

    #[test]
    fn fanout_plan_keeps_sibling_order() {
        let input = "\
HashJoinExec: mode=CollectLeft, join_type=Inner
  CoalescePartitionsExec
    DataSourceExec: file_groups={2 groups: [[d1.parquet], [d2.parquet]]}
  DataSourceExec: file_groups={3 groups: [[f1.parquet], [f2.parquet], [f3.parquet]]}";
        let root = parse_plan(input).unwrap();
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].operator, "CoalescePartitionsExec");
        assert_eq!(root.children[0].children.len(), 1);
        assert_eq!(root.children[1].operator, "DataSourceExec");
        assert_eq!(root.children[1].depth, 1);
        assert_eq!(root.children[0].children[0].depth, 2);
    }

    #[test]
    fn second_top_level_operator_is_rejected() {
        let err = parse_plan("SortExec: expr=[a ASC]\nProjectionExec: expr=[a]").unwrap_err();
        assert_eq!(
            err,
            PlanError::MultipleRoots {
                line: 2,
                operator: "ProjectionExec".to_string(),
            }
        );
    }

    #[test]
    fn line_with_no_operator_name_is_malformed() {
        let err = parse_plan(": expr=[a]").unwrap_err();
        assert!(matches!(err, PlanError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn unclosed_brace_is_reported_with_line_number() {
        let input = "SortExec: expr=[a ASC]\n  DataSourceExec: file_groups={1 group: [[a.parquet]]";
        let err = parse_plan(input).unwrap_err();
        assert_eq!(
            err,
            PlanError::UnbalancedDelimiter { line: 2, open: '{' }
        );
    }

    #[test]
    fn stray_closer_is_kept_as_text() {
        let root = parse_plan("FilterExec: a) > 1").unwrap();
        assert_eq!(root.attributes[0].value, "a) > 1");
    }

    #[test]
    fn duplicate_keys_are_both_kept_in_order() {
        let root = parse_plan("SortExec: expr=[a ASC], expr=[b DESC]").unwrap();
        assert_eq!(root.attributes.len(), 2);
        assert_eq!(root.attribute("expr"), Some("[a ASC]"));
        assert_eq!(root.attributes[1].value, "[b DESC]");
    }

    #[test]
    fn tabs_and_spaces_resolve_to_the_same_tree() {
        let spaced = "SortExec\n  FilterExec: a > 1\n    DataSourceExec";
        let tabbed = "SortExec\n\tFilterExec: a > 1\n\t\tDataSourceExec";
        assert_eq!(parse_plan(spaced).unwrap(), parse_plan(tabbed).unwrap());
    }

    #[test]
    fn dedent_closes_back_to_the_matching_ancestor() {
        let input = "\
UnionExec
  SortExec: expr=[a ASC]
    FilterExec: a > 1
      DataSourceExec: file_groups={1 group}
  ProjectionExec: expr=[b@0 as b]
    DataSourceExec: file_groups={1 group}";
        let root = parse_plan(input).unwrap();
        assert_eq!(root.operator, "UnionExec");
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.children[0].children[0].operator, "FilterExec");
        assert_eq!(root.children[1].children.len(), 1);
        assert_eq!(root.max_depth(), 3);
    }

    #[test]
    fn boxed_explain_report_parses_to_physical_root() {
        let input = "\
EXPLAIN SELECT f.f_dkey FROM fact f;
+---------------+-----------------------------------------------------------+
| plan_type     | plan                                                      |
+---------------+-----------------------------------------------------------+
| logical_plan  | Projection: f.f_dkey                                      |
|               |   TableScan: fact projection=[f_dkey]                     |
| physical_plan | ProjectionExec: expr=[f_dkey@0 as f_dkey]                 |
|               |   DataSourceExec: file_groups={1 group: [[f.parquet]]}    |
+---------------+-----------------------------------------------------------+";
        let root = parse_plan(input).unwrap();
        assert_eq!(root.operator, "ProjectionExec");
        assert_eq!(root.node_count(), 2);
        assert_eq!(root.children[0].operator, "DataSourceExec");
    }
}

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlanError;

static TABLE_BORDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\+[-+]+\+\s*$").unwrap());
static SQL_STMT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(explain|select|with|insert|update|delete|create)\b").unwrap());

/// One retained plan line. `indent` carries the leading whitespace exactly
/// as found in the source, since it is the only record of tree structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanLine {
    pub indent: String,
    pub text: String,
    /// 1-based position within the normalized sequence (raw input line
    /// number when the input was not a boxed report).
    pub number: usize,
}

/// Reduces arbitrary pasted text to the physical plan lines.
///
/// Boxed EXPLAIN reports (`+---+` borders, `plan_type`/`plan` columns) are
/// unwrapped to the `physical_plan` row and its continuations; otherwise a
/// leading SQL statement is dropped and the rest is taken verbatim.
pub fn normalize(input: &str) -> Result<Vec<PlanLine>, PlanError> {
    let rows: Vec<(usize, String)> = match extract_physical_plan(input) {
        Some(rows) => rows
            .into_iter()
            .enumerate()
            .map(|(idx, text)| (idx + 1, text))
            .collect(),
        None => {
            let raw_lines: Vec<&str> = input.lines().collect();
            let start = strip_sql_preamble(&raw_lines);
            raw_lines[start..]
                .iter()
                .enumerate()
                .map(|(idx, raw)| (start + idx + 1, (*raw).to_string()))
                .collect()
        }
    };

    let mut lines = Vec::new();
    for (number, raw) in rows {
        if raw.trim().is_empty() {
            continue;
        }
        let (indent, text) = split_indent(&raw);
        lines.push(PlanLine {
            indent: indent.to_string(),
            text: text.trim_end().to_string(),
            number,
        });
    }

    if lines.is_empty() {
        return Err(PlanError::EmptyPlan);
    }
    Ok(lines)
}

/// Unwraps a boxed EXPLAIN report, returning the `plan` cells of the
/// `physical_plan` row and its continuation rows in order. `None` when the
/// input carries no such table, in which case it is treated as raw text.
fn extract_physical_plan(input: &str) -> Option<Vec<String>> {
    let lines: Vec<&str> = input.lines().collect();
    let border_idx = lines.iter().position(|l| TABLE_BORDER_RE.is_match(l))?;
    let columns = column_spans(lines[border_idx])?;

    let header = lines.get(border_idx + 1)?;
    if !header.trim_start().starts_with('|') {
        return None;
    }
    let header_cells = slice_cells(header, &columns);
    let plan_type_col = header_cells
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case("plan_type"))?;
    let plan_col = header_cells
        .iter()
        .position(|cell| cell.trim().eq_ignore_ascii_case("plan"))?;

    let mut section: Option<String> = None;
    let mut rows = Vec::new();
    for raw in &lines[border_idx + 2..] {
        if TABLE_BORDER_RE.is_match(raw) || !raw.trim_start().starts_with('|') {
            continue;
        }
        let cells = slice_cells(raw, &columns);
        let tag = cells
            .get(plan_type_col)
            .map(|cell| cell.trim())
            .unwrap_or("");
        if !tag.is_empty() {
            section = Some(tag.to_ascii_lowercase());
        }
        if section.as_deref() == Some("physical_plan") {
            let cell = cells.get(plan_col).copied().unwrap_or("");
            rows.push(unpad_cell(cell));
        }
    }
    Some(rows)
}

/// Byte ranges of the table columns, taken from the `+` positions of the
/// border line. Data rows are padded to the same offsets.
fn column_spans(border: &str) -> Option<Vec<(usize, usize)>> {
    let marks: Vec<usize> = border
        .char_indices()
        .filter(|(_, ch)| *ch == '+')
        .map(|(idx, _)| idx)
        .collect();
    if marks.len() < 2 {
        return None;
    }
    Some(marks.windows(2).map(|pair| (pair[0], pair[1])).collect())
}

fn slice_cells<'a>(row: &'a str, columns: &[(usize, usize)]) -> Vec<&'a str> {
    columns
        .iter()
        .map(|(start, end)| {
            row.get(start + 1..*end)
                .or_else(|| row.get(start + 1..))
                .unwrap_or("")
        })
        .collect()
}

/// Cells are rendered as `| content`, one pad space after the separator.
/// Only that pad is removed so the plan's own indentation survives.
fn unpad_cell(cell: &str) -> String {
    cell.strip_prefix(' ').unwrap_or(cell).trim_end().to_string()
}

/// Index of the first line that is not part of a leading SQL statement.
fn strip_sql_preamble(lines: &[&str]) -> usize {
    let mut start = 0;
    let mut in_statement = false;
    for (idx, raw) in lines.iter().enumerate() {
        let trimmed = raw.trim();
        if in_statement {
            start = idx + 1;
            if trimmed.ends_with(';') {
                in_statement = false;
            }
            continue;
        }
        if trimmed.is_empty() {
            start = idx + 1;
            continue;
        }
        if SQL_STMT_RE.is_match(trimmed) {
            start = idx + 1;
            in_statement = !trimmed.ends_with(';');
            continue;
        }
        if trimmed.ends_with(';') {
            start = idx + 1;
            continue;
        }
        break;
    }
    start
}

fn split_indent(line: &str) -> (&str, &str) {
    let content_start = line
        .find(|ch: char| ch != ' ' && ch != '\t')
        .unwrap_or(line.len());
    line.split_at(content_start)
}

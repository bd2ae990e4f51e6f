use thiserror::Error;

/// Failures surfaced while turning pasted plan text into a tree. All of
/// these are recoverable input errors; layout and scene emission are total
/// over a valid tree and have no error kind of their own.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    #[error("no execution plan found in the input")]
    EmptyPlan,

    #[error("line {line}: `{operator}` is a second top-level operator; a physical plan has exactly one root")]
    MultipleRoots { line: usize, operator: String },

    #[error("line {line}: cannot split `{text}` into an operator name and attributes")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: `{open}` is never closed in the attribute list")]
    UnbalancedDelimiter { line: usize, open: char },
}

impl PlanError {
    /// Message suitable for direct display in a validation banner.
    pub fn user_message(&self) -> String {
        match self {
            PlanError::EmptyPlan => {
                "Please enter an execution plan to visualize.".to_string()
            }
            other => other.to_string(),
        }
    }
}

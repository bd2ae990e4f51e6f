use crate::error::PlanError;
use crate::scene::Scene;

/// Plans above this node count still convert fine; callers surface a
/// performance warning before handing the scene to the canvas.
pub const NODE_WARNING_THRESHOLD: usize = 100;

pub fn should_show_performance_warning(node_count: usize) -> bool {
    node_count > NODE_WARNING_THRESHOLD
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStatus {
    Idle,
    Converting,
    Success,
    Error,
}

/// Conversion state held by the calling application, advanced only through
/// the pure reducers below. A failed conversion never discards the last
/// successful scene, so the canvas can keep showing it.
#[derive(Debug, Clone)]
pub struct ConversionState {
    pub status: ConversionStatus,
    pub error_message: Option<String>,
    pub scene: Option<Scene>,
    pub previous_scene: Option<Scene>,
}

impl ConversionState {
    pub fn new() -> Self {
        Self {
            status: ConversionStatus::Idle,
            error_message: None,
            scene: None,
            previous_scene: None,
        }
    }

    /// A conversion has been requested.
    pub fn begin(self) -> Self {
        Self {
            status: ConversionStatus::Converting,
            error_message: None,
            ..self
        }
    }

    /// A conversion finished. Success replaces both slots; failure keeps
    /// the previous scene for fallback display.
    pub fn finish(self, outcome: Result<Scene, PlanError>) -> Self {
        match outcome {
            Ok(scene) => Self {
                status: ConversionStatus::Success,
                error_message: None,
                previous_scene: Some(scene.clone()),
                scene: Some(scene),
            },
            Err(error) => Self {
                status: ConversionStatus::Error,
                error_message: Some(error.user_message()),
                scene: None,
                previous_scene: self.previous_scene,
            },
        }
    }

    /// The scene the canvas should show: the current one, or the last
    /// success while the current conversion is failed.
    pub fn display_scene(&self) -> Option<&Scene> {
        self.scene.as_ref().or(self.previous_scene.as_ref())
    }

    pub fn has_elements(&self) -> bool {
        self.display_scene()
            .map(|scene| !scene.elements.is_empty())
            .unwrap_or(false)
    }
}

impl Default for ConversionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert;

    const PLAN: &str = "FilterExec: id@0 > 100\n  DataSourceExec: file_groups={1 group}";

    #[test]
    fn starts_idle_and_empty() {
        let state = ConversionState::new();
        assert_eq!(state.status, ConversionStatus::Idle);
        assert!(state.display_scene().is_none());
        assert!(!state.has_elements());
    }

    #[test]
    fn success_fills_both_slots() {
        let state = ConversionState::new().begin().finish(convert(PLAN));
        assert_eq!(state.status, ConversionStatus::Success);
        assert!(state.error_message.is_none());
        assert!(state.has_elements());
    }

    #[test]
    fn failure_after_success_keeps_the_previous_scene() {
        let state = ConversionState::new().begin().finish(convert(PLAN));
        let elements = state.display_scene().unwrap().elements.len();

        let state = state.begin().finish(convert(""));
        assert_eq!(state.status, ConversionStatus::Error);
        assert_eq!(
            state.error_message.as_deref(),
            Some("Please enter an execution plan to visualize.")
        );
        // The stale scene survives for fallback display.
        assert_eq!(state.display_scene().unwrap().elements.len(), elements);
    }

    #[test]
    fn begin_clears_a_prior_error() {
        let state = ConversionState::new().begin().finish(convert(""));
        assert!(state.error_message.is_some());
        let state = state.begin();
        assert_eq!(state.status, ConversionStatus::Converting);
        assert!(state.error_message.is_none());
    }

    #[test]
    fn warning_threshold_is_advisory() {
        assert!(!should_show_performance_warning(NODE_WARNING_THRESHOLD));
        assert!(should_show_performance_warning(NODE_WARNING_THRESHOLD + 1));
    }
}

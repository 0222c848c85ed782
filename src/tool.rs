//! The exclusive interaction mode machine. At most one tool is active;
//! gesture handlers check the mode before doing anything.

use crate::annotation::HighlightColor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Browse,
    PlacingNote,
    DrawingHighlight,
}

#[derive(Debug, Default)]
pub struct ToolController {
    mode: InteractionMode,
    color: HighlightColor,
}

impl ToolController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn color(&self) -> HighlightColor {
        self.color
    }

    /// The only transition entry point: toggling the active mode returns to
    /// browse, toggling any other mode switches to it.
    pub fn toggle(&mut self, mode: InteractionMode) -> InteractionMode {
        self.mode = if self.mode == mode {
            InteractionMode::Browse
        } else {
            mode
        };
        self.mode
    }

    pub fn cancel(&mut self) {
        self.mode = InteractionMode::Browse;
    }

    /// One successful note placement exits note mode. Highlight mode stays
    /// active across placements until toggled off.
    pub fn note_placed(&mut self) {
        if self.mode == InteractionMode::PlacingNote {
            self.mode = InteractionMode::Browse;
        }
    }

    pub fn cycle_color(&mut self) {
        self.color = self.color.next();
    }

    /// Swipe navigation is suppressed while a placement tool is active.
    pub fn suppresses_navigation(&self) -> bool {
        self.mode != InteractionMode::Browse
    }

    /// Label for the status line, the visible "current tool" affordance.
    pub fn status_label(&self) -> String {
        match self.mode {
            InteractionMode::Browse => "browse".to_string(),
            InteractionMode::PlacingNote => "note: click a page to place".to_string(),
            InteractionMode::DrawingHighlight => {
                format!("highlight ({}): drag on a page", self.color.as_str())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_browse() {
        assert_eq!(ToolController::new().mode(), InteractionMode::Browse);
    }

    #[test]
    fn toggling_active_mode_returns_to_browse() {
        let mut tool = ToolController::new();
        tool.toggle(InteractionMode::PlacingNote);
        assert_eq!(tool.mode(), InteractionMode::PlacingNote);
        tool.toggle(InteractionMode::PlacingNote);
        assert_eq!(tool.mode(), InteractionMode::Browse);
    }

    #[test]
    fn exactly_one_mode_is_active() {
        let mut tool = ToolController::new();
        tool.toggle(InteractionMode::PlacingNote);
        tool.toggle(InteractionMode::DrawingHighlight);
        assert_eq!(tool.mode(), InteractionMode::DrawingHighlight);
    }

    #[test]
    fn note_placement_exits_note_mode_only() {
        let mut tool = ToolController::new();
        tool.toggle(InteractionMode::PlacingNote);
        tool.note_placed();
        assert_eq!(tool.mode(), InteractionMode::Browse);

        tool.toggle(InteractionMode::DrawingHighlight);
        tool.note_placed();
        assert_eq!(tool.mode(), InteractionMode::DrawingHighlight);
    }

    #[test]
    fn navigation_suppressed_outside_browse() {
        let mut tool = ToolController::new();
        assert!(!tool.suppresses_navigation());
        tool.toggle(InteractionMode::DrawingHighlight);
        assert!(tool.suppresses_navigation());
    }

    #[test]
    fn status_label_tracks_color() {
        let mut tool = ToolController::new();
        tool.toggle(InteractionMode::DrawingHighlight);
        assert!(tool.status_label().contains("yellow"));
        tool.cycle_color();
        assert!(tool.status_label().contains("green"));
    }
}

//! Trackers that turn raw mouse down/drag/up sequences into annotation or
//! navigation actions. The app owns at most one of each; a highlight drag
//! cannot start while another is open.

use crate::geometry::{drag_exceeds_threshold, PercentRect, RawPoint, SurfaceBox};

/// An in-progress highlight drag, anchored where the button went down.
#[derive(Debug, Clone, Copy)]
pub struct HighlightDrag {
    pub page_number: usize,
    pub surface: SurfaceBox,
    anchor: RawPoint,
    current: RawPoint,
}

impl HighlightDrag {
    pub fn begin(page_number: usize, surface: SurfaceBox, at: RawPoint) -> Self {
        Self {
            page_number,
            surface,
            anchor: at,
            current: at,
        }
    }

    pub fn update(&mut self, at: RawPoint) {
        self.current = at;
    }

    /// Rectangle for the live preview, in surface percentages.
    pub fn preview_rect(&self) -> PercentRect {
        PercentRect::from_corners(
            self.surface.to_percent(self.anchor),
            self.surface.to_percent(self.current),
        )
    }

    /// Finalize on button-up. Sub-threshold drags (both raw deltas short)
    /// are discarded as unintentional.
    pub fn finish(self, threshold: f64) -> Option<PercentRect> {
        if !drag_exceeds_threshold(self.anchor, self.current, threshold) {
            return None;
        }
        Some(self.preview_rect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Previous,
}

/// Horizontal swipe detection over the whole viewer surface: a down/up pair
/// whose horizontal delta exceeds the threshold turns the page.
#[derive(Debug, Default)]
pub struct SwipeTracker {
    origin: Option<(u16, u16)>,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, column: u16, row: u16) {
        self.origin = Some((column, row));
    }

    pub fn cancel(&mut self) {
        self.origin = None;
    }

    pub fn is_tracking(&self) -> bool {
        self.origin.is_some()
    }

    pub fn finish(&mut self, column: u16, threshold: u16) -> Option<NavIntent> {
        let (start_column, _) = self.origin.take()?;
        let delta = column as i32 - start_column as i32;
        if delta.unsigned_abs() < threshold as u32 {
            return None;
        }
        // Dragging leftward pulls the next page into view.
        if delta < 0 {
            Some(NavIntent::Next)
        } else {
            Some(NavIntent::Previous)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_1000x700() -> SurfaceBox {
        SurfaceBox::new(0.0, 0.0, 1000.0, 700.0)
    }

    #[test]
    fn sub_threshold_drag_produces_nothing() {
        let mut drag = HighlightDrag::begin(0, surface_1000x700(), RawPoint::new(10.0, 10.0));
        drag.update(RawPoint::new(12.0, 11.0));
        assert!(drag.finish(10.0).is_none());
    }

    #[test]
    fn threshold_drag_produces_percent_rect() {
        let mut drag = HighlightDrag::begin(0, surface_1000x700(), RawPoint::new(10.0, 10.0));
        drag.update(RawPoint::new(150.0, 150.0));
        let rect = drag.finish(10.0).expect("drag exceeds threshold");
        assert!((rect.w - 14.0).abs() < 1e-9);
        assert!((rect.h - 20.0).abs() < 1e-9);
        assert!((rect.x - 1.0).abs() < 1e-9);
        assert!((rect.y - (10.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn inverted_drag_normalizes_to_same_rect() {
        let mut forward = HighlightDrag::begin(0, surface_1000x700(), RawPoint::new(100.0, 100.0));
        forward.update(RawPoint::new(300.0, 400.0));
        let mut backward = HighlightDrag::begin(0, surface_1000x700(), RawPoint::new(300.0, 400.0));
        backward.update(RawPoint::new(100.0, 100.0));
        assert_eq!(forward.finish(10.0), backward.finish(10.0));
    }

    #[test]
    fn preview_tracks_current_point() {
        let mut drag = HighlightDrag::begin(0, surface_1000x700(), RawPoint::new(0.0, 0.0));
        drag.update(RawPoint::new(500.0, 350.0));
        let preview = drag.preview_rect();
        assert_eq!(preview.w, 50.0);
        assert_eq!(preview.h, 50.0);
    }

    #[test]
    fn swipe_under_threshold_is_ignored() {
        let mut swipe = SwipeTracker::new();
        swipe.begin(40, 10);
        assert_eq!(swipe.finish(37, 6), None);
        assert!(!swipe.is_tracking());
    }

    #[test]
    fn swipe_directions() {
        let mut swipe = SwipeTracker::new();
        swipe.begin(40, 10);
        assert_eq!(swipe.finish(30, 6), Some(NavIntent::Next));
        swipe.begin(40, 10);
        assert_eq!(swipe.finish(52, 6), Some(NavIntent::Previous));
    }

    #[test]
    fn finish_without_begin_is_inert() {
        let mut swipe = SwipeTracker::new();
        assert_eq!(swipe.finish(100, 1), None);
    }
}

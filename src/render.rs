//! Render/sync layer: reconciles the desired marker set (cache filtered by
//! the pages currently hosted) against what is already rendered, and paints
//! markers onto their page surfaces. Reconciliation replaces the original
//! clear-then-repaint: the outcome is identical, but the diff makes the
//! idempotence invariant checkable.

use std::collections::{HashMap, HashSet};

use log::debug;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::annotation::{Highlight, HighlightColor, Note};
use crate::geometry::PercentRect;
use crate::store::AnnotationStore;

pub const NOTE_MARKER: &str = "◆";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerId {
    Note(i64),
    Highlight(i64),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    pub inserted: usize,
    pub removed: usize,
}

/// Tracks which markers are currently rendered, per page. Painting is gated
/// on this set, so a marker only appears once a sync has admitted it.
#[derive(Debug, Default)]
pub struct MarkerSync {
    rendered: HashMap<usize, HashSet<MarkerId>>,
}

impl MarkerSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff the desired marker set for `pages` against the rendered set and
    /// apply it. Pages outside `pages` lose their markers. Running this twice
    /// for the same pages and cache state is a no-op the second time.
    pub fn reconcile(&mut self, pages: &[usize], store: &AnnotationStore) -> SyncOutcome {
        let mut desired: HashMap<usize, HashSet<MarkerId>> = HashMap::new();
        for &page in pages {
            let markers: HashSet<MarkerId> = store
                .notes_for_page(page)
                .map(|n| MarkerId::Note(n.id))
                .chain(
                    store
                        .highlights_for_page(page)
                        .map(|h| MarkerId::Highlight(h.id)),
                )
                .collect();
            desired.entry(page).or_default().extend(markers);
        }

        let mut outcome = SyncOutcome::default();
        for (page, markers) in &self.rendered {
            let keep = desired.get(page);
            outcome.removed += markers
                .iter()
                .filter(|m| keep.is_none_or(|d| !d.contains(m)))
                .count();
        }
        for (page, markers) in &desired {
            let have = self.rendered.get(page);
            outcome.inserted += markers
                .iter()
                .filter(|m| have.is_none_or(|r| !r.contains(m)))
                .count();
        }

        if outcome.inserted > 0 || outcome.removed > 0 {
            debug!(
                "marker sync: +{} -{} across pages {:?}",
                outcome.inserted, outcome.removed, pages
            );
        }
        self.rendered = desired;
        outcome
    }

    pub fn is_rendered(&self, page: usize, marker: MarkerId) -> bool {
        self.rendered
            .get(&page)
            .is_some_and(|set| set.contains(&marker))
    }

    pub fn rendered_count(&self) -> usize {
        self.rendered.values().map(HashSet::len).sum()
    }
}

/// Per-draw lookup from page number to the layout rect hosting that page's
/// annotation layer. Rebuilt on every draw, which is what keeps percentage
/// coordinates independent of terminal size.
#[derive(Debug, Default)]
pub struct PageSurfaces {
    surfaces: Vec<(usize, Rect)>,
}

impl PageSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    pub fn insert(&mut self, page: usize, area: Rect) {
        self.surfaces.push((page, area));
    }

    pub fn get(&self, page: usize) -> Option<Rect> {
        self.surfaces
            .iter()
            .find(|(p, _)| *p == page)
            .map(|(_, area)| *area)
    }

    pub fn page_at(&self, column: u16, row: u16) -> Option<(usize, Rect)> {
        self.surfaces
            .iter()
            .find(|(_, area)| area.contains((column, row).into()))
            .copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(usize, Rect)> {
        self.surfaces.iter()
    }
}

pub fn marker_color(color: HighlightColor) -> Color {
    match color {
        HighlightColor::Yellow => Color::Yellow,
        HighlightColor::Green => Color::Green,
        HighlightColor::Pink => Color::Magenta,
        HighlightColor::Blue => Color::Blue,
    }
}

/// Cell rect for a percent rect on a surface, clipped to the surface. `None`
/// when the rect lies entirely outside it.
pub fn percent_rect_to_cells(surface: Rect, rect: &PercentRect) -> Option<Rect> {
    let width = surface.width as f64;
    let height = surface.height as f64;
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let x = surface.x as f64 + rect.x / 100.0 * width;
    let y = surface.y as f64 + rect.y / 100.0 * height;
    let w = (rect.w / 100.0 * width).max(1.0);
    let h = (rect.h / 100.0 * height).max(1.0);

    let cells = Rect {
        x: x.max(0.0).round() as u16,
        y: y.max(0.0).round() as u16,
        width: w.round() as u16,
        height: h.round() as u16,
    };
    let clipped = cells.intersection(surface);
    (!clipped.is_empty()).then_some(clipped)
}

/// Cell hosting a percent anchor point, clamped to the surface edge.
pub fn percent_point_to_cell(surface: Rect, x: f64, y: f64) -> Option<(u16, u16)> {
    if surface.width == 0 || surface.height == 0 {
        return None;
    }
    let col = surface.x as f64 + x / 100.0 * surface.width as f64;
    let row = surface.y as f64 + y / 100.0 * surface.height as f64;
    let col = (col.max(0.0) as u16).clamp(surface.x, surface.right().saturating_sub(1));
    let row = (row.max(0.0) as u16).clamp(surface.y, surface.bottom().saturating_sub(1));
    Some((col, row))
}

/// Paint every synced marker of one page onto its surface. Highlights go
/// first so note markers stay visible on top of them.
pub fn render_page_markers(
    frame: &mut Frame,
    surface: Rect,
    page: usize,
    store: &AnnotationStore,
    sync: &MarkerSync,
) {
    for highlight in store.highlights_for_page(page) {
        if !sync.is_rendered(page, MarkerId::Highlight(highlight.id)) {
            continue;
        }
        if let Some(area) = percent_rect_to_cells(surface, &highlight.coordinates) {
            let style = Style::default().bg(marker_color(highlight.color)).fg(Color::Black);
            frame.render_widget(Block::default().style(style), area);
        }
    }
    for note in store.notes_for_page(page) {
        if !sync.is_rendered(page, MarkerId::Note(note.id)) {
            continue;
        }
        if let Some((col, row)) = percent_point_to_cell(surface, note.x, note.y) {
            let marker = Paragraph::new(NOTE_MARKER).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            frame.render_widget(marker, Rect::new(col, row, 1, 1));
        }
    }
}

/// Live preview of an in-progress highlight drag.
pub fn render_drag_preview(
    frame: &mut Frame,
    surface: Rect,
    rect: &PercentRect,
    color: HighlightColor,
) {
    if let Some(area) = percent_rect_to_cells(surface, rect) {
        let style = Style::default()
            .bg(marker_color(color))
            .add_modifier(Modifier::DIM);
        frame.render_widget(Block::default().style(style), area);
    }
}

/// Hit-test the markers of one page. Note markers win over highlights since
/// their target is a single cell.
pub fn marker_at(
    surface: Rect,
    column: u16,
    row: u16,
    page: usize,
    store: &AnnotationStore,
) -> Option<MarkerId> {
    for note in store.notes_for_page(page) {
        if percent_point_to_cell(surface, note.x, note.y) == Some((column, row)) {
            return Some(MarkerId::Note(note.id));
        }
    }
    for highlight in store.highlights_for_page(page) {
        if let Some(area) = percent_rect_to_cells(surface, &highlight.coordinates) {
            if area.contains((column, row).into()) {
                return Some(MarkerId::Highlight(highlight.id));
            }
        }
    }
    None
}

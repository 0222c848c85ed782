use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use log::{debug, error, info};
use ratatui::{
    Terminal,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};

use crate::api::{OutlineEntry, RemoteStore};
use crate::event_source::EventSource;
use crate::flip::{FlipEngine, FlipEvent};
use crate::geometry::{PercentPoint, RawPoint, SurfaceBox};
use crate::gesture::{HighlightDrag, NavIntent, SwipeTracker};
use crate::notification::{NotificationLevel, NotificationManager};
use crate::render::{self, MarkerId, MarkerSync, PageSurfaces};
use crate::settings::Settings;
use crate::store::AnnotationStore;
use crate::tool::{InteractionMode, ToolController};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

/// Modal popups. While one is open, page gestures are inert; popups are
/// keyboard driven.
enum Popup {
    NoteInput {
        page_number: usize,
        anchor: PercentPoint,
        buffer: String,
    },
    ConfirmDelete {
        marker: MarkerId,
        summary: String,
    },
    Outline {
        state: ListState,
    },
}

pub struct App {
    remote: Box<dyn RemoteStore>,
    pub store: AnnotationStore,
    pub tool: ToolController,
    pub flip: FlipEngine,
    pub notifications: NotificationManager,
    settings: Settings,
    title: String,
    sync: MarkerSync,
    surfaces: PageSurfaces,
    drag: Option<HighlightDrag>,
    swipe: SwipeTracker,
    popup: Option<Popup>,
    outline: Vec<OutlineEntry>,
    hovered_note: Option<String>,
}

impl App {
    pub fn new(
        remote: Box<dyn RemoteStore>,
        page_count: usize,
        title: impl Into<String>,
        settings: Settings,
    ) -> Self {
        let mut app = Self {
            flip: FlipEngine::new(page_count, settings.spread),
            remote,
            store: AnnotationStore::new(),
            tool: ToolController::new(),
            notifications: NotificationManager::new(),
            settings,
            title: title.into(),
            sync: MarkerSync::new(),
            surfaces: PageSurfaces::new(),
            drag: None,
            swipe: SwipeTracker::new(),
            popup: None,
            outline: Vec::new(),
            hovered_note: None,
        };
        app.initial_load();
        app
    }

    /// Both annotation fetches join before the first render; a failed load
    /// leaves the viewer usable with zero annotations. A missing outline is
    /// not worth a notification.
    fn initial_load(&mut self) {
        if let Err(e) = self.store.load(self.remote.as_ref()) {
            error!("annotation load failed: {e}");
            self.notifications.error(format!("Failed to load annotations: {e}"));
        }
        match self.remote.fetch_outline() {
            Ok(outline) => self.outline = outline,
            Err(e) => {
                debug!("outline fetch failed: {e}");
                self.outline = Vec::new();
            }
        }
        self.sync_markers();
    }

    /// Render/sync step: reconcile markers for the visible pages plus the
    /// preload window, so a turn never lands on an unpainted page.
    fn sync_markers(&mut self) {
        let mut pages = self.flip.visible_pages();
        pages.extend(self.flip.preload_pages(self.settings.preload_ahead));
        self.sync.reconcile(&pages, &self.store);
    }

    pub fn visible_pages(&self) -> Vec<usize> {
        self.flip.visible_pages()
    }

    pub fn rendered_marker_count(&self) -> usize {
        self.sync.rendered_count()
    }

    pub fn has_popup(&self) -> bool {
        self.popup.is_some()
    }

    pub fn outline_len(&self) -> usize {
        self.outline.len()
    }

    fn apply_flip_events(&mut self, events: Vec<FlipEvent>) {
        for event in events {
            match event {
                FlipEvent::Turning { to } => debug!("turning to {to:?}"),
                FlipEvent::Turned { page, .. } => {
                    info!("turned to page {page}");
                    self.sync_markers();
                }
            }
        }
    }

    fn turn_next(&mut self) {
        let events = self.flip.turn_next();
        self.apply_flip_events(events);
    }

    fn turn_previous(&mut self) {
        let events = self.flip.turn_previous();
        self.apply_flip_events(events);
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<AppAction> {
        if self.popup.is_some() {
            self.handle_popup_key(key);
            return None;
        }
        match key.code {
            KeyCode::Char('q') => return Some(AppAction::Quit),
            // Arrow navigation is deliberately not mode-gated, unlike swipes.
            KeyCode::Left => self.turn_previous(),
            KeyCode::Right => self.turn_next(),
            KeyCode::Char('n') => {
                self.tool.toggle(InteractionMode::PlacingNote);
            }
            KeyCode::Char('h') => {
                self.tool.toggle(InteractionMode::DrawingHighlight);
            }
            KeyCode::Char('c') => {
                if self.tool.mode() == InteractionMode::DrawingHighlight {
                    self.tool.cycle_color();
                }
            }
            KeyCode::Char('o') => self.open_outline(),
            KeyCode::Esc => {
                self.tool.cancel();
                self.drag = None;
            }
            _ => {}
        }
        None
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        enum Followup {
            Nothing,
            Close,
            SubmitNote,
            Delete,
            Jump(usize),
        }

        let outline_len = self.outline.len();
        let Some(popup) = self.popup.as_mut() else {
            return;
        };
        let followup = match popup {
            Popup::NoteInput { buffer, .. } => match key.code {
                KeyCode::Char(c) => {
                    buffer.push(c);
                    Followup::Nothing
                }
                KeyCode::Backspace => {
                    buffer.pop();
                    Followup::Nothing
                }
                KeyCode::Enter => Followup::SubmitNote,
                // Cancelled input aborts silently.
                KeyCode::Esc => Followup::Close,
                _ => Followup::Nothing,
            },
            Popup::ConfirmDelete { .. } => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => Followup::Delete,
                KeyCode::Char('n') | KeyCode::Esc => Followup::Close,
                _ => Followup::Nothing,
            },
            Popup::Outline { state } => match key.code {
                KeyCode::Char('j') | KeyCode::Down => {
                    let selected = state.selected().unwrap_or(0);
                    state.select(Some((selected + 1).min(outline_len.saturating_sub(1))));
                    Followup::Nothing
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    let selected = state.selected().unwrap_or(0);
                    state.select(Some(selected.saturating_sub(1)));
                    Followup::Nothing
                }
                KeyCode::Enter => match state.selected() {
                    Some(index) => Followup::Jump(index),
                    None => Followup::Nothing,
                },
                KeyCode::Esc | KeyCode::Char('o') => Followup::Close,
                _ => Followup::Nothing,
            },
        };

        match followup {
            Followup::Nothing => {}
            Followup::Close => self.popup = None,
            Followup::SubmitNote => self.submit_note(),
            Followup::Delete => self.perform_delete(),
            Followup::Jump(index) => {
                self.popup = None;
                if let Some(entry) = self.outline.get(index) {
                    let events = self.flip.turn_to(entry.page);
                    self.apply_flip_events(events);
                }
            }
        }
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        if self.popup.is_some() {
            return;
        }
        match mouse.kind {
            MouseEventKind::Down(crossterm::event::MouseButton::Left) => {
                self.handle_mouse_down(mouse.column, mouse.row)
            }
            MouseEventKind::Drag(crossterm::event::MouseButton::Left) => {
                if let Some(drag) = self.drag.as_mut() {
                    drag.update(RawPoint::new(mouse.column as f64, mouse.row as f64));
                }
            }
            MouseEventKind::Up(crossterm::event::MouseButton::Left) => {
                self.handle_mouse_up(mouse.column, mouse.row)
            }
            MouseEventKind::Moved => {
                self.hovered_note = self.note_under(mouse.column, mouse.row);
            }
            _ => {}
        }
    }

    fn handle_mouse_down(&mut self, column: u16, row: u16) {
        // Existing markers are a delete affordance in every mode, and the
        // gesture stops there: no placement, no swipe.
        if let Some((page, surface)) = self.surfaces.page_at(column, row) {
            if let Some(marker) = render::marker_at(surface, column, row, page, &self.store) {
                self.open_confirm(marker);
                return;
            }
        }

        let point = RawPoint::new(column as f64, row as f64);
        match self.tool.mode() {
            InteractionMode::PlacingNote => {
                if let Some((page, surface)) = self.surfaces.page_at(column, row) {
                    let anchor = SurfaceBox::from_rect(surface).to_percent(point);
                    self.popup = Some(Popup::NoteInput {
                        page_number: page,
                        anchor,
                        buffer: String::new(),
                    });
                }
            }
            InteractionMode::DrawingHighlight => {
                // Only one drag can be open at a time.
                if self.drag.is_none() {
                    if let Some((page, surface)) = self.surfaces.page_at(column, row) {
                        self.drag = Some(HighlightDrag::begin(
                            page,
                            SurfaceBox::from_rect(surface),
                            point,
                        ));
                    }
                }
            }
            InteractionMode::Browse => self.swipe.begin(column, row),
        }
    }

    fn handle_mouse_up(&mut self, column: u16, row: u16) {
        if let Some(mut drag) = self.drag.take() {
            drag.update(RawPoint::new(column as f64, row as f64));
            self.finish_highlight(drag);
            return;
        }
        if let Some(intent) = self.swipe.finish(column, self.settings.swipe_threshold) {
            // The mode may have changed between down and up.
            if self.tool.suppresses_navigation() {
                return;
            }
            match intent {
                NavIntent::Next => self.turn_next(),
                NavIntent::Previous => self.turn_previous(),
            }
        }
    }

    fn finish_highlight(&mut self, drag: HighlightDrag) {
        let page_number = drag.page_number;
        // Sub-threshold drags are unintentional; no call, no notification.
        let Some(rect) = drag.finish(self.settings.drag_threshold) else {
            return;
        };
        match self
            .store
            .create_highlight(self.remote.as_ref(), page_number, rect, self.tool.color())
        {
            Ok(id) => {
                debug!("created highlight {id} on page {page_number}");
                // Highlight mode stays active for the next drag.
                self.sync_markers();
            }
            Err(e) => {
                error!("highlight create failed: {e}");
                self.notifications.error(format!("Failed to save highlight: {e}"));
            }
        }
    }

    fn submit_note(&mut self) {
        let Some(Popup::NoteInput {
            page_number,
            anchor,
            buffer,
        }) = self.popup.take()
        else {
            return;
        };
        let content = buffer.trim();
        // Empty input aborts without creating anything.
        if content.is_empty() {
            return;
        }
        match self
            .store
            .create_note(self.remote.as_ref(), page_number, content, anchor.x, anchor.y)
        {
            Ok(id) => {
                debug!("created note {id} on page {page_number}");
                self.tool.note_placed();
                self.sync_markers();
            }
            Err(e) => {
                error!("note create failed: {e}");
                self.notifications.error(format!("Failed to save note: {e}"));
            }
        }
    }

    fn open_confirm(&mut self, marker: MarkerId) {
        let summary = match marker {
            MarkerId::Note(id) => self
                .store
                .note(id)
                .map(|n| format!("note \"{}\"", truncate(&n.content, 40)))
                .unwrap_or_else(|| "note".to_string()),
            MarkerId::Highlight(id) => self
                .store
                .highlight(id)
                .map(|h| format!("{} highlight", h.color.as_str()))
                .unwrap_or_else(|| "highlight".to_string()),
        };
        self.popup = Some(Popup::ConfirmDelete { marker, summary });
    }

    fn perform_delete(&mut self) {
        let Some(Popup::ConfirmDelete { marker, .. }) = self.popup.take() else {
            return;
        };
        let result = match marker {
            MarkerId::Note(id) => self.store.delete_note(self.remote.as_ref(), id),
            MarkerId::Highlight(id) => self.store.delete_highlight(self.remote.as_ref(), id),
        };
        match result {
            Ok(()) => self.sync_markers(),
            Err(e) => {
                error!("delete failed: {e}");
                self.notifications.error(format!("Failed to delete: {e}"));
            }
        }
    }

    fn open_outline(&mut self) {
        if self.outline.is_empty() {
            self.notifications.info("No outline available");
            return;
        }
        let mut state = ListState::default();
        state.select(Some(0));
        self.popup = Some(Popup::Outline { state });
    }

    fn note_under(&self, column: u16, row: u16) -> Option<String> {
        let (page, surface) = self.surfaces.page_at(column, row)?;
        match render::marker_at(surface, column, row, page, &self.store)? {
            MarkerId::Note(id) => self.store.note(id).map(|n| n.content.clone()),
            MarkerId::Highlight(_) => None,
        }
    }

    pub fn draw(&mut self, f: &mut ratatui::Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(1),
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_pages(f, chunks[1]);
        self.render_status(f, chunks[2]);

        if self.popup.is_some() {
            self.render_popup(f);
        }
    }

    fn render_header(&self, f: &mut ratatui::Frame, area: Rect) {
        let pages = self.flip.visible_pages();
        let indicator = match (pages.first(), pages.last()) {
            (Some(first), Some(last)) if first != last => {
                format!("pages {}-{} / {}", first + 1, last + 1, self.flip.page_count())
            }
            (Some(first), _) => format!("page {} / {}", first + 1, self.flip.page_count()),
            _ => String::new(),
        };
        let header = Line::from(vec![
            Span::styled(
                format!(" {} ", self.title),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::raw(indicator),
        ]);
        f.render_widget(Paragraph::new(header), area);
    }

    /// Lay out one or two page surfaces and repaint their markers. The
    /// surface lookup is rebuilt from scratch every draw.
    fn render_pages(&mut self, f: &mut ratatui::Frame, area: Rect) {
        self.surfaces.clear();
        let pages = self.flip.visible_pages();
        let page_areas: Vec<Rect> = if pages.len() == 2 {
            Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area)
                .to_vec()
        } else {
            vec![area]
        };

        for (page, page_area) in pages.iter().zip(page_areas) {
            let block = Block::default()
                .title(format!(" Page {} ", page + 1))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray));
            let inner = block.inner(page_area);
            f.render_widget(block, page_area);
            self.surfaces.insert(*page, inner);
            render::render_page_markers(f, inner, *page, &self.store, &self.sync);
        }

        if let Some(drag) = &self.drag {
            if let Some(surface) = self.surfaces.get(drag.page_number) {
                render::render_drag_preview(f, surface, &drag.preview_rect(), self.tool.color());
            }
        }
    }

    fn render_status(&self, f: &mut ratatui::Frame, area: Rect) {
        let mut spans = vec![Span::styled(
            format!(" {} ", self.tool.status_label()),
            Style::default().add_modifier(Modifier::REVERSED),
        )];
        if let Some(content) = &self.hovered_note {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                truncate(content, area.width as usize / 2),
                Style::default().fg(Color::Yellow),
            ));
        }
        if let Some(notification) = self.notifications.current() {
            let color = match notification.level {
                NotificationLevel::Info => Color::Cyan,
                NotificationLevel::Warning => Color::Yellow,
                NotificationLevel::Error => Color::Red,
            };
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                notification.message.clone(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
        }
        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_popup(&mut self, f: &mut ratatui::Frame) {
        match &mut self.popup {
            Some(Popup::NoteInput { buffer, .. }) => {
                let popup_area = centered_rect(50, 30, f.area());
                f.render_widget(Clear, popup_area);
                let block = Block::default()
                    .title(" New note ")
                    .title_bottom(Line::from(" Enter save  Esc cancel ").right_aligned())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow));
                let inner = block.inner(popup_area);
                f.render_widget(block, popup_area);

                let width = inner.width.saturating_sub(2).max(1) as usize;
                let text: Vec<Line> = textwrap::wrap(buffer, width)
                    .into_iter()
                    .map(|line| Line::from(line.into_owned()))
                    .collect();
                f.render_widget(Paragraph::new(text), inner);
            }
            Some(Popup::ConfirmDelete { summary, .. }) => {
                let popup_area = centered_rect(50, 20, f.area());
                f.render_widget(Clear, popup_area);
                let block = Block::default()
                    .title(" Delete? ")
                    .title_bottom(Line::from(" y delete  n keep ").right_aligned())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Red));
                let inner = block.inner(popup_area);
                f.render_widget(block, popup_area);
                f.render_widget(
                    Paragraph::new(format!("Delete {summary}?")).alignment(Alignment::Center),
                    inner,
                );
            }
            Some(Popup::Outline { state }) => {
                let popup_area = centered_rect(60, 60, f.area());
                f.render_widget(Clear, popup_area);
                let block = Block::default()
                    .title(" Outline ")
                    .title_bottom(Line::from(" j/k navigate  Enter jump  Esc close ").right_aligned())
                    .borders(Borders::ALL);
                let items: Vec<ListItem> = self
                    .outline
                    .iter()
                    .map(|entry| {
                        let indent = "  ".repeat(entry.level.saturating_sub(1));
                        ListItem::new(format!("{indent}{} (p. {})", entry.title, entry.page + 1))
                    })
                    .collect();
                let list = List::new(items)
                    .block(block)
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
                f.render_stateful_widget(list, popup_area, state);
            }
            None => {}
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: std::error::Error + Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = std::time::Instant::now();
    loop {
        terminal.draw(|f| app.draw(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event_source.poll(timeout)? {
            let mut events_processed = 0;
            while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
                let event = event_source.read()?;
                events_processed += 1;
                match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        if app.handle_key_event(key) == Some(AppAction::Quit) {
                            return Ok(());
                        }
                    }
                    Event::Mouse(mouse) => app.handle_mouse_event(mouse),
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.notifications.update();
            last_tick = std::time::Instant::now();
        }
    }
}

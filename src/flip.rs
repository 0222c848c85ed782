//! Minimal page-flip engine: which pages are on screen, how a turn moves
//! between views, and which pages to warm up ahead of a turn. The annotation
//! core only consumes the view set and the lifecycle events.

use log::debug;

/// The set of pages a single view shows. Spread layout shows the cover alone
/// and then facing pairs; the right half is absent on a trailing odd page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Single(usize),
    Spread { left: usize, right: Option<usize> },
}

impl View {
    pub fn pages(&self) -> Vec<usize> {
        match self {
            View::Single(page) => vec![*page],
            View::Spread { left, right } => match right {
                Some(right) => vec![*left, *right],
                None => vec![*left],
            },
        }
    }

    pub fn contains(&self, page: usize) -> bool {
        self.pages().contains(&page)
    }

    pub fn first_page(&self) -> usize {
        match self {
            View::Single(page) => *page,
            View::Spread { left, .. } => *left,
        }
    }
}

/// Lifecycle events consumed by the render/sync layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlipEvent {
    Turning { to: View },
    Turned { page: usize, view: View },
}

#[derive(Debug)]
pub struct FlipEngine {
    page_count: usize,
    /// First page of the current view.
    position: usize,
    spread: bool,
}

impl FlipEngine {
    pub fn new(page_count: usize, spread: bool) -> Self {
        Self {
            page_count: page_count.max(1),
            position: 0,
            spread,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn view(&self) -> View {
        self.view_at(self.position)
    }

    pub fn visible_pages(&self) -> Vec<usize> {
        self.view().pages()
    }

    fn view_at(&self, position: usize) -> View {
        if !self.spread || position == 0 {
            return View::Single(position);
        }
        View::Spread {
            left: position,
            right: (position + 1 < self.page_count).then_some(position + 1),
        }
    }

    fn next_position(&self, position: usize) -> Option<usize> {
        let next = if self.spread && position == 0 {
            1
        } else if self.spread {
            position + 2
        } else {
            position + 1
        };
        (next < self.page_count).then_some(next)
    }

    fn prev_position(&self, position: usize) -> Option<usize> {
        if position == 0 {
            return None;
        }
        if !self.spread || position == 1 {
            return Some(position - 1);
        }
        Some(position - 2)
    }

    fn move_to(&mut self, position: usize) -> Vec<FlipEvent> {
        if position == self.position {
            return Vec::new();
        }
        self.position = position;
        let view = self.view();
        debug!("turned to view {view:?}");
        vec![
            FlipEvent::Turning { to: view },
            FlipEvent::Turned {
                page: view.first_page(),
                view,
            },
        ]
    }

    pub fn turn_next(&mut self) -> Vec<FlipEvent> {
        match self.next_position(self.position) {
            Some(position) => self.move_to(position),
            None => Vec::new(),
        }
    }

    pub fn turn_previous(&mut self) -> Vec<FlipEvent> {
        match self.prev_position(self.position) {
            Some(position) => self.move_to(position),
            None => Vec::new(),
        }
    }

    /// Jump to the view hosting `page` (outline navigation).
    pub fn turn_to(&mut self, page: usize) -> Vec<FlipEvent> {
        let page = page.min(self.page_count - 1);
        let position = if !self.spread || page == 0 {
            page
        } else if page % 2 == 1 {
            page
        } else {
            page - 1
        };
        self.move_to(position)
    }

    /// Pages within `ahead` views on either side of the current one, used to
    /// warm the render/sync layer before a turn animation completes.
    pub fn preload_pages(&self, ahead: usize) -> Vec<usize> {
        let mut pages = Vec::new();
        let mut forward = self.position;
        for _ in 0..ahead {
            match self.next_position(forward) {
                Some(p) => {
                    forward = p;
                    pages.extend(self.view_at(p).pages());
                }
                None => break,
            }
        }
        let mut backward = self.position;
        for _ in 0..ahead {
            match self.prev_position(backward) {
                Some(p) => {
                    backward = p;
                    pages.extend(self.view_at(p).pages());
                }
                None => break,
            }
        }
        pages
    }
}

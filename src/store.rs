//! Session cache of notes and highlights. The cache mirrors the remote
//! store: a record is inserted only after the server confirmed it, and
//! removed only after the server confirmed the deletion. Either both sides
//! change or neither does.

use log::{info, warn};

use crate::annotation::{Highlight, HighlightColor, Note};
use crate::api::{ApiError, ApiResult, RemoteStore};
use crate::geometry::PercentRect;

#[derive(Debug, Default)]
pub struct AnnotationStore {
    notes: Vec<Note>,
    highlights: Vec<Highlight>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch both collections concurrently and join before returning, so the
    /// first render always sees the complete set. Any failure resets both
    /// collections to empty; the viewer stays usable without annotations.
    pub fn load(&mut self, remote: &dyn RemoteStore) -> ApiResult<()> {
        let (notes, highlights) = std::thread::scope(|scope| {
            let notes = scope.spawn(|| remote.fetch_notes());
            let highlights = scope.spawn(|| remote.fetch_highlights());
            (join_fetch(notes), join_fetch(highlights))
        });

        match (notes, highlights) {
            (Ok(notes), Ok(highlights)) => {
                self.notes = notes.into_iter().filter_map(|dto| dto.into_note()).collect();
                self.highlights = highlights
                    .into_iter()
                    .filter_map(|dto| dto.into_highlight())
                    .collect();
                info!(
                    "loaded {} notes and {} highlights",
                    self.notes.len(),
                    self.highlights.len()
                );
                Ok(())
            }
            (notes, highlights) => {
                self.notes.clear();
                self.highlights.clear();
                Err(notes.err().or(highlights.err()).unwrap_or_else(|| {
                    ApiError::InvalidResponse("load failed without an error".to_string())
                }))
            }
        }
    }

    pub fn notes_for_page(&self, page_number: usize) -> impl Iterator<Item = &Note> {
        self.notes.iter().filter(move |n| n.page_number == page_number)
    }

    pub fn highlights_for_page(&self, page_number: usize) -> impl Iterator<Item = &Highlight> {
        self.highlights
            .iter()
            .filter(move |h| h.page_number == page_number)
    }

    pub fn note(&self, id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn highlight(&self, id: i64) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights.len()
    }

    /// Persist first; the note enters the cache only with its server id.
    pub fn create_note(
        &mut self,
        remote: &dyn RemoteStore,
        page_number: usize,
        content: &str,
        x: f64,
        y: f64,
    ) -> ApiResult<i64> {
        let id = remote.create_note(page_number, content, x, y)?;
        // A stale duplicate response must not yield a second marker.
        if self.notes.iter().any(|n| n.id == id) {
            warn!("note {id} already cached, ignoring duplicate response");
            return Ok(id);
        }
        self.notes.push(Note {
            id,
            page_number,
            content: content.to_string(),
            x,
            y,
        });
        Ok(id)
    }

    pub fn create_highlight(
        &mut self,
        remote: &dyn RemoteStore,
        page_number: usize,
        coordinates: PercentRect,
        color: HighlightColor,
    ) -> ApiResult<i64> {
        let id = remote.create_highlight(page_number, &coordinates, color)?;
        if self.highlights.iter().any(|h| h.id == id) {
            warn!("highlight {id} already cached, ignoring duplicate response");
            return Ok(id);
        }
        self.highlights.push(Highlight {
            id,
            page_number,
            coordinates,
            color,
        });
        Ok(id)
    }

    /// Caller has already confirmed with the user. The cache entry survives
    /// any remote failure.
    pub fn delete_note(&mut self, remote: &dyn RemoteStore, id: i64) -> ApiResult<()> {
        remote.delete_note(id)?;
        self.notes.retain(|n| n.id != id);
        Ok(())
    }

    pub fn delete_highlight(&mut self, remote: &dyn RemoteStore, id: i64) -> ApiResult<()> {
        remote.delete_highlight(id)?;
        self.highlights.retain(|h| h.id != id);
        Ok(())
    }
}

fn join_fetch<T>(handle: std::thread::ScopedJoinHandle<'_, ApiResult<Vec<T>>>) -> ApiResult<Vec<T>> {
    handle
        .join()
        .unwrap_or_else(|_| Err(ApiError::Network("fetch worker panicked".to_string())))
}

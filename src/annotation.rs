//! Domain types for notes and highlights, plus the wire DTOs they are
//! validated from. The server is the only id authority: a record exists
//! locally only once it carries a server-assigned id.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geometry::PercentRect;

/// Fixed highlight palette. Anything else coming off the wire coerces to
/// yellow rather than failing the whole fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Pink,
    Blue,
}

impl HighlightColor {
    pub const PALETTE: [HighlightColor; 4] = [
        HighlightColor::Yellow,
        HighlightColor::Green,
        HighlightColor::Pink,
        HighlightColor::Blue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Pink => "pink",
            HighlightColor::Blue => "blue",
        }
    }

    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("yellow") => HighlightColor::Yellow,
            Some("green") => HighlightColor::Green,
            Some("pink") => HighlightColor::Pink,
            Some("blue") => HighlightColor::Blue,
            _ => HighlightColor::default(),
        }
    }

    /// Next palette entry, wrapping around. Drives the color picker.
    pub fn next(&self) -> Self {
        let idx = Self::PALETTE.iter().position(|c| c == self).unwrap_or(0);
        Self::PALETTE[(idx + 1) % Self::PALETTE.len()]
    }
}

/// A positional note anchored at a percentage point of one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub id: i64,
    pub page_number: usize,
    pub content: String,
    pub x: f64,
    pub y: f64,
}

/// A rectangular highlight on one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub id: i64,
    pub page_number: usize,
    pub coordinates: PercentRect,
    pub color: HighlightColor,
}

/// Wire shape of a note as served by `GET /api/book/{id}/notes`.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteDto {
    pub id: i64,
    pub page_number: i64,
    pub content: String,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
}

impl NoteDto {
    /// Ingress validation: a note without a usable anchor or page cannot be
    /// rendered, so it is dropped rather than propagated.
    pub fn into_note(self) -> Option<Note> {
        let page_number = match usize::try_from(self.page_number) {
            Ok(p) => p,
            Err(_) => {
                warn!("dropping note {}: negative page number", self.id);
                return None;
            }
        };
        let (x, y) = match (self.x, self.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
            _ => {
                warn!("dropping note {}: missing or non-finite anchor", self.id);
                return None;
            }
        };
        Some(Note {
            id: self.id,
            page_number,
            content: self.content,
            x,
            y,
        })
    }
}

/// Wire shape of a highlight as served by `GET /api/book/{id}/highlights`.
#[derive(Debug, Clone, Deserialize)]
pub struct HighlightDto {
    pub id: i64,
    pub page_number: i64,
    pub coordinates: PercentRect,
    #[serde(default)]
    pub color: Option<String>,
}

impl HighlightDto {
    pub fn into_highlight(self) -> Option<Highlight> {
        let page_number = match usize::try_from(self.page_number) {
            Ok(p) => p,
            Err(_) => {
                warn!("dropping highlight {}: negative page number", self.id);
                return None;
            }
        };
        if !self.coordinates.is_finite() || self.coordinates.w < 0.0 || self.coordinates.h < 0.0 {
            warn!("dropping highlight {}: malformed coordinates", self.id);
            return None;
        }
        Some(Highlight {
            id: self.id,
            page_number,
            coordinates: self.coordinates,
            color: HighlightColor::parse(self.color.as_deref()),
        })
    }
}

//! Client for the remote annotation API. Everything the viewer persists goes
//! through the [`RemoteStore`] trait so tests can substitute a scripted
//! double for the HTTP client.

use serde::Deserialize;
use thiserror::Error;

use crate::annotation::{HighlightColor, HighlightDto, NoteDto};
use crate::geometry::PercentRect;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("{0}")]
    Rejected(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

/// One row of the document outline (level, title, zero-based page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    pub level: usize,
    pub title: String,
    pub page: usize,
}

/// Remote CRUD surface consumed by the annotation store. Create calls return
/// the server-assigned id; nothing enters the local cache without one.
pub trait RemoteStore: Send + Sync {
    fn fetch_notes(&self) -> ApiResult<Vec<NoteDto>>;
    fn fetch_highlights(&self) -> ApiResult<Vec<HighlightDto>>;
    fn fetch_outline(&self) -> ApiResult<Vec<OutlineEntry>>;
    fn create_note(&self, page_number: usize, content: &str, x: f64, y: f64) -> ApiResult<i64>;
    fn create_highlight(
        &self,
        page_number: usize,
        coordinates: &PercentRect,
        color: HighlightColor,
    ) -> ApiResult<i64>;
    fn delete_note(&self, id: i64) -> ApiResult<()>;
    fn delete_highlight(&self, id: i64) -> ApiResult<()>;
}

impl<T: RemoteStore + ?Sized> RemoteStore for std::sync::Arc<T> {
    fn fetch_notes(&self) -> ApiResult<Vec<NoteDto>> {
        (**self).fetch_notes()
    }

    fn fetch_highlights(&self) -> ApiResult<Vec<HighlightDto>> {
        (**self).fetch_highlights()
    }

    fn fetch_outline(&self) -> ApiResult<Vec<OutlineEntry>> {
        (**self).fetch_outline()
    }

    fn create_note(&self, page_number: usize, content: &str, x: f64, y: f64) -> ApiResult<i64> {
        (**self).create_note(page_number, content, x, y)
    }

    fn create_highlight(
        &self,
        page_number: usize,
        coordinates: &PercentRect,
        color: HighlightColor,
    ) -> ApiResult<i64> {
        (**self).create_highlight(page_number, coordinates, color)
    }

    fn delete_note(&self, id: i64) -> ApiResult<()> {
        (**self).delete_note(id)
    }

    fn delete_highlight(&self, id: i64) -> ApiResult<()> {
        (**self).delete_highlight(id)
    }
}

/// Envelope shared by every mutating endpoint:
/// `{success, id}` or `{success: false, error}`.
#[derive(Debug, Deserialize)]
struct SaveReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: Option<i64>,
    #[serde(default)]
    error: Option<String>,
}

impl SaveReply {
    fn into_id(self) -> ApiResult<i64> {
        if !self.success {
            return Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "request rejected".to_string()),
            ));
        }
        self.id
            .ok_or_else(|| ApiError::InvalidResponse("success reply without an id".to_string()))
    }

    fn into_unit(self) -> ApiResult<()> {
        if self.success {
            Ok(())
        } else {
            Err(ApiError::Rejected(
                self.error.unwrap_or_else(|| "request rejected".to_string()),
            ))
        }
    }
}

/// The outline endpoint mirrors PyMuPDF's `get_toc()`: rows of
/// `[level, title, 1-based page]`.
type OutlineRow = (i64, String, i64);

fn outline_from_rows(rows: Vec<OutlineRow>) -> Vec<OutlineEntry> {
    rows.into_iter()
        .filter_map(|(level, title, page)| {
            let level = usize::try_from(level.max(1)).ok()?;
            let page = usize::try_from(page.max(1)).ok()? - 1;
            Some(OutlineEntry { level, title, page })
        })
        .collect()
}

/// Blocking HTTP implementation of [`RemoteStore`].
pub struct HttpRemoteStore {
    agent: ureq::Agent,
    base_url: String,
    book_id: i64,
}

impl HttpRemoteStore {
    pub fn new(base_url: impl Into<String>, book_id: i64) -> Self {
        Self {
            agent: ureq::agent(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            book_id,
        }
    }

    fn book_url(&self, tail: &str) -> String {
        format!("{}/api/book/{}/{}", self.base_url, self.book_id, tail)
    }

    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> ApiResult<T> {
        let response = self.agent.get(url).call().map_err(map_ureq_error)?;
        let body = response
            .into_string()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    fn post_json(&self, url: &str, body: serde_json::Value) -> ApiResult<SaveReply> {
        let response = self
            .agent
            .post(url)
            .set("Content-Type", "application/json")
            .send_string(&body.to_string())
            .map_err(map_ureq_error)?;
        let body = response
            .into_string()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }

    fn delete(&self, url: &str) -> ApiResult<SaveReply> {
        let response = self.agent.delete(url).call().map_err(map_ureq_error)?;
        let body = response
            .into_string()
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))
    }
}

fn map_ureq_error(e: ureq::Error) -> ApiError {
    match e {
        // The server reports application failures as JSON bodies on error
        // statuses; pull the message out when it is there.
        ureq::Error::Status(code, response) => {
            let message = response
                .into_string()
                .ok()
                .and_then(|body| serde_json::from_str::<SaveReply>(&body).ok())
                .and_then(|reply| reply.error);
            ApiError::Rejected(message.unwrap_or_else(|| format!("server returned HTTP {code}")))
        }
        ureq::Error::Transport(t) => ApiError::Network(t.to_string()),
    }
}

impl RemoteStore for HttpRemoteStore {
    fn fetch_notes(&self) -> ApiResult<Vec<NoteDto>> {
        self.get_json(&self.book_url("notes"))
    }

    fn fetch_highlights(&self) -> ApiResult<Vec<HighlightDto>> {
        self.get_json(&self.book_url("highlights"))
    }

    fn fetch_outline(&self) -> ApiResult<Vec<OutlineEntry>> {
        let rows: Vec<OutlineRow> = self.get_json(&self.book_url("toc"))?;
        Ok(outline_from_rows(rows))
    }

    fn create_note(&self, page_number: usize, content: &str, x: f64, y: f64) -> ApiResult<i64> {
        let body = serde_json::json!({
            "page_number": page_number,
            "content": content,
            "x": x,
            "y": y,
        });
        self.post_json(&self.book_url("notes"), body)?.into_id()
    }

    fn create_highlight(
        &self,
        page_number: usize,
        coordinates: &PercentRect,
        color: HighlightColor,
    ) -> ApiResult<i64> {
        let body = serde_json::json!({
            "page_number": page_number,
            "coordinates": coordinates,
            "color": color.as_str(),
        });
        self.post_json(&self.book_url("highlights"), body)?.into_id()
    }

    fn delete_note(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{}/api/note/{}", self.base_url, id))?
            .into_unit()
    }

    fn delete_highlight(&self, id: i64) -> ApiResult<()> {
        self.delete(&format!("{}/api/highlight/{}", self.base_url, id))?
            .into_unit()
    }
}

pub mod test_helpers {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    use crate::annotation::{HighlightColor, HighlightDto, NoteDto};
    use crate::api::{ApiError, ApiResult, OutlineEntry, RemoteStore};
    use crate::geometry::PercentRect;

    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        Terminal::new(TestBackend::new(width, height)).expect("failed to build test terminal")
    }

    /// Scripted stand-in for the HTTP API. Fetches replay the configured
    /// JSON payloads; mutations hand out sequential ids unless told to fail.
    /// Every remote call is recorded for assertion.
    pub struct ScriptedRemote {
        notes: Vec<serde_json::Value>,
        highlights: Vec<serde_json::Value>,
        outline: Vec<OutlineEntry>,
        fail_fetches: bool,
        fail_creates: bool,
        fail_deletes: bool,
        fixed_create_id: Option<i64>,
        next_id: AtomicI64,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedRemote {
        pub fn new() -> Self {
            Self {
                notes: Vec::new(),
                highlights: Vec::new(),
                outline: Vec::new(),
                fail_fetches: false,
                fail_creates: false,
                fail_deletes: false,
                fixed_create_id: None,
                next_id: AtomicI64::new(100),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn with_notes(mut self, notes: Vec<serde_json::Value>) -> Self {
            self.notes = notes;
            self
        }

        pub fn with_highlights(mut self, highlights: Vec<serde_json::Value>) -> Self {
            self.highlights = highlights;
            self
        }

        pub fn with_outline(mut self, outline: Vec<OutlineEntry>) -> Self {
            self.outline = outline;
            self
        }

        pub fn fail_fetches(mut self) -> Self {
            self.fail_fetches = true;
            self
        }

        pub fn fail_creates(mut self) -> Self {
            self.fail_creates = true;
            self
        }

        pub fn fail_deletes(mut self) -> Self {
            self.fail_deletes = true;
            self
        }

        /// Every create returns the same id, to exercise the
        /// append-if-absent guard against stale duplicate responses.
        pub fn with_fixed_create_id(mut self, id: i64) -> Self {
            self.fixed_create_id = Some(id);
            self
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }

        fn allocate_id(&self) -> i64 {
            self.fixed_create_id
                .unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::SeqCst))
        }
    }

    impl Default for ScriptedRemote {
        fn default() -> Self {
            Self::new()
        }
    }

    impl RemoteStore for ScriptedRemote {
        fn fetch_notes(&self) -> ApiResult<Vec<NoteDto>> {
            self.record("fetch_notes");
            if self.fail_fetches {
                return Err(ApiError::Network("scripted fetch failure".to_string()));
            }
            self.notes
                .iter()
                .map(|v| {
                    serde_json::from_value(v.clone())
                        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
                })
                .collect()
        }

        fn fetch_highlights(&self) -> ApiResult<Vec<HighlightDto>> {
            self.record("fetch_highlights");
            if self.fail_fetches {
                return Err(ApiError::Network("scripted fetch failure".to_string()));
            }
            self.highlights
                .iter()
                .map(|v| {
                    serde_json::from_value(v.clone())
                        .map_err(|e| ApiError::InvalidResponse(e.to_string()))
                })
                .collect()
        }

        fn fetch_outline(&self) -> ApiResult<Vec<OutlineEntry>> {
            self.record("fetch_outline");
            if self.fail_fetches {
                return Err(ApiError::Network("scripted fetch failure".to_string()));
            }
            Ok(self.outline.clone())
        }

        fn create_note(
            &self,
            page_number: usize,
            content: &str,
            x: f64,
            y: f64,
        ) -> ApiResult<i64> {
            self.record(format!(
                "create_note page={page_number} content={content:?} x={x:.1} y={y:.1}"
            ));
            if self.fail_creates {
                return Err(ApiError::Rejected("scripted create failure".to_string()));
            }
            Ok(self.allocate_id())
        }

        fn create_highlight(
            &self,
            page_number: usize,
            coordinates: &PercentRect,
            color: HighlightColor,
        ) -> ApiResult<i64> {
            self.record(format!(
                "create_highlight page={page_number} rect=({:.1},{:.1},{:.1},{:.1}) color={}",
                coordinates.x,
                coordinates.y,
                coordinates.w,
                coordinates.h,
                color.as_str()
            ));
            if self.fail_creates {
                return Err(ApiError::Rejected("scripted create failure".to_string()));
            }
            Ok(self.allocate_id())
        }

        fn delete_note(&self, id: i64) -> ApiResult<()> {
            self.record(format!("delete_note id={id}"));
            if self.fail_deletes {
                return Err(ApiError::Rejected("scripted delete failure".to_string()));
            }
            Ok(())
        }

        fn delete_highlight(&self, id: i64) -> ApiResult<()> {
            self.record(format!("delete_highlight id={id}"));
            if self.fail_deletes {
                return Err(ApiError::Rejected("scripted delete failure".to_string()));
            }
            Ok(())
        }
    }
}

pub use test_helpers::{ScriptedRemote, create_test_terminal};

// Export modules for use in tests
pub mod annotation;
pub mod api;
pub mod event_source;
pub mod flip;
pub mod geometry;
pub mod gesture;
pub mod main_app;
pub mod notification;
pub mod panic_handler;
pub mod render;
pub mod settings;
pub mod store;
pub mod tool;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use main_app::{run_app_with_event_source, App, AppAction};

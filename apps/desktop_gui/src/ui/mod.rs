//! UI layer for desktop GUI: goal view, task detail view and the notice modal.

pub mod app;

pub use app::ExploreApp;

//! Backend bridge: UI command queue feeding a worker thread that owns the tokio runtime.

pub mod commands;
pub mod runtime;

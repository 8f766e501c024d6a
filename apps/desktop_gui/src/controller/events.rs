//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ClientError, ControllerSnapshot, ErrorKind};

use crate::backend_bridge::commands::BackendCommand;

pub enum UiEvent {
    Info(String),
    Snapshot(ControllerSnapshot),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Transport,
    Backend,
    Validation,
    Storage,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Decompose,
    Options,
    Selection,
    Summary,
    Reset,
    General,
}

impl UiErrorContext {
    pub fn for_command(cmd: &BackendCommand) -> Self {
        match cmd {
            BackendCommand::Decompose { .. } => UiErrorContext::Decompose,
            BackendCommand::OpenTask { .. } | BackendCommand::ReloadOptions => {
                UiErrorContext::Options
            }
            BackendCommand::ToggleSelection { .. } | BackendCommand::CommitSelections => {
                UiErrorContext::Selection
            }
            BackendCommand::Summarize { .. } => UiErrorContext::Summary,
            BackendCommand::ResetAll => UiErrorContext::Reset,
            _ => UiErrorContext::General,
        }
    }

    fn label(self) -> &'static str {
        match self {
            UiErrorContext::BackendStartup => "Startup",
            UiErrorContext::Decompose => "Decompose",
            UiErrorContext::Options => "Options",
            UiErrorContext::Selection => "Selections",
            UiErrorContext::Summary => "Summary",
            UiErrorContext::Reset => "Reset",
            UiErrorContext::General => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
    retryable: bool,
}

impl UiError {
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err.kind() {
            ErrorKind::Network => UiErrorCategory::Transport,
            ErrorKind::Status | ErrorKind::InvalidResponse => UiErrorCategory::Backend,
            ErrorKind::Validation => UiErrorCategory::Validation,
            ErrorKind::Storage => UiErrorCategory::Storage,
        };
        Self {
            category,
            context,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }

    /// For failures that never went through the controller, such as startup.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            UiErrorCategory::Transport
        } else if lower.contains("sqlite") || lower.contains("store") {
            UiErrorCategory::Storage
        } else if lower.contains("invalid") {
            UiErrorCategory::Validation
        } else {
            UiErrorCategory::Unknown
        };
        Self {
            category,
            context,
            message,
            retryable: category == UiErrorCategory::Transport,
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    pub fn display(&self) -> String {
        let hint = if self.retryable { " (try again)" } else { "" };
        format!("{}: {}{hint}", self.context.label(), self.message)
    }
}

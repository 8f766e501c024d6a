//! Render-ready view models and the text-addressed task routes.

use shared::domain::{SubTask, SubTaskId};
use thiserror::Error;

use crate::controller::{CallKind, CallStatus, ControllerSnapshot, View};

/// Marks `encodeURIComponent` leaves as-is that `urlencoding` escapes.
const KEPT_MARKS: [(&str, &str); 5] = [
    ("%21", "!"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%2A", "*"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("task route is empty")]
    Empty,
    #[error("task route is not valid UTF-8 after decoding: {0}")]
    InvalidUtf8(String),
}

pub fn task_href(text: &str) -> String {
    // A literal '%' is emitted as "%25", so the marks never match across escapes.
    let mut encoded = urlencoding::encode(text).into_owned();
    for (escaped, mark) in KEPT_MARKS {
        encoded = encoded.replace(escaped, mark);
    }
    format!("/{encoded}")
}

pub fn decode_task_route(path: &str) -> Result<String, RouteError> {
    let encoded = path.strip_prefix('/').unwrap_or(path);
    if encoded.is_empty() {
        return Err(RouteError::Empty);
    }
    urlencoding::decode(encoded)
        .map(|text| text.into_owned())
        .map_err(|_| RouteError::InvalidUtf8(path.to_string()))
}

/// First sub-task whose text matches; duplicate texts share one route.
pub fn resolve_task<'a>(tasks: &'a [SubTask], text: &str) -> Option<&'a SubTask> {
    tasks.iter().find(|task| task.text == text)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLink {
    pub id: SubTaskId,
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalView {
    pub goal: String,
    pub personalization: String,
    pub entries: Vec<TaskLink>,
    pub summary: Option<String>,
    pub decomposing: bool,
    pub summarizing: bool,
    pub error: Option<String>,
}

impl GoalView {
    pub fn from_snapshot(snapshot: &ControllerSnapshot) -> Self {
        let entries = snapshot
            .tasks
            .iter()
            .map(|task| TaskLink {
                id: task.id,
                label: task.text.clone(),
                href: task_href(&task.text),
            })
            .collect();

        let error = [CallKind::Decompose, CallKind::Summary]
            .into_iter()
            .find_map(|kind| match snapshot.status(kind) {
                CallStatus::Failed(err) => Some(err.to_string()),
                _ => None,
            });

        Self {
            goal: snapshot.goal.clone(),
            personalization: snapshot.personalization.clone(),
            entries,
            summary: (!snapshot.summary.is_empty()).then(|| snapshot.summary.clone()),
            decomposing: snapshot.status(CallKind::Decompose).is_loading(),
            summarizing: snapshot.status(CallKind::Summary).is_loading(),
            error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRow {
    pub index: usize,
    pub label: String,
    pub checked: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetailView {
    pub id: SubTaskId,
    pub title: String,
    /// Empty until options arrive; the panel is hidden while empty.
    pub recommended: String,
    pub options: Vec<OptionRow>,
    pub loading: bool,
    pub error: Option<String>,
}

impl TaskDetailView {
    /// `None` unless the snapshot's current view is a task detail view.
    pub fn from_snapshot(snapshot: &ControllerSnapshot) -> Option<Self> {
        let View::Task(id) = snapshot.view else {
            return None;
        };
        let task = snapshot.tasks.iter().find(|task| task.id == id)?;

        let (recommended, options) = match &snapshot.active_options {
            Some(active) if active.task_id == id => (
                active.options.recommended.clone(),
                active
                    .options
                    .options
                    .iter()
                    .enumerate()
                    .map(|(index, label)| OptionRow {
                        index,
                        label: label.clone(),
                        checked: active.selection.is_checked(index),
                    })
                    .collect(),
            ),
            _ => (String::new(), Vec::new()),
        };

        let status = snapshot.status(CallKind::Options);
        Some(Self {
            id,
            title: task.text.clone(),
            recommended,
            options,
            loading: status.is_loading(),
            error: status.failure().map(ToString::to_string),
        })
    }
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;

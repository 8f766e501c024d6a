//! Interaction controller: goal, sub-tasks, options, selections, personalization and summary.
//!
//! Each backend call kind carries a request generation. Starting a call, navigating
//! away from its view, or resetting bumps the generation; a response that comes back
//! under an older generation is dropped without touching state.
//!
//! Store writes happen while the state lock is held, and `reset_all` keeps the lock
//! until every key is cleared, so no write can land between a reset's clears.

use std::sync::Arc;

use shared::{
    domain::{
        append_likes, sub_tasks_from_texts, OptionSet, Selection, SubTask, SubTaskId,
        DEFAULT_SUMMARY_PROMPT,
    },
    protocol::ExploreRequest,
};
use storage::{keys, PersistenceStore};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{
    api::ExploreApi,
    error::ClientError,
    view::{decode_task_route, resolve_task},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    Decompose,
    Options,
    Summary,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CallStatus {
    #[default]
    Idle,
    Loading,
    Failed(ClientError),
}

impl CallStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, CallStatus::Loading)
    }

    pub fn failure(&self) -> Option<&ClientError> {
        match self {
            CallStatus::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Goal,
    Task(SubTaskId),
}

/// Options fetched for the sub-task currently on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveOptions {
    pub task_id: SubTaskId,
    pub options: OptionSet,
    pub selection: Selection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallStatuses {
    pub decompose: CallStatus,
    pub options: CallStatus,
    pub summary: CallStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub goal: String,
    pub personalization: String,
    pub tasks: Vec<SubTask>,
    pub view: View,
    pub active_options: Option<ActiveOptions>,
    pub summary: String,
    pub statuses: CallStatuses,
    pub notice: Option<String>,
}

impl ControllerSnapshot {
    pub fn status(&self, kind: CallKind) -> &CallStatus {
        match kind {
            CallKind::Decompose => &self.statuses.decompose,
            CallKind::Options => &self.statuses.options,
            CallKind::Summary => &self.statuses.summary,
        }
    }

    fn status_mut(&mut self, kind: CallKind) -> &mut CallStatus {
        match kind {
            CallKind::Decompose => &mut self.statuses.decompose,
            CallKind::Options => &mut self.statuses.options,
            CallKind::Summary => &mut self.statuses.summary,
        }
    }

    pub fn task(&self, id: SubTaskId) -> Option<&SubTask> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// Outcome of an operation that may not touch state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    Applied(T),
    /// A newer request, a navigation or a reset replaced this one.
    Superseded,
    /// Preconditions made the call unnecessary.
    Skipped,
}

impl<T> Completion<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum ControllerEvent {
    Restored,
    GoalChanged(String),
    PersonalizationChanged(String),
    TasksReplaced(Vec<SubTask>),
    Navigated(View),
    OptionsLoaded {
        task_id: SubTaskId,
        options: OptionSet,
    },
    SelectionChanged {
        task_id: SubTaskId,
        selection: Selection,
    },
    SummaryUpdated(String),
    CallStarted(CallKind),
    CallFailed {
        kind: CallKind,
        error: ClientError,
    },
    Notice(String),
    Reset,
}

#[derive(Debug, Default)]
struct Generations {
    decompose: u64,
    options: u64,
    summary: u64,
}

impl Generations {
    fn slot(&mut self, kind: CallKind) -> &mut u64 {
        match kind {
            CallKind::Decompose => &mut self.decompose,
            CallKind::Options => &mut self.options,
            CallKind::Summary => &mut self.summary,
        }
    }

    fn bump(&mut self, kind: CallKind) -> u64 {
        let slot = self.slot(kind);
        *slot += 1;
        *slot
    }

    fn is_current(&self, kind: CallKind, generation: u64) -> bool {
        let current = match kind {
            CallKind::Decompose => self.decompose,
            CallKind::Options => self.options,
            CallKind::Summary => self.summary,
        };
        current == generation
    }
}

#[derive(Default)]
struct ControllerState {
    snapshot: ControllerSnapshot,
    generations: Generations,
}

impl ControllerState {
    fn go_to_goal_view(&mut self) {
        self.snapshot.view = View::Goal;
        self.snapshot.active_options = None;
        self.snapshot.statuses.options = CallStatus::Idle;
        self.generations.bump(CallKind::Options);
    }
}

pub struct InteractionController {
    api: Arc<dyn ExploreApi>,
    store: Arc<dyn PersistenceStore>,
    inner: Mutex<ControllerState>,
    events: broadcast::Sender<ControllerEvent>,
}

impl InteractionController {
    pub fn new(api: Arc<dyn ExploreApi>, store: Arc<dyn PersistenceStore>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            api,
            store,
            inner: Mutex::new(ControllerState::default()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ControllerEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.inner.lock().await.snapshot.clone()
    }

    fn emit(&self, event: ControllerEvent) {
        let _ = self.events.send(event);
    }

    async fn persist(&self, key: &str, value: &str) -> Result<(), ClientError> {
        self.store
            .set(key, value)
            .await
            .map_err(ClientError::storage)
    }

    async fn load(&self, key: &str) -> Result<Option<String>, ClientError> {
        self.store.get(key).await.map_err(ClientError::storage)
    }

    /// Loads goal, personalization, sub-tasks and summary from the store.
    pub async fn restore(&self) -> Result<(), ClientError> {
        let goal = self.load(keys::GOAL).await?.unwrap_or_default();
        let personalization = self.load(keys::PERSONALIZATION).await?.unwrap_or_default();
        let summary = self.load(keys::SUMMARY).await?.unwrap_or_default();
        let tasks = match self.load(keys::TASKS).await? {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(texts) => sub_tasks_from_texts(texts),
                Err(err) => {
                    warn!("controller: ignoring malformed persisted task list: {err}");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        {
            let mut guard = self.inner.lock().await;
            guard.snapshot.goal = goal;
            guard.snapshot.personalization = personalization;
            guard.snapshot.summary = summary;
            guard.snapshot.tasks = tasks;
            guard.go_to_goal_view();
            info!(
                tasks = guard.snapshot.tasks.len(),
                "controller: restored persisted state"
            );
        }
        self.emit(ControllerEvent::Restored);
        Ok(())
    }

    pub async fn set_goal(&self, goal: &str) -> Result<(), ClientError> {
        {
            let mut guard = self.inner.lock().await;
            self.persist(keys::GOAL, goal).await?;
            guard.snapshot.goal = goal.to_string();
        }
        self.emit(ControllerEvent::GoalChanged(goal.to_string()));
        Ok(())
    }

    pub async fn set_personalization(&self, personalization: &str) -> Result<(), ClientError> {
        {
            let mut guard = self.inner.lock().await;
            self.persist(keys::PERSONALIZATION, personalization).await?;
            guard.snapshot.personalization = personalization.to_string();
        }
        self.emit(ControllerEvent::PersonalizationChanged(
            personalization.to_string(),
        ));
        Ok(())
    }

    /// Replaces the sub-task list with a fresh decomposition of `goal`.
    ///
    /// A blank goal is a no-op. Personalization is persisted before the call
    /// whether or not the call succeeds.
    pub async fn decompose(
        &self,
        goal: &str,
        personalization: &str,
    ) -> Result<Completion<Vec<SubTask>>, ClientError> {
        if goal.trim().is_empty() {
            debug!("controller: skipping decompose for blank goal");
            return Ok(Completion::Skipped);
        }

        let generation = self.begin_call(CallKind::Decompose).await;
        {
            let mut guard = self.inner.lock().await;
            if !guard.generations.is_current(CallKind::Decompose, generation) {
                debug!(generation, "controller: decompose superseded before request");
                return Ok(Completion::Superseded);
            }
            let persisted = match self.persist(keys::PERSONALIZATION, personalization).await {
                Ok(()) => self.persist(keys::GOAL, goal).await,
                Err(err) => Err(err),
            };
            if let Err(err) = persisted {
                return Err(self.fail_call(&mut guard, CallKind::Decompose, err));
            }
            guard.snapshot.personalization = personalization.to_string();
            guard.snapshot.goal = goal.to_string();
        }
        self.emit(ControllerEvent::PersonalizationChanged(
            personalization.to_string(),
        ));
        self.emit(ControllerEvent::GoalChanged(goal.to_string()));

        info!(generation, "controller: decompose requested");
        let result = self
            .api
            .decompose(ExploreRequest::new(goal, personalization))
            .await;

        let mut guard = self.inner.lock().await;
        if !guard.generations.is_current(CallKind::Decompose, generation) {
            debug!(generation, "controller: discarding superseded decompose response");
            return Ok(Completion::Superseded);
        }

        let tasks = match result {
            Ok(res) => sub_tasks_from_texts(res.sub_problems),
            Err(err) => return Err(self.fail_call(&mut guard, CallKind::Decompose, err)),
        };

        let texts: Vec<&str> = tasks.iter().map(|task| task.text.as_str()).collect();
        let persisted = match serde_json::to_string(&texts) {
            Ok(serialized) => self.persist(keys::TASKS, &serialized).await,
            Err(err) => Err(ClientError::Storage(format!("failed to encode tasks: {err}"))),
        };
        if let Err(err) = persisted {
            return Err(self.fail_call(&mut guard, CallKind::Decompose, err));
        }

        guard.snapshot.tasks = tasks.clone();
        guard.snapshot.statuses.decompose = CallStatus::Idle;
        guard.go_to_goal_view();
        drop(guard);

        info!(tasks = tasks.len(), "controller: decompose applied");
        self.emit(ControllerEvent::TasksReplaced(tasks.clone()));
        self.emit(ControllerEvent::Navigated(View::Goal));
        Ok(Completion::Applied(tasks))
    }

    /// Enters a sub-task's detail view and fetches its options.
    ///
    /// Any selection made earlier for this sub-task is discarded.
    pub async fn open_task(&self, id: SubTaskId) -> Result<Completion<OptionSet>, ClientError> {
        let (generation, text, personalization) = {
            let mut guard = self.inner.lock().await;
            let text = guard
                .snapshot
                .task(id)
                .map(|task| task.text.clone())
                .ok_or_else(|| ClientError::UnknownSubTask(id.to_string()))?;
            guard.snapshot.view = View::Task(id);
            guard.snapshot.active_options = None;
            guard.snapshot.statuses.options = CallStatus::Loading;
            let generation = guard.generations.bump(CallKind::Options);
            (generation, text, guard.snapshot.personalization.clone())
        };
        self.emit(ControllerEvent::Navigated(View::Task(id)));
        self.emit(ControllerEvent::CallStarted(CallKind::Options));
        info!(generation, task = %text, "controller: loading options");

        let result = self
            .api
            .options(ExploreRequest::new(text, personalization))
            .await;

        let mut guard = self.inner.lock().await;
        if !guard.generations.is_current(CallKind::Options, generation)
            || guard.snapshot.view != View::Task(id)
        {
            debug!(generation, "controller: discarding superseded options response");
            return Ok(Completion::Superseded);
        }

        let options = match result {
            Ok(res) => OptionSet {
                recommended: res.recommended,
                options: res.options,
            },
            Err(err) => return Err(self.fail_call(&mut guard, CallKind::Options, err)),
        };

        guard.snapshot.active_options = Some(ActiveOptions {
            task_id: id,
            options: options.clone(),
            selection: Selection::for_options(&options),
        });
        guard.snapshot.statuses.options = CallStatus::Idle;
        drop(guard);

        self.emit(ControllerEvent::OptionsLoaded {
            task_id: id,
            options: options.clone(),
        });
        Ok(Completion::Applied(options))
    }

    /// Opens the detail view addressed by a percent-encoded task route.
    pub async fn open_route(&self, path: &str) -> Result<Completion<OptionSet>, ClientError> {
        let text = decode_task_route(path)
            .map_err(|err| ClientError::UnknownSubTask(format!("{path}: {err}")))?;
        let id = {
            let guard = self.inner.lock().await;
            resolve_task(&guard.snapshot.tasks, &text)
                .map(|task| task.id)
                .ok_or_else(|| ClientError::UnknownSubTask(text.clone()))?
        };
        self.open_task(id).await
    }

    /// Re-issues the options request for the open sub-task.
    pub async fn reload_options(&self) -> Result<Completion<OptionSet>, ClientError> {
        let view = self.inner.lock().await.snapshot.view;
        match view {
            View::Task(id) => self.open_task(id).await,
            View::Goal => Err(ClientError::NoActiveTask),
        }
    }

    /// Flips one checkbox of the open sub-task. Local only.
    pub async fn toggle_selection(&self, index: usize) -> Result<bool, ClientError> {
        let (task_id, selection, checked) = {
            let mut guard = self.inner.lock().await;
            let view = guard.snapshot.view;
            let active = guard
                .snapshot
                .active_options
                .as_mut()
                .filter(|active| view == View::Task(active.task_id))
                .ok_or(ClientError::NoActiveTask)?;
            let checked = active.selection.toggle(index)?;
            (active.task_id, active.selection.clone(), checked)
        };
        debug!(index, checked, "controller: toggled option");
        self.emit(ControllerEvent::SelectionChanged { task_id, selection });
        Ok(checked)
    }

    /// Folds the checked options of the open sub-task into personalization
    /// and returns to the goal view.
    pub async fn commit_selections(&self) -> Result<Option<String>, ClientError> {
        let selected = {
            let guard = self.inner.lock().await;
            match (&guard.snapshot.active_options, guard.snapshot.view) {
                (Some(active), View::Task(id)) if active.task_id == id => {
                    active.selection.selected_texts(&active.options)
                }
                _ => Vec::new(),
            }
        };
        self.commit_selections_to_personalization(&selected).await
    }

    /// Appends `"I like a and b"` to the stored personalization.
    ///
    /// With nothing selected the stored text is left untouched.
    pub async fn commit_selections_to_personalization(
        &self,
        selected: &[String],
    ) -> Result<Option<String>, ClientError> {
        let updated = {
            let mut guard = self.inner.lock().await;
            let existing = self.load(keys::PERSONALIZATION).await?.unwrap_or_default();
            let updated = append_likes(&existing, selected);
            if let Some(updated) = &updated {
                self.persist(keys::PERSONALIZATION, updated).await?;
                info!(
                    liked = selected.len(),
                    "controller: personalization extended from selections"
                );
                guard.snapshot.personalization = updated.clone();
            }
            guard.go_to_goal_view();
            updated
        };

        if let Some(updated) = &updated {
            self.emit(ControllerEvent::PersonalizationChanged(updated.clone()));
        }
        self.emit(ControllerEvent::Navigated(View::Goal));
        Ok(updated)
    }

    /// Leaves a detail view; a pending options response for it is dropped.
    pub async fn back_to_goal(&self) {
        self.inner.lock().await.go_to_goal_view();
        self.emit(ControllerEvent::Navigated(View::Goal));
    }

    /// Generates a personalized summary for `goal`.
    ///
    /// Rejected without a network call when personalization is blank.
    pub async fn summarize(
        &self,
        goal: &str,
        personalization: &str,
    ) -> Result<Completion<String>, ClientError> {
        if personalization.trim().is_empty() {
            let err = ClientError::PersonalizationRequired;
            self.inner.lock().await.snapshot.notice = Some(err.to_string());
            self.emit(ControllerEvent::Notice(err.to_string()));
            return Err(err);
        }

        let text = if goal.trim().is_empty() {
            DEFAULT_SUMMARY_PROMPT
        } else {
            goal
        };

        let generation = self.begin_call(CallKind::Summary).await;
        info!(generation, "controller: summary requested");
        let result = self
            .api
            .summary(ExploreRequest::new(text, personalization))
            .await;

        let mut guard = self.inner.lock().await;
        if !guard.generations.is_current(CallKind::Summary, generation) {
            debug!(generation, "controller: discarding superseded summary response");
            return Ok(Completion::Superseded);
        }

        let summary = match result {
            Ok(res) => res.summary,
            Err(err) => return Err(self.fail_call(&mut guard, CallKind::Summary, err)),
        };
        if let Err(err) = self.persist(keys::SUMMARY, &summary).await {
            return Err(self.fail_call(&mut guard, CallKind::Summary, err));
        }

        guard.snapshot.summary = summary.clone();
        guard.snapshot.statuses.summary = CallStatus::Idle;
        drop(guard);

        self.emit(ControllerEvent::SummaryUpdated(summary.clone()));
        Ok(Completion::Applied(summary))
    }

    pub async fn dismiss_notice(&self) {
        self.inner.lock().await.snapshot.notice = None;
    }

    /// Clears goal, personalization, sub-tasks and summary from memory and
    /// storage, and invalidates every in-flight request.
    pub async fn reset_all(&self) -> Result<(), ClientError> {
        {
            let mut guard = self.inner.lock().await;
            for kind in [CallKind::Decompose, CallKind::Options, CallKind::Summary] {
                guard.generations.bump(kind);
            }
            guard.snapshot = ControllerSnapshot::default();
            for key in keys::ALL {
                self.store.clear(key).await.map_err(ClientError::storage)?;
            }
        }
        info!("controller: reset all state");
        self.emit(ControllerEvent::Reset);
        Ok(())
    }

    async fn begin_call(&self, kind: CallKind) -> u64 {
        let generation = {
            let mut guard = self.inner.lock().await;
            *guard.snapshot.status_mut(kind) = CallStatus::Loading;
            guard.generations.bump(kind)
        };
        self.emit(ControllerEvent::CallStarted(kind));
        generation
    }

    /// Records a failure of the current request of `kind` and hands the error back.
    fn fail_call(
        &self,
        state: &mut ControllerState,
        kind: CallKind,
        error: ClientError,
    ) -> ClientError {
        warn!(?kind, "controller: call failed: {error}");
        *state.snapshot.status_mut(kind) = CallStatus::Failed(error.clone());
        self.emit(ControllerEvent::CallFailed {
            kind,
            error: error.clone(),
        });
        error
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;

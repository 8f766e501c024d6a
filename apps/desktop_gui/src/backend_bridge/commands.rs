//! Backend commands queued from UI to backend worker.

use shared::domain::SubTaskId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCommand {
    SetGoal(String),
    SetPersonalization(String),
    Decompose {
        goal: String,
        personalization: String,
    },
    OpenTask {
        id: SubTaskId,
    },
    ReloadOptions,
    ToggleSelection {
        index: usize,
    },
    CommitSelections,
    BackToGoal,
    Summarize {
        goal: String,
        personalization: String,
    },
    DismissNotice,
    ResetAll,
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::SetGoal(_) => "set_goal",
            BackendCommand::SetPersonalization(_) => "set_personalization",
            BackendCommand::Decompose { .. } => "decompose",
            BackendCommand::OpenTask { .. } => "open_task",
            BackendCommand::ReloadOptions => "reload_options",
            BackendCommand::ToggleSelection { .. } => "toggle_selection",
            BackendCommand::CommitSelections => "commit_selections",
            BackendCommand::BackToGoal => "back_to_goal",
            BackendCommand::Summarize { .. } => "summarize",
            BackendCommand::DismissNotice => "dismiss_notice",
            BackendCommand::ResetAll => "reset_all",
        }
    }

    /// Commands that never reach the backend API. They run in queue order so
    /// a toggle is applied before the commit that follows it.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            BackendCommand::SetGoal(_)
                | BackendCommand::SetPersonalization(_)
                | BackendCommand::ToggleSelection { .. }
                | BackendCommand::CommitSelections
                | BackendCommand::BackToGoal
                | BackendCommand::DismissNotice
                | BackendCommand::ResetAll
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_network_commands_are_spawned() {
        let local = [
            BackendCommand::SetGoal("Plan a trip".into()),
            BackendCommand::ToggleSelection { index: 0 },
            BackendCommand::CommitSelections,
            BackendCommand::BackToGoal,
            BackendCommand::DismissNotice,
            BackendCommand::ResetAll,
        ];
        assert!(local.iter().all(BackendCommand::is_local));

        let network = [
            BackendCommand::Decompose {
                goal: "Plan a trip".into(),
                personalization: String::new(),
            },
            BackendCommand::OpenTask {
                id: SubTaskId::new(),
            },
            BackendCommand::ReloadOptions,
            BackendCommand::Summarize {
                goal: String::new(),
                personalization: "I like hiking".into(),
            },
        ];
        assert!(!network.iter().any(BackendCommand::is_local));
    }
}

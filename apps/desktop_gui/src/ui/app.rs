use std::time::Duration;

use client_core::{ControllerSnapshot, GoalView, TaskDetailView, View};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;

const SAVE_SELECTIONS_LABEL: &str = "Save Selections & Explore More Ideas";

pub struct ExploreApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    snapshot: ControllerSnapshot,
    goal_draft: String,
    personalization_draft: String,
    // Last values seen from the controller; drafts follow them only when they change.
    synced_goal: String,
    synced_personalization: String,
    status: String,
    status_banner: Option<UiError>,
}

impl ExploreApp {
    pub fn new(cmd_tx: Sender<BackendCommand>, ui_rx: Receiver<UiEvent>) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            snapshot: ControllerSnapshot::default(),
            goal_draft: String::new(),
            personalization_draft: String::new(),
            synced_goal: String::new(),
            synced_personalization: String::new(),
            status: "Starting...".to_string(),
            status_banner: None,
        }
    }

    fn send(&mut self, cmd: BackendCommand) {
        dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status);
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            match event {
                UiEvent::Info(message) => self.status = message,
                UiEvent::Error(err) => {
                    self.status = err.display();
                    self.status_banner = Some(err);
                }
                UiEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            }
        }
    }

    fn apply_snapshot(&mut self, snapshot: ControllerSnapshot) {
        if snapshot.goal != self.synced_goal {
            self.synced_goal = snapshot.goal.clone();
            self.goal_draft = snapshot.goal.clone();
        }
        if snapshot.personalization != self.synced_personalization {
            self.synced_personalization = snapshot.personalization.clone();
            self.personalization_draft = snapshot.personalization.clone();
        }
        self.snapshot = snapshot;
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        let Some(banner) = self.status_banner.clone() else {
            return;
        };
        ui.horizontal_wrapped(|ui| {
            ui.colored_label(egui::Color32::from_rgb(220, 110, 110), banner.display());
            if ui.small_button("Dismiss").clicked() {
                self.status_banner = None;
            }
        });
        ui.separator();
    }

    fn show_goal_view(&mut self, ui: &mut egui::Ui) {
        let view = GoalView::from_snapshot(&self.snapshot);

        ui.heading("What do you want to do?");
        let goal_edit = ui.add(
            egui::TextEdit::multiline(&mut self.goal_draft)
                .hint_text("Plan a week-long trip to Portugal")
                .desired_rows(2)
                .desired_width(f32::INFINITY),
        );
        if goal_edit.lost_focus() && self.goal_draft != self.synced_goal {
            self.send(BackendCommand::SetGoal(self.goal_draft.clone()));
        }

        ui.add_space(8.0);
        ui.label("Personalization");
        let personalization_edit = ui.add(
            egui::TextEdit::multiline(&mut self.personalization_draft)
                .hint_text("I like hiking")
                .desired_rows(3)
                .desired_width(f32::INFINITY),
        );
        if personalization_edit.lost_focus()
            && self.personalization_draft != self.synced_personalization
        {
            self.send(BackendCommand::SetPersonalization(
                self.personalization_draft.clone(),
            ));
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let can_decompose = !view.decomposing && !self.goal_draft.trim().is_empty();
            if ui
                .add_enabled(can_decompose, egui::Button::new("Decompose"))
                .clicked()
            {
                self.send(BackendCommand::Decompose {
                    goal: self.goal_draft.clone(),
                    personalization: self.personalization_draft.clone(),
                });
            }
            if ui
                .add_enabled(!view.summarizing, egui::Button::new("Summarize"))
                .clicked()
            {
                self.send(BackendCommand::Summarize {
                    goal: self.goal_draft.clone(),
                    personalization: self.personalization_draft.clone(),
                });
            }
            if ui.button("Reset").clicked() {
                self.send(BackendCommand::ResetAll);
            }
            if view.decomposing || view.summarizing {
                ui.spinner();
            }
        });

        if let Some(error) = &view.error {
            ui.colored_label(egui::Color32::from_rgb(220, 110, 110), error);
        }

        ui.add_space(12.0);
        if !view.entries.is_empty() {
            ui.label(egui::RichText::new("Sub-tasks").strong());
            let mut opened = None;
            ui.horizontal_wrapped(|ui| {
                for entry in &view.entries {
                    if ui
                        .button(&entry.label)
                        .on_hover_text(&entry.href)
                        .clicked()
                    {
                        opened = Some(entry.id);
                    }
                }
            });
            if let Some(id) = opened {
                self.send(BackendCommand::OpenTask { id });
            }
        }

        if let Some(summary) = &view.summary {
            ui.add_space(12.0);
            ui.group(|ui| {
                ui.label(egui::RichText::new("Summary").strong());
                ui.label(summary);
            });
        }
    }

    fn show_task_view(&mut self, ui: &mut egui::Ui, detail: TaskDetailView) {
        if ui.button("< Back").clicked() {
            self.send(BackendCommand::BackToGoal);
            return;
        }
        ui.heading(&detail.title);

        if detail.loading {
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Loading ideas...");
            });
        }
        if let Some(error) = &detail.error {
            ui.horizontal_wrapped(|ui| {
                ui.colored_label(egui::Color32::from_rgb(220, 110, 110), error);
                if ui.small_button("Retry").clicked() {
                    self.send(BackendCommand::ReloadOptions);
                }
            });
        }

        if !detail.recommended.is_empty() {
            ui.add_space(8.0);
            ui.group(|ui| {
                ui.label(egui::RichText::new("Recommended").strong());
                ui.label(&detail.recommended);
            });
        }

        if !detail.options.is_empty() {
            ui.add_space(8.0);
            for row in &detail.options {
                let mut checked = row.checked;
                if ui.checkbox(&mut checked, &row.label).changed() {
                    self.send(BackendCommand::ToggleSelection { index: row.index });
                }
            }
            ui.add_space(8.0);
            if ui.button(SAVE_SELECTIONS_LABEL).clicked() {
                self.send(BackendCommand::CommitSelections);
            }
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.snapshot.notice.clone() else {
            return;
        };
        egui::Window::new("Notice")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice);
                if ui.button("OK").clicked() {
                    // Hide at once; the backend confirms with the next snapshot.
                    self.snapshot.notice = None;
                    self.send(BackendCommand::DismissNotice);
                }
            });
    }
}

impl eframe::App for ExploreApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.small(&self.status);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_status_banner(ui);
            egui::ScrollArea::vertical().show(ui, |ui| match self.snapshot.view {
                View::Goal => self.show_goal_view(ui),
                View::Task(_) => match TaskDetailView::from_snapshot(&self.snapshot) {
                    Some(detail) => self.show_task_view(ui, detail),
                    None => self.show_goal_view(ui),
                },
            });
        });

        self.show_notice(ctx);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    fn app() -> (ExploreApp, Receiver<BackendCommand>, Sender<UiEvent>) {
        let (cmd_tx, cmd_rx) = bounded(8);
        let (ui_tx, ui_rx) = bounded(8);
        (ExploreApp::new(cmd_tx, ui_rx), cmd_rx, ui_tx)
    }

    #[test]
    fn snapshot_refreshes_drafts_only_when_controller_value_changes() {
        let (mut app, _cmd_rx, ui_tx) = app();
        let snapshot = ControllerSnapshot {
            personalization: "I like hiking".into(),
            ..ControllerSnapshot::default()
        };
        ui_tx
            .try_send(UiEvent::Snapshot(snapshot.clone()))
            .expect("queue");
        app.process_ui_events();
        assert_eq!(app.personalization_draft, "I like hiking");

        app.personalization_draft.push_str(" and trains");
        ui_tx.try_send(UiEvent::Snapshot(snapshot)).expect("queue");
        app.process_ui_events();
        assert_eq!(app.personalization_draft, "I like hiking and trains");

        let committed = ControllerSnapshot {
            personalization: "I like hiking. I like local food".into(),
            ..ControllerSnapshot::default()
        };
        ui_tx.try_send(UiEvent::Snapshot(committed)).expect("queue");
        app.process_ui_events();
        assert_eq!(app.personalization_draft, "I like hiking. I like local food");
    }

    #[test]
    fn errors_set_banner_and_status() {
        let (mut app, _cmd_rx, ui_tx) = app();
        let err = UiError::from_message(
            crate::controller::events::UiErrorContext::BackendStartup,
            "backend worker startup failure: connection refused",
        );
        ui_tx.try_send(UiEvent::Error(err)).expect("queue");
        app.process_ui_events();
        assert!(app.status_banner.is_some());
        assert!(app.status.contains("connection refused"));
    }
}

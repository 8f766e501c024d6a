//! Worker thread owning the tokio runtime and the interaction controller.
//!
//! Network commands run as their own tasks, so a slow options call never blocks a
//! navigation; the controller's request generations sort out overlapping replies.
//! Local commands run inline in queue order.

use std::{sync::Arc, thread};

use client_core::{connect, ClientError, ControllerEvent, InteractionController, Settings};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(settings: Settings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                return;
            }
        };

        runtime.block_on(async move {
            let client = match connect(&settings).await {
                Ok(client) => client,
                Err(err) => {
                    tracing::error!("backend worker startup failure: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err:#}"),
                    )));
                    return;
                }
            };
            let controller = client.controller;

            tokio::spawn(forward_controller_events(
                Arc::clone(&controller),
                ui_tx.clone(),
            ));
            let _ = ui_tx.try_send(UiEvent::Snapshot(controller.snapshot().await));
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                settings.api_base_url
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                if cmd.is_local() {
                    run_command(Arc::clone(&controller), cmd, ui_tx.clone()).await;
                } else {
                    tokio::spawn(run_command(Arc::clone(&controller), cmd, ui_tx.clone()));
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

/// Pushes a fresh snapshot to the UI after every controller state change.
async fn forward_controller_events(controller: Arc<InteractionController>, ui_tx: Sender<UiEvent>) {
    let mut events = controller.subscribe_events();
    loop {
        match events.recv().await {
            Ok(ControllerEvent::CallFailed { kind, error }) => {
                tracing::error!(?kind, "backend call failed: {error}");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "ui event forwarder lagged behind controller");
            }
            Err(RecvError::Closed) => break,
        }
        if ui_tx
            .try_send(UiEvent::Snapshot(controller.snapshot().await))
            .is_err()
        {
            tracing::debug!("ui event queue unavailable; dropping snapshot");
        }
    }
}

async fn run_command(
    controller: Arc<InteractionController>,
    cmd: BackendCommand,
    ui_tx: Sender<UiEvent>,
) {
    let name = cmd.name();
    let context = UiErrorContext::for_command(&cmd);
    tracing::debug!(command = name, "running ui command");

    let result: Result<(), ClientError> = match cmd {
        BackendCommand::SetGoal(goal) => controller.set_goal(&goal).await,
        BackendCommand::SetPersonalization(text) => controller.set_personalization(&text).await,
        BackendCommand::Decompose {
            goal,
            personalization,
        } => controller
            .decompose(&goal, &personalization)
            .await
            .map(drop),
        BackendCommand::OpenTask { id } => controller.open_task(id).await.map(drop),
        BackendCommand::ReloadOptions => controller.reload_options().await.map(drop),
        BackendCommand::ToggleSelection { index } => {
            controller.toggle_selection(index).await.map(drop)
        }
        BackendCommand::CommitSelections => controller.commit_selections().await.map(drop),
        BackendCommand::BackToGoal => {
            controller.back_to_goal().await;
            Ok(())
        }
        BackendCommand::Summarize {
            goal,
            personalization,
        } => controller
            .summarize(&goal, &personalization)
            .await
            .map(drop),
        BackendCommand::DismissNotice => {
            controller.dismiss_notice().await;
            Ok(())
        }
        BackendCommand::ResetAll => controller.reset_all().await,
    };

    match result {
        Ok(()) => {}
        // Shown through the snapshot's notice modal.
        Err(ClientError::PersonalizationRequired) => {}
        Err(err) => {
            tracing::warn!(command = name, "ui command failed: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(context, &err)));
        }
    }
    let _ = ui_tx.try_send(UiEvent::Snapshot(controller.snapshot().await));
}

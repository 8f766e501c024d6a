//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
            tracing::warn!(command = cmd_name, "ui->backend command queue is full");
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend worker is not running (startup failure?); restart the app".to_string();
            tracing::error!(command = cmd_name, "ui->backend command queue disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;

    #[test]
    fn queued_command_reaches_backend() {
        let (tx, rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&tx, BackendCommand::ReloadOptions, &mut status);
        assert_eq!(rx.try_recv().ok(), Some(BackendCommand::ReloadOptions));
        assert!(status.is_empty());
    }

    #[test]
    fn full_queue_reports_status() {
        let (tx, _rx) = bounded(1);
        let mut status = String::new();
        dispatch_backend_command(&tx, BackendCommand::BackToGoal, &mut status);
        dispatch_backend_command(&tx, BackendCommand::ResetAll, &mut status);
        assert_eq!(status, "UI command queue is full; please retry");
    }

    #[test]
    fn disconnected_backend_reports_status() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut status = String::new();
        dispatch_backend_command(&tx, BackendCommand::DismissNotice, &mut status);
        assert!(status.contains("not running"));
    }
}

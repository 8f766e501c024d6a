//! Client core for goal exploration: backend API client, interaction
//! controller, settings and view models shared by the CLI and desktop shells.

use std::sync::Arc;

use anyhow::{Context, Result};
use storage::{PersistenceStore, SqliteStore};

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod view;

pub use api::{ExploreApi, HttpExploreApi};
pub use config::{load_settings, normalize_database_url, Settings};
pub use controller::{
    ActiveOptions, CallKind, CallStatus, Completion, ControllerEvent, ControllerSnapshot,
    InteractionController, View,
};
pub use error::{ClientError, ErrorKind};
pub use view::{decode_task_route, task_href, GoalView, OptionRow, TaskDetailView, TaskLink};

/// Handles a shell needs: the controller plus the concrete store for health checks.
pub struct ClientRuntime {
    pub controller: Arc<InteractionController>,
    pub api: Arc<HttpExploreApi>,
    pub store: Arc<SqliteStore>,
}

/// Opens the SQLite store and HTTP client described by `settings` and
/// restores persisted state into a fresh controller.
pub async fn connect(settings: &Settings) -> Result<ClientRuntime> {
    settings.validate()?;

    let database_url = normalize_database_url(&settings.database_url);
    let store = Arc::new(
        SqliteStore::new(&database_url)
            .await
            .with_context(|| format!("failed to open ui state store at {database_url}"))?,
    );
    let api = Arc::new(HttpExploreApi::new(
        settings.api_base_url.clone(),
        settings.request_timeout(),
    )?);

    let controller = InteractionController::new(
        Arc::clone(&api) as Arc<dyn ExploreApi>,
        Arc::clone(&store) as Arc<dyn PersistenceStore>,
    );
    controller
        .restore()
        .await
        .context("failed to restore persisted ui state")?;

    tracing::info!(
        api = %settings.api_base_url,
        database = %database_url,
        "client runtime ready"
    );
    Ok(ClientRuntime {
        controller,
        api,
        store,
    })
}

//! Per-session dashboard endpoints.

use std::sync::Arc;

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use tokio::sync::Mutex;

use super::{at_revision, success, ApiResult};
use crate::auth::Caller;
use crate::dashboard::{dispatch, Command, CommandOutcome, DashboardState, DashboardView, RowActions};
use crate::errors::AppError;
use crate::models::DiskRecord;
use crate::AppState;

/// Client-side routes for the row buttons.
struct DiskLinks;

impl RowActions for DiskLinks {
    fn detail_target(&self, disk: &DiskRecord) -> String {
        format!("#/disks/{}", disk.id)
    }

    fn edit_target(&self, disk: &DiskRecord) -> String {
        format!("#/disks/{}/edit", disk.id)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub outcome: CommandOutcome,
    pub view: DashboardView,
}

/// Look up the caller's dashboard.
pub(super) async fn session_dashboard(
    state: &AppState,
    caller: &Caller,
) -> Result<Arc<Mutex<DashboardState>>, AppError> {
    let token = caller.session_token()?;
    state
        .sessions
        .dashboard(token)
        .await
        .ok_or_else(|| AppError::Unauthorized("Session expired".to_string()))
}

/// Fold the newest published snapshot into `dashboard`.
///
/// The session's follower task does this too; doing it here means a
/// response never lags behind a write the same request just made.
pub(super) fn catch_up(state: &AppState, dashboard: &mut DashboardState) {
    let _ = dashboard.update(Command::SnapshotReceived(state.store.current()));
}

/// GET /api/dashboard - The current dashboard view.
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<DashboardView> {
    let revision_id = state.store.current().revision_id;
    let dashboard = session_dashboard(&state, &caller)
        .await
        .map_err(at_revision(revision_id))?;

    let mut dashboard = dashboard.lock().await;
    catch_up(&state, &mut dashboard);
    let view = dashboard.view(&DiskLinks);
    success(view, dashboard.snapshot().revision_id)
}

/// POST /api/dashboard/commands - Apply one command and return the new view.
pub async fn apply_command(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(command): Json<Command>,
) -> ApiResult<CommandResponse> {
    let revision_id = state.store.current().revision_id;
    let dashboard = session_dashboard(&state, &caller)
        .await
        .map_err(at_revision(revision_id))?;

    let mut dashboard = dashboard.lock().await;
    catch_up(&state, &mut dashboard);
    let outcome = dispatch(&mut dashboard, state.store.as_ref(), command)
        .await
        .map_err(at_revision(revision_id))?;

    catch_up(&state, &mut dashboard);
    let view = dashboard.view(&DiskLinks);
    success(
        CommandResponse { outcome, view },
        dashboard.snapshot().revision_id,
    )
}

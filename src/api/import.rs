//! Spreadsheet import staging endpoints.
//!
//! Both endpoints replace the session's staged rows; committing them is a
//! dashboard command.

use axum::{body::Bytes, extract::State, Extension, Json};
use chrono::Local;

use super::{at_revision, error, success, ApiResult};
use super::dashboard::{catch_up, session_dashboard};
use crate::auth::Caller;
use crate::dashboard::Command;
use crate::errors::AppError;
use crate::import::{read_first_sheet, translate_rows, SheetRow, StagedRecord};
use crate::AppState;

/// POST /api/import/preview - Stage the first sheet of an uploaded workbook.
pub async fn preview_workbook(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    body: Bytes,
) -> ApiResult<Vec<StagedRecord>> {
    let revision_id = state.store.current().revision_id;

    if body.is_empty() {
        return error(
            AppError::BadRequest("Upload a spreadsheet file".to_string()),
            revision_id,
        );
    }
    let rows = read_first_sheet(&body).map_err(at_revision(revision_id))?;
    tracing::info!("Read {} rows from uploaded workbook", rows.len());

    stage(&state, &caller, &rows).await
}

/// POST /api/import/rows - Stage rows already parsed by the client.
pub async fn preview_rows(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(rows): Json<Vec<SheetRow>>,
) -> ApiResult<Vec<StagedRecord>> {
    stage(&state, &caller, &rows).await
}

async fn stage(state: &AppState, caller: &Caller, rows: &[SheetRow]) -> ApiResult<Vec<StagedRecord>> {
    let revision_id = state.store.current().revision_id;
    let dashboard = session_dashboard(state, caller)
        .await
        .map_err(at_revision(revision_id))?;

    let today = Local::now().format("%Y-%m-%d").to_string();
    let staged = translate_rows(rows, &today);

    let mut dashboard = dashboard.lock().await;
    catch_up(state, &mut dashboard);
    dashboard
        .update(Command::StageImport(staged.clone()))
        .map_err(at_revision(revision_id))?;

    success(staged, revision_id)
}

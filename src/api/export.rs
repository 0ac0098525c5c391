//! Report download endpoint.

use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use serde::Deserialize;

use super::at_revision;
use super::dashboard::{catch_up, session_dashboard};
use crate::auth::Caller;
use crate::dashboard::Command;
use crate::errors::{AppError, AppErrorWithRevision};
use crate::export::{render, ExportFormat, ExportScope};
use crate::models::DiskRecord;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub scope: ExportScope,
}

/// GET /api/export/:format - Download the selected or filtered records.
///
/// A successful export of the selection clears it.
pub async fn export_report(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(format): Path<ExportFormat>,
    Query(query): Query<ExportQuery>,
) -> Result<Response, AppErrorWithRevision> {
    let revision_id = state.store.current().revision_id;
    let fail = at_revision(revision_id);

    let dashboard = session_dashboard(&state, &caller).await.map_err(&fail)?;
    let mut dashboard = dashboard.lock().await;
    catch_up(&state, &mut dashboard);

    let records: Vec<DiskRecord> = match query.scope {
        ExportScope::Selected => dashboard.selected_records(),
        ExportScope::Filtered => dashboard.visible(),
    }
    .into_iter()
    .cloned()
    .collect();

    let title = state.config.report_title.clone();
    let file = tokio::task::spawn_blocking(move || {
        let refs: Vec<&DiskRecord> = records.iter().collect();
        render(format, &refs, &title)
    })
    .await
    .map_err(|e| AppError::Export(format!("Export task failed: {}", e)))
    .and_then(|result| result)
    .map_err(&fail)?;

    if query.scope == ExportScope::Selected {
        dashboard.update(Command::ClearSelection).map_err(&fail)?;
    }
    tracing::info!("Exported {} ({} bytes)", file.file_name, file.bytes.len());

    Ok((
        [
            (header::CONTENT_TYPE, file.format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    )
        .into_response())
}

//! Disk record endpoints and the snapshot stream.

use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::WatchStream;

use super::{at_revision, error, success, ApiResult};
use crate::dashboard::filter::FilterCriteria;
use crate::errors::AppError;
use crate::models::{DiskInput, DiskRecord, RevisionInfo, Snapshot};
use crate::store::DiskWriter;
use crate::AppState;

/// GET /api/disks - The current snapshot, newest purchase first.
pub async fn get_snapshot(State(state): State<AppState>) -> ApiResult<Snapshot> {
    let snapshot = state.store.current();
    success(snapshot.as_ref().clone(), snapshot.revision_id)
}

/// GET /api/revision - Current revision info.
pub async fn get_revision(State(state): State<AppState>) -> ApiResult<RevisionInfo> {
    let revision_info = state
        .store
        .repo()
        .get_revision_info()
        .await
        .map_err(at_revision(0))?;

    success(revision_info.clone(), revision_info.revision_id)
}

/// GET /api/disks/visible - Records passing the given filter criteria.
pub async fn list_visible(
    State(state): State<AppState>,
    Query(mut criteria): Query<FilterCriteria>,
) -> ApiResult<Vec<DiskRecord>> {
    criteria.normalize();
    let snapshot = state.store.current();
    let visible = criteria
        .apply(&snapshot.disks, &state.config.capacity_buckets)
        .into_iter()
        .cloned()
        .collect();
    success(visible, snapshot.revision_id)
}

/// GET /api/disks/:id - Get a single disk.
pub async fn get_disk(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DiskRecord> {
    let revision_id = state.store.current().revision_id;

    match state.store.get(&id).await {
        Ok(Some(disk)) => success(disk, revision_id),
        Ok(None) => error(
            AppError::NotFound(format!("Disk {} not found", id)),
            revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// POST /api/disks - Create a disk.
pub async fn create_disk(
    State(state): State<AppState>,
    Json(input): Json<DiskInput>,
) -> ApiResult<DiskRecord> {
    let revision_id = state.store.current().revision_id;

    match state.store.create(input.clone()).await {
        Ok(id) => success(
            DiskRecord::from_input(id, input),
            state.store.current().revision_id,
        ),
        Err(e) => error(e, revision_id),
    }
}

/// PUT /api/disks/:id - Overwrite every field of a disk.
pub async fn update_disk(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<DiskInput>,
) -> ApiResult<DiskRecord> {
    let revision_id = state.store.current().revision_id;

    match state.store.update(&id, input).await {
        Ok(disk) => success(disk, state.store.current().revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// DELETE /api/disks/:id - Delete a disk.
pub async fn delete_disk(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<()> {
    let revision_id = state.store.current().revision_id;

    match state.store.delete(&id).await {
        Ok(()) => success((), state.store.current().revision_id),
        Err(e) => error(e, revision_id),
    }
}

/// GET /api/disks/stream - SSE feed of full snapshots.
///
/// The current snapshot is sent on connect, then again after every change.
pub async fn stream_disks(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!("New snapshot stream client connected");

    let stream = WatchStream::new(state.store.subscribe()).filter_map(|snapshot| async move {
        match serde_json::to_string(snapshot.as_ref()) {
            Ok(json) => Some(Ok(Event::default().event("snapshot").data(json))),
            Err(e) => {
                tracing::warn!("Failed to serialize snapshot: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

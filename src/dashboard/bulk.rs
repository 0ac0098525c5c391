//! Fan-out of store writes for bulk delete and import commit.
//!
//! Writes are issued concurrently; each failure is collected instead of
//! aborting the batch.

use futures::future::join_all;
use serde::Serialize;

use crate::models::DiskInput;
use crate::store::DiskWriter;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub id: String,
    pub message: String,
}

/// Outcome of deleting every selected id.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteReport {
    pub requested: usize,
    pub deleted: Vec<String>,
    pub failed: Vec<FailedItem>,
}

impl BulkDeleteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FailedRow {
    pub seq: usize,
    pub message: String,
}

/// Outcome of committing the approved import rows.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub requested: usize,
    pub created: Vec<String>,
    pub failed: Vec<FailedRow>,
}

/// Issue one delete per id, all at once.
pub async fn delete_all<W: DiskWriter>(store: &W, ids: &[String]) -> BulkDeleteReport {
    let results = join_all(ids.iter().map(|id| store.delete(id))).await;

    let mut report = BulkDeleteReport {
        requested: ids.len(),
        deleted: Vec::new(),
        failed: Vec::new(),
    };
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(()) => report.deleted.push(id.clone()),
            Err(e) => {
                tracing::warn!("Bulk delete of {} failed: {}", id, e);
                report.failed.push(FailedItem {
                    id: id.clone(),
                    message: e.message().to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Bulk delete: {} requested, {} deleted, {} failed",
        report.requested,
        report.deleted.len(),
        report.failed.len()
    );
    report
}

/// Create one record per approved import row, all at once.
pub async fn create_all<W: DiskWriter>(store: &W, rows: Vec<(usize, DiskInput)>) -> ImportReport {
    let requested = rows.len();
    let (seqs, inputs): (Vec<usize>, Vec<DiskInput>) = rows.into_iter().unzip();
    let results = join_all(inputs.into_iter().map(|input| store.create(input))).await;

    let mut report = ImportReport {
        requested,
        created: Vec::new(),
        failed: Vec::new(),
    };
    for (seq, result) in seqs.into_iter().zip(results) {
        match result {
            Ok(id) => report.created.push(id),
            Err(e) => {
                tracing::warn!("Import of row {} failed: {}", seq, e);
                report.failed.push(FailedRow {
                    seq,
                    message: e.message().to_string(),
                });
            }
        }
    }

    tracing::info!(
        "Import commit: {} requested, {} created",
        report.requested,
        report.created.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::filter::CapacityBuckets;
    use crate::dashboard::{dispatch, Command, CommandOutcome, DashboardState};
    use crate::errors::AppError;
    use crate::import::StagedRecord;
    use crate::models::{DiskForm, DiskRecord, Snapshot};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    /// Records every call; deletes of ids in `failing` return an error.
    #[derive(Default)]
    struct MockWriter {
        failing: HashSet<String>,
        deletes: Mutex<Vec<String>>,
        creates: Mutex<Vec<DiskInput>>,
        updates: Mutex<Vec<(String, DiskInput)>>,
    }

    impl DiskWriter for MockWriter {
        async fn create(&self, input: DiskInput) -> Result<String, AppError> {
            if input.serial == "REJECT" {
                return Err(AppError::Database("constraint failed".to_string()));
            }
            let mut creates = self.creates.lock().unwrap();
            creates.push(input);
            Ok(format!("new-{}", creates.len()))
        }

        async fn update(&self, id: &str, input: DiskInput) -> Result<DiskRecord, AppError> {
            self.updates
                .lock()
                .unwrap()
                .push((id.to_string(), input.clone()));
            Ok(DiskRecord::from_input(id.to_string(), input))
        }

        async fn delete(&self, id: &str) -> Result<(), AppError> {
            self.deletes.lock().unwrap().push(id.to_string());
            if self.failing.contains(id) {
                return Err(AppError::NotFound(format!("Disk {} not found", id)));
            }
            Ok(())
        }
    }

    fn state_with_ids(ids: &[&str]) -> DashboardState {
        let mut state = DashboardState::new(CapacityBuckets::default());
        let disks = ids
            .iter()
            .map(|id| DiskRecord {
                id: id.to_string(),
                status: "Bueno".to_string(),
                ..Default::default()
            })
            .collect();
        state
            .update(Command::SnapshotReceived(Arc::new(Snapshot {
                revision_id: 1,
                generated_at: String::new(),
                disks,
            })))
            .unwrap();
        state
    }

    #[tokio::test]
    async fn test_bulk_delete_issues_one_delete_per_selected_id() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&["a", "b", "c", "d"]);
        state
            .update(Command::SelectAllVisible { selected: true })
            .unwrap();

        let outcome = dispatch(&mut state, &writer, Command::BulkDelete)
            .await
            .unwrap();

        let mut deletes = writer.deletes.lock().unwrap().clone();
        deletes.sort();
        assert_eq!(deletes, vec!["a", "b", "c", "d"]);
        assert!(state.selection().is_empty());
        assert!(!state.selection().action_bar_visible());
        match outcome {
            CommandOutcome::BulkDeleted(report) => {
                assert!(report.is_complete());
                assert_eq!(report.requested, 4);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_failed_ids_selected() {
        let writer = MockWriter {
            failing: HashSet::from(["b".to_string()]),
            ..Default::default()
        };
        let mut state = state_with_ids(&["a", "b", "c"]);
        state
            .update(Command::SelectAllVisible { selected: true })
            .unwrap();

        let outcome = dispatch(&mut state, &writer, Command::BulkDelete)
            .await
            .unwrap();

        let CommandOutcome::BulkDeleted(report) = outcome else {
            panic!("expected a bulk delete report");
        };
        assert_eq!(report.deleted, vec!["a", "c"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, "b");
        assert_eq!(state.selection().ids(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_bulk_delete_with_empty_selection_is_refused() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&["a"]);

        let result = dispatch(&mut state, &writer, Command::BulkDelete).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(writer.deletes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_leaves_cached_snapshot_alone() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&["a"]);

        dispatch(
            &mut state,
            &writer,
            Command::DeleteOne {
                id: "a".to_string(),
            },
        )
        .await
        .unwrap();

        // Only a pushed snapshot changes what the table shows.
        assert_eq!(state.visible().len(), 1);
    }

    #[tokio::test]
    async fn test_submit_form_creates_or_updates() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&[]);

        let outcome = dispatch(
            &mut state,
            &writer,
            Command::SubmitForm(DiskForm {
                internal_code: "INV-1".to_string(),
                capacity: "480".to_string(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(
            outcome,
            CommandOutcome::Saved {
                id: "new-1".to_string()
            }
        );

        dispatch(
            &mut state,
            &writer,
            Command::SubmitForm(DiskForm {
                id: Some("x".to_string()),
                capacity: "".to_string(),
                ..Default::default()
            }),
        )
        .await
        .unwrap();
        let updates = writer.updates.lock().unwrap();
        assert_eq!(updates[0].0, "x");
        assert_eq!(updates[0].1.capacity, 0.0);
    }

    #[tokio::test]
    async fn test_invalid_capacity_never_reaches_store() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&[]);

        let result = dispatch(
            &mut state,
            &writer,
            Command::SubmitForm(DiskForm {
                capacity: "lots".to_string(),
                ..Default::default()
            }),
        )
        .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(writer.creates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_import_commit_creates_only_approved_rows() {
        let writer = MockWriter::default();
        let mut state = state_with_ids(&[]);
        let staged = ["A", "B", "C"]
            .iter()
            .enumerate()
            .map(|(seq, code)| StagedRecord {
                seq,
                selected: true,
                disk: DiskInput {
                    internal_code: code.to_string(),
                    serial: if *code == "C" { "REJECT" } else { "S/N" }.to_string(),
                    ..Default::default()
                },
            })
            .collect();
        state.update(Command::StageImport(staged)).unwrap();
        state.update(Command::ToggleImportRow { seq: 1 }).unwrap();

        let outcome = dispatch(&mut state, &writer, Command::ImportCommit)
            .await
            .unwrap();

        let CommandOutcome::Imported(report) = outcome else {
            panic!("expected an import report");
        };
        assert_eq!(report.requested, 2);
        assert_eq!(report.created.len(), 1);
        assert_eq!(report.failed[0].seq, 2);
        let creates = writer.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0].internal_code, "A");
        assert!(state.import_stage().is_empty());
    }
}

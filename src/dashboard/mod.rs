//! Per-session dashboard state and command dispatch.
//!
//! A `DashboardState` owns the latest snapshot, the filter criteria, the
//! selection, the chart settings and the staged import. Every user action is
//! a `Command`; pure commands are applied by [`DashboardState::update`],
//! commands that write to the store go through [`dispatch`].

pub mod bulk;
pub mod chart;
pub mod filter;
pub mod selection;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::import::{ImportStage, StagedRecord};
use crate::models::{DiskForm, DiskRecord, Snapshot, StatusClass};
use crate::store::DiskWriter;

use bulk::{BulkDeleteReport, ImportReport};
use chart::{format_capacity, ChartSeries, ChartSettings};
use filter::{CapacityBuckets, FilterCriteria};
use selection::SelectionTracker;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// A user action against the dashboard.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Command {
    /// The record store pushed a new snapshot
    #[serde(skip)]
    SnapshotReceived(Arc<Snapshot>),
    SetSearch {
        value: String,
    },
    SetStatus {
        value: String,
    },
    SetType {
        value: String,
    },
    SetBrand {
        value: String,
    },
    SetCapacity {
        value: String,
    },
    ClearFilters,
    ToggleSelect {
        id: String,
    },
    SelectAllVisible {
        selected: bool,
    },
    ClearSelection,
    SetChart(ChartSettings),
    SetTheme {
        theme: Theme,
    },
    /// Rows translated from an uploaded spreadsheet
    #[serde(skip)]
    StageImport(Vec<StagedRecord>),
    ToggleImportRow {
        seq: usize,
    },
    SelectAllImport {
        selected: bool,
    },
    DiscardImport,
    SubmitForm(DiskForm),
    DeleteOne {
        id: String,
    },
    BulkDelete,
    ImportCommit,
}

/// What a dispatched command did beyond changing the view.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CommandOutcome {
    Updated,
    Saved { id: String },
    Deleted { id: String },
    BulkDeleted(BulkDeleteReport),
    Imported(ImportReport),
}

/// Row-level actions offered by the table, injected by the caller.
pub trait RowActions {
    /// Where the detail view for `disk` lives.
    fn detail_target(&self, disk: &DiskRecord) -> String;
    /// Where the edit form for `disk` lives.
    fn edit_target(&self, disk: &DiskRecord) -> String;
}

/// One rendered table row.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    #[serde(flatten)]
    pub disk: DiskRecord,
    pub selected: bool,
    pub status_class: StatusClass,
    pub capacity_label: String,
    pub detail_target: String,
    pub edit_target: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionView {
    pub ids: Vec<String>,
    pub count: usize,
    pub all_visible_selected: bool,
    pub action_bar_visible: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportView {
    pub rows: Vec<StagedRecord>,
    pub selected_count: usize,
}

/// Everything the presentation layer needs to draw the dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub revision_id: i64,
    pub criteria: FilterCriteria,
    pub filters_active: bool,
    pub visible_count: usize,
    pub total_count: usize,
    pub visible_capacity: String,
    pub rows: Vec<TableRow>,
    pub selection: SelectionView,
    pub chart: ChartSeries,
    pub theme: Theme,
    pub import: ImportView,
}

/// Dashboard state for one signed-in session.
#[derive(Debug, Clone)]
pub struct DashboardState {
    snapshot: Arc<Snapshot>,
    buckets: CapacityBuckets,
    criteria: FilterCriteria,
    selection: SelectionTracker,
    chart_settings: ChartSettings,
    theme: Theme,
    import: ImportStage,
    /// Indexes into `snapshot.disks` that pass the filter
    visible: Vec<usize>,
    chart: ChartSeries,
}

impl DashboardState {
    pub fn new(buckets: CapacityBuckets) -> Self {
        let chart_settings = ChartSettings::default();
        Self {
            snapshot: Arc::new(Snapshot::default()),
            buckets,
            criteria: FilterCriteria::default(),
            selection: SelectionTracker::new(),
            chart_settings,
            theme: Theme::default(),
            import: ImportStage::default(),
            visible: Vec::new(),
            chart: chart_settings.aggregate(&[]),
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    pub fn snapshot(&self) -> &Arc<Snapshot> {
        &self.snapshot
    }

    pub fn chart(&self) -> &ChartSeries {
        &self.chart
    }

    pub fn import_stage(&self) -> &ImportStage {
        &self.import
    }

    /// The visible subset in snapshot order.
    pub fn visible(&self) -> Vec<&DiskRecord> {
        self.visible
            .iter()
            .map(|&i| &self.snapshot.disks[i])
            .collect()
    }

    /// Selected records still present in the snapshot.
    pub fn selected_records(&self) -> Vec<&DiskRecord> {
        self.selection.pick(&self.snapshot.disks)
    }

    /// Apply a command that does not touch the store.
    ///
    /// Store-writing commands are rejected here; use [`dispatch`].
    pub fn update(&mut self, command: Command) -> Result<(), AppError> {
        match command {
            Command::SnapshotReceived(snapshot) => {
                if snapshot.revision_id < self.snapshot.revision_id {
                    return Ok(());
                }
                self.snapshot = snapshot;
                self.recompute();
            }
            Command::SetSearch { value } => self.set_criteria(|c| c.search = value),
            Command::SetStatus { value } => self.set_criteria(|c| c.status = value),
            Command::SetType { value } => self.set_criteria(|c| c.disk_type = value),
            Command::SetBrand { value } => self.set_criteria(|c| c.brand = value),
            Command::SetCapacity { value } => self.set_criteria(|c| c.capacity = value),
            Command::ClearFilters => self.set_criteria(|c| *c = FilterCriteria::default()),
            Command::ToggleSelect { id } => self.selection.toggle(&id),
            Command::SelectAllVisible { selected } => {
                let visible: Vec<&DiskRecord> = self
                    .visible
                    .iter()
                    .map(|&i| &self.snapshot.disks[i])
                    .collect();
                self.selection.set_visible(&visible, selected);
            }
            Command::ClearSelection => self.selection.clear(),
            Command::SetChart(settings) => {
                self.chart_settings = settings;
                let series = self.chart_settings.aggregate(&self.visible());
                self.chart = series;
            }
            Command::SetTheme { theme } => self.theme = theme,
            Command::StageImport(rows) => self.import = ImportStage::new(rows),
            Command::ToggleImportRow { seq } => self.import.toggle(seq),
            Command::SelectAllImport { selected } => self.import.set_all(selected),
            Command::DiscardImport => self.import.clear(),
            Command::SubmitForm(_)
            | Command::DeleteOne { .. }
            | Command::BulkDelete
            | Command::ImportCommit => {
                return Err(AppError::Internal(
                    "Store-writing command applied without a store".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn set_criteria(&mut self, change: impl FnOnce(&mut FilterCriteria)) {
        change(&mut self.criteria);
        self.criteria.normalize();
        self.recompute();
    }

    /// Rebuild the visible subset and the chart series.
    fn recompute(&mut self) {
        self.visible = self
            .snapshot
            .disks
            .iter()
            .enumerate()
            .filter(|(_, d)| self.criteria.matches(d, &self.buckets))
            .map(|(i, _)| i)
            .collect();
        let series = self.chart_settings.aggregate(&self.visible());
        self.chart = series;
    }

    /// Build the presentation view, using `actions` for per-row targets.
    pub fn view(&self, actions: &dyn RowActions) -> DashboardView {
        let visible = self.visible();
        let rows = visible
            .iter()
            .map(|disk| TableRow {
                disk: (*disk).clone(),
                selected: self.selection.contains(&disk.id),
                status_class: disk.status_class(),
                capacity_label: format!("{} GB", disk.capacity),
                detail_target: actions.detail_target(disk),
                edit_target: actions.edit_target(disk),
            })
            .collect();
        let visible_capacity: f64 = visible.iter().map(|d| d.capacity).sum();

        DashboardView {
            revision_id: self.snapshot.revision_id,
            criteria: self.criteria.clone(),
            filters_active: !self.criteria.is_cleared(),
            visible_count: visible.len(),
            total_count: self.snapshot.disks.len(),
            visible_capacity: format_capacity(visible_capacity),
            rows,
            selection: SelectionView {
                ids: self.selection.ids(),
                count: self.selection.len(),
                all_visible_selected: self.selection.all_visible_selected(&visible),
                action_bar_visible: self.selection.action_bar_visible(),
            },
            chart: self.chart.clone(),
            theme: self.theme,
            import: ImportView {
                rows: self.import.rows.clone(),
                selected_count: self.import.selected_count(),
            },
        }
    }
}

/// Apply any command, performing store writes for the ones that need them.
///
/// The store's snapshot feed is the only path by which writes show up in
/// the view; results returned here are reported to the caller but never
/// patched into the cached snapshot.
pub async fn dispatch<W: DiskWriter>(
    state: &mut DashboardState,
    store: &W,
    command: Command,
) -> Result<CommandOutcome, AppError> {
    match command {
        Command::SubmitForm(form) => {
            let (id, input) = form.into_input()?;
            let id = match id {
                Some(id) => store.update(&id, input).await?.id,
                None => store.create(input).await?,
            };
            Ok(CommandOutcome::Saved { id })
        }
        Command::DeleteOne { id } => {
            store.delete(&id).await?;
            state.selection.remove(&id);
            Ok(CommandOutcome::Deleted { id })
        }
        Command::BulkDelete => {
            let ids = state.selection.ids();
            if ids.is_empty() {
                return Err(AppError::Validation("No disks selected".to_string()));
            }
            let report = bulk::delete_all(store, &ids).await;
            for id in &report.deleted {
                state.selection.remove(id);
            }
            Ok(CommandOutcome::BulkDeleted(report))
        }
        Command::ImportCommit => {
            let approved = state.import.approved();
            if approved.is_empty() {
                return Err(AppError::Validation(
                    "Select at least one row to import".to_string(),
                ));
            }
            let report = bulk::create_all(store, approved).await;
            state.import.clear();
            Ok(CommandOutcome::Imported(report))
        }
        other => {
            state.update(other)?;
            Ok(CommandOutcome::Updated)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Links;

    impl RowActions for Links {
        fn detail_target(&self, disk: &DiskRecord) -> String {
            format!("detail:{}", disk.id)
        }

        fn edit_target(&self, disk: &DiskRecord) -> String {
            format!("edit:{}", disk.id)
        }
    }

    fn disk(id: &str, status: &str, capacity: f64) -> DiskRecord {
        DiskRecord {
            id: id.to_string(),
            status: status.to_string(),
            capacity,
            ..Default::default()
        }
    }

    fn state_with(disks: Vec<DiskRecord>) -> DashboardState {
        let mut state = DashboardState::new(CapacityBuckets::default());
        state
            .update(Command::SnapshotReceived(Arc::new(Snapshot {
                revision_id: 1,
                generated_at: String::new(),
                disks,
            })))
            .unwrap();
        state
    }

    fn visible_ids(state: &DashboardState) -> Vec<String> {
        state.visible().iter().map(|d| d.id.clone()).collect()
    }

    #[test]
    fn test_status_filter_and_clear() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0), disk("2", "Malo", 500.0)]);
        assert_eq!(visible_ids(&state), vec!["1", "2"]);

        state
            .update(Command::SetStatus {
                value: "Bueno".to_string(),
            })
            .unwrap();
        assert_eq!(visible_ids(&state), vec!["1"]);

        state.update(Command::ClearFilters).unwrap();
        assert_eq!(visible_ids(&state), vec!["1", "2"]);
    }

    #[test]
    fn test_selection_survives_filter_and_select_all_is_scoped() {
        let mut state = state_with(vec![
            disk("1", "Bueno", 250.0),
            disk("2", "Malo", 500.0),
            disk("3", "Bueno", 1000.0),
        ]);
        state
            .update(Command::ToggleSelect {
                id: "2".to_string(),
            })
            .unwrap();

        state
            .update(Command::SetStatus {
                value: "Bueno".to_string(),
            })
            .unwrap();
        assert!(state.selection().contains("2"));

        state
            .update(Command::SelectAllVisible { selected: true })
            .unwrap();
        assert_eq!(state.selection().ids(), vec!["1", "2", "3"]);

        state
            .update(Command::SelectAllVisible { selected: false })
            .unwrap();
        assert_eq!(state.selection().ids(), vec!["2"]);
    }

    #[test]
    fn test_snapshot_replaces_cache_and_keeps_selection() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0)]);
        state
            .update(Command::ToggleSelect {
                id: "1".to_string(),
            })
            .unwrap();

        state
            .update(Command::SnapshotReceived(Arc::new(Snapshot {
                revision_id: 2,
                generated_at: String::new(),
                disks: vec![disk("9", "Malo", 480.0)],
            })))
            .unwrap();

        assert_eq!(visible_ids(&state), vec!["9"]);
        assert!(state.selection().contains("1"));
        assert!(state.selected_records().is_empty());
        assert_eq!(state.chart().points[0].label, "Malo");
    }

    #[test]
    fn test_stale_snapshot_is_ignored() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0)]);
        state
            .update(Command::SnapshotReceived(Arc::new(Snapshot {
                revision_id: 0,
                generated_at: String::new(),
                disks: Vec::new(),
            })))
            .unwrap();
        assert_eq!(visible_ids(&state), vec!["1"]);
    }

    #[test]
    fn test_chart_follows_filter() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0), disk("2", "Malo", 500.0)]);
        assert_eq!(state.chart().points.len(), 2);

        state
            .update(Command::SetCapacity {
                value: "480".to_string(),
            })
            .unwrap();
        assert_eq!(state.chart().points.len(), 1);
        assert_eq!(state.chart().points[0].label, "Malo");
    }

    #[test]
    fn test_blank_selector_means_all() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0)]);
        state
            .update(Command::SetBrand {
                value: "  ".to_string(),
            })
            .unwrap();
        assert_eq!(state.criteria().brand, filter::ALL);
        assert_eq!(visible_ids(&state), vec!["1"]);
    }

    #[test]
    fn test_view_uses_injected_row_actions() {
        let mut state = state_with(vec![disk("1", "Bueno", 250.0), disk("2", "Raro", 1500.0)]);
        state
            .update(Command::ToggleSelect {
                id: "2".to_string(),
            })
            .unwrap();
        let view = state.view(&Links);

        assert_eq!(view.visible_count, 2);
        assert_eq!(view.total_count, 2);
        assert_eq!(view.visible_capacity, "1.75 TB");
        assert_eq!(view.rows[0].detail_target, "detail:1");
        assert_eq!(view.rows[1].edit_target, "edit:2");
        assert_eq!(view.rows[1].status_class, StatusClass::Review);
        assert!(view.rows[1].selected);
        assert!(!view.selection.all_visible_selected);
        assert!(view.selection.action_bar_visible);
    }

    #[test]
    fn test_store_commands_rejected_by_pure_update() {
        let mut state = state_with(Vec::new());
        assert!(matches!(
            state.update(Command::BulkDelete),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_command_wire_format() {
        let command: Command =
            serde_json::from_str(r#"{"command":"setSearch","value":"wd"}"#).unwrap();
        assert!(matches!(command, Command::SetSearch { value } if value == "wd"));

        let command: Command = serde_json::from_str(
            r#"{"command":"setChart","groupBy":"brand","metric":"capacity","kind":"bar"}"#,
        )
        .unwrap();
        assert!(matches!(command, Command::SetChart(s) if s.group_by == chart::GroupBy::Brand));

        let command: Command = serde_json::from_str(
            r#"{"command":"submitForm","internalCode":"X","type":"SSD","capacity":"240"}"#,
        )
        .unwrap();
        assert!(matches!(command, Command::SubmitForm(f) if f.disk_type == "SSD"));

        assert!(serde_json::from_str::<Command>(r#"{"command":"snapshotReceived"}"#).is_err());
    }
}

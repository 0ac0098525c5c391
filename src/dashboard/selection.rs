//! Row selection for bulk actions.
//!
//! Selection is keyed by record id and is independent of the filter: a row
//! that is filtered out stays selected until it is explicitly cleared.

use std::collections::BTreeSet;

use crate::models::DiskRecord;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionTracker {
    ids: BTreeSet<String>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the selection state of one id.
    pub fn toggle(&mut self, id: &str) {
        if !self.ids.remove(id) {
            self.ids.insert(id.to_string());
        }
    }

    /// Select or deselect every visible row, leaving hidden rows untouched.
    pub fn set_visible(&mut self, visible: &[&DiskRecord], selected: bool) {
        for disk in visible {
            if selected {
                self.ids.insert(disk.id.clone());
            } else {
                self.ids.remove(&disk.id);
            }
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    /// State of the master checkbox: on only when there are visible rows
    /// and all of them are selected.
    pub fn all_visible_selected(&self, visible: &[&DiskRecord]) -> bool {
        !visible.is_empty() && visible.iter().all(|d| self.ids.contains(&d.id))
    }

    /// The bulk action bar is shown whenever anything is selected.
    pub fn action_bar_visible(&self) -> bool {
        !self.ids.is_empty()
    }

    /// Selected records that are still present in `disks`, in `disks` order.
    pub fn pick<'a>(&self, disks: &'a [DiskRecord]) -> Vec<&'a DiskRecord> {
        disks.iter().filter(|d| self.ids.contains(&d.id)).collect()
    }
}

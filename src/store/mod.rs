//! Record store: the repository plus a live snapshot feed.
//!
//! Every successful mutation republishes the full snapshot. Subscribers
//! always see the newest snapshot; nothing is merged or diffed.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{DiskInput, DiskRecord, Snapshot};

/// Write operations the dashboard coordinator issues against the store.
pub trait DiskWriter: Send + Sync {
    fn create(&self, input: DiskInput) -> impl Future<Output = Result<String, AppError>> + Send;

    fn update(
        &self,
        id: &str,
        input: DiskInput,
    ) -> impl Future<Output = Result<DiskRecord, AppError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Disk record store backed by SQLite.
pub struct RecordStore {
    repo: Repository,
    feed: watch::Sender<Arc<Snapshot>>,
}

impl RecordStore {
    /// Load the initial snapshot and start the feed.
    pub async fn open(repo: Repository) -> Result<Self, AppError> {
        let initial = repo.snapshot().await?;
        let (feed, _) = watch::channel(Arc::new(initial));
        Ok(Self { repo, feed })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Subscribe to snapshot pushes. The current snapshot is marked as unseen.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        let mut rx = self.feed.subscribe();
        rx.mark_changed();
        rx
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.feed.borrow().clone()
    }

    pub async fn get(&self, id: &str) -> Result<Option<DiskRecord>, AppError> {
        self.repo.get_disk(id).await
    }

    async fn publish(&self) -> Result<(), AppError> {
        let snapshot = self.repo.snapshot().await?;
        tracing::debug!(
            "Publishing snapshot revision {} with {} disks",
            snapshot.revision_id,
            snapshot.disks.len()
        );
        // Concurrent writers may finish out of order; never step backwards.
        self.feed.send_if_modified(|current| {
            if snapshot.revision_id > current.revision_id {
                *current = Arc::new(snapshot);
                true
            } else {
                false
            }
        });
        Ok(())
    }
}

impl DiskWriter for RecordStore {
    async fn create(&self, input: DiskInput) -> Result<String, AppError> {
        let id = self.repo.create_disk(&input).await?;
        tracing::debug!("Created disk {}", id);
        self.publish().await?;
        Ok(id)
    }

    async fn update(&self, id: &str, input: DiskInput) -> Result<DiskRecord, AppError> {
        let disk = self.repo.update_disk(id, &input).await?;
        tracing::debug!("Updated disk {}", id);
        self.publish().await?;
        Ok(disk)
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        self.repo.delete_disk(id).await?;
        tracing::debug!("Deleted disk {}", id);
        self.publish().await
    }
}

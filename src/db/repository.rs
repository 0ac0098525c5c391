//! Database repository for disk CRUD operations.
//!
//! Uses prepared statements and bumps the revision on every write.

use chrono::Utc;
use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::{DiskInput, DiskRecord, RevisionInfo, Snapshot};

const DISK_COLUMNS: &str = "id, internal_code, host_id, disk_type, capacity, brand, serial, status, purchase_date, install_date, observations";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the current revision ID.
    pub async fn get_revision_id(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT revision_id FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("revision_id"))
    }

    /// Get revision info.
    pub async fn get_revision_info(&self) -> Result<RevisionInfo, AppError> {
        let row = sqlx::query("SELECT revision_id, generated_at FROM meta WHERE id = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(RevisionInfo {
            revision_id: row.get("revision_id"),
            generated_at: row.get("generated_at"),
        })
    }

    /// Increment the revision ID and return the new value.
    async fn increment_revision(&self) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();
        sqlx::query("UPDATE meta SET revision_id = revision_id + 1, generated_at = ? WHERE id = 1")
            .bind(&now)
            .execute(&self.pool)
            .await?;
        self.get_revision_id().await
    }

    /// Load the full snapshot at the current revision.
    pub async fn snapshot(&self) -> Result<Snapshot, AppError> {
        let info = self.get_revision_info().await?;
        let disks = self.list_disks().await?;

        Ok(Snapshot {
            revision_id: info.revision_id,
            generated_at: info.generated_at,
            disks,
        })
    }

    /// List all disks, newest purchase first.
    pub async fn list_disks(&self) -> Result<Vec<DiskRecord>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM disks ORDER BY purchase_date DESC, rowid ASC",
            DISK_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(disk_from_row).collect())
    }

    /// Get a disk by ID.
    pub async fn get_disk(&self, id: &str) -> Result<Option<DiskRecord>, AppError> {
        let row = sqlx::query(&format!("SELECT {} FROM disks WHERE id = ?", DISK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(disk_from_row))
    }

    /// Create a new disk and return its store-assigned identifier.
    pub async fn create_disk(&self, input: &DiskInput) -> Result<String, AppError> {
        let id = uuid::Uuid::new_v4().to_string();

        sqlx::query(&format!(
            "INSERT INTO disks ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            DISK_COLUMNS
        ))
        .bind(&id)
        .bind(&input.internal_code)
        .bind(&input.host_id)
        .bind(&input.disk_type)
        .bind(input.capacity)
        .bind(&input.brand)
        .bind(&input.serial)
        .bind(&input.status)
        .bind(&input.purchase_date)
        .bind(&input.install_date)
        .bind(&input.observations)
        .execute(&self.pool)
        .await?;

        self.increment_revision().await?;
        Ok(id)
    }

    /// Overwrite every field of an existing disk.
    pub async fn update_disk(&self, id: &str, input: &DiskInput) -> Result<DiskRecord, AppError> {
        let result = sqlx::query(
            "UPDATE disks SET internal_code = ?, host_id = ?, disk_type = ?, capacity = ?, brand = ?, serial = ?, status = ?, purchase_date = ?, install_date = ?, observations = ? WHERE id = ?"
        )
        .bind(&input.internal_code)
        .bind(&input.host_id)
        .bind(&input.disk_type)
        .bind(input.capacity)
        .bind(&input.brand)
        .bind(&input.serial)
        .bind(&input.status)
        .bind(&input.purchase_date)
        .bind(&input.install_date)
        .bind(&input.observations)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Disk {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(DiskRecord::from_input(id.to_string(), input.clone()))
    }

    /// Delete a disk. There is no soft delete.
    pub async fn delete_disk(&self, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM disks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Disk {} not found", id)));
        }

        self.increment_revision().await?;
        Ok(())
    }
}

fn disk_from_row(row: &sqlx::sqlite::SqliteRow) -> DiskRecord {
    DiskRecord {
        id: row.get("id"),
        internal_code: row.get("internal_code"),
        host_id: row.get("host_id"),
        disk_type: row.get("disk_type"),
        capacity: row.get("capacity"),
        brand: row.get("brand"),
        serial: row.get("serial"),
        status: row.get("status"),
        purchase_date: row.get("purchase_date"),
        install_date: row.get("install_date"),
        observations: row.get("observations"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_database;
    use tempfile::TempDir;

    async fn repo() -> (Repository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_database(&temp_dir.path().join("repo.sqlite"))
            .await
            .unwrap();
        (Repository::new(pool), temp_dir)
    }

    fn input(code: &str, purchase_date: &str) -> DiskInput {
        DiskInput {
            internal_code: code.to_string(),
            purchase_date: purchase_date.to_string(),
            capacity: 480.0,
            status: "Bueno".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_list_orders_by_purchase_date_desc() {
        let (repo, _dir) = repo().await;
        repo.create_disk(&input("OLD", "2021-03-01")).await.unwrap();
        repo.create_disk(&input("NEW", "2024-06-15")).await.unwrap();
        repo.create_disk(&input("MID", "2023-01-10")).await.unwrap();

        let codes: Vec<String> = repo
            .list_disks()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.internal_code)
            .collect();
        assert_eq!(codes, vec!["NEW", "MID", "OLD"]);
    }

    #[tokio::test]
    async fn test_update_is_full_overwrite() {
        let (repo, _dir) = repo().await;
        let mut first = input("D-1", "2024-01-01");
        first.observations = "spare".to_string();
        let id = repo.create_disk(&first).await.unwrap();

        let replacement = input("D-1b", "2024-01-01");
        repo.update_disk(&id, &replacement).await.unwrap();

        let stored = repo.get_disk(&id).await.unwrap().unwrap();
        assert_eq!(stored.internal_code, "D-1b");
        assert_eq!(stored.observations, "");
    }

    #[tokio::test]
    async fn test_revision_bumps_and_missing_rows() {
        let (repo, _dir) = repo().await;
        let start = repo.get_revision_id().await.unwrap();

        let id = repo.create_disk(&input("D-2", "2024-01-01")).await.unwrap();
        repo.delete_disk(&id).await.unwrap();
        assert_eq!(repo.get_revision_id().await.unwrap(), start + 2);

        assert!(matches!(
            repo.delete_disk(&id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            repo.update_disk(&id, &input("x", "")).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(repo.get_revision_id().await.unwrap(), start + 2);
    }
}

//! Report exports: spreadsheet and PDF renderings of a record set.
//!
//! Both renderers are synchronous and work on records already held in
//! memory; nothing here touches the store.

mod pdf;
mod xlsx;

pub use pdf::{paginate, render_pdf};
pub use xlsx::render_xlsx;

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::DiskRecord;

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn file_name(&self, timestamp_millis: i64) -> String {
        match self {
            ExportFormat::Xlsx => "Disk_Report.xlsx".to_string(),
            ExportFormat::Pdf => format!("Disk_Inventory_{}.pdf", timestamp_millis),
        }
    }
}

/// Which records a bulk export covers.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    /// The rows marked for bulk action
    #[default]
    Selected,
    /// The rows currently visible after filtering
    Filtered,
}

/// A rendered export ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Render `disks` in the requested format. An empty set is refused.
pub fn render(
    format: ExportFormat,
    disks: &[&DiskRecord],
    report_title: &str,
) -> Result<ExportFile, AppError> {
    if disks.is_empty() {
        return Err(AppError::Validation("No data selected to export".to_string()));
    }

    let now = chrono::Local::now();
    let bytes = match format {
        ExportFormat::Xlsx => render_xlsx(disks)?,
        ExportFormat::Pdf => {
            render_pdf(disks, report_title, &now.format("%Y-%m-%d %H:%M").to_string())?
        }
    };

    Ok(ExportFile {
        format,
        file_name: format.file_name(now.timestamp_millis()),
        bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_export_is_refused() {
        let result = render(ExportFormat::Xlsx, &[], "Report");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_file_names() {
        assert_eq!(ExportFormat::Xlsx.file_name(5), "Disk_Report.xlsx");
        assert_eq!(ExportFormat::Pdf.file_name(5), "Disk_Inventory_5.pdf");
    }

    #[test]
    fn test_render_both_formats() {
        let disk = DiskRecord {
            id: "1".to_string(),
            internal_code: "INV-1".to_string(),
            capacity: 480.0,
            status: "Bueno".to_string(),
            ..Default::default()
        };
        let xlsx = render(ExportFormat::Xlsx, &[&disk], "Report").unwrap();
        assert!(xlsx.bytes.starts_with(b"PK"));

        let pdf = render(ExportFormat::Pdf, &[&disk], "Report").unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert!(pdf.file_name.ends_with(".pdf"));
    }
}

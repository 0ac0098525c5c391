//! Spreadsheet export.

use rust_xlsxwriter::{Format, Workbook};

use crate::errors::AppError;
use crate::models::DiskRecord;

const SHEET_NAME: &str = "Inventario Discos";

// Same header names the importer recognizes, so an exported report can be
// uploaded again.
const HEADERS: [&str; 8] = [
    "Código",
    "Equipo",
    "Tipo",
    "Marca",
    "Capacidad (GB)",
    "Serie",
    "Estado",
    "Observaciones",
];

/// Write one row per disk under a fixed header row.
pub fn render_xlsx(disks: &[&DiskRecord]) -> Result<Vec<u8>, AppError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;

    for (col, header) in HEADERS.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &bold)?;
    }

    for (i, disk) in disks.iter().enumerate() {
        let row = (i + 1) as u32;
        sheet.write_string(row, 0, &disk.internal_code)?;
        sheet.write_string(row, 1, &disk.host_id)?;
        sheet.write_string(row, 2, &disk.disk_type)?;
        sheet.write_string(row, 3, &disk.brand)?;
        sheet.write_number(row, 4, disk.capacity)?;
        sheet.write_string(row, 5, &disk.serial)?;
        sheet.write_string(row, 6, &disk.status)?;
        sheet.write_string(row, 7, &disk.observations)?;
    }

    Ok(workbook.save_to_buffer()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::{read_first_sheet, translate_rows};

    #[test]
    fn test_exported_sheet_imports_again() {
        let disk = DiskRecord {
            id: "store-id".to_string(),
            internal_code: "INV-9".to_string(),
            host_id: "SRV-2".to_string(),
            disk_type: "SSD".to_string(),
            capacity: 960.0,
            brand: "Kingston".to_string(),
            serial: "50026B77".to_string(),
            status: "Malo".to_string(),
            observations: "Replaced".to_string(),
            ..Default::default()
        };

        let bytes = render_xlsx(&[&disk]).unwrap();
        let rows = read_first_sheet(&bytes).unwrap();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].values().all(|v| v != "store-id"));

        let staged = translate_rows(&rows, "2026-01-01");
        assert_eq!(staged.len(), 1);
        let imported = &staged[0].disk;
        assert_eq!(imported.internal_code, "INV-9");
        assert_eq!(imported.host_id, "SRV-2");
        assert_eq!(imported.disk_type, "SSD");
        assert_eq!(imported.brand, "Kingston");
        assert_eq!(imported.capacity, 960.0);
        assert_eq!(imported.serial, "50026B77");
        assert_eq!(imported.status, "Malo");
        assert_eq!(imported.observations, "Replaced");
        assert_eq!(imported.purchase_date, "2026-01-01");
    }
}

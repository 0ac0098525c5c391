//! Reading uploaded workbooks into header-keyed rows.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;

use super::SheetRow;
use crate::errors::AppError;

/// Read the first worksheet of an xlsx/xls/ods file.
///
/// The first row supplies the headers; blank rows are skipped and blank
/// cells are left out of the row map.
pub fn read_first_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::Import("Spreadsheet has no worksheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell.to_string().trim().to_string())
        .collect();

    let mut result = Vec::new();
    for cells in rows {
        let row: SheetRow = headers
            .iter()
            .zip(cells.iter())
            .filter(|(header, _)| !header.is_empty())
            .filter_map(|(header, cell)| cell_value(cell).map(|v| (header.clone(), v)))
            .collect();
        if !row.is_empty() {
            result.push(row);
        }
    }

    tracing::debug!("Read {} rows from uploaded spreadsheet", result.len());
    Ok(result)
}

fn cell_value(cell: &Data) -> Option<Value> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::String(s) => Some(Value::String(s.clone())),
        Data::Int(i) => Some(Value::from(*i)),
        Data::Float(f) => serde_json::Number::from_f64(*f).map(Value::Number),
        Data::Bool(b) => Some(Value::Bool(*b)),
        other => Some(Value::String(other.to_string())),
    }
}

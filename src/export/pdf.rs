//! PDF report export (A4 landscape, built-in Helvetica).

use std::ops::Range;

use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfLayerReference};

use crate::errors::AppError;
use crate::models::DiskRecord;

const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN_X: f32 = 14.0;
const ROW_HEIGHT: f32 = 6.0;
const TABLE_BOTTOM: f32 = 20.0;
const FIRST_TABLE_TOP: f32 = 165.0;
const NEXT_TABLE_TOP: f32 = 190.0;
const FOOTER_Y: f32 = 10.0;

/// Column heading, x offset in mm, and character budget.
const COLUMNS: [(&str, f32, usize); 7] = [
    ("CODE", MARGIN_X, 18),
    ("HOST", 50.0, 22),
    ("TYPE", 95.0, 12),
    ("BRAND", 120.0, 24),
    ("CAPACITY", 170.0, 14),
    ("SERIAL", 200.0, 24),
    ("STATUS", 250.0, 16),
];

fn rows_between(top: f32) -> usize {
    // The header line sits at `top`, data rows start one row below it.
    ((top - ROW_HEIGHT - TABLE_BOTTOM) / ROW_HEIGHT).floor() as usize + 1
}

/// Split `total` rows into page ranges; the first page has less room.
pub fn paginate(total: usize, first: usize, rest: usize) -> Vec<Range<usize>> {
    let mut pages = Vec::new();
    let mut start = 0;
    let mut room = first;
    while start < total || pages.is_empty() {
        let end = (start + room).min(total);
        pages.push(start..end);
        start = end;
        room = rest;
    }
    pages
}

/// Render the report and return the PDF bytes.
pub fn render_pdf(
    disks: &[&DiskRecord],
    title: &str,
    generated_at: &str,
) -> Result<Vec<u8>, AppError> {
    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica)?;
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold)?;

    let pages = paginate(
        disks.len(),
        rows_between(FIRST_TABLE_TOP),
        rows_between(NEXT_TABLE_TOP),
    );
    let page_count = pages.len();

    for (index, range) in pages.into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Report");
            doc.get_page(page).get_layer(layer)
        };

        let table_top = if index == 0 {
            layer.use_text(title, 18.0, Mm(MARGIN_X), Mm(192.0), &bold);
            layer.use_text(
                format!("Generated: {}", generated_at),
                10.0,
                Mm(MARGIN_X),
                Mm(184.0),
                &regular,
            );
            layer.use_text(
                format!("Total records: {}", disks.len()),
                10.0,
                Mm(MARGIN_X),
                Mm(178.0),
                &regular,
            );
            FIRST_TABLE_TOP
        } else {
            NEXT_TABLE_TOP
        };

        write_table(&layer, &disks[range], table_top, &regular, &bold);

        layer.use_text(
            format!("IT Department - Page {} of {}", index + 1, page_count),
            8.0,
            Mm(PAGE_WIDTH / 2.0 - 25.0),
            Mm(FOOTER_Y),
            &regular,
        );
    }

    Ok(doc.save_to_bytes()?)
}

fn write_table(
    layer: &PdfLayerReference,
    disks: &[&DiskRecord],
    top: f32,
    regular: &IndirectFontRef,
    bold: &IndirectFontRef,
) {
    for (heading, x, _) in COLUMNS {
        layer.use_text(heading, 9.0, Mm(x), Mm(top), bold);
    }

    for (i, disk) in disks.iter().enumerate() {
        let y = top - ROW_HEIGHT * (i as f32 + 1.0);
        for (cell, (_, x, width)) in row_cells(disk).into_iter().zip(COLUMNS) {
            layer.use_text(clip(&cell, width), 9.0, Mm(x), Mm(y), regular);
        }
    }
}

fn row_cells(disk: &DiskRecord) -> [String; 7] {
    [
        disk.internal_code.clone(),
        disk.host_id.clone(),
        disk.disk_type.clone(),
        disk.brand.clone(),
        format!("{} GB", disk.capacity),
        disk.serial.clone(),
        disk.status.to_uppercase(),
    ]
}

fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut clipped: String = text.chars().take(width.saturating_sub(1)).collect();
        clipped.push('~');
        clipped
    }
}

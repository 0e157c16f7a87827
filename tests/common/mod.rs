#![allow(dead_code)]

use rust_xlsxwriter::{Workbook, Worksheet, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};

/// A box column as it appears on a weights sheet.
pub struct BoxFixture {
    pub name: &'static str,
    pub container: &'static str,
    pub site_code: f64,
    pub traceability: &'static str,
    pub site_name: &'static str,
    pub weights: Vec<f64>,
}

/// Header block plus box columns of a single-sheet workbook.
pub struct SheetFixture {
    pub vessel: &'static str,
    pub port: &'static str,
    pub file_number: f64,
    pub week: f64,
    pub year_label: &'static str,
    pub boxes: Vec<BoxFixture>,
}

impl SheetFixture {
    pub fn standard() -> Self {
        Self {
            vessel: "MV PACIFIC STAR",
            port: "tokyo",
            file_number: 12.0,
            week: 26.0,
            year_label: "Crop Year 2025",
            boxes: vec![
                BoxFixture {
                    name: "BOX 1",
                    container: "MSKU1234567",
                    site_code: 42.0,
                    traceability: "020214260625",
                    site_name: "la esperanza",
                    weights: vec![600.0, 700.0, 500.0],
                },
                BoxFixture {
                    name: "BOX 2",
                    container: "MSKU7654321",
                    site_code: 7.0,
                    traceability: "not-a-date",
                    site_name: "san jose",
                    weights: vec![650.0, 650.0],
                },
            ],
        }
    }
}

// Fixture coordinates are 1-based like the extractor's; the writer is 0-based.
fn text(ws: &mut Worksheet, row: u32, col: u16, value: &str) -> Result<(), XlsxError> {
    ws.write_string(row - 1, col - 1, value)?;
    Ok(())
}

fn number(ws: &mut Worksheet, row: u32, col: u16, value: f64) -> Result<(), XlsxError> {
    ws.write_number(row - 1, col - 1, value)?;
    Ok(())
}

pub fn write_workbook(path: &Path, sheet: &SheetFixture) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let ws = workbook.add_worksheet();

    text(ws, 1, 2, sheet.vessel)?;
    text(ws, 1, 7, sheet.port)?;
    number(ws, 1, 17, sheet.file_number)?;
    number(ws, 1, 20, sheet.week)?;
    text(ws, 2, 1, sheet.year_label)?;

    for (index, fixture) in sheet.boxes.iter().enumerate() {
        let col = 2 + (index as u16) * 2;
        text(ws, 2, col, fixture.name)?;
        text(ws, 3, col, fixture.container)?;
        number(ws, 4, col, fixture.site_code)?;
        text(ws, 5, col, fixture.traceability)?;
        text(ws, 6, col, fixture.site_name)?;
        for (offset, weight) in fixture.weights.iter().enumerate() {
            number(ws, 8 + offset as u32, col, *weight)?;
        }
    }

    workbook.save(path)?;
    Ok(())
}

/// Creates `<root>/<folder>` holding the given workbooks.
pub fn warehouse_dir(root: &Path, folder: &str, files: &[(&str, SheetFixture)]) -> PathBuf {
    let dir = root.join(folder);
    fs::create_dir_all(&dir).unwrap();
    for (name, sheet) in files {
        write_workbook(&dir.join(name), sheet).unwrap();
    }
    dir
}

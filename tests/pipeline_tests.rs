//! End-to-end extraction over real .xlsx workbooks.

mod common;

use common::{warehouse_dir, write_workbook, SheetFixture};
use inspection_loader::{
    extract_directory, Config, ExtractionMode, IngestError, InspectionLoader, LocalStore,
    OutputMode, RecordStore, Warehouse,
};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

const NITTSU_FILE: &str = "日通 WK26 MYNY.xlsx";

#[test]
fn test_files_only_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let dir = warehouse_dir(temp_dir.path(), "NITTSU", &[(NITTSU_FILE, SheetFixture::standard())]);

    let batch = extract_directory(&dir, ExtractionMode::FilesOnly).unwrap();

    assert_eq!(batch.warehouse, Warehouse::Nittsu);
    assert_eq!(batch.files.len(), 1);
    assert!(batch.boxes.is_empty());

    let file = &batch.files[0];
    assert_eq!(file.id, "NITTSU_2025_WK26 MYNY.xlsx_12");
    assert_eq!(file.name, "WK26 MYNY.xlsx");
    assert_eq!(file.port, "TOKYO");
    assert_eq!(file.vessel, "MV PACIFIC STAR");
    assert_eq!(file.year, 2025);
    assert_eq!(file.week, 26);
    assert_eq!(file.spec, 30);
    assert_eq!(file.kind, "CGC");
}

#[test]
fn test_boxes_extraction() {
    let temp_dir = TempDir::new().unwrap();
    let dir = warehouse_dir(temp_dir.path(), "NITTSU", &[(NITTSU_FILE, SheetFixture::standard())]);

    let batch = extract_directory(&dir, ExtractionMode::FilesAndBoxes).unwrap();
    assert_eq!(batch.boxes.len(), 2);

    let first = &batch.boxes[0];
    assert_eq!(
        first.id,
        "NITTSU_2025_WK26 MYNY.xlsx_BOX_1_MSKU1234567_42_020214260625_LA_ESPERANZA"
    );
    assert_eq!(first.file_id, "NITTSU_2025_WK26 MYNY.xlsx_12");
    assert_eq!(first.site_code, 42);
    assert_eq!(first.site_name, "LA ESPERANZA");
    assert_eq!((first.week_code, first.year_code), (26, 2025));
    assert_eq!(first.total_weight, 1800.0);
    assert_eq!(first.average_weight, 600.0);
    assert_eq!((first.under_weight, first.over_weight), (1, 0));

    let second = &batch.boxes[1];
    assert_eq!(second.traceability_code, "not-a-date");
    assert_eq!((second.week_code, second.year_code), (0, 0));
    assert_eq!(second.total_weight, 1300.0);

    let summary = batch.summary();
    assert_eq!(summary.total_files, 1);
    assert_eq!(summary.total_boxes, 2);
    assert_eq!(summary.warehouses, vec!["NITTSU".to_string()]);
    assert_eq!(summary.years, vec![2025]);
    assert_eq!(summary.total_weight, 3100.0);
    assert_eq!(summary.average_box_weight, 1550.0);
    assert_eq!(summary.files_detail[0].boxes, 2);
}

#[test]
fn test_lock_files_and_other_extensions_are_ignored() {
    let temp_dir = TempDir::new().unwrap();
    let dir = warehouse_dir(temp_dir.path(), "KOBE", &[("神戸 WK01.xlsx", SheetFixture::standard())]);
    fs::write(dir.join("~$神戸 WK01.xlsx"), b"lock").unwrap();
    fs::write(dir.join("notes.txt"), b"notes").unwrap();
    fs::create_dir(dir.join("archive.xlsx")).unwrap();

    let batch = extract_directory(&dir, ExtractionMode::FilesOnly).unwrap();
    assert_eq!(batch.files.len(), 1);
    assert_eq!(batch.files[0].warehouse, "KOBE");
    assert!(batch.skipped.is_empty());
}

#[test]
fn test_unreadable_workbook_is_skipped() {
    let temp_dir = TempDir::new().unwrap();
    let dir = warehouse_dir(temp_dir.path(), "HAKATA", &[("博多 WK02.xlsx", SheetFixture::standard())]);
    fs::write(dir.join("博多 WK03.xlsx"), b"this is not a workbook").unwrap();

    let batch = extract_directory(&dir, ExtractionMode::FilesAndBoxes).unwrap();
    assert_eq!(batch.files.len(), 1);
    assert_eq!(batch.boxes.len(), 2);
    assert_eq!(batch.skipped.len(), 1);
    assert_eq!(batch.skipped[0].name, "WK03.xlsx");
}

#[test]
fn test_malformed_week_skips_file() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("NITTSU");
    fs::create_dir(&dir).unwrap();

    let mut workbook = rust_xlsxwriter::Workbook::new();
    let ws = workbook.add_worksheet();
    ws.write_string(0, 19, "week twenty").unwrap();
    workbook.save(dir.join("日通 BAD.xlsx")).unwrap();
    write_workbook(&dir.join("日通 GOOD.xlsx"), &SheetFixture::standard()).unwrap();

    let batch = extract_directory(&dir, ExtractionMode::FilesOnly).unwrap();
    assert_eq!(batch.files.len(), 1);
    assert_eq!(batch.files[0].name, "GOOD.xlsx");
    assert_eq!(batch.skipped.len(), 1);
    assert!(batch.skipped[0].reason.contains("T1"));
}

#[test]
fn test_directory_level_errors() {
    let temp_dir = TempDir::new().unwrap();

    let missing = extract_directory(temp_dir.path().join("missing"), ExtractionMode::FilesOnly);
    assert!(matches!(missing, Err(IngestError::NotFound { .. })));

    let empty = temp_dir.path().join("KOBE");
    fs::create_dir(&empty).unwrap();
    let result = extract_directory(&empty, ExtractionMode::FilesOnly);
    assert!(matches!(result, Err(IngestError::EmptyInput { .. })));

    let variant = warehouse_dir(
        temp_dir.path(),
        "NITTSU MATIAS",
        &[("日通 WK05.xlsx", SheetFixture::standard())],
    );
    let result = extract_directory(&variant, ExtractionMode::FilesOnly);
    assert!(matches!(result, Err(IngestError::UnsupportedVariant { .. })));
}

#[test]
fn test_run_and_upload_twice() {
    let temp_dir = TempDir::new().unwrap();
    let nittsu = warehouse_dir(temp_dir.path(), "NITTSU", &[(NITTSU_FILE, SheetFixture::standard())]);
    let store_dir = temp_dir.path().join("store");

    let mut config = Config::default();
    config.warehouse.output_directory = store_dir.clone();
    let loader = InspectionLoader::new_for_test(config, OutputMode::Plain, 0, true);

    let directories = vec![nittsu, temp_dir.path().join("missing")];
    let mut report = loader
        .process_directories(&directories, ExtractionMode::FilesAndBoxes)
        .unwrap();
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);
    assert!(report.is_partial());

    let first = loader.upload(&mut report).unwrap();
    assert_eq!((first.files_loaded, first.boxes_loaded, first.duplicates_skipped), (1, 2, 0));

    let second = loader.upload(&mut report).unwrap();
    assert_eq!((second.files_loaded, second.boxes_loaded, second.duplicates_skipped), (0, 0, 1));

    let store = LocalStore::new(&store_dir, "bd_banano", "T1_ARCHIVOS", "T2_CAJAS");
    let rows: Vec<serde_json::Value> = store.read_rows("T2_CAJAS").unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["id_archivo"], "NITTSU_2025_WK26 MYNY.xlsx_12");
    assert_eq!(
        store
            .existing_file_ids(&["NITTSU_2025_WK26 MYNY.xlsx_12".to_string()])
            .unwrap()
            .len(),
        1
    );
}

#[test]
fn test_identifiers_are_stable_across_runs() {
    let temp_dir = TempDir::new().unwrap();
    let dir = warehouse_dir(temp_dir.path(), "NITTSU", &[(NITTSU_FILE, SheetFixture::standard())]);

    let first = extract_directory(&dir, ExtractionMode::FilesAndBoxes).unwrap();
    let second = extract_directory(&dir, ExtractionMode::FilesAndBoxes).unwrap();

    assert_eq!(first.files, second.files);
    assert_eq!(first.boxes, second.boxes);
}

//! Tests for delta log writing and scanning
//!
//! These tests verify:
//! - Records from data blocks land in the pending-change index
//! - Repeated keys are folded with the configured merge mode
//! - Delete blocks leave delete markers
//! - Corrupt blocks are skipped and partial tails tolerated
//! - Scanner close releases the index

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fileslice::config::Config;
use fileslice::log::{DeleteKey, DeltaLogScanner, DeltaLogWriter, Frame, FrameReader, LogBlock, LogScanner};
use fileslice::merge::MergeMode;
use fileslice::record::{DataType, Field, Record, Row, Schema, Value};
use fileslice::SliceError;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_dir() -> TempDir {
    TempDir::new().unwrap()
}

fn schema() -> Schema {
    Schema::new(
        "accounts",
        vec![
            Field::required("id", DataType::String),
            Field::nullable("balance", DataType::Long),
            Field::required("ts", DataType::Long),
        ],
    )
}

fn account(id: &str, balance: i64, ts: i64) -> Record {
    let mut row = Row::new();
    row.insert("id".to_string(), Value::from(id));
    row.insert("balance".to_string(), Value::Long(balance));
    row.insert("ts".to_string(), Value::Long(ts));
    Record::new(id, "acct", row)
}

fn event_time_config() -> Config {
    Config::builder()
        .ordering_field("ts")
        .merge_mode(MergeMode::EventTimeOrdering)
        .build()
}

/// Write one data block per batch to a new log file
fn write_log(dir: &Path, name: &str, batches: Vec<Vec<Record>>) -> PathBuf {
    let path = dir.join(name);
    let mut writer = DeltaLogWriter::open(&path).unwrap();
    for batch in batches {
        writer.append_records(&schema(), batch).unwrap();
    }
    writer.sync().unwrap();
    path
}

fn balance(scanner: &mut DeltaLogScanner, key: &str) -> Option<Value> {
    scanner
        .records()
        .get(key)
        .and_then(|record| record.get("balance").cloned())
}

// =============================================================================
// Scan Tests
// =============================================================================

#[test]
fn test_scan_collects_records() {
    let temp = setup_temp_dir();
    let path = write_log(
        temp.path(),
        "1.log",
        vec![vec![account("a", 10, 1), account("b", 20, 1)], vec![account("c", 30, 1)]],
    );

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(scanner.records().len(), 3);
    assert_eq!(balance(&mut scanner, "b"), Some(Value::Long(20)));
    assert_eq!(scanner.stats().files_scanned, 1);
    assert_eq!(scanner.stats().blocks_read, 2);
    assert_eq!(scanner.stats().records_read, 3);
}

#[test]
fn test_scan_no_logs_is_empty() {
    let paths: Vec<PathBuf> = Vec::new();

    let mut scanner = DeltaLogScanner::scan(paths.as_slice(), &Config::default()).unwrap();

    assert!(scanner.records().is_empty());
    assert!(scanner.schema().is_none());
}

#[test]
fn test_scan_missing_file_is_io_error() {
    let temp = setup_temp_dir();
    let missing = temp.path().join("missing.log");

    let result = DeltaLogScanner::scan(&[missing], &Config::default());

    assert!(matches!(result, Err(SliceError::Io(_))));
}

#[test]
fn test_later_update_wins_under_event_time() {
    let temp = setup_temp_dir();
    let path = write_log(
        temp.path(),
        "1.log",
        vec![vec![account("a", 10, 1)], vec![account("a", 15, 2)]],
    );

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(scanner.records().len(), 1);
    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(15)));
}

#[test]
fn test_stale_update_ignored_under_event_time() {
    let temp = setup_temp_dir();
    let path = write_log(
        temp.path(),
        "1.log",
        vec![vec![account("a", 10, 5)], vec![account("a", 99, 2)]],
    );

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(10)));
}

#[test]
fn test_overwrite_takes_last_written() {
    let temp = setup_temp_dir();
    let path = write_log(
        temp.path(),
        "1.log",
        vec![vec![account("a", 10, 5)], vec![account("a", 99, 2)]],
    );
    let config = Config::builder()
        .ordering_field("ts")
        .merge_mode(MergeMode::OverwriteWithLatest)
        .build();

    let mut scanner = DeltaLogScanner::scan(&[&path], &config).unwrap();

    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(99)));
}

#[test]
fn test_later_files_are_newer() {
    let temp = setup_temp_dir();
    let first = write_log(temp.path(), "1.log", vec![vec![account("a", 1, 1)]]);
    let second = write_log(temp.path(), "2.log", vec![vec![account("a", 2, 1)]]);

    let mut scanner = DeltaLogScanner::scan(&[&first, &second], &event_time_config()).unwrap();
    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(2)));

    let mut reversed = DeltaLogScanner::scan(&[&second, &first], &event_time_config()).unwrap();
    assert_eq!(balance(&mut reversed, "a"), Some(Value::Long(1)));
}

// =============================================================================
// Delete Tests
// =============================================================================

#[test]
fn test_delete_block_leaves_marker() {
    let temp = setup_temp_dir();
    let path = temp.path().join("1.log");
    let mut writer = DeltaLogWriter::open(&path).unwrap();
    writer.append_records(&schema(), vec![account("a", 10, 1)]).unwrap();
    writer
        .append_deletes(vec![DeleteKey::new("a", "acct", Value::Long(2))])
        .unwrap();
    writer.sync().unwrap();

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    let marker = scanner.records().get("a").unwrap().clone();
    assert!(marker.is_delete());
    assert_eq!(marker.ordering_value(Some("ts")), &Value::Long(2));
    assert_eq!(scanner.stats().deletes_read, 1);
}

#[test]
fn test_stale_delete_keeps_record() {
    let temp = setup_temp_dir();
    let path = temp.path().join("1.log");
    let mut writer = DeltaLogWriter::open(&path).unwrap();
    writer.append_records(&schema(), vec![account("a", 10, 5)]).unwrap();
    writer
        .append_deletes(vec![DeleteKey::new("a", "acct", Value::Long(1))])
        .unwrap();
    writer.sync().unwrap();

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert!(!scanner.records().get("a").unwrap().is_delete());
    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(10)));
}

#[test]
fn test_delete_of_unknown_key_is_kept() {
    let temp = setup_temp_dir();
    let path = temp.path().join("1.log");
    let mut writer = DeltaLogWriter::open(&path).unwrap();
    writer
        .append_deletes(vec![DeleteKey::new("ghost", "acct", Value::Long(1))])
        .unwrap();
    writer.sync().unwrap();

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert!(scanner.records().get("ghost").unwrap().is_delete());
    assert!(scanner.schema().is_none());
}

#[test]
fn test_insert_after_delete_revives_key() {
    let temp = setup_temp_dir();
    let path = temp.path().join("1.log");
    let mut writer = DeltaLogWriter::open(&path).unwrap();
    writer
        .append_deletes(vec![DeleteKey::new("a", "acct", Value::Long(1))])
        .unwrap();
    writer.append_records(&schema(), vec![account("a", 7, 3)]).unwrap();
    writer.sync().unwrap();

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert!(!scanner.records().get("a").unwrap().is_delete());
    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(7)));
}

// =============================================================================
// Damage Tests
// =============================================================================

#[test]
fn test_corrupt_block_skipped() {
    let temp = setup_temp_dir();
    let path = write_log(
        temp.path(),
        "1.log",
        vec![vec![account("a", 1, 1)], vec![account("b", 2, 1)]],
    );

    // Damage the payload of the first block
    let mut bytes = fs::read(&path).unwrap();
    bytes[12] ^= 0xFF;
    fs::write(&path, bytes).unwrap();

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(scanner.stats().corrupt_blocks, 1);
    assert!(!scanner.records().contains_key("a"));
    assert!(scanner.records().contains_key("b"));
}

#[test]
fn test_truncated_tail_tolerated() {
    let temp = setup_temp_dir();
    let path = write_log(temp.path(), "1.log", vec![vec![account("a", 1, 1)]]);

    let partial = LogBlock::Data {
        schema: schema(),
        records: vec![account("b", 2, 1)],
    }
    .encode()
    .unwrap();
    let mut file = OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(&partial[..partial.len() / 2]).unwrap();
    drop(file);

    let mut scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(scanner.stats().truncated_files, 1);
    assert!(scanner.records().contains_key("a"));
    assert!(!scanner.records().contains_key("b"));
}

#[test]
fn test_frame_reader_reports_frames() {
    let block = LogBlock::Delete {
        keys: vec![DeleteKey::new("a", "acct", Value::Null)],
    };
    let mut data = block.encode().unwrap().to_vec();
    data.extend_from_slice(&[1, 2, 3]);

    let frames: Vec<Frame> = FrameReader::new(data).collect();

    assert_eq!(frames.len(), 2);
    assert!(matches!(&frames[0], Frame::Block(decoded) if *decoded == block));
    assert!(matches!(frames[1], Frame::Truncated { .. }));
}

// =============================================================================
// Schema Tests
// =============================================================================

#[test]
fn test_scanner_tracks_latest_schema() {
    let temp = setup_temp_dir();
    let path = temp.path().join("1.log");
    let evolved = Schema::new(
        "accounts",
        vec![
            Field::required("id", DataType::String),
            Field::nullable("balance", DataType::Long),
            Field::required("ts", DataType::Long),
            Field::nullable("note", DataType::String),
        ],
    );

    let mut writer = DeltaLogWriter::open(&path).unwrap();
    writer.append_records(&schema(), vec![account("a", 1, 1)]).unwrap();
    writer.append_records(&evolved, vec![account("b", 2, 1)]).unwrap();
    writer.sync().unwrap();
    assert_eq!(writer.blocks_written(), 2);

    let scanner = DeltaLogScanner::scan(&[&path], &event_time_config()).unwrap();

    assert_eq!(scanner.schema().unwrap().as_ref(), &evolved);
}

#[test]
fn test_from_records_folds_in_order() {
    let records = vec![account("a", 1, 1), account("a", 2, 2), account("b", 3, 1)];

    let mut scanner =
        DeltaLogScanner::from_records(records, schema().into_ref(), &event_time_config()).unwrap();

    assert_eq!(scanner.records().len(), 2);
    assert_eq!(balance(&mut scanner, "a"), Some(Value::Long(2)));
    assert_eq!(scanner.stats().records_read, 3);
    assert_eq!(scanner.schema().unwrap().name, "accounts");
}

#[test]
fn test_scanner_reports_configured_flags() {
    let config = Config::builder()
        .with_operation_field(true)
        .partition_name_override("archive")
        .build();

    let scanner = DeltaLogScanner::from_records(Vec::new(), schema().into_ref(), &config).unwrap();

    assert!(scanner.is_with_operation_field());
    assert_eq!(scanner.partition_name_override(), Some("archive"));
}

// =============================================================================
// Close Tests
// =============================================================================

#[test]
fn test_close_clears_index_and_is_idempotent() {
    let records = vec![account("a", 1, 1), account("b", 2, 1)];
    let mut scanner =
        DeltaLogScanner::from_records(records, schema().into_ref(), &event_time_config()).unwrap();

    scanner.close().unwrap();
    scanner.close().unwrap();

    assert!(scanner.is_closed());
    assert!(scanner.records().is_empty());
}

// src/tests/summary_tests.rs

//! tests for `readers/summary.rs` and `printer/summary.rs`

#![allow(non_snake_case)]

use crate::common::{FPath, FileType, LoginFileKind};
use crate::printer::summary::{print_summary, summary_totals, SummaryTotals};
use crate::readers::batchprocessor::{FileProcessingResult, MapPathResult};
use crate::readers::blockreader::SummaryBlockReader;
use crate::readers::indexedtablereader::SummaryIndexedTableReader;
use crate::readers::sequentialscanner::SummarySequentialLogScanner;
use crate::readers::summary::Summary;

use std::io::{Error, ErrorKind};

const FT_SEQ: FileType = FileType::File { kind: LoginFileKind::SequentialLog };
const FT_IDX: FileType = FileType::File { kind: LoginFileKind::IndexedTable };

fn summary_sequential() -> Summary {
    Summary::new_sequential(
        FPath::from("/var/log/wtmp"),
        FT_SEQ,
        SummaryBlockReader {
            BlockReader_bytes: 800,
            BlockReader_blocks: 1,
            BlockReader_blocksz: 0xFFFF,
            BlockReader_filesz: 800,
            BlockReader_filesz_uncompressed: 800,
            BlockReader_read_interrupted: 0,
        },
        SummarySequentialLogScanner {
            SequentialLogScanner_records: 2,
            SequentialLogScanner_events: 2,
            SequentialLogScanner_records_skipped: 0,
            SequentialLogScanner_bytes_discarded: 32,
        },
        None,
    )
}

fn summary_indexed() -> Summary {
    Summary::new_indexed(
        FPath::from("/var/log/lastlog"),
        FT_IDX,
        SummaryIndexedTableReader {
            IndexedTableReader_filesz: 292 * 10,
            IndexedTableReader_found: 4,
            IndexedTableReader_absent: 1,
            IndexedTableReader_errors: 0,
        },
        5,
        4,
    )
}

fn results() -> MapPathResult {
    let mut results = MapPathResult::new();
    results.insert(FPath::from("/var/log/wtmp"), FileProcessingResult::FileOk(summary_sequential()));
    results.insert(FPath::from("/var/log/lastlog"), FileProcessingResult::FileOk(summary_indexed()));
    results.insert(FPath::from("/var/log/btmp"), FileProcessingResult::FileErrEmpty);
    results.insert(
        FPath::from("/var/log/utmp"),
        FileProcessingResult::FileErrIo(Error::new(ErrorKind::PermissionDenied, "denied")),
    );
    results.insert(FPath::from("/var/log/lastlog.gz"), FileProcessingResult::FileErrNotSupported);

    results
}

#[test]
fn test_Summary_bytes() {
    assert_eq!(summary_sequential().bytes(), 800);
    assert_eq!(summary_indexed().bytes(), 2920);
    assert_eq!(Summary::default().bytes(), 0);
    assert!(Summary::default().readerdata.is_dummy());
}

#[test]
fn test_Summary_display() {
    let s = summary_sequential().to_string();
    assert!(s.contains("records 2"), "{}", s);
    assert!(s.contains("trailing bytes discarded 32"), "{}", s);
    let s = summary_indexed().to_string();
    assert!(s.contains("principals 5"), "{}", s);
    assert!(s.contains("principals absent 1"), "{}", s);
}

#[test]
fn test_summary_totals() {
    assert_eq!(
        summary_totals(&results()),
        SummaryTotals {
            files: 5,
            files_ok: 2,
            files_empty: 1,
            files_err: 2,
            events: 6,
        },
    );
}

#[test]
fn test_print_summary() {
    let mut buffer: Vec<u8> = Vec::new();
    print_summary(&mut buffer, &results()).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("Files:\n"), "{}", text);
    assert!(text.contains("\"/var/log/btmp\": empty file"), "{}", text);
    assert!(text.contains("\"/var/log/lastlog.gz\": file type not supported"), "{}", text);
    assert!(text.ends_with("Totals: files 5, ok 2, empty 1, failed 2, events 6\n"), "{}", text);
    // one line per file, a heading, and totals
    assert_eq!(text.lines().count(), 7);
}

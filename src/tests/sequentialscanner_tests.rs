// src/tests/sequentialscanner_tests.rs

//! tests for `sequentialscanner.rs`

#![allow(non_snake_case)]

use crate::common::{FPath, FileType, LoginFileKind};
use crate::data::loginevent::{LoginEvent, UtType};
use crate::data::layout::{RawRecord, LASTLOG_LAYOUT};
use crate::debug::helpers::{
    create_temp_file_bytes,
    create_temp_file_gz,
    create_temp_file_gz_members,
    ntf_fpath,
};
use crate::readers::blockreader::{BlockReader, BlockSz};
use crate::readers::sequentialscanner::{
    ResultS3LoginEvent,
    ResultS3RawRecord,
    SequentialLogScanner,
};
use crate::tests::common::{
    NTF_EMPTY_FPATH,
    NTF_UTMPX_3RECORD_FPATH,
    TN_P8,
    UTMPX_3RECORD_BYTES,
    UTMPX_USER_BYTES,
};

use std::io::{Error, ErrorKind, Read};

use ::test_case::test_case;

const FT_SEQ: FileType = FileType::File { kind: LoginFileKind::SequentialLog };
const FT_SEQ_GZ: FileType = FileType::FileGz { kind: LoginFileKind::SequentialLog };

fn new_SequentialLogScanner(path: &FPath, filetype: FileType, blocksz: BlockSz) -> SequentialLogScanner {
    match SequentialLogScanner::new(path.clone(), filetype, blocksz, *TN_P8) {
        Ok(scanner) => scanner,
        Err(err) => panic!("SequentialLogScanner::new({:?}) failed {}", path, err),
    }
}

/// every event, panic on `Err`
fn scan_events(scanner: &mut SequentialLogScanner) -> Vec<LoginEvent> {
    let mut events: Vec<LoginEvent> = Vec::new();
    loop {
        match scanner.next_event() {
            ResultS3LoginEvent::Found(event) => events.push(event),
            ResultS3LoginEvent::Done => break,
            ResultS3LoginEvent::Err(err) => panic!("next_event() Err {}", err),
        }
    }

    events
}

/// `N` records plus `extra` trailing bytes
fn records_bytes(n: usize, extra: usize) -> Vec<u8> {
    let mut data: Vec<u8> = Vec::with_capacity(n * 384 + extra);
    for _ in 0..n {
        data.extend_from_slice(&UTMPX_USER_BYTES);
    }
    data.extend(std::iter::repeat(0xAA).take(extra));

    data
}

#[test_case(0, 0; "empty")]
#[test_case(0, 1; "one byte")]
#[test_case(0, 383; "one short of a record")]
#[test_case(1, 0; "one record")]
#[test_case(1, 1; "one record and a byte")]
#[test_case(2, 0; "two records")]
#[test_case(3, 200; "three records and partial")]
fn test_SequentialLogScanner_count(n: usize, extra: usize) {
    let data = records_bytes(n, extra);
    let ntf = create_temp_file_bytes(&data);
    // odd block sizes so records straddle blocks
    for blocksz in [7, 384, 1000, 0xFFFF] {
        let mut scanner = new_SequentialLogScanner(&ntf_fpath(&ntf), FT_SEQ, blocksz);
        let events = scan_events(&mut scanner);
        assert_eq!(events.len(), data.len() / 384, "blocksz {}", blocksz);
        assert_eq!(scanner.count_records(), n as u64);
        assert_eq!(scanner.count_bytes_discarded(), extra as u64);
        for (i, event) in events.iter().enumerate() {
            assert_eq!(event.fileoffset, (i * 384) as u64);
            assert_eq!(event.username, "alice");
        }
    }
}

#[test]
fn test_SequentialLogScanner_order() {
    let mut scanner = new_SequentialLogScanner(&NTF_UTMPX_3RECORD_FPATH, FT_SEQ, 100);
    let events = scan_events(&mut scanner);
    let types: Vec<UtType> = events.iter().map(|e| e.event_type).collect();
    assert_eq!(types, vec![UtType::BootTime, UtType::UserProcess, UtType::DeadProcess]);
    let summary = scanner.summary();
    assert_eq!(summary.SequentialLogScanner_records, 3);
    assert_eq!(summary.SequentialLogScanner_events, 3);
    assert_eq!(summary.SequentialLogScanner_records_skipped, 0);
    assert_eq!(summary.SequentialLogScanner_bytes_discarded, 0);
    assert_eq!(scanner.summary_blockreader().BlockReader_bytes, 3 * 384);
    assert!(scanner.error().is_none());
}

#[test]
fn test_SequentialLogScanner_next_record() {
    let mut scanner = new_SequentialLogScanner(&NTF_UTMPX_3RECORD_FPATH, FT_SEQ, 0xFFFF);
    for index in 0..3_u64 {
        match scanner.next_record() {
            ResultS3RawRecord::Found(raw) => {
                assert_eq!(raw.index(), index);
                assert_eq!(raw.fileoffset(), index * 384);
                assert_eq!(raw.as_bytes(), &UTMPX_3RECORD_BYTES[(index * 384) as usize..((index + 1) * 384) as usize]);
            }
            result => panic!("expected Found, got {}", result),
        }
    }
    assert!(scanner.next_record().is_done());
    assert!(scanner.next_record().is_done());
}

#[test]
fn test_SequentialLogScanner_empty() {
    let mut scanner = new_SequentialLogScanner(&NTF_EMPTY_FPATH, FT_SEQ, 64);
    assert!(scanner.next_event().is_done());
    assert_eq!(scanner.count_records(), 0);
}

#[test]
fn test_SequentialLogScanner_gz() {
    let data = records_bytes(5, 10);
    let ntf = create_temp_file_gz(&data);
    let mut scanner = new_SequentialLogScanner(&ntf_fpath(&ntf), FT_SEQ_GZ, 500);
    let events = scan_events(&mut scanner);
    assert_eq!(events.len(), 5);
    assert_eq!(scanner.count_bytes_discarded(), 10);
}

// records split across gzip members, e.g. concatenated rotations
#[test_case(&[2, 2], 0, 4; "two members")]
#[test_case(&[1, 3, 1], 0, 5; "three members")]
#[test_case(&[2, 0], 0, 2; "empty last member")]
#[test_case(&[1, 1], 100, 2; "partial record in last member")]
fn test_SequentialLogScanner_gz_members(records: &[usize], extra: usize, expect: usize) {
    let mut members: Vec<Vec<u8>> = records
        .iter()
        .map(|n| records_bytes(*n, 0))
        .collect();
    if let Some(last) = members.last_mut() {
        last.extend(std::iter::repeat(0xAA).take(extra));
    }
    let total: usize = members.iter().map(|m| m.len()).sum();
    let members_: Vec<&[u8]> = members.iter().map(|m| m.as_slice()).collect();
    let ntf = create_temp_file_gz_members(&members_);
    for blocksz in [100, 384, 0xFFFF] {
        let mut scanner = new_SequentialLogScanner(&ntf_fpath(&ntf), FT_SEQ_GZ, blocksz);
        let events = scan_events(&mut scanner);
        assert_eq!(events.len(), total / 384, "blocksz {}", blocksz);
        assert_eq!(events.len(), expect, "blocksz {}", blocksz);
        assert_eq!(scanner.count_bytes_discarded(), (total % 384) as u64);
        assert_eq!(scanner.summary_blockreader().BlockReader_bytes, total as u64);
    }
}

#[test]
fn test_SequentialLogScanner_decode_record_skipped() {
    let mut scanner = new_SequentialLogScanner(&NTF_UTMPX_3RECORD_FPATH, FT_SEQ, 0xFFFF);
    // a record of the wrong layout cannot be decoded as `utmpx`
    let lastlog = RawRecord::new(vec![0; 292], 0, 0, &LASTLOG_LAYOUT).unwrap();
    assert!(scanner.decode_record(&lastlog).is_none());
    assert_eq!(scanner.count_records_skipped(), 1);
    // scanning continues
    let events = scan_events(&mut scanner);
    assert_eq!(events.len(), 3);
    let summary = scanner.summary();
    assert_eq!(summary.SequentialLogScanner_records_skipped, 1);
    assert_eq!(summary.SequentialLogScanner_events, 3);
}

#[test]
fn test_SequentialLogScanner_new_not_sequential() {
    let ft = FileType::File { kind: LoginFileKind::IndexedTable };
    match SequentialLogScanner::new(NTF_EMPTY_FPATH.clone(), ft, 64, *TN_P8) {
        Ok(_) => panic!("expected Err"),
        Err(err) => assert_eq!(err.kind(), ErrorKind::InvalidInput),
    }
}

/// returns `data` then an error
struct FailingReader {
    data: Vec<u8>,
    at: usize,
}

impl Read for FailingReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.at >= self.data.len() {
            return Err(Error::new(ErrorKind::UnexpectedEof, "device went away"));
        }
        let len = std::cmp::min(buf.len(), self.data.len() - self.at);
        buf[..len].copy_from_slice(&self.data[self.at..self.at + len]);
        self.at += len;
        Ok(len)
    }
}

#[test_case(64; "small blocks")]
#[test_case(0xFFFF; "one block")]
fn test_SequentialLogScanner_error_mid_stream(blocksz: BlockSz) {
    // two whole records then half of a third
    let data = records_bytes(2, 192);
    let reader = FailingReader { data, at: 0 };
    let br = BlockReader::from_reader(FPath::from("stream"), FT_SEQ, Box::new(reader), blocksz).unwrap();
    let mut scanner = SequentialLogScanner::from_blockreader(br, *TN_P8);
    assert!(scanner.next_event().is_found());
    assert!(scanner.next_event().is_found());
    match scanner.next_event() {
        ResultS3LoginEvent::Err(err) => assert_eq!(err.kind(), ErrorKind::UnexpectedEof),
        result => panic!("expected Err, got {}", result),
    }
    assert!(scanner.error().is_some());
    assert!(scanner.next_event().is_done());
    assert_eq!(scanner.count_records(), 2);
    assert_eq!(scanner.count_bytes_discarded(), 192);
}

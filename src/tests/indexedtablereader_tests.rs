// src/tests/indexedtablereader_tests.rs

//! tests for `indexedtablereader.rs`

#![allow(non_snake_case)]

use crate::common::FPath;
use crate::data::datetime::NO_EVENT_SENTINEL;
use crate::data::loginevent::LoginEvent;
use crate::data::principal::{PrincipalId, PrincipalMap};
use crate::debug::helpers::{create_temp_file_bytes, ntf_fpath, tempdir};
use crate::readers::indexedtablereader::{IndexedTableReader, ResultS3IndexedRead};
use crate::tests::common::{
    lastlog_bytes,
    NTF_EMPTY_FPATH,
    NTF_LASTLOG_4RECORD_FPATH,
    TN_P8,
    TV_SEC_1,
    TV_SEC_1_P8,
};

use std::io::ErrorKind;

use ::test_case::test_case;

fn new_IndexedTableReader(path: &FPath) -> IndexedTableReader {
    match IndexedTableReader::new(path.clone(), *TN_P8) {
        Ok(reader) => reader,
        Err(err) => panic!("IndexedTableReader::new({:?}) failed {}", path, err),
    }
}

fn principals(ids: &[PrincipalId]) -> PrincipalMap {
    ids.iter().map(|id| (*id, format!("user{}", id))).collect()
}

#[test]
fn test_IndexedTableReader_read() {
    let reader = new_IndexedTableReader(&NTF_LASTLOG_4RECORD_FPATH);
    assert_eq!(reader.filesz(), 4 * 292);
    match reader.read(1) {
        ResultS3IndexedRead::Found(event) => {
            assert_eq!(event.principal_id, Some(1));
            assert_eq!(event.fileoffset, 292);
            assert_eq!(event.terminal, "pts/1");
            assert_eq!(event.host, "10.0.0.1");
            assert_eq!(event.normalized_timestamp, TV_SEC_1_P8);
        }
        result => panic!("expected Found, got {}", result),
    }
    match reader.read(0) {
        ResultS3IndexedRead::Found(event) => {
            assert_eq!(event.normalized_timestamp, NO_EVENT_SENTINEL);
        }
        result => panic!("expected Found, got {}", result),
    }
}

#[test_case(4; "at end")]
#[test_case(5; "past end")]
#[test_case(1000; "far past end")]
#[test_case(PrincipalId::MAX; "max id")]
fn test_IndexedTableReader_read_absent(id: PrincipalId) {
    let reader = new_IndexedTableReader(&NTF_LASTLOG_4RECORD_FPATH);
    assert!(reader.read(id).is_done());
    assert_eq!(reader.summary().IndexedTableReader_absent, 1);
}

#[test]
fn test_IndexedTableReader_read_truncated_record() {
    let mut data = lastlog_bytes(TV_SEC_1 as u32, "tty1", "");
    data.extend_from_slice(&lastlog_bytes(TV_SEC_1 as u32, "tty2", "")[..100]);
    let ntf = create_temp_file_bytes(&data);
    let reader = new_IndexedTableReader(&ntf_fpath(&ntf));
    assert!(reader.read(0).is_found());
    assert!(reader.read(1).is_done());
}

#[test]
fn test_IndexedTableReader_offset_of() {
    let reader = new_IndexedTableReader(&NTF_EMPTY_FPATH);
    assert_eq!(reader.offset_of(0), Some(0));
    assert_eq!(reader.offset_of(3), Some(876));
    assert_eq!(reader.offset_of(PrincipalId::MAX), Some(PrincipalId::MAX as u64 * 292));
}

#[test]
fn test_IndexedTableReader_empty_file() {
    let reader = new_IndexedTableReader(&NTF_EMPTY_FPATH);
    assert!(reader.read(0).is_done());
    assert!(reader.read_directory(&principals(&[0, 1, 2])).is_empty());
}

#[test]
fn test_IndexedTableReader_new_directory() {
    let dir = tempdir().unwrap();
    let path: FPath = dir.path().to_string_lossy().to_string();
    match IndexedTableReader::new(path, *TN_P8) {
        Ok(_) => panic!("expected Err"),
        Err(err) => assert_eq!(err.kind(), ErrorKind::Unsupported),
    }
}

#[test]
fn test_IndexedTableReader_read_directory() {
    let reader = new_IndexedTableReader(&NTF_LASTLOG_4RECORD_FPATH);
    let directory = principals(&[3, 1, 0, 99, 2]);
    let events: Vec<LoginEvent> = reader.read_directory(&directory);
    let ids: Vec<Option<PrincipalId>> = events.iter().map(|e| e.principal_id).collect();
    assert_eq!(ids, vec![Some(0), Some(1), Some(2), Some(3)]);
    assert_eq!(events[1].username, "user1");
    assert_eq!(events[2].username, "user2");
    assert_eq!(events[3].username, "user3");
    assert_eq!(events[3].terminal, "tty1");
    assert_eq!(events[2].normalized_timestamp, NO_EVENT_SENTINEL);
    let summary = reader.summary();
    assert_eq!(summary.IndexedTableReader_found, 4);
    assert_eq!(summary.IndexedTableReader_absent, 1);
    assert_eq!(summary.IndexedTableReader_errors, 0);
}

#[test]
fn test_IndexedTableReader_read_directory_name_missing() {
    struct NoNames;
    impl crate::data::principal::PrincipalDirectory for NoNames {
        fn ids(&self) -> Vec<PrincipalId> {
            vec![1]
        }
        fn name(&self, _id: PrincipalId) -> Option<&str> {
            None
        }
    }
    let reader = new_IndexedTableReader(&NTF_LASTLOG_4RECORD_FPATH);
    let events = reader.read_directory(&NoNames);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].username, "1");
}

#[test_case(1; "one thread")]
#[test_case(2; "two threads")]
#[test_case(3; "three threads")]
#[test_case(64; "more threads than ids")]
#[test_case(0; "zero threads")]
fn test_IndexedTableReader_read_directory_parallel(threads: usize) {
    let mut data: Vec<u8> = Vec::new();
    for id in 0..50_u32 {
        let time: u32 = if id % 3 == 0 { 0 } else { TV_SEC_1 as u32 + id };
        data.extend(lastlog_bytes(time, format!("pts/{}", id).as_str(), ""));
    }
    let ntf = create_temp_file_bytes(&data);
    let reader = new_IndexedTableReader(&ntf_fpath(&ntf));
    let ids: Vec<PrincipalId> = (0..60).step_by(2).collect();
    let directory = principals(&ids);
    let sequential = reader.read_directory(&directory);
    let parallel = reader.read_directory_parallel(&directory, threads);
    assert_eq!(sequential.len(), 25);
    assert_eq!(parallel, sequential);
}

#[test]
fn test_IndexedTableReader_read_directory_parallel_empty_directory() {
    let reader = new_IndexedTableReader(&NTF_LASTLOG_4RECORD_FPATH);
    assert!(reader.read_directory_parallel(&PrincipalMap::new(), 4).is_empty());
}

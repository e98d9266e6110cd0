// src/tests/principal_tests.rs

//! tests for `principal.rs`

#![allow(non_snake_case)]

use crate::common::FPath;
use crate::data::principal::{
    PasswdDirectory,
    PrincipalDirectory,
    PrincipalMap,
};
use crate::debug::helpers::{create_temp_file_bytes, ntf_fpath};

use std::io::ErrorKind;

const PASSWD: &str = "\
root:x:0:0:root:/root:/bin/bash
daemon:x:1:1:daemon:/usr/sbin:/usr/sbin/nologin
# a comment

alice:x:1000:1000:Alice,,,:/home/alice:/bin/bash
broken line without fields
baduid:x:abc:1000::/:/bin/false
:x:5:5::/:/bin/false
bob:x:1001:1001::/home/bob:/bin/sh
dupe:x:1000:1000::/:/bin/sh
";

#[test]
fn test_PasswdDirectory_parse() {
    let pd = PasswdDirectory::parse(PASSWD);
    assert_eq!(pd.ids(), vec![0, 1, 1000, 1001]);
    assert_eq!(pd.name(0), Some("root"));
    assert_eq!(pd.name(1000), Some("alice"));
    assert_eq!(pd.name(1001), Some("bob"));
    assert_eq!(pd.name(5), None);
    assert_eq!(pd.len(), 4);
    // "broken line…", "baduid", and the empty name
    assert_eq!(pd.lines_skipped(), 3);
    assert!(pd.path().is_empty());
    assert!(!pd.is_empty());
}

#[test]
fn test_PasswdDirectory_parse_empty() {
    let pd = PasswdDirectory::parse("");
    assert!(pd.is_empty());
    assert_eq!(pd.lines_skipped(), 0);
}

#[test]
fn test_PasswdDirectory_from_path() {
    let ntf = create_temp_file_bytes(PASSWD.as_bytes());
    let path: FPath = ntf_fpath(&ntf);
    let pd = PasswdDirectory::from_path(&path).unwrap();
    assert_eq!(pd.path(), &path);
    assert_eq!(pd.len(), 4);
}

#[test]
fn test_PasswdDirectory_from_path_not_exist() {
    let path: FPath = FPath::from("/THIS/PATH/DOES/NOT/EXIST/passwd");
    match PasswdDirectory::from_path(&path) {
        Ok(_) => panic!("expected Err"),
        Err(err) => assert_eq!(err.kind(), ErrorKind::NotFound),
    }
}

#[test]
fn test_PrincipalMap_insert() {
    let mut pm = PrincipalMap::new();
    assert!(pm.insert(7, "seven"));
    assert!(!pm.insert(7, "other"));
    assert!(pm.insert(3, "three"));
    assert_eq!(pm.name(7), Some("seven"));
    assert_eq!(pm.ids(), vec![3, 7]);
    assert_eq!(pm.len(), 2);
}

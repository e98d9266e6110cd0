// src/debug/helpers.rs

//! Miscellaneous helper functions for debug printing and testing.

use crate::common::FPath;
use crate::readers::helpers::path_to_fpath;

#[allow(unused_imports)] // XXX: clippy wrongly marks this as unused
use std::io::Write; // for `NamedTempFile.write_all`

use ::flate2::write::GzEncoder;
use ::flate2::Compression;
use ::lazy_static::lazy_static;

#[doc(hidden)]
pub use ::tempfile::tempdir;
#[doc(hidden)]
pub use ::tempfile::NamedTempFile;
#[doc(hidden)]
pub use ::tempfile::TempDir;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// temporary file helper functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// NamedTempFile instances default to this file name prefix.
///
/// See <https://github.com/Stebalien/tempfile/issues/183>.
pub const STR_TEMPFILE_PREFIX: &str = "tmp-lrr-test-";

lazy_static! {
    pub static ref STRING_TEMPFILE_PREFIX: String = String::from(STR_TEMPFILE_PREFIX);
    // there is no `String::default` so create this just once
    static ref STRING_TEMPFILE_SUFFIX: String = String::from("");
}

/// Small helper function for copying `NamedTempFile` path to a `FPath`.
pub fn ntf_fpath(ntf: &NamedTempFile) -> FPath {
    path_to_fpath(ntf.path())
}

/// Testing helper function to write a `[u8]` to a specially-named
/// temporary file.
///
/// `rand_len` is the string length of a random character sequence
pub fn create_temp_file_with_name_rlen(
    data: &[u8],
    prefix: Option<&String>,
    suffix: Option<&String>,
    rand_len: usize,
) -> NamedTempFile {
    let mut ntf = match ::tempfile::Builder::new()
        .prefix::<str>(
            prefix
                .unwrap_or(&STRING_TEMPFILE_PREFIX)
                .as_ref(),
        )
        .suffix::<str>(
            suffix
                .unwrap_or(&STRING_TEMPFILE_SUFFIX)
                .as_ref(),
        )
        .rand_bytes(rand_len)
        .tempfile()
    {
        Ok(val) => val,
        Err(err) => {
            panic!("tempfile::Builder::new()..tempfile() return Err {}", err);
        }
    };
    match ntf.write_all(data) {
        Ok(_) => {}
        Err(err) => {
            panic!("NamedTempFile::write_all() return Err {}", err);
        }
    }

    ntf
}

/// Testing helper function to write a `[u8]` to a temporary file.
pub fn create_temp_file_bytes(data: &[u8]) -> NamedTempFile {
    create_temp_file_with_name_rlen(data, None, None, 5)
}

/// Testing helper function to write a `[u8]` to a temporary file with a
/// specific suffix, e.g. `".gz"`.
pub fn create_temp_file_bytes_with_suffix(
    data: &[u8],
    suffix: &String,
) -> NamedTempFile {
    create_temp_file_with_name_rlen(data, None, Some(suffix), 5)
}

/// Testing helper function to gzip compress `data` as one gzip member.
fn gz_member(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::<u8>::new(), Compression::default());
    match encoder.write_all(data) {
        Ok(_) => {}
        Err(err) => {
            panic!("GzEncoder::write_all() return Err {}", err);
        }
    }
    match encoder.finish() {
        Ok(val) => val,
        Err(err) => {
            panic!("GzEncoder::finish() return Err {}", err);
        }
    }
}

/// Testing helper function to gzip compress `data` and write it to a
/// temporary file with suffix `.gz`.
pub fn create_temp_file_gz(data: &[u8]) -> NamedTempFile {
    create_temp_file_gz_members(&[data])
}

/// Testing helper function to gzip compress each of `members` separately
/// and write the concatenated gzip members to a temporary file with suffix
/// `.gz`, like `cat a.gz b.gz > c.gz`.
pub fn create_temp_file_gz_members(members: &[&[u8]]) -> NamedTempFile {
    let mut compressed: Vec<u8> = Vec::new();
    for data in members.iter() {
        compressed.extend(gz_member(data));
    }

    create_temp_file_bytes_with_suffix(&compressed, &String::from(".gz"))
}

/// Testing helper function to write `data` to the file `name` within
/// directory `dir`. Returns the path of the new file.
pub fn create_file_in_dir(
    dir: &TempDir,
    name: &str,
    data: &[u8],
) -> FPath {
    let path = dir.path().join(name);
    match std::fs::write(&path, data) {
        Ok(_) => {}
        Err(err) => {
            panic!("std::fs::write({:?}) return Err {}", path, err);
        }
    }

    path_to_fpath(&path)
}

// src/readers/filepreprocessor.rs

//! A collection of functions to search for login accounting files, and
//! prepare data needed to create a [`SequentialLogScanner`] or
//! [`IndexedTableReader`] instance.
//!
//! Files are recognized by name:
//!
//! * `wtmp`, `utmp`, `btmp` (and `wtmpx`, `utmpx`), optionally followed by a
//!   `-`, `.`, or `_` suffix such as `wtmp.1` or `btmp-20240101`, and
//!   optionally gzip compressed `.gz`, are sequential logs.
//! * `lastlog`, with the same optional suffixes, is an indexed table.
//!
//! [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
//! [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader

use crate::common::{FPath, FileType, LoginFileKind};
use crate::readers::helpers::{basename, count_char_in_str, path_to_fpath};

use std::path::Path;

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// FilePreProcessor
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Initial path processing return type.
#[derive(Debug, Eq, PartialEq)]
pub enum ProcessPathResult {
    /// File can be processed by `lrr`
    FileValid(FPath, FileType),
    /// File is a known type and is not supported, e.g. `lastlog.gz`
    FileErrNotSupported(FPath),
    /// Path exists and is not a file
    FileErrNotAFile(FPath),
    /// Path does not exist
    FileErrNotExist(FPath),
}

pub type ProcessPathResults = Vec<ProcessPathResult>;

/// base names of sequential session logs
const SEQUENTIAL_LOG_NAMES: &[&str] = &[
    "wtmp",
    "utmp",
    "btmp",
    "wtmpx",
    "utmpx",
];

/// base names of indexed tables
const INDEXED_TABLE_NAMES: &[&str] = &[
    "lastlog",
];

/// characters that may separate a base name from a rotation suffix,
/// e.g. `wtmp.1`, `wtmp-20240101`, `wtmp_old`
const SUFFIX_SEPARATORS: &[char] = &['.', '-', '_'];

/// Gzip file extension
const GZ_EXTENSION: &str = ".gz";

/// Does `name` equal `base` or `base` followed by a separator and suffix?
fn name_matches(name: &str, base: &str) -> bool {
    match name.strip_prefix(base) {
        Some("") => true,
        Some(rest) => rest.starts_with(SUFFIX_SEPARATORS) && rest.len() > 1,
        None => false,
    }
}

/// Map a file name (not a full path) to a `FileType`.
///
/// Names with more than one extension after the base name, excluding a
/// final `.gz`, are not recognized, e.g. `wtmp.1.csv`. Nor is any name ending
/// in `.csv`, the output of `lrr`.
pub fn filename_to_filetype(name: &str) -> FileType {
    defn!("({:?})", name);
    let lower: String = name.to_lowercase();
    let (stem, compressed): (&str, bool) = match lower.strip_suffix(GZ_EXTENSION) {
        Some(stem) => (stem, true),
        None => (lower.as_str(), false),
    };
    if stem.ends_with(".csv") || count_char_in_str(stem, '.') > 1 {
        defx!("return Unknown");
        return FileType::Unknown;
    }
    let kind: LoginFileKind = if SEQUENTIAL_LOG_NAMES
        .iter()
        .any(|base| name_matches(stem, base))
    {
        LoginFileKind::SequentialLog
    } else if INDEXED_TABLE_NAMES
        .iter()
        .any(|base| name_matches(stem, base))
    {
        LoginFileKind::IndexedTable
    } else {
        defx!("return Unknown");
        return FileType::Unknown;
    };
    let filetype: FileType = match compressed {
        true => FileType::FileGz { kind },
        false => FileType::File { kind },
    };
    defx!("return {:?}", filetype);

    filetype
}

/// Map a path to a `FileType` using the file name.
pub fn fpath_to_filetype(path: &FPath) -> FileType {
    filename_to_filetype(basename(path).as_str())
}

/// The `FileType` of a file the user passed directly.
///
/// An unrecognized name is presumed to be a sequential log, the most common
/// format; a `.gz` extension selects gzip decompression.
pub fn fpath_to_filetype_forced(path: &FPath) -> FileType {
    match fpath_to_filetype(path) {
        FileType::Unknown => {
            let kind = LoginFileKind::SequentialLog;
            match path.to_lowercase().ends_with(GZ_EXTENSION) {
                true => FileType::FileGz { kind },
                false => FileType::File { kind },
            }
        }
        filetype => filetype,
    }
}

fn filetype_to_result(path: FPath, filetype: FileType) -> ProcessPathResult {
    match filetype.is_supported() {
        true => ProcessPathResult::FileValid(path, filetype),
        false => ProcessPathResult::FileErrNotSupported(path),
    }
}

/// Return all login accounting files in the path.
///
/// Given a plain file path, returns that path; the user passed it so an
/// attempt is made to process it regardless of name.<br/>
/// Given a directory, returns the recognized files directly within that
/// directory, sorted by name; subdirectories are not searched and
/// unrecognized names are ignored.
pub fn process_path(path: &FPath) -> ProcessPathResults {
    defn!("({:?})", path);

    let std_path: &Path = Path::new(path);
    if std_path.is_file() {
        let filetype: FileType = fpath_to_filetype_forced(path);
        let results = vec![filetype_to_result(path.clone(), filetype)];
        defx!("({:?}) {:?}", path, results);
        return results;
    }
    if !std_path.exists() {
        defx!("return FileErrNotExist");
        return vec![ProcessPathResult::FileErrNotExist(path.clone())];
    }
    if !std_path.is_dir() {
        defx!("return FileErrNotAFile");
        return vec![ProcessPathResult::FileErrNotAFile(path.clone())];
    }

    let mut results: ProcessPathResults = ProcessPathResults::new();
    defo!("WalkDir({:?})…", path);
    for entry in walkdir::WalkDir::new(path.as_str())
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let path_entry = match entry {
            Ok(val) => val,
            Err(_err) => {
                defo!("Err({:?})", _err);
                continue;
            }
        };
        let fpath_entry: FPath = path_to_fpath(path_entry.path());
        let filetype: FileType = match path_entry.file_name().to_str() {
            Some(name) => filename_to_filetype(name),
            None => FileType::Unknown,
        };
        if filetype == FileType::Unknown {
            defo!("ignore {:?}", fpath_entry);
            continue;
        }
        if !path_entry.file_type().is_file() {
            defo!("Path not a file {:?}", fpath_entry);
            results.push(ProcessPathResult::FileErrNotAFile(fpath_entry));
            continue;
        }
        defo!("push {:?} {:?}", fpath_entry, filetype);
        results.push(filetype_to_result(fpath_entry, filetype));
    }
    defx!("return {:?}", results);

    results
}

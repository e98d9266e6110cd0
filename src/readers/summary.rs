// src/readers/summary.rs

//! Implements `Summary` statistics tracking struct.

#![allow(non_snake_case)]

use crate::common::{
    Count,
    FPath,
    FileType,
};
use crate::readers::blockreader::{
    BLOCKSZ_MAX,
    BLOCKSZ_MIN,
    SummaryBlockReader,
};
use crate::readers::indexedtablereader::SummaryIndexedTableReader;
use crate::readers::sequentialscanner::SummarySequentialLogScanner;

use std::fmt;

use ::more_asserts::{debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Summary
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// wrapper for the `Summary*` data types of the readers of different
/// login accounting files.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub enum SummaryReaderData {
    /// Unset. Useful for stand-in value where nothing actually occurred; e.g.
    /// files without adequate read permissions.
    #[default]
    Dummy,
    /// For a [`SequentialLogScanner`] and underlying `BlockReader`.
    ///
    /// [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
    SequentialLog((SummaryBlockReader, SummarySequentialLogScanner)),
    /// For an [`IndexedTableReader`] and the count of principals in the
    /// principal directory.
    ///
    /// [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader
    IndexedTable((SummaryIndexedTableReader, Count)),
}

impl SummaryReaderData {
    pub fn is_dummy(&self) -> bool {
        matches!(self, SummaryReaderData::Dummy)
    }
}

/// Accumulated statistics about processing activity of a single file.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// the `FPath` of the processed file
    pub path: FPath,
    /// the `FileType` of the processed file
    pub filetype: FileType,
    /// Data specific to the particular readers.
    pub readerdata: SummaryReaderData,
    /// `LoginEvent`s produced
    pub events: Count,
    /// The first encountered [`Error`], if any, as a `String`.
    ///
    /// Annoyingly, cannot [Clone or Copy `Error`].
    ///
    /// [`Error`]: std::io::Error
    /// [Clone or Copy `Error`]: https://github.com/rust-lang/rust/issues/24135
    pub error: Option<String>,
}

impl Summary {
    /// Create a new `Summary` for a sequential log.
    pub fn new_sequential(
        path: FPath,
        filetype: FileType,
        summaryblockreader: SummaryBlockReader,
        summaryscanner: SummarySequentialLogScanner,
        error: Option<String>,
    ) -> Summary {
        // some sanity checks
        debug_assert_ge!(summaryblockreader.BlockReader_bytes, summaryblockreader.BlockReader_blocks, "There is less bytes than Blocks");
        debug_assert_ge!(summaryblockreader.BlockReader_blocksz, BLOCKSZ_MIN, "blocksz too small");
        debug_assert_le!(summaryblockreader.BlockReader_blocksz, BLOCKSZ_MAX, "blocksz too big");
        debug_assert_ge!(
            summaryscanner.SequentialLogScanner_records,
            summaryscanner.SequentialLogScanner_events,
            "There is less records than events"
        );
        let events: Count = summaryscanner.SequentialLogScanner_events;

        Summary {
            path,
            filetype,
            readerdata: SummaryReaderData::SequentialLog((summaryblockreader, summaryscanner)),
            events,
            error,
        }
    }

    /// Create a new `Summary` for an indexed table.
    pub fn new_indexed(
        path: FPath,
        filetype: FileType,
        summaryreader: SummaryIndexedTableReader,
        principals: Count,
        events: Count,
    ) -> Summary {
        Summary {
            path,
            filetype,
            readerdata: SummaryReaderData::IndexedTable((summaryreader, principals)),
            events,
            error: None,
        }
    }

    /// Count of bytes read from the source; uncompressed bytes for a gzip
    /// file.
    pub fn bytes(&self) -> Count {
        match &self.readerdata {
            SummaryReaderData::SequentialLog((summaryblockreader, _)) => {
                summaryblockreader.BlockReader_bytes
            }
            SummaryReaderData::IndexedTable((summaryreader, _)) => {
                summaryreader.IndexedTableReader_filesz
            }
            SummaryReaderData::Dummy => 0,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: ", self.path)?;
        match &self.readerdata {
            SummaryReaderData::SequentialLog((summaryblockreader, summaryscanner)) => {
                write!(
                    f,
                    "bytes {}, blocks {}, records {}, events {}, records skipped {}, trailing bytes discarded {}",
                    summaryblockreader.BlockReader_bytes,
                    summaryblockreader.BlockReader_blocks,
                    summaryscanner.SequentialLogScanner_records,
                    summaryscanner.SequentialLogScanner_events,
                    summaryscanner.SequentialLogScanner_records_skipped,
                    summaryscanner.SequentialLogScanner_bytes_discarded,
                )?;
            }
            SummaryReaderData::IndexedTable((summaryreader, principals)) => {
                write!(
                    f,
                    "bytes {}, principals {}, records found {}, principals absent {}, errors {}",
                    summaryreader.IndexedTableReader_filesz,
                    principals,
                    summaryreader.IndexedTableReader_found,
                    summaryreader.IndexedTableReader_absent,
                    summaryreader.IndexedTableReader_errors,
                )?;
            }
            SummaryReaderData::Dummy => {
                write!(f, "not processed")?;
            }
        }
        if let Some(error) = &self.error {
            write!(f, "; error {}", error)?;
        }

        Ok(())
    }
}

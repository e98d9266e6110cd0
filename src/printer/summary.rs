// src/printer/summary.rs

//! CLI option `--summary` printing functions.
//! Only used by `lrr.rs`.

use crate::common::Count;
use crate::readers::batchprocessor::{FileProcessingResult, MapPathResult};

use std::io::{Result, Write};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Totals over all files of a [`MapPathResult`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SummaryTotals {
    pub files: Count,
    pub files_ok: Count,
    pub files_empty: Count,
    pub files_err: Count,
    pub events: Count,
}

/// Tally `results`.
pub fn summary_totals(results: &MapPathResult) -> SummaryTotals {
    let mut totals = SummaryTotals::default();
    for result in results.values() {
        totals.files += 1;
        match result {
            FileProcessingResult::FileOk(summary) => {
                totals.files_ok += 1;
                totals.events += summary.events;
            }
            FileProcessingResult::FileErrEmpty => totals.files_empty += 1,
            FileProcessingResult::FileErrIo(_)
            | FileProcessingResult::FileErrNotSupported => totals.files_err += 1,
        }
    }

    totals
}

/// Write one line per file then a line of totals.
pub fn print_summary<W: Write>(
    writer: &mut W,
    results: &MapPathResult,
) -> Result<()> {
    defn!("({} results)", results.len());
    writeln!(writer, "Files:")?;
    for (path, result) in results.iter() {
        match result {
            // `Summary` displays its own path
            FileProcessingResult::FileOk(summary) => writeln!(writer, "  {}", summary)?,
            _ => writeln!(writer, "  {:?}: {}", path, result)?,
        }
    }
    let totals = summary_totals(results);
    writeln!(
        writer,
        "Totals: files {}, ok {}, empty {}, failed {}, events {}",
        totals.files, totals.files_ok, totals.files_empty, totals.files_err, totals.events,
    )?;
    defx!();

    writer.flush()
}

// src/printer/csvsink.rs

//! The [`TabularSink`] trait, the receiver of decoded [`LoginEvent`]s as
//! rows of text, and [`CsvSink`], which writes the rows as CSV.
//!
//! [`LoginEvent`]: crate::data::loginevent::LoginEvent

use crate::common::{Count, LoginFileKind};
use crate::data::datetime::TimeNormalizer;
use crate::data::loginevent::LoginEvent;

use std::io::{Error, ErrorKind, Result, Write};

#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// Column names of a sequential log, after the timestamp column.
pub const COLUMNS_SEQUENTIAL_LOG: &[&str] = &[
    "Username",
    "SessionID",
    "Terminal",
    "Host",
    "IP Address",
    "PID",
    "Type",
    "Exit Status",
    "Session",
];

/// Column names of an indexed table, before the last login column.
pub const COLUMNS_INDEXED_TABLE: &[&str] = &[
    "Username",
    "Terminal",
    "Host",
];

/// Label of the last login column of an indexed table; the offset is
/// appended, e.g. `"Last Login (UTC+08:00)"`.
pub const COLUMN_LAST_LOGIN: &str = "Last Login";

/// The header row for a `kind` of file. The timestamp column name includes
/// the offset of `normalizer`.
pub fn columns(kind: LoginFileKind, normalizer: &TimeNormalizer) -> Vec<String> {
    match kind {
        LoginFileKind::SequentialLog => {
            let mut columns: Vec<String> = Vec::with_capacity(COLUMNS_SEQUENTIAL_LOG.len() + 1);
            columns.push(normalizer.column_name());
            columns.extend(COLUMNS_SEQUENTIAL_LOG.iter().map(|s| String::from(*s)));
            columns
        }
        LoginFileKind::IndexedTable => {
            let mut columns: Vec<String> = Vec::with_capacity(COLUMNS_INDEXED_TABLE.len() + 1);
            columns.extend(COLUMNS_INDEXED_TABLE.iter().map(|s| String::from(*s)));
            columns.push(normalizer.column_name_of(COLUMN_LAST_LOGIN));
            columns
        }
    }
}

/// The row of `event` matching [`columns`] for `kind`.
pub fn event_to_row(event: &LoginEvent, kind: LoginFileKind) -> Vec<String> {
    match kind {
        LoginFileKind::SequentialLog => vec![
            event.normalized_timestamp.clone(),
            event.username.clone(),
            event.session_tag.clone(),
            event.terminal.clone(),
            event.host.clone(),
            event.ip_address_string(),
            event.process_id.to_string(),
            event.event_type.to_string(),
            event.exit_status.to_string(),
            event.session_number.to_string(),
        ],
        LoginFileKind::IndexedTable => vec![
            event.username.clone(),
            event.terminal.clone(),
            event.host.clone(),
            event.normalized_timestamp.clone(),
        ],
    }
}

/// Receiver of rows of text; the first row is the header.
pub trait TabularSink {
    fn write_header(&mut self, columns: &[String]) -> Result<()>;

    fn write_row(&mut self, row: &[String]) -> Result<()>;

    /// Flush any buffered rows. No more rows may be written.
    fn finish(&mut self) -> Result<()>;

    /// Count of rows written, excluding the header.
    fn count_rows(&self) -> Count;
}

/// [`TabularSink`] writing [RFC 4180] CSV to any `Write` using a
/// [`csv::Writer`]; CRLF line ends, fields quoted only when necessary.
///
/// [RFC 4180]: https://www.rfc-editor.org/rfc/rfc4180
/// [`csv::Writer`]: https://docs.rs/csv/1/csv/struct.Writer.html
pub struct CsvSink<W: Write> {
    writer: ::csv::Writer<W>,
    /// number of columns of the header
    columns: usize,
    header_written: bool,
    rows: Count,
    finished: bool,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> CsvSink<W> {
        let writer = ::csv::WriterBuilder::new()
            .terminator(::csv::Terminator::CRLF)
            .quote_style(::csv::QuoteStyle::Necessary)
            .from_writer(writer);

        CsvSink {
            writer,
            columns: 0,
            header_written: false,
            rows: 0,
            finished: false,
        }
    }

    /// Finish then return the inner writer.
    pub fn into_inner(mut self) -> Result<W> {
        self.finish()?;
        self.writer
            .into_inner()
            .map_err(|err| Error::new(err.error().kind(), err.error().to_string()))
    }
}

impl<W: Write> TabularSink for CsvSink<W> {
    fn write_header(&mut self, columns: &[String]) -> Result<()> {
        defñ!("({:?})", columns);
        if self.header_written || self.finished {
            return Err(Error::new(ErrorKind::Other, "CSV header already written"));
        }
        self.writer.write_record(columns)?;
        self.columns = columns.len();
        self.header_written = true;

        Ok(())
    }

    fn write_row(&mut self, row: &[String]) -> Result<()> {
        if !self.header_written || self.finished {
            return Err(Error::new(ErrorKind::Other, "CSV row written before header or after finish"));
        }
        if row.len() != self.columns {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("CSV row has {} fields, header has {}", row.len(), self.columns),
            ));
        }
        self.writer.write_record(row)?;
        self.rows += 1;

        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.finished = true;

        self.writer.flush()
    }

    fn count_rows(&self) -> Count {
        self.rows
    }
}

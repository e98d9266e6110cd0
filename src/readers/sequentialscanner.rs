// src/readers/sequentialscanner.rs

//! Implements a [`SequentialLogScanner`], the driver of deriving
//! [`LoginEvent`s] from an append-only sequential session log using a
//! [`BlockReader`].
//!
//! [`LoginEvent`s]: crate::data::loginevent::LoginEvent
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{
    Bytes,
    Count,
    FPath,
    FileOffset,
    FileType,
    LoginFileKind,
    ResultS3,
};
use crate::data::datetime::TimeNormalizer;
use crate::data::layout::{
    RawRecord,
    RecordLayout,
    UTMPX_LAYOUT,
};
use crate::data::loginevent::{LoginEvent, RecordDecoder};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, e_err, e_wrn};
use crate::readers::blockreader::{
    BlockReader,
    BlockSz,
    ResultS3ReadBlock,
    SummaryBlockReader,
};

use std::fmt;
use std::io::{Error, ErrorKind, Result};

#[allow(unused_imports)]
use ::more_asserts::{debug_assert_ge, debug_assert_le, debug_assert_lt};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// SequentialLogScanner
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A typed [`ResultS3`] for function [`SequentialLogScanner::next_record`].
pub type ResultS3RawRecord = ResultS3<RawRecord, Error>;

/// A typed [`ResultS3`] for function [`SequentialLogScanner::next_event`].
pub type ResultS3LoginEvent = ResultS3<LoginEvent, Error>;

/// A `SequentialLogScanner` streams fixed-size records from a sequential
/// session log (`wtmp`, `utmp`, `btmp`), plain or gzip compressed.
///
/// Bytes are read in `Block`s by a [`BlockReader`] and accumulated; whenever
/// at least one record's worth of bytes is buffered exactly one
/// [`RawRecord`] is sliced off. Records are returned in file order.
///
/// At the end of the source, fewer than `record_size` leftover bytes are a
/// truncated final record. They are discarded and counted, not returned as an
/// error.
///
/// Single-pass and forward-only; not restartable.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`Read`]: std::io::Read
pub struct SequentialLogScanner {
    blockreader: BlockReader,
    layout: &'static RecordLayout,
    decoder: RecordDecoder,
    /// bytes read but not yet returned as a `RawRecord`
    pending: Bytes,
    /// index into `pending` of the first byte not yet returned
    pending_at: usize,
    /// `FileOffset` of the next record
    fileoffset_next: FileOffset,
    /// index of the next record
    index_next: Count,
    /// the `BlockReader` returned `Done` or `Err`
    source_done: bool,
    /// `Count` of records returned by `next_record`
    records_read: Count,
    /// `Count` of records returned by `next_event`
    events_decoded: Count,
    /// `Count` of records that failed to decode and were skipped
    records_skipped: Count,
    /// trailing bytes of a truncated final record
    bytes_discarded: Count,
    /// first `Error` from the source, as a `String`
    error: Option<String>,
}

impl fmt::Debug for SequentialLogScanner {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("SequentialLogScanner")
            .field("path", self.path())
            .field("layout", &self.layout.name)
            .field("fileoffset_next", &self.fileoffset_next)
            .field("index_next", &self.index_next)
            .field("pending", &(self.pending.len() - self.pending_at))
            .field("records_read", &self.records_read)
            .field("records_skipped", &self.records_skipped)
            .field("bytes_discarded", &self.bytes_discarded)
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummarySequentialLogScanner {
    /// records sliced from the source
    pub SequentialLogScanner_records: Count,
    /// records decoded to a `LoginEvent`
    pub SequentialLogScanner_events: Count,
    /// records that failed to decode
    pub SequentialLogScanner_records_skipped: Count,
    /// leftover bytes of a truncated final record
    pub SequentialLogScanner_bytes_discarded: Count,
}

impl SequentialLogScanner {
    /// Create a new `SequentialLogScanner` for the file at `path`.
    ///
    /// `filetype` must be a supported sequential log.
    pub fn new(
        path: FPath,
        filetype: FileType,
        blocksz: BlockSz,
        normalizer: TimeNormalizer,
    ) -> Result<SequentialLogScanner> {
        defn!("({:?}, {:?}, {:?}, {:?})", path, filetype, blocksz, normalizer);
        if filetype.kind() != Some(LoginFileKind::SequentialLog) {
            defx!("return Err(InvalidInput)");
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("{:?} is not a sequential log type, {:?}", path, filetype),
            ));
        }
        let blockreader = BlockReader::new(path, filetype, blocksz)?;
        let scanner = SequentialLogScanner::from_blockreader(blockreader, normalizer);
        defx!("return Ok({:?})", scanner);

        Ok(scanner)
    }

    /// Create a new `SequentialLogScanner` reading from `blockreader`.
    pub fn from_blockreader(
        blockreader: BlockReader,
        normalizer: TimeNormalizer,
    ) -> SequentialLogScanner {
        let layout: &'static RecordLayout = &UTMPX_LAYOUT;
        let capacity: usize = blockreader.blocksz() as usize + layout.record_size;

        SequentialLogScanner {
            blockreader,
            layout,
            decoder: RecordDecoder::new(normalizer),
            pending: Bytes::with_capacity(capacity),
            pending_at: 0,
            fileoffset_next: 0,
            index_next: 0,
            source_done: false,
            records_read: 0,
            events_decoded: 0,
            records_skipped: 0,
            bytes_discarded: 0,
            error: None,
        }
    }

    pub fn path(&self) -> &FPath {
        self.blockreader.path()
    }

    pub const fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    pub const fn normalizer(&self) -> &TimeNormalizer {
        self.decoder.normalizer()
    }

    pub const fn count_records(&self) -> Count {
        self.records_read
    }

    pub const fn count_records_skipped(&self) -> Count {
        self.records_skipped
    }

    pub const fn count_bytes_discarded(&self) -> Count {
        self.bytes_discarded
    }

    /// First error from the source, if any.
    pub fn error(&self) -> Option<&String> {
        self.error.as_ref()
    }

    /// Bytes buffered but not yet sliced into a record.
    fn pending_len(&self) -> usize {
        self.pending.len() - self.pending_at
    }

    /// Move unreturned bytes to the front of `pending` then append `block`.
    fn pending_append(&mut self, block: &[u8]) {
        if self.pending_at != 0 {
            self.pending.drain(..self.pending_at);
            self.pending_at = 0;
        }
        self.pending.extend_from_slice(block);
    }

    /// Return the next [`RawRecord`] in file order.
    ///
    /// Returns `Done` at the end of the source; a truncated final record is
    /// discarded. Returns `Err` for an I/O error of the source, after which
    /// the scan is over.
    pub fn next_record(&mut self) -> ResultS3RawRecord {
        defn!("({:?}) index_next {}", self.path(), self.index_next);
        let record_size: usize = self.layout.record_size;
        loop {
            if self.pending_len() >= record_size {
                let at: usize = self.pending_at;
                let buffer: Bytes = self.pending[at..at + record_size].to_vec();
                self.pending_at += record_size;
                // `buffer` is exactly `record_size` so this does not fail
                let raw = match RawRecord::new(
                    buffer,
                    self.fileoffset_next,
                    self.index_next,
                    self.layout,
                ) {
                    Ok(raw) => raw,
                    Err(err) => {
                        defx!("return Err({})", err);
                        return ResultS3RawRecord::Err(err);
                    }
                };
                self.fileoffset_next += self.layout.record_size_fo();
                self.index_next += 1;
                self.records_read += 1;
                defx!("return Found({:?})", raw);
                return ResultS3RawRecord::Found(raw);
            }
            if self.source_done {
                let leftover: usize = self.pending_len();
                if leftover != 0 {
                    debug_assert_lt!(leftover, record_size);
                    de_wrn!(
                        "discard {} trailing bytes at offset {} of {:?}",
                        leftover, self.fileoffset_next, self.path()
                    );
                    self.bytes_discarded += leftover as Count;
                    self.pending.clear();
                    self.pending_at = 0;
                }
                defx!("return Done");
                return ResultS3RawRecord::Done;
            }
            match self.blockreader.read_block() {
                ResultS3ReadBlock::Found(block) => {
                    defo!("read_block() Found {} bytes", block.len());
                    self.pending_append(&block);
                }
                ResultS3ReadBlock::Done => {
                    defo!("read_block() Done");
                    self.source_done = true;
                }
                ResultS3ReadBlock::Err(err) => {
                    self.source_done = true;
                    if self.error.is_none() {
                        self.error = Some(err.to_string());
                    }
                    defx!("return Err({})", err);
                    return ResultS3RawRecord::Err(err);
                }
            }
        }
    }

    /// Decode `raw` with the layout of this scanner.
    ///
    /// A record that fails to decode, i.e. a `raw` of some other layout, is
    /// counted as skipped and `None` is returned.
    pub fn decode_record(&mut self, raw: &RawRecord) -> Option<LoginEvent> {
        match self.decoder.decode(raw, self.layout) {
            Ok(event) => {
                self.events_decoded += 1;
                Some(event)
            }
            Err(_err) => {
                de_wrn!("skip record {} at offset {}: {}", raw.index(), raw.fileoffset(), _err);
                self.records_skipped += 1;
                None
            }
        }
    }

    /// Return the next decoded [`LoginEvent`] in file order.
    ///
    /// A record that fails to decode is counted as skipped and the next
    /// record is tried.
    pub fn next_event(&mut self) -> ResultS3LoginEvent {
        loop {
            let raw: RawRecord = match self.next_record() {
                ResultS3RawRecord::Found(raw) => raw,
                ResultS3RawRecord::Done => return ResultS3LoginEvent::Done,
                ResultS3RawRecord::Err(err) => return ResultS3LoginEvent::Err(err),
            };
            if let Some(event) = self.decode_record(&raw) {
                return ResultS3LoginEvent::Found(event);
            }
        }
    }

    pub fn summary(&self) -> SummarySequentialLogScanner {
        SummarySequentialLogScanner {
            SequentialLogScanner_records: self.records_read,
            SequentialLogScanner_events: self.events_decoded,
            SequentialLogScanner_records_skipped: self.records_skipped,
            SequentialLogScanner_bytes_discarded: self.bytes_discarded,
        }
    }

    pub fn summary_blockreader(&self) -> SummaryBlockReader {
        self.blockreader.summary()
    }
}

// src/readers/indexedtablereader.rs

//! Implements an [`IndexedTableReader`], the driver of deriving
//! [`LoginEvent`s] from an indexed table (`lastlog`) by principal id.
//!
//! [`LoginEvent`s]: crate::data::loginevent::LoginEvent

use crate::common::{
    Count,
    FPath,
    File,
    FileOffset,
    FileOpenOptions,
    FileSz,
    ResultS3,
};
use crate::data::datetime::TimeNormalizer;
use crate::data::layout::{
    RawRecord,
    RecordLayout,
    LASTLOG_LAYOUT,
};
use crate::data::loginevent::{LoginEvent, RecordDecoder};
use crate::data::principal::{PrincipalDirectory, PrincipalId};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, e_err, e_wrn};
use crate::debug_panic;

use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::sync::atomic::{AtomicU64, Ordering};

use ::cfg_if::cfg_if;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

cfg_if! {
    if #[cfg(unix)] {
        use std::os::unix::fs::FileExt;

        /// Read at `offset` without moving a shared cursor.
        fn read_at(file: &File, buffer: &mut [u8], offset: FileOffset) -> Result<usize> {
            file.read_at(buffer, offset)
        }
    } else if #[cfg(windows)] {
        use std::os::windows::fs::FileExt;

        /// Read at `offset`. On Windows this moves the file cursor, which
        /// no other `IndexedTableReader` function depends on.
        fn read_at(file: &File, buffer: &mut [u8], offset: FileOffset) -> Result<usize> {
            file.seek_read(buffer, offset)
        }
    } else {
        fn read_at(_file: &File, _buffer: &mut [u8], _offset: FileOffset) -> Result<usize> {
            Err(Error::new(ErrorKind::Unsupported, "positioned reads are not supported on this platform"))
        }
    }
}

/// A typed [`ResultS3`] for function [`IndexedTableReader::read`].
pub type ResultS3IndexedRead = ResultS3<LoginEvent, Error>;

/// An `IndexedTableReader` reads the record of one principal id from an
/// indexed table (`lastlog`), where the record of id `n` is at byte offset
/// `n * record_size`.
///
/// Each `read` is a positioned read holding no cursor, so an
/// `IndexedTableReader` may be shared among threads and `read` called
/// concurrently.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`Read`]: std::io::Read
pub struct IndexedTableReader {
    path: FPath,
    file: File,
    /// file size at time of `new`
    filesz: FileSz,
    layout: &'static RecordLayout,
    decoder: RecordDecoder,
    /// `Count` of `read` that returned `Found`
    count_found: AtomicU64,
    /// `Count` of `read` that returned `Done`
    count_absent: AtomicU64,
    /// `Count` of `read` that returned `Err`
    count_errors: AtomicU64,
}

impl fmt::Debug for IndexedTableReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("IndexedTableReader")
            .field("path", &self.path)
            .field("filesz", &self.filesz)
            .field("layout", &self.layout.name)
            .field("found", &self.count_found.load(Ordering::Relaxed))
            .field("absent", &self.count_absent.load(Ordering::Relaxed))
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryIndexedTableReader {
    pub IndexedTableReader_filesz: FileSz,
    /// records found and decoded
    pub IndexedTableReader_found: Count,
    /// principal ids without a record
    pub IndexedTableReader_absent: Count,
    pub IndexedTableReader_errors: Count,
}

impl IndexedTableReader {
    /// Open the indexed table at `path`.
    pub fn new(
        path: FPath,
        normalizer: TimeNormalizer,
    ) -> Result<IndexedTableReader> {
        defn!("({:?}, {:?})", path, normalizer);
        let file: File = match FileOpenOptions::new()
            .read(true)
            .open(&path)
        {
            Ok(val) => val,
            Err(err) => {
                defx!("return {:?}", err);
                return Err(Error::new(err.kind(), format!("{} for {:?}", err, path)));
            }
        };
        let metadata = match file.metadata() {
            Ok(val) => val,
            Err(err) => {
                defx!("return {:?}", err);
                return Err(Error::new(err.kind(), format!("{} for {:?}", err, path)));
            }
        };
        if metadata.is_dir() {
            defx!("return Err(Unsupported)");
            return Err(Error::new(
                ErrorKind::Unsupported,
                format!("Path is a directory {:?}", path),
            ));
        }
        let reader = IndexedTableReader {
            path,
            file,
            filesz: metadata.len() as FileSz,
            layout: &LASTLOG_LAYOUT,
            decoder: RecordDecoder::new(normalizer),
            count_found: AtomicU64::new(0),
            count_absent: AtomicU64::new(0),
            count_errors: AtomicU64::new(0),
        };
        defx!("return Ok({:?})", reader);

        Ok(reader)
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    pub const fn filesz(&self) -> FileSz {
        self.filesz
    }

    pub const fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// Byte offset of the record of `principal_id`, `None` on overflow.
    pub fn offset_of(&self, principal_id: PrincipalId) -> Option<FileOffset> {
        (principal_id as FileOffset).checked_mul(self.layout.record_size_fo())
    }

    /// Read and decode the record of `principal_id`.
    ///
    /// Returns `Done` if the table has no complete record for the id, i.e.
    /// the record offset is at or beyond the end of the file or fewer than
    /// `record_size` bytes remain.
    pub fn read(&self, principal_id: PrincipalId) -> ResultS3IndexedRead {
        defn!("({})", principal_id);
        let offset: FileOffset = match self.offset_of(principal_id) {
            Some(offset) => offset,
            None => {
                self.count_absent.fetch_add(1, Ordering::Relaxed);
                defx!("offset overflow; return Done");
                return ResultS3IndexedRead::Done;
            }
        };
        let record_size: usize = self.layout.record_size;
        let mut buffer: Vec<u8> = vec![0; record_size];
        let mut filled: usize = 0;
        while filled < record_size {
            match read_at(&self.file, &mut buffer[filled..], offset + filled as FileOffset) {
                Ok(0) => break,
                Ok(size_) => filled += size_,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.count_errors.fetch_add(1, Ordering::Relaxed);
                    defx!("return Err({})", err);
                    return ResultS3IndexedRead::Err(Error::new(
                        err.kind(),
                        format!("{} reading id {} at offset {} of {:?}", err, principal_id, offset, self.path),
                    ));
                }
            }
        }
        if filled < record_size {
            self.count_absent.fetch_add(1, Ordering::Relaxed);
            defx!("read {} of {} bytes; return Done", filled, record_size);
            return ResultS3IndexedRead::Done;
        }
        let raw: RawRecord = match RawRecord::new(buffer, offset, principal_id as Count, self.layout) {
            Ok(raw) => raw,
            Err(err) => {
                self.count_errors.fetch_add(1, Ordering::Relaxed);
                defx!("return Err({})", err);
                return ResultS3IndexedRead::Err(err);
            }
        };
        let mut event: LoginEvent = match self.decoder.decode(&raw, self.layout) {
            Ok(event) => event,
            Err(err) => {
                self.count_errors.fetch_add(1, Ordering::Relaxed);
                defx!("return Err({})", err);
                return ResultS3IndexedRead::Err(err);
            }
        };
        event.principal_id = Some(principal_id);
        self.count_found.fetch_add(1, Ordering::Relaxed);
        defx!("return Found({:?})", event);

        ResultS3IndexedRead::Found(event)
    }

    /// Read the record of `principal_id` and set the `username` from
    /// `directory`. A principal without a name gets the decimal id.
    fn read_named(
        &self,
        principal_id: PrincipalId,
        directory: &dyn PrincipalDirectory,
    ) -> Option<LoginEvent> {
        match self.read(principal_id) {
            ResultS3IndexedRead::Found(mut event) => {
                event.username = match directory.name(principal_id) {
                    Some(name) => String::from(name),
                    None => principal_id.to_string(),
                };
                Some(event)
            }
            ResultS3IndexedRead::Done => None,
            ResultS3IndexedRead::Err(err) => {
                e_err!("{}", err);
                None
            }
        }
    }

    /// Read the record of every principal in `directory`, in ascending id
    /// order. Principals without a record are omitted.
    pub fn read_directory(&self, directory: &dyn PrincipalDirectory) -> Vec<LoginEvent> {
        defn!("({:?})", self.path);
        let events: Vec<LoginEvent> = directory
            .ids()
            .into_iter()
            .filter_map(|id| self.read_named(id, directory))
            .collect();
        defx!("return {} events", events.len());

        events
    }

    /// Like [`read_directory`] but ids are divided among at most `threads`
    /// scoped worker threads. Results are in ascending id order, the same as
    /// `read_directory`.
    ///
    /// [`read_directory`]: IndexedTableReader::read_directory
    pub fn read_directory_parallel(
        &self,
        directory: &dyn PrincipalDirectory,
        threads: usize,
    ) -> Vec<LoginEvent> {
        defn!("({:?}, threads {})", self.path, threads);
        let ids: Vec<PrincipalId> = directory.ids();
        if ids.is_empty() {
            defx!("no ids; return empty");
            return Vec::new();
        }
        let threads: usize = threads.clamp(1, ids.len());
        // contiguous chunks so concatenating results in spawn order keeps id
        // order
        let chunk_len: usize = (ids.len() + threads - 1) / threads;
        defo!("{} ids, {} threads, chunk_len {}", ids.len(), threads, chunk_len);
        let mut events: Vec<LoginEvent> = Vec::with_capacity(ids.len());
        std::thread::scope(|scope| {
            let handles: Vec<_> = ids
                .chunks(chunk_len)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .filter_map(|id| self.read_named(*id, directory))
                            .collect::<Vec<LoginEvent>>()
                    })
                })
                .collect();
            for handle in handles.into_iter() {
                match handle.join() {
                    Ok(chunk_events) => events.extend(chunk_events),
                    Err(_err) => {
                        debug_panic!("read_directory_parallel worker thread panicked {:?}", _err);
                    }
                }
            }
        });
        defx!("return {} events", events.len());

        events
    }

    pub fn summary(&self) -> SummaryIndexedTableReader {
        SummaryIndexedTableReader {
            IndexedTableReader_filesz: self.filesz,
            IndexedTableReader_found: self.count_found.load(Ordering::Relaxed),
            IndexedTableReader_absent: self.count_absent.load(Ordering::Relaxed),
            IndexedTableReader_errors: self.count_errors.load(Ordering::Relaxed),
        }
    }
}

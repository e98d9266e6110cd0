// src/readers/batchprocessor.rs

//! Implements a [`BatchProcessor`], the driver of processing many login
//! accounting files at once, one thread per file.
//!
//! Each file processing thread owns its own [`SequentialLogScanner`] or
//! [`IndexedTableReader`] and sends [`ChanDatum`]s through a
//! [channel] to the calling thread, which writes each file's rows to the
//! [`TabularSink`] created for that file. A file that fails ends only its own
//! thread; other files continue.
//!
//! [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
//! [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader
//! [`TabularSink`]: crate::printer::csvsink::TabularSink
//! [channel]: https://docs.rs/crossbeam-channel/0.5/crossbeam_channel/

use crate::common::{
    Count,
    FPath,
    FileType,
    LoginFileKind,
};
use crate::data::datetime::TimeNormalizer;
use crate::data::loginevent::LoginEvent;
use crate::data::principal::PrincipalDirectory;
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, e_err, e_wrn};
use crate::debug_panic;
use crate::printer::csvsink::{columns, event_to_row, TabularSink};
use crate::readers::blockreader::{BlockSz, BLOCKSZ_DEF};
use crate::readers::helpers::basename;
use crate::readers::indexedtablereader::IndexedTableReader;
use crate::readers::sequentialscanner::{ResultS3LoginEvent, SequentialLogScanner};
use crate::readers::summary::Summary;

use std::collections::BTreeMap;
use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use ::crossbeam_channel;
#[allow(unused_imports)]
use ::si_trace_print::{def1n, def1o, def1x, def1ñ, defn, defo, defx, defñ};

/// Per-file outcome of a [`BatchProcessor`].
#[derive(Debug)]
pub enum FileProcessingResult {
    /// File was processed; all rows were written.
    FileOk(Summary),
    /// File has no bytes; a header was written and no rows.
    FileErrEmpty,
    /// File could not be opened or read, or its rows could not be written.
    /// Rows already written remain written.
    FileErrIo(Error),
    /// File type is recognized but cannot be processed, e.g. a gzip
    /// compressed indexed table.
    FileErrNotSupported,
}

impl FileProcessingResult {
    /// Was the file processed without failure? An empty file is not a
    /// failure.
    pub const fn is_ok(&self) -> bool {
        matches!(self, FileProcessingResult::FileOk(_) | FileProcessingResult::FileErrEmpty)
    }

    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn summary(&self) -> Option<&Summary> {
        match self {
            FileProcessingResult::FileOk(summary) => Some(summary),
            _ => None,
        }
    }
}

impl fmt::Display for FileProcessingResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FileProcessingResult::FileOk(summary) => write!(f, "OK {}", summary),
            FileProcessingResult::FileErrEmpty => write!(f, "empty file"),
            FileProcessingResult::FileErrIo(err) => write!(f, "error {}", err),
            FileProcessingResult::FileErrNotSupported => write!(f, "file type not supported"),
        }
    }
}

/// Results of a [`BatchProcessor`] keyed by file path.
pub type MapPathResult = BTreeMap<FPath, FileProcessingResult>;

/// Index of a source within one call to [`BatchProcessor::process`].
pub type PathId = usize;

/// Maximum `LoginEvent`s sent in one [`ChanDatum::NewEvents`].
pub const EVENTS_PER_DATUM: usize = 1024;

/// Capacity of the channel shared by all file processing threads.
const CHANNEL_CAPACITY: usize = 64;

/// Default worker threads for reading one indexed table.
pub const INDEXED_TABLE_THREADS_DEFAULT: usize = 4;

/// A single datum sent from a file processing thread to the calling thread.
#[derive(Debug)]
pub enum ChanDatum {
    /// first datum sent by a thread that opened its file;
    /// at most one per thread.
    FileInfo(LoginFileKind),
    /// decoded `LoginEvent`s in file order;
    /// zero or more per thread.
    NewEvents(Vec<LoginEvent>),
    /// last datum sent by a thread; exactly one per thread.
    FileResult(FileProcessingResult),
}

impl fmt::Display for ChanDatum {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChanDatum::FileInfo(kind) => write!(f, "FileInfo({})", kind),
            ChanDatum::NewEvents(events) => write!(f, "NewEvents(len {})", events.len()),
            ChanDatum::FileResult(result) => write!(f, "FileResult({})", result),
        }
    }
}

/// Sender channel (used by each file processing thread).
type ChanSendDatum = crossbeam_channel::Sender<(PathId, ChanDatum)>;

/// Receiver channel (used by the calling thread).
type ChanRecvDatum = crossbeam_channel::Receiver<(PathId, ChanDatum)>;

/// Helper to send a [`ChanDatum`] to the calling thread and print an error
/// if there was an error sending.
#[inline(always)]
fn chan_send(
    chan_send_dt: &ChanSendDatum,
    pathid: PathId,
    chan_datum: ChanDatum,
    _path: &FPath,
) {
    def1ñ!("chan_send(…, {}, {}, {:?})", pathid, chan_datum, _path);
    match chan_send_dt.send((pathid, chan_datum)) {
        Ok(_) => {}
        Err(_err) => de_err!("chan_send_dt.send(…) failed {} for {:?}", _err, _path),
    }
}

/// Principal directory shared among file processing threads.
pub type PrincipalDirectoryP = Arc<dyn PrincipalDirectory + Send>;

/// Settings of a [`BatchProcessor`].
#[derive(Clone)]
pub struct BatchConfig {
    /// `Block` size for sequential logs
    pub blocksz: BlockSz,
    pub normalizer: TimeNormalizer,
    /// required to process an indexed table
    pub principals: Option<PrincipalDirectoryP>,
    /// worker threads for reading one indexed table
    pub indexed_table_threads: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            blocksz: BLOCKSZ_DEF as BlockSz,
            normalizer: TimeNormalizer::default(),
            principals: None,
            indexed_table_threads: INDEXED_TABLE_THREADS_DEFAULT,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("blocksz", &self.blocksz)
            .field("normalizer", &self.normalizer)
            .field("principals", &self.principals.as_ref().map(|p| p.ids().len()))
            .field("indexed_table_threads", &self.indexed_table_threads)
            .finish()
    }
}

/// Data passed to a file processing thread.
struct ThreadInitData {
    pathid: PathId,
    path: FPath,
    filetype: FileType,
    config: BatchConfig,
    cancel: Arc<AtomicBool>,
}

/// Processes many login accounting files concurrently.
#[derive(Debug)]
pub struct BatchProcessor {
    config: BatchConfig,
    /// set to stop all file processing threads early
    cancel: Arc<AtomicBool>,
}

/// Per-file state of the calling thread.
struct SinkState {
    kind: Option<LoginFileKind>,
    sink: Option<Box<dyn TabularSink>>,
    /// first error writing to the sink
    error: Option<Error>,
}

impl BatchProcessor {
    pub fn new(config: BatchConfig) -> BatchProcessor {
        BatchProcessor {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Flag that stops processing when set, e.g. by a signal handler.
    /// Files not yet finished end with `ErrorKind::Interrupted`.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.cancel.clone()
    }

    /// Process every file in `sources`, one thread per file.
    ///
    /// `sink_for` is called on the calling thread once per opened file to
    /// create the [`TabularSink`] receiving that file's header and rows.
    ///
    /// Returns the outcome of every file. Duplicate paths are processed once.
    pub fn process<F>(
        &self,
        sources: &[(FPath, FileType)],
        mut sink_for: F,
    ) -> MapPathResult
    where
        F: FnMut(&FPath, LoginFileKind) -> Result<Box<dyn TabularSink>>,
    {
        defn!("({} sources)", sources.len());
        let mut results = MapPathResult::new();
        let mut paths: Vec<FPath> = Vec::with_capacity(sources.len());
        let mut states: Vec<SinkState> = Vec::with_capacity(sources.len());
        let (chan_send_dt, chan_recv_dt): (ChanSendDatum, ChanRecvDatum) =
            crossbeam_channel::bounded(CHANNEL_CAPACITY);

        for (path, filetype) in sources.iter() {
            if paths.contains(path) {
                defo!("skip duplicate {:?}", path);
                continue;
            }
            if !filetype.is_supported() {
                defo!("not supported {:?} {:?}", path, filetype);
                results.insert(path.clone(), FileProcessingResult::FileErrNotSupported);
                continue;
            }
            let pathid: PathId = paths.len();
            let thread_data = ThreadInitData {
                pathid,
                path: path.clone(),
                filetype: *filetype,
                config: self.config.clone(),
                cancel: self.cancel.clone(),
            };
            let chan_send_dt_thread: ChanSendDatum = chan_send_dt.clone();
            let basename_: FPath = basename(path);
            match thread::Builder::new()
                .name(basename_.clone())
                .spawn(move || exec_fileprocessor_thread(chan_send_dt_thread, thread_data))
            {
                Ok(_joinhandle) => {
                    paths.push(path.clone());
                    states.push(SinkState { kind: None, sink: None, error: None });
                }
                Err(err) => {
                    e_err!("thread.name({:?}).spawn() failed {:?}", basename_, err);
                    results.insert(path.clone(), FileProcessingResult::FileErrIo(err));
                }
            }
        }
        // only the threads hold senders now; `recv` fails after the last
        // thread exits
        drop(chan_send_dt);

        let mut thread_results: BTreeMap<PathId, FileProcessingResult> = BTreeMap::new();
        while let Ok((pathid, chan_datum)) = chan_recv_dt.recv() {
            defo!("recv pathid {} {}", pathid, chan_datum);
            let (path, state) = match (paths.get(pathid), states.get_mut(pathid)) {
                (Some(path), Some(state)) => (path, state),
                _ => {
                    debug_panic!("bad pathid {}", pathid);
                    continue;
                }
            };
            match chan_datum {
                ChanDatum::FileInfo(kind) => {
                    state.kind = Some(kind);
                    match sink_for(path, kind) {
                        Ok(mut sink) => {
                            let header = columns(kind, &self.config.normalizer);
                            match sink.write_header(&header) {
                                Ok(_) => state.sink = Some(sink),
                                Err(err) => state.error = Some(err),
                            }
                        }
                        Err(err) => state.error = Some(err),
                    }
                }
                ChanDatum::NewEvents(events) => {
                    let kind: LoginFileKind = match state.kind {
                        Some(kind) => kind,
                        None => {
                            debug_panic!("NewEvents before FileInfo for {:?}", path);
                            continue;
                        }
                    };
                    if let Some(sink) = state.sink.as_mut() {
                        for event in events.iter() {
                            if let Err(err) = sink.write_row(&event_to_row(event, kind)) {
                                e_err!("write to sink for {:?} failed {}", path, err);
                                state.error = Some(err);
                                state.sink = None;
                                break;
                            }
                        }
                    }
                }
                ChanDatum::FileResult(result) => {
                    if let Some(mut sink) = state.sink.take() {
                        if let Err(err) = sink.finish() {
                            if state.error.is_none() {
                                state.error = Some(err);
                            }
                        }
                    }
                    thread_results.insert(pathid, result);
                }
            }
        }

        for (pathid, (path, state)) in paths.into_iter().zip(states.into_iter()).enumerate() {
            let result: FileProcessingResult = match (state.error, thread_results.remove(&pathid)) {
                // a sink error trumps the thread result
                (Some(err), _) => FileProcessingResult::FileErrIo(
                    Error::new(err.kind(), format!("{} writing rows of {:?}", err, path)),
                ),
                (None, Some(result)) => result,
                (None, None) => FileProcessingResult::FileErrIo(Error::new(
                    ErrorKind::Other,
                    format!("processing thread for {:?} ended without a result", path),
                )),
            };
            results.insert(path, result);
        }
        defx!("return {} results", results.len());

        results
    }
}

/// Send the events of `events` in chunks of at most [`EVENTS_PER_DATUM`].
fn send_events(
    chan_send_dt: &ChanSendDatum,
    pathid: PathId,
    events: Vec<LoginEvent>,
    path: &FPath,
) {
    let mut events = events;
    while events.len() > EVENTS_PER_DATUM {
        let rest: Vec<LoginEvent> = events.split_off(EVENTS_PER_DATUM);
        chan_send(chan_send_dt, pathid, ChanDatum::NewEvents(events), path);
        events = rest;
    }
    if !events.is_empty() {
        chan_send(chan_send_dt, pathid, ChanDatum::NewEvents(events), path);
    }
}

fn interrupted_error(path: &FPath) -> Error {
    Error::new(ErrorKind::Interrupted, format!("processing of {:?} was cancelled", path))
}

/// Thread entry point; processes one file and sends every [`ChanDatum`].
fn exec_fileprocessor_thread(
    chan_send_dt: ChanSendDatum,
    thread_data: ThreadInitData,
) {
    def1n!("({:?})", thread_data.path);
    let pathid: PathId = thread_data.pathid;
    let path: FPath = thread_data.path.clone();
    let result: FileProcessingResult = match thread_data.filetype.kind() {
        Some(LoginFileKind::SequentialLog) => exec_sequentialscanner(&chan_send_dt, &thread_data),
        Some(LoginFileKind::IndexedTable) => exec_indexedtablereader(&chan_send_dt, &thread_data),
        None => FileProcessingResult::FileErrNotSupported,
    };
    def1x!("({:?}) result {}", path, result);
    chan_send(&chan_send_dt, pathid, ChanDatum::FileResult(result), &path);
}

/// Scan a sequential log, sending `LoginEvent`s as they are decoded.
fn exec_sequentialscanner(
    chan_send_dt: &ChanSendDatum,
    thread_data: &ThreadInitData,
) -> FileProcessingResult {
    let path: &FPath = &thread_data.path;
    let pathid: PathId = thread_data.pathid;
    let mut scanner = match SequentialLogScanner::new(
        path.clone(),
        thread_data.filetype,
        thread_data.config.blocksz,
        thread_data.config.normalizer,
    ) {
        Ok(scanner) => scanner,
        Err(err) => {
            defo!("SequentialLogScanner::new({:?}) failed {}", path, err);
            return FileProcessingResult::FileErrIo(err);
        }
    };
    chan_send(chan_send_dt, pathid, ChanDatum::FileInfo(LoginFileKind::SequentialLog), path);

    let mut events: Vec<LoginEvent> = Vec::with_capacity(EVENTS_PER_DATUM);
    let mut error: Option<Error> = None;
    loop {
        if thread_data.cancel.load(Ordering::Relaxed) {
            error = Some(interrupted_error(path));
            break;
        }
        match scanner.next_event() {
            ResultS3LoginEvent::Found(event) => {
                events.push(event);
                if events.len() >= EVENTS_PER_DATUM {
                    let full = std::mem::replace(&mut events, Vec::with_capacity(EVENTS_PER_DATUM));
                    send_events(chan_send_dt, pathid, full, path);
                }
            }
            ResultS3LoginEvent::Done => break,
            ResultS3LoginEvent::Err(err) => {
                error = Some(err);
                break;
            }
        }
    }
    send_events(chan_send_dt, pathid, events, path);

    let summary = Summary::new_sequential(
        path.clone(),
        thread_data.filetype,
        scanner.summary_blockreader(),
        scanner.summary(),
        error.as_ref().map(|err| err.to_string()),
    );
    match error {
        Some(err) => FileProcessingResult::FileErrIo(err),
        None if summary.bytes() == 0 => FileProcessingResult::FileErrEmpty,
        None => FileProcessingResult::FileOk(summary),
    }
}

/// Read every principal of the principal directory from an indexed table.
fn exec_indexedtablereader(
    chan_send_dt: &ChanSendDatum,
    thread_data: &ThreadInitData,
) -> FileProcessingResult {
    let path: &FPath = &thread_data.path;
    let pathid: PathId = thread_data.pathid;
    let principals: &PrincipalDirectoryP = match thread_data.config.principals.as_ref() {
        Some(principals) => principals,
        None => {
            return FileProcessingResult::FileErrIo(Error::new(
                ErrorKind::NotFound,
                format!("no principal directory to read indexed table {:?}", path),
            ));
        }
    };
    let reader = match IndexedTableReader::new(path.clone(), thread_data.config.normalizer) {
        Ok(reader) => reader,
        Err(err) => {
            defo!("IndexedTableReader::new({:?}) failed {}", path, err);
            return FileProcessingResult::FileErrIo(err);
        }
    };
    chan_send(chan_send_dt, pathid, ChanDatum::FileInfo(LoginFileKind::IndexedTable), path);
    if reader.filesz() == 0 {
        return FileProcessingResult::FileErrEmpty;
    }
    if thread_data.cancel.load(Ordering::Relaxed) {
        return FileProcessingResult::FileErrIo(interrupted_error(path));
    }

    let directory: &dyn PrincipalDirectory = &**principals;
    let events: Vec<LoginEvent> =
        reader.read_directory_parallel(directory, thread_data.config.indexed_table_threads);
    let count_events: Count = events.len() as Count;
    send_events(chan_send_dt, pathid, events, path);

    FileProcessingResult::FileOk(Summary::new_indexed(
        path.clone(),
        thread_data.filetype,
        reader.summary(),
        directory.ids().len() as Count,
        count_events,
    ))
}

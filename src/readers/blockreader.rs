// src/readers/blockreader.rs

//! Implements [`Block`s] and [`BlockReader`], the driver of reading bytes
//! from a file.
//!
//! A `BlockReader` reads forward only, one `Block` at a time, from a plain
//! file or through a gzip decoder. `Block` boundaries are unrelated to record
//! boundaries.
//!
//! [`Block`s]: crate::readers::blockreader::Block
//! [`BlockReader`]: crate::readers::blockreader::BlockReader

use crate::common::{Count, FPath, FileOffset, FileSz, FileType};
use crate::common::{File, FileMetadata, FileOpenOptions, ResultS3};
#[allow(unused_imports)]
use crate::debug::printers::{de_err, de_wrn, e_err, e_wrn};

use std::fmt;
use std::io::prelude::Read;
use std::io::{Error, ErrorKind, Result, Seek, SeekFrom};
use std::path::Path;

// `flate2` is for gzip files.
use ::flate2::read::MultiGzDecoder;
#[allow(unused_imports)]
use ::more_asserts::{assert_ge, assert_le, debug_assert_ge, debug_assert_le};
#[allow(unused_imports)]
use ::si_trace_print::{
    def1n,
    def1o,
    def1x,
    def1ñ,
    defn,
    defo,
    defx,
    defñ,
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// [`Block`] Size in bytes.
pub type BlockSz = u64;

/// Offset into a file in [`Block`s], depends on [`BlockSz`] runtime value.
/// Zero based.
///
/// [`Block`s]: self::Block
pub type BlockOffset = u64;

/// A _block_ of bytes read from some file.
pub type Block = Vec<u8>;

/// A typed [`ResultS3`] for function [`BlockReader::read_block`].
///
/// [`ResultS3`]: crate::common::ResultS3
#[allow(non_upper_case_globals)]
pub type ResultS3ReadBlock = ResultS3<Block, Error>;

/// Absolute minimum Block Size in bytes (inclusive).
pub const BLOCKSZ_MIN: BlockSz = 1;

/// Absolute maximum Block Size in bytes (inclusive).
pub const BLOCKSZ_MAX: BlockSz = 0xFFFFFF;

/// Default [`Block`] Size in bytes.
pub const BLOCKSZ_DEF: usize = 0xFFFF;

/// Data for a gzip `.gz` file, used by [`BlockReader`].
pub struct GzData {
    /// size of file uncompressed, taken from trailing gzip file data.
    /// Only a hint; gzip stores the size modulo 2<sup>32</sup>, and for a
    /// file of several members it is the size of the last member only.
    pub filesz_uncompressed: FileSz,
    /// calls to `read` use this; reads every member of a multi-member file,
    /// e.g. concatenated rotations
    pub decoder: MultiGzDecoder<File>,
}

impl fmt::Debug for GzData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GzData")
            .field("filesz_uncompressed", &self.filesz_uncompressed)
            .finish()
    }
}

/// Where a `BlockReader` reads bytes from.
enum BlockSource {
    File(File),
    Gz(Box<GzData>),
    /// any other reader; an already opened stream
    Stream(Box<dyn Read + Send>),
}

impl BlockSource {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self {
            BlockSource::File(file) => file.read(buffer),
            BlockSource::Gz(gz) => gz.decoder.read(buffer),
            BlockSource::Stream(stream) => stream.read(buffer),
        }
    }
}

/// A `BlockReader` reads a file in [`BlockSz`] byte-sized [`Block`s],
/// in order, from beginning to end.
///
/// A `Read` that returns `ErrorKind::Interrupted` is retried. Any other
/// error is returned and the `BlockReader` reads nothing more.
///
/// _XXX: not a rust "Reader"; does not implement trait [`Read`]._
///
/// [`Block`s]: self::Block
/// [`Read`]: std::io::Read
pub struct BlockReader {
    /// Path to the file.
    path: FPath,
    source: BlockSource,
    /// Enum that guides file-handling behavior in function `new`.
    filetype: FileType,
    /// File size in bytes of file at `self.path`, as stored on disk.
    /// For compressed files, this is the size of the file compressed.
    filesz: FileSz,
    /// Standard `Block` size in bytes. All `Block`s are this size except the
    /// last `Block` which may this size or smaller (and not zero).
    blocksz: BlockSz,
    /// `BlockOffset` of the next `Block` to read
    blockoffset_next: BlockOffset,
    /// `Count` of bytes read.
    count_bytes: Count,
    /// `Count` of reads retried after `ErrorKind::Interrupted`
    count_read_interrupted: Count,
    /// error that interrupted a partially filled `Block`, returned by the
    /// next call to `read_block`
    error_pending: Option<Error>,
    /// end of source was reached, or an error occurred
    done: bool,
}

impl fmt::Debug for BlockReader {
    fn fmt(
        &self,
        f: &mut fmt::Formatter,
    ) -> fmt::Result {
        f.debug_struct("BlockReader")
            .field("path", &self.path)
            .field("filetype", &self.filetype)
            .field("filesz", &self.filesz)
            .field("blocksz", &self.blocksz)
            .field("blocks read", &self.blockoffset_next)
            .field("bytes read", &self.count_bytes)
            .field("done", &self.done)
            .finish()
    }
}

#[allow(non_snake_case)]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryBlockReader {
    pub BlockReader_bytes: Count,
    pub BlockReader_blocks: Count,
    pub BlockReader_blocksz: BlockSz,
    pub BlockReader_filesz: FileSz,
    pub BlockReader_filesz_uncompressed: FileSz,
    pub BlockReader_read_interrupted: Count,
}

/// Check `blocksz` is within [`BLOCKSZ_MIN`] and [`BLOCKSZ_MAX`].
pub fn blocksz_check(blocksz: BlockSz) -> Result<BlockSz> {
    if !(BLOCKSZ_MIN..=BLOCKSZ_MAX).contains(&blocksz) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            format!(
                "Block Size {} is not within {} and {}", blocksz, BLOCKSZ_MIN, BLOCKSZ_MAX
            ),
        ));
    }

    Ok(blocksz)
}

/// Implements the `BlockReader`.
impl BlockReader {
    /// Maximum size of a gzip compressed file that will be processed.
    /// 0x20000000 is 512MB.
    const GZ_MAX_SZ: FileSz = 0x20000000;

    /// Smallest possible gzip file; 10 byte header, empty deflate block, and
    /// 8 byte trailer.
    const GZ_MIN_SZ: FileSz = 18;

    /// Create a new `BlockReader`.
    ///
    /// Opens the file at `path`. Configures settings based on passed
    /// `filetype`.
    pub fn new(
        path: FPath,
        filetype: FileType,
        blocksz: BlockSz,
    ) -> Result<BlockReader> {
        def1n!("({:?}, {:?}, {:?})", path, filetype, blocksz);
        let blocksz: BlockSz = blocksz_check(blocksz)?;
        if !filetype.is_supported() {
            def1x!("return Err(Unsupported)");
            return Err(Error::new(
                ErrorKind::Unsupported,
                format!("Unsupported file type {:?} for {:?}", filetype, path),
            ));
        }

        let path_std: &Path = Path::new(&path);
        let mut open_options = FileOpenOptions::new();
        def1o!("open_options.read(true).open({:?})", path);
        let mut file: File = match open_options
            .read(true)
            .open(path_std)
        {
            Ok(val) => val,
            Err(err) => {
                def1x!("return {:?}", err);
                return Err(Error::new(err.kind(), format!("{} for {:?}", err, path)));
            }
        };
        let file_metadata: FileMetadata = match file.metadata() {
            Ok(val) => val,
            Err(err) => {
                def1x!("return {:?}", err);
                return Err(Error::new(err.kind(), format!("{} for {:?}", err, path)));
            }
        };
        if file_metadata.is_dir() {
            def1x!("return Err(Unsupported)");
            return Err(Error::new(
                ErrorKind::Unsupported,
                format!("Path is a directory {:?}", path),
            ));
        }
        let filesz: FileSz = file_metadata.len() as FileSz;

        let source: BlockSource = if filetype.is_compressed() {
            if filesz < BlockReader::GZ_MIN_SZ {
                def1x!("FileGz: return Err(InvalidData)");
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!("gzip file size {:?} is too small for {:?}", filesz, path),
                ));
            }
            if filesz > BlockReader::GZ_MAX_SZ {
                def1x!("FileGz: return Err(InvalidData)");
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Cannot handle gzip files larger than {0} (0x{0:08X}) bytes, file is {1} (0x{1:08X}) bytes {2:?}",
                        BlockReader::GZ_MAX_SZ, filesz, path
                    ),
                ));
            }
            // GZIP last 8 bytes:
            //    4 bytes (DWORD) is CRC32
            //    4 bytes (DWORD) is gzip file uncompressed size
            // GZIP binary format https://datatracker.ietf.org/doc/html/rfc1952#page-5
            //
            // +---+---+---+---+---+---+---+---+
            // |     CRC32     |      SIZE     |
            // +---+---+---+---+---+---+---+---+
            //
            file.seek(SeekFrom::End(-4))?;
            let mut buffer_size: [u8; 4] = [0; 4];
            file.read_exact(&mut buffer_size)?;
            let filesz_uncompressed = u32::from_le_bytes(buffer_size) as FileSz;
            def1o!("FileGz: file size uncompressed {0:?} (0x{0:08X})", filesz_uncompressed);
            file.seek(SeekFrom::Start(0))?;

            BlockSource::Gz(Box::new(GzData {
                filesz_uncompressed,
                decoder: MultiGzDecoder::new(file),
            }))
        } else {
            BlockSource::File(file)
        };

        let blockreader = BlockReader {
            path,
            source,
            filetype,
            filesz,
            blocksz,
            blockoffset_next: 0,
            count_bytes: 0,
            count_read_interrupted: 0,
            error_pending: None,
            done: false,
        };
        def1x!("return Ok({:?})", blockreader);

        Ok(blockreader)
    }

    /// Create a new `BlockReader` from an already opened stream, e.g. a
    /// network socket or standard input. `path` is only descriptive.
    pub fn from_reader(
        path: FPath,
        filetype: FileType,
        reader: Box<dyn Read + Send>,
        blocksz: BlockSz,
    ) -> Result<BlockReader> {
        defñ!("({:?}, {:?}, {:?})", path, filetype, blocksz);
        let blocksz: BlockSz = blocksz_check(blocksz)?;

        Ok(BlockReader {
            path,
            source: BlockSource::Stream(reader),
            filetype,
            filesz: 0,
            blocksz,
            blockoffset_next: 0,
            count_bytes: 0,
            count_read_interrupted: 0,
            error_pending: None,
            done: false,
        })
    }

    pub const fn blocksz(&self) -> BlockSz {
        self.blocksz
    }

    pub fn path(&self) -> &FPath {
        &self.path
    }

    pub const fn filetype(&self) -> FileType {
        self.filetype
    }

    /// File size in bytes as stored on disk; zero for a stream.
    pub const fn filesz(&self) -> FileSz {
        self.filesz
    }

    /// Count of bytes read so far; for a gzip file, the uncompressed bytes.
    pub const fn count_bytes(&self) -> Count {
        self.count_bytes
    }

    /// Count of `Block`s read so far.
    pub const fn count_blocks(&self) -> Count {
        self.blockoffset_next
    }

    /// Byte offset of the next `Block`.
    pub const fn fileoffset_next(&self) -> FileOffset {
        self.count_bytes
    }

    pub const fn is_done(&self) -> bool {
        self.done
    }

    /// Read the next [`Block`], up to `blocksz` bytes.
    ///
    /// Repeats the underlying `read` until the `Block` is full or the end of
    /// the source, so every `Block` except the last is exactly `blocksz`
    /// bytes.
    ///
    /// An error after some bytes were read returns those bytes as a final
    /// shorter `Block`, then the `Err` on the next call.
    ///
    /// Returns `Done` at end of source, and after an `Err`.
    pub fn read_block(&mut self) -> ResultS3ReadBlock {
        defn!("({:?}) blockoffset {}", self.path, self.blockoffset_next);
        if let Some(err) = self.error_pending.take() {
            defx!("return pending Err({})", err);
            return ResultS3ReadBlock::Err(err);
        }
        if self.done {
            defx!("already done; return Done");
            return ResultS3ReadBlock::Done;
        }
        let cap: usize = self.blocksz as usize;
        let mut block: Block = vec![0; cap];
        let mut filled: usize = 0;
        while filled < cap {
            match self.source.read(&mut block[filled..]) {
                Ok(0) => {
                    defo!("read 0; end of source");
                    self.done = true;
                    break;
                }
                Ok(size_) => {
                    debug_assert_le!(filled + size_, cap, "read past end of block buffer");
                    filled += size_;
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => {
                    defo!("read Interrupted; retry");
                    self.count_read_interrupted += 1;
                    continue;
                }
                Err(err) => {
                    self.done = true;
                    let at: FileOffset = self.count_bytes + filled as FileOffset;
                    de_err!("read error at byte {} {:?} {}", at, self.path, err);
                    let err = Error::new(
                        err.kind(),
                        format!("{} at byte {} of {:?}", err, at, self.path),
                    );
                    if filled == 0 {
                        defx!("return Err({})", err);
                        return ResultS3ReadBlock::Err(err);
                    }
                    self.error_pending = Some(err);
                    break;
                }
            }
        }
        if filled == 0 {
            defx!("return Done");
            return ResultS3ReadBlock::Done;
        }
        block.truncate(filled);
        self.count_bytes += filled as Count;
        self.blockoffset_next += 1;
        defx!("return Found; block len {}", block.len());

        ResultS3ReadBlock::Found(block)
    }

    pub fn summary(&self) -> SummaryBlockReader {
        let filesz_uncompressed: FileSz = match &self.source {
            BlockSource::Gz(gz) => gz.filesz_uncompressed,
            _ => self.filesz,
        };

        SummaryBlockReader {
            BlockReader_bytes: self.count_bytes,
            BlockReader_blocks: self.count_blocks(),
            BlockReader_blocksz: self.blocksz,
            BlockReader_filesz: self.filesz,
            BlockReader_filesz_uncompressed: filesz_uncompressed,
            BlockReader_read_interrupted: self.count_read_interrupted,
        }
    }
}

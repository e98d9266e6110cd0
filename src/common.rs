// src/common.rs
//
// common imports, type aliases, and other globals (avoids circular imports)

//! Common imports, type aliases, and other globals for _lrrlib_.

use std::fmt;
pub use std::fs::File;
pub use std::path::Path;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// file-handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// TODO: use `std::path::Path` for `FPath`
/// `F`ake `Path` or `F`ile `Path`
pub type FPath = String;
pub type FileMetadata = std::fs::Metadata;
pub type FileOpenOptions = std::fs::OpenOptions;

/// Offset into a file in bytes
pub type FileOffset = u64;

/// File Size in bytes
pub type FileSz = u64;

/// General purpose counting type, typically used for internal statistics.
pub type Count = u64;

/// Sequence of Bytes
pub type Bytes = Vec<u8>;

/// The kind of login accounting file.
///
/// Each kind has exactly one on-disk record layout, see
/// [`RecordLayout`].
///
/// [`RecordLayout`]: crate::data::layout::RecordLayout
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum LoginFileKind {
    /// Append-only sequential session log of `utmpx` records; `wtmp`,
    /// `utmp`, `btmp`.
    SequentialLog,
    /// Indexed table of `lastlog` records addressed by principal id.
    IndexedTable,
}

impl fmt::Display for LoginFileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginFileKind::SequentialLog => write!(f, "sequential log"),
            LoginFileKind::IndexedTable => write!(f, "indexed table"),
        }
    }
}

/// How a file is stored and which record format it holds.
///
/// Guides file-handling behavior in [`BlockReader::new`] and
/// [`BatchProcessor`].
///
/// [`BlockReader::new`]: crate::readers::blockreader::BlockReader#method.new
/// [`BatchProcessor`]: crate::readers::batchprocessor::BatchProcessor
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum FileType {
    /// plain uncompressed file
    File { kind: LoginFileKind },
    /// gzip compressed file; only sequential logs, an indexed table requires
    /// random access
    FileGz { kind: LoginFileKind },
    /// not a recognized login accounting file
    #[default]
    Unknown,
}

impl FileType {
    /// The record format of this file, if known.
    pub const fn kind(&self) -> Option<LoginFileKind> {
        match self {
            FileType::File { kind } => Some(*kind),
            FileType::FileGz { kind } => Some(*kind),
            FileType::Unknown => None,
        }
    }

    pub const fn is_compressed(&self) -> bool {
        matches!(self, FileType::FileGz { .. })
    }

    /// Can this `FileType` be processed?
    pub const fn is_supported(&self) -> bool {
        matches!(
            self,
            FileType::File { .. }
            | FileType::FileGz { kind: LoginFileKind::SequentialLog }
        )
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// custom Results enums for various *Reader functions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

// XXX: ripped from '\.rustup\toolchains\beta-x86_64-pc-windows-msvc\lib\rustlib\src\rust\library\core\src\result.rs'
//      https://doc.rust-lang.org/src/core/result.rs.html#481-495

/// `Result` Extended
/// for record reading functions
#[derive(Debug)]
pub enum ResultS3<T, E> {
    /// Contains the success data
    Found(T),
    /// End of source, absent entry, or other condition that means "Done",
    /// nothing to return, but no bad errors happened
    Done,
    /// Contains the error value, something bad happened
    Err(E),
}

impl<T, E> ResultS3<T, E> {
    /// Returns `true` if the result is [`Found`, 'Done`].
    #[allow(dead_code)]
    #[must_use = "if you intended to assert that this is ok, consider `.unwrap()` instead"]
    #[inline(always)]
    pub const fn is_ok(&self) -> bool {
        matches!(*self, ResultS3::Found(_) | ResultS3::Done)
    }

    /// Returns `true` if the result is [`Err`].
    #[allow(dead_code)]
    #[must_use = "if you intended to assert that this is err, consider `.unwrap_err()` instead"]
    #[inline(always)]
    pub const fn is_err(&self) -> bool {
        !self.is_ok()
    }

    /// Returns `true` if the result is [`Found`].
    #[inline(always)]
    pub const fn is_found(&self) -> bool {
        matches!(*self, ResultS3::Found(_))
    }

    /// Returns `true` if the result is [`Done`].
    #[inline(always)]
    pub const fn is_done(&self) -> bool {
        matches!(*self, ResultS3::Done)
    }
}

impl<T, E> fmt::Display for ResultS3<T, E>
where
    E: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultS3::Found(_) => { write!(f, "ResultS3::Found") },
            ResultS3::Done => { write!(f, "ResultS3::Done") },
            ResultS3::Err(err) => { write!(f, "ResultS3::Err({})", err) },
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// misc.
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `panic!` in debug builds, `de_err!` otherwise (which prints nothing in
/// release builds).
///
/// For conditions that "should never happen" but are recoverable.
#[macro_export]
macro_rules! debug_panic {
    (
        $($args:tt)*
    ) => {
        {
            if cfg!(debug_assertions) {
                panic!($($args)*);
            } else {
                $crate::de_err!($($args)*);
            }
        }
    }
}
pub use debug_panic;

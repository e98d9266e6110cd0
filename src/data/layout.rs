// src/data/layout.rs

//! Immutable descriptions of the on-disk binary record formats, the
//! [`RecordLayout`]s, and the [`RawRecord`] byte buffers read according to
//! them.
//!
//! Offsets and widths are explicit constants taken from the glibc x86_64
//! headers, never derived from a Rust struct's in-memory representation.
//!
//! * [`UTMPX_LAYOUT`], the [`utmpx`] record of a sequential session log
//!   (`wtmp`, `utmp`, `btmp`).
//! * [`LASTLOG_LAYOUT`], the [`lastlog`] record of an indexed table.
//!
//! [`utmpx`]: https://www.man7.org/linux/man-pages/man5/utmp.5.html
//! [`lastlog`]: https://man7.org/linux/man-pages/man8/lastlog.8.html

#![allow(clippy::tabs_in_doc_comments)]

use crate::common::{
    Bytes,
    Count,
    FileOffset,
    LoginFileKind,
};

use std::fmt;
use std::io::{Error, ErrorKind, Result};

use ::const_format::assertcp;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

/// How the bytes of one field are interpreted. All integers are
/// little-endian.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldKind {
    /// NUL-padded (possibly not NUL-terminated) character array
    Text,
    /// `int32_t`
    I32,
    /// `uint32_t`
    U32,
    /// `struct exit_status`, two `short`; `e_termination`, `e_exit`
    ExitPair,
    /// `uint32_t` seconds since Unix epoch
    TimeSeconds,
    /// `int32_t` seconds since Unix epoch followed by `int32_t` microseconds
    TimeSecondsMicros,
    /// `int32_t[4]`; the first word may hold a legacy IPv4 address
    AddressSlot,
    /// `short` event type code
    EnumCode,
}

impl FieldKind {
    /// The required byte width of this kind, `None` for any width.
    pub const fn width(&self) -> Option<usize> {
        match self {
            FieldKind::Text => None,
            FieldKind::I32 => Some(4),
            FieldKind::U32 => Some(4),
            FieldKind::ExitPair => Some(4),
            FieldKind::TimeSeconds => Some(4),
            FieldKind::TimeSecondsMicros => Some(8),
            FieldKind::AddressSlot => Some(16),
            FieldKind::EnumCode => Some(2),
        }
    }
}

/// What a field means within a [`LoginEvent`].
///
/// [`LoginEvent`]: crate::data::loginevent::LoginEvent
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FieldRole {
    EventType,
    ProcessId,
    Terminal,
    SessionTag,
    Username,
    Host,
    ExitStatus,
    SessionNumber,
    Timestamp,
    Address,
    /// reserved padding, never decoded
    Reserved,
}

/// Location and interpretation of one field within a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    /// C struct member name
    pub name: &'static str,
    pub role: FieldRole,
    /// byte offset from the beginning of the record
    pub offset: usize,
    /// byte width
    pub width: usize,
    pub kind: FieldKind,
}

impl FieldSpec {
    /// One byte past the end of the field (exclusive).
    pub const fn end(&self) -> usize {
        self.offset + self.width
    }
}

/// Immutable description of one binary record format.
#[derive(Eq, PartialEq)]
pub struct RecordLayout {
    /// C struct name
    pub name: &'static str,
    pub kind: LoginFileKind,
    /// total byte length of one record
    pub record_size: usize,
    pub fields: &'static [FieldSpec],
}

impl fmt::Debug for RecordLayout {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RecordLayout")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("record_size", &self.record_size)
            .field("fields", &self.fields.len())
            .finish()
    }
}

impl RecordLayout {
    /// The layout for a `LoginFileKind`.
    pub const fn for_kind(kind: LoginFileKind) -> &'static RecordLayout {
        match kind {
            LoginFileKind::SequentialLog => &UTMPX_LAYOUT,
            LoginFileKind::IndexedTable => &LASTLOG_LAYOUT,
        }
    }

    /// `record_size` as a [`FileOffset`].
    pub const fn record_size_fo(&self) -> FileOffset {
        self.record_size as FileOffset
    }

    /// The field with `role`, if this layout has one.
    pub fn field(&self, role: FieldRole) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.role == role)
    }

    /// Does this layout carry a microseconds time value?
    pub fn has_micros(&self) -> bool {
        matches!(
            self.field(FieldRole::Timestamp),
            Some(FieldSpec { kind: FieldKind::TimeSecondsMicros, .. })
        )
    }
}

/// Compile-time check of a `RecordLayout`; each field lies within
/// `record_size`, each field width matches its kind, and no two fields
/// overlap.
pub const fn layout_is_valid(layout: &RecordLayout) -> bool {
    let fields = layout.fields;
    let mut i: usize = 0;
    while i < fields.len() {
        let f = &fields[i];
        if f.width == 0 || f.end() > layout.record_size {
            return false;
        }
        if let Some(w) = f.kind.width() {
            if w != f.width {
                return false;
            }
        }
        let mut j: usize = i + 1;
        while j < fields.len() {
            let g = &fields[j];
            if f.offset < g.end() && g.offset < f.end() {
                return false;
            }
            j += 1;
        }
        i += 1;
    }

    true
}

/// Record definitions found on Linux x86_64 with glibc
/// (`/usr/include/x86_64-linux-gnu/bits/utmpx.h`, `/usr/include/lastlog.h`).
///
/// `ut_session` and `ut_tv` are 32-bit on this platform so that 32-bit and
/// 64-bit programs share the same files.
#[allow(non_upper_case_globals)]
pub mod linux_x86 {
    pub const UT_LINESIZE: usize = 32;
    pub const UT_IDSIZE: usize = 4;
    pub const UT_NAMESIZE: usize = 32;
    pub const UT_HOSTSIZE: usize = 256;

    /// ```text
    /// utmpx                   sizeof 384
    /// utmpx.ut_type      @  0 sizeof   2
    /// utmpx.ut_pid       @  4 sizeof   4
    /// utmpx.ut_line      @  8 sizeof  32
    /// utmpx.ut_id        @ 40 sizeof   4
    /// utmpx.ut_user      @ 44 sizeof  32
    /// utmpx.ut_host      @ 76 sizeof 256
    /// utmpx.ut_exit      @332 sizeof   4
    /// utmpx.ut_session   @336 sizeof   4
    /// utmpx.ut_tv        @340 sizeof   8
    /// utmpx.ut_tv.tv_sec @340 sizeof   4
    /// utmpx.ut_tv.tv_usec@344 sizeof   4
    /// utmpx.ut_addr_v6   @348 sizeof  16
    /// utmpx.__glibc_reserved @364 sizeof 20
    /// ```
    pub const UTMPX_SZ: usize = 384;
    pub const UT_TYPE_OFFSET: usize = 0;
    pub const UT_PID_OFFSET: usize = 4;
    pub const UT_LINE_OFFSET: usize = 8;
    pub const UT_ID_OFFSET: usize = 40;
    pub const UT_USER_OFFSET: usize = 44;
    pub const UT_HOST_OFFSET: usize = 76;
    pub const UT_EXIT_OFFSET: usize = 332;
    pub const UT_SESSION_OFFSET: usize = 336;
    pub const UT_TV_OFFSET: usize = 340;
    pub const UT_ADDR_V6_OFFSET: usize = 348;
    pub const UT_RESERVED_OFFSET: usize = 364;
    pub const UT_RESERVED_SZ: usize = 20;

    /// ```text
    /// lastlog               sizeof 292
    /// lastlog.ll_time  @  0 sizeof   4
    /// lastlog.ll_line  @  4 sizeof  32
    /// lastlog.ll_host  @ 36 sizeof 256
    /// ```
    pub const LASTLOG_SZ: usize = 292;
    pub const LL_TIME_OFFSET: usize = 0;
    pub const LL_LINE_OFFSET: usize = 4;
    pub const LL_HOST_OFFSET: usize = 36;
}

const UTMPX_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "ut_type", role: FieldRole::EventType, offset: linux_x86::UT_TYPE_OFFSET, width: 2, kind: FieldKind::EnumCode },
    FieldSpec { name: "ut_pid", role: FieldRole::ProcessId, offset: linux_x86::UT_PID_OFFSET, width: 4, kind: FieldKind::I32 },
    FieldSpec { name: "ut_line", role: FieldRole::Terminal, offset: linux_x86::UT_LINE_OFFSET, width: linux_x86::UT_LINESIZE, kind: FieldKind::Text },
    FieldSpec { name: "ut_id", role: FieldRole::SessionTag, offset: linux_x86::UT_ID_OFFSET, width: linux_x86::UT_IDSIZE, kind: FieldKind::Text },
    FieldSpec { name: "ut_user", role: FieldRole::Username, offset: linux_x86::UT_USER_OFFSET, width: linux_x86::UT_NAMESIZE, kind: FieldKind::Text },
    FieldSpec { name: "ut_host", role: FieldRole::Host, offset: linux_x86::UT_HOST_OFFSET, width: linux_x86::UT_HOSTSIZE, kind: FieldKind::Text },
    FieldSpec { name: "ut_exit", role: FieldRole::ExitStatus, offset: linux_x86::UT_EXIT_OFFSET, width: 4, kind: FieldKind::ExitPair },
    FieldSpec { name: "ut_session", role: FieldRole::SessionNumber, offset: linux_x86::UT_SESSION_OFFSET, width: 4, kind: FieldKind::I32 },
    FieldSpec { name: "ut_tv", role: FieldRole::Timestamp, offset: linux_x86::UT_TV_OFFSET, width: 8, kind: FieldKind::TimeSecondsMicros },
    FieldSpec { name: "ut_addr_v6", role: FieldRole::Address, offset: linux_x86::UT_ADDR_V6_OFFSET, width: 16, kind: FieldKind::AddressSlot },
    FieldSpec { name: "__glibc_reserved", role: FieldRole::Reserved, offset: linux_x86::UT_RESERVED_OFFSET, width: linux_x86::UT_RESERVED_SZ, kind: FieldKind::Text },
];

const LASTLOG_FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "ll_time", role: FieldRole::Timestamp, offset: linux_x86::LL_TIME_OFFSET, width: 4, kind: FieldKind::TimeSeconds },
    FieldSpec { name: "ll_line", role: FieldRole::Terminal, offset: linux_x86::LL_LINE_OFFSET, width: linux_x86::UT_LINESIZE, kind: FieldKind::Text },
    FieldSpec { name: "ll_host", role: FieldRole::Host, offset: linux_x86::LL_HOST_OFFSET, width: linux_x86::UT_HOSTSIZE, kind: FieldKind::Text },
];

/// Layout of a sequential session log record.
pub const UTMPX_LAYOUT: RecordLayout = RecordLayout {
    name: "utmpx",
    kind: LoginFileKind::SequentialLog,
    record_size: linux_x86::UTMPX_SZ,
    fields: UTMPX_FIELDS,
};

/// Layout of an indexed table record.
pub const LASTLOG_LAYOUT: RecordLayout = RecordLayout {
    name: "lastlog",
    kind: LoginFileKind::IndexedTable,
    record_size: linux_x86::LASTLOG_SZ,
    fields: LASTLOG_FIELDS,
};

assertcp!(layout_is_valid(&UTMPX_LAYOUT), "UTMPX_LAYOUT is inconsistent");
assertcp!(layout_is_valid(&LASTLOG_LAYOUT), "LASTLOG_LAYOUT is inconsistent");
// the last field ends exactly at the end of the record; no trailing padding
assertcp!(linux_x86::UT_RESERVED_OFFSET + linux_x86::UT_RESERVED_SZ == linux_x86::UTMPX_SZ);
assertcp!(linux_x86::LL_HOST_OFFSET + linux_x86::UT_HOSTSIZE == linux_x86::LASTLOG_SZ);

/// Maximum `record_size` among all layouts.
pub const RECORD_SZ_MAX: usize = if linux_x86::UTMPX_SZ > linux_x86::LASTLOG_SZ {
    linux_x86::UTMPX_SZ
} else {
    linux_x86::LASTLOG_SZ
};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RawRecord
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The bytes of exactly one record and where they came from.
///
/// `buffer.len() == layout.record_size` always; [`RawRecord::new`] refuses
/// any other length so a malformed buffer never reaches the decoder.
#[derive(Clone, Eq, PartialEq)]
pub struct RawRecord {
    buffer: Bytes,
    /// byte offset into the source (uncompressed) where the record begins
    fileoffset: FileOffset,
    /// zero-based index of the record within the source
    index: Count,
    layout: &'static RecordLayout,
}

impl fmt::Debug for RawRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RawRecord")
            .field("layout", &self.layout.name)
            .field("len", &self.buffer.len())
            .field("fileoffset", &self.fileoffset)
            .field("index", &self.index)
            .finish()
    }
}

impl RawRecord {
    /// Create a new `RawRecord`. Returns `ErrorKind::InvalidData` if
    /// `buffer` is not exactly `layout.record_size` bytes.
    pub fn new(
        buffer: Bytes,
        fileoffset: FileOffset,
        index: Count,
        layout: &'static RecordLayout,
    ) -> Result<RawRecord> {
        if buffer.len() != layout.record_size {
            defñ!("buffer len {} != {}", buffer.len(), layout.record_size);
            return Err(
                Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "{} record at offset {} has {} bytes, require {}",
                        layout.name, fileoffset, buffer.len(), layout.record_size,
                    ),
                )
            );
        }

        Ok(RawRecord { buffer, fileoffset, index, layout })
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    pub const fn fileoffset(&self) -> FileOffset {
        self.fileoffset
    }

    /// [`FileOffset`] at one byte past ending of the record (exclusive).
    pub const fn fileoffset_end(&self) -> FileOffset {
        self.fileoffset + self.layout.record_size_fo()
    }

    pub const fn index(&self) -> Count {
        self.index
    }

    pub const fn layout(&self) -> &'static RecordLayout {
        self.layout
    }

    /// The bytes of `field`.
    ///
    /// `field` must belong to this record's layout; a field outside the
    /// buffer returns an empty slice.
    pub fn field_bytes(&self, field: &FieldSpec) -> &[u8] {
        match self.buffer.get(field.offset..field.end()) {
            Some(slice_) => slice_,
            None => &[],
        }
    }

    /// Every byte is `0x00`.
    pub fn is_null(&self) -> bool {
        self.buffer.iter().all(|b| *b == 0)
    }
}

// src/data/loginevent.rs

//! Implement [`LoginEvent`], the decoded form of one login accounting record,
//! and the [`RecordDecoder`] that creates it from a [`RawRecord`].

use crate::common::{FileOffset, LoginFileKind};
use crate::data::datetime::{
    tv_sec_type,
    tv_usec_type,
    TimeNormalizer,
};
use crate::data::layout::{
    FieldKind,
    FieldRole,
    RawRecord,
    RecordLayout,
};
use crate::debug_panic;

use std::fmt;
use std::io::{Error, ErrorKind, Result};
use std::net::Ipv4Addr;

use ::memchr::memchr;
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// UtType
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `ut_type` value type
#[allow(non_camel_case_types)]
pub type ut_type_type = i16;

/// Names of the known `ut_type` codes, indexed by code.
///
/// From `/usr/include/x86_64-linux-gnu/bits/utmpx.h`
pub const UT_TYPE_VAL_TO_STR: &[&str] = &[
    "EMPTY",         // 0
    "RUN_LEVEL",     // 1
    "BOOT_TIME",     // 2
    "NEW_TIME",      // 3
    "OLD_TIME",      // 4
    "INIT_PROCESS",  // 5
    "LOGIN_PROCESS", // 6
    "USER_PROCESS",  // 7
    "DEAD_PROCESS",  // 8
    "ACCOUNTING",    // 9
];

/// The kind of session event a `utmpx` record describes.
///
/// A code outside the known set is kept as `Unknown` and displays as its
/// decimal value.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UtType {
    Empty,
    RunLevel,
    BootTime,
    NewTime,
    OldTime,
    InitProcess,
    LoginProcess,
    UserProcess,
    DeadProcess,
    Accounting,
    Unknown(ut_type_type),
}

impl UtType {
    pub const fn from_code(code: ut_type_type) -> UtType {
        match code {
            0 => UtType::Empty,
            1 => UtType::RunLevel,
            2 => UtType::BootTime,
            3 => UtType::NewTime,
            4 => UtType::OldTime,
            5 => UtType::InitProcess,
            6 => UtType::LoginProcess,
            7 => UtType::UserProcess,
            8 => UtType::DeadProcess,
            9 => UtType::Accounting,
            _ => UtType::Unknown(code),
        }
    }

    pub const fn code(&self) -> ut_type_type {
        match self {
            UtType::Empty => 0,
            UtType::RunLevel => 1,
            UtType::BootTime => 2,
            UtType::NewTime => 3,
            UtType::OldTime => 4,
            UtType::InitProcess => 5,
            UtType::LoginProcess => 6,
            UtType::UserProcess => 7,
            UtType::DeadProcess => 8,
            UtType::Accounting => 9,
            UtType::Unknown(code) => *code,
        }
    }

    /// The name of a known code, `None` for `Unknown`.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            UtType::Unknown(_) => None,
            _ => UT_TYPE_VAL_TO_STR.get(self.code() as usize).copied(),
        }
    }
}

impl Default for UtType {
    fn default() -> Self {
        UtType::Empty
    }
}

impl fmt::Display for UtType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "{}", self.code()),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// LoginEvent
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// `struct exit_status` of a `DEAD_PROCESS` record.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct ExitStatus {
    /// `e_termination`, process termination status
    pub termination: i16,
    /// `e_exit`, process exit status
    pub exit: i16,
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.termination, self.exit)
    }
}

/// One decoded login accounting record.
///
/// Fields a layout does not carry are left at their empty value, e.g. a
/// `lastlog` record has no `username`, `process_id`, or `event_type`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LoginEvent {
    /// byte offset of the record within the source
    pub fileoffset: FileOffset,
    pub event_type: UtType,
    pub process_id: i32,
    /// device name of the tty, e.g. `"pts/0"`
    pub terminal: String,
    /// `ut_id`, terminal name suffix or inittab id
    pub session_tag: String,
    pub username: String,
    /// remote host name, or kernel version for run-level records
    pub host: String,
    /// `None` when the address slot is zero
    pub ip_address: Option<Ipv4Addr>,
    pub exit_status: ExitStatus,
    pub session_number: i32,
    pub timestamp_seconds: tv_sec_type,
    /// only for layouts with a microseconds field
    pub timestamp_micros: Option<tv_usec_type>,
    /// see [`TimeNormalizer::normalize`]
    pub normalized_timestamp: String,
    /// the principal id (uid) of an indexed table record
    pub principal_id: Option<u32>,
}

impl LoginEvent {
    /// The dotted-quad address, or `""` when absent.
    pub fn ip_address_string(&self) -> String {
        match self.ip_address {
            Some(ip) => ip.to_string(),
            None => String::new(),
        }
    }

    /// The record carries no identifying data; event type `EMPTY`,
    /// zero process id, empty text fields, and no address.
    pub fn is_blank(&self) -> bool {
        self.event_type == UtType::Empty
            && self.process_id == 0
            && self.terminal.is_empty()
            && self.session_tag.is_empty()
            && self.username.is_empty()
            && self.host.is_empty()
            && self.ip_address.is_none()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// field decoding helpers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Decode a fixed-width character array.
///
/// Truncate at the first NUL (or keep the whole window if there is none),
/// decode as UTF-8 replacing invalid sequences with U+FFFD, then trim
/// surrounding whitespace.
pub fn decode_text(window: &[u8]) -> String {
    let end: usize = memchr(0, window).unwrap_or(window.len());

    String::from_utf8_lossy(&window[..end])
        .trim()
        .to_string()
}

/// Decode the first 32-bit word of an address slot as an IPv4 address.
///
/// The little-endian bytes are the octets in order, so the word
/// `0x0100007F` is `127.0.0.1`. A zero word is no address.
pub fn decode_address(slot: &[u8]) -> Option<Ipv4Addr> {
    let word: u32 = match slot.get(0..4) {
        Some(_) => read_u32(slot, 0),
        None => return None,
    };
    if word == 0 {
        return None;
    }

    Some(Ipv4Addr::from(word.to_le_bytes()))
}

/// Read `N` bytes at `at`. A window outside `buffer` is all zeros.
fn read_array<const N: usize>(buffer: &[u8], at: usize) -> [u8; N] {
    let mut array: [u8; N] = [0; N];
    match buffer.get(at..at + N) {
        Some(slice_) => array.copy_from_slice(slice_),
        None => {
            debug_panic!("read {} bytes at {} of buffer len {}", N, at, buffer.len());
        }
    }

    array
}

pub fn read_i16(buffer: &[u8], at: usize) -> i16 {
    i16::from_le_bytes(read_array::<2>(buffer, at))
}

pub fn read_i32(buffer: &[u8], at: usize) -> i32 {
    i32::from_le_bytes(read_array::<4>(buffer, at))
}

pub fn read_u32(buffer: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(read_array::<4>(buffer, at))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// RecordDecoder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Turns a [`RawRecord`] into a [`LoginEvent`] according to the record's
/// [`RecordLayout`], normalizing the timestamp with a [`TimeNormalizer`].
///
/// Stateless; may be shared among threads.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordDecoder {
    normalizer: TimeNormalizer,
}

impl RecordDecoder {
    pub const fn new(normalizer: TimeNormalizer) -> RecordDecoder {
        RecordDecoder { normalizer }
    }

    pub const fn normalizer(&self) -> &TimeNormalizer {
        &self.normalizer
    }

    /// Decode `raw` per `layout`.
    ///
    /// The only failure is a `raw` buffer that is not `layout.record_size`
    /// bytes, returned as `ErrorKind::InvalidData`. Problems within a field
    /// are recovered with an empty value.
    pub fn decode(
        &self,
        raw: &RawRecord,
        layout: &RecordLayout,
    ) -> Result<LoginEvent> {
        defn!("({:?}, {:?})", raw, layout);
        let buffer: &[u8] = raw.as_bytes();
        if buffer.len() != layout.record_size {
            defx!("return Err; len {} != {}", buffer.len(), layout.record_size);
            return Err(
                Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "record at offset {} has {} bytes, {} requires {}",
                        raw.fileoffset(), buffer.len(), layout.name, layout.record_size,
                    ),
                )
            );
        }

        let mut event = LoginEvent {
            fileoffset: raw.fileoffset(),
            ..Default::default()
        };
        for field in layout.fields.iter() {
            let window: &[u8] = match buffer.get(field.offset..field.end()) {
                Some(window) => window,
                None => {
                    debug_panic!("field {:?} outside record of {} bytes", field, buffer.len());
                    continue;
                }
            };
            match (field.role, field.kind) {
                (FieldRole::Reserved, _) => {}
                (FieldRole::EventType, FieldKind::EnumCode) => {
                    event.event_type = UtType::from_code(read_i16(window, 0));
                }
                (FieldRole::ProcessId, FieldKind::I32) => {
                    event.process_id = read_i32(window, 0);
                }
                (FieldRole::SessionNumber, FieldKind::I32) => {
                    event.session_number = read_i32(window, 0);
                }
                (FieldRole::Terminal, FieldKind::Text) => {
                    event.terminal = decode_text(window);
                }
                (FieldRole::SessionTag, FieldKind::Text) => {
                    event.session_tag = decode_text(window);
                }
                (FieldRole::Username, FieldKind::Text) => {
                    event.username = decode_text(window);
                }
                (FieldRole::Host, FieldKind::Text) => {
                    event.host = decode_text(window);
                }
                (FieldRole::ExitStatus, FieldKind::ExitPair) => {
                    event.exit_status = ExitStatus {
                        termination: read_i16(window, 0),
                        exit: read_i16(window, 2),
                    };
                }
                (FieldRole::Timestamp, FieldKind::TimeSeconds) => {
                    event.timestamp_seconds = read_u32(window, 0) as tv_sec_type;
                }
                (FieldRole::Timestamp, FieldKind::TimeSecondsMicros) => {
                    event.timestamp_seconds = read_i32(window, 0) as tv_sec_type;
                    event.timestamp_micros = Some(read_i32(window, 4) as tv_usec_type);
                }
                (FieldRole::Address, FieldKind::AddressSlot) => {
                    event.ip_address = decode_address(window);
                }
                (role, kind) => {
                    debug_panic!("unhandled field {:?} role {:?} kind {:?}", field.name, role, kind);
                }
            }
        }

        event.normalized_timestamp = self.normalize_event(&event, layout);
        defx!("return {:?}", event);

        Ok(event)
    }

    /// Normalize the timestamp of `event`.
    ///
    /// A `lastlog` time of zero is "never logged in". A `utmpx` time of
    /// zero is only "no event" when the record is also blank; otherwise the
    /// epoch date is rendered.
    fn normalize_event(
        &self,
        event: &LoginEvent,
        layout: &RecordLayout,
    ) -> String {
        let sec = event.timestamp_seconds;
        let usec = event.timestamp_micros;
        match layout.kind {
            LoginFileKind::IndexedTable => self.normalizer.normalize(sec, usec),
            LoginFileKind::SequentialLog => {
                if event.is_blank() {
                    self.normalizer.normalize(sec, usec)
                } else {
                    self.normalizer.normalize_datetime(sec, usec)
                }
            }
        }
    }
}

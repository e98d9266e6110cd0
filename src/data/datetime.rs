// src/data/datetime.rs

//! Datetime types and the [`TimeNormalizer`], which converts the epoch
//! time values of login records into a deterministic fixed-offset string.
//!
//! Every record timestamp is rendered in one fixed timezone offset
//! ([`TZ_OFFSET_DEFAULT_SECS`], UTC+08:00, unless overridden) so output from
//! different hosts can be compared directly. The host-local timezone is never
//! consulted.
//!
//! A zero timestamp means "no event recorded" and is rendered as
//! [`NO_EVENT_SENTINEL`], never as the 1970 epoch date.

#[doc(hidden)]
pub use ::chrono::{
    DateTime,
    Datelike,
    FixedOffset,
    LocalResult,
    NaiveDateTime,
    TimeZone,
    Timelike,
};
#[allow(unused_imports)]
use ::si_trace_print::{defn, defo, defx, defñ};
use ::lazy_static::lazy_static;

use crate::de_wrn;

use std::fmt;
use std::io::{Error, ErrorKind, Result};

/// A chrono [`DateTime`] type used in _lrrlib_.
pub type DateTimeL = DateTime<FixedOffset>;
pub type DateTimeLOpt = Option<DateTimeL>;

/// **t**ime **v**alue seconds since Unix epoch, common to all layouts
#[allow(non_camel_case_types)]
pub type tv_sec_type = i64;

/// **t**ime **v**alue additional sub-second microseconds
#[allow(non_camel_case_types)]
pub type tv_usec_type = i64;

/// Default timezone offset in seconds east of UTC, `+08:00`.
pub const TZ_OFFSET_DEFAULT_SECS: i32 = 8 * 60 * 60;

lazy_static! {
    /// [`TZ_OFFSET_DEFAULT_SECS`] as a `FixedOffset`.
    pub static ref TZ_OFFSET_DEFAULT: FixedOffset =
        FixedOffset::east_opt(TZ_OFFSET_DEFAULT_SECS).unwrap();
}

/// Reserved normalized timestamp meaning "no event recorded", e.g. a
/// principal that never logged in. Distinct from any real date.
pub const NO_EVENT_SENTINEL: &str = "Never logged in";

/// chrono [`strftime`] pattern of a normalized timestamp, without the
/// fractional part.
///
/// [`strftime`]: https://docs.rs/chrono/0.4.40/chrono/format/strftime/index.html
pub const NORMALIZED_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Microseconds in one second; `tv_usec` must be less than this.
const USECS_PER_SEC: tv_usec_type = 1_000_000;

/// Parse a user-passed timezone offset.
///
/// Accepts `"+08:00"`, `"+0800"`, `"-05:30"`, `"+8"`, `"-11"`, `"Z"`, and
/// `"UTC"`.
pub fn parse_tz_offset(value: &str) -> Result<FixedOffset> {
    defn!("({:?})", value);
    let value_ = value.trim();
    if value_.eq_ignore_ascii_case("z") || value_.eq_ignore_ascii_case("utc") {
        defx!("return UTC");
        return FixedOffset::east_opt(0).ok_or_else(
            || Error::new(ErrorKind::InvalidInput, "bad UTC offset")
        );
    }
    let err = || {
        Error::new(
            ErrorKind::InvalidInput,
            format!("Unable to parse a timezone offset from {:?}; expected a value like \"+08:00\"", value),
        )
    };
    let (sign, digits): (i32, &str) = match value_.as_bytes().first() {
        Some(b'+') => (1, &value_[1..]),
        Some(b'-') => (-1, &value_[1..]),
        _ => return Err(err()),
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    let (hours, minutes): (i32, i32) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().map_err(|_| err())?, 0),
        4 => (
            digits[..2].parse::<i32>().map_err(|_| err())?,
            digits[2..].parse::<i32>().map_err(|_| err())?,
        ),
        _ => return Err(err()),
    };
    if hours > 23 || minutes > 59 {
        return Err(err());
    }
    let secs = sign * (hours * 3600 + minutes * 60);
    defx!("return east {}", secs);

    FixedOffset::east_opt(secs).ok_or_else(err)
}

/// Converts epoch time values to normalized timestamp strings in one fixed
/// timezone offset.
///
/// ```text
/// normalize(0, None)                    → "Never logged in"
/// normalize(1700000000, None)           → "2023-11-15 06:13:20"
/// normalize(1700000000, Some(500000))   → "2023-11-15 06:13:20.500"
/// ```
#[derive(Clone, Copy, Eq, PartialEq)]
pub struct TimeNormalizer {
    tz_offset: FixedOffset,
}

impl fmt::Debug for TimeNormalizer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TimeNormalizer")
            .field("tz_offset", &self.tz_offset)
            .finish()
    }
}

impl Default for TimeNormalizer {
    /// A `TimeNormalizer` using [`TZ_OFFSET_DEFAULT_SECS`].
    fn default() -> Self {
        TimeNormalizer { tz_offset: *TZ_OFFSET_DEFAULT }
    }
}

impl TimeNormalizer {
    pub const fn new(tz_offset: FixedOffset) -> TimeNormalizer {
        TimeNormalizer { tz_offset }
    }

    pub const fn tz_offset(&self) -> &FixedOffset {
        &self.tz_offset
    }

    /// Name of the normalized timestamp column, e.g.
    /// `"Timestamp (UTC+08:00)"`.
    pub fn column_name(&self) -> String {
        self.column_name_of("Timestamp")
    }

    /// `label` followed by the offset, e.g. `"Last Login (UTC+08:00)"`.
    pub fn column_name_of(&self, label: &str) -> String {
        format!("{} (UTC{})", label, self.tz_offset)
    }

    /// Convert `tv_sec` (and optional `tv_usec`) to a [`DateTimeL`] in the
    /// fixed offset. An out-of-range `tv_usec` is ignored.
    ///
    /// Returns `None` if chrono cannot represent `tv_sec`.
    pub fn to_datetime(
        &self,
        tv_sec: tv_sec_type,
        tv_usec: Option<tv_usec_type>,
    ) -> DateTimeLOpt {
        let nsec: u32 = match tv_usec {
            Some(usec) if (0..USECS_PER_SEC).contains(&usec) => (usec * 1000) as u32,
            Some(_usec) => {
                de_wrn!("tv_usec {} out of range; ignored", _usec);
                0
            }
            None => 0,
        };
        match self.tz_offset.timestamp_opt(tv_sec, nsec) {
            LocalResult::Single(dt) => Some(dt),
            LocalResult::Ambiguous(dt, _) => Some(dt),
            LocalResult::None => None,
        }
    }

    /// Normalize an epoch timestamp.
    ///
    /// `tv_sec == 0` with no (or zero) `tv_usec` is "no event recorded" and
    /// returns [`NO_EVENT_SENTINEL`]. Otherwise see
    /// [`normalize_datetime`].
    ///
    /// [`normalize_datetime`]: TimeNormalizer::normalize_datetime
    pub fn normalize(
        &self,
        tv_sec: tv_sec_type,
        tv_usec: Option<tv_usec_type>,
    ) -> String {
        if tv_sec == 0 && tv_usec.unwrap_or(0) == 0 {
            defñ!("({}, {:?}) return sentinel", tv_sec, tv_usec);
            return String::from(NO_EVENT_SENTINEL);
        }

        self.normalize_datetime(tv_sec, tv_usec)
    }

    /// Normalize an epoch timestamp, always rendering a date, even for
    /// `tv_sec == 0`.
    ///
    /// Format is `YYYY-MM-DD HH:MM:SS`. When `tv_usec` is `Some` then
    /// milliseconds are appended as `.mmm` (truncated, not rounded).
    ///
    /// If `tv_sec` is not representable then the decimal `tv_sec` is
    /// returned.
    pub fn normalize_datetime(
        &self,
        tv_sec: tv_sec_type,
        tv_usec: Option<tv_usec_type>,
    ) -> String {
        defn!("({}, {:?})", tv_sec, tv_usec);
        let dt: DateTimeL = match self.to_datetime(tv_sec, tv_usec) {
            Some(dt) => dt,
            None => {
                de_wrn!("tv_sec {} not representable as a datetime", tv_sec);
                defx!("return tv_sec");
                return tv_sec.to_string();
            }
        };
        let mut s: String = dt.format(NORMALIZED_FORMAT).to_string();
        if tv_usec.is_some() {
            // `to_datetime` already dropped an out-of-range `tv_usec`
            let millis: u32 = dt.timestamp_subsec_millis();
            s.push_str(format!(".{:03}", millis).as_str());
        }
        defx!("return {:?}", s);

        s
    }
}

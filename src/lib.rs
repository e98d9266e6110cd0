// src/lib.rs

//! _Login Record Reader Library_ (_lrrlib_) decodes binary login
//! accounting files into [`LoginEvent`s].
//!
//! Two kinds of files are supported:
//!
//! * sequential session logs of `utmpx` records; `wtmp`, `utmp`, `btmp`,
//!   plain or gzip compressed. Read by a [`SequentialLogScanner`].
//! * indexed tables of `lastlog` records, one per principal id. Read by an
//!   [`IndexedTableReader`].
//!
//! Every timestamp is normalized to one fixed timezone offset by a
//! [`TimeNormalizer`]. Truncated or corrupt records never abort a whole file.
//!
//! _lrrlib_ is the library used by the program _lrr_.
//!
//! [`LoginEvent`s]: crate::data::loginevent::LoginEvent
//! [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
//! [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader
//! [`TimeNormalizer`]: crate::data::datetime::TimeNormalizer

pub mod common;
pub mod data;
pub mod debug;
pub mod printer;
pub mod readers;
#[cfg(test)]
pub mod tests;

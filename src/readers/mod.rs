// src/readers/mod.rs

//! "Readers" for _lrrlib_.
//!
//! ## Overview of readers
//!
//! * A [`SequentialLogScanner`] drives a [`BlockReader`] to derive
//!   [`RawRecord`s] from a sequential session log, and decodes each to a
//!   [`LoginEvent`].
//! * An [`IndexedTableReader`] does positioned reads of the `RawRecord` of a
//!   principal id from an indexed table, and decodes it to a `LoginEvent`.
//! * A `BlockReader` only handles `u8` bytes.
//!
//! <br/>
//!
//! Also see [_Definitions of data_].
//!
//! <br/>
//!
//! ---
//!
//! The _lrr_ binary program uses a [`BatchProcessor`], which runs one
//! thread per file, each with its own `SequentialLogScanner` or
//! `IndexedTableReader`.
//!
//! <br/>
//!
//! _These are not rust "Readers"; these structs do not implement the trait
//! [`Read`]. These are "readers" in an informal sense._
//!
//! [_Definitions of data_]: crate::data
//! [`Read`]: std::io::Read
//! [`RawRecord`s]: crate::data::layout::RawRecord
//! [`LoginEvent`]: crate::data::loginevent::LoginEvent
//! [`BlockReader`]: crate::readers::blockreader::BlockReader
//! [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
//! [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader
//! [`BatchProcessor`]: crate::readers::batchprocessor::BatchProcessor

pub mod batchprocessor;
pub mod blockreader;
pub mod filepreprocessor;
pub mod helpers;
pub mod indexedtablereader;
pub mod sequentialscanner;
pub mod summary;

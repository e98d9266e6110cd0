// src/data/mod.rs

//! The `data` module is specialized data containers and the decoding of
//! login accounting records.
//!
//! ## Definitions of data
//!
//! ### Record
//!
//! A "record" is a fixed-size sequence of bytes in a login accounting file
//! that:
//!
//! * has the length and field offsets described by one [`RecordLayout`].
//! * begins at a file offset that is a multiple of the record size.
//!
//! The bytes of a record are held by a [`RawRecord`].
//!
//! ### LoginEvent
//!
//! A [`LoginEvent`] is the decoded form of a record; text fields, event
//! type, network address, and a normalized timestamp. It is created by a
//! [`RecordDecoder`].
//!
//! A `LoginEvent` represents a "log message".
//!
//! ### Sequential log
//!
//! A "sequential log" (`wtmp`, `utmp`, `btmp`) is an append-only stream of
//! `utmpx` records. It is read by a [`SequentialLogScanner`].
//!
//! ### Indexed table
//!
//! An "indexed table" (`lastlog`) holds one `lastlog` record per principal
//! id at offset `id * record_size`. It is read by an
//! [`IndexedTableReader`] consulting a [`PrincipalDirectory`].
//!
//! <br/>
//!
//! _The "Readers" are not rust "Readers"; "_Reader_" structs do not implement
//! the trait [`Read`]. These are "readers" in an informal sense._
//!
//! [`RecordLayout`]: crate::data::layout::RecordLayout
//! [`RawRecord`]: crate::data::layout::RawRecord
//! [`LoginEvent`]: crate::data::loginevent::LoginEvent
//! [`RecordDecoder`]: crate::data::loginevent::RecordDecoder
//! [`PrincipalDirectory`]: crate::data::principal::PrincipalDirectory
//! [`SequentialLogScanner`]: crate::readers::sequentialscanner::SequentialLogScanner
//! [`IndexedTableReader`]: crate::readers::indexedtablereader::IndexedTableReader
//! [`Read`]: std::io::Read

pub mod datetime;
pub mod layout;
pub mod loginevent;
pub mod principal;

// src/printer/mod.rs

//! The `printer` module is for writing user-facing output; rows of decoded
//! [`LoginEvent`s] through a [`TabularSink`], and the per-file processing
//! summary.
//!
//! [`LoginEvent`s]: crate::data::loginevent::LoginEvent
//! [`TabularSink`]: crate::printer::csvsink::TabularSink

pub mod csvsink;
pub mod summary;

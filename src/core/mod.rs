//! Core business logic
//!
//! `sync` holds the batch pipeline; `downstream` the client for the
//! pointage service it feeds.

pub mod downstream;
pub mod sync;

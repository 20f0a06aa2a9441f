//! Integration tests
//!
//! These exercise several components together: the SeaORM registry, the
//! worker pool with its retry and dead-letter paths, the HTTP client, and
//! configuration loading.

mod config_tests;
mod downstream_client_tests;
mod pipeline_tests;
mod registry_tests;

//! Common test utilities for pointage-sync
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::common::{BatchFactory, TestDatabase};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let db = TestDatabase::new().await;
//!     let batch = BatchFactory::standard("b-1", 3);
//!     // ...
//! }
//! ```

pub mod client;
pub mod database;
pub mod fixtures;

pub use client::ScriptedClient;
pub use database::TestDatabase;
pub use fixtures::BatchFactory;

/// Assert that a result is Ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert that a result is Err and return the error
#[macro_export]
macro_rules! assert_err {
    ($expr:expr) => {
        match $expr {
            Ok(v) => panic!("Expected Err, got Ok: {:?}", v),
            Err(e) => e,
        }
    };
}

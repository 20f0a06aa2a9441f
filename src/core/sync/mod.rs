//! Offline pointage synchronization
//!
//! Batches are validated and stored by [`SyncService`], queued as
//! [`DispatchMessage`]s, and processed by [`SyncExecutor`] on the worker
//! pool. Transient failures go through the [`RetryController`]; exhausted
//! or unprocessable messages end in the [`DeadLetterHandler`]. The
//! [`RecoverySweeper`] reclaims batches whose message was lost.

pub mod aggregation;
pub mod dead_letter;
pub mod executor;
pub mod pipeline;
pub mod retry;
pub mod service;
pub mod sweeper;
pub mod transition;
pub mod types;
pub mod validation;
pub mod worker;


pub use aggregation::{Aggregate, aggregate, failed_positions};
pub use dead_letter::DeadLetterHandler;
pub use executor::{ExecutionOutcome, ExecutorSettings, SyncExecutor};
pub use pipeline::SyncPipeline;
pub use retry::{RetryController, RetryDecision};
pub use service::{SubmitBatch, SyncResponse, SyncService, SyncStatusView};
pub use sweeper::{RecoverySweeper, SweepReport, SweepSettings};
pub use transition::{BatchTransition, SkipReason, TransitionOutcome};
pub use types::{
    Batch, BatchKind, DEFAULT_PRIVILEGE, DispatchMessage, PointageRecords, PointageResult,
    StandardPointage, SyncStatus, TerrainPointage,
};
pub use validation::{ValidationLimits, Validator, Violation};
pub use worker::{SyncWorkerPool, WorkerSettings};

//! Batch state machine
//!
//! Every mutation of a stored batch goes through [`Batch::apply`]. Terminal
//! batches are immutable: any transition on them is skipped, which is what
//! makes redelivered messages and repeated dead letters harmless.

use super::types::{Batch, PointageResult, SyncStatus};
use chrono::{DateTime, Utc};
use std::fmt;

/// Requested change to a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchTransition {
    /// Claim the batch for processing: PENDING or RETRY to IN_PROGRESS
    Start,
    /// Record downstream results: IN_PROGRESS to COMPLETED or PARTIAL_FAILURE
    Complete {
        results: Vec<PointageResult>,
        success_count: u32,
        failure_count: u32,
        /// Set when the results do not line up with the submitted records
        note: Option<String>,
    },
    /// A transient failure that will be requeued
    ScheduleRetry { error: String, retry_count: u32 },
    /// Terminal failure
    Fail { error: String },
    /// Record an error without changing status
    Annotate { error: String },
    /// Take back a batch that made no progress since `stalled_before`.
    /// `next_retry` of `None` means the budget is spent and the batch fails.
    Reclaim {
        observed: SyncStatus,
        stalled_before: DateTime<Utc>,
        error: String,
        next_retry: Option<u32>,
    },
}

impl BatchTransition {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete { .. } => "complete",
            Self::ScheduleRetry { .. } => "schedule_retry",
            Self::Fail { .. } => "fail",
            Self::Annotate { .. } => "annotate",
            Self::Reclaim { .. } => "reclaim",
        }
    }
}

/// Why a transition left the batch untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Batch is COMPLETED, PARTIAL_FAILURE or FAILED
    Terminal(SyncStatus),
    /// Another worker holds the batch
    AlreadyInProgress,
    /// Results arrived for a batch that is no longer IN_PROGRESS
    NotInProgress(SyncStatus),
    /// The batch moved since it was seen as stalled
    NoLongerStalled,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminal(status) => write!(f, "batch is terminal ({})", status),
            Self::AlreadyInProgress => write!(f, "batch is already in progress"),
            Self::NotInProgress(status) => write!(f, "batch is not in progress ({})", status),
            Self::NoLongerStalled => write!(f, "batch is no longer stalled"),
        }
    }
}

/// Result of applying a transition through the registry
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    Applied(Batch),
    Skipped { batch: Batch, reason: SkipReason },
}

impl TransitionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn batch(&self) -> &Batch {
        match self {
            Self::Applied(batch) | Self::Skipped { batch, .. } => batch,
        }
    }
}

impl Batch {
    /// Compute the batch after `transition`, or the reason it does not apply
    pub fn apply(
        &self,
        transition: &BatchTransition,
        now: DateTime<Utc>,
    ) -> Result<Batch, SkipReason> {
        if self.status.is_terminal() {
            return Err(SkipReason::Terminal(self.status));
        }

        let mut next = self.clone();
        match transition {
            BatchTransition::Start => {
                if self.status == SyncStatus::InProgress {
                    return Err(SkipReason::AlreadyInProgress);
                }
                next.status = SyncStatus::InProgress;
            }
            BatchTransition::Complete {
                results,
                success_count,
                failure_count,
                note,
            } => {
                if self.status != SyncStatus::InProgress {
                    return Err(SkipReason::NotInProgress(self.status));
                }
                next.status = if *failure_count == 0 {
                    SyncStatus::Completed
                } else {
                    SyncStatus::PartialFailure
                };
                next.results = results.clone();
                next.success_count = *success_count;
                next.failure_count = *failure_count;
                next.error_message = note.clone();
            }
            BatchTransition::ScheduleRetry { error, retry_count } => {
                next.status = SyncStatus::Retry;
                next.retry_count = *retry_count;
                next.error_message = Some(error.clone());
            }
            BatchTransition::Fail { error } => {
                next.status = SyncStatus::Failed;
                next.error_message = Some(error.clone());
            }
            BatchTransition::Annotate { error } => {
                next.error_message = Some(error.clone());
            }
            BatchTransition::Reclaim {
                observed,
                stalled_before,
                error,
                next_retry,
            } => {
                if self.status != *observed || self.updated_at > *stalled_before {
                    return Err(SkipReason::NoLongerStalled);
                }
                next.error_message = Some(error.clone());
                match next_retry {
                    Some(retry_count) => {
                        next.status = SyncStatus::Retry;
                        next.retry_count = *retry_count;
                    }
                    None => next.status = SyncStatus::Failed,
                }
            }
        }

        if next.status.is_terminal() {
            next.completed_at = Some(now);
        }
        next.updated_at = now;
        next.version = self.version + 1;
        Ok(next)
    }
}

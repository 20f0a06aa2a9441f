/// Sync batch entity module
pub mod sync_batch;

pub use sync_batch::Entity as SyncBatch;

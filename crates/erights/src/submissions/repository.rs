use async_trait::async_trait;

use super::domain::{Submission, SubmissionDraft, SubmissionKind, SubmissionStatus};
use super::query::{PageRequest, SortField, SortOrder, SubmissionFilter};

/// Failure surfaced by a store backend. "Not found" is not an error here:
/// reads return `Option` so callers can distinguish a missing row from a
/// broken store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Storage contract for the unified submissions table. Implemented by the
/// Postgres backend in the service crate and by the in-memory backend used
/// for tests and databaseless development runs.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Persist a validated draft, assigning the row id and both timestamps.
    async fn insert(&self, draft: SubmissionDraft) -> Result<Submission, StoreError>;

    async fn fetch(&self, id: i64) -> Result<Option<Submission>, StoreError>;

    /// Atomic conditional update: set the status and bump `updated_at` in
    /// one statement, returning the updated row, or `None` when no row has
    /// that id.
    async fn update_status(
        &self,
        id: i64,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError>;

    /// One page of matching rows plus the total match count. Backends issue
    /// the page and count queries concurrently where the store allows it.
    async fn list(
        &self,
        filter: &SubmissionFilter,
        sort: SortField,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, u64), StoreError>;

    /// Every matching row, newest first, for export.
    async fn export(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError>;

    /// Row count, optionally restricted to one submission kind.
    async fn count(&self, kind: Option<SubmissionKind>) -> Result<u64, StoreError>;
}

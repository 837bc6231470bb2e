//! Submission record store: the entity model for rights issue responses,
//! the store contract shared by the Postgres and in-memory backends, the
//! filter/sort/pagination semantics, and the CSV/JSON export surface.

pub mod domain;
pub mod export;
pub mod memory;
pub mod query;
pub mod repository;
pub mod service;

pub use domain::{
    NewSubmission, PaymentMethod, RightsAction, Submission, SubmissionDraft, SubmissionKind,
    SubmissionStatus, SubmissionView,
};
pub use export::{form_columns, rights_columns, split_name, write_csv, ExportColumn};
pub use memory::InMemorySubmissionStore;
pub use query::{
    ListRequest, Page, PageRequest, Pagination, RightsClaiming, SortField, SortOrder,
    SubmissionFilter,
};
pub use repository::{StoreError, SubmissionStore};
pub use service::{DashboardTotals, SubmissionError, SubmissionService};

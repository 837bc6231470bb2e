use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use super::domain::{Submission, SubmissionDraft, SubmissionKind, SubmissionStatus};
use super::query::{PageRequest, SortField, SortOrder, SubmissionFilter};
use super::repository::{StoreError, SubmissionStore};

/// In-memory submission store backing tests and databaseless development
/// runs. Filtering and sorting go through the same [`SubmissionFilter`] and
/// [`SortField`] semantics the SQL backend translates to SQL, so both
/// backends return identical row sets.
#[derive(Default, Clone)]
pub struct InMemorySubmissionStore {
    rows: Arc<Mutex<Vec<Submission>>>,
    sequence: Arc<AtomicI64>,
}

impl InMemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted_matches(
        &self,
        filter: &SubmissionFilter,
        sort: SortField,
        order: SortOrder,
    ) -> Vec<Submission> {
        let rows = self.rows.lock().expect("submission store mutex poisoned");
        let mut matches: Vec<Submission> = rows
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        matches.sort_by(|a, b| {
            let ordering = sort.compare(a, b);
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });
        matches
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    async fn insert(&self, draft: SubmissionDraft) -> Result<Submission, StoreError> {
        let now = Utc::now();
        let submission = Submission {
            id: self.sequence.fetch_add(1, Ordering::Relaxed) + 1,
            kind: draft.kind,
            shareholder_id: draft.shareholder_id,
            reg_account_number: draft.reg_account_number,
            name: draft.name,
            chn: draft.chn,
            bvn: draft.bvn,
            holdings: draft.holdings,
            rights_issue: draft.rights_issue,
            holdings_after: draft.holdings_after,
            action: draft.action,
            shares_accepted: draft.shares_accepted,
            shares_renounced: draft.shares_renounced,
            apply_additional: draft.apply_additional,
            additional_shares: draft.additional_shares,
            amount_due: draft.amount_due,
            additional_amount: draft.additional_amount,
            amount_payable: draft.amount_payable,
            payment_amount: draft.payment_amount,
            additional_payment_cheque_number: draft.additional_payment_cheque_number,
            partial_payment_cheque_number: draft.partial_payment_cheque_number,
            contact_name: draft.contact_name,
            email: draft.email,
            mobile_phone: draft.mobile_phone,
            daytime_phone: draft.daytime_phone,
            filled_form_path: draft.filled_form_path,
            receipt_path: draft.receipt_path,
            status: draft.status,
            created_at: now,
            updated_at: now,
        };

        let mut rows = self.rows.lock().expect("submission store mutex poisoned");
        rows.push(submission.clone());
        Ok(submission)
    }

    async fn fetch(&self, id: i64) -> Result<Option<Submission>, StoreError> {
        let rows = self.rows.lock().expect("submission store mutex poisoned");
        Ok(rows.iter().find(|row| row.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: i64,
        status: SubmissionStatus,
    ) -> Result<Option<Submission>, StoreError> {
        let mut rows = self.rows.lock().expect("submission store mutex poisoned");
        match rows.iter_mut().find(|row| row.id == id) {
            Some(row) => {
                row.status = status;
                row.updated_at = Utc::now();
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn list(
        &self,
        filter: &SubmissionFilter,
        sort: SortField,
        order: SortOrder,
        page: PageRequest,
    ) -> Result<(Vec<Submission>, u64), StoreError> {
        let matches = self.sorted_matches(filter, sort, order);
        let total = matches.len() as u64;
        let rows = matches
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .collect();
        Ok((rows, total))
    }

    async fn export(&self, filter: &SubmissionFilter) -> Result<Vec<Submission>, StoreError> {
        Ok(self.sorted_matches(filter, SortField::CreatedAt, SortOrder::Desc))
    }

    async fn count(&self, kind: Option<SubmissionKind>) -> Result<u64, StoreError> {
        let rows = self.rows.lock().expect("submission store mutex poisoned");
        let count = rows
            .iter()
            .filter(|row| kind.map_or(true, |kind| row.kind == kind))
            .count();
        Ok(count as u64)
    }
}

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::notify::NotificationDispatcher;
use crate::registry::{Shareholder, ShareholderDirectory};

use super::domain::{
    NewSubmission, RightsAction, Submission, SubmissionDraft, SubmissionKind, SubmissionStatus,
    SubmissionView,
};
use super::query::{ListRequest, Page, Pagination, SubmissionFilter};
use super::repository::{StoreError, SubmissionStore};

/// Orchestrates the submission lifecycle: intake validation against the
/// shareholder registry, derived-amount recomputation, persistence, the
/// fire-and-forget notification side effect, and the admin read paths.
pub struct SubmissionService {
    store: Arc<dyn SubmissionStore>,
    registry: Arc<dyn ShareholderDirectory>,
    notifications: Arc<NotificationDispatcher>,
}

/// Counters shown on the admin dashboard. Totals are additive across
/// channels: a holder who submitted through both is counted twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub total_shareholders: u64,
    pub total_submissions: u64,
    pub rights_submissions: u64,
}

impl SubmissionService {
    pub fn new(
        store: Arc<dyn SubmissionStore>,
        registry: Arc<dyn ShareholderDirectory>,
        notifications: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            registry,
            notifications,
        }
    }

    /// Validate and persist a new submission, then fire the notification
    /// pair without awaiting them. The returned record is the stored row,
    /// including the server-recomputed amount payable.
    pub async fn submit(
        &self,
        kind: SubmissionKind,
        payload: NewSubmission,
    ) -> Result<Submission, SubmissionError> {
        let action = RightsAction::parse(&payload.action_type)
            .ok_or_else(|| SubmissionError::InvalidAction(payload.action_type.clone()))?;

        validate_quantities(&payload, action)?;

        let holder = self.resolve_shareholder(&payload).await?;
        let draft = build_draft(kind, action, payload, &holder);

        let stored = self.store.insert(draft).await?;
        info!(
            submission_id = stored.id,
            reg_account_number = %stored.reg_account_number,
            action = stored.action.label(),
            "submission recorded"
        );

        self.notifications.clone().dispatch_detached(stored.clone());
        Ok(stored)
    }

    pub async fn get(&self, id: i64) -> Result<Submission, SubmissionError> {
        self.store
            .fetch(id)
            .await?
            .ok_or(SubmissionError::NotFound)
    }

    /// Atomic status overwrite. Only the three recognized labels are
    /// accepted; anything else leaves the record untouched.
    pub async fn update_status(
        &self,
        id: i64,
        raw_status: &str,
    ) -> Result<Submission, SubmissionError> {
        let status = SubmissionStatus::parse(raw_status)
            .ok_or_else(|| SubmissionError::InvalidStatus(raw_status.to_string()))?;

        let updated = self
            .store
            .update_status(id, status)
            .await?
            .ok_or(SubmissionError::NotFound)?;

        info!(
            submission_id = id,
            status = status.label(),
            "submission status updated"
        );
        Ok(updated)
    }

    pub async fn list(
        &self,
        request: ListRequest,
    ) -> Result<Page<SubmissionView>, SubmissionError> {
        let (rows, total) = self
            .store
            .list(&request.filter, request.sort, request.order, request.page)
            .await?;

        Ok(Page {
            items: rows.iter().map(Submission::view).collect(),
            pagination: Pagination::for_page(request.page, total),
        })
    }

    pub async fn export(
        &self,
        filter: &SubmissionFilter,
    ) -> Result<Vec<Submission>, SubmissionError> {
        Ok(self.store.export(filter).await?)
    }

    pub async fn dashboard(&self) -> Result<DashboardTotals, SubmissionError> {
        let total_shareholders = self.registry.count().await?;
        let total_submissions = self.store.count(None).await?;
        let rights_submissions = self.store.count(Some(SubmissionKind::Rights)).await?;

        Ok(DashboardTotals {
            total_shareholders,
            total_submissions,
            rights_submissions,
        })
    }

    pub async fn find_shareholder(
        &self,
        reg_account_number: &str,
    ) -> Result<Shareholder, SubmissionError> {
        self.registry
            .find_by_reg_account(reg_account_number)
            .await?
            .ok_or(SubmissionError::UnknownShareholder)
    }

    async fn resolve_shareholder(
        &self,
        payload: &NewSubmission,
    ) -> Result<Shareholder, SubmissionError> {
        if let Some(holder) = self
            .registry
            .find_by_reg_account(&payload.reg_account_number)
            .await?
        {
            return Ok(holder);
        }

        if let Some(chn) = payload.chn.as_deref() {
            if let Some(holder) = self.registry.find_by_chn(chn).await? {
                return Ok(holder);
            }
        }

        Err(SubmissionError::UnknownShareholder)
    }
}

fn validate_quantities(
    payload: &NewSubmission,
    action: RightsAction,
) -> Result<(), SubmissionError> {
    let quantities = [
        payload.shares_accepted,
        payload.shares_renounced,
        payload.additional_shares,
        Some(payload.amount_due),
        payload.additional_amount,
        payload.payment_amount,
    ];
    if quantities.into_iter().flatten().any(|value| value < 0) {
        return Err(SubmissionError::NegativeQuantity);
    }

    if payload.shares_renounced.unwrap_or(0) > 0 && action == RightsAction::FullAcceptance {
        return Err(SubmissionError::RenunciationMismatch);
    }

    Ok(())
}

/// The payable amount is recomputed here; whatever the caller sent in
/// `amount_payable` is discarded.
fn build_draft(
    kind: SubmissionKind,
    action: RightsAction,
    payload: NewSubmission,
    holder: &Shareholder,
) -> SubmissionDraft {
    let amount_payable = if payload.apply_additional {
        payload.amount_due + payload.additional_amount.unwrap_or(0)
    } else {
        payload.amount_due
    };

    SubmissionDraft {
        kind,
        shareholder_id: holder.id,
        reg_account_number: holder.reg_account_number.clone(),
        name: holder.name.clone(),
        chn: payload.chn.or_else(|| holder.chn.clone()),
        bvn: payload.bvn,
        holdings: holder.holdings,
        rights_issue: holder.rights_issue,
        holdings_after: holder.holdings_after,
        action,
        shares_accepted: payload.shares_accepted,
        shares_renounced: payload.shares_renounced,
        apply_additional: payload.apply_additional,
        additional_shares: payload.additional_shares,
        amount_due: payload.amount_due,
        additional_amount: payload.additional_amount,
        amount_payable,
        payment_amount: payload.payment_amount,
        additional_payment_cheque_number: payload.additional_payment_cheque_number,
        partial_payment_cheque_number: payload.partial_payment_cheque_number,
        contact_name: payload.contact_name,
        email: payload.email,
        mobile_phone: payload.mobile_phone,
        daytime_phone: payload.daytime_phone,
        filled_form_path: payload.filled_form_path,
        receipt_path: payload.receipt_path,
        status: SubmissionStatus::Pending,
    }
}

/// Error raised by the submission service. Routes map these onto the HTTP
/// taxonomy: validation variants to 400, missing rows to 404, store
/// failures to 500.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("invalid action type '{0}': must be full_acceptance or renunciation_partial")]
    InvalidAction(String),
    #[error("Invalid status. Must be pending, completed, or rejected")]
    InvalidStatus(String),
    #[error("shares_renounced requires the renunciation_partial action")]
    RenunciationMismatch,
    #[error("share and amount fields must not be negative")]
    NegativeQuantity,
    #[error("no shareholder matches the supplied registration details")]
    UnknownShareholder,
    #[error("submission not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
}

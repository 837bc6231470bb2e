use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Channel discriminator for the unified submissions table. `Form` rows
/// arrived through the legacy paper-form channel, `Rights` rows through the
/// online rights portal. Both share one schema and one query path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionKind {
    Form,
    Rights,
}

impl SubmissionKind {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionKind::Form => "form",
            SubmissionKind::Rights => "rights",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "form" => Some(SubmissionKind::Form),
            "rights" => Some(SubmissionKind::Rights),
            _ => None,
        }
    }
}

/// A shareholder's decision on their rights allotment. Exactly two variants
/// are recognized; anything else is rejected at intake, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RightsAction {
    FullAcceptance,
    RenunciationPartial,
}

impl RightsAction {
    pub const fn label(self) -> &'static str {
        match self {
            RightsAction::FullAcceptance => "full_acceptance",
            RightsAction::RenunciationPartial => "renunciation_partial",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full_acceptance" => Some(RightsAction::FullAcceptance),
            "renunciation_partial" => Some(RightsAction::RenunciationPartial),
            _ => None,
        }
    }
}

/// Review status. No transition graph is enforced: an administrator may
/// overwrite any status with any other valid status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Pending,
    Completed,
    Rejected,
}

impl SubmissionStatus {
    pub const fn label(self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Completed => "completed",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(SubmissionStatus::Pending),
            "completed" => Some(SubmissionStatus::Completed),
            "rejected" => Some(SubmissionStatus::Rejected),
            _ => None,
        }
    }
}

/// Derived display value, recomputed on every read and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PaymentMethod {
    Cheque,
    ElectronicTransfer,
    Cash,
}

impl PaymentMethod {
    pub const fn label(self) -> &'static str {
        match self {
            PaymentMethod::Cheque => "Cheque",
            PaymentMethod::ElectronicTransfer => "Electronic Transfer",
            PaymentMethod::Cash => "Cash",
        }
    }
}

/// One persisted rights issue response. Identity fields from the registry
/// (name, account, holdings) are denormalized onto the row at insert so
/// listing, search, and export run against a single table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i64,
    pub kind: SubmissionKind,
    pub shareholder_id: i64,
    pub reg_account_number: String,
    pub name: String,
    pub chn: Option<String>,
    pub bvn: Option<String>,
    pub holdings: i64,
    pub rights_issue: i64,
    pub holdings_after: i64,
    pub action: RightsAction,
    pub shares_accepted: Option<i64>,
    pub shares_renounced: Option<i64>,
    pub apply_additional: bool,
    pub additional_shares: Option<i64>,
    pub amount_due: i64,
    pub additional_amount: Option<i64>,
    pub amount_payable: i64,
    pub payment_amount: Option<i64>,
    pub additional_payment_cheque_number: Option<String>,
    pub partial_payment_cheque_number: Option<String>,
    pub contact_name: Option<String>,
    pub email: String,
    pub mobile_phone: Option<String>,
    pub daytime_phone: Option<String>,
    pub filled_form_path: Option<String>,
    pub receipt_path: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Submission {
    /// Cheque evidence wins over a recorded transfer amount; a row with
    /// neither is treated as cash.
    pub fn payment_method(&self) -> PaymentMethod {
        if self.additional_payment_cheque_number.is_some()
            || self.partial_payment_cheque_number.is_some()
        {
            PaymentMethod::Cheque
        } else if self.payment_amount.is_some() {
            PaymentMethod::ElectronicTransfer
        } else {
            PaymentMethod::Cash
        }
    }

    /// Mobile number first, daytime number second, empty when neither was
    /// captured.
    pub fn phone_number(&self) -> &str {
        self.mobile_phone
            .as_deref()
            .or(self.daytime_phone.as_deref())
            .unwrap_or("")
    }

    /// Shares the holder walks away with: current holdings plus everything
    /// accepted and applied for, less anything renounced.
    pub fn total_shares_taken(&self) -> i64 {
        self.holdings + self.shares_accepted.unwrap_or(0) + self.additional_shares.unwrap_or(0)
            - self.shares_renounced.unwrap_or(0)
    }

    /// Row shape returned by listing and detail endpoints, with the derived
    /// columns computed for this read.
    pub fn view(&self) -> SubmissionView {
        SubmissionView {
            id: self.id,
            kind: self.kind,
            shareholder_id: self.shareholder_id,
            reg_account_number: self.reg_account_number.clone(),
            name: self.name.clone(),
            chn: self.chn.clone(),
            bvn: self.bvn.clone(),
            holdings: self.holdings,
            rights_issue: self.rights_issue,
            holdings_after: self.holdings_after,
            action_type: self.action,
            shares_accepted: self.shares_accepted,
            shares_renounced: self.shares_renounced,
            apply_additional: self.apply_additional,
            additional_shares: self.additional_shares,
            amount_due: self.amount_due,
            additional_amount: self.additional_amount,
            amount_payable: self.amount_payable,
            payment_amount: self.payment_amount,
            payment_method: self.payment_method().label(),
            phone_number: self.phone_number().to_string(),
            contact_name: self.contact_name.clone(),
            email: self.email.clone(),
            filled_form_path: self.filled_form_path.clone(),
            receipt_path: self.receipt_path.clone(),
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Serialized row for API responses: the persisted fields plus the derived
/// display columns.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub id: i64,
    pub kind: SubmissionKind,
    pub shareholder_id: i64,
    pub reg_account_number: String,
    pub name: String,
    pub chn: Option<String>,
    pub bvn: Option<String>,
    pub holdings: i64,
    pub rights_issue: i64,
    pub holdings_after: i64,
    pub action_type: RightsAction,
    pub shares_accepted: Option<i64>,
    pub shares_renounced: Option<i64>,
    pub apply_additional: bool,
    pub additional_shares: Option<i64>,
    pub amount_due: i64,
    pub additional_amount: Option<i64>,
    pub amount_payable: i64,
    pub payment_amount: Option<i64>,
    pub payment_method: &'static str,
    pub phone_number: String,
    pub contact_name: Option<String>,
    pub email: String,
    pub filled_form_path: Option<String>,
    pub receipt_path: Option<String>,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload accepted by the public submission endpoint. The action arrives as
/// raw text so an unrecognized tag surfaces as a validation error rather
/// than a deserialization failure; derived amounts are recomputed
/// server-side regardless of what the caller supplies.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub reg_account_number: String,
    #[serde(default)]
    pub chn: Option<String>,
    #[serde(default)]
    pub bvn: Option<String>,
    pub action_type: String,
    #[serde(default)]
    pub shares_accepted: Option<i64>,
    #[serde(default)]
    pub shares_renounced: Option<i64>,
    #[serde(default)]
    pub apply_additional: bool,
    #[serde(default)]
    pub additional_shares: Option<i64>,
    #[serde(default)]
    pub amount_due: i64,
    #[serde(default)]
    pub additional_amount: Option<i64>,
    #[serde(default)]
    pub amount_payable: Option<i64>,
    #[serde(default)]
    pub payment_amount: Option<i64>,
    #[serde(default)]
    pub additional_payment_cheque_number: Option<String>,
    #[serde(default)]
    pub partial_payment_cheque_number: Option<String>,
    #[serde(default)]
    pub contact_name: Option<String>,
    pub email: String,
    #[serde(default)]
    pub mobile_phone: Option<String>,
    #[serde(default)]
    pub daytime_phone: Option<String>,
    #[serde(default)]
    pub filled_form_path: Option<String>,
    #[serde(default)]
    pub receipt_path: Option<String>,
}

/// Validated record ready for insertion. Timestamps and the row id are
/// assigned by the store.
#[derive(Debug, Clone)]
pub struct SubmissionDraft {
    pub kind: SubmissionKind,
    pub shareholder_id: i64,
    pub reg_account_number: String,
    pub name: String,
    pub chn: Option<String>,
    pub bvn: Option<String>,
    pub holdings: i64,
    pub rights_issue: i64,
    pub holdings_after: i64,
    pub action: RightsAction,
    pub shares_accepted: Option<i64>,
    pub shares_renounced: Option<i64>,
    pub apply_additional: bool,
    pub additional_shares: Option<i64>,
    pub amount_due: i64,
    pub additional_amount: Option<i64>,
    pub amount_payable: i64,
    pub payment_amount: Option<i64>,
    pub additional_payment_cheque_number: Option<String>,
    pub partial_payment_cheque_number: Option<String>,
    pub contact_name: Option<String>,
    pub email: String,
    pub mobile_phone: Option<String>,
    pub daytime_phone: Option<String>,
    pub filled_form_path: Option<String>,
    pub receipt_path: Option<String>,
    pub status: SubmissionStatus,
}

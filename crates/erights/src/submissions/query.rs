use std::cmp::Ordering;

use serde::Serialize;

use super::domain::{RightsAction, Submission, SubmissionKind};

/// Rights-claiming buckets accepted by the listing and export filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightsClaiming {
    Full,
    Renounced,
}

impl RightsClaiming {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "full" => Some(RightsClaiming::Full),
            "renounced" => Some(RightsClaiming::Renounced),
            _ => None,
        }
    }

    pub const fn action(self) -> RightsAction {
        match self {
            RightsClaiming::Full => RightsAction::FullAcceptance,
            RightsClaiming::Renounced => RightsAction::RenunciationPartial,
        }
    }
}

/// Filter applied identically by every store backend. The search term is a
/// case-insensitive substring match ORed across the identity and contact
/// columns; status is an exact label match ("All Status" is the UI's
/// no-filter sentinel and is ignored).
#[derive(Debug, Clone, Default)]
pub struct SubmissionFilter {
    pub kind: Option<SubmissionKind>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub claiming: Option<RightsClaiming>,
}

impl SubmissionFilter {
    pub fn for_kind(kind: SubmissionKind) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search.filter(|term| !term.trim().is_empty());
        self
    }

    pub fn with_status(mut self, status: Option<String>) -> Self {
        self.status = status
            .filter(|value| !value.trim().is_empty() && value != "All Status")
            .map(|value| value.to_lowercase());
        self
    }

    pub fn with_claiming(mut self, claiming: Option<&str>) -> Self {
        self.claiming = claiming.and_then(RightsClaiming::parse);
        self
    }

    /// Reference semantics for the in-memory store; the SQL backend must
    /// produce the same row set.
    pub fn matches(&self, submission: &Submission) -> bool {
        if let Some(kind) = self.kind {
            if submission.kind != kind {
                return false;
            }
        }

        if let Some(status) = self.status.as_deref() {
            if submission.status.label() != status {
                return false;
            }
        }

        if let Some(claiming) = self.claiming {
            if submission.action != claiming.action() {
                return false;
            }
        }

        if let Some(term) = self.search.as_deref() {
            let needle = term.to_lowercase();
            let haystacks = [
                Some(submission.name.as_str()),
                Some(submission.reg_account_number.as_str()),
                submission.chn.as_deref(),
                Some(submission.email.as_str()),
                submission.bvn.as_deref(),
            ];
            let hit = haystacks
                .into_iter()
                .flatten()
                .any(|value| value.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Sort columns reachable from the API. The allow-list is a security
/// control: a requested field that is not listed here silently falls back
/// to `created_at` and never reaches SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Name,
    RegAccountNumber,
    Status,
    AmountPayable,
}

impl SortField {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw {
            Some("created_at") | None => SortField::CreatedAt,
            Some("name") => SortField::Name,
            Some("reg_account_number") => SortField::RegAccountNumber,
            Some("status") => SortField::Status,
            Some("amount_payable") => SortField::AmountPayable,
            Some(_) => SortField::CreatedAt,
        }
    }

    pub const fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Name => "name",
            SortField::RegAccountNumber => "reg_account_number",
            SortField::Status => "status",
            SortField::AmountPayable => "amount_payable",
        }
    }

    /// Column comparison used by the in-memory store.
    pub fn compare(self, a: &Submission, b: &Submission) -> Ordering {
        match self {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Name => a.name.cmp(&b.name),
            SortField::RegAccountNumber => a.reg_account_number.cmp(&b.reg_account_number),
            SortField::Status => a.status.label().cmp(b.status.label()),
            SortField::AmountPayable => a.amount_payable.cmp(&b.amount_payable),
        }
        .then(a.id.cmp(&b.id))
    }
}

/// Sort direction; anything unrecognized falls back to descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        match raw.map(str::to_ascii_uppercase).as_deref() {
            Some("ASC") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub const fn keyword(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// 1-indexed page request. Page numbers below one clamp to one; a zero
/// limit clamps to one row to keep the offset arithmetic defined.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u64,
    pub limit: u64,
}

impl PageRequest {
    pub const DEFAULT_LIMIT: u64 = 10;

    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(Self::DEFAULT_LIMIT).max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// Everything the listing endpoints accept, already normalized through the
/// allow-lists.
#[derive(Debug, Clone)]
pub struct ListRequest {
    pub filter: SubmissionFilter,
    pub sort: SortField,
    pub order: SortOrder,
    pub page: PageRequest,
}

/// Page metadata mirrored to the API as `pagination`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
    pub limit: u64,
}

impl Pagination {
    pub fn for_page(request: PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(request.limit);
        Self {
            current_page: request.page,
            total_pages,
            total_count,
            has_next: request.page < total_pages,
            has_prev: request.page > 1 && total_count > 0,
            limit: request.limit,
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

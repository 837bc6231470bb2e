use chrono::{DateTime, Utc};

use super::domain::Submission;

/// One export column: a header label paired with the accessor that renders
/// the cell for a row. Header and data rows are generated from the same
/// ordered list, so the two can never drift apart.
pub struct ExportColumn {
    pub label: &'static str,
    accessor: fn(&Submission) -> String,
}

impl ExportColumn {
    pub fn new(label: &'static str, accessor: fn(&Submission) -> String) -> Self {
        Self { label, accessor }
    }

    pub fn render(&self, submission: &Submission) -> String {
        (self.accessor)(submission)
    }
}

/// Split a full name into (surname, other names): the surname is the last
/// whitespace-delimited token, the other names are the remaining tokens
/// joined by single spaces. An empty name yields two empty strings.
pub fn split_name(name: &str) -> (String, String) {
    let mut tokens: Vec<&str> = name.split_whitespace().collect();
    match tokens.pop() {
        Some(surname) => (surname.to_string(), tokens.join(" ")),
        None => (String::new(), String::new()),
    }
}

/// Subscription dates render in the en-NG short style: day/month/year.
fn date_cell(value: Option<DateTime<Utc>>) -> String {
    match value {
        Some(timestamp) => timestamp.format("%d/%m/%Y").to_string(),
        None => String::new(),
    }
}

fn count_cell(value: Option<i64>) -> String {
    value.unwrap_or(0).to_string()
}

fn text_cell(value: Option<&str>) -> String {
    value.unwrap_or("").to_string()
}

/// Columns for the legacy form-channel export (`/export`).
pub fn form_columns() -> Vec<ExportColumn> {
    vec![
        ExportColumn::new("Subscription Date", |s| date_cell(Some(s.created_at))),
        ExportColumn::new("Registrars Account Number", |s| {
            s.reg_account_number.clone()
        }),
        ExportColumn::new("Surname", |s| split_name(&s.name).0),
        ExportColumn::new("Other Names", |s| split_name(&s.name).1),
        ExportColumn::new("Acceptance Type", |s| s.action.label().to_string()),
        ExportColumn::new("Shares Accepted", |s| count_cell(s.shares_accepted)),
        ExportColumn::new("Shares Renounced", |s| count_cell(s.shares_renounced)),
        ExportColumn::new("Additional Shares", |s| count_cell(s.additional_shares)),
        ExportColumn::new("Holdings", |s| s.holdings.to_string()),
        ExportColumn::new("Rights Issue", |s| s.rights_issue.to_string()),
        ExportColumn::new("Holdings After", |s| s.holdings_after.to_string()),
        ExportColumn::new("Amount Payable", |s| s.amount_payable.to_string()),
        ExportColumn::new("Contact Name", |s| text_cell(s.contact_name.as_deref())),
        ExportColumn::new("Email", |s| s.email.clone()),
        ExportColumn::new("Status", |s| s.status.label().to_string()),
    ]
}

/// Columns for the rights-portal export (`/export-rights`), including the
/// derived payment method and share totals.
pub fn rights_columns() -> Vec<ExportColumn> {
    vec![
        ExportColumn::new("Subscription Date", |s| date_cell(Some(s.created_at))),
        ExportColumn::new("Registrars Account Number", |s| {
            s.reg_account_number.clone()
        }),
        ExportColumn::new("Surname", |s| split_name(&s.name).0),
        ExportColumn::new("Other Names", |s| split_name(&s.name).1),
        ExportColumn::new("CHN", |s| text_cell(s.chn.as_deref())),
        ExportColumn::new("BVN", |s| text_cell(s.bvn.as_deref())),
        ExportColumn::new("Phone Number", |s| s.phone_number().to_string()),
        ExportColumn::new("Email", |s| s.email.clone()),
        ExportColumn::new("Holdings", |s| s.holdings.to_string()),
        ExportColumn::new("Rights Issue", |s| s.rights_issue.to_string()),
        ExportColumn::new("Additional Shares", |s| count_cell(s.additional_shares)),
        ExportColumn::new("Holdings After", |s| s.holdings_after.to_string()),
        ExportColumn::new("Amount Payable", |s| s.amount_payable.to_string()),
        ExportColumn::new("Payment Method", |s| {
            s.payment_method().label().to_string()
        }),
        ExportColumn::new("Total Shares Accepted & Paid For", |s| {
            s.total_shares_taken().to_string()
        }),
        ExportColumn::new("Shares Renounced", |s| count_cell(s.shares_renounced)),
    ]
}

/// Render rows as CSV. Every field is quoted; embedded quotes are doubled.
pub fn write_csv(columns: &[ExportColumn], rows: &[Submission]) -> Result<String, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    writer.write_record(columns.iter().map(|column| column.label))?;
    for row in rows {
        writer.write_record(columns.iter().map(|column| column.render(row)))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| err.into_error())
        .map_err(csv::Error::from)?;
    Ok(String::from_utf8(bytes).expect("csv output is valid utf-8"))
}

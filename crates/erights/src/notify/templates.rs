//! HTML bodies for the two transactional emails. Layout and phrasing follow
//! the registrar's existing notification styling.

use crate::submissions::{RightsAction, Submission};

/// Human label and accent color for the acceptance decision.
fn acceptance_status(submission: &Submission) -> (&'static str, &'static str) {
    match submission.action {
        RightsAction::FullAcceptance => {
            if submission.apply_additional {
                ("Full Acceptance with Additional Shares", "#059669")
            } else {
                ("Full Acceptance Only", "#10b981")
            }
        }
        RightsAction::RenunciationPartial => {
            if submission.shares_renounced.unwrap_or(0) > 0 {
                ("Partial Acceptance with Renunciation", "#f59e0b")
            } else {
                ("Partial Acceptance", "#fbbf24")
            }
        }
    }
}

/// Render 1234567 as "1,234,567" the way the dashboard displays amounts.
fn group_digits(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        "<tr>\
         <td style=\"padding: 8px 0; font-weight: bold; color: #374151;\">{label}</td>\
         <td style=\"padding: 8px 0;\">{value}</td>\
         </tr>"
    )
}

fn upload_line(label: &str, present: bool) -> String {
    let state = if present { "Uploaded" } else { "Not uploaded" };
    format!("<li style=\"margin: 8px 0;\">{label}: {state}</li>")
}

/// Alert sent to the administrator address after every new submission.
pub fn admin_alert_html(submission: &Submission) -> String {
    let (status_label, status_color) = acceptance_status(submission);

    let mut rows = String::new();
    rows.push_str(&detail_row(
        "CHN:",
        submission.chn.as_deref().unwrap_or(""),
    ));
    rows.push_str(&detail_row(
        "Reg Account Number:",
        &submission.reg_account_number,
    ));
    rows.push_str(&detail_row("Name:", &submission.name));
    rows.push_str(&detail_row("Holdings:", &group_digits(submission.holdings)));
    rows.push_str(&detail_row(
        "Rights Issue:",
        &group_digits(submission.rights_issue),
    ));
    rows.push_str(&format!(
        "<tr>\
         <td style=\"padding: 8px 0; font-weight: bold; color: #374151;\">Acceptance Status:</td>\
         <td style=\"padding: 8px 0;\"><span style=\"color: {status_color}; font-weight: bold;\">{status_label}</span></td>\
         </tr>"
    ));

    if submission.apply_additional {
        rows.push_str(&detail_row(
            "Additional Shares Applied:",
            &format!(
                "{} shares",
                group_digits(submission.additional_shares.unwrap_or(0))
            ),
        ));
        rows.push_str(&detail_row(
            "Additional Amount:",
            &format!(
                "&#8358;{}",
                group_digits(submission.additional_amount.unwrap_or(0))
            ),
        ));
    }

    if submission.shares_renounced.unwrap_or(0) > 0 {
        rows.push_str(&detail_row(
            "Shares Renounced:",
            &format!(
                "{} shares",
                group_digits(submission.shares_renounced.unwrap_or(0))
            ),
        ));
    }

    rows.push_str(&detail_row(
        "Amount Due:",
        &format!("&#8358;{}", group_digits(submission.amount_due)),
    ));
    rows.push_str(&detail_row(
        "Total Amount Payable:",
        &format!("&#8358;{}", group_digits(submission.amount_payable)),
    ));

    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #2563eb;\">New Rights Issue Form Submission</h2>\
         <div style=\"background-color: #f8fafc; padding: 20px; border-radius: 8px; margin: 20px 0;\">\
         <h3 style=\"color: #1e40af; margin-top: 0;\">Shareholder Information</h3>\
         <table style=\"width: 100%; border-collapse: collapse;\">{rows}</table>\
         </div>\
         <div style=\"background-color: #f0fdf4; padding: 20px; border-radius: 8px; margin: 20px 0;\">\
         <h3 style=\"color: #166534; margin-top: 0;\">Files Uploaded</h3>\
         <ul style=\"margin: 0; padding-left: 20px;\">{filled}{receipt}</ul>\
         </div>\
         <div style=\"background-color: #fef3c7; padding: 20px; border-radius: 8px; margin: 20px 0;\">\
         <h3 style=\"color: #92400e; margin-top: 0;\">Submission Details</h3>\
         <p style=\"margin: 8px 0;\"><strong>Submission ID:</strong> {id}</p>\
         <p style=\"margin: 8px 0;\"><strong>Submitted:</strong> {submitted}</p>\
         <p style=\"margin: 8px 0;\"><strong>Status:</strong> <span style=\"color: #059669; font-weight: bold;\">{status}</span></p>\
         </div>\
         <hr style=\"border: none; border-top: 1px solid #e5e7eb; margin: 30px 0;\">\
         <p style=\"color: #6b7280; font-size: 14px; text-align: center;\">\
         This is an automated notification from the Rights Issue Management System.\
         </p>\
         </div>",
        rows = rows,
        filled = upload_line("Filled Form", submission.filled_form_path.is_some()),
        receipt = upload_line("Payment Receipt", submission.receipt_path.is_some()),
        id = submission.id,
        submitted = submission.created_at.format("%d/%m/%Y %H:%M"),
        status = submission.status.label(),
    )
}

/// Confirmation sent to the shareholder's own address.
pub fn confirmation_html(submission: &Submission) -> String {
    let (status_label, status_color) = acceptance_status(submission);

    let mut rows = String::new();
    rows.push_str(&detail_row(
        "Registration Number:",
        &submission.reg_account_number,
    ));
    rows.push_str(&detail_row(
        "Current Holdings:",
        &group_digits(submission.holdings),
    ));
    rows.push_str(&detail_row(
        "Rights Allotted:",
        &group_digits(submission.rights_issue),
    ));
    rows.push_str(&format!(
        "<tr>\
         <td style=\"padding: 8px 0; font-weight: bold; color: #374151;\">Acceptance Status:</td>\
         <td style=\"padding: 8px 0;\"><span style=\"color: {status_color}; font-weight: bold;\">{status_label}</span></td>\
         </tr>"
    ));

    if submission.apply_additional {
        rows.push_str(&detail_row(
            "Additional Shares Applied:",
            &format!(
                "{} shares",
                group_digits(submission.additional_shares.unwrap_or(0))
            ),
        ));
    }

    if submission.shares_renounced.unwrap_or(0) > 0 {
        rows.push_str(&detail_row(
            "Shares Renounced:",
            &format!(
                "{} shares",
                group_digits(submission.shares_renounced.unwrap_or(0))
            ),
        ));
    }

    rows.push_str(&detail_row(
        "Amount Due:",
        &format!("&#8358;{}", group_digits(submission.amount_due)),
    ));
    rows.push_str(&detail_row(
        "Total Amount Payable:",
        &format!("&#8358;{}", group_digits(submission.amount_payable)),
    ));
    rows.push_str(&detail_row(
        "Submission Date:",
        &submission.created_at.format("%d/%m/%Y %H:%M").to_string(),
    ));

    format!(
        "<div style=\"font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;\">\
         <h2 style=\"color: #2563eb;\">Rights Issue Form Submission Confirmation</h2>\
         <p>Dear {name},</p>\
         <p>Thank you for submitting your Rights Issue Form. Your submission has been received and is being processed.</p>\
         <div style=\"background-color: #f8fafc; padding: 20px; border-radius: 8px; margin: 20px 0;\">\
         <h3 style=\"color: #1e40af; margin-top: 0;\">Submission Summary</h3>\
         <table style=\"width: 100%; border-collapse: collapse;\">{rows}</table>\
         </div>\
         <p>Please find attached a copy of your completed Rights Issue Form for your records.</p>\
         <p>If you have any questions about your submission, please contact our support team.</p>\
         <p>Best regards,<br>The Rights Issue Team</p>\
         <hr style=\"border: none; border-top: 1px solid #e5e7eb; margin: 30px 0;\">\
         <p style=\"color: #6b7280; font-size: 12px; text-align: center;\">\
         This is an automated message. Please do not reply to this email.\
         </p>\
         </div>",
        name = submission.name,
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submissions::domain::{SubmissionKind, SubmissionStatus};
    use chrono::{TimeZone, Utc};

    fn submission(action: RightsAction) -> Submission {
        Submission {
            id: 5,
            kind: SubmissionKind::Rights,
            shareholder_id: 2,
            reg_account_number: "REG-0005".to_string(),
            name: "Bola Akande".to_string(),
            chn: Some("C0000005".to_string()),
            bvn: None,
            holdings: 1500000,
            rights_issue: 300000,
            holdings_after: 1800000,
            action,
            shares_accepted: Some(300000),
            shares_renounced: None,
            apply_additional: true,
            additional_shares: Some(50000),
            amount_due: 20000,
            additional_amount: Some(5000),
            amount_payable: 25000,
            payment_amount: None,
            additional_payment_cheque_number: None,
            partial_payment_cheque_number: None,
            contact_name: None,
            email: "bola@example.com".to_string(),
            mobile_phone: None,
            daytime_phone: None,
            filled_form_path: Some("forms/5.pdf".to_string()),
            receipt_path: None,
            status: SubmissionStatus::Pending,
            created_at: Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2025, 6, 2, 14, 0, 0).unwrap(),
        }
    }

    #[test]
    fn digits_group_in_threes() {
        assert_eq!(group_digits(0), "0");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(1000), "1,000");
        assert_eq!(group_digits(1234567), "1,234,567");
        assert_eq!(group_digits(-25000), "-25,000");
    }

    #[test]
    fn admin_alert_shows_amounts_and_status() {
        let html = admin_alert_html(&submission(RightsAction::FullAcceptance));
        assert!(html.contains("Full Acceptance with Additional Shares"));
        assert!(html.contains("1,500,000"));
        assert!(html.contains("&#8358;25,000"));
        assert!(html.contains("Filled Form: Uploaded"));
        assert!(html.contains("Payment Receipt: Not uploaded"));
    }

    #[test]
    fn renunciation_shows_renounced_shares() {
        let mut record = submission(RightsAction::RenunciationPartial);
        record.apply_additional = false;
        record.shares_renounced = Some(120000);
        let html = confirmation_html(&record);
        assert!(html.contains("Partial Acceptance with Renunciation"));
        assert!(html.contains("120,000 shares"));
        assert!(html.contains("Dear Bola Akande"));
    }
}

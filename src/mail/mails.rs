// mail/mails.rs
use crate::utils::currency::format_cents_as_dollars;

#[derive(Debug, Clone)]
pub struct EmailContent {
    pub subject: String,
    pub html: String,
}

fn wrap_body(heading: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
  <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
      <div style="background-color: #2563eb; color: white; padding: 20px; text-align: center;">
        <h1>Cleaning Management CRM</h1>
      </div>
      <div style="padding: 20px; background-color: #f9fafb;">
        <h2>{heading}</h2>
        {body}
      </div>
      <div style="text-align: center; color: #6b7280; font-size: 12px; margin-top: 20px;">
        <p>This is an automated message from Cleaning Management CRM.</p>
      </div>
    </div>
  </body>
</html>"#
    )
}

pub fn payment_approved_email(
    cleaner_name: &str,
    payout_cents: i64,
    task_ref: &str,
) -> EmailContent {
    EmailContent {
        subject: format!("Payment approved for task #{}", task_ref),
        html: wrap_body(
            &format!("Hello {},", cleaner_name),
            &format!(
                "<p>Your payment of <strong>{}</strong> for task #{} has been approved \
                 and sent to your connected payout account.</p>\
                 <p>Funds usually arrive within 2 business days.</p>",
                format_cents_as_dollars(payout_cents),
                task_ref
            ),
        ),
    }
}

pub fn payment_failed_email(task_ref: &str, reason: &str) -> EmailContent {
    EmailContent {
        subject: format!("Payment failed for task #{}", task_ref),
        html: wrap_body(
            "Payment processing failed",
            &format!(
                "<p>The charge for task #{} could not be processed.</p>\
                 <p>Reason: <strong>{}</strong></p>\
                 <p>No money moved. The task remains pending review so you can retry.</p>",
                task_ref, reason
            ),
        ),
    }
}

pub fn payout_failed_email(task_ref: &str, charge_reference: &str, reason: &str) -> EmailContent {
    EmailContent {
        subject: format!("ACTION REQUIRED: payout failed for task #{}", task_ref),
        html: wrap_body(
            "Cleaner payout failed after the client was charged",
            &format!(
                "<p>The client charge for task #{} succeeded (reference \
                 <strong>{}</strong>) but the cleaner payout failed.</p>\
                 <p>Reason: <strong>{}</strong></p>\
                 <p>Money was taken from the client but not forwarded. This \
                 requires manual reconciliation before re-approving the task, \
                 otherwise the client may be charged twice.</p>",
                task_ref, charge_reference, reason
            ),
        ),
    }
}

pub fn invitation_email(name: &str, role: &str, token: &str, app_url: &str) -> EmailContent {
    let setup_url = format!("{}/auth/signup?token={}", app_url, token);
    EmailContent {
        subject: "You've been invited to Cleaning Management CRM".to_string(),
        html: wrap_body(
            &format!("Hello {},", name),
            &format!(
                "<p>You've been invited to join Cleaning Management CRM as a \
                 <strong>{}</strong>.</p>\
                 <p>To complete your registration and set up your password, open \
                 the link below:</p>\
                 <p><a href=\"{setup_url}\">Set Up Your Password</a></p>\
                 <p style=\"word-break: break-all; color: #2563eb;\">{setup_url}</p>\
                 <p>This link will expire in 24 hours.</p>",
                role
            ),
        ),
    }
}

pub fn invoice_email(
    recipient_name: &str,
    invoice_number: &str,
    total_cents: i64,
    due_date: &str,
) -> EmailContent {
    EmailContent {
        subject: format!("Invoice {} from Cleaning Management CRM", invoice_number),
        html: wrap_body(
            &format!("Hello {},", recipient_name),
            &format!(
                "<p>Invoice <strong>{}</strong> has been issued to you.</p>\
                 <p>Amount due: <strong>{}</strong></p>\
                 <p>Due date: <strong>{}</strong></p>",
                invoice_number,
                format_cents_as_dollars(total_cents),
                due_date
            ),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_approved_mentions_amount_and_task() {
        let email = payment_approved_email("Maria", 5000, "abc12345");
        assert!(email.subject.contains("abc12345"));
        assert!(email.html.contains("$50.00"));
        assert!(email.html.contains("Maria"));
    }

    #[test]
    fn test_payout_failed_retains_charge_reference() {
        let email = payout_failed_email("abc12345", "pi_777", "No such destination");
        assert!(email.html.contains("pi_777"));
        assert!(email.html.contains("manual reconciliation"));
    }

    #[test]
    fn test_invitation_embeds_token_link() {
        let email = invitation_email("Joe", "manager", "tok123", "https://crm.example.com");
        assert!(email
            .html
            .contains("https://crm.example.com/auth/signup?token=tok123"));
    }
}

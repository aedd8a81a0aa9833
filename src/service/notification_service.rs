// service/notification_service.rs
use std::sync::Arc;

use crate::{
    mail::{mails, sendmail::Mailer},
    models::usermodel::User,
};

/// Email notifications around the settlement workflow. Every send is
/// fire-and-forget from the orchestrator's perspective: failures are logged
/// and never block or roll back a settlement.
#[derive(Debug, Clone)]
pub struct NotificationService {
    mailer: Arc<Mailer>,
}

impl NotificationService {
    pub fn new(mailer: Arc<Mailer>) -> Self {
        Self { mailer }
    }

    pub async fn notify_payment_approved(&self, cleaner: &User, payout_cents: i64, task_ref: &str) {
        let email = mails::payment_approved_email(&cleaner.name, payout_cents, task_ref);
        self.deliver(&cleaner.email, email).await;
    }

    pub async fn notify_payment_failed(&self, manager: &User, task_ref: &str, reason: &str) {
        let email = mails::payment_failed_email(task_ref, reason);
        self.deliver(&manager.email, email).await;
    }

    pub async fn notify_payout_failed(
        &self,
        manager: &User,
        task_ref: &str,
        charge_reference: &str,
        reason: &str,
    ) {
        let email = mails::payout_failed_email(task_ref, charge_reference, reason);
        self.deliver(&manager.email, email).await;
    }

    pub async fn notify_invited(&self, to_email: &str, name: &str, role: &str, token: &str, app_url: &str) {
        let email = mails::invitation_email(name, role, token, app_url);
        self.deliver(to_email, email).await;
    }

    pub async fn notify_invoice_sent(
        &self,
        to_email: &str,
        recipient_name: &str,
        invoice_number: &str,
        total_cents: i64,
        due_date: &str,
    ) {
        let email = mails::invoice_email(recipient_name, invoice_number, total_cents, due_date);
        self.deliver(to_email, email).await;
    }

    async fn deliver(&self, to_email: &str, email: mails::EmailContent) {
        if let Err(e) = self.mailer.send(to_email, &email.subject, &email.html).await {
            tracing::warn!("Notification email to {} not delivered: {}", to_email, e);
        }
    }
}

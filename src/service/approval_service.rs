// service/approval_service.rs
//
// Orchestrates a payment approval end to end: precondition checks, fee
// calculation, the two-phase gateway settlement, the ledger write and the
// task status flip. Preconditions fail before any money moves; once the
// gateway has been called, every terminal path writes a transaction row
// before this service returns.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::clientdb::ClientExt;
use crate::db::db::DBClient;
use crate::db::taskdb::TaskExt;
use crate::db::transactiondb::TransactionExt;
use crate::db::userdb::UserExt;
use crate::models::clientmodel::Client;
use crate::models::taskmodel::Task;
use crate::models::transactionmodel::{
    generate_transaction_reference, FeeMode, NewTransaction, Transaction, TransactionStatus,
};
use crate::models::usermodel::User;
use crate::service::error::ServiceError;
use crate::service::fees::{estimate_gateway_fee, FeeCalculator};
use crate::service::notification_service::NotificationService;
use crate::service::payment_provider::PaymentGateway;
use crate::service::settlement::{self, SettlementOutcome, SettlementRequest};

/// The slice of persistence the orchestrator touches. `DBClient` is the
/// production implementation; tests substitute an in-memory store so the
/// precondition and ledger paths can be exercised without a database.
#[async_trait]
pub trait ApprovalStore: Send + Sync {
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error>;

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error>;

    async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>, sqlx::Error>;

    async fn find_or_create_client_by_customer_id(
        &self,
        stripe_customer_id: &str,
        name: Option<&str>,
    ) -> Result<Client, sqlx::Error>;

    async fn record_transaction(
        &self,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, sqlx::Error>;

    async fn approve_task_if_pending(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error>;
}

#[async_trait]
impl ApprovalStore for DBClient {
    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        TaskExt::get_task(self, task_id).await
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
        UserExt::get_user(self, Some(user_id), None, None).await
    }

    async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>, sqlx::Error> {
        ClientExt::get_client(self, client_id).await
    }

    async fn find_or_create_client_by_customer_id(
        &self,
        stripe_customer_id: &str,
        name: Option<&str>,
    ) -> Result<Client, sqlx::Error> {
        ClientExt::find_or_create_client_by_customer_id(self, stripe_customer_id, name).await
    }

    async fn record_transaction(
        &self,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        TransactionExt::record_transaction(self, new_transaction).await
    }

    async fn approve_task_if_pending(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        TaskExt::approve_task_if_pending(self, task_id).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalResolution {
    /// Charge and payout both settled; the task is approved.
    Settled,
    /// Charge accepted but not yet settled; payout withheld, task left
    /// pending review so approval can be retried once the charge lands.
    ChargePending,
}

#[derive(Debug)]
pub struct ApprovalOutcome {
    pub task: Task,
    pub transaction: Transaction,
    pub resolution: ApprovalResolution,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ChargeBreakdown {
    pub amount_charged: i64,
    pub cleaner_payout: i64,
    pub platform_fee: i64,
    pub estimated_gateway_fee: i64,
    pub platform_net: i64,
}

impl ChargeBreakdown {
    pub fn for_split(amount_charged: i64, cleaner_payout: i64) -> Self {
        let platform_fee = amount_charged - cleaner_payout;
        let estimated_gateway_fee = estimate_gateway_fee(amount_charged);
        ChargeBreakdown {
            amount_charged,
            cleaner_payout,
            platform_fee,
            estimated_gateway_fee,
            platform_net: platform_fee - estimated_gateway_fee,
        }
    }
}

#[derive(Debug)]
pub struct DirectChargeOutcome {
    pub transaction: Transaction,
    pub breakdown: ChargeBreakdown,
    pub pending: bool,
}

pub struct ApprovalService {
    store: Arc<dyn ApprovalStore>,
    gateway: Arc<dyn PaymentGateway>,
    fees: FeeCalculator,
    notifications: Arc<NotificationService>,
}

impl ApprovalService {
    pub fn new(
        store: Arc<dyn ApprovalStore>,
        gateway: Arc<dyn PaymentGateway>,
        fees: FeeCalculator,
        notifications: Arc<NotificationService>,
    ) -> Self {
        ApprovalService {
            store,
            gateway,
            fees,
            notifications,
        }
    }

    /// Approve a reviewed task and settle its payment.
    ///
    /// The payer is charged the cleaner fee plus the platform markup; on a
    /// settled charge the cleaner receives the fee as payout and the task
    /// flips to approved. Charge failures leave the task reviewable and no
    /// money moved. A payout failure after a settled charge is returned as
    /// `ServiceError::PartialSettlement` and requires manual reconciliation.
    pub async fn approve_task(
        &self,
        task_id: Uuid,
        manager: &User,
        customer_id: &str,
        payer_name: Option<&str>,
        cleaner_fee_cents: i64,
        notes: Option<String>,
    ) -> Result<ApprovalOutcome, ServiceError> {
        let task = self
            .store
            .get_task(task_id)
            .await?
            .ok_or(ServiceError::TaskNotFound(task_id))?;

        if !task.status.is_reviewable() {
            return Err(ServiceError::TaskNotReviewable(task.id, task.status));
        }

        let cleaner_id = task
            .cleaner_id
            .ok_or(ServiceError::NoCleanerAssigned(task.id))?;

        let cleaner = self
            .store
            .get_user_by_id(cleaner_id)
            .await?
            .ok_or(ServiceError::NoCleanerAssigned(task.id))?;

        if !cleaner.is_onboarded_for_payouts() {
            return Err(ServiceError::CleanerNotOnboarded(cleaner.id));
        }
        let payout_account = cleaner
            .payout_account_id
            .clone()
            .ok_or(ServiceError::CleanerNotOnboarded(cleaner.id))?;

        let charge_cents = self.fees.guest_charge_from_fee(cleaner_fee_cents)?;

        let client = self
            .store
            .find_or_create_client_by_customer_id(customer_id, payer_name)
            .await?;

        let reference = generate_transaction_reference();
        let description = format!("Cleaning at {}", task.property_name);
        let request = SettlementRequest {
            customer_id,
            payout_account_id: Some(payout_account.as_str()),
            charge_cents,
            payout_cents: cleaner_fee_cents,
            description: &description,
            reference: &reference,
            metadata: vec![
                ("task_id".to_string(), task.id.to_string()),
                ("source_task_id".to_string(), task.source_task_id.clone()),
            ],
        };

        let outcome = settlement::execute(self.gateway.as_ref(), &request).await;

        match outcome {
            SettlementOutcome::Completed {
                charge_reference,
                payout_reference,
            } => {
                let record = NewTransaction::new(
                    Some(task.id),
                    client.id,
                    Some(cleaner.id),
                    manager.id,
                    charge_cents,
                    cleaner_fee_cents,
                    FeeMode::AutoPercent,
                    TransactionStatus::Completed,
                    reference,
                    Some(charge_reference),
                    payout_reference,
                    notes,
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                let approved = self.store.approve_task_if_pending(task.id).await?;
                let task = match approved {
                    Some(task) => task,
                    None => {
                        // Money already moved; the lost race is logged, not
                        // unwound.
                        tracing::error!(
                            task_id = %task.id,
                            reference = %transaction.reference,
                            "Task was no longer pending after settlement"
                        );
                        task
                    }
                };

                self.notifications
                    .notify_payment_approved(&cleaner, cleaner_fee_cents, &task.source_task_id)
                    .await;

                Ok(ApprovalOutcome {
                    task,
                    transaction,
                    resolution: ApprovalResolution::Settled,
                })
            }
            SettlementOutcome::ChargePending { charge_reference } => {
                let record = NewTransaction::new(
                    Some(task.id),
                    client.id,
                    Some(cleaner.id),
                    manager.id,
                    charge_cents,
                    cleaner_fee_cents,
                    FeeMode::AutoPercent,
                    TransactionStatus::Pending,
                    reference,
                    Some(charge_reference),
                    None,
                    notes,
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                Ok(ApprovalOutcome {
                    task,
                    transaction,
                    resolution: ApprovalResolution::ChargePending,
                })
            }
            SettlementOutcome::ChargeFailed { error } => {
                let record = NewTransaction::new(
                    Some(task.id),
                    client.id,
                    Some(cleaner.id),
                    manager.id,
                    charge_cents,
                    cleaner_fee_cents,
                    FeeMode::AutoPercent,
                    TransactionStatus::Failed,
                    reference,
                    None,
                    None,
                    Some(format!("Charge failed: {}", error)),
                )?;
                self.store.record_transaction(&record).await?;

                self.notifications
                    .notify_payment_failed(manager, &task.source_task_id, &error.message)
                    .await;

                Err(ServiceError::Gateway(error))
            }
            SettlementOutcome::PayoutFailed {
                charge_reference,
                error,
            } => {
                let record = NewTransaction::new(
                    Some(task.id),
                    client.id,
                    Some(cleaner.id),
                    manager.id,
                    charge_cents,
                    cleaner_fee_cents,
                    FeeMode::AutoPercent,
                    TransactionStatus::Failed,
                    reference,
                    Some(charge_reference.clone()),
                    None,
                    Some(format!("Payout failed after charge: {}", error)),
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                self.notifications
                    .notify_payout_failed(
                        manager,
                        &task.source_task_id,
                        &charge_reference,
                        &error.message,
                    )
                    .await;

                Err(ServiceError::PartialSettlement {
                    transaction_id: transaction.id,
                    charge_reference,
                })
            }
        }
    }

    /// Charge a known client directly, optionally splitting a payout to an
    /// assigned cleaner. Without a cleaner the charge stands alone and the
    /// record is marked CHARGED rather than COMPLETED.
    #[allow(clippy::too_many_arguments)]
    pub async fn direct_charge(
        &self,
        manager: &User,
        client_id: Uuid,
        cleaner_id: Option<Uuid>,
        task_id: Option<Uuid>,
        amount_cents: i64,
        fee_mode: FeeMode,
        manual_payout_cents: Option<i64>,
        notes: Option<String>,
    ) -> Result<DirectChargeOutcome, ServiceError> {
        let split = self
            .fees
            .compute_split(amount_cents, fee_mode, manual_payout_cents)?;

        let client = self
            .store
            .get_client(client_id)
            .await?
            .ok_or(ServiceError::ClientNotFound(client_id))?;
        let customer_id = client
            .stripe_customer_id
            .clone()
            .ok_or(ServiceError::ClientNotChargeable(client.id))?;

        let cleaner = match cleaner_id {
            Some(cleaner_id) => {
                let cleaner = self
                    .store
                    .get_user_by_id(cleaner_id)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Validation(format!("Cleaner {} not found", cleaner_id))
                    })?;
                if !cleaner.is_onboarded_for_payouts() {
                    return Err(ServiceError::CleanerNotOnboarded(cleaner.id));
                }
                Some(cleaner)
            }
            None => None,
        };
        let payout_account = cleaner
            .as_ref()
            .and_then(|c| c.payout_account_id.as_deref());

        let reference = generate_transaction_reference();
        let description = format!("Direct charge for {}", client.name);
        let request = SettlementRequest {
            customer_id: &customer_id,
            payout_account_id: payout_account,
            charge_cents: amount_cents,
            payout_cents: split.payout,
            description: &description,
            reference: &reference,
            metadata: vec![("client_id".to_string(), client.id.to_string())],
        };

        let outcome = settlement::execute(self.gateway.as_ref(), &request).await;
        let breakdown = ChargeBreakdown::for_split(amount_cents, split.payout);
        let cleaner_ref = cleaner.as_ref().map(|c| c.id);

        match outcome {
            SettlementOutcome::Completed {
                charge_reference,
                payout_reference,
            } => {
                let status = if payout_reference.is_some() {
                    TransactionStatus::Completed
                } else {
                    TransactionStatus::Charged
                };
                let record = NewTransaction::new(
                    task_id,
                    client.id,
                    cleaner_ref,
                    manager.id,
                    amount_cents,
                    split.payout,
                    fee_mode,
                    status,
                    reference,
                    Some(charge_reference),
                    payout_reference,
                    notes,
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                if let Some(cleaner) = &cleaner {
                    if transaction.status == TransactionStatus::Completed {
                        self.notifications
                            .notify_payment_approved(cleaner, split.payout, &transaction.reference)
                            .await;
                    }
                }

                Ok(DirectChargeOutcome {
                    transaction,
                    breakdown,
                    pending: false,
                })
            }
            SettlementOutcome::ChargePending { charge_reference } => {
                let record = NewTransaction::new(
                    task_id,
                    client.id,
                    cleaner_ref,
                    manager.id,
                    amount_cents,
                    split.payout,
                    fee_mode,
                    TransactionStatus::Pending,
                    reference,
                    Some(charge_reference),
                    None,
                    notes,
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                Ok(DirectChargeOutcome {
                    transaction,
                    breakdown,
                    pending: true,
                })
            }
            SettlementOutcome::ChargeFailed { error } => {
                let record = NewTransaction::new(
                    task_id,
                    client.id,
                    cleaner_ref,
                    manager.id,
                    amount_cents,
                    split.payout,
                    fee_mode,
                    TransactionStatus::Failed,
                    reference,
                    None,
                    None,
                    Some(format!("Charge failed: {}", error)),
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                self.notifications
                    .notify_payment_failed(manager, &transaction.reference, &error.message)
                    .await;

                Err(ServiceError::Gateway(error))
            }
            SettlementOutcome::PayoutFailed {
                charge_reference,
                error,
            } => {
                let record = NewTransaction::new(
                    task_id,
                    client.id,
                    cleaner_ref,
                    manager.id,
                    amount_cents,
                    split.payout,
                    fee_mode,
                    TransactionStatus::Failed,
                    reference,
                    Some(charge_reference.clone()),
                    None,
                    Some(format!("Payout failed after charge: {}", error)),
                )?;
                let transaction = self.store.record_transaction(&record).await?;

                self.notifications
                    .notify_payout_failed(
                        manager,
                        &transaction.reference,
                        &charge_reference,
                        &error.message,
                    )
                    .await;

                Err(ServiceError::PartialSettlement {
                    transaction_id: transaction.id,
                    charge_reference,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::config::Config;
    use crate::mail::sendmail::Mailer;
    use crate::models::taskmodel::TaskStatus;
    use crate::models::usermodel::UserRole;
    use crate::service::payment_provider::{
        ChargeReceipt, GatewayError, PaymentOutcome, PayoutReceipt,
    };

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Charge { amount: i64 },
        Payout { amount: i64 },
    }

    struct RecordingGateway {
        calls: Mutex<Vec<Call>>,
        charge_result: Result<ChargeReceipt, GatewayError>,
        payout_result: Result<PayoutReceipt, GatewayError>,
    }

    impl RecordingGateway {
        fn settling() -> Self {
            RecordingGateway {
                calls: Mutex::new(Vec::new()),
                charge_result: Ok(ChargeReceipt {
                    provider_id: "pi_ok".to_string(),
                    outcome: PaymentOutcome::Succeeded,
                }),
                payout_result: Ok(PayoutReceipt {
                    provider_id: "tr_ok".to_string(),
                    outcome: PaymentOutcome::Succeeded,
                }),
            }
        }

        fn declining() -> Self {
            let mut gateway = RecordingGateway::settling();
            gateway.charge_result = Ok(ChargeReceipt {
                provider_id: "pi_declined".to_string(),
                outcome: PaymentOutcome::Failed,
            });
            gateway
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for RecordingGateway {
        async fn charge_customer(
            &self,
            _customer_id: &str,
            amount_cents: i64,
            _description: &str,
            _reference: &str,
            _metadata: &[(String, String)],
        ) -> Result<ChargeReceipt, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Charge { amount: amount_cents });
            self.charge_result.clone()
        }

        async fn pay_worker(
            &self,
            _payout_account_id: &str,
            amount_cents: i64,
            _description: &str,
            _reference: &str,
        ) -> Result<PayoutReceipt, GatewayError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Payout { amount: amount_cents });
            self.payout_result.clone()
        }
    }

    struct InMemoryStore {
        task: Mutex<Option<Task>>,
        users: Mutex<Vec<User>>,
        transactions: Mutex<Vec<Transaction>>,
    }

    impl InMemoryStore {
        fn with_task(task: Task, users: Vec<User>) -> Self {
            InMemoryStore {
                task: Mutex::new(Some(task)),
                users: Mutex::new(users),
                transactions: Mutex::new(Vec::new()),
            }
        }

        fn task(&self) -> Option<Task> {
            self.task.lock().unwrap().clone()
        }

        fn transactions(&self) -> Vec<Transaction> {
            self.transactions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApprovalStore for InMemoryStore {
        async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
            Ok(self
                .task
                .lock()
                .unwrap()
                .clone()
                .filter(|t| t.id == task_id))
        }

        async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == user_id)
                .cloned())
        }

        async fn get_client(&self, _client_id: Uuid) -> Result<Option<Client>, sqlx::Error> {
            Ok(None)
        }

        async fn find_or_create_client_by_customer_id(
            &self,
            stripe_customer_id: &str,
            name: Option<&str>,
        ) -> Result<Client, sqlx::Error> {
            Ok(Client {
                id: Uuid::new_v4(),
                name: name.unwrap_or("Guest").to_string(),
                email: Client::placeholder_email(stripe_customer_id),
                phone: None,
                stripe_customer_id: Some(stripe_customer_id.to_string()),
                created_at: Some(Utc::now()),
                updated_at: Some(Utc::now()),
            })
        }

        async fn record_transaction(
            &self,
            new_transaction: &NewTransaction,
        ) -> Result<Transaction, sqlx::Error> {
            let transaction = Transaction {
                id: Uuid::new_v4(),
                task_id: new_transaction.task_id,
                client_id: new_transaction.client_id,
                cleaner_id: new_transaction.cleaner_id,
                manager_id: new_transaction.manager_id,
                amount_charged: new_transaction.amount_charged,
                cleaner_payout: new_transaction.cleaner_payout,
                platform_fee: new_transaction.platform_fee,
                fee_mode: new_transaction.fee_mode,
                status: new_transaction.status,
                reference: new_transaction.reference.clone(),
                charge_reference: new_transaction.charge_reference.clone(),
                payout_reference: new_transaction.payout_reference.clone(),
                notes: new_transaction.notes.clone(),
                created_at: Some(Utc::now()),
            };
            self.transactions.lock().unwrap().push(transaction.clone());
            Ok(transaction)
        }

        async fn approve_task_if_pending(
            &self,
            task_id: Uuid,
        ) -> Result<Option<Task>, sqlx::Error> {
            let mut slot = self.task.lock().unwrap();
            match slot.as_mut() {
                Some(task) if task.id == task_id && task.status == TaskStatus::PendingReview => {
                    task.status = TaskStatus::Approved;
                    Ok(Some(task.clone()))
                }
                _ => Ok(None),
            }
        }
    }

    fn test_config() -> Config {
        Config {
            database_url: "postgres://localhost/unused".to_string(),
            app_url: "http://localhost:3000".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_maxage: 60,
            port: 8000,
            stripe_secret_key: "sk_test_unused".to_string(),
            platform_fee_bps: 2000,
            task_webhook_secret: None,
            smtp_host: "localhost".to_string(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: "billing@example.com".to_string(),
        }
    }

    fn manager() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Dana".to_string(),
            email: "dana@example.com".to_string(),
            password_hash: Some("hash".to_string()),
            role: UserRole::Manager,
            is_active: true,
            payout_account_id: None,
            invite_token: None,
            invite_expires_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn cleaner(payout_account_id: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            password_hash: Some("hash".to_string()),
            role: UserRole::Cleaner,
            is_active: true,
            payout_account_id: payout_account_id.map(String::from),
            invite_token: None,
            invite_expires_at: None,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn task(cleaner_id: Option<Uuid>, status: TaskStatus) -> Task {
        Task {
            id: Uuid::new_v4(),
            source_task_id: "hcp_900".to_string(),
            property_name: "12 Ocean Ave".to_string(),
            cleaner_id,
            status,
            completed_at: Some(Utc::now()),
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        }
    }

    fn service(store: Arc<InMemoryStore>, gateway: Arc<RecordingGateway>) -> ApprovalService {
        let config = test_config();
        let mailer = Arc::new(Mailer::new(&config).unwrap());
        ApprovalService::new(
            store,
            gateway,
            FeeCalculator::with_rate_bps(2000),
            Arc::new(NotificationService::new(mailer)),
        )
    }

    #[tokio::test]
    async fn unassigned_task_is_rejected_before_any_money_moves() {
        let task = task(None, TaskStatus::PendingReview);
        let task_id = task.id;
        let store = Arc::new(InMemoryStore::with_task(task, vec![]));
        let gateway = Arc::new(RecordingGateway::settling());
        let service = service(store.clone(), gateway.clone());

        let result = service
            .approve_task(task_id, &manager(), "cus_1", None, 5000, None)
            .await;

        assert!(matches!(result, Err(ServiceError::NoCleanerAssigned(_))));
        assert!(gateway.calls().is_empty());
        assert!(store.transactions().is_empty());
        assert_eq!(store.task().unwrap().status, TaskStatus::PendingReview);
    }

    #[tokio::test]
    async fn unonboarded_cleaner_is_rejected_before_any_money_moves() {
        let worker = cleaner(None);
        let task = task(Some(worker.id), TaskStatus::PendingReview);
        let task_id = task.id;
        let store = Arc::new(InMemoryStore::with_task(task, vec![worker]));
        let gateway = Arc::new(RecordingGateway::settling());
        let service = service(store.clone(), gateway.clone());

        let result = service
            .approve_task(task_id, &manager(), "cus_1", None, 5000, None)
            .await;

        assert!(matches!(result, Err(ServiceError::CleanerNotOnboarded(_))));
        assert!(gateway.calls().is_empty());
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn already_approved_task_cannot_be_approved_again() {
        let worker = cleaner(Some("acct_1"));
        let task = task(Some(worker.id), TaskStatus::Approved);
        let task_id = task.id;
        let store = Arc::new(InMemoryStore::with_task(task, vec![worker]));
        let gateway = Arc::new(RecordingGateway::settling());
        let service = service(store.clone(), gateway.clone());

        let result = service
            .approve_task(task_id, &manager(), "cus_1", None, 5000, None)
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::TaskNotReviewable(_, TaskStatus::Approved))
        ));
        assert!(gateway.calls().is_empty());
        assert!(store.transactions().is_empty());
    }

    #[tokio::test]
    async fn approval_charges_fee_plus_markup_and_settles() {
        let worker = cleaner(Some("acct_1"));
        let task = task(Some(worker.id), TaskStatus::PendingReview);
        let task_id = task.id;
        let store = Arc::new(InMemoryStore::with_task(task, vec![worker]));
        let gateway = Arc::new(RecordingGateway::settling());
        let service = service(store.clone(), gateway.clone());

        // $50 cleaner fee at the 20% markup charges the payer $60
        let outcome = service
            .approve_task(task_id, &manager(), "cus_1", Some("Guest Pat"), 5000, None)
            .await
            .unwrap();

        assert_eq!(outcome.resolution, ApprovalResolution::Settled);
        assert_eq!(outcome.task.status, TaskStatus::Approved);
        assert_eq!(
            gateway.calls(),
            vec![Call::Charge { amount: 6000 }, Call::Payout { amount: 5000 }]
        );

        let transactions = store.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].amount_charged, 6000);
        assert_eq!(transactions[0].cleaner_payout, 5000);
        assert_eq!(transactions[0].platform_fee, 1000);
        assert_eq!(transactions[0].status, TransactionStatus::Completed);
        assert_eq!(store.task().unwrap().status, TaskStatus::Approved);
    }

    #[tokio::test]
    async fn declined_charge_receipt_records_failed_ledger_row() {
        let worker = cleaner(Some("acct_1"));
        let task = task(Some(worker.id), TaskStatus::PendingReview);
        let task_id = task.id;
        let store = Arc::new(InMemoryStore::with_task(task, vec![worker]));
        let gateway = Arc::new(RecordingGateway::declining());
        let service = service(store.clone(), gateway.clone());

        let result = service
            .approve_task(task_id, &manager(), "cus_1", None, 5000, None)
            .await;

        assert!(matches!(result, Err(ServiceError::Gateway(_))));
        // Only the charge leg ran; the task stays reviewable for a retry
        assert_eq!(gateway.calls(), vec![Call::Charge { amount: 6000 }]);
        assert_eq!(store.task().unwrap().status, TaskStatus::PendingReview);

        let transactions = store.transactions();
        assert_eq!(transactions.len(), 1);
        assert_eq!(transactions[0].status, TransactionStatus::Failed);
        assert!(transactions[0].charge_reference.is_none());
    }

    #[test]
    fn breakdown_nets_out_the_gateway_fee() {
        // $150 charge, $100 payout: fee $50, gateway est $4.65, net $45.35
        let breakdown = ChargeBreakdown::for_split(15000, 10000);
        assert_eq!(breakdown.platform_fee, 5000);
        assert_eq!(breakdown.estimated_gateway_fee, 465);
        assert_eq!(breakdown.platform_net, 4535);
    }

    #[test]
    fn breakdown_net_can_go_negative_on_thin_margins() {
        let breakdown = ChargeBreakdown::for_split(1000, 990);
        assert_eq!(breakdown.platform_fee, 10);
        assert!(breakdown.platform_net < 0);
    }
}

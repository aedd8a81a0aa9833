// service/settlement.rs
//
// Two-phase money movement for one settlement attempt: charge the payer,
// then pay the worker. The payout leg is never dispatched unless the charge
// outcome is `succeeded`. There is no compensation step, so a payout failure
// after a successful charge is surfaced as its own terminal variant.

use crate::service::payment_provider::{GatewayError, PaymentGateway, PaymentOutcome};

#[derive(Debug, Clone)]
pub struct SettlementRequest<'a> {
    pub customer_id: &'a str,
    // None when the attempt has no payout leg (unassigned direct charge)
    pub payout_account_id: Option<&'a str>,
    pub charge_cents: i64,
    pub payout_cents: i64,
    pub description: &'a str,
    // Per-attempt reference, doubles as the gateway idempotency key
    pub reference: &'a str,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub enum SettlementOutcome {
    /// Both legs succeeded (payout_reference is None when no payout leg ran).
    Completed {
        charge_reference: String,
        payout_reference: Option<String>,
    },
    /// Charge was accepted but has not succeeded yet; the payout is withheld.
    ChargePending { charge_reference: String },
    /// Charge leg failed; no money moved, no payout attempted.
    ChargeFailed { error: GatewayError },
    /// Charge succeeded but the payout leg failed. The charge reference must
    /// be retained for manual reconciliation.
    PayoutFailed {
        charge_reference: String,
        error: GatewayError,
    },
}

pub async fn execute(
    gateway: &dyn PaymentGateway,
    request: &SettlementRequest<'_>,
) -> SettlementOutcome {
    let receipt = match gateway
        .charge_customer(
            request.customer_id,
            request.charge_cents,
            request.description,
            request.reference,
            &request.metadata,
        )
        .await
    {
        Ok(receipt) => receipt,
        Err(error) => {
            tracing::warn!(
                reference = request.reference,
                code = %error.code,
                "Charge failed, payout skipped"
            );
            return SettlementOutcome::ChargeFailed { error };
        }
    };

    match receipt.outcome {
        PaymentOutcome::Succeeded => {}
        PaymentOutcome::Pending => {
            tracing::info!(
                reference = request.reference,
                charge_id = %receipt.provider_id,
                "Charge not yet settled, withholding payout"
            );
            return SettlementOutcome::ChargePending {
                charge_reference: receipt.provider_id,
            };
        }
        PaymentOutcome::Failed => {
            tracing::warn!(
                reference = request.reference,
                charge_id = %receipt.provider_id,
                "Charge declined, payout skipped"
            );
            return SettlementOutcome::ChargeFailed {
                error: GatewayError::new(
                    "charge_declined",
                    format!("Charge {} was declined by the gateway", receipt.provider_id),
                ),
            };
        }
    }

    let payout_account = match request.payout_account_id {
        Some(account) if request.payout_cents > 0 => account,
        _ => {
            return SettlementOutcome::Completed {
                charge_reference: receipt.provider_id,
                payout_reference: None,
            }
        }
    };

    match gateway
        .pay_worker(
            payout_account,
            request.payout_cents,
            request.description,
            request.reference,
        )
        .await
    {
        Ok(payout) => SettlementOutcome::Completed {
            charge_reference: receipt.provider_id,
            payout_reference: Some(payout.provider_id),
        },
        Err(error) => {
            tracing::error!(
                reference = request.reference,
                charge_id = %receipt.provider_id,
                code = %error.code,
                "Payout failed after successful charge, manual reconciliation required"
            );
            SettlementOutcome::PayoutFailed {
                charge_reference: receipt.provider_id,
                error,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::service::payment_provider::{ChargeReceipt, PayoutReceipt};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Charge { amount: i64 },
        Payout { amount: i64 },
    }

    struct MockGateway {
        calls: Mutex<Vec<Call>>,
        charge_result: Result<ChargeReceipt, GatewayError>,
        payout_result: Result<PayoutReceipt, GatewayError>,
    }

    impl MockGateway {
        fn new(
            charge_result: Result<ChargeReceipt, GatewayError>,
            payout_result: Result<PayoutReceipt, GatewayError>,
        ) -> Self {
            MockGateway {
                calls: Mutex::new(Vec::new()),
                charge_result,
                payout_result,
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
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

    fn charged(id: &str) -> Result<ChargeReceipt, GatewayError> {
        Ok(ChargeReceipt {
            provider_id: id.to_string(),
            outcome: PaymentOutcome::Succeeded,
        })
    }

    fn paid(id: &str) -> Result<PayoutReceipt, GatewayError> {
        Ok(PayoutReceipt {
            provider_id: id.to_string(),
            outcome: PaymentOutcome::Succeeded,
        })
    }

    fn request<'a>() -> SettlementRequest<'a> {
        SettlementRequest {
            customer_id: "cus_100",
            payout_account_id: Some("acct_200"),
            charge_cents: 6000,
            payout_cents: 5000,
            description: "Cleaning fee for task 42",
            reference: "TXN_TEST",
            metadata: vec![],
        }
    }

    #[tokio::test]
    async fn test_both_legs_succeed() {
        let gateway = MockGateway::new(charged("pi_1"), paid("tr_1"));
        let outcome = execute(&gateway, &request()).await;

        match outcome {
            SettlementOutcome::Completed {
                charge_reference,
                payout_reference,
            } => {
                assert_eq!(charge_reference, "pi_1");
                assert_eq!(payout_reference.as_deref(), Some("tr_1"));
            }
            other => panic!("expected Completed, got {:?}", other),
        }

        // Charge is always dispatched before the payout
        assert_eq!(
            gateway.calls(),
            vec![Call::Charge { amount: 6000 }, Call::Payout { amount: 5000 }]
        );
    }

    #[tokio::test]
    async fn test_charge_failure_skips_payout() {
        let gateway = MockGateway::new(
            Err(GatewayError::new("card_declined", "Card declined")),
            paid("tr_unused"),
        );
        let outcome = execute(&gateway, &request()).await;

        match outcome {
            SettlementOutcome::ChargeFailed { error } => {
                assert_eq!(error.code, "card_declined");
            }
            other => panic!("expected ChargeFailed, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec![Call::Charge { amount: 6000 }]);
    }

    #[tokio::test]
    async fn test_payout_failure_retains_charge_reference() {
        let gateway = MockGateway::new(
            charged("pi_kept"),
            Err(GatewayError::new("account_invalid", "No such destination")),
        );
        let outcome = execute(&gateway, &request()).await;

        match outcome {
            SettlementOutcome::PayoutFailed {
                charge_reference,
                error,
            } => {
                assert_eq!(charge_reference, "pi_kept");
                assert_eq!(error.code, "account_invalid");
            }
            other => panic!("expected PayoutFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_pending_charge_withholds_payout() {
        let gateway = MockGateway::new(
            Ok(ChargeReceipt {
                provider_id: "pi_pending".to_string(),
                outcome: PaymentOutcome::Pending,
            }),
            paid("tr_unused"),
        );
        let outcome = execute(&gateway, &request()).await;

        match outcome {
            SettlementOutcome::ChargePending { charge_reference } => {
                assert_eq!(charge_reference, "pi_pending");
            }
            other => panic!("expected ChargePending, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec![Call::Charge { amount: 6000 }]);
    }

    // A declined charge can come back as an Ok receipt with a failed outcome
    // rather than a transport error. It must terminate the attempt, not park it
    // as pending.
    #[tokio::test]
    async fn test_failed_charge_receipt_is_terminal() {
        let gateway = MockGateway::new(
            Ok(ChargeReceipt {
                provider_id: "pi_declined".to_string(),
                outcome: PaymentOutcome::Failed,
            }),
            paid("tr_unused"),
        );
        let outcome = execute(&gateway, &request()).await;

        match outcome {
            SettlementOutcome::ChargeFailed { error } => {
                assert_eq!(error.code, "charge_declined");
                assert!(error.message.contains("pi_declined"));
            }
            other => panic!("expected ChargeFailed, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec![Call::Charge { amount: 6000 }]);
    }

    #[tokio::test]
    async fn test_no_payout_leg_completes_after_charge() {
        let gateway = MockGateway::new(charged("pi_only"), paid("tr_unused"));
        let mut req = request();
        req.payout_account_id = None;

        let outcome = execute(&gateway, &req).await;
        match outcome {
            SettlementOutcome::Completed {
                charge_reference,
                payout_reference,
            } => {
                assert_eq!(charge_reference, "pi_only");
                assert!(payout_reference.is_none());
            }
            other => panic!("expected Completed, got {:?}", other),
        }
        assert_eq!(gateway.calls(), vec![Call::Charge { amount: 6000 }]);
    }
}

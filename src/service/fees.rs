// service/fees.rs
//
// Pure fee arithmetic. All amounts are integer cents; rounding happens once
// per derived figure (half-up), never mid-calculation.

use crate::{
    config::Config,
    models::transactionmodel::FeeMode,
    service::error::ServiceError,
};

const BPS_DENOMINATOR: i64 = 10_000;

#[derive(Debug, Clone, Copy)]
pub struct FeeSplit {
    pub payout: i64,
    pub platform_fee: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct FeeCalculator {
    // Platform rate in basis points (2000 = 20%)
    fee_rate_bps: i64,
}

impl FeeCalculator {
    pub fn new(config: &Config) -> Self {
        FeeCalculator {
            fee_rate_bps: config.platform_fee_bps,
        }
    }

    pub fn with_rate_bps(fee_rate_bps: i64) -> Self {
        FeeCalculator { fee_rate_bps }
    }

    /// Guest charge = cleaner fee marked up by the platform rate
    /// (fee * 1.20 at the default 20%).
    pub fn guest_charge_from_fee(&self, cleaner_fee_cents: i64) -> Result<i64, ServiceError> {
        if cleaner_fee_cents <= 0 {
            return Err(ServiceError::InvalidAmount(cleaner_fee_cents));
        }
        Ok(cleaner_fee_cents + apply_bps(cleaner_fee_cents, self.fee_rate_bps))
    }

    /// Split a client charge into cleaner payout and platform fee.
    ///
    /// AUTO_PERCENT keeps the platform rate of the charge; MANUAL takes the
    /// supplied payout and keeps the remainder. The two figures always sum
    /// back to the charge.
    pub fn compute_split(
        &self,
        client_charge_cents: i64,
        mode: FeeMode,
        manual_payout_cents: Option<i64>,
    ) -> Result<FeeSplit, ServiceError> {
        if client_charge_cents <= 0 {
            return Err(ServiceError::InvalidAmount(client_charge_cents));
        }

        match mode {
            FeeMode::AutoPercent => {
                let platform_fee = apply_bps(client_charge_cents, self.fee_rate_bps);
                Ok(FeeSplit {
                    payout: client_charge_cents - platform_fee,
                    platform_fee,
                })
            }
            FeeMode::Manual => {
                let payout = manual_payout_cents.ok_or_else(|| {
                    ServiceError::Validation(
                        "Cleaner payout is required for manual fee calculation".to_string(),
                    )
                })?;

                if payout < 0 || payout > client_charge_cents {
                    return Err(ServiceError::InvalidSplit {
                        payout,
                        charge: client_charge_cents,
                    });
                }

                Ok(FeeSplit {
                    payout,
                    platform_fee: client_charge_cents - payout,
                })
            }
        }
    }
}

/// Estimated gateway processing fee: 2.9% + $0.30, rounded half-up.
pub fn estimate_gateway_fee(amount_cents: i64) -> i64 {
    apply_bps(amount_cents, 290) + 30
}

// Half-up rounding on a basis-point fraction of a non-negative amount.
fn apply_bps(amount_cents: i64, bps: i64) -> i64 {
    (amount_cents * bps + BPS_DENOMINATOR / 2) / BPS_DENOMINATOR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> FeeCalculator {
        FeeCalculator::with_rate_bps(2000)
    }

    #[test]
    fn test_guest_charge_is_fee_plus_twenty_percent() {
        // $50.00 fee -> $60.00 charge
        assert_eq!(calc().guest_charge_from_fee(5000).unwrap(), 6000);
        // $33.33 fee -> $40.00 charge (3333 * 0.2 = 666.6 rounds to 667)
        assert_eq!(calc().guest_charge_from_fee(3333).unwrap(), 4000);
        // One cent still rounds sensibly
        assert_eq!(calc().guest_charge_from_fee(1).unwrap(), 1);
    }

    #[test]
    fn test_guest_charge_rejects_non_positive_fee() {
        assert!(matches!(
            calc().guest_charge_from_fee(0),
            Err(ServiceError::InvalidAmount(0))
        ));
        assert!(matches!(
            calc().guest_charge_from_fee(-500),
            Err(ServiceError::InvalidAmount(-500))
        ));
    }

    #[test]
    fn test_auto_split_reconciles() {
        let split = calc()
            .compute_split(6000, FeeMode::AutoPercent, None)
            .unwrap();
        assert_eq!(split.platform_fee, 1200);
        assert_eq!(split.payout, 4800);
        assert_eq!(split.payout + split.platform_fee, 6000);
    }

    #[test]
    fn test_auto_split_reconciles_on_awkward_amounts() {
        for charge in [1, 7, 99, 101, 12345, 99999] {
            let split = calc()
                .compute_split(charge, FeeMode::AutoPercent, None)
                .unwrap();
            assert_eq!(split.payout + split.platform_fee, charge);
            assert!(split.payout >= 0);
            assert!(split.platform_fee >= 0);
        }
    }

    #[test]
    fn test_manual_split() {
        // $150.00 charge, $100.00 payout -> $50.00 platform fee
        let split = calc()
            .compute_split(15000, FeeMode::Manual, Some(10000))
            .unwrap();
        assert_eq!(split.payout, 10000);
        assert_eq!(split.platform_fee, 5000);
    }

    #[test]
    fn test_manual_split_rejects_payout_exceeding_charge() {
        // $160.00 payout against a $150.00 charge
        assert!(matches!(
            calc().compute_split(15000, FeeMode::Manual, Some(16000)),
            Err(ServiceError::InvalidSplit {
                payout: 16000,
                charge: 15000
            })
        ));
    }

    #[test]
    fn test_manual_split_rejects_negative_payout() {
        assert!(matches!(
            calc().compute_split(15000, FeeMode::Manual, Some(-1)),
            Err(ServiceError::InvalidSplit { .. })
        ));
    }

    #[test]
    fn test_manual_split_requires_payout() {
        assert!(matches!(
            calc().compute_split(15000, FeeMode::Manual, None),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_gateway_fee_estimate() {
        // $100.00 -> $2.90 + $0.30 = $3.20
        assert_eq!(estimate_gateway_fee(10000), 320);
    }
}

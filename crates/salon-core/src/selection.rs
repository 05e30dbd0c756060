//! # Package Selection
//!
//! A thin state machine around the pricing engine that owns the caller's
//! `PaymentChoice` and guards it against each tier's rules.
//!
//! ## States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   NoPackageSelected ──select_package(tier)──► PackageSelected(tier)     │
//! │          ▲                                        │      │              │
//! │          └───────────────clear()──────────────────┘      │              │
//! │                                                          │ confirm()    │
//! │                                                          ▼              │
//! │                                                       NewSale           │
//! │                                                                         │
//! │  select_package(tier):                                                  │
//! │    unavailable tier       → rejected, state unchanged                   │
//! │    requires full payment  → down_payment := final_cost, months := 0     │
//! │    otherwise              → clamp existing down payment into bounds     │
//! │                             (left alone when already valid)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `confirm` re-runs [`compute_pricing`] with the selector's payment rather
//! than trusting a preview result, so a sale always reflects the current
//! rules.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::{compute_pricing, PricingRequest};
use crate::types::{CalculationResult, CalculatorSettings, NewSale, PackageResult, PaymentChoice, SaleParty, Tier};
use crate::validation::{validate_non_negative, validate_party};

/// Where the selector is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "tier")]
pub enum SelectionState {
    #[default]
    NoPackageSelected,
    PackageSelected(Tier),
}

/// Tier selection plus the payment choice it constrains.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageSelector {
    state: SelectionState,
    payment: PaymentChoice,
}

impl PackageSelector {
    pub fn new(payment: PaymentChoice) -> Self {
        PackageSelector {
            state: SelectionState::NoPackageSelected,
            payment,
        }
    }

    pub fn state(&self) -> SelectionState {
        self.state
    }

    pub fn selected_tier(&self) -> Option<Tier> {
        match self.state {
            SelectionState::PackageSelected(tier) => Some(tier),
            SelectionState::NoPackageSelected => None,
        }
    }

    pub fn payment(&self) -> &PaymentChoice {
        &self.payment
    }

    /// Selects `tier` using the figures in `result`.
    ///
    /// ## Errors
    /// `CoreError::PackageUnavailable` when the tier is not offered; the
    /// previous state and payment are kept.
    pub fn select_package(&mut self, tier: Tier, result: &CalculationResult) -> CoreResult<&PaymentChoice> {
        let package = result.packages.get(tier);
        ensure_available(package)?;

        if package.requires_full_payment {
            self.payment.down_payment = package.final_cost;
            self.payment.installment_months = 0;
        } else if !package.accepts_down_payment(self.payment.down_payment) {
            let clamped = package.clamp_down_payment(self.payment.down_payment);
            debug!(
                %tier,
                from = %self.payment.down_payment,
                to = %clamped,
                "Clamping down payment into tier bounds"
            );
            self.payment.down_payment = clamped;
        }

        self.state = SelectionState::PackageSelected(tier);
        debug!(%tier, down_payment = %self.payment.down_payment, "Package selected");
        Ok(&self.payment)
    }

    /// Sets the down payment, clamped into the selected tier's bounds.
    /// With no tier selected the amount is stored as entered.
    pub fn set_down_payment(&mut self, amount: Money, result: &CalculationResult) -> CoreResult<Money> {
        validate_non_negative("down_payment", amount)?;

        self.payment.down_payment = match self.selected_tier() {
            Some(tier) => result.packages.get(tier).clamp_down_payment(amount),
            None => amount,
        };
        Ok(self.payment.down_payment)
    }

    /// Sets the installment length. `0` is always allowed.
    pub fn set_installment_months(&mut self, months: u32, settings: &CalculatorSettings) -> CoreResult<()> {
        if !settings.allows_installment(months) {
            return Err(CoreError::InvalidInstallmentMonths {
                months,
                allowed: settings.installment_month_options.clone(),
            });
        }
        self.payment.installment_months = months;
        Ok(())
    }

    pub fn set_certificate(&mut self, used: bool) {
        self.payment.used_certificate = used;
    }

    /// Back to `NoPackageSelected`. The payment choice is kept.
    pub fn clear(&mut self) {
        self.state = SelectionState::NoPackageSelected;
    }

    /// Prices `request` with this selector's payment and turns the selected
    /// tier into a sale snapshot.
    ///
    /// ## Checks
    /// 1. A tier is selected and still available
    /// 2. The down payment lies within the tier's bounds
    /// 3. The installment length is offered (and 0 for full-payment tiers)
    /// 4. Client and master ids are present
    pub fn confirm(&self, request: &PricingRequest, party: SaleParty) -> CoreResult<NewSale> {
        let tier = self.selected_tier().ok_or(CoreError::NoPackageSelected)?;
        validate_party(&party)?;

        let priced = request.with_payment(self.payment);
        let result = compute_pricing(&priced)?.ok_or(CoreError::NoServicesSelected)?;
        let package = result.packages.get(tier);
        ensure_available(package)?;

        if !package.accepts_down_payment(self.payment.down_payment) {
            return Err(CoreError::DownPaymentOutOfRange {
                amount: self.payment.down_payment,
                min: package.min_down_payment,
                max: package.max_down_payment,
            });
        }

        let full_payment = package.requires_full_payment;
        let months = self.payment.installment_months;
        if !priced.settings.allows_installment(months) || (full_payment && months != 0) {
            return Err(CoreError::InvalidInstallmentMonths {
                months,
                allowed: if full_payment {
                    vec![0]
                } else {
                    priced.settings.installment_month_options.clone()
                },
            });
        }

        info!(
            %tier,
            client_id = %party.client_id,
            final_cost = %package.final_cost,
            down_payment = %self.payment.down_payment,
            installment_months = months,
            "Sale confirmed"
        );

        Ok(NewSale {
            party,
            tier,
            procedure_count: priced.procedure_count,
            base_cost: result.base_cost,
            final_cost: package.final_cost,
            total_savings: package.total_savings,
            gift_session_value: package.gift_session_value,
            bonus_account_value: package.bonus_account_value,
            free_zones_value: result.free_zones_value,
            payment: self.payment,
            monthly_payment: package.monthly_payment,
            applied_discounts: package.applied_discounts.clone(),
            services: priced.services,
            free_zones: priced.free_zones,
        })
    }
}

fn ensure_available(package: &PackageResult) -> CoreResult<()> {
    if package.is_available {
        return Ok(());
    }
    Err(CoreError::PackageUnavailable {
        tier: package.tier,
        reason: package.unavailable_reason.clone().unwrap_or_default(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PackageConfig, PackageConfigs, Rate, ServiceSelection};

    fn major(amount: i64) -> Money {
        Money::from_major(amount)
    }

    fn request(procedure_count: u32) -> PricingRequest {
        let mut configs = PackageConfigs::new();
        configs.insert(
            Tier::Vip,
            PackageConfig {
                discount_rate: Rate::from_bps(2_500),
                min_cost: major(50_000),
                requires_full_payment: true,
                gift_session_count: 2,
                ..PackageConfig::default()
            },
        );
        configs.insert(
            Tier::Standard,
            PackageConfig {
                discount_rate: Rate::from_bps(1_500),
                min_cost: major(25_000),
                min_down_payment_rate: Rate::from_bps(3_000),
                ..PackageConfig::default()
            },
        );
        configs.insert(
            Tier::Economy,
            PackageConfig {
                discount_rate: Rate::from_bps(500),
                min_cost: major(15_000),
                min_down_payment_rate: Rate::from_bps(2_000),
                ..PackageConfig::default()
            },
        );

        PricingRequest::from_selection(
            vec![ServiceSelection::new("laser-legs", major(3_000), 1)],
            procedure_count,
            configs,
            CalculatorSettings::default(),
            PaymentChoice::default(),
            Vec::new(),
        )
        .unwrap()
    }

    fn price(request: &PricingRequest, payment: &PaymentChoice) -> CalculationResult {
        compute_pricing(&request.with_payment(*payment)).unwrap().unwrap()
    }

    fn party() -> SaleParty {
        SaleParty {
            client_id: "client-42".to_string(),
            master_id: "master-7".to_string(),
        }
    }

    #[test]
    fn test_full_payment_tier_forces_down_payment() {
        let req = request(20);
        let mut selector = PackageSelector::new(PaymentChoice {
            down_payment: major(10_000),
            installment_months: 6,
            used_certificate: false,
        });
        let result = price(&req, selector.payment());

        let payment = selector.select_package(Tier::Vip, &result).unwrap();
        assert_eq!(payment.down_payment, major(43_500));
        assert_eq!(payment.installment_months, 0);
        assert_eq!(selector.state(), SelectionState::PackageSelected(Tier::Vip));
    }

    #[test]
    fn test_unavailable_tier_is_rejected() {
        let req = request(10); // 30000 < VIP minimum of 50000
        let mut selector = PackageSelector::default();
        let result = price(&req, selector.payment());

        let err = selector.select_package(Tier::Vip, &result).unwrap_err();
        assert!(matches!(err, CoreError::PackageUnavailable { tier: Tier::Vip, .. }));
        assert_eq!(selector.state(), SelectionState::NoPackageSelected);
    }

    #[test]
    fn test_valid_down_payment_survives_tier_switch() {
        let req = request(10);
        let mut selector = PackageSelector::new(PaymentChoice {
            down_payment: major(12_000),
            ..PaymentChoice::default()
        });
        let result = price(&req, selector.payment());

        selector.select_package(Tier::Standard, &result).unwrap();
        assert_eq!(selector.payment().down_payment, major(12_000));
        selector.select_package(Tier::Economy, &result).unwrap();
        assert_eq!(selector.payment().down_payment, major(12_000));
    }

    #[test]
    fn test_out_of_range_down_payment_is_clamped() {
        let req = request(10);
        let mut selector = PackageSelector::new(PaymentChoice {
            down_payment: major(1_000),
            ..PaymentChoice::default()
        });
        let result = price(&req, selector.payment());

        // Standard: final 25500, 30% = 7650
        selector.select_package(Tier::Standard, &result).unwrap();
        assert_eq!(selector.payment().down_payment, major(7_650));

        let stored = selector.set_down_payment(major(90_000), &result).unwrap();
        assert_eq!(stored, major(25_500));
    }

    #[test]
    fn test_installment_months_must_be_offered() {
        let settings = CalculatorSettings::default();
        let mut selector = PackageSelector::default();

        assert!(selector.set_installment_months(6, &settings).is_ok());
        assert!(selector.set_installment_months(0, &settings).is_ok());
        assert!(matches!(
            selector.set_installment_months(7, &settings),
            Err(CoreError::InvalidInstallmentMonths { months: 7, .. })
        ));
    }

    #[test]
    fn test_confirm_requires_selection() {
        let selector = PackageSelector::default();
        let err = selector.confirm(&request(10), party()).unwrap_err();
        assert!(matches!(err, CoreError::NoPackageSelected));
    }

    #[test]
    fn test_confirm_builds_sale_snapshot() {
        let req = request(10);
        let mut selector = PackageSelector::new(PaymentChoice {
            down_payment: major(7_500),
            ..PaymentChoice::default()
        });
        selector.set_installment_months(6, &req.settings).unwrap();
        let preview = price(&req, selector.payment());
        selector.select_package(Tier::Standard, &preview).unwrap();
        selector.set_down_payment(major(7_650), &preview).unwrap();

        let sale = selector.confirm(&req, party()).unwrap();

        assert_eq!(sale.tier, Tier::Standard);
        assert_eq!(sale.base_cost, major(30_000));
        assert_eq!(sale.final_cost, major(25_500));
        assert_eq!(sale.payment.down_payment, major(7_650));
        // (25500 − 7650) / 6 = 2975
        assert_eq!(sale.monthly_payment, major(2_975));
        assert_eq!(sale.services.len(), 1);
        assert_eq!(sale.party.client_id, "client-42");
    }

    #[test]
    fn test_confirm_reprices_instead_of_trusting_preview() {
        let req = request(10);
        let mut selector = PackageSelector::new(PaymentChoice {
            down_payment: major(20_000),
            ..PaymentChoice::default()
        });
        let preview = price(&req, selector.payment());
        selector.select_package(Tier::Standard, &preview).unwrap();
        assert_eq!(selector.payment().down_payment, major(20_000));

        // The course shrinks to 5 procedures (15000): Standard is gone.
        let smaller = request(5);
        assert!(matches!(
            selector.confirm(&smaller, party()),
            Err(CoreError::PackageUnavailable { tier: Tier::Standard, .. })
        ));

        // Economy is still offered, but 20000 exceeds its final cost of 14250.
        selector.state = SelectionState::PackageSelected(Tier::Economy);
        assert!(matches!(
            selector.confirm(&smaller, party()),
            Err(CoreError::DownPaymentOutOfRange { .. })
        ));

        // Re-selecting against a fresh preview clamps the payment back in range.
        let preview = price(&smaller, selector.payment());
        selector.select_package(Tier::Economy, &preview).unwrap();
        assert_eq!(selector.payment().down_payment, major(14_250));
        assert!(selector.confirm(&smaller, party()).is_ok());
    }

    #[test]
    fn test_confirm_rejects_installments_on_full_payment_tier() {
        let req = request(20);
        let mut selector = PackageSelector::default();
        let preview = price(&req, selector.payment());
        selector.select_package(Tier::Vip, &preview).unwrap();
        selector.set_installment_months(6, &req.settings).unwrap();

        assert!(matches!(
            selector.confirm(&req, party()),
            Err(CoreError::InvalidInstallmentMonths { months: 6, .. })
        ));
    }

    #[test]
    fn test_confirm_requires_party_ids() {
        let req = request(20);
        let mut selector = PackageSelector::default();
        let preview = price(&req, selector.payment());
        selector.select_package(Tier::Vip, &preview).unwrap();

        let anonymous = SaleParty {
            client_id: " ".to_string(),
            master_id: "master-7".to_string(),
        };
        assert!(matches!(
            selector.confirm(&req, anonymous),
            Err(CoreError::Validation(_))
        ));
    }
}

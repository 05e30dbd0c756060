//! # Pricing Engine
//!
//! The single pricing implementation. The interactive preview and the sale
//! confirmation both call [`compute_pricing`], so the rules below exist once.
//!
//! ## Per-Tier Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  base_cost ──┬──► rate resolution (Economy staircase) ──► package disc. │
//! │              ├──► bulk discount (procedure_count ≥ threshold)           │
//! │              └──► certificate discount (flag + min course)              │
//! │                                  │                                      │
//! │                                  ▼                                      │
//! │              final_cost = max(base_cost − Σ discounts, 0)               │
//! │                                  │                                      │
//! │       ┌──────────────────────────┼───────────────────────────┐          │
//! │       ▼                          ▼                           ▼          │
//! │  availability          down-payment bounds           monthly payment    │
//! │  (≥ min_cost)          (full payment collapses)      (0 if lump sum)    │
//! │                                                                         │
//! │  Display only: gift-session value, bonus-account value → total_savings  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! - Malformed input → `Err(CoreError::Validation)`
//! - No services selected → `Ok(None)`
//! - Below minimum / missing config → tier reported unavailable, not an error
//! - Zero total procedures → division-dependent figures are 0

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{
    AppliedDiscount, CalculationResult, CalculatorSettings, DiscountKind, FreeZone,
    PackageConfig, PackageConfigs, PackageResult, PackageResults, PaymentChoice, Rate,
    ServiceSelection, Tier,
};
use crate::validation::{
    validate_non_negative, validate_package_config, validate_payment, validate_procedure_count,
    validate_settings,
};

/// Reason reported for a tier with no configuration row.
pub const PACKAGE_NOT_FOUND: &str = "package not found";

// =============================================================================
// Request
// =============================================================================

/// Everything one pricing run depends on. A full input snapshot: the
/// result is a pure function of this value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRequest {
    /// Σ(unit price × quantity) × procedure count, see [`base_cost`].
    pub base_cost: Money,
    pub services: Vec<ServiceSelection>,
    pub procedure_count: u32,
    pub package_configs: PackageConfigs,
    pub settings: CalculatorSettings,
    pub payment: PaymentChoice,
    #[serde(default)]
    pub free_zones: Vec<FreeZone>,
}

impl PricingRequest {
    /// Builds a request whose base cost is derived from the selection.
    ///
    /// Fails with `ValidationError::Overflow` when the base cost does not fit.
    pub fn from_selection(
        services: Vec<ServiceSelection>,
        procedure_count: u32,
        package_configs: PackageConfigs,
        settings: CalculatorSettings,
        payment: PaymentChoice,
        free_zones: Vec<FreeZone>,
    ) -> CoreResult<Self> {
        Ok(PricingRequest {
            base_cost: base_cost(&services, procedure_count)?,
            services,
            procedure_count,
            package_configs,
            settings,
            payment,
            free_zones,
        })
    }

    /// Same snapshot with a different payment choice.
    pub fn with_payment(&self, payment: PaymentChoice) -> Self {
        PricingRequest {
            payment,
            ..self.clone()
        }
    }
}

// =============================================================================
// Derived Quantities
// =============================================================================

/// `Σ(unit_price × quantity) × procedure_count`.
///
/// ## Example
/// ```rust
/// use salon_core::money::Money;
/// use salon_core::pricing::base_cost;
/// use salon_core::types::ServiceSelection;
///
/// let services = vec![ServiceSelection::new("laser-legs", Money::from_major(3_000), 1)];
/// assert_eq!(base_cost(&services, 20).unwrap(), Money::from_major(60_000));
/// ```
pub fn base_cost(services: &[ServiceSelection], procedure_count: u32) -> CoreResult<Money> {
    sum_line_totals(services)
        .and_then(|subtotal| subtotal.checked_mul(procedure_count))
        .ok_or_else(|| overflow("base_cost"))
}

/// `Σ quantity × procedure_count`.
pub fn total_procedures(services: &[ServiceSelection], procedure_count: u32) -> CoreResult<u64> {
    services
        .iter()
        .try_fold(0u64, |sum, s| sum.checked_add(s.quantity as u64))
        .and_then(|quantity| quantity.checked_mul(procedure_count as u64))
        .ok_or_else(|| overflow("total_procedures"))
}

/// `Σ(unit_price × quantity)` over free zones. Procedure count is ignored.
pub fn free_zones_value(free_zones: &[FreeZone]) -> CoreResult<Money> {
    sum_line_totals(free_zones).ok_or_else(|| overflow("free_zones_value"))
}

fn sum_line_totals(lines: &[ServiceSelection]) -> Option<Money> {
    lines
        .iter()
        .try_fold(Money::zero(), |sum, line| {
            line.line_total().and_then(|total| sum.checked_add(total))
        })
}

fn overflow(field: &str) -> CoreError {
    ValidationError::Overflow {
        field: field.to_string(),
    }
    .into()
}

// =============================================================================
// Discount Rules
// =============================================================================

/// Resolves the package discount rate for a tier.
///
/// For tiers with a staircase (Economy), every step whose threshold is at or
/// below the base cost is considered and the largest rate wins, never going
/// below the configured base rate. Crossing a threshold upward can only
/// raise the rate.
pub fn resolve_discount_rate(tier: Tier, config: &PackageConfig, base_cost: Money) -> Rate {
    if !tier.has_dynamic_rate() {
        return config.discount_rate;
    }

    config
        .dynamic_rates
        .iter()
        .filter(|step| base_cost >= step.threshold)
        .map(|step| step.rate)
        .fold(config.discount_rate, Rate::max)
}

/// Flat certificate discount, inclusive at the minimum course amount.
pub fn certificate_discount(
    base_cost: Money,
    settings: &CalculatorSettings,
    payment: &PaymentChoice,
) -> Money {
    if payment.used_certificate && base_cost >= settings.certificate_min_course {
        settings.certificate_discount
    } else {
        Money::zero()
    }
}

/// Bulk discount, qualified by procedure count only.
pub fn bulk_discount(base_cost: Money, procedure_count: u32, settings: &CalculatorSettings) -> Money {
    if procedure_count >= settings.bulk_discount_threshold {
        base_cost.percentage(settings.bulk_discount_rate)
    } else {
        Money::zero()
    }
}

/// Value of `gift_sessions` free procedures at the average per-procedure
/// price. Zero when nothing is selected.
pub fn gift_session_value(
    base_cost: Money,
    gift_sessions: u32,
    total_procedures: u64,
) -> CoreResult<Money> {
    if gift_sessions == 0 || total_procedures == 0 {
        return Ok(Money::zero());
    }
    let total = i64::try_from(total_procedures).unwrap_or(i64::MAX);
    base_cost
        .checked_mul_div(gift_sessions as i64, total)
        .ok_or_else(|| overflow("gift_session_value"))
}

/// `(min, max)` down payment for a tier with the given final cost.
///
/// Full-payment tiers collapse both bounds to the final cost. Otherwise the
/// minimum is the largest of the tier floor, the tier percentage and the
/// global minimum, capped at the final cost.
pub fn down_payment_bounds(
    config: &PackageConfig,
    settings: &CalculatorSettings,
    final_cost: Money,
) -> (Money, Money) {
    if config.requires_full_payment {
        return (final_cost, final_cost);
    }

    let min = config
        .min_down_payment
        .unwrap_or_default()
        .max(final_cost.percentage(config.min_down_payment_rate))
        .max(settings.minimum_down_payment)
        .min(final_cost);

    (min, final_cost)
}

/// `(final_cost − down_payment) / installment_months`, or 0 when there is
/// no installment plan. Deliberately not clamped: a negative value means the
/// caller let the down payment exceed the final cost.
pub fn monthly_payment(
    is_available: bool,
    config: &PackageConfig,
    final_cost: Money,
    payment: &PaymentChoice,
) -> Money {
    if !is_available || config.requires_full_payment || payment.installment_months == 0 {
        return Money::zero();
    }
    (final_cost - payment.down_payment).split(payment.installment_months)
}

// =============================================================================
// Engine
// =============================================================================

/// Inputs shared by every tier of one run.
struct RunContext<'a> {
    base_cost: Money,
    procedure_count: u32,
    total_procedures: u64,
    certificate_discount: Money,
    bulk_discount: Money,
    settings: &'a CalculatorSettings,
    payment: &'a PaymentChoice,
}

/// Computes the full per-tier breakdown.
///
/// ## Returns
/// * `Ok(Some(result))` - priced
/// * `Ok(None)` - no services selected; nothing to display
/// * `Err(CoreError::Validation)` - malformed input, or amounts too large
///   to represent
///
/// ## Example
/// ```rust
/// use salon_core::money::Money;
/// use salon_core::pricing::{compute_pricing, PricingRequest};
/// use salon_core::types::*;
///
/// let mut configs = PackageConfigs::new();
/// configs.insert(Tier::Standard, PackageConfig {
///     discount_rate: Rate::from_bps(1_500),
///     ..PackageConfig::default()
/// });
///
/// let request = PricingRequest::from_selection(
///     vec![ServiceSelection::new("laser-legs", Money::from_major(2_000), 1)],
///     10,
///     configs,
///     CalculatorSettings::default(),
///     PaymentChoice::default(),
///     vec![],
/// )
/// .unwrap();
///
/// let result = compute_pricing(&request).unwrap().unwrap();
/// assert_eq!(result.packages.standard.final_cost, Money::from_major(17_000));
/// assert!(!result.packages.vip.is_available); // no config row
/// ```
pub fn compute_pricing(request: &PricingRequest) -> CoreResult<Option<CalculationResult>> {
    validate_request(request)?;

    if request.services.is_empty() {
        debug!("No services selected, skipping pricing");
        return Ok(None);
    }

    let base_cost = request.base_cost;
    let ctx = RunContext {
        base_cost,
        procedure_count: request.procedure_count,
        total_procedures: total_procedures(&request.services, request.procedure_count)?,
        certificate_discount: certificate_discount(base_cost, &request.settings, &request.payment),
        bulk_discount: bulk_discount(base_cost, request.procedure_count, &request.settings),
        settings: &request.settings,
        payment: &request.payment,
    };

    let price = |tier: Tier| price_tier(tier, request.package_configs.get(&tier), &ctx);
    let packages = PackageResults {
        vip: price(Tier::Vip)?,
        standard: price(Tier::Standard)?,
        economy: price(Tier::Economy)?,
    };

    let result = CalculationResult {
        base_cost,
        packages,
        total_procedures: ctx.total_procedures,
        free_zones_value: free_zones_value(&request.free_zones)?,
    };

    debug!(
        base_cost = %result.base_cost,
        procedure_count = ctx.procedure_count,
        total_procedures = result.total_procedures,
        available = result.packages.iter().filter(|p| p.is_available).count(),
        "Pricing computed"
    );

    Ok(Some(result))
}

fn validate_request(request: &PricingRequest) -> CoreResult<()> {
    validate_non_negative("base_cost", request.base_cost)?;
    validate_procedure_count(request.procedure_count)?;
    validate_payment(&request.payment)?;
    validate_settings(&request.settings)?;
    for config in request.package_configs.values() {
        validate_package_config(config)?;
    }
    for line in request.services.iter().chain(&request.free_zones) {
        validate_non_negative("unit_price", line.unit_price)?;
    }
    Ok(())
}

fn price_tier(
    tier: Tier,
    config: Option<&PackageConfig>,
    ctx: &RunContext<'_>,
) -> CoreResult<PackageResult> {
    let Some(config) = config else {
        trace!(%tier, "No configuration for tier");
        return Ok(PackageResult {
            tier,
            is_available: false,
            unavailable_reason: Some(PACKAGE_NOT_FOUND.to_string()),
            requires_full_payment: false,
            final_cost: ctx.base_cost,
            actual_discount_total: Money::zero(),
            total_savings: Money::zero(),
            gift_session_value: Money::zero(),
            bonus_account_value: Money::zero(),
            monthly_payment: Money::zero(),
            min_down_payment: ctx.base_cost,
            max_down_payment: ctx.base_cost,
            applied_discounts: Vec::new(),
        });
    };

    let rate = resolve_discount_rate(tier, config, ctx.base_cost);
    let package_discount = ctx.base_cost.percentage(rate);
    let actual_discount_total = package_discount
        .checked_add(ctx.bulk_discount)
        .and_then(|sum| sum.checked_add(ctx.certificate_discount))
        .ok_or_else(|| overflow("actual_discount_total"))?;
    let final_cost = (ctx.base_cost - actual_discount_total).non_negative();

    let gift_value = gift_session_value(ctx.base_cost, config.gift_session_count, ctx.total_procedures)?;
    let bonus_value = final_cost.percentage(config.bonus_account_rate);
    let total_savings = actual_discount_total
        .checked_add(gift_value)
        .and_then(|sum| sum.checked_add(bonus_value))
        .ok_or_else(|| overflow("total_savings"))?;

    let is_available = ctx.base_cost >= config.min_cost;
    let unavailable_reason = (!is_available).then(|| {
        format!(
            "{} package requires a course of at least {}",
            tier.label(),
            config.min_cost
        )
    });

    let (min_down_payment, max_down_payment) = down_payment_bounds(config, ctx.settings, final_cost);

    let mut applied_discounts = vec![AppliedDiscount {
        kind: DiscountKind::Package,
        amount: package_discount,
    }];
    let optional = [
        (DiscountKind::Bulk, ctx.bulk_discount),
        (DiscountKind::Certificate, ctx.certificate_discount),
        (DiscountKind::GiftSessions, gift_value),
    ];
    applied_discounts.extend(
        optional
            .into_iter()
            .filter(|(_, amount)| amount.is_positive())
            .map(|(kind, amount)| AppliedDiscount { kind, amount }),
    );

    let result = PackageResult {
        tier,
        is_available,
        unavailable_reason,
        requires_full_payment: config.requires_full_payment,
        final_cost,
        actual_discount_total,
        total_savings,
        gift_session_value: gift_value,
        bonus_account_value: bonus_value,
        monthly_payment: monthly_payment(is_available, config, final_cost, ctx.payment),
        min_down_payment,
        max_down_payment,
        applied_discounts,
    };

    trace!(
        %tier,
        rate_bps = rate.bps(),
        final_cost = %result.final_cost,
        total_savings = %result.total_savings,
        monthly_payment = %result.monthly_payment,
        is_available,
        "Tier priced"
    );

    Ok(result)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RateStep;

    fn major(amount: i64) -> Money {
        Money::from_major(amount)
    }

    fn settings() -> CalculatorSettings {
        CalculatorSettings {
            minimum_down_payment: major(5_000),
            bulk_discount_threshold: 15,
            bulk_discount_rate: Rate::from_bps(250),
            certificate_discount: major(3_000),
            certificate_min_course: major(25_000),
            installment_month_options: vec![3, 6, 12],
        }
    }

    fn configs() -> PackageConfigs {
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
                gift_session_count: 1,
                bonus_account_rate: Rate::from_bps(500),
                ..PackageConfig::default()
            },
        );
        configs.insert(
            Tier::Economy,
            PackageConfig {
                discount_rate: Rate::from_bps(500),
                min_cost: major(15_000),
                min_down_payment_rate: Rate::from_bps(2_000),
                dynamic_rates: vec![RateStep {
                    threshold: major(40_000),
                    rate: Rate::from_bps(1_000),
                }],
                ..PackageConfig::default()
            },
        );
        configs
    }

    fn request(unit_price: i64, quantity: u32, procedure_count: u32) -> PricingRequest {
        PricingRequest::from_selection(
            vec![ServiceSelection::new("laser-legs", major(unit_price), quantity)],
            procedure_count,
            configs(),
            settings(),
            PaymentChoice::default(),
            Vec::new(),
        )
        .unwrap()
    }

    fn compute(request: &PricingRequest) -> CalculationResult {
        compute_pricing(request)
            .expect("valid input")
            .expect("services selected")
    }

    #[test]
    fn test_vip_full_course_with_bulk_discount() {
        let req = PricingRequest {
            payment: PaymentChoice {
                installment_months: 6,
                ..PaymentChoice::default()
            },
            ..request(3_000, 1, 20)
        };
        let result = compute(&req);
        let vip = &result.packages.vip;

        assert_eq!(result.base_cost, major(60_000));
        assert!(vip.is_available);
        assert_eq!(vip.discount(DiscountKind::Package), Some(major(15_000)));
        assert_eq!(vip.discount(DiscountKind::Bulk), Some(major(1_500)));
        assert_eq!(vip.actual_discount_total, major(16_500));
        assert_eq!(vip.final_cost, major(43_500));
        assert_eq!(vip.min_down_payment, major(43_500));
        assert_eq!(vip.max_down_payment, major(43_500));
        assert_eq!(vip.monthly_payment, Money::zero());
        // 60000 / 20 procedures × 2 gift sessions
        assert_eq!(vip.gift_session_value, major(6_000));
        assert_eq!(vip.total_savings, major(22_500));
    }

    #[test]
    fn test_economy_below_minimum_is_unavailable() {
        let result = compute(&request(1_000, 1, 10));
        let economy = &result.packages.economy;

        assert_eq!(result.base_cost, major(10_000));
        assert!(!economy.is_available);
        assert!(economy
            .unavailable_reason
            .as_deref()
            .is_some_and(|reason| reason.contains("15000")));
        assert_eq!(economy.final_cost, major(9_500));
        assert_eq!(economy.monthly_payment, Money::zero());
    }

    #[test]
    fn test_certificate_boundary_is_inclusive() {
        let with_certificate = |base: i64| {
            let mut req = request(base, 1, 1);
            req.payment.used_certificate = true;
            compute(&req)
        };

        let at_threshold = with_certificate(25_000);
        for package in at_threshold.packages.iter() {
            assert_eq!(package.discount(DiscountKind::Certificate), Some(major(3_000)));
        }

        let below = with_certificate(24_999);
        for package in below.packages.iter() {
            assert_eq!(package.discount(DiscountKind::Certificate), None);
        }
        // Standard: 24999 − 15% only
        assert_eq!(
            below.packages.standard.actual_discount_total,
            major(24_999).percentage(Rate::from_bps(1_500))
        );
    }

    #[test]
    fn test_free_zones_are_display_only() {
        let services = vec![
            ServiceSelection::new("laser-legs", major(3_000), 1),
            ServiceSelection::new("laser-arms", major(1_500), 1),
        ];
        let without = PricingRequest::from_selection(
            services.clone(),
            10,
            configs(),
            settings(),
            PaymentChoice::default(),
            Vec::new(),
        )
        .unwrap();
        let with = PricingRequest {
            free_zones: vec![ServiceSelection::new("laser-face", major(2_000), 1)],
            ..without.clone()
        };

        let plain = compute(&without);
        let zoned = compute(&with);

        assert_eq!(zoned.free_zones_value, major(2_000));
        assert_eq!(plain.free_zones_value, Money::zero());
        assert_eq!(plain.packages, zoned.packages);
    }

    #[test]
    fn test_no_installment_means_no_monthly_payment() {
        let mut req = request(3_000, 1, 10);
        req.payment.down_payment = major(10_000);
        let result = compute(&req);

        assert!(result.packages.standard.is_available);
        assert_eq!(result.packages.standard.monthly_payment, Money::zero());
    }

    #[test]
    fn test_monthly_payment_spreads_remaining_cost() {
        let mut req = request(3_000, 1, 10);
        req.payment.down_payment = major(7_500);
        req.payment.installment_months = 6;
        let standard = compute(&req).packages.standard;

        // 30000 − 15% = 25500; (25500 − 7500) / 6 = 3000
        assert_eq!(standard.final_cost, major(25_500));
        assert_eq!(standard.monthly_payment, major(3_000));
    }

    #[test]
    fn test_overpaid_down_payment_yields_negative_monthly_payment() {
        let mut req = request(3_000, 1, 10);
        req.payment.down_payment = major(31_500);
        req.payment.installment_months = 3;
        let standard = compute(&req).packages.standard;

        assert_eq!(standard.monthly_payment, major(-2_000));
    }

    #[test]
    fn test_bulk_discount_requires_procedure_threshold() {
        // 14 procedures with plenty of quantity: still no bulk discount
        let result = compute(&request(1_000, 10, 14));
        for package in result.packages.iter() {
            assert_eq!(package.discount(DiscountKind::Bulk), None);
        }

        let result = compute(&request(1_000, 1, 15));
        assert!(result.packages.iter().all(|p| p.discount(DiscountKind::Bulk).is_some()));
    }

    #[test]
    fn test_economy_rate_steps_up_once() {
        let economy = &configs()[&Tier::Economy];
        let mut previous = Rate::zero();
        let mut steps = 0;
        for base in (0..=80_000).step_by(500) {
            let rate = resolve_discount_rate(Tier::Economy, economy, major(base));
            assert!(rate >= previous);
            if rate > previous && base > 0 {
                steps += 1;
                assert_eq!(base, 40_000);
            }
            previous = rate;
        }
        assert_eq!(steps, 1);

        // Other tiers ignore a staircase even if configured
        assert_eq!(
            resolve_discount_rate(Tier::Standard, economy, major(90_000)),
            economy.discount_rate
        );
    }

    #[test]
    fn test_economy_step_up_changes_priced_package() {
        // 10 procedures: below the bulk threshold, so only the package rate moves
        let below = compute(&request(3_900, 1, 10)).packages.economy;
        assert_eq!(below.discount(DiscountKind::Package), Some(major(1_950)));
        assert_eq!(below.final_cost, major(37_050));

        let mut req = request(4_000, 1, 10);
        req.base_cost = major(40_000) - Money::from_minor(1);
        let just_below = compute(&req).packages.economy;
        // 39999.99 × 5%, rounded
        assert_eq!(just_below.discount(DiscountKind::Package), Some(major(2_000)));

        let at = compute(&request(4_000, 1, 10)).packages.economy;
        assert_eq!(at.discount(DiscountKind::Package), Some(major(4_000)));
        assert_eq!(at.final_cost, major(36_000));
        assert!(at.final_cost < below.final_cost);
    }

    #[test]
    fn test_availability_is_inclusive_at_min_cost() {
        let one_kopeck = Money::from_minor(1);
        for (tier, min_cost) in [
            (Tier::Vip, major(50_000)),
            (Tier::Standard, major(25_000)),
            (Tier::Economy, major(15_000)),
        ] {
            let mut req = request(1_000, 1, 1);

            req.base_cost = min_cost;
            let at = compute(&req);
            assert!(at.packages.get(tier).is_available, "{tier} at minimum");
            assert_eq!(at.packages.get(tier).unavailable_reason, None);

            req.base_cost = min_cost - one_kopeck;
            let below = compute(&req);
            assert!(!below.packages.get(tier).is_available, "{tier} below minimum");
            assert!(below.packages.get(tier).unavailable_reason.is_some());
        }
    }

    #[test]
    fn test_staircase_never_lowers_base_rate() {
        let config = PackageConfig {
            discount_rate: Rate::from_bps(1_200),
            dynamic_rates: vec![
                RateStep { threshold: major(10_000), rate: Rate::from_bps(800) },
                RateStep { threshold: major(30_000), rate: Rate::from_bps(1_500) },
                RateStep { threshold: major(20_000), rate: Rate::from_bps(1_300) },
            ],
            ..PackageConfig::default()
        };

        assert_eq!(resolve_discount_rate(Tier::Economy, &config, major(15_000)).bps(), 1_200);
        assert_eq!(resolve_discount_rate(Tier::Economy, &config, major(25_000)).bps(), 1_300);
        assert_eq!(resolve_discount_rate(Tier::Economy, &config, major(35_000)).bps(), 1_500);
    }

    #[test]
    fn test_missing_config_reports_package_not_found() {
        let mut req = request(3_000, 1, 10);
        req.package_configs.remove(&Tier::Standard);
        let standard = compute(&req).packages.standard;

        assert!(!standard.is_available);
        assert_eq!(standard.unavailable_reason.as_deref(), Some(PACKAGE_NOT_FOUND));
        assert_eq!(standard.final_cost, major(30_000));
        assert!(standard.applied_discounts.is_empty());
    }

    #[test]
    fn test_discount_accounting_closes() {
        for (price, qty, count, certificate) in [
            (3_000, 1, 20, false),
            (1_234, 3, 7, true),
            (999, 2, 15, true),
            (45_000, 1, 1, false),
        ] {
            let mut req = request(price, qty, count);
            req.payment.used_certificate = certificate;
            let result = compute(&req);

            for package in result.packages.iter() {
                assert_eq!(
                    package.final_cost + package.actual_discount_total,
                    result.base_cost,
                    "tier {}",
                    package.tier
                );
                assert!(package.total_savings >= package.actual_discount_total);
            }
        }
    }

    #[test]
    fn test_final_cost_is_floored_at_zero() {
        let mut req = request(100, 1, 1);
        req.settings.certificate_min_course = Money::zero();
        req.settings.certificate_discount = major(10_000);
        req.payment.used_certificate = true;
        let result = compute(&req);

        for package in result.packages.iter() {
            assert_eq!(package.final_cost, Money::zero());
            assert_eq!(package.max_down_payment, Money::zero());
        }
    }

    #[test]
    fn test_applied_discount_order() {
        let mut req = request(2_000, 1, 20);
        req.payment.used_certificate = true;
        let vip = compute(&req).packages.vip;

        let kinds: Vec<DiscountKind> = vip.applied_discounts.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![
                DiscountKind::Package,
                DiscountKind::Bulk,
                DiscountKind::Certificate,
                DiscountKind::GiftSessions,
            ]
        );
    }

    #[test]
    fn test_down_payment_bounds() {
        let result = compute(&request(3_000, 1, 10));
        let standard = &result.packages.standard;
        let economy = &result.packages.economy;

        // 30% of 25500 = 7650 beats the 5000 global minimum
        assert_eq!(standard.min_down_payment, major(7_650));
        assert_eq!(standard.max_down_payment, major(25_500));
        // 20% of 28500 = 5700
        assert_eq!(economy.min_down_payment, major(5_700));

        let floor = PackageConfig {
            min_down_payment: Some(major(9_000)),
            ..configs()[&Tier::Economy].clone()
        };
        let (min, max) = down_payment_bounds(&floor, &settings(), major(28_500));
        assert_eq!((min, max), (major(9_000), major(28_500)));

        // Minimum never exceeds the final cost
        let (min, max) = down_payment_bounds(&floor, &settings(), major(4_000));
        assert_eq!((min, max), (major(4_000), major(4_000)));
    }

    #[test]
    fn test_empty_selection_returns_none() {
        let req = PricingRequest::from_selection(
            Vec::new(),
            5,
            configs(),
            settings(),
            PaymentChoice::default(),
            Vec::new(),
        )
        .unwrap();
        assert!(compute_pricing(&req).unwrap().is_none());
    }

    #[test]
    fn test_zero_quantities_do_not_divide_by_zero() {
        let mut req = request(3_000, 0, 10);
        req.payment.installment_months = 3;
        let result = compute(&req);

        assert_eq!(result.total_procedures, 0);
        assert_eq!(result.base_cost, Money::zero());
        for package in result.packages.iter() {
            assert_eq!(package.gift_session_value, Money::zero());
            assert_eq!(package.monthly_payment, Money::zero());
        }
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let mut req = request(3_000, 1, 10);
        req.procedure_count = 0;
        assert!(compute_pricing(&req).is_err());

        let mut req = request(3_000, 1, 10);
        req.payment.down_payment = Money::from_minor(-1);
        assert!(compute_pricing(&req).is_err());

        let mut req = request(3_000, 1, 10);
        req.base_cost = Money::from_minor(-1);
        assert!(compute_pricing(&req).is_err());
    }

    #[test]
    fn test_oversized_amounts_are_rejected_not_wrapped() {
        let huge = vec![ServiceSelection::new("laser-legs", major(100_000_000), 1)];
        assert!(matches!(
            base_cost(&huge, 1_000_000_000),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
        assert!(PricingRequest::from_selection(
            huge,
            1_000_000_000,
            configs(),
            settings(),
            PaymentChoice::default(),
            Vec::new(),
        )
        .is_err());

        let lines = vec![
            ServiceSelection::new("laser-legs", Money::zero(), u32::MAX),
            ServiceSelection::new("laser-arms", Money::zero(), u32::MAX),
        ];
        assert!(total_procedures(&lines, u32::MAX).is_err());

        // Package discount at 100% plus the bulk discount exceeds i64
        let mut req = request(3_000, 1, 20);
        req.base_cost = Money::from_minor(9_000_000_000_000_000_000);
        if let Some(standard) = req.package_configs.get_mut(&Tier::Standard) {
            standard.discount_rate = Rate::from_bps(10_000);
        }
        assert!(matches!(
            compute_pricing(&req),
            Err(CoreError::Validation(ValidationError::Overflow { .. }))
        ));
    }

    #[test]
    fn test_pricing_is_idempotent() {
        let mut req = request(1_750, 2, 12);
        req.payment = PaymentChoice {
            down_payment: major(8_000),
            installment_months: 6,
            used_certificate: true,
        };

        let first = compute(&req);
        let second = compute(&req);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

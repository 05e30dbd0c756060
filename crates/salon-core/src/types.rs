//! # Domain Types
//!
//! Core domain types used throughout the salon pricing workspace.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUTS (reference data)          INPUTS (caller state)                 │
//! │  ┌──────────────────────┐         ┌──────────────────────┐             │
//! │  │  PackageConfig (×3)  │         │  ServiceSelection    │             │
//! │  │  CalculatorSettings  │         │  PaymentChoice       │             │
//! │  └──────────────────────┘         └──────────────────────┘             │
//! │               │                              │                          │
//! │               └───────────► compute_pricing ◄┘                          │
//! │                                     │                                   │
//! │  OUTPUTS                            ▼                                   │
//! │  ┌──────────────────────────────────────────────────────────┐          │
//! │  │  CalculationResult { base_cost, packages, ... }          │          │
//! │  │    └── PackageResult per Tier { final_cost, ... }        │          │
//! │  └──────────────────────────────────────────────────────────┘          │
//! │                                     │  confirm()                        │
//! │                                     ▼                                   │
//! │                        NewSale ──► Sale (persisted)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 2500 bps = 25% (VIP package discount), 250 bps = 2.5% (bulk discount)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Basis points in 100%.
    pub const SCALE: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Tier
// =============================================================================

/// One of the three competing package offerings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Vip,
    Standard,
    Economy,
}

impl Tier {
    /// All tiers in display order.
    pub const ALL: [Tier; 3] = [Tier::Vip, Tier::Standard, Tier::Economy];

    /// Stable machine name (`vip`, `standard`, `economy`).
    pub const fn as_str(&self) -> &'static str {
        match self {
            Tier::Vip => "vip",
            Tier::Standard => "standard",
            Tier::Economy => "economy",
        }
    }

    /// Human-readable name used in messages.
    pub const fn label(&self) -> &'static str {
        match self {
            Tier::Vip => "VIP",
            Tier::Standard => "Standard",
            Tier::Economy => "Economy",
        }
    }

    /// Whether the tier's discount rate may be raised by a cost staircase.
    pub const fn has_dynamic_rate(&self) -> bool {
        matches!(self, Tier::Economy)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vip" => Ok(Tier::Vip),
            "standard" => Ok(Tier::Standard),
            "economy" => Ok(Tier::Economy),
            _ => Err(ValidationError::NotAllowed {
                field: "tier".to_string(),
                allowed: Tier::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Service Selection
// =============================================================================

/// A selected service line: unit price frozen at selection time.
///
/// `quantity` is the number of units (visits/areas) chosen for one pass,
/// independent of the procedure count multiplier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelection {
    pub service_id: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl ServiceSelection {
    pub fn new(service_id: impl Into<String>, unit_price: Money, quantity: u32) -> Self {
        ServiceSelection {
            service_id: service_id.into(),
            unit_price,
            quantity,
        }
    }

    /// Unit price × quantity (one pass, no procedure multiplier), or `None`
    /// on overflow.
    #[inline]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

/// A service granted at zero cost. Same shape as a selection; valued for
/// display only.
pub type FreeZone = ServiceSelection;

// =============================================================================
// Package Configuration
// =============================================================================

/// One step of a discount-rate staircase: at or above `threshold`, the
/// tier's rate is raised to at least `rate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RateStep {
    pub threshold: Money,
    pub rate: Rate,
}

/// Per-tier package rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageConfig {
    /// Base package discount.
    pub discount_rate: Rate,
    /// Minimum base cost for the tier to be offered.
    pub min_cost: Money,
    /// Minimum down payment as a share of the final cost.
    pub min_down_payment_rate: Rate,
    /// Optional absolute down-payment floor for this tier.
    #[serde(default)]
    pub min_down_payment: Option<Money>,
    /// Payment must equal the final cost; no installments.
    pub requires_full_payment: bool,
    /// Number of free course passes granted as a perk.
    pub gift_session_count: u32,
    /// Share of the final cost credited to the client's bonus account.
    pub bonus_account_rate: Rate,
    /// Cost staircase raising the discount rate (Economy only).
    #[serde(default)]
    pub dynamic_rates: Vec<RateStep>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        PackageConfig {
            discount_rate: Rate::zero(),
            min_cost: Money::zero(),
            min_down_payment_rate: Rate::zero(),
            min_down_payment: None,
            requires_full_payment: false,
            gift_session_count: 0,
            bonus_account_rate: Rate::zero(),
            dynamic_rates: Vec::new(),
        }
    }
}

/// Package rules keyed by tier. A missing tier is reported as unavailable.
pub type PackageConfigs = BTreeMap<Tier, PackageConfig>;

// =============================================================================
// Calculator Settings
// =============================================================================

/// Global tunables shared by all tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculatorSettings {
    pub minimum_down_payment: Money,
    /// Procedure count at which the bulk discount starts.
    pub bulk_discount_threshold: u32,
    pub bulk_discount_rate: Rate,
    pub certificate_discount: Money,
    /// Minimum base cost for a certificate to be accepted.
    pub certificate_min_course: Money,
    /// Allowed installment lengths in months, sorted ascending.
    pub installment_month_options: Vec<u32>,
}

impl CalculatorSettings {
    /// Sorts and deduplicates the installment options.
    pub fn normalized(mut self) -> Self {
        self.installment_month_options.sort_unstable();
        self.installment_month_options.dedup();
        self
    }

    /// `0` (lump sum) is always allowed; anything else must be configured.
    pub fn allows_installment(&self, months: u32) -> bool {
        months == 0 || self.installment_month_options.contains(&months)
    }
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        CalculatorSettings {
            minimum_down_payment: Money::from_major(5_000),
            bulk_discount_threshold: 15,
            bulk_discount_rate: Rate::from_bps(250),
            certificate_discount: Money::from_major(3_000),
            certificate_min_course: Money::from_major(25_000),
            installment_month_options: vec![3, 6, 10, 12],
        }
    }
}

// =============================================================================
// Payment Choice
// =============================================================================

/// How the client intends to pay. Mutable caller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PaymentChoice {
    pub down_payment: Money,
    /// 0 means lump sum / full payment.
    pub installment_months: u32,
    pub used_certificate: bool,
}

// =============================================================================
// Results
// =============================================================================

/// What an applied discount line represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Package,
    Bulk,
    Certificate,
    GiftSessions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AppliedDiscount {
    pub kind: DiscountKind,
    pub amount: Money,
}

/// Computed figures for one tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PackageResult {
    pub tier: Tier,
    pub is_available: bool,
    pub unavailable_reason: Option<String>,
    /// Down payment must equal the final cost; no installments.
    pub requires_full_payment: bool,
    pub final_cost: Money,
    /// Package + bulk + certificate: what is actually taken off the bill.
    pub actual_discount_total: Money,
    /// Actual discounts plus gift-session and bonus-account value.
    pub total_savings: Money,
    pub gift_session_value: Money,
    pub bonus_account_value: Money,
    pub monthly_payment: Money,
    pub min_down_payment: Money,
    pub max_down_payment: Money,
    /// Ordered: package first, then bulk, certificate, gift sessions.
    pub applied_discounts: Vec<AppliedDiscount>,
}

impl PackageResult {
    /// Amount of the first discount line of `kind`, if present.
    pub fn discount(&self, kind: DiscountKind) -> Option<Money> {
        self.applied_discounts
            .iter()
            .find(|d| d.kind == kind)
            .map(|d| d.amount)
    }

    /// Clamps a down payment into this tier's bounds.
    pub fn clamp_down_payment(&self, amount: Money) -> Money {
        amount.clamp(self.min_down_payment, self.max_down_payment.max(self.min_down_payment))
    }

    /// Whether `amount` lies within this tier's down-payment bounds.
    pub fn accepts_down_payment(&self, amount: Money) -> bool {
        amount >= self.min_down_payment && amount <= self.max_down_payment
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PackageResults {
    pub vip: PackageResult,
    pub standard: PackageResult,
    pub economy: PackageResult,
}

impl PackageResults {
    pub fn get(&self, tier: Tier) -> &PackageResult {
        match tier {
            Tier::Vip => &self.vip,
            Tier::Standard => &self.standard,
            Tier::Economy => &self.economy,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &PackageResult> {
        [&self.vip, &self.standard, &self.economy].into_iter()
    }
}

/// Full output of one pricing run. Recomputed from scratch, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub base_cost: Money,
    pub packages: PackageResults,
    /// Σ service quantity × procedure count.
    pub total_procedures: u64,
    /// Display-only value of free zones; never billed or deducted.
    pub free_zones_value: Money,
}

// =============================================================================
// Sale
// =============================================================================

/// Who the sale is for and who sold it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct SaleParty {
    pub client_id: String,
    pub master_id: String,
}

/// A validated sale snapshot, ready to be recorded.
///
/// Produced only by `PackageSelector::confirm`, so its payment figures are
/// always within the selected tier's rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct NewSale {
    pub party: SaleParty,
    pub tier: Tier,
    pub procedure_count: u32,
    pub base_cost: Money,
    pub final_cost: Money,
    pub total_savings: Money,
    pub gift_session_value: Money,
    pub bonus_account_value: Money,
    pub free_zones_value: Money,
    pub payment: PaymentChoice,
    pub monthly_payment: Money,
    pub applied_discounts: Vec<AppliedDiscount>,
    pub services: Vec<ServiceSelection>,
    pub free_zones: Vec<FreeZone>,
}

/// A recorded sale. Append-only; never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: String,
    #[serde(flatten)]
    pub details: NewSale,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

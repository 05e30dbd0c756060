//! # salon-core: Package Pricing for the Salon Calculator
//!
//! Pure business logic for subscription-package quotes. Given the services a
//! client picked and how many procedures they want, this crate prices the
//! course under three tiers (VIP, Standard, Economy) and drives the
//! "pick a tier, set a down payment, confirm" flow that ends in a sale record.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Salon Calculator Architecture                     │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 salon-calc (apps/calculator)                    │   │
//! │  │       quote ──► recalc worker ──► sell                          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ salon-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌─────────┐  ┌───────────┐  ┌─────────────┐     │   │
//! │  │   │  types  │  │  money  │  │  pricing  │  │  selection  │     │   │
//! │  │   │  Tier   │  │  Money  │  │  engine   │  │  selector   │     │   │
//! │  │   └─────────┘  └─────────┘  └───────────┘  └─────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    salon-db (Database Layer)                    │   │
//! │  │        package configs, settings, services, sales               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Tiers, package configs, settings, results, sale records
//! - [`money`] - Money in kopecks, integer arithmetic only
//! - [`pricing`] - The pricing engine ([`compute_pricing`])
//! - [`selection`] - Package selection state machine
//! - [`catalog`] - Resolving service ids into priced selections
//! - [`validation`] - Input shape checks
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use salon_core::{compute_pricing, Money, PricingRequest, Tier};
//! use salon_core::types::{CalculatorSettings, PackageConfig, PackageConfigs, PaymentChoice, Rate};
//!
//! let mut configs = PackageConfigs::new();
//! configs.insert(Tier::Standard, PackageConfig {
//!     discount_rate: Rate::from_bps(1_500),
//!     ..PackageConfig::default()
//! });
//!
//! let request = PricingRequest {
//!     base_cost: Money::from_major(30_000),
//!     services: vec![],
//!     procedure_count: 10,
//!     package_configs: configs,
//!     settings: CalculatorSettings::default(),
//!     payment: PaymentChoice::default(),
//!     free_zones: vec![],
//! };
//!
//! // No services selected: nothing to price.
//! assert!(compute_pricing(&request).unwrap().is_none());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod catalog;
pub mod error;
pub mod money;
pub mod pricing;
pub mod selection;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::{QuoteRequest, ServiceCatalog, ServiceLine};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{compute_pricing, PricingRequest};
pub use selection::{PackageSelector, SelectionState};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency symbol appended by `Money`'s `Display`.
pub const CURRENCY_SYMBOL: &str = "₽";

//! # Service Catalog
//!
//! Resolves what the client picked (`{service_id, quantity}`) into priced
//! [`ServiceSelection`]s, and builds a [`PricingRequest`] from a quote.
//!
//! ```text
//! QuoteRequest ──► ServiceCatalog::resolve ──► ServiceSelection (price frozen)
//!                                                   │
//!        PackageConfigs + CalculatorSettings ───────┤
//!                                                   ▼
//!                                            PricingRequest
//! ```
//!
//! Catalog sync with the booking system is someone else's job; this module
//! only sees the resulting `{id, unit_price}` pairs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::pricing::PricingRequest;
use crate::types::{CalculatorSettings, PackageConfigs, PaymentChoice, ServiceSelection};
use crate::validation::{validate_id, validate_non_negative, validate_quantity};

/// A requested service line before prices are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLine {
    pub service_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Caller input for one quote, expressed in catalog ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub services: Vec<ServiceLine>,
    pub procedure_count: u32,
    #[serde(default)]
    pub payment: PaymentChoice,
    #[serde(default)]
    pub free_zones: Vec<ServiceLine>,
}

/// Unit prices keyed by service id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    prices: HashMap<String, Money>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        ServiceCatalog::default()
    }

    /// Adds or replaces a price.
    pub fn insert(&mut self, service_id: impl Into<String>, unit_price: Money) -> CoreResult<()> {
        let service_id = service_id.into();
        validate_id("service_id", &service_id)?;
        validate_non_negative("unit_price", unit_price)?;
        self.prices.insert(service_id, unit_price);
        Ok(())
    }

    pub fn price(&self, service_id: &str) -> Option<Money> {
        self.prices.get(service_id).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// Freezes current prices onto the requested lines.
    ///
    /// ## Errors
    /// - `CoreError::ServiceNotFound` for an unknown id
    /// - `CoreError::Validation` for a zero quantity
    pub fn resolve(&self, lines: &[ServiceLine]) -> CoreResult<Vec<ServiceSelection>> {
        lines
            .iter()
            .map(|line| -> CoreResult<ServiceSelection> {
                validate_quantity(line.quantity)?;
                let unit_price = self
                    .price(&line.service_id)
                    .ok_or_else(|| CoreError::ServiceNotFound(line.service_id.clone()))?;
                Ok(ServiceSelection::new(line.service_id.clone(), unit_price, line.quantity))
            })
            .collect()
    }

    /// Builds the engine input for `quote`, deriving the base cost.
    ///
    /// ## Errors
    /// As [`resolve`](Self::resolve), plus `ValidationError::Overflow` when
    /// the base cost does not fit.
    pub fn pricing_request(
        &self,
        quote: &QuoteRequest,
        package_configs: PackageConfigs,
        settings: CalculatorSettings,
    ) -> CoreResult<PricingRequest> {
        PricingRequest::from_selection(
            self.resolve(&quote.services)?,
            quote.procedure_count,
            package_configs,
            settings,
            quote.payment,
            self.resolve(&quote.free_zones)?,
        )
    }
}

impl FromIterator<(String, Money)> for ServiceCatalog {
    fn from_iter<I: IntoIterator<Item = (String, Money)>>(iter: I) -> Self {
        ServiceCatalog {
            prices: iter.into_iter().collect(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

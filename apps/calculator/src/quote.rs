//! Quote and sale flows on top of the stores.
//!
//! ```text
//! request.json ──► QuoteRequest ──► Stores::pricing_request ──► compute_pricing
//!                                                                   │
//!                       sell: PackageSelector::select_package ◄─────┘
//!                             PackageSelector::confirm ──► db.sales().record
//! ```

use anyhow::{bail, Context};
use std::path::Path;
use tracing::{info, warn};

use salon_core::error::CoreResult;
use salon_core::types::{CalculationResult, CalculatorSettings, PackageConfigs, Sale, SaleParty, Tier};
use salon_core::{compute_pricing, PackageSelector, PricingRequest, QuoteRequest, ServiceCatalog};
use salon_db::{Database, DbResult};

/// Everything the engine needs besides the quote itself, loaded once.
#[derive(Debug, Clone)]
pub struct Stores {
    pub package_configs: PackageConfigs,
    pub settings: CalculatorSettings,
    pub catalog: ServiceCatalog,
}

impl Stores {
    pub async fn load(db: &Database) -> DbResult<Self> {
        let stores = Stores {
            package_configs: db.package_configs().load_all().await?,
            settings: db.settings().load().await?,
            catalog: db.services().catalog().await?,
        };

        if stores.package_configs.len() < Tier::ALL.len() {
            warn!(
                configured = stores.package_configs.len(),
                "Some package tiers are not configured; they will be shown as unavailable"
            );
        }
        info!(services = stores.catalog.len(), "Stores loaded");
        Ok(stores)
    }

    pub fn pricing_request(&self, quote: &QuoteRequest) -> CoreResult<PricingRequest> {
        self.catalog
            .pricing_request(quote, self.package_configs.clone(), self.settings.clone())
    }
}

/// Reads a quote request from a JSON file.
pub fn read_quote(path: &Path) -> anyhow::Result<QuoteRequest> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Prices a quote. `None` when no services were selected.
pub fn quote(stores: &Stores, quote: &QuoteRequest) -> anyhow::Result<Option<CalculationResult>> {
    let request = stores.pricing_request(quote)?;
    Ok(compute_pricing(&request)?)
}

/// Selects `tier`, confirms and records the sale.
///
/// The quote's payment is used as entered; a down payment outside the
/// tier's bounds is refused rather than adjusted. Full-payment tiers take
/// their final cost as the down payment.
pub async fn sell(
    db: &Database,
    stores: &Stores,
    quote: &QuoteRequest,
    tier: Tier,
    party: SaleParty,
) -> anyhow::Result<Sale> {
    let request = stores.pricing_request(quote)?;
    let Some(result) = compute_pricing(&request)? else {
        bail!("no services selected");
    };

    let mut selector = PackageSelector::new(quote.payment);
    selector.set_installment_months(quote.payment.installment_months, &stores.settings)?;
    selector.select_package(tier, &result)?;

    let package = result.packages.get(tier);
    if !package.requires_full_payment && selector.payment().down_payment != quote.payment.down_payment {
        bail!(
            "down payment {} is outside the {} range {} – {}",
            quote.payment.down_payment,
            tier.label(),
            package.min_down_payment,
            package.max_down_payment
        );
    }

    let new_sale = selector.confirm(&request, party)?;
    let sale = db.sales().record(&new_sale).await?;
    Ok(sale)
}

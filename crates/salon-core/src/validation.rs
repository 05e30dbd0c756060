//! # Validation Module
//!
//! Input shape validation for the pricing engine and its collaborators.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  ├── Wrong types, missing fields                                        │
//! │  └── Unsigned counts cannot be negative                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  ├── Non-negative money, rates ≤ 100%, procedure count ≥ 1              │
//! │  └── Fails fast, never coerces                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Selection state machine                                       │
//! │  └── Down payment bounds, installment options, tier availability        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! "Legal but unusual" numbers (zero base cost, zero quantities, discounts
//! larger than the cost) are NOT rejected here.

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CalculatorSettings, PackageConfig, PaymentChoice, Rate, SaleParty};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a service, client or master identifier.
pub const MAX_ID_LENGTH: usize = 64;

// =============================================================================
// Scalar Validators
// =============================================================================

/// Validates the procedure count multiplier.
///
/// ## Rules
/// - Must be at least 1; there is no upper cap
///
/// ## Example
/// ```rust
/// use salon_core::validation::validate_procedure_count;
///
/// assert!(validate_procedure_count(1).is_ok());
/// assert!(validate_procedure_count(250).is_ok());
/// assert!(validate_procedure_count(0).is_err());
/// ```
pub fn validate_procedure_count(count: u32) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::MustBePositive {
            field: "procedure_count".to_string(),
        });
    }

    Ok(())
}

/// Validates that a monetary amount is not negative.
///
/// ## Example
/// ```rust
/// use salon_core::money::Money;
/// use salon_core::validation::validate_non_negative;
///
/// assert!(validate_non_negative("base_cost", Money::zero()).is_ok());
/// assert!(validate_non_negative("base_cost", Money::from_minor(-1)).is_err());
/// ```
pub fn validate_non_negative(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_rate(field: &str, rate: Rate) -> ValidationResult<()> {
    if rate.bps() > Rate::SCALE {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Rate::SCALE as i64,
        });
    }

    Ok(())
}

/// Validates a catalog service quantity. Must be positive.
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if qty == 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an identifier (service, client, master).
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.chars().count() > MAX_ID_LENGTH {
        return Err(ValidationError::OutOfRange {
            field: format!("{field} length"),
            min: 1,
            max: MAX_ID_LENGTH as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

pub fn validate_package_config(config: &PackageConfig) -> ValidationResult<()> {
    validate_rate("discount_rate", config.discount_rate)?;
    validate_rate("min_down_payment_rate", config.min_down_payment_rate)?;
    validate_rate("bonus_account_rate", config.bonus_account_rate)?;
    validate_non_negative("min_cost", config.min_cost)?;
    if let Some(floor) = config.min_down_payment {
        validate_non_negative("min_down_payment", floor)?;
    }
    for step in &config.dynamic_rates {
        validate_non_negative("dynamic_rates.threshold", step.threshold)?;
        validate_rate("dynamic_rates.rate", step.rate)?;
    }
    Ok(())
}

pub fn validate_settings(settings: &CalculatorSettings) -> ValidationResult<()> {
    validate_non_negative("minimum_down_payment", settings.minimum_down_payment)?;
    validate_rate("bulk_discount_rate", settings.bulk_discount_rate)?;
    validate_non_negative("certificate_discount", settings.certificate_discount)?;
    validate_non_negative("certificate_min_course", settings.certificate_min_course)?;
    Ok(())
}

/// Validates the shape of a payment choice. Bounds are checked later,
/// against a computed tier.
pub fn validate_payment(payment: &PaymentChoice) -> ValidationResult<()> {
    validate_non_negative("down_payment", payment.down_payment)
}

pub fn validate_party(party: &SaleParty) -> ValidationResult<()> {
    validate_id("client_id", &party.client_id)?;
    validate_id("master_id", &party.master_id)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RateStep;

    #[test]
    fn test_validate_procedure_count() {
        assert!(validate_procedure_count(1).is_ok());
        assert!(validate_procedure_count(20).is_ok());
        assert!(validate_procedure_count(u32::MAX).is_ok());
        assert!(validate_procedure_count(0).is_err());
    }

    #[test]
    fn test_validate_rate() {
        assert!(validate_rate("r", Rate::zero()).is_ok());
        assert!(validate_rate("r", Rate::from_bps(10_000)).is_ok());
        assert!(validate_rate("r", Rate::from_bps(10_001)).is_err());
    }

    #[test]
    fn test_validate_id() {
        assert!(validate_id("service_id", "laser-legs").is_ok());
        assert!(validate_id("service_id", "").is_err());
        assert!(validate_id("service_id", "   ").is_err());
        assert!(validate_id("service_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_package_config() {
        let mut config = PackageConfig {
            discount_rate: Rate::from_bps(2_500),
            ..PackageConfig::default()
        };
        assert!(validate_package_config(&config).is_ok());

        config.dynamic_rates.push(RateStep {
            threshold: Money::from_major(40_000),
            rate: Rate::from_bps(12_000),
        });
        assert!(validate_package_config(&config).is_err());

        let negative_floor = PackageConfig {
            min_down_payment: Some(Money::from_minor(-1)),
            ..PackageConfig::default()
        };
        assert!(validate_package_config(&negative_floor).is_err());
    }

    #[test]
    fn test_validate_settings_and_payment() {
        assert!(validate_settings(&CalculatorSettings::default()).is_ok());

        let bad = CalculatorSettings {
            certificate_discount: Money::from_minor(-100),
            ..CalculatorSettings::default()
        };
        assert!(validate_settings(&bad).is_err());

        let payment = PaymentChoice {
            down_payment: Money::from_minor(-1),
            ..PaymentChoice::default()
        };
        assert!(validate_payment(&payment).is_err());
        assert!(validate_payment(&PaymentChoice::default()).is_ok());
    }
}

//! # Error Types
//!
//! Domain-specific error types for salon-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  salon-core errors (this file)                                          │
//! │  ├── CoreError        - Caller misuse of the pricing/selection rules    │
//! │  └── ValidationError  - Malformed input                                 │
//! │                                                                         │
//! │  salon-db errors (separate crate)                                       │
//! │  └── DbError          - Database operation failures                     │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → anyhow (salon-calc)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! - A tier below its minimum cost: `PackageResult::is_available = false`
//! - Zero procedures / empty selection: division-dependent figures are 0

use thiserror::Error;

use crate::money::Money;
use crate::types::Tier;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the selection state machine and
/// catalog resolution. The pricing engine itself only raises `Validation`.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The requested tier is not offered for the current input.
    ///
    /// ## When This Occurs
    /// - Base cost below the tier's minimum
    /// - No configuration row for the tier
    #[error("Package {tier} is not available: {reason}")]
    PackageUnavailable { tier: Tier, reason: String },

    /// `confirm` was called before any tier was selected.
    #[error("No package selected")]
    NoPackageSelected,

    /// Down payment outside the selected tier's bounds.
    #[error("Down payment {amount} is outside the allowed range {min} to {max}")]
    DownPaymentOutOfRange { amount: Money, min: Money, max: Money },

    /// Installment length not offered by the calculator settings.
    #[error("Installment of {months} months is not offered (allowed: {allowed:?})")]
    InvalidInstallmentMonths { months: u32, allowed: Vec<u32> },

    /// A requested service id is not in the catalog.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// Nothing selected, so there is nothing to price or sell.
    #[error("No services selected")]
    NoServicesSelected,

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors (malformed shapes and out-of-domain values).
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g. unparsable setting).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A derived amount does not fit in the money representation.
    #[error("{field} is too large")]
    Overflow { field: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

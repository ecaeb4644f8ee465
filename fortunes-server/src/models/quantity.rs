//! Requested sample size

use super::ValidationError;

/// Smallest number of fortunes a caller may ask for
pub const MIN_QUANTITY: i64 = 1;

/// Largest number of fortunes a caller may ask for
pub const MAX_QUANTITY: i64 = 20;

/// Used when the request does not say
pub const DEFAULT_QUANTITY: i64 = 5;

/// Validated sample size, always within `1..=20`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantity(i64);

impl Quantity {
    /// Create a quantity, rejecting anything outside `1..=20`.
    ///
    /// # Example
    /// ```
    /// use fortunes_server::models::Quantity;
    ///
    /// assert!(Quantity::new(20).is_ok());
    /// assert!(Quantity::new(0).is_err());
    /// assert!(Quantity::new(21).is_err());
    /// ```
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&value) {
            return Err(ValidationError::OutOfRange {
                field: "quantity",
                min: MIN_QUANTITY,
                max: MAX_QUANTITY,
                value,
            });
        }

        Ok(Self(value))
    }

    /// Validate an optional value, falling back to the default of 5.
    pub fn from_optional(value: Option<i64>) -> Result<Self, ValidationError> {
        value.map_or(Ok(Self::default()), Self::new)
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self(DEFAULT_QUANTITY)
    }
}

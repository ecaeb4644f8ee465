//! Domain models with validation at construction
//!
//! Request input is validated when creating these types.
//! Invalid input returns ValidationError, not panic.

pub mod fortune;
pub mod quantity;
pub mod validation;

pub use fortune::{Fortune, FortuneBatch};
pub use quantity::Quantity;
pub use validation::ValidationError;

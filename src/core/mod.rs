//! Core rule model, calculation request/result types, errors, and validation.
//!
//! This module holds everything the engine and rule stores share: the
//! tax rule data model, the calculation request and result, rounding,
//! and rule validation.

mod builder;
mod calculation;
mod error;
mod rounding;
mod types;
mod validation;

pub use builder::*;
pub use calculation::*;
pub use error::*;
pub use rounding::*;
pub use types::*;
pub use validation::validate_rule;

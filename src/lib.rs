//! # taxrule
//!
//! Rule-driven VAT calculation for multi-tenant billing in the GCC region.
//!
//! Each organization keeps its own tax rules: progressive brackets,
//! exemptions, and category-specific rates, each with a priority, an
//! effective window and an optional region. The engine combines them with
//! the regional standard rate and returns base amount, VAT amount,
//! effective rate and a trace of the rules that shaped the result.
//!
//! All monetary values use [`rust_decimal::Decimal`], never floating point.
//!
//! ## Quick Start
//!
//! ```rust
//! use taxrule::core::*;
//! use taxrule::engine::TaxEngine;
//! use taxrule::store::InMemoryRuleStore;
//! use rust_decimal_macros::dec;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let store = InMemoryRuleStore::new();
//! store
//!     .create_rule(
//!         TaxRuleBuilder::new("org-1", "Fuel", RuleConfig::category_rules())
//!             .category_rule(CategoryTaxRule::new("fuel", dec!(15)))
//!             .build()
//!             .unwrap(),
//!     )
//!     .unwrap();
//!
//! let engine = TaxEngine::new(store);
//! let request = TaxCalculationRequest::new(dec!(115), "org-1")
//!     .region(Region::Uae)
//!     .category_id("fuel");
//! let result = engine.calculate(&request).await.unwrap();
//!
//! assert_eq!(result.vat_amount, dec!(15.00));
//! assert_eq!(result.base_amount, dec!(100.00));
//! assert_eq!(result.applied_rules, vec!["category-specific tax rate"]);
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Rule model, validation, engine, in-memory store |
//! | `cache` | [`store::CachedRuleStore`], a TTL cache over any store |
//! | `settings` | Load [`config::EngineConfig`] from files and `TAXRULE__*` env vars |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "core")]
pub mod config;

#[cfg(feature = "core")]
pub mod engine;

#[cfg(feature = "core")]
pub mod store;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;

//! Tax rule resolution and calculation.
//!
//! A calculation runs in a fixed order:
//!
//! 1. `zero_rated` / `exempt` tax types short-circuit without a rule lookup.
//! 2. Active rules are fetched from the [`RuleStore`](crate::store::RuleStore).
//! 3. Exemptions shrink the taxable base ([`evaluate_exemptions`]).
//! 4. The rate is picked by the [`RatePipeline`]: manual override, then
//!    category rate, then bracket rate, then the regional default.
//! 5. [`compute_tax`] derives base and VAT amounts.
//! 6. The [`ResultAssembler`] packages amounts, rate and the applied-rules trace.
//!
//! # Example
//!
//! ```
//! use taxrule::core::*;
//! use taxrule::engine::TaxEngine;
//! use taxrule::store::InMemoryRuleStore;
//! use rust_decimal_macros::dec;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = TaxEngine::new(InMemoryRuleStore::new());
//! let request = TaxCalculationRequest::new(dec!(100), "org-1")
//!     .region(Region::Uae)
//!     .method(CalculationMethod::Exclusive);
//! let result = engine.calculate(&request).await.unwrap();
//! assert_eq!(result.vat_amount, dec!(5.00));
//! assert_eq!(result.base_amount, dec!(100));
//! # }
//! ```

mod arithmetic;
mod assembler;
mod bracket;
mod calculator;
mod category;
mod exemption;
mod precedence;

pub use arithmetic::{TaxAmounts, compute_tax};
pub use assembler::ResultAssembler;
pub use bracket::{BracketMatch, resolve_bracket};
pub use calculator::TaxEngine;
pub use category::resolve_category_rate;
pub use exemption::{ExemptionOutcome, evaluate_exemptions};
pub use precedence::{
    BracketRate, CategoryRate, ManualOverride, RatePipeline, RateResolver, RateSource,
    RegionalDefault, ResolutionContext, ResolvedRate,
};

use chrono::NaiveDate;

use crate::core::{Region, RuleType, TaxRule};

/// Rules applicable to one calculation, ordered highest priority first and,
/// within equal priority, most recently created first.
#[derive(Debug, Clone, Default)]
pub struct ActiveRules<'a> {
    rules: Vec<&'a TaxRule>,
}

impl<'a> ActiveRules<'a> {
    /// Keep the rules active in `region` on `date` and order them for evaluation.
    pub fn select(rules: &'a [TaxRule], date: NaiveDate, region: Region) -> Self {
        let mut rules: Vec<&TaxRule> = rules
            .iter()
            .filter(|r| r.is_active_on(date, region))
            .collect();
        rules.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Self { rules }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a TaxRule> + '_ {
        self.rules.iter().copied()
    }

    /// Rules of one type, in evaluation order.
    pub fn of_type(&self, rule_type: RuleType) -> impl Iterator<Item = &'a TaxRule> + '_ {
        self.iter().filter(move |r| r.rule_type() == rule_type)
    }
}

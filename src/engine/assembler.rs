use rust_decimal::Decimal;

use super::arithmetic::TaxAmounts;
use super::exemption::ExemptionOutcome;
use super::precedence::{RateSource, ResolvedRate};
use crate::core::{TaxBreakdown, TaxCalculationResult, VatTaxType};

/// Collects the trace and breakdown of a calculation and produces the result.
#[derive(Debug, Clone)]
pub struct ResultAssembler {
    original_amount: Decimal,
    is_reverse_charge: bool,
    applied_rules: Vec<String>,
    breakdown: TaxBreakdown,
}

impl ResultAssembler {
    pub fn new(original_amount: Decimal, is_reverse_charge: bool) -> Self {
        Self {
            original_amount,
            is_reverse_charge,
            applied_rules: Vec::new(),
            breakdown: TaxBreakdown {
                exemption_amount: Some(Decimal::ZERO),
                ..TaxBreakdown::default()
            },
        }
    }

    /// Result for a tax type that is never taxed (`zero_rated`, `exempt`).
    pub fn untaxed(amount: Decimal, tax_type: VatTaxType) -> TaxCalculationResult {
        TaxCalculationResult {
            base_amount: amount,
            vat_amount: Decimal::ZERO,
            effective_tax_rate: Decimal::ZERO,
            applied_rules: vec![tax_type.as_str().to_string()],
            is_reverse_charge: false,
            breakdown: None,
        }
    }

    pub fn exemptions(mut self, outcome: &ExemptionOutcome) -> Self {
        self.applied_rules.extend(outcome.applied.iter().cloned());
        self.breakdown.exemption_amount = Some(outcome.exempted(self.original_amount));
        self
    }

    pub fn trace(mut self, entry: impl Into<String>) -> Self {
        self.applied_rules.push(entry.into());
        self
    }

    pub fn rate(mut self, resolved: &ResolvedRate) -> Self {
        match resolved.source {
            RateSource::Category => self.breakdown.category_rate = Some(resolved.rate),
            RateSource::Bracket { taxable_amount } => {
                self.breakdown.bracket_amount = Some(taxable_amount);
                self.breakdown.bracket_rate = Some(resolved.rate);
            }
            RateSource::Manual | RateSource::RegionalDefault => {}
        }
        self.applied_rules.push(resolved.trace.clone());
        self
    }

    /// Result for a fully exempt amount: nothing is taxed and the base is
    /// the original amount.
    pub fn fully_exempt(self) -> TaxCalculationResult {
        let amounts = TaxAmounts {
            base_amount: self.original_amount,
            vat_amount: Decimal::ZERO,
        };
        self.finish(amounts, Decimal::ZERO)
    }

    pub fn finish(mut self, amounts: TaxAmounts, effective_rate: Decimal) -> TaxCalculationResult {
        if self.is_reverse_charge {
            self.applied_rules
                .push(VatTaxType::ReverseCharge.as_str().to_string());
        }
        TaxCalculationResult {
            base_amount: amounts.base_amount,
            vat_amount: amounts.vat_amount,
            effective_tax_rate: effective_rate,
            applied_rules: self.applied_rules,
            is_reverse_charge: self.is_reverse_charge,
            breakdown: Some(self.breakdown),
        }
    }
}

#![no_main]

use libfuzzer_sys::fuzz_target;
use rust_decimal::Decimal;
use taxrule::engine::TaxEngine;
use taxrule::store::InMemoryRuleStore;
use taxrule::{CalculationMethod, Region, TaxCalculationRequest, TaxRule, validate_rule};

/// Input layout: `{"request": {...}, "rules": [...]}`.
#[derive(serde::Deserialize)]
struct Input {
    request: TaxCalculationRequest,
    #[serde(default)]
    rules: Vec<TaxRule>,
}

fuzz_target!(|data: &[u8]| {
    let Ok(input) = serde_json::from_slice::<Input>(data) else {
        return;
    };

    let engine = TaxEngine::new(InMemoryRuleStore::new());
    let region = input.request.region.unwrap_or(Region::Uae);
    let result = engine.calculate_with_rules(&input.request, region, &input.rules);
    assert!(result.vat_amount.scale() <= 2);

    // Reconciliation is exact only while every intermediate value keeps its cents.
    let exact = input.request.amount >= Decimal::ZERO
        && input.request.amount <= Decimal::from(1_000_000_000_000i64)
        && input
            .request
            .tax_rate
            .is_none_or(|r| r >= Decimal::ZERO && r <= Decimal::ONE_HUNDRED)
        && input.rules.iter().all(|r| validate_rule(r).is_empty());
    let inclusive = input
        .request
        .calculation_method
        .is_none_or(|m| m == CalculationMethod::Inclusive);
    let fully_exempt = result
        .applied_rules
        .iter()
        .any(|r| r.starts_with("Full exemption"));
    if exact && inclusive && !result.is_reverse_charge && !fully_exempt {
        let exempted = result
            .breakdown
            .as_ref()
            .and_then(|b| b.exemption_amount)
            .unwrap_or_default();
        assert_eq!(
            result.base_amount + result.vat_amount + exempted,
            input.request.amount
        );
    }
});

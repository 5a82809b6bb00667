use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::Region;

/// Explicit VAT treatment supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VatTaxType {
    /// Resolve the rate from configured rules.
    #[default]
    Standard,
    /// 0% VAT, no rule lookup.
    ZeroRated,
    /// Outside the scope of VAT, no rule lookup.
    Exempt,
    /// VAT is computed for reporting but self-assessed by the recipient.
    ReverseCharge,
}

impl VatTaxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::ZeroRated => "zero_rated",
            Self::Exempt => "exempt",
            Self::ReverseCharge => "reverse_charge",
        }
    }
}

/// Whether the stated amount already contains the tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalculationMethod {
    /// Tax is extracted from the amount.
    #[default]
    Inclusive,
    /// Tax is added on top of the amount.
    Exclusive,
}

/// Input to a tax calculation, as supplied by expense, invoice and
/// purchase-order flows.
///
/// ```
/// use taxrule::core::*;
/// use rust_decimal_macros::dec;
///
/// let request = TaxCalculationRequest::new(dec!(100), "org-1")
///     .region(Region::Uae)
///     .category_id("travel")
///     .method(CalculationMethod::Exclusive);
/// assert_eq!(request.calculation_method, Some(CalculationMethod::Exclusive));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationRequest {
    /// Gross transaction amount.
    pub amount: Decimal,
    pub organization_id: String,
    /// Defaults to the organization's region, then to the configured baseline.
    pub region: Option<Region>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    /// Manual rate override in percent.
    pub tax_rate: Option<Decimal>,
    pub vat_tax_type: Option<VatTaxType>,
    /// Defaults to the configured method (inclusive unless configured otherwise).
    pub calculation_method: Option<CalculationMethod>,
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

impl TaxCalculationRequest {
    pub fn new(amount: Decimal, organization_id: impl Into<String>) -> Self {
        Self {
            amount,
            organization_id: organization_id.into(),
            region: None,
            category_id: None,
            category_name: None,
            tax_rate: None,
            vat_tax_type: None,
            calculation_method: None,
            date: None,
        }
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn category_id(mut self, id: impl Into<String>) -> Self {
        self.category_id = Some(id.into());
        self
    }

    pub fn category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    pub fn vat_tax_type(mut self, tax_type: VatTaxType) -> Self {
        self.vat_tax_type = Some(tax_type);
        self
    }

    pub fn method(mut self, method: CalculationMethod) -> Self {
        self.calculation_method = Some(method);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn tax_type(&self) -> VatTaxType {
        self.vat_tax_type.unwrap_or_default()
    }
}

/// Outcome of a tax calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxCalculationResult {
    pub base_amount: Decimal,
    pub vat_amount: Decimal,
    /// Rate in percent that was ultimately applied.
    pub effective_tax_rate: Decimal,
    /// Ordered, human-readable record of the resolution steps that fired.
    pub applied_rules: Vec<String>,
    pub is_reverse_charge: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<TaxBreakdown>,
}

/// Observability details attached to a [`TaxCalculationResult`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxBreakdown {
    /// Original amount minus the taxable amount left after exemptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemption_amount: Option<Decimal>,
    /// Taxable amount the bracket rate was applied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket_amount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bracket_rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_rate: Option<Decimal>,
}

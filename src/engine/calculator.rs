use chrono::{NaiveDate, Utc};
use tracing::{Span, debug, instrument, warn};

use super::ActiveRules;
use super::arithmetic::compute_tax;
use super::assembler::ResultAssembler;
use super::exemption::evaluate_exemptions;
use super::precedence::{RatePipeline, ResolutionContext};
use crate::config::EngineConfig;
use crate::core::{
    EngineError, Region, StoreError, TaxCalculationRequest, TaxCalculationResult, TaxRule,
    VatTaxType,
};
use crate::store::RuleStore;

/// Tax calculation engine over a [`RuleStore`].
///
/// The engine holds no per-call state; one instance can serve concurrent
/// calculations for any number of organizations.
pub struct TaxEngine<S> {
    store: S,
    config: EngineConfig,
    pipeline: RatePipeline,
}

impl<S: RuleStore> TaxEngine<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: S, config: EngineConfig) -> Self {
        Self {
            store,
            config,
            pipeline: RatePipeline::standard(),
        }
    }

    /// Replace the rate precedence chain.
    pub fn with_pipeline(mut self, pipeline: RatePipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Calculate tax for `request`, reading active rules from the store.
    ///
    /// # Errors
    ///
    /// Only store failures are errors; see [`EngineError::is_retryable`].
    #[instrument(
        skip(self, request),
        fields(
            organization_id = %request.organization_id,
            amount = %request.amount,
            region
        )
    )]
    pub async fn calculate(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<TaxCalculationResult, EngineError> {
        let tax_type = request.tax_type();
        if matches!(tax_type, VatTaxType::ZeroRated | VatTaxType::Exempt) {
            debug!(tax_type = tax_type.as_str(), "untaxed tax type, skipping rule lookup");
            return Ok(ResultAssembler::untaxed(request.amount, tax_type));
        }

        let region = self.resolve_region(request).await?;
        Span::current().record("region", region.code());

        let as_of = as_of(request);
        let rules = self
            .store
            .get_active_rules(&request.organization_id, region, as_of)
            .await
            .inspect_err(|e| warn!(error = %e, "failed to fetch tax rules"))?;
        debug!(rules = rules.len(), %as_of, "tax rules fetched");

        Ok(self.calculate_with_rules(request, region, &rules))
    }

    /// Calculate tax against an already fetched rule set. Performs no I/O.
    ///
    /// Rules not active in `region` on the request date are ignored, so the
    /// full rule list of an organization may be passed.
    pub fn calculate_with_rules(
        &self,
        request: &TaxCalculationRequest,
        region: Region,
        rules: &[TaxRule],
    ) -> TaxCalculationResult {
        let tax_type = request.tax_type();
        if matches!(tax_type, VatTaxType::ZeroRated | VatTaxType::Exempt) {
            return ResultAssembler::untaxed(request.amount, tax_type);
        }

        let is_reverse_charge = tax_type == VatTaxType::ReverseCharge;
        let method = request
            .calculation_method
            .unwrap_or(self.config.default_calculation_method);
        let default_rate = self.config.default_rate(region);
        let active = ActiveRules::select(rules, as_of(request), region);
        let assembler = ResultAssembler::new(request.amount, is_reverse_charge);

        if active.is_empty() && request.tax_rate.is_none() {
            debug!(rate = %default_rate, "no active rules, standard calculation");
            let amounts = compute_tax(
                request.amount,
                default_rate,
                method,
                is_reverse_charge,
                self.config.rounding,
            );
            return assembler
                .trace("standard tax calculation")
                .finish(amounts, default_rate);
        }

        let category_id = request.category_id.as_deref();
        let category_name = request.category_name.as_deref();
        let exemptions = evaluate_exemptions(request.amount, &active, category_id, category_name);
        if exemptions.fully_exempt {
            return assembler.exemptions(&exemptions).fully_exempt();
        }

        let ctx = ResolutionContext {
            rules: &active,
            taxable_amount: exemptions.taxable_amount,
            region,
            manual_rate: request.tax_rate,
            category_id,
            category_name,
            default_rate,
        };
        let resolved = self.pipeline.resolve(&ctx);
        let amounts = compute_tax(
            exemptions.taxable_amount,
            resolved.rate,
            method,
            is_reverse_charge,
            self.config.rounding,
        );

        assembler
            .exemptions(&exemptions)
            .rate(&resolved)
            .finish(amounts, resolved.rate)
    }

    /// Region of the request, else of the organization, else the baseline.
    async fn resolve_region(
        &self,
        request: &TaxCalculationRequest,
    ) -> Result<Region, EngineError> {
        if let Some(region) = request.region {
            return Ok(region);
        }
        match self
            .store
            .organization_region(&request.organization_id)
            .await
        {
            Ok(Some(region)) => Ok(region),
            Ok(None) | Err(StoreError::NotFound { .. }) => {
                debug!(
                    baseline = %self.config.baseline_region,
                    "organization has no region, using baseline"
                );
                Ok(self.config.baseline_region)
            }
            Err(e) => {
                warn!(error = %e, "failed to look up organization region");
                Err(e.into())
            }
        }
    }
}

fn as_of(request: &TaxCalculationRequest) -> NaiveDate {
    request.date.unwrap_or_else(|| Utc::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct Unreachable;

    #[async_trait]
    impl RuleStore for Unreachable {
        async fn get_active_rules(
            &self,
            _organization_id: &str,
            _region: Region,
            _as_of: NaiveDate,
        ) -> Result<Vec<TaxRule>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    struct MissingOrganization;

    #[async_trait]
    impl RuleStore for MissingOrganization {
        async fn get_active_rules(
            &self,
            _organization_id: &str,
            _region: Region,
            _as_of: NaiveDate,
        ) -> Result<Vec<TaxRule>, StoreError> {
            Ok(Vec::new())
        }

        async fn organization_region(
            &self,
            organization_id: &str,
        ) -> Result<Option<Region>, StoreError> {
            Err(StoreError::NotFound {
                entity: "organization",
                id: organization_id.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn store_failure_is_retryable_error() {
        let engine = TaxEngine::new(Unreachable);
        let err = engine
            .calculate(&TaxCalculationRequest::new(dec!(100), "org").region(Region::Uae))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn untaxed_types_never_touch_the_store() {
        let engine = TaxEngine::new(Unreachable);
        for tax_type in [VatTaxType::ZeroRated, VatTaxType::Exempt] {
            let request = TaxCalculationRequest::new(dec!(100), "org").vat_tax_type(tax_type);
            let result = engine.calculate(&request).await.unwrap();
            assert_eq!(result.vat_amount, dec!(0));
            assert_eq!(result.base_amount, dec!(100));
        }
    }

    #[tokio::test]
    async fn unknown_organization_uses_baseline_region() {
        let config = EngineConfig::default().with_baseline_region(Region::SaudiArabia);
        let engine = TaxEngine::with_config(MissingOrganization, config);
        let request = TaxCalculationRequest::new(dec!(100), "ghost")
            .method(crate::core::CalculationMethod::Exclusive);
        let result = engine.calculate(&request).await.unwrap();
        assert_eq!(result.effective_tax_rate, dec!(15));
        assert_eq!(result.vat_amount, dec!(15));
    }
}

use rust_decimal::Decimal;
use tracing::debug;

use super::ActiveRules;
use super::bracket::resolve_bracket;
use super::category::resolve_category_rate;
use crate::core::Region;

/// Everything a [`RateResolver`] may look at.
#[derive(Debug, Clone)]
pub struct ResolutionContext<'a> {
    pub rules: &'a ActiveRules<'a>,
    /// Base left after exemptions.
    pub taxable_amount: Decimal,
    pub region: Region,
    pub manual_rate: Option<Decimal>,
    pub category_id: Option<&'a str>,
    pub category_name: Option<&'a str>,
    /// Regional default rate from the engine configuration.
    pub default_rate: Decimal,
}

/// Which resolution step produced the rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    Manual,
    Category,
    Bracket { taxable_amount: Decimal },
    RegionalDefault,
}

/// A rate together with the trace entry describing where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRate {
    pub rate: Decimal,
    pub source: RateSource,
    pub trace: String,
}

/// One step of the rate precedence chain.
pub trait RateResolver: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Return a rate, or `None` to defer to the next resolver.
    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<ResolvedRate>;
}

/// Caller-supplied rate, used verbatim.
pub struct ManualOverride;

impl RateResolver for ManualOverride {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<ResolvedRate> {
        ctx.manual_rate.map(|rate| ResolvedRate {
            rate,
            source: RateSource::Manual,
            trace: "manual tax rate override".into(),
        })
    }
}

/// Category-specific flat rate.
pub struct CategoryRate;

impl RateResolver for CategoryRate {
    fn name(&self) -> &'static str {
        "category"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<ResolvedRate> {
        resolve_category_rate(ctx.rules, ctx.category_id, ctx.category_name).map(|(_, c)| {
            ResolvedRate {
                rate: c.rate,
                source: RateSource::Category,
                trace: "category-specific tax rate".into(),
            }
        })
    }
}

/// Progressive bracket of the highest-priority bracket rule.
pub struct BracketRate;

impl RateResolver for BracketRate {
    fn name(&self) -> &'static str {
        "bracket"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<ResolvedRate> {
        resolve_bracket(ctx.rules, ctx.taxable_amount).map(|m| ResolvedRate {
            rate: m.rate(),
            source: RateSource::Bracket {
                taxable_amount: ctx.taxable_amount,
            },
            trace: m.describe(),
        })
    }
}

/// Regional default rate. Always resolves.
pub struct RegionalDefault;

impl RateResolver for RegionalDefault {
    fn name(&self) -> &'static str {
        "regional_default"
    }

    fn resolve(&self, ctx: &ResolutionContext<'_>) -> Option<ResolvedRate> {
        Some(regional_default(ctx))
    }
}

fn regional_default(ctx: &ResolutionContext<'_>) -> ResolvedRate {
    ResolvedRate {
        rate: ctx.default_rate,
        source: RateSource::RegionalDefault,
        trace: "default regional tax rate".into(),
    }
}

/// Ordered chain of resolvers; the first to return a rate wins.
pub struct RatePipeline {
    resolvers: Vec<Box<dyn RateResolver>>,
}

impl Default for RatePipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl RatePipeline {
    /// Manual override → category rate → bracket rate → regional default.
    pub fn standard() -> Self {
        Self {
            resolvers: vec![
                Box::new(ManualOverride),
                Box::new(CategoryRate),
                Box::new(BracketRate),
                Box::new(RegionalDefault),
            ],
        }
    }

    pub fn with_resolvers(resolvers: Vec<Box<dyn RateResolver>>) -> Self {
        Self { resolvers }
    }

    /// Insert a resolver ahead of the regional default.
    pub fn insert_before_default(mut self, resolver: Box<dyn RateResolver>) -> Self {
        let at = self
            .resolvers
            .iter()
            .position(|r| r.name() == RegionalDefault.name())
            .unwrap_or(self.resolvers.len());
        self.resolvers.insert(at, resolver);
        self
    }

    /// Run the chain. Falls back to the regional default when no resolver matches.
    pub fn resolve(&self, ctx: &ResolutionContext<'_>) -> ResolvedRate {
        for resolver in &self.resolvers {
            if let Some(resolved) = resolver.resolve(ctx) {
                debug!(
                    resolver = resolver.name(),
                    rate = %resolved.rate,
                    region = %ctx.region,
                    "tax rate resolved"
                );
                return resolved;
            }
        }
        regional_default(ctx)
    }
}

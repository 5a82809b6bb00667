use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tax jurisdiction of an organization, a rule, or a single calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Region {
    /// United Arab Emirates: 5% standard VAT.
    #[serde(rename = "UAE", alias = "uae")]
    Uae,
    /// Kingdom of Saudi Arabia: 15% standard VAT.
    #[serde(rename = "KSA", alias = "ksa")]
    SaudiArabia,
    /// Bahrain: 10% standard VAT.
    #[serde(rename = "BH", alias = "bh")]
    Bahrain,
    /// Oman: 5% standard VAT.
    #[serde(rename = "OM", alias = "om")]
    Oman,
    /// Qatar: no VAT levied.
    #[serde(rename = "QA", alias = "qa")]
    Qatar,
    /// Kuwait: no VAT levied.
    #[serde(rename = "KW", alias = "kw")]
    Kuwait,
}

impl Region {
    /// Every supported region, in code order.
    pub const ALL: [Region; 6] = [
        Self::Uae,
        Self::SaudiArabia,
        Self::Bahrain,
        Self::Oman,
        Self::Qatar,
        Self::Kuwait,
    ];

    /// Short region code as stored on organization and rule records.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Uae => "UAE",
            Self::SaudiArabia => "KSA",
            Self::Bahrain => "BH",
            Self::Oman => "OM",
            Self::Qatar => "QA",
            Self::Kuwait => "KW",
        }
    }

    /// Parse a region code (case-insensitive).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "UAE" | "AE" => Some(Self::Uae),
            "KSA" | "SA" => Some(Self::SaudiArabia),
            "BH" => Some(Self::Bahrain),
            "OM" => Some(Self::Oman),
            "QA" => Some(Self::Qatar),
            "KW" => Some(Self::Kuwait),
            _ => None,
        }
    }

    /// Built-in default VAT rate (percent) for the region.
    pub fn standard_rate(&self) -> Decimal {
        match self {
            Self::Uae | Self::Oman => dec!(5),
            Self::SaudiArabia => dec!(15),
            Self::Bahrain => dec!(10),
            Self::Qatar | Self::Kuwait => Decimal::ZERO,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Discriminant of a [`RuleConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    Bracket,
    Exemption,
    Category,
    Threshold,
    TimeBased,
}

impl RuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bracket => "bracket",
            Self::Exemption => "exemption",
            Self::Category => "category",
            Self::Threshold => "threshold",
            Self::TimeBased => "time_based",
        }
    }
}

impl fmt::Display for RuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type-specific payload of a [`TaxRule`].
///
/// Serialized adjacently tagged as `rule_type` / `rule_config`, so a rule
/// record reads `{"rule_type": "bracket", "rule_config": {"brackets": [...]}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type", content = "rule_config", rename_all = "snake_case")]
pub enum RuleConfig {
    /// Progressive brackets; the engine evaluates them in ascending `min_amount` order.
    Bracket { brackets: Vec<TaxBracket> },
    /// Exemption clauses that shrink the taxable base.
    Exemption { exemptions: Vec<TaxExemption> },
    /// Flat per-category override rates.
    Category { category_rules: Vec<CategoryTaxRule> },
    /// Threshold settings. Stored for administrators, not interpreted by the engine.
    Threshold { settings: serde_json::Value },
    /// Time-based settings. Stored for administrators, not interpreted by the engine.
    TimeBased { settings: serde_json::Value },
}

impl RuleConfig {
    /// Empty bracket configuration.
    pub fn brackets() -> Self {
        Self::Bracket {
            brackets: Vec::new(),
        }
    }

    /// Empty exemption configuration.
    pub fn exemptions() -> Self {
        Self::Exemption {
            exemptions: Vec::new(),
        }
    }

    /// Empty category-rate configuration.
    pub fn category_rules() -> Self {
        Self::Category {
            category_rules: Vec::new(),
        }
    }

    pub fn rule_type(&self) -> RuleType {
        match self {
            Self::Bracket { .. } => RuleType::Bracket,
            Self::Exemption { .. } => RuleType::Exemption,
            Self::Category { .. } => RuleType::Category,
            Self::Threshold { .. } => RuleType::Threshold,
            Self::TimeBased { .. } => RuleType::TimeBased,
        }
    }
}

/// A named, prioritized tax policy owned by one organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRule {
    pub id: Uuid,
    pub organization_id: String,
    /// `None` applies the rule to every region of the organization.
    pub region: Option<Region>,
    pub name: String,
    #[serde(flatten)]
    pub config: RuleConfig,
    /// First day the rule applies (inclusive).
    pub effective_date: Option<NaiveDate>,
    /// Last day the rule applies (inclusive).
    pub expiry_date: Option<NaiveDate>,
    pub is_active: bool,
    /// Higher values are evaluated first.
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

impl TaxRule {
    pub fn rule_type(&self) -> RuleType {
        self.config.rule_type()
    }

    /// Whether the rule applies to a calculation in `region` on `date`.
    pub fn is_active_on(&self, date: NaiveDate, region: Region) -> bool {
        self.is_active
            && self.effective_date.is_none_or(|d| d <= date)
            && self.expiry_date.is_none_or(|d| d >= date)
            && self.region.is_none_or(|r| r == region)
    }

    /// Brackets of a bracket rule; empty for any other type.
    pub fn brackets(&self) -> &[TaxBracket] {
        match &self.config {
            RuleConfig::Bracket { brackets } => brackets,
            _ => &[],
        }
    }

    /// Exemption clauses of an exemption rule; empty for any other type.
    pub fn exemptions(&self) -> &[TaxExemption] {
        match &self.config {
            RuleConfig::Exemption { exemptions } => exemptions,
            _ => &[],
        }
    }

    /// Category rates of a category rule; empty for any other type.
    pub fn category_rules(&self) -> &[CategoryTaxRule] {
        match &self.config {
            RuleConfig::Category { category_rules } => category_rules,
            _ => &[],
        }
    }
}

/// One progressive range of a bracket rule. Both ends are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub rule_id: Uuid,
    pub min_amount: Decimal,
    /// `None` means the bracket is unbounded above.
    pub max_amount: Option<Decimal>,
    /// Rate in percent.
    pub rate: Decimal,
    /// Display order among the rule's brackets.
    pub bracket_order: i32,
}

impl TaxBracket {
    /// Unattached bracket; the owning rule id is filled in when it is attached.
    pub fn new(min_amount: Decimal, max_amount: Option<Decimal>, rate: Decimal) -> Self {
        Self {
            rule_id: Uuid::nil(),
            min_amount,
            max_amount,
            rate,
            bracket_order: 0,
        }
    }

    pub fn order(mut self, bracket_order: i32) -> Self {
        self.bracket_order = bracket_order;
        self
    }

    pub fn contains(&self, amount: Decimal) -> bool {
        amount >= self.min_amount && self.max_amount.is_none_or(|max| amount <= max)
    }
}

impl fmt::Display for TaxBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_amount {
            Some(max) => write!(f, "{}–{}", self.min_amount.normalize(), max.normalize()),
            None => write!(f, "{}+", self.min_amount.normalize()),
        }
    }
}

/// How an exemption clause decides whether it applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExemptionType {
    /// Applies to a category.
    Category,
    /// Applies when the transaction amount is at or below a threshold.
    AmountThreshold,
    /// Applies to a product. Requests carry no product context, so it never matches.
    Product,
    /// Applies to a vendor. Requests carry no vendor context, so it never matches.
    Vendor,
    /// Removes the whole base for a category.
    Full,
    /// Removes part of the base, optionally scoped to a category.
    Partial,
}

/// How much of the base a matching exemption removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExemptionEffect {
    /// The whole amount; no further exemptions are evaluated.
    Full,
    /// `amount × percentage / 100` of the original amount.
    Percentage(Decimal),
    /// A fixed amount.
    Fixed(Decimal),
}

/// One exemption clause of an exemption rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxExemption {
    pub rule_id: Uuid,
    pub exemption_type: ExemptionType,
    pub category_id: Option<String>,
    /// Name of the linked category, matched against the request's category name.
    pub category_name: Option<String>,
    pub exemption_amount: Option<Decimal>,
    pub exemption_percentage: Option<Decimal>,
    pub threshold_amount: Option<Decimal>,
    pub description: String,
}

impl TaxExemption {
    /// `Full` type always removes everything. Other types use the percentage,
    /// then the fixed amount, and remove everything when neither is set.
    pub fn effect(&self) -> ExemptionEffect {
        if self.exemption_type == ExemptionType::Full {
            return ExemptionEffect::Full;
        }
        match (self.exemption_percentage, self.exemption_amount) {
            (Some(pct), _) => ExemptionEffect::Percentage(pct),
            (None, Some(amount)) => ExemptionEffect::Fixed(amount),
            (None, None) => ExemptionEffect::Full,
        }
    }

    /// Whether the clause is scoped to a category at all.
    pub fn is_category_scoped(&self) -> bool {
        self.category_id.is_some() || self.category_name.is_some()
    }
}

/// Flat rate for one category, owned by a category rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTaxRule {
    pub rule_id: Uuid,
    pub category_id: String,
    /// Name of the linked category, used when the request carries no category id.
    pub category_name: Option<String>,
    /// Rate in percent.
    pub rate: Decimal,
    pub is_active: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CategoryTaxRule {
    /// Active, unattached category rate.
    pub fn new(category_id: impl Into<String>, rate: Decimal) -> Self {
        Self {
            rule_id: Uuid::nil(),
            category_id: category_id.into(),
            category_name: None,
            rate,
            is_active: true,
            description: None,
            created_at: Utc::now(),
        }
    }

    pub fn category_name(mut self, name: impl Into<String>) -> Self {
        self.category_name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }
}

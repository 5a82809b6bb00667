use rust_decimal::Decimal;

use super::ActiveRules;
use crate::core::{RuleType, TaxBracket, TaxRule};

/// Bracket picked for a taxable amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketMatch<'a> {
    pub rule: &'a TaxRule,
    pub bracket: &'a TaxBracket,
    /// No range contained the amount; the highest bracket was used instead.
    pub fallback: bool,
}

impl BracketMatch<'_> {
    pub fn rate(&self) -> Decimal {
        self.bracket.rate
    }

    /// Applied-rules trace entry, e.g. `Tax bracket: 10% (0–1000)`.
    pub fn describe(&self) -> String {
        if self.fallback {
            format!("Tax bracket: {}% (highest rate)", self.bracket.rate.normalize())
        } else {
            format!(
                "Tax bracket: {}% ({})",
                self.bracket.rate.normalize(),
                self.bracket
            )
        }
    }
}

/// Find the bracket of the highest-priority active bracket rule that
/// contains `amount`.
///
/// Brackets are scanned in ascending `min_amount` order and the first
/// inclusive match wins, so overlapping ranges resolve to the lower one.
/// An amount outside every range takes the last (highest) bracket.
/// Returns `None` when there is no bracket rule or it has no brackets.
pub fn resolve_bracket<'a>(
    rules: &ActiveRules<'a>,
    amount: Decimal,
) -> Option<BracketMatch<'a>> {
    let rule = rules.of_type(RuleType::Bracket).next()?;

    let mut brackets: Vec<&TaxBracket> = rule.brackets().iter().collect();
    brackets.sort_by(|a, b| {
        a.min_amount
            .cmp(&b.min_amount)
            .then_with(|| a.bracket_order.cmp(&b.bracket_order))
    });

    if let Some(bracket) = brackets.iter().copied().find(|b| b.contains(amount)) {
        return Some(BracketMatch {
            rule,
            bracket,
            fallback: false,
        });
    }

    brackets.last().copied().map(|bracket| BracketMatch {
        rule,
        bracket,
        fallback: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Region, RuleConfig, TaxRuleBuilder};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn progressive() -> TaxRule {
        // Deliberately out of order.
        TaxRuleBuilder::new("org", "Progressive", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(1000.01), Some(dec!(5000)), dec!(10)))
            .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), dec!(5)))
            .bracket(TaxBracket::new(dec!(5000.01), Some(dec!(20000)), dec!(15)))
            .build()
            .unwrap()
    }

    fn resolve(rules: &[TaxRule], amount: Decimal) -> Option<(Decimal, bool)> {
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let active = ActiveRules::select(rules, date, Region::Uae);
        resolve_bracket(&active, amount).map(|m| (m.rate(), m.fallback))
    }

    #[test]
    fn picks_containing_bracket() {
        let rules = [progressive()];
        assert_eq!(resolve(&rules, dec!(0)), Some((dec!(5), false)));
        assert_eq!(resolve(&rules, dec!(1000)), Some((dec!(5), false)));
        assert_eq!(resolve(&rules, dec!(2500)), Some((dec!(10), false)));
        assert_eq!(resolve(&rules, dec!(20000)), Some((dec!(15), false)));
    }

    #[test]
    fn above_all_brackets_uses_highest() {
        let rules = [progressive()];
        assert_eq!(resolve(&rules, dec!(50000)), Some((dec!(15), true)));
    }

    #[test]
    fn gap_between_brackets_uses_highest() {
        let rules = [progressive()];
        assert_eq!(resolve(&rules, dec!(1000.005)), Some((dec!(15), true)));
    }

    #[test]
    fn overlap_takes_lower_range() {
        let rule = TaxRuleBuilder::new("org", "Overlap", RuleConfig::brackets())
            .bracket(TaxBracket::new(dec!(500), Some(dec!(2000)), dec!(12)))
            .bracket(TaxBracket::new(dec!(0), Some(dec!(1000)), dec!(8)))
            .build()
            .unwrap();
        assert_eq!(resolve(&[rule], dec!(750)), Some((dec!(8), false)));
    }

    #[test]
    fn only_highest_priority_rule_is_consulted() {
        let low = TaxRuleBuilder::new("org", "Low", RuleConfig::brackets())
            .priority(1)
            .bracket(TaxBracket::new(dec!(0), None, dec!(3)))
            .build()
            .unwrap();
        let high = TaxRuleBuilder::new("org", "High", RuleConfig::brackets())
            .priority(2)
            .bracket(TaxBracket::new(dec!(0), None, dec!(7)))
            .build()
            .unwrap();
        assert_eq!(resolve(&[low, high], dec!(100)), Some((dec!(7), false)));
    }

    #[test]
    fn empty_bracket_rule_yields_none() {
        let rule = TaxRuleBuilder::new("org", "Empty", RuleConfig::brackets())
            .build()
            .unwrap();
        assert_eq!(resolve(&[rule], dec!(100)), None);
        assert_eq!(resolve(&[], dec!(100)), None);
    }

    #[test]
    fn trace_format() {
        let rules = [progressive()];
        let date = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let active = ActiveRules::select(&rules, date, Region::Uae);
        let hit = resolve_bracket(&active, dec!(500)).unwrap();
        assert_eq!(hit.describe(), "Tax bracket: 5% (0–1000)");
        let top = resolve_bracket(&active, dec!(99999)).unwrap();
        assert_eq!(top.describe(), "Tax bracket: 15% (highest rate)");
    }
}

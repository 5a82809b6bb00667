use super::ActiveRules;
use crate::core::{CategoryTaxRule, RuleType, TaxRule};

/// Find the category rate for a request's category.
///
/// Only active category rates owned by active category rules are
/// considered. A match by category id is preferred over a match by name;
/// among several matches the owner with the highest priority wins, then
/// the most recently created category rate.
pub fn resolve_category_rate<'a>(
    rules: &ActiveRules<'a>,
    category_id: Option<&str>,
    category_name: Option<&str>,
) -> Option<(&'a TaxRule, &'a CategoryTaxRule)> {
    if let Some(id) = category_id {
        let by_id = best_match(rules, |c| c.category_id == id);
        if by_id.is_some() {
            return by_id;
        }
    }
    let name = category_name?;
    best_match(rules, |c| c.category_name.as_deref() == Some(name))
}

fn best_match<'a>(
    rules: &ActiveRules<'a>,
    predicate: impl Fn(&CategoryTaxRule) -> bool,
) -> Option<(&'a TaxRule, &'a CategoryTaxRule)> {
    rules
        .of_type(RuleType::Category)
        .flat_map(|rule| rule.category_rules().iter().map(move |c| (rule, c)))
        .filter(|(_, c)| c.is_active && predicate(c))
        .max_by(|(ra, ca), (rb, cb)| {
            ra.priority
                .cmp(&rb.priority)
                .then_with(|| ca.created_at.cmp(&cb.created_at))
                .then_with(|| ra.created_at.cmp(&rb.created_at))
        })
}

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Must not panic; rejected records are fine.
    if let Ok(rule) = serde_json::from_slice::<taxrule::TaxRule>(data) {
        let _ = taxrule::validate_rule(&rule);
        let store = taxrule::store::InMemoryRuleStore::new();
        let _ = store.create_rule(rule);
    }
});

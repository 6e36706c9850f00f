//! Tri-state query-scoping fold over one resource's rules

use crate::types::{FilterDecision, FilterResult, PermissionRule};

/// Fold rules into a filter decision
///
/// Starts from the default decision and folds each rule in arrival order. A
/// wildcard allow ends the fold as `Allowed`; a first scoped rule fixes whether
/// the value set is an allow-list or a deny-list.
pub fn fold(rules: &[PermissionRule], default_permission: bool) -> FilterDecision {
    let mut decision = FilterDecision::default_for(default_permission);
    let mut result_set = false;

    for rule in rules {
        match (rule.allowed, rule.scoped_value()) {
            (true, Some(value)) => {
                if !result_set {
                    decision = FilterDecision::only([value]);
                    result_set = true;
                } else if decision.result == FilterResult::PartlyAllowed {
                    if decision.include {
                        decision.values.insert(value.to_string());
                    } else {
                        // an allow punches a hole in the exclude set
                        decision.values.remove(value);
                    }
                } else if decision.result == FilterResult::Disallowed {
                    decision = FilterDecision::only([value]);
                }
            }
            (true, None) => return FilterDecision::allowed(),
            (false, Some(value)) => {
                if !result_set {
                    decision = FilterDecision::except([value]);
                    result_set = true;
                } else if decision.result == FilterResult::PartlyAllowed && !decision.include {
                    decision.values.insert(value.to_string());
                }
            }
            (false, None) => {
                if decision.result == FilterResult::Allowed {
                    decision.result = FilterResult::Disallowed;
                }
            }
        }
    }

    decision
}

//! Scoped boolean check over one resource's rules

use super::polarity::Polarity;
use crate::types::PermissionRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unknown,
    Allowed,
    Denied,
}

/// Decide whether the rules permit acting on `context_values`
///
/// No rules at all yield `default_permission`. An empty `context_values` asks
/// about the resource as a whole: any allow rule grants it, otherwise
/// `default_permission` applies. Rules are consumed in the
/// order given; the first rule to mark a value decides it.
pub fn evaluate(rules: &[PermissionRule], context_values: &[String], default_permission: bool) -> bool {
    if rules.is_empty() {
        return default_permission;
    }

    let mut pending: Vec<(&str, Mark)> = context_values
        .iter()
        .map(|v| (v.as_str(), Mark::Unknown))
        .collect();

    let mut any_allowed_match = false;
    let mut any_denied_match = false;
    let mut wildcard_allow_exists = false;
    let mut wildcard_deny_exists = false;
    let mut polarity = Polarity::Unset;

    for rule in rules {
        polarity = polarity.next(rule.allowed);

        if rule.allowed && pending.is_empty() {
            return true;
        }

        match rule.scoped_value() {
            Some(value) => {
                let mark = if rule.allowed { Mark::Allowed } else { Mark::Denied };
                let mut matched = false;
                for entry in pending.iter_mut() {
                    if entry.0 == value && entry.1 == Mark::Unknown {
                        entry.1 = mark;
                        matched = true;
                    }
                }
                if matched {
                    if rule.allowed {
                        any_allowed_match = true;
                    } else {
                        any_denied_match = true;
                    }
                }
            }
            None if rule.allowed => wildcard_allow_exists = true,
            None => wildcard_deny_exists = true,
        }
    }

    if pending.is_empty() {
        return default_permission;
    }

    if wildcard_allow_exists || any_allowed_match {
        true
    } else if any_denied_match {
        false
    } else if polarity == Polarity::AllAllow {
        // exhaustive allow-list with no hit
        false
    } else {
        !(polarity == Polarity::AllDeny && wildcard_deny_exists)
    }
}

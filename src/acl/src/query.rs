//! Applying filter decisions to downstream queries

use crate::error::{AclError, Result};
use crate::types::{FilterDecision, FilterResult, ValueSet};
use serde::{Deserialize, Serialize};

/// A query that can be narrowed by a value set on one field
pub trait QueryScope {
    /// Keep only rows whose `field` is in `values`
    fn restrict_to_set(&mut self, field: &str, values: &ValueSet);

    /// Drop rows whose `field` is in `values`
    fn exclude_set(&mut self, field: &str, values: &ValueSet);
}

/// What `apply_filter` did to the query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOutcome {
    /// Query left as is
    Unrestricted,
    /// One include or exclude restriction was added
    Restricted,
    /// Nothing may be returned; the query must not be executed
    Rejected,
}

impl FilterOutcome {
    /// Whether the caller may execute the query
    pub fn may_execute(self) -> bool {
        !matches!(self, FilterOutcome::Rejected)
    }
}

/// Translate a filter decision into at most one restriction on `query`
pub fn apply_filter<Q>(decision: &FilterDecision, field: &str, query: &mut Q) -> Result<FilterOutcome>
where
    Q: QueryScope + ?Sized,
{
    if field.is_empty() {
        return Err(AclError::InvalidInput("Filter field name cannot be empty".to_string()));
    }

    Ok(match decision.result {
        FilterResult::Allowed => FilterOutcome::Unrestricted,
        FilterResult::Disallowed => FilterOutcome::Rejected,
        FilterResult::PartlyAllowed => {
            if decision.include {
                query.restrict_to_set(field, &decision.values);
            } else {
                query.exclude_set(field, &decision.values);
            }
            FilterOutcome::Restricted
        }
    })
}

/// Field predicate recorded by `PredicateSet`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    In { field: String, values: ValueSet },
    NotIn { field: String, values: ValueSet },
}

/// Query scope that collects predicates for a caller-side query builder
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredicateSet {
    predicates: Vec<Predicate>,
}

impl PredicateSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

impl QueryScope for PredicateSet {
    fn restrict_to_set(&mut self, field: &str, values: &ValueSet) {
        self.predicates.push(Predicate::In {
            field: field.to_string(),
            values: values.clone(),
        });
    }

    fn exclude_set(&mut self, field: &str, values: &ValueSet) {
        self.predicates.push(Predicate::NotIn {
            field: field.to_string(),
            values: values.clone(),
        });
    }
}

//! Running polarity classification of a rule list

/// Polarity of the rules seen so far
///
/// `Mixed` is absorbing: once both polarities have been seen the
/// classification never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    Unset,
    AllAllow,
    AllDeny,
    Mixed,
}

impl Polarity {
    /// Transition on one more rule
    pub fn next(self, rule_allows: bool) -> Self {
        match (self, rule_allows) {
            (Polarity::Unset, true) => Polarity::AllAllow,
            (Polarity::Unset, false) => Polarity::AllDeny,
            (Polarity::AllAllow, true) => Polarity::AllAllow,
            (Polarity::AllDeny, false) => Polarity::AllDeny,
            _ => Polarity::Mixed,
        }
    }
}

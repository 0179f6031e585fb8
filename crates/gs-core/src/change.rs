//! Change codes returned by discrete actions.
//!
//! Every event execution and queue pass reports the most severe change it
//! caused. Codes form a total order so stages can be folded with `max`:
//! a pass that only tweaked a parameter reports `ParameterChange`, while one
//! that altered the Jacobian sparsity pattern reports `JacobianChange` and
//! forces the solver to rebuild its matrix structure.

/// Severity-ordered result of a discrete state change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ChangeCode {
    /// The action was examined but its trigger condition was not met.
    NotTriggered,
    /// Nothing changed.
    NoChange,
    /// Something changed that does not affect solver state (e.g. bookkeeping).
    NonStateChange,
    /// A model parameter changed value.
    ParameterChange,
    /// The Jacobian pattern or coupling structure changed.
    JacobianChange,
    /// An object was added, removed, or re-targeted.
    ObjectChange,
    /// The number of states changed; state vectors must be reallocated.
    StateCountChange,
    /// The action ran but failed to apply.
    ExecutionFailure,
}

impl ChangeCode {
    /// Fold two codes keeping the more severe one.
    pub fn fold(self, other: ChangeCode) -> ChangeCode {
        self.max(other)
    }
}

impl Default for ChangeCode {
    fn default() -> Self {
        ChangeCode::NoChange
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_order() {
        assert!(ChangeCode::NotTriggered < ChangeCode::NoChange);
        assert!(ChangeCode::NoChange < ChangeCode::ParameterChange);
        assert!(ChangeCode::ParameterChange < ChangeCode::JacobianChange);
        assert!(ChangeCode::JacobianChange < ChangeCode::StateCountChange);
        assert!(ChangeCode::StateCountChange < ChangeCode::ExecutionFailure);
    }

    #[test]
    fn fold_keeps_max() {
        let folded = ChangeCode::NoChange
            .fold(ChangeCode::ParameterChange)
            .fold(ChangeCode::NotTriggered);
        assert_eq!(folded, ChangeCode::ParameterChange);
    }
}

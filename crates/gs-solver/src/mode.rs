//! Solver mode: which subset of states a backend integrates.

/// Classification of the equation system a backend sees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ModeKind {
    /// Purely algebraic system (power flow style), no derivative vector.
    #[default]
    Algebraic,
    /// Differential states only.
    Differential,
    /// Mixed differential-algebraic system with a constraint/type vector.
    Dae,
}

/// Configuration selecting the active state subset and its equation offset
/// within the global numbering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SolverMode {
    pub kind: ModeKind,
    /// Offset of this mode's first equation in the global row space,
    /// recorded alongside Jacobian captures.
    pub offset_index: usize,
}

impl SolverMode {
    pub fn algebraic() -> Self {
        Self {
            kind: ModeKind::Algebraic,
            offset_index: 0,
        }
    }

    pub fn differential() -> Self {
        Self {
            kind: ModeKind::Differential,
            offset_index: 0,
        }
    }

    pub fn dae() -> Self {
        Self {
            kind: ModeKind::Dae,
            offset_index: 0,
        }
    }

    /// Does this mode carry a state derivative vector?
    pub fn has_differential(&self) -> bool {
        matches!(self.kind, ModeKind::Differential | ModeKind::Dae)
    }

    /// Does this mode carry a constraint/type vector?
    pub fn is_dae(&self) -> bool {
        matches!(self.kind, ModeKind::Dae)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates() {
        assert!(!SolverMode::algebraic().has_differential());
        assert!(SolverMode::differential().has_differential());
        assert!(!SolverMode::differential().is_dae());
        assert!(SolverMode::dae().has_differential());
        assert!(SolverMode::dae().is_dae());
    }
}

use serde::{Deserialize, Serialize};

/// Result of scoring one combined modifier vector.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Score {
    pub value: f64,
    /// A hard constraint is not met.
    pub failed: bool,
    /// The overall `max` was reached; nothing can do better.
    pub exceeded: bool,
}

impl Score {
    pub fn failed(value: f64) -> Self {
        Self {
            value,
            failed: true,
            exceeded: false,
        }
    }
}

/// How an item's flags relate to the requested boolean modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Carries a requested flag with the wrong polarity.
    Violates,
    Irrelevant,
    /// Supplies a flag the expression asks for.
    Meets,
}

/// Where a `min`/`max` keyword applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundKind {
    Min,
    Max,
}

/// Row state definitions for tracking enrichment progress
///
/// This module defines every state a record passes through during a run.
use std::fmt;

/// Represents the state of a record in a run
///
/// ```text
/// NoContext   ─┐
/// Precomputed ─┤
/// Cached      ─┼─> Written
/// Queried     ─┤
/// Degraded    ─┘
///
/// Skipped                     (already on disk)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    // ===== Resolved States =====
    /// Blank context; output columns left empty without a model call
    NoContext,

    /// Decided from the record alone, without a model call
    Precomputed,

    /// Same context seen earlier in this run; the earlier result is reused
    Cached,

    /// Fresh model call answered and classified
    Queried,

    /// Model call failed; output columns left empty
    Degraded,

    // ===== Terminal States =====
    /// Persisted by a previous run
    Skipped,

    /// Handed to the output sink
    Written,
}

impl RowState {
    /// Returns true if the record's output values are known but not yet written
    pub fn is_resolved(&self) -> bool {
        matches!(
            self,
            Self::NoContext | Self::Precomputed | Self::Cached | Self::Queried | Self::Degraded
        )
    }

    /// Returns true if reaching this state cost a model call
    pub fn made_api_call(&self) -> bool {
        matches!(self, Self::Queried | Self::Degraded)
    }

    /// Returns true if the transition is allowed
    pub fn can_transition_to(&self, next: RowState) -> bool {
        self.is_resolved() && next == Self::Written
    }

    /// Short lowercase name, used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoContext => "no_context",
            Self::Precomputed => "precomputed",
            Self::Cached => "cached",
            Self::Queried => "queried",
            Self::Degraded => "degraded",
            Self::Skipped => "skipped",
            Self::Written => "written",
        }
    }

    /// Returns all possible row states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::NoContext,
            Self::Precomputed,
            Self::Cached,
            Self::Queried,
            Self::Degraded,
            Self::Skipped,
            Self::Written,
        ]
    }
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Fail-open results for calls to the completion service.

/// Value produced by a call that is allowed to degrade instead of failing.
///
/// Classification and recommendation never surface errors to the turn; they
/// return a fallback value instead. `Degraded` keeps the fallback apart from a
/// genuine answer so callers and tests can tell the two cases apart.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The service answered and the answer parsed.
    Fresh(T),
    /// The call failed; `value` is the fallback.
    Degraded {
        /// Fallback value.
        value: T,
        /// Why the call degraded.
        reason: String,
    },
}

impl<T> Outcome<T> {
    /// Wrap a fallback value with the error that caused it.
    pub fn degraded(value: T, reason: impl ToString) -> Self {
        Self::Degraded {
            value,
            reason: reason.to_string(),
        }
    }

    /// Borrow the carried value.
    pub fn value(&self) -> &T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Take the carried value.
    pub fn into_value(self) -> T {
        match self {
            Self::Fresh(value) | Self::Degraded { value, .. } => value,
        }
    }

    /// Whether this is a fallback.
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    /// Degradation reason, if any.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Fresh(_) => None,
            Self::Degraded { reason, .. } => Some(reason),
        }
    }
}

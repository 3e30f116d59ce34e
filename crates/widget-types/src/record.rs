//! Code records produced by registry resolution.

/// The result of resolving a widget reference through the code registry.
///
/// `Pending` (registry still loading) and `NotFound` (registry reports no
/// record) are distinct observable states: only the latter produces an error
/// report and a fallback output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeRecord {
    /// Resolution is in flight; not an error.
    Pending,
    /// The registry has no record for this reference.
    NotFound,
    /// Resolved code text.
    Code(String),
}

impl CodeRecord {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Code(code) => Some(code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_and_not_found_are_distinct() {
        assert_ne!(CodeRecord::Pending, CodeRecord::NotFound);
        assert!(!CodeRecord::Pending.is_resolved());
        assert!(!CodeRecord::NotFound.is_resolved());
        assert_eq!(CodeRecord::Code("return 1".into()).code(), Some("return 1"));
    }
}

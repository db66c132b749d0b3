/// Outcome of reconciling the algorithm's suggestion with an operator count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalCount {
    /// Count produced by the detector.
    pub suggested: u32,
    /// Count accepted for downstream use.
    pub accepted: u32,
    /// Set when the operator overrode the suggestion with a different value.
    pub mismatch: bool,
}

/// Reconcile the suggested count with an optional operator correction.
/// The manual value always wins; a missing one accepts the suggestion.
pub fn reconcile(suggested: u32, manual: Option<u32>) -> FinalCount {
    let accepted = manual.unwrap_or(suggested);
    FinalCount {
        suggested,
        accepted,
        mismatch: accepted != suggested,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manual_accepts_suggestion() {
        let outcome = reconcile(12, None);
        assert_eq!(outcome.accepted, 12);
        assert!(!outcome.mismatch);
    }

    #[test]
    fn matching_manual_is_not_a_mismatch() {
        let outcome = reconcile(12, Some(12));
        assert_eq!(outcome.accepted, 12);
        assert!(!outcome.mismatch);
    }

    #[test]
    fn differing_manual_wins_and_flags() {
        let outcome = reconcile(12, Some(15));
        assert_eq!(outcome.accepted, 15);
        assert_eq!(outcome.suggested, 12);
        assert!(outcome.mismatch);
    }
}

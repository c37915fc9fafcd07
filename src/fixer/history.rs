//! Per-position fix bookkeeping.
//!
//! Two maps live here with different lifetimes:
//!
//! - `fixed` remembers the content a position held before its direct fix.
//!   It blocks a second direct fix of the same position and lets that fix be
//!   reverted. It is cleared whenever the store is reloaded.
//! - `old_values` tracks the last two contents requested for a position and
//!   the pass that requested the latest one. It survives reloads for the
//!   whole session and is what detects two sniffs bouncing a token back and
//!   forth across passes.

use std::collections::HashMap;

/// Oscillation record for one token position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OldValue {
    /// Content the token held before the most recent fix.
    pub previous: String,
    /// Content requested by the most recent fix.
    pub recent: String,
    /// Pass in which the most recent fix happened.
    pub pass: usize,
}

/// Outcome of consulting the oscillation record before a direct fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCheck {
    /// First fix of this position in the session.
    FirstFix,
    /// Position was fixed before; the new request is not a bounce-back.
    Updated,
    /// The request would restore the content from before last pass's fix.
    Conflict,
}

#[derive(Debug, Clone, Default)]
pub struct FixHistory {
    fixed: HashMap<usize, String>,
    old_values: HashMap<usize, OldValue>,
}

impl FixHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_fixed(&self, pos: usize) -> bool {
        self.fixed.contains_key(&pos)
    }

    /// Record that `pos` was directly fixed and held `before` until now.
    pub fn mark_fixed(&mut self, pos: usize, before: String) {
        self.fixed.insert(pos, before);
    }

    /// Forget the direct fix at `pos`, returning the content to restore.
    pub fn take_fixed(&mut self, pos: usize) -> Option<String> {
        self.fixed.remove(&pos)
    }

    pub fn fixed_count(&self) -> usize {
        self.fixed.len()
    }

    /// Drop the direct-fix markers. Oscillation records are kept.
    pub fn clear_fixed(&mut self) {
        self.fixed.clear();
    }

    pub fn old_value(&self, pos: usize) -> Option<&OldValue> {
        self.old_values.get(&pos)
    }

    /// Check `content` against the oscillation record for `pos` and update
    /// the record unless a conflict is found.
    ///
    /// `current` is the token's committed content before this fix and `pass`
    /// the pass requesting it.
    pub fn check_and_record(
        &mut self,
        pos: usize,
        current: &str,
        content: &str,
        pass: usize,
    ) -> HistoryCheck {
        let Some(record) = self.old_values.get_mut(&pos) else {
            self.old_values.insert(
                pos,
                OldValue {
                    previous: current.to_string(),
                    recent: content.to_string(),
                    pass,
                },
            );
            return HistoryCheck::FirstFix;
        };

        if record.previous == content && pass.checked_sub(1) == Some(record.pass) {
            return HistoryCheck::Conflict;
        }

        record.previous = std::mem::replace(&mut record.recent, content.to_string());
        record.pass = pass;
        HistoryCheck::Updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fix_creates_record() {
        let mut h = FixHistory::new();
        assert_eq!(h.check_and_record(5, "a", "b", 1), HistoryCheck::FirstFix);
        let rec = h.old_value(5).unwrap();
        assert_eq!(rec.previous, "a");
        assert_eq!(rec.recent, "b");
        assert_eq!(rec.pass, 1);
    }

    #[test]
    fn test_bounce_back_next_pass_is_conflict() {
        let mut h = FixHistory::new();
        h.check_and_record(5, "a", "b", 1);
        assert_eq!(h.check_and_record(5, "b", "a", 2), HistoryCheck::Conflict);
        // Record untouched by a conflict.
        assert_eq!(h.old_value(5).unwrap().pass, 1);
    }

    #[test]
    fn test_bounce_back_two_passes_later_is_allowed() {
        let mut h = FixHistory::new();
        h.check_and_record(5, "a", "b", 1);
        assert_eq!(h.check_and_record(5, "b", "a", 3), HistoryCheck::Updated);
        let rec = h.old_value(5).unwrap();
        assert_eq!(rec.previous, "b");
        assert_eq!(rec.recent, "a");
        assert_eq!(rec.pass, 3);
    }

    #[test]
    fn test_different_content_next_pass_shifts_record() {
        let mut h = FixHistory::new();
        h.check_and_record(2, "x", "y", 1);
        assert_eq!(h.check_and_record(2, "y", "z", 2), HistoryCheck::Updated);
        let rec = h.old_value(2).unwrap();
        assert_eq!(rec.previous, "y");
        assert_eq!(rec.recent, "z");
    }

    #[test]
    fn test_same_pass_bounce_is_not_conflict() {
        let mut h = FixHistory::new();
        h.check_and_record(0, "a", "b", 4);
        assert_eq!(h.check_and_record(0, "b", "a", 4), HistoryCheck::Updated);
    }

    #[test]
    fn test_clear_fixed_keeps_old_values() {
        let mut h = FixHistory::new();
        h.mark_fixed(1, "old".into());
        h.check_and_record(1, "old", "new", 1);
        h.clear_fixed();
        assert!(!h.is_fixed(1));
        assert!(h.old_value(1).is_some());
    }

    #[test]
    fn test_take_fixed() {
        let mut h = FixHistory::new();
        h.mark_fixed(3, "before".into());
        assert_eq!(h.fixed_count(), 1);
        assert_eq!(h.take_fixed(3).as_deref(), Some("before"));
        assert!(h.take_fixed(3).is_none());
    }
}

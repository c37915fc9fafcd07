//! The fix session: token store, direct edits, and changesets.
//!
//! A [`Fixer`] owns everything one file's fix session needs. Sniffs never see
//! the fixer directly; they receive a [`TokenEditor`](crate::editor::TokenEditor)
//! that attributes every edit to the sniff that requested it.
//!
//! # Edit rules
//!
//! - While a conflict is active, every edit is rejected until the next pass.
//! - While a changeset is open, edits are buffered, not applied.
//! - A position may be directly fixed at most once per loaded token array.
//! - An edit that would restore a token to the content it held right before
//!   the previous pass's fix raises a conflict instead of applying.

pub mod changeset;
pub mod history;
pub mod store;

pub use changeset::Changeset;
pub use history::{FixHistory, HistoryCheck, OldValue};
pub use store::TokenStore;

use crate::editor::TokenEditor;

/// Hard ceiling on passes for a single session.
pub const MAX_PASSES: usize = 50;

/// Attribution used for edits made through the fixer itself rather than an editor.
pub(crate) const HOST_SOURCE: &str = "host";

#[derive(Debug, Clone)]
pub struct Fixer {
    store: TokenStore,
    original: String,
    history: FixHistory,
    changeset: Option<Changeset>,
    in_conflict: bool,
    pub(crate) pass: usize,
    pub(crate) max_passes: usize,
    line_terminator: String,
}

impl Fixer {
    /// Start a fix session from the host's current token contents.
    pub fn new(tokens: Vec<String>) -> Self {
        let store = TokenStore::new(tokens);
        let original = store.contents();
        let line_terminator = detect_line_terminator(&original).to_string();
        Self {
            store,
            original,
            history: FixHistory::new(),
            changeset: None,
            in_conflict: false,
            pass: 0,
            max_passes: MAX_PASSES,
            line_terminator,
        }
    }

    /// Override the terminator used by the newline helpers.
    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = terminator.into();
        self
    }

    /// Lower the pass cap. Values above [`MAX_PASSES`] are clamped.
    pub fn with_max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes.min(MAX_PASSES);
        self
    }

    /// Reload the store from a freshly tokenized array.
    ///
    /// Resets the direct-fix markers (and with them the fix count) but keeps
    /// the oscillation records, the pass counter, and the conflict flag.
    pub fn load_tokens(&mut self, tokens: Vec<String>) {
        if self.changeset.take().is_some() {
            log::warn!("discarding open changeset on token reload");
        }
        self.store = TokenStore::new(tokens);
        self.history.clear_fixed();
    }

    /// The file as it currently stands.
    pub fn contents(&self) -> String {
        self.store.contents()
    }

    /// The text the session started from.
    pub fn original_contents(&self) -> &str {
        &self.original
    }

    /// Number of direct edits currently applied since the last reload.
    pub fn fix_count(&self) -> usize {
        self.history.fixed_count()
    }

    pub fn token_count(&self) -> usize {
        self.store.len()
    }

    /// Pass currently running (or the last one run); 0 before the first pass.
    pub fn pass(&self) -> usize {
        self.pass
    }

    pub fn max_passes(&self) -> usize {
        self.max_passes
    }

    pub fn in_conflict(&self) -> bool {
        self.in_conflict
    }

    pub fn in_changeset(&self) -> bool {
        self.changeset.is_some()
    }

    pub fn line_terminator(&self) -> &str {
        &self.line_terminator
    }

    pub fn history(&self) -> &FixHistory {
        &self.history
    }

    /// Committed token contents, ignoring any open changeset.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.store.iter()
    }

    /// Committed content of `pos`, ignoring any open changeset.
    pub fn committed_token(&self, pos: usize) -> Option<&str> {
        self.store.get(pos)
    }

    /// Content of `pos`, seeing pending changeset edits first.
    pub fn token_content(&self, pos: usize) -> Option<&str> {
        if let Some(pending) = self.changeset.as_ref().and_then(|cs| cs.get(pos)) {
            return Some(pending);
        }
        self.store.get(pos)
    }

    /// Borrow an editor that attributes its edits to `source`.
    pub fn editor<'a>(&'a mut self, source: &'a str) -> TokenEditor<'a> {
        TokenEditor::new(self, source)
    }

    /// Forget everything a previous session on this fixer recorded.
    ///
    /// The store and the original text are kept, so a diff still covers
    /// every session run on this fixer.
    pub(crate) fn start_session(&mut self) {
        if self.changeset.take().is_some() {
            log::warn!("discarding open changeset at session start");
        }
        self.history = FixHistory::new();
        self.in_conflict = false;
        self.pass = 0;
    }

    pub(crate) fn start_pass(&mut self) {
        self.in_conflict = false;
    }

    /// Set the token at `pos`, or buffer the edit while a changeset is open.
    ///
    /// Returns `false` when the edit is rejected: a conflict is active, the
    /// token was already fixed this pass, the position is out of range, or
    /// the edit would undo last pass's fix (which raises the conflict).
    pub fn replace_token(&mut self, pos: usize, content: impl Into<String>) -> bool {
        self.replace_token_as(HOST_SOURCE, pos, content.into())
    }

    /// Undo this pass's direct fix at `pos`. `false` if there was none.
    pub fn revert_token(&mut self, pos: usize) -> bool {
        self.revert_token_as(HOST_SOURCE, pos)
    }

    /// Open a changeset. Refused during a conflict or when one is already open.
    pub fn begin_changeset(&mut self) -> bool {
        self.begin_changeset_as(HOST_SOURCE)
    }

    /// Commit the open changeset. Returns whether every buffered edit landed.
    pub fn end_changeset(&mut self) -> bool {
        self.end_changeset_as(HOST_SOURCE)
    }

    /// Drop the open changeset unapplied and clear the conflict flag.
    pub fn rollback_changeset(&mut self) {
        self.rollback_changeset_as(HOST_SOURCE)
    }

    pub(crate) fn replace_token_as(&mut self, source: &str, pos: usize, content: String) -> bool {
        if self.in_conflict {
            log::debug!("[{source}] token {pos}: rejected, conflict active this pass");
            return false;
        }

        if let Some(changeset) = self.changeset.as_mut() {
            log::trace!("[{source}] token {pos}: buffered {content:?}");
            changeset.insert(pos, content);
            return true;
        }

        self.apply_direct(source, pos, content)
    }

    /// The non-deferred edit path shared by direct edits and changeset replay.
    fn apply_direct(&mut self, source: &str, pos: usize, content: String) -> bool {
        let Some(current) = self.store.get(pos) else {
            log::warn!(
                "[{source}] token {pos}: out of range ({} tokens)",
                self.store.len()
            );
            return false;
        };

        if self.history.is_fixed(pos) {
            log::debug!("[{source}] token {pos}: already modified, skipping");
            return false;
        }

        if self.history.check_and_record(pos, current, &content, self.pass)
            == HistoryCheck::Conflict
        {
            log::debug!(
                "[{source}] token {pos}: conflict, {content:?} would undo the fix from pass {}",
                self.pass.saturating_sub(1)
            );
            self.in_conflict = true;
            return false;
        }

        let Some(before) = self.store.set(pos, content) else {
            return false;
        };
        log::debug!(
            "[{source}] token {pos}: {before:?} => {:?}",
            self.store.get(pos).unwrap_or_default()
        );
        self.history.mark_fixed(pos, before);
        true
    }

    pub(crate) fn revert_token_as(&mut self, source: &str, pos: usize) -> bool {
        let Some(before) = self.history.take_fixed(pos) else {
            return false;
        };
        log::debug!("[{source}] token {pos}: reverted to {before:?}");
        self.store.set(pos, before);
        true
    }

    pub(crate) fn begin_changeset_as(&mut self, source: &str) -> bool {
        if self.in_conflict {
            return false;
        }
        if self.changeset.is_some() {
            log::warn!("[{source}] changeset already open, nested changesets are not supported");
            return false;
        }
        log::debug!("[{source}] changeset started");
        self.changeset = Some(Changeset::new());
        true
    }

    pub(crate) fn end_changeset_as(&mut self, source: &str) -> bool {
        let Some(changeset) = self.changeset.take() else {
            log::warn!("[{source}] end_changeset called without an open changeset");
            return false;
        };
        if self.in_conflict {
            log::debug!("[{source}] changeset discarded, conflict active this pass");
            return false;
        }

        let total = changeset.len();
        let mut applied = Vec::with_capacity(total);
        let mut committed = true;
        for (pos, content) in changeset.into_entries() {
            if !self.apply_direct(source, pos, content) {
                committed = false;
                break;
            }
            applied.push(pos);
        }

        if committed {
            log::debug!("[{source}] changeset ended: {total} changes applied");
        } else {
            for pos in applied {
                self.revert_token_as(source, pos);
            }
            log::debug!("[{source}] changeset failed to apply, rolled back");
        }
        committed
    }

    pub(crate) fn rollback_changeset_as(&mut self, source: &str) {
        self.in_conflict = false;
        if let Some(changeset) = self.changeset.take() {
            if !changeset.is_empty() {
                log::debug!("[{source}] changeset rolled back");
            }
        }
    }
}

/// Pick the line terminator a text uses, defaulting to `\n`.
pub fn detect_line_terminator(text: &str) -> &'static str {
    if text.contains("\r\n") {
        "\r\n"
    } else if text.contains('\r') {
        "\r"
    } else {
        "\n"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixer(parts: &[&str]) -> Fixer {
        Fixer::new(parts.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_replace_and_contents() {
        let mut f = fixer(&["foo", " ", "bar"]);
        assert!(f.replace_token(1, ""));
        assert_eq!(f.contents(), "foobar");
        assert_eq!(f.fix_count(), 1);
        assert_eq!(f.original_contents(), "foo bar");
    }

    #[test]
    fn test_second_direct_fix_rejected() {
        let mut f = fixer(&["a", "b"]);
        assert!(f.replace_token(0, "x"));
        assert!(!f.replace_token(0, "y"));
        assert_eq!(f.contents(), "xb");
        assert_eq!(f.fix_count(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let mut f = fixer(&["a"]);
        assert!(!f.replace_token(7, "x"));
        assert_eq!(f.fix_count(), 0);
        assert!(f.token_content(7).is_none());
    }

    #[test]
    fn test_revert_token() {
        let mut f = fixer(&["a", "b"]);
        assert!(!f.revert_token(0));
        f.replace_token(0, "x");
        assert!(f.revert_token(0));
        assert_eq!(f.contents(), "ab");
        assert_eq!(f.fix_count(), 0);
    }

    #[test]
    fn test_changeset_read_your_writes() {
        let mut f = fixer(&["a", "b"]);
        assert!(f.begin_changeset());
        assert!(f.replace_token(1, "c"));
        assert_eq!(f.token_content(1), Some("c"));
        assert_eq!(f.contents(), "ab");
        assert!(f.end_changeset());
        assert_eq!(f.contents(), "ac");
        assert_eq!(f.token_content(1), Some("c"));
    }

    #[test]
    fn test_changeset_atomic_on_failure() {
        let mut f = fixer(&["a", "b", "c"]);
        f.replace_token(2, "C");
        let before = f.contents();
        assert!(f.begin_changeset());
        f.replace_token(0, "X");
        f.replace_token(2, "Z");
        assert!(!f.end_changeset());
        assert_eq!(f.contents(), before);
        assert_eq!(f.fix_count(), 1);
    }

    #[test]
    fn test_nested_changeset_rejected() {
        let mut f = fixer(&["a"]);
        assert!(f.begin_changeset());
        assert!(!f.begin_changeset());
        assert!(f.in_changeset());
    }

    #[test]
    fn test_end_without_begin() {
        let mut f = fixer(&["a"]);
        assert!(!f.end_changeset());
    }

    #[test]
    fn test_rollback_discards_and_clears_conflict() {
        let mut f = fixer(&["a", "b"]);
        f.begin_changeset();
        f.replace_token(0, "x");
        f.in_conflict = true;
        f.rollback_changeset();
        assert!(!f.in_changeset());
        assert!(!f.in_conflict());
        assert_eq!(f.contents(), "ab");
    }

    #[test]
    fn test_conflict_blocks_everything() {
        let mut f = fixer(&["a", "b"]);
        f.pass = 1;
        assert!(f.replace_token(0, "b"));
        f.load_tokens(vec!["b".into(), "b".into()]);
        f.pass = 2;
        assert!(!f.replace_token(0, "a"));
        assert!(f.in_conflict());
        assert!(!f.replace_token(1, "z"));
        assert!(!f.begin_changeset());
        f.start_pass();
        assert!(!f.in_conflict());
    }

    #[test]
    fn test_end_changeset_discards_buffer_under_conflict() {
        let mut f = fixer(&["a", "b"]);
        assert!(f.begin_changeset());
        assert!(f.replace_token(0, "x"));
        assert!(f.replace_token(1, "y"));
        f.in_conflict = true;
        assert!(!f.end_changeset());
        assert!(!f.in_changeset());
        assert_eq!(f.contents(), "ab");
        assert_eq!(f.fix_count(), 0);
        assert!(f.history().old_value(0).is_none());
    }

    #[test]
    fn test_replay_conflict_reverts_applied_entries() {
        let mut f = fixer(&["0", "a"]);
        f.pass = 1;
        assert!(f.replace_token(1, "b"));
        f.load_tokens(vec!["0".into(), "b".into()]);
        f.pass = 2;

        assert!(f.begin_changeset());
        f.replace_token(0, "X");
        f.replace_token(1, "a");
        assert!(!f.end_changeset());
        assert!(f.in_conflict());
        assert_eq!(f.contents(), "0b");
        assert_eq!(f.fix_count(), 0);
    }

    #[test]
    fn test_load_tokens_resets_fix_count() {
        let mut f = fixer(&["a"]);
        f.replace_token(0, "b");
        f.load_tokens(vec!["b".into()]);
        assert_eq!(f.fix_count(), 0);
        assert!(f.history().old_value(0).is_some());
        assert_eq!(f.original_contents(), "a");
    }

    #[test]
    fn test_detect_line_terminator() {
        assert_eq!(detect_line_terminator("a\r\nb"), "\r\n");
        assert_eq!(detect_line_terminator("a\rb"), "\r");
        assert_eq!(detect_line_terminator("a\nb"), "\n");
        assert_eq!(detect_line_terminator("ab"), "\n");
    }

    #[test]
    fn test_max_passes_clamped() {
        let f = fixer(&[]).with_max_passes(500);
        assert_eq!(f.max_passes(), MAX_PASSES);
        let f = fixer(&[]).with_max_passes(3);
        assert_eq!(f.max_passes(), 3);
    }
}

//! The narrow edit capability handed to sniffs.
//!
//! A [`TokenEditor`] borrows the session's [`Fixer`] for one dispatch and tags
//! every edit with the sniff that made it, so verbose logs can say who asked
//! for what without the sniff ever owning the token store.

use crate::fixer::Fixer;

pub struct TokenEditor<'a> {
    fixer: &'a mut Fixer,
    source: &'a str,
}

impl<'a> TokenEditor<'a> {
    /// Edit `fixer` on behalf of `source`.
    pub fn new(fixer: &'a mut Fixer, source: &'a str) -> Self {
        Self { fixer, source }
    }

    /// Reborrow this editor under a different attribution.
    pub fn for_source<'b>(&'b mut self, source: &'b str) -> TokenEditor<'b> {
        TokenEditor {
            fixer: &mut *self.fixer,
            source,
        }
    }

    /// Who edits made through this editor are attributed to.
    pub fn source(&self) -> &str {
        self.source
    }

    /// Token content including edits buffered in an open changeset.
    pub fn token_content(&self, pos: usize) -> Option<&str> {
        self.fixer.token_content(pos)
    }

    pub fn token_count(&self) -> usize {
        self.fixer.token_count()
    }

    /// Terminator used by the newline helpers.
    pub fn line_terminator(&self) -> &str {
        self.fixer.line_terminator()
    }

    pub fn in_changeset(&self) -> bool {
        self.fixer.in_changeset()
    }

    pub fn in_conflict(&self) -> bool {
        self.fixer.in_conflict()
    }

    /// Direct fixes landed so far this pass.
    pub fn fix_count(&self) -> usize {
        self.fixer.fix_count()
    }

    /// See [`Fixer::replace_token`].
    pub fn replace_token(&mut self, pos: usize, content: impl Into<String>) -> bool {
        self.fixer.replace_token_as(self.source, pos, content.into())
    }

    /// See [`Fixer::revert_token`].
    pub fn revert_token(&mut self, pos: usize) -> bool {
        self.fixer.revert_token_as(self.source, pos)
    }

    /// See [`Fixer::begin_changeset`].
    pub fn begin_changeset(&mut self) -> bool {
        self.fixer.begin_changeset_as(self.source)
    }

    /// Commit the open changeset. Returns whether every buffered edit landed.
    pub fn end_changeset(&mut self) -> bool {
        self.fixer.end_changeset_as(self.source)
    }

    /// See [`Fixer::rollback_changeset`].
    pub fn rollback_changeset(&mut self) {
        self.fixer.rollback_changeset_as(self.source)
    }

    /// Append `content` to the token at `pos`.
    pub fn add_content(&mut self, pos: usize, content: &str) -> bool {
        let Some(current) = self.token_content(pos) else {
            return false;
        };
        let new_content = format!("{current}{content}");
        self.replace_token(pos, new_content)
    }

    /// Prepend `content` to the token at `pos`.
    pub fn add_content_before(&mut self, pos: usize, content: &str) -> bool {
        let Some(current) = self.token_content(pos) else {
            return false;
        };
        let new_content = format!("{content}{current}");
        self.replace_token(pos, new_content)
    }

    /// Append the session's line terminator to the token at `pos`.
    pub fn add_newline(&mut self, pos: usize) -> bool {
        let terminator = self.line_terminator().to_string();
        self.add_content(pos, &terminator)
    }

    /// Prepend the session's line terminator to the token at `pos`.
    pub fn add_newline_before(&mut self, pos: usize) -> bool {
        let terminator = self.line_terminator().to_string();
        self.add_content_before(pos, &terminator)
    }

    /// Keep `len` characters of the token at `pos` starting at char `start`.
    ///
    /// `None` keeps everything from `start` on. A `start` past the end leaves
    /// an empty token.
    pub fn substr_token(&mut self, pos: usize, start: usize, len: Option<usize>) -> bool {
        let Some(current) = self.token_content(pos) else {
            return false;
        };
        let rest = current.chars().skip(start);
        let new_content: String = match len {
            Some(len) => rest.take(len).collect(),
            None => rest.collect(),
        };
        self.replace_token(pos, new_content)
    }

    /// Shift the indentation of every line that starts within `start..=end`
    /// by `change` columns.
    ///
    /// Leading whitespace tokens are resized (never below zero); other tokens
    /// at a line start get `change` spaces prepended when indenting. Runs
    /// inside a changeset, opening one if none is open.
    pub fn change_code_block_indent(&mut self, start: usize, end: usize, change: isize) -> bool {
        let base_indent = " ".repeat(change.max(0).unsigned_abs());
        let end = end.min(self.token_count().saturating_sub(1));

        let own_changeset = !self.in_changeset();
        if own_changeset && !self.begin_changeset() {
            return false;
        }

        let mut edits = Vec::new();
        for pos in start..=end {
            if self.token_count() == 0 || !self.starts_line(pos) {
                continue;
            }
            let Some(content) = self.fixer.committed_token(pos) else {
                continue;
            };
            if content.contains(['\n', '\r']) {
                continue;
            }

            let new_content = if is_indent_whitespace(content) {
                let width = content.chars().count() as isize + change;
                let padding = " ".repeat(width.max(0).unsigned_abs());
                format!("{padding}{}", content.trim_start())
            } else {
                format!("{base_indent}{content}")
            };
            if new_content != content {
                edits.push((pos, new_content));
            }
        }

        for (pos, new_content) in edits {
            self.replace_token(pos, new_content);
        }

        if own_changeset {
            self.end_changeset()
        } else {
            true
        }
    }

    /// Whether the committed token at `pos` begins a line.
    fn starts_line(&self, pos: usize) -> bool {
        if pos == 0 {
            return true;
        }
        self.fixer
            .committed_token(pos - 1)
            .is_some_and(|prev| prev.ends_with(['\n', '\r']))
    }
}

fn is_indent_whitespace(content: &str) -> bool {
    !content.is_empty() && content.chars().all(|c| c == ' ' || c == '\t')
}

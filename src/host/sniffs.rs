//! Built-in whitespace sniffs.
//!
//! Each sniff reports violations against a token array and knows how to fix
//! one violation through a [`TokenEditor`]. Fixes that touch more than one
//! token go through a changeset so they land together or not at all.

use crate::config::FixerConfig;
use crate::editor::TokenEditor;
use crate::host::tokenizer::{is_blank, is_newline, line_of};

pub const TRAILING_WHITESPACE: &str = "whitespace.trailing";
pub const TAB_INDENT: &str = "whitespace.tab_indent";
pub const EOF_NEWLINE: &str = "whitespace.eof_newline";
pub const BLANK_LINES: &str = "whitespace.blank_lines";

pub const SNIFF_CODES: &[&str] = &[TRAILING_WHITESPACE, TAB_INDENT, EOF_NEWLINE, BLANK_LINES];

/// A fixable problem found by a sniff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Token the violation is anchored to.
    pub pos: usize,
    pub line: usize,
    pub message: String,
}

impl Violation {
    pub fn new(tokens: &[String], pos: usize, message: impl Into<String>) -> Self {
        Self {
            pos,
            line: line_of(tokens, pos),
            message: message.into(),
        }
    }
}

pub trait Sniff {
    /// Stable identifier, also used to attribute edits.
    fn code(&self) -> &'static str;

    fn check(&self, tokens: &[String]) -> Vec<Violation>;

    fn fix(&self, tokens: &[String], violation: &Violation, editor: &mut TokenEditor<'_>);
}

/// The built-in sniffs enabled by `config`, in registration order.
pub fn builtin_sniffs(config: &FixerConfig) -> Vec<Box<dyn Sniff>> {
    let mut sniffs: Vec<Box<dyn Sniff>> = Vec::new();
    if config.sniff_enabled(TRAILING_WHITESPACE) {
        sniffs.push(Box::new(TrailingWhitespace));
    }
    if config.sniff_enabled(TAB_INDENT) {
        sniffs.push(Box::new(TabIndent {
            tab_width: config.sniffs.tab_width,
        }));
    }
    if config.sniff_enabled(EOF_NEWLINE) {
        sniffs.push(Box::new(EofNewline));
    }
    if config.sniff_enabled(BLANK_LINES) {
        sniffs.push(Box::new(BlankLines));
    }
    sniffs
}

/// Spaces or tabs at the end of a line or of the file.
pub struct TrailingWhitespace;

impl Sniff for TrailingWhitespace {
    fn code(&self) -> &'static str {
        TRAILING_WHITESPACE
    }

    fn check(&self, tokens: &[String]) -> Vec<Violation> {
        tokens
            .iter()
            .enumerate()
            .filter(|(pos, token)| {
                is_blank(token) && tokens.get(pos + 1).map_or(true, |next| is_newline(next))
            })
            .map(|(pos, _)| Violation::new(tokens, pos, "Whitespace found at end of line"))
            .collect()
    }

    fn fix(&self, _tokens: &[String], violation: &Violation, editor: &mut TokenEditor<'_>) {
        editor.replace_token(violation.pos, "");
    }
}

/// Tabs in leading indentation.
pub struct TabIndent {
    pub tab_width: usize,
}

impl TabIndent {
    fn expand(&self, indent: &str) -> String {
        let width = self.tab_width.max(1);
        let mut out = String::with_capacity(indent.len());
        for c in indent.chars() {
            if c == '\t' {
                let pad = width - out.len() % width;
                out.extend(std::iter::repeat(' ').take(pad));
            } else {
                out.push(c);
            }
        }
        out
    }
}

impl Sniff for TabIndent {
    fn code(&self) -> &'static str {
        TAB_INDENT
    }

    fn check(&self, tokens: &[String]) -> Vec<Violation> {
        tokens
            .iter()
            .enumerate()
            .filter(|(pos, token)| {
                token.contains('\t') && is_blank(token) && starts_line(tokens, *pos)
            })
            .map(|(pos, _)| {
                Violation::new(tokens, pos, "Spaces must be used to indent lines; tabs are not allowed")
            })
            .collect()
    }

    fn fix(&self, tokens: &[String], violation: &Violation, editor: &mut TokenEditor<'_>) {
        if let Some(indent) = tokens.get(violation.pos) {
            editor.replace_token(violation.pos, self.expand(indent));
        }
    }
}

/// The file must end in exactly one line terminator.
pub struct EofNewline;

impl EofNewline {
    /// Index of the first newline in the run that ends the file.
    fn trailing_run_start(tokens: &[String]) -> Option<usize> {
        let trailing = tokens.iter().rev().take_while(|t| is_newline(t)).count();
        (trailing > 0).then(|| tokens.len() - trailing)
    }
}

impl Sniff for EofNewline {
    fn code(&self) -> &'static str {
        EOF_NEWLINE
    }

    fn check(&self, tokens: &[String]) -> Vec<Violation> {
        let Some(last) = tokens.len().checked_sub(1) else {
            return Vec::new();
        };
        match Self::trailing_run_start(tokens) {
            None => vec![Violation::new(tokens, last, "Expected 1 newline at end of file; 0 found")],
            Some(start) if start < last => {
                let found = tokens.len() - start;
                vec![Violation::new(
                    tokens,
                    start,
                    format!("Expected 1 newline at end of file; {found} found"),
                )]
            }
            Some(_) => Vec::new(),
        }
    }

    fn fix(&self, tokens: &[String], violation: &Violation, editor: &mut TokenEditor<'_>) {
        match Self::trailing_run_start(tokens) {
            None => {
                editor.add_newline(violation.pos);
            }
            Some(start) => {
                if !editor.begin_changeset() {
                    return;
                }
                for pos in start + 1..tokens.len() {
                    editor.replace_token(pos, "");
                }
                editor.end_changeset();
            }
        }
    }
}

/// More than one consecutive blank line inside the file.
pub struct BlankLines;

impl BlankLines {
    /// `(first, end)` of every newline run of three or more that is followed
    /// by more content.
    fn runs(tokens: &[String]) -> Vec<(usize, usize)> {
        let mut runs = Vec::new();
        let mut pos = 0;
        while pos < tokens.len() {
            if !is_newline(&tokens[pos]) {
                pos += 1;
                continue;
            }
            let start = pos;
            while pos < tokens.len() && is_newline(&tokens[pos]) {
                pos += 1;
            }
            if pos - start > 2 && pos < tokens.len() {
                runs.push((start, pos));
            }
        }
        runs
    }
}

impl Sniff for BlankLines {
    fn code(&self) -> &'static str {
        BLANK_LINES
    }

    fn check(&self, tokens: &[String]) -> Vec<Violation> {
        Self::runs(tokens)
            .into_iter()
            .map(|(start, end)| {
                let blank = end - start - 1;
                Violation::new(
                    tokens,
                    start + 2,
                    format!("Expected at most 1 empty line; found {blank}"),
                )
            })
            .collect()
    }

    fn fix(&self, tokens: &[String], violation: &Violation, editor: &mut TokenEditor<'_>) {
        let end = tokens
            .get(violation.pos..)
            .unwrap_or_default()
            .iter()
            .take_while(|t| is_newline(t))
            .count()
            + violation.pos;
        if !editor.begin_changeset() {
            return;
        }
        for pos in violation.pos..end {
            editor.replace_token(pos, "");
        }
        editor.end_changeset();
    }
}

fn starts_line(tokens: &[String], pos: usize) -> bool {
    pos == 0 || tokens.get(pos - 1).is_some_and(|prev| is_newline(prev))
}

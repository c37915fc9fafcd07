//! Reference host: a generic tokenizer plus a registry of sniffs.
//!
//! [`SniffHost`] is the analysis side of a fix session for plain text files.
//! It is deliberately simple; real language hosts implement
//! [`Host`](crate::driver::Host) with their own tokenizer and sniffs.

pub mod sniffs;
pub mod tokenizer;

pub use sniffs::{builtin_sniffs, Sniff, Violation};
pub use tokenizer::tokenize;

use crate::config::FixerConfig;
use crate::driver::Host;
use crate::editor::TokenEditor;

/// A violation tagged with the sniff that reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub code: &'static str,
    pub violation: Violation,
}

pub struct SniffHost {
    sniffs: Vec<Box<dyn Sniff>>,
    tokens: Vec<String>,
}

impl SniffHost {
    /// Build a host over `text` with an explicit sniff list.
    pub fn new(text: &str, sniffs: Vec<Box<dyn Sniff>>) -> Self {
        Self {
            sniffs,
            tokens: tokenize(text),
        }
    }

    /// Build a host over `text` with the built-in sniffs `config` enables.
    pub fn from_config(text: &str, config: &FixerConfig) -> Self {
        Self::new(text, builtin_sniffs(config))
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn sniff_codes(&self) -> Vec<&'static str> {
        self.sniffs.iter().map(|s| s.code()).collect()
    }

    /// Every violation in the file as last tokenized, in sniff order.
    pub fn check(&self) -> Vec<Report> {
        self.sniffs
            .iter()
            .flat_map(|sniff| {
                sniff
                    .check(&self.tokens)
                    .into_iter()
                    .map(move |violation| Report {
                        code: sniff.code(),
                        violation,
                    })
            })
            .collect()
    }
}

impl Host for SniffHost {
    fn fixable_count(&self) -> usize {
        self.sniffs
            .iter()
            .map(|sniff| sniff.check(&self.tokens).len())
            .sum()
    }

    fn tokenize(&mut self, text: &str) -> Vec<String> {
        self.tokens = tokenize(text);
        self.tokens.clone()
    }

    fn dispatch(&mut self, editor: &mut TokenEditor<'_>) {
        for sniff in &self.sniffs {
            let code = sniff.code();
            let mut editor = editor.for_source(code);
            for violation in sniff.check(&self.tokens) {
                log::trace!("[{code}] line {}: {}", violation.line, violation.message);
                sniff.fix(&self.tokens, &violation, &mut editor);
            }
        }
    }
}

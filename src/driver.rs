//! The fixed-point loop that drives a fix session to convergence.
//!
//! Each pass hands the current text to the [`Host`], which re-tokenizes it and
//! dispatches its sniffs against the fresh token array through a
//! [`TokenEditor`]. The loop stops at the first pass that lands no edits and
//! raises no conflict, or fails once the pass cap is exhausted.

use crate::editor::TokenEditor;
use crate::fixer::Fixer;
use std::fmt;

/// Attribution for driver-level housekeeping.
const DRIVER_SOURCE: &str = "driver";

/// The analysis side of a fix session: tokenizer plus sniff dispatch.
///
/// Together `tokenize` and `dispatch` re-process the file once. Both must be
/// deterministic for identical text and sniff configuration.
pub trait Host {
    /// Violations the host could fix in the file as it was last processed.
    fn fixable_count(&self) -> usize;

    /// Split `text` into token contents whose concatenation is `text`.
    fn tokenize(&mut self, text: &str) -> Vec<String>;

    /// Run every sniff against the tokens from the last `tokenize` call.
    fn dispatch(&mut self, editor: &mut TokenEditor<'_>);
}

/// How a fix session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "FixOutcome should be checked for convergence"]
pub enum FixOutcome {
    /// The host reported no fixable violations; no pass ran.
    NothingToFix,
    /// A pass landed no edits and raised no conflict.
    Converged { passes: usize },
    /// The pass cap ran out with edits or a conflict still pending.
    Failed { passes: usize },
}

impl FixOutcome {
    pub fn is_converged(&self) -> bool {
        matches!(self, FixOutcome::Converged { .. })
    }

    /// Only an exhausted pass cap counts as failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, FixOutcome::Failed { .. })
    }

    pub fn passes(&self) -> usize {
        match self {
            FixOutcome::NothingToFix => 0,
            FixOutcome::Converged { passes } | FixOutcome::Failed { passes } => *passes,
        }
    }
}

impl fmt::Display for FixOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixOutcome::NothingToFix => write!(f, "nothing to fix"),
            FixOutcome::Converged { passes } => write!(f, "fixed in {} {}", passes, plural(*passes)),
            FixOutcome::Failed { passes } => {
                write!(f, "failed to converge after {} {}", passes, plural(*passes))
            }
        }
    }
}

fn plural(passes: usize) -> &'static str {
    if passes == 1 {
        "pass"
    } else {
        "passes"
    }
}

impl Fixer {
    /// Drive the session until the file stops changing or the pass cap hits.
    ///
    /// Each call starts a new session: fix history, conflict state and the
    /// pass counter from an earlier call are dropped.
    pub fn fix_file<H: Host + ?Sized>(&mut self, host: &mut H) -> FixOutcome {
        self.start_session();
        let fixable = host.fixable_count();
        if fixable == 0 {
            log::debug!("nothing to fix");
            return FixOutcome::NothingToFix;
        }

        while self.pass < self.max_passes {
            self.start_pass();
            let text = self.contents();
            let tokens = host.tokenize(&text);
            self.load_tokens(tokens);
            self.pass += 1;

            host.dispatch(&mut self.editor(DRIVER_SOURCE));

            if self.in_changeset() {
                log::warn!("pass {}: a sniff left a changeset open, rolling it back", self.pass);
                self.rollback_changeset_as(DRIVER_SOURCE);
            }

            let fixes = self.fix_count();
            log::info!(
                "fixing file: {fixes}/{fixable} violations remaining [made {} {}]",
                self.pass,
                plural(self.pass)
            );

            if fixes == 0 && !self.in_conflict() {
                return FixOutcome::Converged { passes: self.pass };
            }
            log::debug!(
                "fixed {fixes} violations{}, starting pass {}",
                if self.in_conflict() { " (conflict)" } else { "" },
                self.pass + 1
            );
        }

        log::warn!(
            "failed to fix file after {} passes, {} fixes still pending",
            self.pass,
            self.fix_count()
        );
        FixOutcome::Failed { passes: self.pass }
    }

    /// Run a session and report only whether it converged.
    ///
    /// A host with nothing to fix yields `false`; use [`Fixer::fix_file`] to
    /// tell that apart from a failure.
    pub fn run_session<H: Host + ?Sized>(&mut self, host: &mut H) -> bool {
        self.fix_file(host).is_converged()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Splits on every character and runs a closure as its only sniff.
    struct CharHost<F> {
        fixable: usize,
        tokens: Vec<String>,
        sniff: F,
    }

    impl<F: FnMut(&[String], &mut TokenEditor<'_>)> Host for CharHost<F> {
        fn fixable_count(&self) -> usize {
            self.fixable
        }

        fn tokenize(&mut self, text: &str) -> Vec<String> {
            self.tokens = text.chars().map(String::from).collect();
            self.tokens.clone()
        }

        fn dispatch(&mut self, editor: &mut TokenEditor<'_>) {
            (self.sniff)(&self.tokens, editor);
        }
    }

    fn session(text: &str) -> Fixer {
        Fixer::new(text.chars().map(String::from).collect())
    }

    #[test]
    fn test_nothing_to_fix() {
        let mut fixer = session("abc");
        let mut host = CharHost {
            fixable: 0,
            tokens: Vec::new(),
            sniff: |_: &[String], _: &mut TokenEditor<'_>| panic!("must not dispatch"),
        };
        assert_eq!(fixer.fix_file(&mut host), FixOutcome::NothingToFix);
        assert_eq!(fixer.pass(), 0);
    }

    #[test]
    fn test_uppercase_converges() {
        let mut fixer = session("abc");
        let mut host = CharHost {
            fixable: 3,
            tokens: Vec::new(),
            sniff: |tokens: &[String], ed: &mut TokenEditor<'_>| {
                for (i, t) in tokens.iter().enumerate() {
                    let upper = t.to_uppercase();
                    if *t != upper {
                        ed.replace_token(i, upper);
                    }
                }
            },
        };
        let outcome = fixer.fix_file(&mut host);
        assert_eq!(outcome, FixOutcome::Converged { passes: 2 });
        assert_eq!(fixer.contents(), "ABC");
    }

    #[test]
    fn test_never_settles_fails_at_cap() {
        let mut fixer = session("a").with_max_passes(5);
        let mut host = CharHost {
            fixable: 1,
            tokens: Vec::new(),
            sniff: |tokens: &[String], ed: &mut TokenEditor<'_>| {
                let grown = format!("{}a", tokens.concat());
                ed.replace_token(0, grown);
            },
        };
        let outcome = fixer.fix_file(&mut host);
        assert_eq!(outcome, FixOutcome::Failed { passes: 5 });
        assert!(outcome.is_failure());
    }

    #[test]
    fn test_unclosed_changeset_rolled_back() {
        let mut fixer = session("ab");
        let mut host = CharHost {
            fixable: 1,
            tokens: Vec::new(),
            sniff: |_: &[String], ed: &mut TokenEditor<'_>| {
                ed.begin_changeset();
                ed.replace_token(0, "z");
            },
        };
        assert!(fixer.run_session(&mut host));
        assert_eq!(fixer.contents(), "ab");
        assert!(!fixer.in_changeset());
    }

    #[test]
    fn test_rerun_starts_with_fresh_history() {
        let mut fixer = session("ab");
        let mut host = CharHost {
            fixable: 1,
            tokens: Vec::new(),
            sniff: |tokens: &[String], ed: &mut TokenEditor<'_>| {
                if tokens[0] == "a" {
                    ed.replace_token(0, "b");
                }
            },
        };
        assert_eq!(fixer.fix_file(&mut host), FixOutcome::Converged { passes: 2 });
        assert!(fixer.history().old_value(0).is_some());

        assert_eq!(fixer.fix_file(&mut host), FixOutcome::Converged { passes: 1 });
        assert!(fixer.history().old_value(0).is_none());
        assert_eq!(fixer.original_contents(), "ab");
        assert_eq!(fixer.contents(), "bb");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(FixOutcome::NothingToFix.to_string(), "nothing to fix");
        assert_eq!(FixOutcome::Converged { passes: 1 }.to_string(), "fixed in 1 pass");
        assert_eq!(
            FixOutcome::Failed { passes: 50 }.to_string(),
            "failed to converge after 50 passes"
        );
    }
}

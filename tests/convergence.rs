//! End-to-end engine behavior: the worked scenarios plus the session-level
//! guarantees (at-most-once, atomicity, conflict quarantine, termination,
//! idempotence).

use proptest::prelude::*;
use token_fixer::config::FixerConfig;
use token_fixer::{FixOutcome, Fixer, Host, SniffHost, TokenEditor, MAX_PASSES};

fn fixer(parts: &[&str]) -> Fixer {
    Fixer::new(parts.iter().map(|s| s.to_string()).collect())
}

fn chars(text: &str) -> Vec<String> {
    text.chars().map(String::from).collect()
}

/// One token per character; a closure plays every sniff.
struct ScriptHost<F> {
    fixable: usize,
    tokens: Vec<String>,
    passes: usize,
    sniffs: F,
}

impl<F: FnMut(usize, &[String], &mut TokenEditor<'_>)> ScriptHost<F> {
    fn new(fixable: usize, sniffs: F) -> Self {
        Self {
            fixable,
            tokens: Vec::new(),
            passes: 0,
            sniffs,
        }
    }
}

impl<F: FnMut(usize, &[String], &mut TokenEditor<'_>)> Host for ScriptHost<F> {
    fn fixable_count(&self) -> usize {
        self.fixable
    }

    fn tokenize(&mut self, text: &str) -> Vec<String> {
        self.tokens = chars(text);
        self.tokens.clone()
    }

    fn dispatch(&mut self, editor: &mut TokenEditor<'_>) {
        self.passes += 1;
        (self.sniffs)(self.passes, &self.tokens, editor);
    }
}

#[test]
fn test_direct_edit_removes_token() {
    let mut f = fixer(&["foo", " ", "bar"]);
    assert!(f.replace_token(1, ""));
    assert_eq!(f.contents(), "foobar");
    assert_eq!(f.fix_count(), 1);
}

#[test]
fn test_changeset_replay_failure_restores_text() {
    let mut f = fixer(&["a", "b", "c"]);
    assert!(f.replace_token(2, "C"));
    let before = f.contents();
    let fixes = f.fix_count();

    assert!(f.begin_changeset());
    assert!(f.replace_token(0, "X"));
    assert!(f.replace_token(2, "Z"));
    assert!(!f.end_changeset());

    assert_eq!(f.contents(), before);
    assert_eq!(f.fix_count(), fixes);
    assert!(!f.in_changeset());
}

#[test]
fn test_bounce_back_next_pass_forces_extra_pass() {
    let mut pass_conflicts = Vec::new();
    let mut host = ScriptHost::new(1, |pass: usize, tokens: &[String], ed: &mut TokenEditor<'_>| {
        // One sniff rewrites position 5 once; the other always wants it back.
        if pass == 1 && tokens[5] == "a" {
            ed.for_source("rewrite").replace_token(5, "b");
        }
        if tokens[5] != "a" {
            ed.for_source("restore").replace_token(5, "a");
        }
        pass_conflicts.push(ed.in_conflict());
    });

    let mut f = Fixer::new(chars("01234a"));
    let outcome = f.fix_file(&mut host);

    assert_eq!(outcome, FixOutcome::Converged { passes: 4 });
    assert_eq!(pass_conflicts, vec![false, true, false, false]);
    assert_eq!(f.contents(), "01234a");
    let record = f.history().old_value(5).unwrap();
    assert_eq!(record.pass, 3);
}

#[test]
fn test_nothing_to_fix_is_not_success() {
    let mut f = fixer(&["clean"]);
    let mut host = ScriptHost::new(0, |_: usize, _: &[String], _: &mut TokenEditor<'_>| {
        panic!("no pass should run")
    });
    assert!(!f.run_session(&mut host));
    assert_eq!(f.pass(), 0);
}

#[test]
fn test_second_direct_fix_same_pass_rejected() {
    let mut host = ScriptHost::new(1, |pass: usize, _: &[String], ed: &mut TokenEditor<'_>| {
        if pass == 1 {
            assert!(ed.replace_token(0, "x"));
            assert!(!ed.replace_token(0, "y"));
            assert_eq!(ed.token_content(0), Some("x"));
        }
    });
    let mut f = Fixer::new(chars("ab"));
    assert!(f.run_session(&mut host));
    assert_eq!(f.contents(), "xb");
}

#[test]
fn test_conflict_freezes_rest_of_pass() {
    let mut f = Fixer::new(chars("ab"));
    let mut host = ScriptHost::new(1, |pass: usize, _: &[String], ed: &mut TokenEditor<'_>| {
        match pass {
            1 => {
                ed.replace_token(0, "x");
            }
            2 => {
                assert!(!ed.replace_token(0, "a"));
                assert!(ed.in_conflict());
                assert!(!ed.replace_token(1, "z"));
                assert!(!ed.begin_changeset());
            }
            _ => {}
        }
    });
    let outcome = f.fix_file(&mut host);
    assert_eq!(outcome, FixOutcome::Converged { passes: 3 });
    assert_eq!(f.contents(), "xb");
}

#[test]
fn test_bounce_back_inside_changeset_rejects_whole_batch() {
    let mut f = Fixer::new(chars("0a"));
    let mut host = ScriptHost::new(1, |pass: usize, _: &[String], ed: &mut TokenEditor<'_>| {
        match pass {
            1 => {
                assert!(ed.replace_token(1, "b"));
            }
            2 => {
                assert!(ed.begin_changeset());
                assert!(ed.replace_token(0, "X"));
                assert!(ed.replace_token(1, "a"));
                assert!(!ed.end_changeset());

                assert!(ed.in_conflict());
                assert_eq!(ed.token_content(0), Some("0"));
                assert_eq!(ed.token_content(1), Some("b"));
                assert_eq!(ed.fix_count(), 0);
            }
            _ => {}
        }
    });
    let outcome = f.fix_file(&mut host);
    assert_eq!(outcome, FixOutcome::Converged { passes: 3 });
    assert_eq!(f.contents(), "0b");
}

#[test]
fn test_endless_edits_stop_at_pass_cap() {
    let mut f = Fixer::new(chars("a"));
    let mut host = ScriptHost::new(1, |_: usize, tokens: &[String], ed: &mut TokenEditor<'_>| {
        ed.replace_token(0, format!("{}.", tokens[0]));
    });
    let outcome = f.fix_file(&mut host);
    assert_eq!(outcome, FixOutcome::Failed { passes: MAX_PASSES });
    assert_eq!(host.passes, MAX_PASSES);
}

#[test]
fn test_converged_whitespace_file_is_clean() {
    let text = "  \tlet x = 1;   \r\n\r\n\r\n\r\n\tlet y = 2;\t\r\n\r\n";
    let config = FixerConfig::default();
    let mut host = SniffHost::from_config(text, &config);
    let mut f = Fixer::new(host.tokens().to_vec());
    assert!(f.run_session(&mut host));

    let fixed = f.contents();
    assert_eq!(fixed, "    let x = 1;\r\n\r\n    let y = 2;\r\n");

    let mut again = SniffHost::from_config(&fixed, &config);
    let mut f2 = Fixer::new(again.tokens().to_vec());
    assert_eq!(f2.fix_file(&mut again), FixOutcome::NothingToFix);
}

proptest! {
    #[test]
    fn prop_changeset_is_all_or_nothing(
        len in 1usize..12,
        prefixed in proptest::collection::vec(0usize..12, 0..4),
        edits in proptest::collection::vec((0usize..14, "[a-z]{0,3}"), 1..8),
    ) {
        let mut f = Fixer::new((0..len).map(|i| i.to_string()).collect());
        for pos in &prefixed {
            f.replace_token(*pos, "#");
        }
        let before: Vec<String> = f.tokens().map(String::from).collect();
        let fixes = f.fix_count();

        prop_assert!(f.begin_changeset());
        for (pos, content) in &edits {
            f.replace_token(*pos, content.clone());
        }
        let committed = f.end_changeset();
        let after: Vec<String> = f.tokens().map(String::from).collect();

        if committed {
            for (pos, _) in &edits {
                // The last buffered value for a position wins.
                let last = edits.iter().rev().find(|(p, _)| p == pos).map(|(_, c)| c);
                prop_assert_eq!(Some(&after[*pos]), last);
                prop_assert!(f.history().is_fixed(*pos));
            }
        } else {
            prop_assert_eq!(after, before);
            prop_assert_eq!(f.fix_count(), fixes);
        }
    }

    #[test]
    fn prop_session_never_exceeds_pass_cap(cap in 1usize..80, grow in any::<bool>()) {
        let mut f = Fixer::new(chars("a")).with_max_passes(cap);
        let mut host = ScriptHost::new(1, |_: usize, tokens: &[String], ed: &mut TokenEditor<'_>| {
            if grow {
                ed.replace_token(0, format!("{}a", tokens[0]));
            }
        });
        let outcome = f.fix_file(&mut host);
        prop_assert!(outcome.passes() <= cap.min(MAX_PASSES));
        prop_assert!(host.passes <= MAX_PASSES);
    }

    #[test]
    fn prop_whitespace_fixes_are_idempotent(text in "[ab \t\n]{0,40}") {
        let config = FixerConfig::default();
        let mut host = SniffHost::from_config(&text, &config);
        let mut f = Fixer::new(host.tokens().to_vec());
        let outcome = f.fix_file(&mut host);
        prop_assert!(!outcome.is_failure());

        let fixed = f.contents();
        let mut again = SniffHost::from_config(&fixed, &config);
        let mut f2 = Fixer::new(again.tokens().to_vec());
        prop_assert_eq!(f2.fix_file(&mut again), FixOutcome::NothingToFix);
    }
}

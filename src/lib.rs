//! Token Fixer: auto-fix convergence engine for token-based static analysis
//!
//! Sniffs inspect a token stream and request edits to individual tokens.
//! Many independently written sniffs may want to touch the same tokens, so
//! the engine applies their edits to a shared store, re-tokenizes, and runs
//! them again until the file stops changing.
//!
//! # Architecture
//!
//! - [`Fixer`] is one file's fix session: the token store, per-position fix
//!   history, the open changeset (if any), and the pass counter.
//! - [`TokenEditor`] is the narrow edit capability sniffs receive; every edit
//!   is attributed to the sniff that made it.
//! - [`Host`] is the analysis side: it tokenizes text and dispatches sniffs.
//!   [`Fixer::fix_file`] drives it pass by pass.
//!
//! # Guarantees
//!
//! - A token is directly fixed at most once per pass.
//! - Changesets land atomically: all buffered edits or none.
//! - An edit that would undo the previous pass's edit to the same token
//!   raises a conflict that freezes every further edit for the rest of the pass.
//! - A session never runs more than [`MAX_PASSES`] passes.
//!
//! # Example
//!
//! ```
//! use token_fixer::{Fixer, Host, TokenEditor};
//!
//! struct Uppercase {
//!     tokens: Vec<String>,
//! }
//!
//! impl Host for Uppercase {
//!     fn fixable_count(&self) -> usize {
//!         self.tokens.iter().filter(|t| t.to_uppercase() != **t).count()
//!     }
//!
//!     fn tokenize(&mut self, text: &str) -> Vec<String> {
//!         self.tokens = text.split_inclusive(' ').map(String::from).collect();
//!         self.tokens.clone()
//!     }
//!
//!     fn dispatch(&mut self, editor: &mut TokenEditor<'_>) {
//!         for (pos, token) in self.tokens.iter().enumerate() {
//!             if token.to_uppercase() != *token {
//!                 editor.replace_token(pos, token.to_uppercase());
//!             }
//!         }
//!     }
//! }
//!
//! let mut host = Uppercase { tokens: vec!["hello ".into(), "world".into()] };
//! let mut fixer = Fixer::new(host.tokens.clone());
//! assert!(fixer.run_session(&mut host));
//! assert_eq!(fixer.contents(), "HELLO WORLD");
//! ```

pub mod config;
pub mod diff;
pub mod driver;
pub mod editor;
pub mod fixer;
pub mod host;
pub mod runner;

// Re-exports
pub use config::{load_from_path, load_from_str, ConfigError, FixerConfig};
pub use diff::{DiffError, DiffOptions};
pub use driver::{FixOutcome, Host};
pub use editor::TokenEditor;
pub use fixer::{Fixer, MAX_PASSES};
pub use host::{Sniff, SniffHost, Violation};
pub use runner::{fix_path, FileReport, RunError, RunOptions};

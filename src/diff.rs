//! Unified diff between a session's starting text and its current text.
//!
//! Trailing whitespace matters here, so the diff is produced by an external
//! line-diff program run over two temporary files rather than by comparing
//! lines in memory.

use crate::fixer::Fixer;
use colored::Colorize;
use std::io::Write;
use std::process::{Command, Stdio};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to write temporary diff input: {0}")]
    TempFile(#[from] std::io::Error),

    #[error("Failed to run diff command `{command}`: {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },

    #[error("Diff command `{command}` exited with status {status}: {stderr}")]
    Failed {
        command: String,
        status: i32,
        stderr: String,
    },
}

/// Which program to run and how to label the two sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffOptions {
    pub command: String,
    pub original_label: String,
    pub fixed_label: String,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            command: "diff".to_string(),
            original_label: "original".to_string(),
            fixed_label: "fixed".to_string(),
        }
    }
}

impl DiffOptions {
    /// Label both sides after the file being fixed.
    pub fn for_file(mut self, name: &str) -> Self {
        self.original_label = name.to_string();
        self.fixed_label = format!("{name} (fixed)");
        self
    }
}

impl Fixer {
    /// Diff the session's original text against its current text with `diff -u`.
    pub fn generate_diff(&self, colorize: bool) -> Result<String, DiffError> {
        self.generate_diff_with(&DiffOptions::default(), colorize)
    }

    pub fn generate_diff_with(
        &self,
        options: &DiffOptions,
        colorize: bool,
    ) -> Result<String, DiffError> {
        let diff = unified_diff(self.original_contents(), &self.contents(), options)?;
        if colorize {
            Ok(colorize_diff(&diff))
        } else {
            Ok(diff)
        }
    }
}

/// Run the configured diff program over `original` and `fixed`.
///
/// Exit status 1 only means the inputs differ; anything above is an error.
pub fn unified_diff(original: &str, fixed: &str, options: &DiffOptions) -> Result<String, DiffError> {
    let original_file = write_temp(original)?;
    let fixed_file = write_temp(fixed)?;

    let output = Command::new(&options.command)
        .arg("-u")
        .arg(format!("-L{}", options.original_label))
        .arg(format!("-L{}", options.fixed_label))
        .arg(original_file.path())
        .arg(fixed_file.path())
        .stdin(Stdio::null())
        .output()
        .map_err(|source| DiffError::Spawn {
            command: options.command.clone(),
            source,
        })?;

    match output.status.code() {
        Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
        code => Err(DiffError::Failed {
            command: options.command.clone(),
            status: code.unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        }),
    }
}

fn write_temp(content: &str) -> Result<NamedTempFile, DiffError> {
    let mut temp = tempfile::Builder::new().prefix("token-fixer").tempfile()?;
    temp.write_all(content.as_bytes())?;
    temp.flush()?;
    Ok(temp)
}

/// Paint removed lines red and added lines green. Every line is kept.
pub fn colorize_diff(diff: &str) -> String {
    diff.lines()
        .map(|line| {
            if line.starts_with('-') {
                line.red().to_string()
            } else if line.starts_with('+') {
                line.green().to_string()
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

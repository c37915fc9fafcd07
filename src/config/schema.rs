use crate::diff::DiffOptions;
use crate::fixer::MAX_PASSES;
use crate::host::sniffs::SNIFF_CODES;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixerConfig {
    #[serde(default)]
    pub fixer: FixerSettings,
    #[serde(default)]
    pub diff: DiffSettings,
    #[serde(default)]
    pub files: FileSettings,
    #[serde(default)]
    pub sniffs: SniffSettings,
}

impl FixerConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.fixer.max_passes == 0 || self.fixer.max_passes > MAX_PASSES {
            issues.push(ValidationIssue::OutOfRange {
                field: "fixer.max_passes",
                message: format!("must be between 1 and {MAX_PASSES}, got {}", self.fixer.max_passes),
            });
        }

        if self.diff.command.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "diff.command",
            });
        }

        if self.sniffs.tab_width == 0 {
            issues.push(ValidationIssue::OutOfRange {
                field: "sniffs.tab_width",
                message: "must be at least 1".to_string(),
            });
        }

        if let Some(enabled) = &self.sniffs.enabled {
            for code in enabled {
                if !SNIFF_CODES.contains(&code.as_str()) {
                    issues.push(ValidationIssue::UnknownSniff { code: code.clone() });
                }
            }
        }

        for ext in &self.files.extensions {
            if ext.trim().is_empty() || ext.starts_with('.') {
                issues.push(ValidationIssue::InvalidExtension { value: ext.clone() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            command: self.diff.command.clone(),
            ..DiffOptions::default()
        }
    }

    /// Whether `code` should run: all built-ins unless `sniffs.enabled` narrows them.
    pub fn sniff_enabled(&self, code: &str) -> bool {
        match &self.sniffs.enabled {
            Some(enabled) => enabled.iter().any(|c| c == code),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FixerSettings {
    #[serde(default = "default_max_passes")]
    pub max_passes: usize,
    /// Force a terminator for inserted newlines instead of detecting it.
    #[serde(default)]
    pub line_terminator: Option<LineTerminator>,
}

impl Default for FixerSettings {
    fn default() -> Self {
        Self {
            max_passes: default_max_passes(),
            line_terminator: None,
        }
    }
}

fn default_max_passes() -> usize {
    MAX_PASSES
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LineTerminator {
    Lf,
    Crlf,
    Cr,
}

impl LineTerminator {
    pub fn as_str(self) -> &'static str {
        match self {
            LineTerminator::Lf => "\n",
            LineTerminator::Crlf => "\r\n",
            LineTerminator::Cr => "\r",
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DiffSettings {
    #[serde(default = "default_diff_command")]
    pub command: String,
}

impl Default for DiffSettings {
    fn default() -> Self {
        Self {
            command: default_diff_command(),
        }
    }
}

fn default_diff_command() -> String {
    "diff".to_string()
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    /// Extensions (without the dot) picked up when walking directories.
    /// Empty means every file.
    #[serde(default)]
    pub extensions: Vec<String>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SniffSettings {
    #[serde(default = "default_tab_width")]
    pub tab_width: usize,
    #[serde(default)]
    pub enabled: Option<Vec<String>>,
}

impl Default for SniffSettings {
    fn default() -> Self {
        Self {
            tab_width: default_tab_width(),
            enabled: None,
        }
    }
}

fn default_tab_width() -> usize {
    4
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    MissingField { field: &'static str },
    OutOfRange { field: &'static str, message: String },
    UnknownSniff { code: String },
    InvalidExtension { value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::OutOfRange { field, message } => {
                write!(f, "'{field}' out of range: {message}")
            }
            ValidationIssue::UnknownSniff { code } => {
                write!(f, "unknown sniff '{code}' (known: {})", SNIFF_CODES.join(", "))
            }
            ValidationIssue::InvalidExtension { value } => {
                write!(f, "invalid file extension '{value}' (omit the leading dot)")
            }
        }
    }
}

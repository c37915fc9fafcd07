//! File-level driver: read, fix, diff, and write back one file at a time.
//!
//! Every file gets its own [`Fixer`] session and [`SniffHost`]; nothing is
//! shared between files.

use crate::config::FixerConfig;
use crate::diff::DiffError;
use crate::driver::FixOutcome;
use crate::fixer::Fixer;
use crate::host::{Report, SniffHost};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum RunError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: PathBuf },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("Diff failed for {path}: {source}")]
    Diff { path: PathBuf, source: DiffError },
}

/// Outcome of fixing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "FileReport should be checked for failure"]
pub struct FileReport {
    pub path: PathBuf,
    pub outcome: FixOutcome,
    /// Violations found before fixing.
    pub fixable: usize,
    /// Violations still reported after the session.
    pub remaining: usize,
    pub changed: bool,
    pub written: bool,
    pub diff: Option<String>,
}

/// How [`fix_path`] should treat its result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Write the fixed text back to disk.
    pub write: bool,
    /// Produce a diff of the changes.
    pub diff: bool,
    /// Colorize the diff.
    pub color: bool,
}

/// Start a session for `text` configured from `config`.
pub fn session_for(text: &str, config: &FixerConfig) -> (Fixer, SniffHost) {
    let host = SniffHost::from_config(text, config);
    let mut fixer = Fixer::new(host.tokens().to_vec()).with_max_passes(config.fixer.max_passes);
    if let Some(terminator) = config.fixer.line_terminator {
        fixer = fixer.with_line_terminator(terminator.as_str());
    }
    (fixer, host)
}

/// Report violations in a file without changing it.
pub fn check_path(path: &Path, config: &FixerConfig) -> Result<Vec<Report>, RunError> {
    let text = read_text(path)?;
    Ok(SniffHost::from_config(&text, config).check())
}

/// Fix one file.
pub fn fix_path(path: &Path, config: &FixerConfig, options: RunOptions) -> Result<FileReport, RunError> {
    let text = read_text(path)?;
    let (mut fixer, mut host) = session_for(&text, config);
    let fixable = host.check().len();

    let outcome = fixer.fix_file(&mut host);
    let fixed = fixer.contents();
    let changed = fixed != text;
    // The host's tokens lag one pass behind when the cap runs out.
    let remaining = SniffHost::from_config(&fixed, config).check().len();

    log::info!("{}: {outcome}", path.display());

    let diff = if options.diff && changed {
        let diff_options = config.diff_options().for_file(&path.display().to_string());
        let diff = fixer
            .generate_diff_with(&diff_options, options.color)
            .map_err(|source| RunError::Diff {
                path: path.to_path_buf(),
                source,
            })?;
        Some(diff)
    } else {
        None
    };

    let written = options.write && changed;
    if written {
        atomic_write(path, fixed.as_bytes()).map_err(|source| RunError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(FileReport {
        path: path.to_path_buf(),
        outcome,
        fixable,
        remaining,
        changed,
        written,
        diff,
    })
}

/// Expand `paths` into files, walking directories and filtering by extension.
///
/// Explicitly named files are always kept. Results are sorted and deduplicated.
pub fn collect_files(paths: &[PathBuf], extensions: &[String]) -> Result<Vec<PathBuf>, RunError> {
    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }
        for entry in WalkDir::new(path) {
            let entry = entry.map_err(|source| RunError::Walk {
                path: path.clone(),
                source,
            })?;
            if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    if extensions.is_empty() {
        return true;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e == ext))
}

fn read_text(path: &Path) -> Result<String, RunError> {
    let bytes = fs::read(path).map_err(|source| RunError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    String::from_utf8(bytes).map_err(|_| RunError::NotUtf8 {
        path: path.to_path_buf(),
    })
}

/// Atomic file write: tempfile + fsync + rename, then bump the mtime.
fn atomic_write(path: &Path, content: &[u8]) -> Result<(), std::io::Error> {
    // Same directory keeps the rename on one filesystem.
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let permissions = fs::metadata(path).map(|m| m.permissions()).ok();

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    if let Some(permissions) = permissions {
        temp.as_file().set_permissions(permissions)?;
    }
    temp.persist(path).map_err(|e| e.error)?;

    filetime::set_file_mtime(path, filetime::FileTime::now())?;
    Ok(())
}

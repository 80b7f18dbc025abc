//! Application error types for user-facing error handling.
//!
//! This module defines error types that are displayed to users in the error
//! dialog, with detailed information and recovery options.

use std::path::PathBuf;
use thiserror::Error;

use super::parser::ParseError;

/// Application-level errors that can be displayed to users.
#[derive(Debug, Clone, Error)]
pub enum AppError {
    /// File was not found at the specified path
    #[error("File not found")]
    FileNotFound {
        /// Path to the file that was not found
        path: PathBuf,
    },

    /// File exists but cannot be read (permissions, locked, etc.)
    #[error("Cannot read file")]
    FileReadError {
        /// Path to the file that could not be read
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// File content is not a valid event file
    #[error("Invalid file format")]
    InvalidFormat {
        /// Path to the file with invalid format
        path: Option<PathBuf>,
        /// Description of what's wrong
        message: String,
        /// Line number where the error occurred (1-indexed)
        line: Option<usize>,
        /// Column where the error occurred
        column: Option<usize>,
    },

    /// File extension is not recognized
    #[error("Unsupported file type")]
    UnsupportedFileType {
        /// Path to the file
        path: PathBuf,
        /// Expected file extensions
        expected: Vec<String>,
    },

    /// Settings could not be saved
    #[error("Settings save error")]
    SettingsSaveError {
        /// Description of the failure
        reason: String,
    },
}

impl AppError {
    /// Returns true if this error supports a retry.
    ///
    /// File access errors can be retried once the user fixes the underlying
    /// issue (permissions, location).
    pub fn supports_retry(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound { .. } | Self::FileReadError { .. }
        )
    }

    /// Get the file path associated with this error, if any.
    pub fn file_path(&self) -> Option<&PathBuf> {
        match self {
            Self::FileNotFound { path } => Some(path),
            Self::FileReadError { path, .. } => Some(path),
            Self::InvalidFormat { path, .. } => path.as_ref(),
            Self::UnsupportedFileType { path, .. } => Some(path),
            Self::SettingsSaveError { .. } => None,
        }
    }

    /// Get the title for the error dialog.
    pub fn dialog_title(&self) -> &'static str {
        match self {
            Self::FileNotFound { .. } => "File Not Found",
            Self::FileReadError { .. } => "Cannot Read File",
            Self::InvalidFormat { .. } => "Invalid File Format",
            Self::UnsupportedFileType { .. } => "Unsupported File Type",
            Self::SettingsSaveError { .. } => "Settings Error",
        }
    }

    /// Get a brief description of the error suitable for display.
    pub fn brief_description(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("The file '{}' could not be found.", display_name(path))
            }
            Self::FileReadError { path, .. } => {
                format!("Could not read the file '{}'.", display_name(path))
            }
            Self::InvalidFormat { message, .. } => message.clone(),
            Self::UnsupportedFileType { expected, .. } => {
                format!(
                    "Please use a file with one of these extensions: {}",
                    expected.join(", ")
                )
            }
            Self::SettingsSaveError { reason } => format!("Could not save settings: {}", reason),
        }
    }

    /// Get detailed error information for bug reports.
    pub fn detailed_info(&self) -> String {
        let mut lines = vec![
            format!("Error Type: {}", self.dialog_title()),
            format!("Description: {}", self.brief_description()),
        ];

        match self {
            Self::FileNotFound { path } => {
                lines.push(format!("Full Path: {}", path.display()));
            }
            Self::FileReadError { path, reason } => {
                lines.push(format!("Full Path: {}", path.display()));
                lines.push(format!("Reason: {}", reason));
            }
            Self::InvalidFormat {
                path,
                message,
                line,
                column,
            } => {
                if let Some(p) = path {
                    lines.push(format!("File: {}", p.display()));
                }
                if let Some(l) = line {
                    lines.push(format!("Line: {}", l));
                }
                if let Some(c) = column {
                    lines.push(format!("Column: {}", c));
                }
                lines.push(format!("Details: {}", message));
            }
            Self::UnsupportedFileType { path, expected } => {
                lines.push(format!("File: {}", path.display()));
                lines.push(format!("Supported Extensions: {}", expected.join(", ")));
            }
            Self::SettingsSaveError { reason } => {
                lines.push(format!("Details: {}", reason));
            }
        }

        lines.join("\n")
    }
}

/// File name of `path` for display, falling back to the full path.
pub(crate) fn display_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Create an AppError from a file path and I/O error.
pub fn from_io_error(path: PathBuf, error: std::io::Error) -> AppError {
    match error.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound { path },
        std::io::ErrorKind::PermissionDenied => AppError::FileReadError {
            path,
            reason: "Permission denied".to_string(),
        },
        _ => AppError::FileReadError {
            path,
            reason: error.to_string(),
        },
    }
}

/// Create an AppError from a parse error with optional path context.
pub fn from_parse_error(path: Option<PathBuf>, error: &ParseError) -> AppError {
    let (line, column) = match error {
        ParseError::JsonSyntax(e) => extract_json_position(e),
        ParseError::InvalidLabel { .. } | ParseError::EmptyId { .. } => (None, None),
    };

    AppError::InvalidFormat {
        path,
        message: error.to_string(),
        line,
        column,
    }
}

/// Extract line and column from a serde_json::Error if available.
fn extract_json_position(error: &serde_json::Error) -> (Option<usize>, Option<usize>) {
    // line() and column() return 0 when not applicable
    let line = Some(error.line()).filter(|&l| l > 0);
    let column = Some(error.column()).filter(|&c| c > 0);
    (line, column)
}

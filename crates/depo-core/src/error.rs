//! Validation errors attached to rows and aggregate checks.
//!
//! A `DataError` is user-facing: it is shown next to the offending row so the
//! sheet can be fixed. The kind only classifies the error (for summaries and
//! filtering); control flow never branches on it.

use serde::Serialize;
use std::fmt;

/// Classification tag for a [`DataError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataErrorKind {
    InvalidInputData,
    MissingContextError,
    QuotaExceededError,
    DuplicateTitleError,
    FileNotFound,
    FileAccessError,
    InvalidFilenameFormat,
    /// The host has no native file access (no way to read local files).
    UnsupportedHost,
    NoRootDir,
    InvalidOptionError,
    InvalidTypeError,
    InvalidLengthError,
    KeywordCountError,
    CategoryCountError,
    InvalidDateError,
    InvalidJsonError,
    /// The row was stopped because the whole batch was halted or cleared.
    BatchHalted,
    UnhandledError,
}

impl DataErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DataErrorKind::InvalidInputData => "InvalidInputData",
            DataErrorKind::MissingContextError => "MissingContextError",
            DataErrorKind::QuotaExceededError => "QuotaExceededError",
            DataErrorKind::DuplicateTitleError => "DuplicateTitleError",
            DataErrorKind::FileNotFound => "FileNotFound",
            DataErrorKind::FileAccessError => "FileAccessError",
            DataErrorKind::InvalidFilenameFormat => "InvalidFilenameFormat",
            DataErrorKind::UnsupportedHost => "UnsupportedHost",
            DataErrorKind::NoRootDir => "NoRootDir",
            DataErrorKind::InvalidOptionError => "InvalidOptionError",
            DataErrorKind::InvalidTypeError => "InvalidTypeError",
            DataErrorKind::InvalidLengthError => "InvalidLengthError",
            DataErrorKind::KeywordCountError => "KeywordCountError",
            DataErrorKind::CategoryCountError => "CategoryCountError",
            DataErrorKind::InvalidDateError => "InvalidDateError",
            DataErrorKind::InvalidJsonError => "InvalidJsonError",
            DataErrorKind::BatchHalted => "BatchHalted",
            DataErrorKind::UnhandledError => "UnhandledError",
        }
    }
}

impl fmt::Display for DataErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation problem with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct DataError {
    pub message: String,
    pub kind: DataErrorKind,
}

impl DataError {
    pub fn new(kind: DataErrorKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

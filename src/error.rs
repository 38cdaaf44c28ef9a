use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to read pacman database {path}: {source}")]
    Database {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read descriptor {path}: {source}")]
    Descriptor {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("package name is missing in descriptor: {0}")]
    MissingName(PathBuf),
    #[error("invalid {field} value {value:?} in descriptor {path}")]
    InvalidNumber {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
    #[error("{}", join_errors(.0))]
    Scan(Vec<AppError>),
    #[error("cache miss: {0}")]
    CacheMiss(String),
    #[error("failed to write cache {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },
    #[error("invalid {field} filter: {reason}")]
    Filter { field: String, reason: String },
    #[error("'{0}' is not a valid field")]
    UnknownField(String),
    #[error("invalid sort: {0}")]
    Sort(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    pub(crate) fn filter(field: impl ToString, reason: impl ToString) -> Self {
        AppError::Filter {
            field: field.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn join_errors(errors: &[AppError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

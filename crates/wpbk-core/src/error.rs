//! # Error Hierarchy
//!
//! Structured error types shared across the backup kit, built with
//! `thiserror`. Crate-specific failures (archive streaming, dump rewriting)
//! live next to the code that raises them and wrap `ValidationError`
//! where a prefix or path primitive is involved.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a [`BackupConfig`](crate::BackupConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML for the expected shape.
    #[error("cannot parse config file {path}: {source}")]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying YAML failure.
        #[source]
        source: serde_yaml::Error,
    },

    /// A field holds a value outside its allowed domain.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Validation errors for domain primitive newtypes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Table prefix contains characters outside `[A-Za-z0-9_$]`.
    #[error("invalid table prefix: \"{0}\" (expected ASCII letters, digits, '_' or '$')")]
    InvalidPrefix(String),

    /// The installation base prefix may not be empty.
    #[error("base table prefix must not be empty")]
    EmptyBasePrefix,
}

use std::path::PathBuf;
use thiserror::Error;

use crate::lifecycle::status::FaxStatus;

#[derive(Error, Debug)]
pub enum FaxoError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transmission error: {0}")]
    Transmission(#[from] TransmissionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

/// Errors surfaced by transmission operations.
#[derive(Error, Debug)]
pub enum TransmissionError {
    #[error("Validation failed: {reason}")]
    Validation { reason: String },

    #[error("Illegal transition for fax {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: FaxStatus,
        to: FaxStatus,
    },

    #[error("Fax {id} cannot be retried from status {status}")]
    NotRetryable { id: String, status: FaxStatus },

    #[error("Fax {id} was updated concurrently, reload and retry the operation")]
    Conflict { id: String },

    #[error("Fax not found: {id}")]
    NotFound { id: String },

    #[error("Owner {owner} has no active fax number")]
    NoActiveNumber { owner: String },

    #[error("Store error: {0}")]
    Store(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File already exists: {0}")]
    FileExists(PathBuf),

    #[error("Document not found: {0}")]
    NotFound(PathBuf),
}

/// A notification row could not be written. Callers log this and keep the
/// transition that triggered it.
#[derive(Error, Debug)]
#[error("Failed to write '{kind}' notification for fax {fax_id}: {source}")]
pub struct NotificationWriteError {
    pub fax_id: String,
    pub kind: String,
    #[source]
    pub source: crate::db::DatabaseError,
}

pub type Result<T> = std::result::Result<T, FaxoError>;

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the share ledger.

use rusqlite::ErrorCode;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::workflow::{Attempt, Status};

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors raised by the ledger core and the registry around it.
///
/// Every balance-affecting error is raised before the enclosing SQLite
/// transaction commits, so prior state is left untouched.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Status change not allowed from the current state
    #[error("cannot {attempt}: {entity} is {from}")]
    WorkflowViolation {
        entity: &'static str,
        from: Status,
        attempt: Attempt,
    },

    #[error("transfer {id} is {status}; only pending or approved transfers can be executed")]
    InvalidTransferState { id: i64, status: Status },

    #[error("cannot transfer shares from shareholder {0} to itself")]
    SelfTransfer(String),

    #[error("insufficient shares: {shareholder} holds {available}, {requested} requested")]
    InsufficientShares {
        shareholder: String,
        available: Decimal,
        requested: Decimal,
    },

    /// Optimistic version check failed or the database stayed locked
    #[error("{0} was modified concurrently, retry the operation")]
    ConcurrentModification(String),

    #[error("{0}")]
    Validation(String),

    #[error("{entity} '{key}' not found")]
    NotFound { entity: &'static str, key: String },

    #[error("permission denied: '{0}' is not an administrator")]
    PermissionDenied(String),

    #[error("database error: {0}")]
    Database(rusqlite::Error),
}

impl LedgerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LedgerError::Validation(msg.into())
    }

    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        LedgerError::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        match e.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy) | Some(ErrorCode::DatabaseLocked) => {
                LedgerError::ConcurrentModification("database".into())
            }
            _ => LedgerError::Database(e),
        }
    }
}

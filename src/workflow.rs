// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Status lifecycle shared by ledger transactions and share transfers.
//!
//! All legality decisions go through [`TRANSITIONS`]; callers never compare
//! status strings themselves.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Draft,
    Pending,
    Approved,
    Completed,
    Rejected,
    Cancelled,
    Reversed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Submit,
    Approve,
    Complete,
    Cancel,
    Reject,
    Reverse,
}

/// What an illegal request tried to do: run an action, or move straight to a
/// status no action reaches from where the record is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Act(Action),
    MoveTo(Status),
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attempt::Act(a) => write!(f, "{}", a),
            Attempt::MoveTo(st) => write!(f, "move to {}", st),
        }
    }
}

/// `(action, legal source states, target state)`
pub const TRANSITIONS: &[(Action, &[Status], Status)] = &[
    (Action::Submit, &[Status::Draft], Status::Pending),
    (
        Action::Approve,
        &[Status::Draft, Status::Pending],
        Status::Approved,
    ),
    (
        Action::Complete,
        &[Status::Pending, Status::Approved],
        Status::Completed,
    ),
    (
        Action::Cancel,
        &[Status::Draft, Status::Pending, Status::Approved],
        Status::Cancelled,
    ),
    (
        Action::Reject,
        &[Status::Draft, Status::Pending, Status::Approved],
        Status::Rejected,
    ),
    (
        Action::Reverse,
        &[Status::Draft, Status::Pending, Status::Approved],
        Status::Reversed,
    ),
];

impl Status {
    pub const ALL: [Status; 7] = [
        Status::Draft,
        Status::Pending,
        Status::Approved,
        Status::Completed,
        Status::Rejected,
        Status::Cancelled,
        Status::Reversed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Completed => "completed",
            Status::Rejected => "rejected",
            Status::Cancelled => "cancelled",
            Status::Reversed => "reversed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Status::Completed | Status::Rejected | Status::Cancelled | Status::Reversed
        )
    }

    pub fn allows(self, action: Action) -> bool {
        TRANSITIONS
            .iter()
            .any(|(a, from, _)| *a == action && from.contains(&self))
    }

    pub fn can_be_approved(self) -> bool {
        self.allows(Action::Approve)
    }

    pub fn can_be_completed(self) -> bool {
        self.allows(Action::Complete)
    }

    pub fn can_be_cancelled(self) -> bool {
        self.allows(Action::Cancel)
    }
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Submit => "submit",
            Action::Approve => "approve",
            Action::Complete => "complete",
            Action::Cancel => "cancel",
            Action::Reject => "reject",
            Action::Reverse => "reverse",
        }
    }

    /// Submitting and cancelling are open to every actor; the rest is admin-only.
    pub fn requires_admin(self) -> bool {
        !matches!(self, Action::Submit | Action::Cancel)
    }
}

/// Applies `action` to a record of kind `entity` currently in `from`.
pub fn transition(entity: &'static str, from: Status, action: Action) -> Result<Status> {
    TRANSITIONS
        .iter()
        .find(|(a, sources, _)| *a == action && sources.contains(&from))
        .map(|(_, _, to)| *to)
        .ok_or(LedgerError::WorkflowViolation {
            entity,
            from,
            attempt: Attempt::Act(action),
        })
}

/// Resolves a save that moves `prior` (as persisted) to `next` (as requested).
///
/// Returns `None` for an unchanged status.
pub fn check(entity: &'static str, prior: Status, next: Status) -> Result<Option<Action>> {
    if prior == next {
        return Ok(None);
    }
    TRANSITIONS
        .iter()
        .find(|(_, sources, to)| *to == next && sources.contains(&prior))
        .map(|(a, _, _)| Some(*a))
        .ok_or_else(|| {
            // name the action that leads to `next`, if any does
            let attempt = TRANSITIONS
                .iter()
                .find(|(_, _, to)| *to == next)
                .map(|(a, _, _)| Attempt::Act(*a))
                .unwrap_or(Attempt::MoveTo(next));
            LedgerError::WorkflowViolation {
                entity,
                from: prior,
                attempt,
            }
        })
}

/// Which audit timestamps a status change must set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stamp {
    pub approval: bool,
    pub completion: bool,
}

impl Stamp {
    pub fn between(prior: Status, next: Status) -> Stamp {
        if prior == next {
            return Stamp::default();
        }
        Stamp {
            approval: next == Status::Approved,
            completion: next == Status::Completed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        Status::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| LedgerError::validation(format!("Unknown status '{}'", s)))
    }
}

impl ToSql for Status {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Status {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approve_from_draft_or_pending_only() {
        assert!(Status::Draft.can_be_approved());
        assert!(Status::Pending.can_be_approved());
        assert!(!Status::Approved.can_be_approved());
        assert!(!Status::Completed.can_be_approved());
    }

    #[test]
    fn complete_from_pending_or_approved_only() {
        assert!(Status::Pending.can_be_completed());
        assert!(Status::Approved.can_be_completed());
        assert!(!Status::Draft.can_be_completed());
        assert!(!Status::Cancelled.can_be_completed());
    }

    #[test]
    fn terminal_states_accept_no_action() {
        for st in Status::ALL.into_iter().filter(|s| s.is_terminal()) {
            for (action, _, _) in TRANSITIONS {
                assert!(transition("transaction", st, *action).is_err(), "{st} {action}");
            }
        }
    }

    #[test]
    fn cancel_is_open_until_completion() {
        assert!(Status::Draft.can_be_cancelled());
        assert!(Status::Approved.can_be_cancelled());
        assert!(!Status::Completed.can_be_cancelled());
    }

    #[test]
    fn check_finds_the_implied_action() {
        assert_eq!(
            check("transaction", Status::Pending, Status::Approved).unwrap(),
            Some(Action::Approve)
        );
        assert_eq!(
            check("transaction", Status::Draft, Status::Draft).unwrap(),
            None
        );
        let err = check("transaction", Status::Draft, Status::Completed).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WorkflowViolation {
                attempt: Attempt::Act(Action::Complete),
                ..
            }
        ));
        let err = check("transaction", Status::Completed, Status::Draft).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::WorkflowViolation {
                attempt: Attempt::MoveTo(Status::Draft),
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "cannot move to draft: transaction is completed"
        );
    }

    #[test]
    fn stamps_only_on_change() {
        assert_eq!(
            Stamp::between(Status::Approved, Status::Approved),
            Stamp::default()
        );
        assert!(Stamp::between(Status::Draft, Status::Approved).approval);
        assert!(Stamp::between(Status::Approved, Status::Completed).completion);
        assert!(!Stamp::between(Status::Approved, Status::Completed).approval);
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("PENDING".parse::<Status>().unwrap(), Status::Pending);
        assert!("done".parse::<Status>().is_err());
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Transfer orchestrator.
//!
//! A transfer never touches balances itself. Executing it posts a completed
//! TRANSFER_OUT on the seller and a completed TRANSFER_IN on the buyer, both
//! through the ledger, inside one IMMEDIATE SQLite transaction.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::{Actor, require_admin};
use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{
    NewTransaction, NewTransfer, ShareTransfer, Transaction, TransactionType, total_amount,
};
use crate::shareholders;
use crate::utils::{decimal_col, opt_decimal_col};
use crate::workflow::{self, Action, Stamp, Status};

const ENTITY: &str = "transfer";

const COLUMNS: &str = "id, from_shareholder_id, to_shareholder_id, shares, price_per_share, \
    total_amount, transfer_date, entry_date, status, approved_at, approved_by, completed_at, \
    completed_by, out_transaction_id, in_transaction_id, notes, created_by, version";

fn from_row(r: &Row<'_>) -> rusqlite::Result<ShareTransfer> {
    Ok(ShareTransfer {
        id: r.get(0)?,
        from_shareholder_id: r.get(1)?,
        to_shareholder_id: r.get(2)?,
        shares: decimal_col(r, 3)?,
        price_per_share: opt_decimal_col(r, 4)?,
        total_amount: opt_decimal_col(r, 5)?,
        transfer_date: r.get(6)?,
        entry_date: r.get(7)?,
        status: r.get(8)?,
        approved_at: r.get(9)?,
        approved_by: r.get(10)?,
        completed_at: r.get(11)?,
        completed_by: r.get(12)?,
        out_transaction_id: r.get(13)?,
        in_transaction_id: r.get(14)?,
        notes: r.get(15)?,
        created_by: r.get(16)?,
        version: r.get(17)?,
    })
}

/// What a successful execution produced.
#[derive(Debug, Clone, Serialize)]
pub struct TransferReceipt {
    pub transfer: ShareTransfer,
    pub debit: Transaction,
    pub credit: Transaction,
}

/// Records a DRAFT transfer. Self-transfers are refused before anything is written.
pub fn create(conn: &Connection, new: &NewTransfer, actor: &Actor) -> Result<ShareTransfer> {
    if new.shares <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "Shares must be positive, got {}",
            new.shares
        )));
    }
    if matches!(new.price_per_share, Some(p) if p < Decimal::ZERO) {
        return Err(LedgerError::validation("Price per share cannot be negative"));
    }
    let from = shareholders::get(conn, new.from_shareholder_id)?;
    if new.from_shareholder_id == new.to_shareholder_id {
        return Err(LedgerError::SelfTransfer(from.id_number));
    }
    let to = shareholders::get(conn, new.to_shareholder_id)?;
    for s in [&from, &to] {
        if !s.is_active {
            return Err(LedgerError::validation(format!(
                "Shareholder {} is inactive",
                s.id_number
            )));
        }
    }

    conn.execute(
        "INSERT INTO share_transfers(from_shareholder_id, to_shareholder_id, shares,
            price_per_share, total_amount, transfer_date, entry_date, status, notes, created_by)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)",
        params![
            from.id,
            to.id,
            new.shares.to_string(),
            new.price_per_share.map(|p| p.to_string()),
            total_amount(new.shares, new.price_per_share).map(|t| t.to_string()),
            new.transfer_date,
            Utc::now(),
            Status::Draft,
            new.notes,
            actor.name,
        ],
    )?;
    let id = conn.last_insert_rowid();
    log::info!(
        "{} drafted transfer #{}: {} shares {} -> {}",
        actor.name,
        id,
        new.shares,
        from.id_number,
        to.id_number
    );
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> Result<ShareTransfer> {
    conn.query_row(
        &format!("SELECT {} FROM share_transfers WHERE id=?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(ENTITY, id))
}

#[derive(Debug, Clone, Default)]
pub struct TransferFilter {
    pub status: Option<Status>,
    /// Either side of the transfer.
    pub shareholder_id: Option<i64>,
    pub limit: Option<usize>,
}

pub fn list(conn: &Connection, f: &TransferFilter) -> Result<Vec<ShareTransfer>> {
    let mut sql = format!("SELECT {} FROM share_transfers WHERE 1=1", COLUMNS);
    let mut args: Vec<Value> = Vec::new();
    if let Some(st) = f.status {
        sql.push_str(" AND status=?");
        args.push(Value::Text(st.as_str().to_string()));
    }
    if let Some(id) = f.shareholder_id {
        sql.push_str(" AND (from_shareholder_id=? OR to_shareholder_id=?)");
        args.push(Value::Integer(id));
        args.push(Value::Integer(id));
    }
    sql.push_str(" ORDER BY entry_date DESC, id DESC");
    if let Some(limit) = f.limit {
        sql.push_str(" LIMIT ?");
        args.push(Value::Integer(limit as i64));
    }
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args), from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Plain status moves (submit, approve, cancel, reject, reverse). Completing
/// a transfer means executing it.
pub fn advance(
    conn: &mut Connection,
    id: i64,
    action: Action,
    actor: &Actor,
) -> Result<ShareTransfer> {
    if action == Action::Complete {
        return execute(conn, id, actor).map(|r| r.transfer);
    }
    if action.requires_admin() {
        require_admin(actor)?;
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let t = get(&tx, id)?;
    let next = workflow::transition(ENTITY, t.status, action)?;
    let stamp = Stamp::between(t.status, next);
    let (approved_at, approved_by) = if stamp.approval {
        (Some(Utc::now()), Some(actor.name.clone()))
    } else {
        (t.approved_at, t.approved_by.clone())
    };
    let n = tx.execute(
        "UPDATE share_transfers SET status=?1, approved_at=?2, approved_by=?3, version=version+1
         WHERE id=?4 AND version=?5",
        params![next, approved_at, approved_by, id, t.version],
    )?;
    if n == 0 {
        return Err(LedgerError::ConcurrentModification(format!("transfer {}", id)));
    }
    tx.commit()?;
    log::info!(
        "{} moved transfer #{} {} -> {} ({})",
        actor.name,
        id,
        t.status,
        next,
        action
    );
    get(conn, id)
}

pub fn submit(conn: &mut Connection, id: i64, actor: &Actor) -> Result<ShareTransfer> {
    advance(conn, id, Action::Submit, actor)
}

pub fn approve(conn: &mut Connection, id: i64, actor: &Actor) -> Result<ShareTransfer> {
    advance(conn, id, Action::Approve, actor)
}

pub fn cancel(conn: &mut Connection, id: i64, actor: &Actor) -> Result<ShareTransfer> {
    advance(conn, id, Action::Cancel, actor)
}

pub fn reject(conn: &mut Connection, id: i64, actor: &Actor) -> Result<ShareTransfer> {
    advance(conn, id, Action::Reject, actor)
}

pub fn reverse(conn: &mut Connection, id: i64, actor: &Actor) -> Result<ShareTransfer> {
    advance(conn, id, Action::Reverse, actor)
}

/// Executes a pending or approved transfer as one all-or-nothing unit.
///
/// Preconditions are checked in order: state, distinct parties, both holders
/// still active, sufficient shares. Any failure drops the SQLite transaction, so neither balance moves
/// and no ledger rows remain.
pub fn execute(conn: &mut Connection, id: i64, actor: &Actor) -> Result<TransferReceipt> {
    require_admin(actor)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let t = get(&tx, id)?;
    if !t.status.can_be_completed() {
        return Err(LedgerError::InvalidTransferState {
            id,
            status: t.status,
        });
    }
    let from = shareholders::get(&tx, t.from_shareholder_id)?;
    if t.from_shareholder_id == t.to_shareholder_id {
        return Err(LedgerError::SelfTransfer(from.id_number));
    }
    let to = shareholders::get(&tx, t.to_shareholder_id)?;
    for s in [&from, &to] {
        if !s.is_active {
            return Err(LedgerError::validation(format!(
                "Shareholder {} is inactive",
                s.id_number
            )));
        }
    }
    if from.total_shares < t.shares {
        log::warn!(
            "transfer #{} refused: {} holds {}, {} requested",
            id,
            from.id_number,
            from.total_shares,
            t.shares
        );
        return Err(LedgerError::InsufficientShares {
            shareholder: from.id_number,
            available: from.total_shares,
            requested: t.shares,
        });
    }

    let leg = |holder_id: i64, kind: TransactionType| NewTransaction {
        shareholder_id: holder_id,
        kind,
        effect: None,
        shares: t.shares,
        price_per_share: t.price_per_share,
        transaction_date: t.transfer_date,
        transfer_id: Some(t.id),
        reference: Some(format!("TRF-{}", t.id)),
        notes: t.notes.clone(),
    };
    let debit = ledger::post(&tx, &leg(from.id, TransactionType::TransferOut), actor)?;
    let credit = ledger::post(&tx, &leg(to.id, TransactionType::TransferIn), actor)?;

    let n = tx.execute(
        "UPDATE share_transfers SET status=?1, completed_at=?2, completed_by=?3,
            out_transaction_id=?4, in_transaction_id=?5, version=version+1
         WHERE id=?6 AND version=?7",
        params![
            Status::Completed,
            Utc::now(),
            actor.name,
            debit.id,
            credit.id,
            id,
            t.version
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::ConcurrentModification(format!("transfer {}", id)));
    }
    tx.commit()?;
    log::info!(
        "{} executed transfer #{}: {} shares {} -> {}",
        actor.name,
        id,
        t.shares,
        from.id_number,
        to.id_number
    );
    Ok(TransferReceipt {
        transfer: get(conn, id)?,
        debit,
        credit,
    })
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ledger entry store.
//!
//! Every status change of a transaction goes through [`save_in`], which
//! compares the persisted status with the requested one, stamps audit dates,
//! and applies the balance effect exactly once on entering COMPLETED.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;

use crate::auth::{Actor, require_admin};
use crate::balance;
use crate::error::{LedgerError, Result};
use crate::models::{Effect, NewTransaction, Transaction, TransactionType, total_amount};
use crate::shareholders;
use crate::utils::{decimal_col, opt_decimal_col};
use crate::workflow::{self, Action, Stamp, Status};

const ENTITY: &str = "transaction";

const COLUMNS: &str = "id, shareholder_id, kind, effect, status, shares, price_per_share, \
    total_amount, transaction_date, entry_date, approval_date, approved_by, completion_date, \
    completed_by, transfer_id, reference, notes, created_by, version";

pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        shareholder_id: r.get(1)?,
        kind: r.get(2)?,
        effect: r.get(3)?,
        status: r.get(4)?,
        shares: decimal_col(r, 5)?,
        price_per_share: opt_decimal_col(r, 6)?,
        total_amount: opt_decimal_col(r, 7)?,
        transaction_date: r.get(8)?,
        entry_date: r.get(9)?,
        approval_date: r.get(10)?,
        approved_by: r.get(11)?,
        completion_date: r.get(12)?,
        completed_by: r.get(13)?,
        transfer_id: r.get(14)?,
        reference: r.get(15)?,
        notes: r.get(16)?,
        created_by: r.get(17)?,
        version: r.get(18)?,
    })
}

/// Fixed-effect types reject a conflicting explicit effect; ADJUSTMENT needs one.
pub fn resolve_effect(kind: TransactionType, requested: Option<Effect>) -> Result<Effect> {
    match (kind.fixed_effect(), requested) {
        (Some(fixed), None) => Ok(fixed),
        (Some(fixed), Some(req)) if fixed == req => Ok(fixed),
        (Some(fixed), Some(req)) => Err(LedgerError::validation(format!(
            "{} entries are always {}, not {}",
            kind, fixed, req
        ))),
        (None, Some(Effect::Neutral)) | (None, None) => Err(LedgerError::validation(format!(
            "{} entries must state whether they credit or debit the holder",
            kind
        ))),
        (None, Some(req)) => Ok(req),
    }
}

fn validate(new: &NewTransaction) -> Result<Effect> {
    if new.shares <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "Shares must be positive, got {}",
            new.shares
        )));
    }
    if matches!(new.price_per_share, Some(p) if p < Decimal::ZERO) {
        return Err(LedgerError::validation("Price per share cannot be negative"));
    }
    resolve_effect(new.kind, new.effect)
}

fn insert(
    conn: &Connection,
    new: &NewTransaction,
    effect: Effect,
    status: Status,
    now: DateTime<Utc>,
    actor: &Actor,
) -> Result<i64> {
    let completed = status == Status::Completed;
    let stamp_at = completed.then_some(now);
    let stamp_by = completed.then(|| actor.name.clone());
    conn.execute(
        "INSERT INTO transactions(shareholder_id, kind, effect, status, shares, price_per_share,
            total_amount, transaction_date, entry_date, approval_date, approved_by,
            completion_date, completed_by, transfer_id, reference, notes, created_by)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
        params![
            new.shareholder_id,
            new.kind,
            effect,
            status,
            new.shares.to_string(),
            new.price_per_share.map(|p| p.to_string()),
            total_amount(new.shares, new.price_per_share).map(|t| t.to_string()),
            new.transaction_date,
            now,
            stamp_at,
            stamp_by,
            stamp_at,
            stamp_by,
            new.transfer_id,
            new.reference,
            new.notes,
            actor.name,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Records a new DRAFT entry. No balance effect until it completes.
pub fn create(conn: &Connection, new: &NewTransaction, actor: &Actor) -> Result<Transaction> {
    let effect = validate(new)?;
    let holder = shareholders::get(conn, new.shareholder_id)?;
    let id = insert(conn, new, effect, Status::Draft, Utc::now(), actor)?;
    log::info!(
        "{} recorded draft {} of {} shares for {} (#{})",
        actor.name,
        new.kind,
        new.shares,
        holder.id_number,
        id
    );
    get(conn, id)
}

/// Records an entry directly as COMPLETED and applies its delta.
///
/// Must run inside the caller's SQLite transaction; used for transfer legs
/// and opening balances.
pub fn post(conn: &Connection, new: &NewTransaction, actor: &Actor) -> Result<Transaction> {
    let effect = validate(new)?;
    shareholders::get(conn, new.shareholder_id)?;
    // balance check first so a rejected debit writes nothing
    balance::apply_delta(conn, new.shareholder_id, effect.signed(new.shares))?;
    let id = insert(conn, new, effect, Status::Completed, Utc::now(), actor)?;
    log::debug!(
        "posted completed {} of {} shares for shareholder {} (#{})",
        new.kind,
        new.shares,
        new.shareholder_id,
        id
    );
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(
        &format!("SELECT {} FROM transactions WHERE id=?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found(ENTITY, id))
}

/// Saves `t` in its own IMMEDIATE transaction.
pub fn save(conn: &mut Connection, t: &mut Transaction, actor: &Actor) -> Result<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    save_in(&tx, t, actor)?;
    tx.commit()?;
    Ok(())
}

/// Terms an approval covers; they are frozen once a record reaches APPROVED.
fn approved_terms_changed(stored: &Transaction, next: &Transaction) -> bool {
    stored.shareholder_id != next.shareholder_id
        || stored.kind != next.kind
        || stored.effect != next.effect
        || stored.shares != next.shares
        || stored.price_per_share != next.price_per_share
}

/// The authoritative save path. `t` is only updated once the row is written.
///
/// Audit stamps and the entry date always come from the stored row; only a
/// status change may set them.
pub fn save_in(conn: &Connection, t: &mut Transaction, actor: &Actor) -> Result<()> {
    let stored = get(conn, t.id)?;
    let (prior, version) = (stored.status, stored.version);
    if version != t.version {
        return Err(LedgerError::ConcurrentModification(format!(
            "transaction {}",
            t.id
        )));
    }

    let action = workflow::check(ENTITY, prior, t.status)?;
    if action.is_some_and(Action::requires_admin) {
        require_admin(actor)?;
    }

    if prior.is_terminal() {
        // settled entries only take annotations
        let n = conn.execute(
            "UPDATE transactions SET reference=?1, notes=?2, version=version+1
             WHERE id=?3 AND version=?4",
            params![t.reference, t.notes, t.id, version],
        )?;
        if n == 0 {
            return Err(LedgerError::ConcurrentModification(format!(
                "transaction {}",
                t.id
            )));
        }
        let mut next = stored;
        next.reference = t.reference.clone();
        next.notes = t.notes.clone();
        next.version += 1;
        *t = next;
        return Ok(());
    }

    if prior == Status::Approved && approved_terms_changed(&stored, t) {
        return Err(LedgerError::validation(format!(
            "transaction #{} is approved; holder, type, effect, shares and price can no longer change",
            t.id
        )));
    }

    let mut next = t.clone();
    next.entry_date = stored.entry_date;
    next.created_by = stored.created_by;
    next.approval_date = stored.approval_date;
    next.approved_by = stored.approved_by;
    next.completion_date = stored.completion_date;
    next.completed_by = stored.completed_by;

    if next.shares <= Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "Shares must be positive, got {}",
            next.shares
        )));
    }
    next.effect = resolve_effect(next.kind, Some(next.effect))?;
    next.recompute_total();

    let stamp = Stamp::between(prior, next.status);
    let now = Utc::now();
    if stamp.approval {
        next.approval_date = Some(now);
        next.approved_by = Some(actor.name.clone());
    }
    if stamp.completion {
        next.completion_date = Some(now);
        next.completed_by = Some(actor.name.clone());
        balance::apply_delta(conn, next.shareholder_id, next.signed_delta())?;
    }

    let n = conn.execute(
        "UPDATE transactions SET shareholder_id=?1, kind=?2, effect=?3, status=?4, shares=?5,
            price_per_share=?6, total_amount=?7, transaction_date=?8, approval_date=?9,
            approved_by=?10, completion_date=?11, completed_by=?12, reference=?13, notes=?14,
            version=version+1
         WHERE id=?15 AND version=?16",
        params![
            next.shareholder_id,
            next.kind,
            next.effect,
            next.status,
            next.shares.to_string(),
            next.price_per_share.map(|p| p.to_string()),
            next.total_amount.map(|p| p.to_string()),
            next.transaction_date,
            next.approval_date,
            next.approved_by,
            next.completion_date,
            next.completed_by,
            next.reference,
            next.notes,
            next.id,
            version
        ],
    )?;
    if n == 0 {
        return Err(LedgerError::ConcurrentModification(format!(
            "transaction {}",
            t.id
        )));
    }
    next.version += 1;
    if let Some(a) = action {
        log::info!(
            "{} moved transaction #{} {} -> {} ({})",
            actor.name,
            next.id,
            prior,
            next.status,
            a
        );
    }
    *t = next;
    Ok(())
}

pub fn advance(conn: &mut Connection, id: i64, action: Action, actor: &Actor) -> Result<Transaction> {
    if action.requires_admin() {
        require_admin(actor)?;
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut t = get(&tx, id)?;
    t.status = workflow::transition(ENTITY, t.status, action)?;
    save_in(&tx, &mut t, actor)?;
    tx.commit()?;
    Ok(t)
}

pub fn submit(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Submit, actor)
}

pub fn approve(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Approve, actor)
}

pub fn complete(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Complete, actor)
}

pub fn cancel(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Cancel, actor)
}

pub fn reject(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Reject, actor)
}

pub fn reverse(conn: &mut Connection, id: i64, actor: &Actor) -> Result<Transaction> {
    advance(conn, id, Action::Reverse, actor)
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub shareholder_id: Option<i64>,
    pub status: Option<Status>,
    pub transfer_id: Option<i64>,
    pub limit: Option<usize>,
}

/// Newest entries first.
pub fn list(conn: &Connection, f: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {} FROM transactions WHERE 1=1", COLUMNS);
    let mut args: Vec<Value> = Vec::new();
    if let Some(id) = f.shareholder_id {
        sql.push_str(" AND shareholder_id=?");
        args.push(Value::Integer(id));
    }
    if let Some(st) = f.status {
        sql.push_str(" AND status=?");
        args.push(Value::Text(st.as_str().to_string()));
    }
    if let Some(id) = f.transfer_id {
        sql.push_str(" AND transfer_id=?");
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

/// Sum of signed deltas over the holder's COMPLETED entries.
pub fn current_balance(conn: &Connection, shareholder_id: i64) -> Result<Decimal> {
    let mut stmt = conn.prepare_cached(
        "SELECT effect, shares FROM transactions WHERE shareholder_id=?1 AND status=?2",
    )?;
    let rows = stmt.query_map(params![shareholder_id, Status::Completed], |r| {
        Ok((r.get::<_, Effect>(0)?, decimal_col(r, 1)?))
    })?;
    let mut total = Decimal::ZERO;
    for row in rows {
        let (effect, shares) = row?;
        total += effect.signed(shares);
    }
    Ok(total)
}

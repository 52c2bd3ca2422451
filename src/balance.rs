// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance projector.
//!
//! `shareholders.total_shares` is a cache of completed ledger entries.
//! [`apply_delta`] is the only routine that moves it outside an explicit
//! [`reconcile`] repair. Listings read the cache and reports recompute from
//! the ledger.

use std::collections::HashMap;

use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::auth::{Actor, require_admin};
use crate::error::{LedgerError, Result};
use crate::models::{Effect, Shareholder};
use crate::shareholders;
use crate::utils::decimal_col;
use crate::workflow::Status;

/// Moves the cached balance by `delta` and returns the new balance.
///
/// Fails closed on a negative result, and on a version mismatch between the
/// read and the write.
pub fn apply_delta(conn: &Connection, shareholder_id: i64, delta: Decimal) -> Result<Decimal> {
    let (id_number, current, version): (String, Decimal, i64) = conn
        .query_row(
            "SELECT id_number, total_shares, version FROM shareholders WHERE id=?1",
            params![shareholder_id],
            |r| Ok((r.get(0)?, decimal_col(r, 1)?, r.get(2)?)),
        )
        .optional()?
        .ok_or_else(|| LedgerError::not_found("shareholder", shareholder_id))?;
    if delta.is_zero() {
        return Ok(current);
    }
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(LedgerError::validation(format!(
            "{} holds {} shares; applying {} would leave a negative balance",
            id_number, current, delta
        )));
    }
    let n = conn.execute(
        "UPDATE shareholders SET total_shares=?1, version=version+1 WHERE id=?2 AND version=?3",
        params![next.to_string(), shareholder_id, version],
    )?;
    if n == 0 {
        return Err(LedgerError::ConcurrentModification(format!(
            "shareholder {}",
            id_number
        )));
    }
    log::debug!("{} balance {} -> {}", id_number, current, next);
    Ok(next)
}

pub fn cached_balance(conn: &Connection, shareholder_id: i64) -> Result<Decimal> {
    Ok(shareholders::get(conn, shareholder_id)?.total_shares)
}

/// Authoritative balance, recomputed from the ledger.
pub fn ledger_balance(conn: &Connection, shareholder_id: i64) -> Result<Decimal> {
    crate::ledger::current_balance(conn, shareholder_id)
}

/// `part / total × 100`, or 0 when nothing is outstanding.
pub fn percentage_of(part: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        Decimal::ZERO
    } else {
        part / total * Decimal::ONE_HUNDRED
    }
}

pub fn ownership_percentage(holder: &Shareholder, all: &[Shareholder]) -> Decimal {
    let total: Decimal = all.iter().map(|s| s.total_shares).sum();
    percentage_of(holder.total_shares, total)
}

#[derive(Debug, Clone, Serialize)]
pub struct Holding {
    pub id_number: String,
    pub full_name: String,
    pub total_shares: Decimal,
    pub ownership_percentage: Decimal,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Register {
    pub holdings: Vec<Holding>,
    pub total_shares: Decimal,
    pub holder_count: usize,
    pub average_holding: Decimal,
}

/// Share register from the cached balances, ordered by name.
pub fn register(conn: &Connection) -> Result<Register> {
    let all = shareholders::list(conn, true)?;
    let total_shares: Decimal = all.iter().map(|s| s.total_shares).sum();
    let holdings: Vec<Holding> = all
        .iter()
        .map(|s| Holding {
            id_number: s.id_number.clone(),
            full_name: s.full_name.clone(),
            total_shares: s.total_shares,
            ownership_percentage: ownership_percentage(s, &all).round_dp(2),
            is_active: s.is_active,
        })
        .collect();
    let holder_count = holdings.len();
    let average_holding = if holder_count == 0 {
        Decimal::ZERO
    } else {
        (total_shares / Decimal::from(holder_count as u64)).round_dp(2)
    };
    Ok(Register {
        holdings,
        total_shares,
        holder_count,
        average_holding,
    })
}

/// Ledger balances for every holder with at least one completed entry.
pub fn ledger_balances(conn: &Connection) -> Result<HashMap<i64, Decimal>> {
    let mut stmt =
        conn.prepare("SELECT shareholder_id, effect, shares FROM transactions WHERE status=?1")?;
    let rows = stmt.query_map(params![Status::Completed], |r| {
        Ok((
            r.get::<_, i64>(0)?,
            r.get::<_, Effect>(1)?,
            decimal_col(r, 2)?,
        ))
    })?;
    let mut out: HashMap<i64, Decimal> = HashMap::new();
    for row in rows {
        let (id, effect, shares) = row?;
        *out.entry(id).or_default() += effect.signed(shares);
    }
    Ok(out)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Discrepancy {
    pub shareholder_id: i64,
    pub id_number: String,
    pub cached: Decimal,
    pub ledger: Decimal,
}

/// Compares every cached balance with the ledger. With `fix`, overwrites the
/// cache with the ledger value in the same transaction.
pub fn reconcile(conn: &mut Connection, actor: &Actor, fix: bool) -> Result<Vec<Discrepancy>> {
    if fix {
        require_admin(actor)?;
    }
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let ledger = ledger_balances(&tx)?;
    let mut found = Vec::new();
    for s in shareholders::list(&tx, true)? {
        let expected = ledger.get(&s.id).copied().unwrap_or_default();
        if expected == s.total_shares {
            continue;
        }
        log::warn!(
            "balance mismatch for {}: cached {}, ledger {}",
            s.id_number,
            s.total_shares,
            expected
        );
        if fix {
            tx.execute(
                "UPDATE shareholders SET total_shares=?1, version=version+1 WHERE id=?2",
                params![expected.to_string(), s.id],
            )?;
            log::warn!("{} reset {} to {}", actor.name, s.id_number, expected);
        }
        found.push(Discrepancy {
            shareholder_id: s.id,
            id_number: s.id_number,
            cached: s.total_shares,
            ledger: expected,
        });
    }
    tx.commit()?;
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(percentage_of(Decimal::from(5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            percentage_of(Decimal::from(30), Decimal::from(120)),
            Decimal::from(25)
        );
    }
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance;
use crate::directors;
use crate::ledger::{self, TransactionFilter};
use crate::shareholders;
use crate::utils::{fmt_shares, maybe_print_json, pretty_table};
use anyhow::Result;
use chrono::{Duration, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

const RECENT: usize = 5;
const NEW_HOLDER_WINDOW_DAYS: i64 = 30;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("dashboard", sub)) => print_dashboard(conn, sub)?,
        Some(("register", sub)) => print_register(conn, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct RecentEntry {
    pub id: i64,
    pub date: String,
    pub shareholder: String,
    pub kind: String,
    pub shares: Decimal,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub total_shareholders: usize,
    pub active_shareholders: usize,
    pub active_directors: i64,
    pub total_shares: Decimal,
    pub new_shareholders: i64,
    pub awaiting_approval: i64,
    pub recent_transactions: Vec<RecentEntry>,
}

/// Headline figures from the cached balances.
pub fn dashboard(conn: &Connection) -> Result<Dashboard> {
    let all = shareholders::list(conn, true)?;
    let since = Utc::now().date_naive() - Duration::days(NEW_HOLDER_WINDOW_DAYS);
    let open_tx: i64 = conn.query_row(
        "SELECT COUNT(*) FROM transactions WHERE status IN ('draft','pending','approved')",
        [],
        |r| r.get(0),
    )?;
    let open_transfers: i64 = conn.query_row(
        "SELECT COUNT(*) FROM share_transfers WHERE status IN ('draft','pending','approved')",
        [],
        |r| r.get(0),
    )?;
    let recent_transactions = ledger::list(
        conn,
        &TransactionFilter {
            limit: Some(RECENT),
            ..Default::default()
        },
    )?
    .into_iter()
    .map(|t| RecentEntry {
        id: t.id,
        date: t.transaction_date.to_string(),
        shareholder: all
            .iter()
            .find(|s| s.id == t.shareholder_id)
            .map(|s| s.full_name.clone())
            .unwrap_or_default(),
        kind: t.kind.to_string(),
        shares: t.shares,
        status: t.status.to_string(),
    })
    .collect();

    Ok(Dashboard {
        total_shareholders: all.len(),
        active_shareholders: all.iter().filter(|s| s.is_active).count(),
        active_directors: directors::count_active(conn)?,
        total_shares: all.iter().map(|s| s.total_shares).sum(),
        new_shareholders: shareholders::count_joined_since(conn, since)?,
        awaiting_approval: open_tx + open_transfers,
        recent_transactions,
    })
}

fn print_dashboard(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let d = dashboard(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &d)? {
        return Ok(());
    }
    let summary = vec![
        vec![
            "Shareholders".to_string(),
            format!("{} ({} active)", d.total_shareholders, d.active_shareholders),
        ],
        vec!["Active directors".into(), d.active_directors.to_string()],
        vec!["Shares outstanding".into(), fmt_shares(&d.total_shares)],
        vec![
            format!("New shareholders ({}d)", NEW_HOLDER_WINDOW_DAYS),
            d.new_shareholders.to_string(),
        ],
        vec!["Awaiting approval".into(), d.awaiting_approval.to_string()],
    ];
    println!("{}", pretty_table(&["Metric", "Value"], summary));
    let rows = d
        .recent_transactions
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.date.clone(),
                r.shareholder.clone(),
                r.kind.clone(),
                fmt_shares(&r.shares),
                r.status.clone(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["#", "Date", "Shareholder", "Type", "Shares", "Status"], rows)
    );
    Ok(())
}

fn print_register(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let reg = balance::register(conn)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &reg.holdings)? {
        return Ok(());
    }
    let rows = reg
        .holdings
        .iter()
        .map(|h| {
            vec![
                h.id_number.clone(),
                h.full_name.clone(),
                fmt_shares(&h.total_shares),
                format!("{:.2}%", h.ownership_percentage),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Name", "Shares", "Ownership"], rows)
    );
    println!(
        "{} holders, {} shares outstanding, average holding {}",
        reg.holder_count,
        fmt_shares(&reg.total_shares),
        fmt_shares(&reg.average_holding)
    );
    Ok(())
}

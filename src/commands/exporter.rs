// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::balance;
use crate::ledger::{self, TransactionFilter};
use crate::shareholders;
use crate::utils::{fmt_opt, fmt_shares};
use anyhow::{Result, anyhow};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("register", sub)) => export_register(conn, sub),
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn format_and_out(sub: &clap::ArgMatches) -> Result<(String, String)> {
    let fmt = sub
        .get_one::<String>("format")
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_else(|| "csv".to_string());
    if fmt != "csv" && fmt != "json" {
        return Err(anyhow!("Unknown format: {} (use csv|json)", fmt));
    }
    let out = sub.get_one::<String>("out").unwrap().trim().to_string();
    Ok((fmt, out))
}

fn export_register(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_and_out(sub)?;
    let reg = balance::register(conn)?;
    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record(["id_number", "full_name", "shares", "ownership_pct", "active"])?;
            for h in &reg.holdings {
                wtr.write_record([
                    h.id_number.clone(),
                    h.full_name.clone(),
                    fmt_shares(&h.total_shares),
                    format!("{:.2}", h.ownership_percentage),
                    h.is_active.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            std::fs::write(&out, serde_json::to_string_pretty(&reg)?)?;
        }
    }
    println!("Exported share register to {}", out);
    Ok(())
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (fmt, out) = format_and_out(sub)?;
    let names: HashMap<i64, String> = shareholders::list(conn, true)?
        .into_iter()
        .map(|s| (s.id, s.id_number))
        .collect();
    let mut rows = ledger::list(conn, &TransactionFilter::default())?;
    // oldest first reads better in a history file
    rows.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(&out)?;
            wtr.write_record([
                "id",
                "date",
                "shareholder",
                "type",
                "effect",
                "shares",
                "price_per_share",
                "total_amount",
                "status",
                "reference",
            ])?;
            for t in &rows {
                wtr.write_record([
                    t.id.to_string(),
                    t.transaction_date.to_string(),
                    names.get(&t.shareholder_id).cloned().unwrap_or_default(),
                    t.kind.to_string(),
                    t.effect.to_string(),
                    fmt_shares(&t.shares),
                    fmt_opt(&t.price_per_share),
                    fmt_opt(&t.total_amount),
                    t.status.to_string(),
                    fmt_opt(&t.reference),
                ])?;
            }
            wtr.flush()?;
        }
        _ => {
            let items: Vec<_> = rows
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "date": t.transaction_date.to_string(),
                        "shareholder": names.get(&t.shareholder_id),
                        "type": t.kind,
                        "effect": t.effect,
                        "shares": fmt_shares(&t.shares),
                        "price_per_share": t.price_per_share.map(|p| p.to_string()),
                        "total_amount": t.total_amount.map(|p| p.to_string()),
                        "status": t.status,
                        "reference": t.reference,
                    })
                })
                .collect();
            std::fs::write(&out, serde_json::to_string_pretty(&items)?)?;
        }
    }
    println!("Exported {} transactions to {}", rows.len(), out);
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::commands::transactions::action_for;
use crate::models::NewTransfer;
use crate::shareholders;
use crate::transfers::{self, TransferFilter};
use crate::utils::{
    fmt_opt, fmt_shares, maybe_print_json, opt_arg, parse_date, parse_decimal, parse_shares,
    pretty_table, req_arg,
};
use crate::workflow::Status;
use anyhow::Result;
use rusqlite::Connection;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => create(conn, actor, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("execute", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let receipt = transfers::execute(conn, id, actor)?;
            println!(
                "Executed transfer #{}: {} shares (ledger entries #{} out, #{} in)",
                receipt.transfer.id,
                fmt_shares(&receipt.transfer.shares),
                receipt.debit.id,
                receipt.credit.id
            );
        }
        Some((name, sub)) => {
            if let Some(action) = action_for(name) {
                let id = *sub.get_one::<i64>("id").unwrap();
                let t = transfers::advance(conn, id, action, actor)?;
                println!("Transfer #{} is now {}", t.id, t.status);
            }
        }
        _ => {}
    }
    Ok(())
}

fn create(conn: &Connection, actor: &Actor, sub: &clap::ArgMatches) -> Result<()> {
    let from = shareholders::get_by_id_number(conn, &req_arg(sub, "from")?)?;
    let to = shareholders::get_by_id_number(conn, &req_arg(sub, "to")?)?;
    let new = NewTransfer {
        from_shareholder_id: from.id,
        to_shareholder_id: to.id,
        shares: parse_shares(&req_arg(sub, "shares")?)?,
        price_per_share: opt_arg(sub, "price")
            .map(|p| parse_decimal(&p))
            .transpose()?,
        transfer_date: match opt_arg(sub, "date") {
            Some(d) => parse_date(&d)?,
            None => chrono::Utc::now().date_naive(),
        },
        notes: opt_arg(sub, "note"),
    };
    let t = transfers::create(conn, &new, actor)?;
    println!(
        "Recorded draft transfer #{}: {} shares {} -> {}",
        t.id,
        fmt_shares(&t.shares),
        from.id_number,
        to.id_number
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let filter = TransferFilter {
        status: opt_arg(sub, "status")
            .map(|s| s.parse::<Status>())
            .transpose()?,
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    let data = transfers::list(conn, &filter)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let names: HashMap<i64, String> = shareholders::list(conn, true)?
        .into_iter()
        .map(|s| (s.id, s.id_number))
        .collect();
    let name = |id: i64| names.get(&id).cloned().unwrap_or_default();
    let rows = data
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.transfer_date.to_string(),
                name(t.from_shareholder_id),
                name(t.to_shareholder_id),
                fmt_shares(&t.shares),
                fmt_opt(&t.total_amount),
                t.status.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["#", "Date", "From", "To", "Shares", "Amount", "Status"], rows)
    );
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::ledger::{self, TransactionFilter};
use crate::models::{Effect, NewTransaction, TransactionType};
use crate::shareholders;
use crate::utils::{
    fmt_opt, fmt_shares, maybe_print_json, opt_arg, parse_date, parse_decimal, parse_shares,
    pretty_table, req_arg,
};
use crate::workflow::{Action, Status};
use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::HashMap;

pub fn handle(conn: &mut Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("create", sub)) => create(conn, actor, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some((name, sub)) => {
            if let Some(action) = action_for(name) {
                let id = *sub.get_one::<i64>("id").unwrap();
                let t = ledger::advance(conn, id, action, actor)?;
                println!("Transaction #{} is now {}", t.id, t.status);
            }
        }
        _ => {}
    }
    Ok(())
}

pub(crate) fn action_for(name: &str) -> Option<Action> {
    match name {
        "submit" => Some(Action::Submit),
        "approve" => Some(Action::Approve),
        "complete" => Some(Action::Complete),
        "cancel" => Some(Action::Cancel),
        "reject" => Some(Action::Reject),
        "reverse" => Some(Action::Reverse),
        _ => None,
    }
}

fn create(conn: &Connection, actor: &Actor, sub: &clap::ArgMatches) -> Result<()> {
    let holder = shareholders::get_by_id_number(conn, &req_arg(sub, "shareholder")?)?;
    let kind = req_arg(sub, "type")?.parse::<TransactionType>()?;
    let shares = parse_shares(&req_arg(sub, "shares")?)?;
    let mut new = NewTransaction::new(holder.id, kind, shares);
    new.price_per_share = opt_arg(sub, "price")
        .map(|p| parse_decimal(&p))
        .transpose()?;
    if let Some(d) = opt_arg(sub, "date") {
        new.transaction_date = parse_date(&d)?;
    }
    new.effect = opt_arg(sub, "effect")
        .map(|e| e.parse::<Effect>())
        .transpose()?;
    new.reference = opt_arg(sub, "reference");
    new.notes = opt_arg(sub, "note");

    let t = ledger::create(conn, &new, actor)?;
    println!(
        "Recorded draft {} of {} shares for {} (#{})",
        t.kind,
        fmt_shares(&t.shares),
        holder.id_number,
        t.id
    );
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub id: i64,
    pub date: String,
    pub shareholder: String,
    pub kind: String,
    pub effect: String,
    pub shares: String,
    pub price: String,
    pub total: String,
    pub status: String,
    pub reference: String,
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<TransactionRow>> {
    let mut filter = TransactionFilter {
        limit: sub.get_one::<usize>("limit").copied(),
        ..Default::default()
    };
    if let Some(id_number) = opt_arg(sub, "shareholder") {
        filter.shareholder_id = Some(shareholders::get_by_id_number(conn, &id_number)?.id);
    }
    if let Some(st) = opt_arg(sub, "status") {
        filter.status = Some(st.parse::<Status>()?);
    }
    let names: HashMap<i64, String> = shareholders::list(conn, true)?
        .into_iter()
        .map(|s| (s.id, s.id_number))
        .collect();
    let data = ledger::list(conn, &filter)?
        .into_iter()
        .map(|t| TransactionRow {
            id: t.id,
            date: t.transaction_date.to_string(),
            shareholder: names.get(&t.shareholder_id).cloned().unwrap_or_default(),
            kind: t.kind.to_string(),
            effect: t.effect.to_string(),
            shares: fmt_shares(&t.shares),
            price: fmt_opt(&t.price_per_share),
            total: fmt_opt(&t.total_amount),
            status: t.status.to_string(),
            reference: fmt_opt(&t.reference),
        })
        .collect();
    Ok(data)
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.id.to_string(),
                    r.date.clone(),
                    r.shareholder.clone(),
                    r.kind.clone(),
                    r.effect.clone(),
                    r.shares.clone(),
                    r.price.clone(),
                    r.total.clone(),
                    r.status.clone(),
                    r.reference.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &[
                    "#", "Date", "Holder", "Type", "Effect", "Shares", "Price", "Total", "Status",
                    "Reference"
                ],
                rows,
            )
        );
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::balance;
use crate::ledger::{self, TransactionFilter};
use crate::models::{NewShareholder, Shareholder, Transaction};
use crate::shareholders;
use crate::utils::{
    fmt_opt, fmt_shares, maybe_print_json, opt_arg, parse_date, parse_decimal, pretty_table,
    req_arg,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

pub fn handle(conn: &mut Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, actor, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("search", sub)) => search(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("deactivate", sub)) => {
            let id_number = req_arg(sub, "id_number")?;
            let s = shareholders::deactivate(conn, actor, &id_number)?;
            println!("Deactivated {} ({})", s.full_name, s.id_number);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &mut Connection, actor: &Actor, sub: &clap::ArgMatches) -> Result<()> {
    let opening_shares = match opt_arg(sub, "shares") {
        Some(raw) => parse_decimal(&raw)?,
        None => Decimal::ZERO,
    };
    let date_of_birth = opt_arg(sub, "date-of-birth")
        .map(|d| parse_date(&d))
        .transpose()?;
    let new = NewShareholder {
        full_name: req_arg(sub, "name")?,
        id_number: opt_arg(sub, "id-number"),
        email: opt_arg(sub, "email"),
        phone_number: opt_arg(sub, "phone"),
        address: opt_arg(sub, "address"),
        city: opt_arg(sub, "city"),
        country: opt_arg(sub, "country"),
        postal_code: opt_arg(sub, "postal-code"),
        date_of_birth,
        gender: opt_arg(sub, "gender"),
        nationality: opt_arg(sub, "nationality"),
        share_certificate_number: opt_arg(sub, "certificate"),
        notes: opt_arg(sub, "notes"),
        opening_shares,
    };
    let s = shareholders::create(conn, &new, actor)
        .with_context(|| format!("Error adding shareholder '{}'", new.full_name))?;
    println!(
        "Shareholder {} added with ID {} ({} shares)",
        s.full_name,
        s.id_number,
        fmt_shares(&s.total_shares)
    );
    Ok(())
}

fn rows_for(list: &[Shareholder]) -> Vec<Vec<String>> {
    list.iter()
        .map(|s| {
            vec![
                s.id_number.clone(),
                s.full_name.clone(),
                fmt_opt(&s.email),
                fmt_shares(&s.total_shares),
                format!("{:.2}%", balance::ownership_percentage(s, list)),
                if s.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect()
}

const HEADERS: [&str; 6] = ["ID", "Name", "Email", "Shares", "Ownership", "Active"];

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let all = shareholders::list(conn, sub.get_flag("all"))?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &all)? {
        println!("{}", pretty_table(&HEADERS, rows_for(&all)));
    }
    Ok(())
}

fn search(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let query = req_arg(sub, "query")?;
    let found = shareholders::search(conn, &query)?;
    if found.is_empty() {
        println!("No shareholder matches '{}'", query);
    } else {
        println!("{}", pretty_table(&HEADERS, rows_for(&found)));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct HolderReport {
    pub shareholder: Shareholder,
    /// Recomputed from completed ledger entries.
    pub ledger_shares: Decimal,
    pub ownership_percentage: Decimal,
    pub transactions: Vec<Transaction>,
}

pub fn holder_report(conn: &Connection, id_number: &str) -> Result<HolderReport> {
    let shareholder = shareholders::get_by_id_number(conn, id_number)?;
    let ledger_shares = ledger::current_balance(conn, shareholder.id)?;
    let all = shareholders::list(conn, true)?;
    let outstanding: Decimal = all.iter().map(|s| s.total_shares).sum();
    let transactions = ledger::list(
        conn,
        &TransactionFilter {
            shareholder_id: Some(shareholder.id),
            ..Default::default()
        },
    )?;
    Ok(HolderReport {
        ownership_percentage: balance::percentage_of(ledger_shares, outstanding).round_dp(2),
        shareholder,
        ledger_shares,
        transactions,
    })
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let id_number = req_arg(sub, "id_number")?;
    let report = holder_report(conn, &id_number)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        return Ok(());
    }
    let s = &report.shareholder;
    println!("{} ({})", s.full_name, s.id_number);
    println!(
        "Shares: {} ({:.2}% of outstanding)",
        fmt_shares(&report.ledger_shares),
        report.ownership_percentage
    );
    if report.ledger_shares != s.total_shares {
        println!(
            "warning: cached balance {} differs from ledger; run `share-registry doctor`",
            fmt_shares(&s.total_shares)
        );
    }
    let rows = report
        .transactions
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                t.transaction_date.to_string(),
                t.kind.to_string(),
                t.effect.to_string(),
                fmt_shares(&t.shares),
                t.status.to_string(),
                fmt_opt(&t.reference),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["#", "Date", "Type", "Effect", "Shares", "Status", "Reference"],
            rows
        )
    );
    Ok(())
}

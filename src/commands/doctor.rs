// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::balance;
use crate::utils::{fmt_shares, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    let fix = m.get_flag("fix");
    let found = balance::reconcile(conn, actor, fix)?;
    let mut rows = Vec::new();

    for d in &found {
        rows.push(vec![
            "balance_mismatch".into(),
            format!(
                "{}: cached {}, ledger {}",
                d.id_number,
                fmt_shares(&d.cached),
                fmt_shares(&d.ledger)
            ),
        ]);
    }

    // transfers marked completed must point at both ledger legs
    let mut stmt = conn.prepare(
        "SELECT id FROM share_transfers
         WHERE status='completed' AND (out_transaction_id IS NULL OR in_transaction_id IS NULL)",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let id: i64 = r.get(0)?;
        rows.push(vec!["transfer_missing_legs".into(), format!("transfer #{}", id)]);
    }

    if rows.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
        if fix && !found.is_empty() {
            println!("Reset {} cached balance(s) to the ledger value", found.len());
        }
    }
    Ok(())
}

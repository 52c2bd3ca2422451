// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::directors;
use crate::models::{DirectorRole, NewDirector};
use crate::utils::{fmt_opt, maybe_print_json, opt_arg, parse_date, pretty_table, req_arg};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewDirector {
                full_name: req_arg(sub, "name")?,
                role: req_arg(sub, "role")?.parse::<DirectorRole>()?,
                email: opt_arg(sub, "email"),
                phone: opt_arg(sub, "phone"),
                appointed_date: parse_date(&req_arg(sub, "appointed")?)?,
            };
            let d = directors::create(conn, &new, actor)?;
            println!(
                "Appointed {} as {} on {} (#{})",
                d.full_name, d.role, d.appointed_date, d.id
            );
        }
        Some(("list", sub)) => {
            let list = directors::list(conn, sub.get_flag("all"))?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &list)? {
                let rows = list
                    .iter()
                    .map(|d| {
                        vec![
                            d.id.to_string(),
                            d.full_name.clone(),
                            d.role.to_string(),
                            d.appointed_date.to_string(),
                            fmt_opt(&d.resignation_date),
                            fmt_opt(&d.email),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(
                        &["#", "Name", "Role", "Appointed", "Resigned", "Email"],
                        rows
                    )
                );
            }
        }
        Some(("resign", sub)) => {
            let id = *sub.get_one::<i64>("id").unwrap();
            let date = match opt_arg(sub, "date") {
                Some(d) => parse_date(&d)?,
                None => chrono::Utc::now().date_naive(),
            };
            let d = directors::resign(conn, actor, id, date)?;
            println!("{} resigned on {}", d.full_name, date);
        }
        _ => {}
    }
    Ok(())
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::{self, Actor};
use crate::utils::{pretty_table, req_arg};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("grant", sub)) => {
            let name = req_arg(sub, "name")?;
            auth::grant_admin(conn, actor, &name)?;
            println!("Granted administrator rights to {}", name);
        }
        Some(("revoke", sub)) => {
            let name = req_arg(sub, "name")?;
            auth::revoke_admin(conn, actor, &name)?;
            println!("Revoked administrator rights from {}", name);
        }
        Some(("list", _)) => {
            let admins = auth::list_admins(conn)?;
            if admins.is_empty() {
                println!("No administrators configured; every actor has administrator rights");
            } else {
                let rows = admins.into_iter().map(|a| vec![a]).collect();
                println!("{}", pretty_table(&["Administrator"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::auth::Actor;
use crate::company::{self, CompanyUpdate};
use crate::models::Company;
use crate::utils::{opt_arg, pretty_table};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, actor: &Actor, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("show", _)) => {
            let c = company::get_or_create(conn)?;
            print_company(&c);
        }
        Some(("set", sub)) => {
            let upd = CompanyUpdate {
                name: opt_arg(sub, "name"),
                registration_number: opt_arg(sub, "registration-number"),
                tax_id: opt_arg(sub, "tax-id"),
                email: opt_arg(sub, "email"),
                phone: opt_arg(sub, "phone"),
                address: opt_arg(sub, "address"),
                website: opt_arg(sub, "website"),
                fiscal_year_end: opt_arg(sub, "fiscal-year-end"),
            };
            let c = company::update(conn, actor, &upd)?;
            println!("Updated company profile for '{}'", c.name);
        }
        _ => {}
    }
    Ok(())
}

fn print_company(c: &Company) {
    let rows = vec![
        vec!["Name".to_string(), c.name.clone()],
        vec!["Registration no.".into(), c.registration_number.clone()],
        vec!["Tax ID".into(), c.tax_id.clone()],
        vec!["Email".into(), c.email.clone()],
        vec!["Phone".into(), c.phone.clone()],
        vec!["Address".into(), c.address.clone()],
        vec!["Website".into(), c.website.clone()],
        vec!["Fiscal year end".into(), c.fiscal_year_end.clone()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The single company record.

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::auth::{Actor, require_admin};
use crate::error::{LedgerError, Result};
use crate::models::Company;

pub const COMPANY_ID: i64 = 1;
const DEFAULT_NAME: &str = "Company";

const COLUMNS: &str = "id, name, registration_number, tax_id, email, phone, address, website, fiscal_year_end";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        id: r.get(0)?,
        name: r.get(1)?,
        registration_number: r.get(2)?,
        tax_id: r.get(3)?,
        email: r.get(4)?,
        phone: r.get(5)?,
        address: r.get(6)?,
        website: r.get(7)?,
        fiscal_year_end: r.get(8)?,
    })
}

pub fn find(conn: &Connection) -> Result<Option<Company>> {
    let c = conn
        .query_row(
            &format!("SELECT {} FROM company WHERE id=?1", COLUMNS),
            params![COMPANY_ID],
            from_row,
        )
        .optional()?;
    Ok(c)
}

/// Inserts the company row. A second company is a validation error; the
/// existence check and the insert share one transaction.
pub fn create(conn: &mut Connection, name: &str) -> Result<Company> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::validation("Company name must not be empty"));
    }
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    insert_in(&tx, name)?;
    tx.commit()?;
    find(conn)?.ok_or_else(|| LedgerError::not_found("company", COMPANY_ID))
}

fn insert_in(conn: &Connection, name: &str) -> Result<()> {
    let existing: i64 = conn.query_row("SELECT COUNT(*) FROM company", [], |r| r.get(0))?;
    if existing > 0 {
        return Err(LedgerError::validation(
            "A company record already exists; only one is allowed",
        ));
    }
    conn.execute(
        "INSERT INTO company(id, name) VALUES (?1, ?2)",
        params![COMPANY_ID, name],
    )?;
    log::info!("created company record '{}'", name);
    Ok(())
}

/// Lazily creates the company on first access. Works inside an open
/// transaction since it only needs a `&Connection`.
pub fn get_or_create(conn: &Connection) -> Result<Company> {
    if let Some(c) = find(conn)? {
        return Ok(c);
    }
    insert_in(conn, DEFAULT_NAME)?;
    find(conn)?.ok_or_else(|| LedgerError::not_found("company", COMPANY_ID))
}

#[derive(Debug, Clone, Default)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub registration_number: Option<String>,
    pub tax_id: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub fiscal_year_end: Option<String>,
}

pub fn update(conn: &Connection, actor: &Actor, upd: &CompanyUpdate) -> Result<Company> {
    require_admin(actor)?;
    let mut c = get_or_create(conn)?;
    if let Some(name) = &upd.name {
        if name.trim().is_empty() {
            return Err(LedgerError::validation("Company name must not be empty"));
        }
        c.name = name.trim().to_string();
    }
    if let Some(fye) = &upd.fiscal_year_end {
        c.fiscal_year_end = parse_fiscal_year_end(fye)?;
    }
    let set = |field: &mut String, v: &Option<String>| {
        if let Some(v) = v {
            *field = v.trim().to_string();
        }
    };
    set(&mut c.registration_number, &upd.registration_number);
    set(&mut c.tax_id, &upd.tax_id);
    set(&mut c.email, &upd.email);
    set(&mut c.phone, &upd.phone);
    set(&mut c.address, &upd.address);
    set(&mut c.website, &upd.website);

    conn.execute(
        "UPDATE company SET name=?1, registration_number=?2, tax_id=?3, email=?4, phone=?5,
         address=?6, website=?7, fiscal_year_end=?8 WHERE id=?9",
        params![
            c.name,
            c.registration_number,
            c.tax_id,
            c.email,
            c.phone,
            c.address,
            c.website,
            c.fiscal_year_end,
            COMPANY_ID
        ],
    )?;
    log::info!("{} updated the company profile", actor.name);
    Ok(c)
}

/// Accepts `MM-DD`; validated against a leap year so `02-29` is allowed.
pub fn parse_fiscal_year_end(s: &str) -> Result<String> {
    let s = s.trim();
    chrono::NaiveDate::parse_from_str(&format!("2024-{}", s), "%Y-%m-%d")
        .map_err(|_| LedgerError::validation(format!("Invalid fiscal year end '{}', expected MM-DD", s)))?;
    Ok(s.to_string())
}

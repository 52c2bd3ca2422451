// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::auth::{Actor, require_admin};
use crate::company;
use crate::error::{LedgerError, Result};
use crate::models::{Director, NewDirector};

const COLUMNS: &str =
    "id, full_name, role, email, phone, appointed_date, resignation_date, is_active";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Director> {
    Ok(Director {
        id: r.get(0)?,
        full_name: r.get(1)?,
        role: r.get(2)?,
        email: r.get(3)?,
        phone: r.get(4)?,
        appointed_date: r.get(5)?,
        resignation_date: r.get(6)?,
        is_active: r.get(7)?,
    })
}

pub fn create(conn: &Connection, new: &NewDirector, actor: &Actor) -> Result<Director> {
    require_admin(actor)?;
    if new.full_name.trim().is_empty() {
        return Err(LedgerError::validation("Director name must not be empty"));
    }
    let company = company::get_or_create(conn)?;
    conn.execute(
        "INSERT INTO directors(company_id, full_name, role, email, phone, appointed_date)
         VALUES (?1,?2,?3,?4,?5,?6)",
        params![
            company.id,
            new.full_name.trim(),
            new.role,
            new.email,
            new.phone,
            new.appointed_date
        ],
    )?;
    let id = conn.last_insert_rowid();
    log::info!(
        "{} appointed {} as {}",
        actor.name,
        new.full_name.trim(),
        new.role
    );
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Director> {
    conn.query_row(
        &format!("SELECT {} FROM directors WHERE id=?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("director", id))
}

pub fn list(conn: &Connection, include_resigned: bool) -> Result<Vec<Director>> {
    let filter = if include_resigned { "" } else { "WHERE is_active=1" };
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM directors {} ORDER BY full_name, id",
        COLUMNS, filter
    ))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn resign(conn: &Connection, actor: &Actor, id: i64, date: NaiveDate) -> Result<Director> {
    require_admin(actor)?;
    let d = get(conn, id)?;
    if !d.is_active {
        return Err(LedgerError::validation(format!(
            "{} has already resigned",
            d.full_name
        )));
    }
    if date < d.appointed_date {
        return Err(LedgerError::validation(format!(
            "Resignation date {} precedes appointment on {}",
            date, d.appointed_date
        )));
    }
    conn.execute(
        "UPDATE directors SET resignation_date=?1, is_active=0 WHERE id=?2",
        params![date, id],
    )?;
    log::info!("{} recorded resignation of {} on {}", actor.name, d.full_name, date);
    get(conn, id)
}

pub fn count_active(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM directors WHERE is_active=1",
        [],
        |r| r.get(0),
    )?)
}

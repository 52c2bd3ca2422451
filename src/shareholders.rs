// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior, params};
use rust_decimal::Decimal;

use crate::auth::{Actor, require_admin};
use crate::company;
use crate::error::{LedgerError, Result};
use crate::ledger;
use crate::models::{NewShareholder, NewTransaction, Shareholder, TransactionType};
use crate::utils::decimal_col;

const ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_SUFFIX_LEN: usize = 6;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

const COLUMNS: &str = "id, company_id, id_number, full_name, email, phone_number, address, city, \
    country, postal_code, date_of_birth, gender, nationality, share_certificate_number, notes, \
    total_shares, is_active, version, date_joined, created_by, created_at";

fn from_row(r: &Row<'_>) -> rusqlite::Result<Shareholder> {
    Ok(Shareholder {
        id: r.get(0)?,
        company_id: r.get(1)?,
        id_number: r.get(2)?,
        full_name: r.get(3)?,
        email: r.get(4)?,
        phone_number: r.get(5)?,
        address: r.get(6)?,
        city: r.get(7)?,
        country: r.get(8)?,
        postal_code: r.get(9)?,
        date_of_birth: r.get(10)?,
        gender: r.get(11)?,
        nationality: r.get(12)?,
        share_certificate_number: r.get(13)?,
        notes: r.get(14)?,
        total_shares: decimal_col(r, 15)?,
        is_active: r.get(16)?,
        version: r.get(17)?,
        date_joined: r.get(18)?,
        created_by: r.get(19)?,
        created_at: r.get(20)?,
    })
}

/// `SH-YYYYMMDD-XXXXXX` with an uppercase alphanumeric suffix.
pub fn generate_id_number(date: NaiveDate) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_CHARSET[rng.random_range(0..ID_CHARSET.len())] as char)
        .collect();
    format!("SH-{}-{}", date.format("%Y%m%d"), suffix)
}

pub fn id_number_exists(conn: &Connection, id_number: &str) -> Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT id FROM shareholders WHERE id_number=?1",
            params![id_number],
            |r| r.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

pub fn unique_id_number(conn: &Connection) -> Result<String> {
    let today = Utc::now().date_naive();
    loop {
        let candidate = generate_id_number(today);
        if !id_number_exists(conn, &candidate)? {
            return Ok(candidate);
        }
        log::debug!("shareholder id {} taken, regenerating", candidate);
    }
}

fn validate(new: &NewShareholder) -> Result<()> {
    if new.full_name.trim().is_empty() {
        return Err(LedgerError::validation("Shareholder name must not be empty"));
    }
    if let Some(email) = new.email.as_deref().filter(|e| !EMAIL_RE.is_match(e)) {
        return Err(LedgerError::validation(format!(
            "Invalid email address '{}'",
            email
        )));
    }
    if new.opening_shares < Decimal::ZERO {
        return Err(LedgerError::validation("Opening shares cannot be negative"));
    }
    if let Some(id) = new.id_number.as_deref() {
        if id.trim().is_empty() {
            return Err(LedgerError::validation("Identifier must not be blank"));
        }
    }
    Ok(())
}

/// Registers a shareholder. A non-zero opening holding is booked as a
/// completed ISSUE in the same transaction so the cache starts consistent.
pub fn create(conn: &mut Connection, new: &NewShareholder, actor: &Actor) -> Result<Shareholder> {
    require_admin(actor)?;
    validate(new)?;
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let company = company::get_or_create(&tx)?;

    let id_number = match new.id_number.as_deref().map(str::trim) {
        Some(id) => {
            if id_number_exists(&tx, id)? {
                return Err(LedgerError::validation(format!(
                    "Shareholder identifier '{}' is already registered",
                    id
                )));
            }
            id.to_string()
        }
        None => unique_id_number(&tx)?,
    };

    tx.execute(
        "INSERT INTO shareholders(company_id, id_number, full_name, email, phone_number, address,
            city, country, postal_code, date_of_birth, gender, nationality,
            share_certificate_number, notes, total_shares, is_active, date_joined, created_by)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,'0',1,?15,?16)",
        params![
            company.id,
            id_number,
            new.full_name.trim(),
            new.email,
            new.phone_number,
            new.address,
            new.city,
            new.country,
            new.postal_code,
            new.date_of_birth,
            new.gender,
            new.nationality,
            new.share_certificate_number,
            new.notes,
            Utc::now().date_naive(),
            actor.name,
        ],
    )?;
    let id = tx.last_insert_rowid();

    if new.opening_shares > Decimal::ZERO {
        let mut opening = NewTransaction::new(id, TransactionType::Issue, new.opening_shares);
        opening.reference = Some("opening balance".to_string());
        ledger::post(&tx, &opening, actor)?;
    }
    tx.commit()?;
    log::info!(
        "{} registered shareholder {} ({})",
        actor.name,
        id_number,
        new.full_name.trim()
    );
    get(conn, id)
}

pub fn get(conn: &Connection, id: i64) -> Result<Shareholder> {
    conn.query_row(
        &format!("SELECT {} FROM shareholders WHERE id=?1", COLUMNS),
        params![id],
        from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("shareholder", id))
}

pub fn get_by_id_number(conn: &Connection, id_number: &str) -> Result<Shareholder> {
    let id_number = id_number.trim();
    conn.query_row(
        &format!("SELECT {} FROM shareholders WHERE id_number=?1", COLUMNS),
        params![id_number],
        from_row,
    )
    .optional()?
    .ok_or_else(|| LedgerError::not_found("shareholder", id_number))
}

pub fn list(conn: &Connection, include_inactive: bool) -> Result<Vec<Shareholder>> {
    let sql = if include_inactive {
        format!("SELECT {} FROM shareholders ORDER BY full_name, id", COLUMNS)
    } else {
        format!(
            "SELECT {} FROM shareholders WHERE is_active=1 ORDER BY full_name, id",
            COLUMNS
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Exact identifier match first, then case-insensitive name/identifier substring.
pub fn search(conn: &Connection, query: &str) -> Result<Vec<Shareholder>> {
    let q = query.trim();
    if q.is_empty() {
        return Ok(Vec::new());
    }
    if let Ok(exact) = get_by_id_number(conn, q) {
        return Ok(vec![exact]);
    }
    let pattern = format!("%{}%", q.to_lowercase());
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM shareholders
         WHERE lower(full_name) LIKE ?1 OR lower(id_number) LIKE ?1
         ORDER BY full_name, id",
        COLUMNS
    ))?;
    let rows = stmt.query_map(params![pattern], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Deactivated holders keep their ledger history but cannot receive transfers.
pub fn deactivate(conn: &Connection, actor: &Actor, id_number: &str) -> Result<Shareholder> {
    require_admin(actor)?;
    let s = get_by_id_number(conn, id_number)?;
    let n = conn.execute(
        "UPDATE shareholders SET is_active=0, version=version+1 WHERE id=?1 AND version=?2",
        params![s.id, s.version],
    )?;
    if n == 0 {
        return Err(LedgerError::ConcurrentModification(format!(
            "shareholder {}",
            s.id_number
        )));
    }
    log::info!("{} deactivated shareholder {}", actor.name, s.id_number);
    get(conn, s.id)
}

pub fn count_joined_since(conn: &Connection, since: NaiveDate) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(*) FROM shareholders WHERE date_joined >= ?1",
        params![since],
        |r| r.get(0),
    )?)
}

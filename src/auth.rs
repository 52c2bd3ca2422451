// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Caller identity and the administrator gate.
//!
//! Administrators are listed in the `admins` setting. Until the first one is
//! granted every actor is treated as an administrator.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub is_admin: bool,
}

impl Actor {
    pub fn new(name: impl Into<String>, is_admin: bool) -> Self {
        Actor {
            name: name.into(),
            is_admin,
        }
    }

    /// In-process callers (tests, bootstrap) acting with full rights.
    pub fn system() -> Self {
        Actor::new("system", true)
    }
}

pub fn resolve(conn: &Connection, name: &str) -> Result<Actor> {
    let admins = list_admins(conn)?;
    let is_admin = admins.is_empty() || admins.iter().any(|a| a == name);
    Ok(Actor::new(name, is_admin))
}

pub fn require_admin(actor: &Actor) -> Result<()> {
    if actor.is_admin {
        Ok(())
    } else {
        log::warn!("rejected administrative request from '{}'", actor.name);
        Err(LedgerError::PermissionDenied(actor.name.clone()))
    }
}

pub fn list_admins(conn: &Connection) -> Result<Vec<String>> {
    let v: Option<String> = conn
        .query_row("SELECT value FROM settings WHERE key='admins'", [], |r| {
            r.get(0)
        })
        .optional()?;
    Ok(v.map(|s| {
        s.split(',')
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .map(|a| a.to_string())
            .collect()
    })
    .unwrap_or_default())
}

fn store_admins(conn: &Connection, admins: &[String]) -> Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value) VALUES('admins', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![admins.join(",")],
    )?;
    Ok(())
}

pub fn grant_admin(conn: &Connection, actor: &Actor, name: &str) -> Result<()> {
    require_admin(actor)?;
    let name = name.trim();
    if name.is_empty() || name.contains(',') {
        return Err(LedgerError::validation(format!(
            "Invalid administrator name '{}'",
            name
        )));
    }
    let mut admins = list_admins(conn)?;
    if !admins.iter().any(|a| a == name) {
        admins.push(name.to_string());
        store_admins(conn, &admins)?;
        log::info!("{} granted administrator rights to {}", actor.name, name);
    }
    Ok(())
}

pub fn revoke_admin(conn: &Connection, actor: &Actor, name: &str) -> Result<()> {
    require_admin(actor)?;
    let mut admins = list_admins(conn)?;
    let before = admins.len();
    admins.retain(|a| a != name.trim());
    if admins.len() == before {
        return Err(LedgerError::not_found("administrator", name.trim()));
    }
    if admins.is_empty() {
        // an empty list would reopen bootstrap mode for everyone
        return Err(LedgerError::validation(
            "Cannot revoke the last administrator",
        ));
    }
    store_admins(conn, &admins)?;
    log::info!("{} revoked administrator rights from {}", actor.name, name);
    Ok(())
}

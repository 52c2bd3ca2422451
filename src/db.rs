// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "ShareRegistry", "share-registry"));

/// How long a writer waits for the database lock before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn default_db_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("share-registry.sqlite"))
}

pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    init_schema(&mut conn)?;
    log::debug!("opened registry database at {}", path.display());
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS settings(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );

    -- exactly one row, ever
    CREATE TABLE IF NOT EXISTS company(
        id INTEGER PRIMARY KEY CHECK (id = 1),
        name TEXT NOT NULL,
        registration_number TEXT NOT NULL DEFAULT '',
        tax_id TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        website TEXT NOT NULL DEFAULT '',
        fiscal_year_end TEXT NOT NULL DEFAULT '12-31',
        created_at TEXT NOT NULL DEFAULT (datetime('now'))
    );

    CREATE TABLE IF NOT EXISTS shareholders(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL DEFAULT 1,
        id_number TEXT NOT NULL UNIQUE,
        full_name TEXT NOT NULL,
        email TEXT,
        phone_number TEXT,
        address TEXT,
        city TEXT,
        country TEXT,
        postal_code TEXT,
        date_of_birth TEXT,
        gender TEXT,
        nationality TEXT,
        share_certificate_number TEXT,
        notes TEXT,
        total_shares TEXT NOT NULL DEFAULT '0', -- cache of completed ledger entries
        is_active INTEGER NOT NULL DEFAULT 1,
        version INTEGER NOT NULL DEFAULT 0,
        date_joined TEXT NOT NULL,
        created_by TEXT,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(company_id) REFERENCES company(id)
    );
    CREATE INDEX IF NOT EXISTS idx_shareholders_name ON shareholders(full_name);

    CREATE TABLE IF NOT EXISTS directors(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        company_id INTEGER NOT NULL DEFAULT 1,
        full_name TEXT NOT NULL,
        role TEXT NOT NULL,
        email TEXT,
        phone TEXT,
        appointed_date TEXT NOT NULL,
        resignation_date TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        FOREIGN KEY(company_id) REFERENCES company(id)
    );

    CREATE TABLE IF NOT EXISTS share_transfers(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        from_shareholder_id INTEGER NOT NULL,
        to_shareholder_id INTEGER NOT NULL,
        shares TEXT NOT NULL,
        price_per_share TEXT,
        total_amount TEXT,
        transfer_date TEXT NOT NULL,
        entry_date TEXT NOT NULL,
        status TEXT NOT NULL,
        approved_at TEXT,
        approved_by TEXT,
        completed_at TEXT,
        completed_by TEXT,
        out_transaction_id INTEGER,
        in_transaction_id INTEGER,
        notes TEXT,
        created_by TEXT,
        version INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(from_shareholder_id) REFERENCES shareholders(id) ON DELETE RESTRICT,
        FOREIGN KEY(to_shareholder_id) REFERENCES shareholders(id) ON DELETE RESTRICT
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        shareholder_id INTEGER NOT NULL,
        kind TEXT NOT NULL,
        effect TEXT NOT NULL CHECK(effect IN ('credit','debit','neutral')),
        status TEXT NOT NULL,
        shares TEXT NOT NULL,
        price_per_share TEXT,
        total_amount TEXT,
        transaction_date TEXT NOT NULL,
        entry_date TEXT NOT NULL,
        approval_date TEXT,
        approved_by TEXT,
        completion_date TEXT,
        completed_by TEXT,
        transfer_id INTEGER,
        reference TEXT,
        notes TEXT,
        created_by TEXT,
        version INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY(shareholder_id) REFERENCES shareholders(id) ON DELETE RESTRICT,
        FOREIGN KEY(transfer_id) REFERENCES share_transfers(id) ON DELETE SET NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_holder ON transactions(shareholder_id, status);
    CREATE INDEX IF NOT EXISTS idx_transactions_entry ON transactions(entry_date);
    "#,
    )?;
    Ok(())
}

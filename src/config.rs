// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use std::path::PathBuf;

pub const DB_ENV: &str = "SHARE_REGISTRY_DB";
pub const ACTOR_ENV: &str = "SHARE_REGISTRY_ACTOR";

/// Process-wide settings resolved once from global flags and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub actor: String,
}

impl Config {
    /// `--db`/`--actor` (or their env vars, wired through clap) win; otherwise
    /// the platform data dir and the login name.
    pub fn from_matches(m: &clap::ArgMatches) -> Result<Config> {
        let db_path = match m.get_one::<String>("db").map(|s| s.trim()) {
            Some(p) if !p.is_empty() => PathBuf::from(p),
            _ => crate::db::default_db_path()?,
        };
        let actor = m
            .get_one::<String>("actor")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| std::env::var("USER").ok().filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "anonymous".to_string());
        Ok(Config { db_path, actor })
    }
}

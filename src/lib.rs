// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod balance;
pub mod cli;
pub mod commands;
pub mod company;
pub mod config;
pub mod db;
pub mod directors;
pub mod error;
pub mod ledger;
pub mod models;
pub mod shareholders;
pub mod transfers;
pub mod utils;
pub mod workflow;

pub use error::{LedgerError, Result};

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::LedgerError;
use crate::workflow::Status;

/// Text-backed enums: `as_str`, `Display`, `FromStr` and SQLite conversions
/// from one `(variant, "text")` list.
macro_rules! text_enum {
    ($name:ident, $what:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| LedgerError::validation(format!("Unknown {} '{}'", $what, s)))
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e| FromSqlError::Other(Box::new(e)))
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Issue,
    Purchase,
    TransferIn,
    TransferOut,
    Bonus,
    Rights,
    Buyback,
    Conversion,
    Adjustment,
    Dividend,
    Split,
    Other,
}

text_enum!(TransactionType, "transaction type", {
    Issue => "ISSUE",
    Purchase => "PURCHASE",
    TransferIn => "TRANSFER_IN",
    TransferOut => "TRANSFER_OUT",
    Bonus => "BONUS",
    Rights => "RIGHTS",
    Buyback => "BUYBACK",
    Conversion => "CONVERSION",
    Adjustment => "ADJUSTMENT",
    Dividend => "DIVIDEND",
    Split => "SPLIT",
    Other => "OTHER",
});

impl TransactionType {
    /// Balance direction fixed by the type. `None` means the caller picks
    /// (only ADJUSTMENT).
    pub fn fixed_effect(self) -> Option<Effect> {
        use TransactionType::*;
        match self {
            Issue | Purchase | TransferIn | Bonus | Rights | Split => Some(Effect::Credit),
            Buyback | TransferOut => Some(Effect::Debit),
            Conversion | Dividend | Other => Some(Effect::Neutral),
            Adjustment => None,
        }
    }
}

/// Direction a completed entry moves the holder's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Credit,
    Debit,
    Neutral,
}

text_enum!(Effect, "effect", {
    Credit => "credit",
    Debit => "debit",
    Neutral => "neutral",
});

impl Effect {
    pub fn signed(self, shares: Decimal) -> Decimal {
        match self {
            Effect::Credit => shares,
            Effect::Debit => -shares,
            Effect::Neutral => Decimal::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectorRole {
    Chairman,
    ManagingDirector,
    ExecutiveDirector,
    NonExecutiveDirector,
    IndependentDirector,
    CompanySecretary,
    Other,
}

text_enum!(DirectorRole, "director role", {
    Chairman => "chairman",
    ManagingDirector => "managing_director",
    ExecutiveDirector => "executive_director",
    NonExecutiveDirector => "non_executive_director",
    IndependentDirector => "independent_director",
    CompanySecretary => "company_secretary",
    Other => "other",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub registration_number: String,
    pub tax_id: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub fiscal_year_end: String, // MM-DD
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shareholder {
    pub id: i64,
    pub company_id: i64,
    pub id_number: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub share_certificate_number: Option<String>,
    pub notes: Option<String>,
    pub total_shares: Decimal, // cache of completed ledger entries
    pub is_active: bool,
    pub version: i64,
    pub date_joined: NaiveDate,
    pub created_by: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewShareholder {
    pub full_name: String,
    /// Generated as `SH-YYYYMMDD-XXXXXX` when absent.
    pub id_number: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub nationality: Option<String>,
    pub share_certificate_number: Option<String>,
    pub notes: Option<String>,
    /// Recorded as a completed ISSUE entry.
    pub opening_shares: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    pub id: i64,
    pub full_name: String,
    pub role: DirectorRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub appointed_date: NaiveDate,
    pub resignation_date: Option<NaiveDate>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewDirector {
    pub full_name: String,
    pub role: DirectorRole,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub appointed_date: NaiveDate,
}

/// One ledger entry. `shares` is always a positive magnitude; `effect`
/// carries the sign.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub shareholder_id: i64,
    pub kind: TransactionType,
    pub effect: Effect,
    pub status: Status,
    pub shares: Decimal,
    pub price_per_share: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub transaction_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub approval_date: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub completion_date: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub transfer_id: Option<i64>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub version: i64,
}

impl Transaction {
    pub fn signed_delta(&self) -> Decimal {
        self.effect.signed(self.shares)
    }

    pub fn recompute_total(&mut self) {
        self.total_amount = total_amount(self.shares, self.price_per_share);
    }
}

pub fn total_amount(shares: Decimal, price_per_share: Option<Decimal>) -> Option<Decimal> {
    price_per_share.map(|p| shares * p)
}

#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub shareholder_id: i64,
    pub kind: TransactionType,
    /// Required for ADJUSTMENT, must match the fixed effect otherwise.
    pub effect: Option<Effect>,
    pub shares: Decimal,
    pub price_per_share: Option<Decimal>,
    pub transaction_date: NaiveDate,
    pub transfer_id: Option<i64>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    pub fn new(shareholder_id: i64, kind: TransactionType, shares: Decimal) -> Self {
        NewTransaction {
            shareholder_id,
            kind,
            effect: None,
            shares,
            price_per_share: None,
            transaction_date: Utc::now().date_naive(),
            transfer_id: None,
            reference: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareTransfer {
    pub id: i64,
    pub from_shareholder_id: i64,
    pub to_shareholder_id: i64,
    pub shares: Decimal,
    pub price_per_share: Option<Decimal>,
    pub total_amount: Option<Decimal>,
    pub transfer_date: NaiveDate,
    pub entry_date: DateTime<Utc>,
    pub status: Status,
    pub approved_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<String>,
    pub out_transaction_id: Option<i64>,
    pub in_transaction_id: Option<i64>,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub version: i64,
}

#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub from_shareholder_id: i64,
    pub to_shareholder_id: i64,
    pub shares: Decimal,
    pub price_per_share: Option<Decimal>,
    pub transfer_date: NaiveDate,
    pub notes: Option<String>,
}

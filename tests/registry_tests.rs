// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use regex::Regex;
use rusqlite::Connection;
use rust_decimal::Decimal;
use share_registry::auth::{self, Actor};
use share_registry::company::{self, CompanyUpdate};
use share_registry::models::{
    DirectorRole, NewDirector, NewShareholder, NewTransaction, Shareholder, TransactionType,
};
use share_registry::workflow::Status;
use share_registry::{LedgerError, balance, db, directors, ledger, shareholders};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn register(conn: &mut Connection, name: &str, opening: i64) -> Shareholder {
    let new = NewShareholder {
        full_name: name.to_string(),
        opening_shares: Decimal::from(opening),
        ..Default::default()
    };
    shareholders::create(conn, &new, &Actor::system()).unwrap()
}

#[test]
fn only_one_company_record() {
    let mut conn = setup();
    let c = company::create(&mut conn, "Acme Holdings").unwrap();
    assert_eq!(c.id, company::COMPANY_ID);

    let err = company::create(&mut conn, "Second Co").unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM company", [], |r| r.get(0))
        .unwrap();
    assert_eq!(count, 1);

    // the table refuses a second row even past the helper
    assert!(
        conn.execute("INSERT INTO company(id, name) VALUES (2, 'Rogue')", [])
            .is_err()
    );
}

#[test]
fn company_is_created_on_first_access_and_editable() {
    let conn = setup();
    assert!(company::find(&conn).unwrap().is_none());
    let c = company::get_or_create(&conn).unwrap();
    assert_eq!(c.name, "Company");

    let upd = CompanyUpdate {
        name: Some("Acme Holdings".into()),
        fiscal_year_end: Some("06-30".into()),
        ..Default::default()
    };
    let c = company::update(&conn, &Actor::system(), &upd).unwrap();
    assert_eq!(c.fiscal_year_end, "06-30");
    assert_eq!(company::find(&conn).unwrap().unwrap().name, "Acme Holdings");

    let bad = CompanyUpdate {
        fiscal_year_end: Some("31-12".into()),
        ..Default::default()
    };
    assert!(company::update(&conn, &Actor::system(), &bad).is_err());
}

#[test]
fn generated_identifier_and_opening_issue() {
    let mut conn = setup();
    let s = register(&mut conn, "Ada Lovelace", 250);
    let re = Regex::new(r"^SH-\d{8}-[A-Z0-9]{6}$").unwrap();
    assert!(re.is_match(&s.id_number), "{}", s.id_number);
    assert_eq!(s.total_shares, Decimal::from(250));

    let entries = ledger::list(
        &conn,
        &ledger::TransactionFilter {
            shareholder_id: Some(s.id),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].kind, TransactionType::Issue);
    assert_eq!(entries[0].status, Status::Completed);
}

#[test]
fn duplicate_identifier_is_rejected() {
    let mut conn = setup();
    let new = NewShareholder {
        full_name: "Grace".into(),
        id_number: Some("P1234567".into()),
        ..Default::default()
    };
    shareholders::create(&mut conn, &new, &Actor::system()).unwrap();
    let again = NewShareholder {
        full_name: "Someone Else".into(),
        ..new
    };
    let err = shareholders::create(&mut conn, &again, &Actor::system()).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(shareholders::list(&conn, true).unwrap().len(), 1);
}

#[test]
fn ownership_percentages() {
    let mut conn = setup();
    let a = register(&mut conn, "Alpha", 30);
    register(&mut conn, "Beta", 90);
    register(&mut conn, "Gamma", 0);

    let all = shareholders::list(&conn, true).unwrap();
    let pct = balance::ownership_percentage(&all[0], &all);
    assert_eq!(all[0].id, a.id);
    assert_eq!(pct, Decimal::from(25));

    let reg = balance::register(&conn).unwrap();
    assert_eq!(reg.total_shares, Decimal::from(120));
    assert_eq!(reg.holder_count, 3);
    assert_eq!(reg.average_holding, Decimal::from(40));
    let total_pct: Decimal = reg.holdings.iter().map(|h| h.ownership_percentage).sum();
    assert_eq!(total_pct, Decimal::from(100));
}

#[test]
fn empty_register_has_zero_percentages() {
    let mut conn = setup();
    register(&mut conn, "Alpha", 0);
    let reg = balance::register(&conn).unwrap();
    assert_eq!(reg.total_shares, Decimal::ZERO);
    assert_eq!(reg.holdings[0].ownership_percentage, Decimal::ZERO);
}

#[test]
fn reconcile_reports_and_repairs_tampered_cache() {
    let mut conn = setup();
    let admin = Actor::system();
    let s = register(&mut conn, "Alpha", 40);
    conn.execute(
        "UPDATE shareholders SET total_shares='55' WHERE id=?1",
        [s.id],
    )
    .unwrap();

    let found = balance::reconcile(&mut conn, &admin, false).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].cached, Decimal::from(55));
    assert_eq!(found[0].ledger, Decimal::from(40));
    assert_eq!(balance::cached_balance(&conn, s.id).unwrap(), Decimal::from(55));

    let clerk = Actor::new("clerk", false);
    assert!(matches!(
        balance::reconcile(&mut conn, &clerk, true),
        Err(LedgerError::PermissionDenied(_))
    ));

    balance::reconcile(&mut conn, &admin, true).unwrap();
    assert_eq!(balance::cached_balance(&conn, s.id).unwrap(), Decimal::from(40));
    assert!(balance::reconcile(&mut conn, &admin, false).unwrap().is_empty());
}

#[test]
fn admin_list_gates_writes() {
    let mut conn = setup();
    // nobody listed yet: everyone may administer
    let first = auth::resolve(&conn, "alice").unwrap();
    assert!(first.is_admin);
    auth::grant_admin(&conn, &first, "alice").unwrap();

    let bob = auth::resolve(&conn, "bob").unwrap();
    assert!(!bob.is_admin);
    let new = NewShareholder {
        full_name: "Ada".into(),
        ..Default::default()
    };
    assert!(matches!(
        shareholders::create(&mut conn, &new, &bob),
        Err(LedgerError::PermissionDenied(_))
    ));
    assert!(matches!(
        auth::grant_admin(&conn, &bob, "bob"),
        Err(LedgerError::PermissionDenied(_))
    ));

    let alice = auth::resolve(&conn, "alice").unwrap();
    assert!(matches!(
        auth::revoke_admin(&conn, &alice, "alice"),
        Err(LedgerError::Validation(_))
    ));
    auth::grant_admin(&conn, &alice, "bob").unwrap();
    auth::revoke_admin(&conn, &alice, "alice").unwrap();
    assert_eq!(auth::list_admins(&conn).unwrap(), vec!["bob".to_string()]);
}

#[test]
fn anyone_may_draft_and_submit() {
    let mut conn = setup();
    let s = register(&mut conn, "Ada", 0);
    let clerk = Actor::new("clerk", false);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(s.id, TransactionType::Issue, Decimal::from(5)),
        &clerk,
    )
    .unwrap();
    let t = ledger::submit(&mut conn, t.id, &clerk).unwrap();
    assert_eq!(t.status, Status::Pending);
    let t = ledger::cancel(&mut conn, t.id, &clerk).unwrap();
    assert_eq!(t.status, Status::Cancelled);
}

#[test]
fn director_appointment_and_resignation() {
    let conn = setup();
    let admin = Actor::system();
    let appointed = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let d = directors::create(
        &conn,
        &NewDirector {
            full_name: "Jane Roe".into(),
            role: DirectorRole::Chairman,
            email: None,
            phone: None,
            appointed_date: appointed,
        },
        &admin,
    )
    .unwrap();
    assert_eq!(directors::count_active(&conn).unwrap(), 1);

    let early = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
    assert!(matches!(
        directors::resign(&conn, &admin, d.id, early),
        Err(LedgerError::Validation(_))
    ));

    let left = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
    let d = directors::resign(&conn, &admin, d.id, left).unwrap();
    assert!(!d.is_active);
    assert_eq!(d.resignation_date, Some(left));
    assert_eq!(directors::count_active(&conn).unwrap(), 0);
    assert_eq!(directors::list(&conn, false).unwrap().len(), 0);
    assert_eq!(directors::list(&conn, true).unwrap().len(), 1);
    assert!(directors::resign(&conn, &admin, d.id, left).is_err());
}

#[test]
fn search_matches_name_fragments() {
    let mut conn = setup();
    let ada = register(&mut conn, "Ada Lovelace", 0);
    register(&mut conn, "Grace Hopper", 0);
    let hits = shareholders::search(&conn, "love").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, ada.id);
    assert_eq!(shareholders::search(&conn, &ada.id_number).unwrap().len(), 1);
    assert!(shareholders::search(&conn, "  ").unwrap().is_empty());
}

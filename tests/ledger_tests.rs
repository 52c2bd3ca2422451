// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use share_registry::auth::Actor;
use share_registry::models::{Effect, NewShareholder, NewTransaction, TransactionType};
use share_registry::workflow::{Attempt, Status};
use share_registry::{LedgerError, balance, db, ledger, shareholders};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn holder(conn: &mut Connection, name: &str, opening: i64) -> i64 {
    let new = NewShareholder {
        full_name: name.to_string(),
        opening_shares: Decimal::from(opening),
        ..Default::default()
    };
    shareholders::create(conn, &new, &Actor::system()).unwrap().id
}

fn shares(conn: &Connection, id: i64) -> Decimal {
    balance::cached_balance(conn, id).unwrap()
}

#[test]
fn issue_applies_once_on_completion() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 0);

    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(50)),
        &admin,
    )
    .unwrap();
    assert_eq!(t.status, Status::Draft);
    assert_eq!(t.effect, Effect::Credit);

    let t = ledger::approve(&mut conn, t.id, &admin).unwrap();
    assert_eq!(t.status, Status::Approved);
    assert!(t.approval_date.is_some());
    assert_eq!(shares(&conn, h), Decimal::ZERO);

    let t = ledger::complete(&mut conn, t.id, &admin).unwrap();
    assert_eq!(t.status, Status::Completed);
    assert_eq!(t.completed_by.as_deref(), Some("system"));
    assert_eq!(shares(&conn, h), Decimal::from(50));

    let err = ledger::complete(&mut conn, t.id, &admin).unwrap_err();
    assert!(matches!(err, LedgerError::WorkflowViolation { .. }));
    assert_eq!(shares(&conn, h), Decimal::from(50));
}

#[test]
fn resaving_a_completed_entry_keeps_the_balance() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 0);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Purchase, Decimal::from(20)),
        &admin,
    )
    .unwrap();
    ledger::submit(&mut conn, t.id, &admin).unwrap();
    let mut t = ledger::complete(&mut conn, t.id, &admin).unwrap();

    t.notes = Some("certificate posted".into());
    ledger::save(&mut conn, &mut t, &admin).unwrap();
    ledger::save(&mut conn, &mut t, &admin).unwrap();

    assert_eq!(shares(&conn, h), Decimal::from(20));
    let stored = ledger::get(&conn, t.id).unwrap();
    assert_eq!(stored.notes.as_deref(), Some("certificate posted"));
    assert_eq!(stored.version, t.version);
}

#[test]
fn completed_entry_cannot_move_back() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 0);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(10)),
        &admin,
    )
    .unwrap();
    ledger::submit(&mut conn, t.id, &admin).unwrap();
    let mut t = ledger::complete(&mut conn, t.id, &admin).unwrap();

    t.status = Status::Draft;
    let err = ledger::save(&mut conn, &mut t, &admin).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::WorkflowViolation {
            attempt: Attempt::MoveTo(Status::Draft),
            ..
        }
    ));
    assert_eq!(ledger::get(&conn, t.id).unwrap().status, Status::Completed);

    let err = ledger::reverse(&mut conn, t.id, &admin).unwrap_err();
    assert!(matches!(err, LedgerError::WorkflowViolation { .. }));
}

#[test]
fn resave_without_status_change_keeps_audit_stamps() {
    let mut conn = setup();
    let admin = Actor::system();
    let clerk = Actor::new("clerk", false);
    let h = holder(&mut conn, "Ada", 0);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(8)),
        &clerk,
    )
    .unwrap();
    let mut t = ledger::approve(&mut conn, t.id, &admin).unwrap();
    let approved_at = t.approval_date;
    assert!(approved_at.is_some());

    t.approval_date = None;
    t.approved_by = Some("clerk".into());
    t.completion_date = approved_at;
    t.notes = Some("board minute 12".into());
    ledger::save(&mut conn, &mut t, &clerk).unwrap();

    let stored = ledger::get(&conn, t.id).unwrap();
    assert_eq!(stored.approval_date, approved_at);
    assert_eq!(stored.approved_by.as_deref(), Some("system"));
    assert_eq!(stored.completion_date, None);
    assert_eq!(stored.notes.as_deref(), Some("board minute 12"));
    assert_eq!(t.approval_date, approved_at);
    assert_eq!(balance::cached_balance(&conn, h).unwrap(), Decimal::ZERO);
}

#[test]
fn approved_terms_are_frozen() {
    let mut conn = setup();
    let admin = Actor::system();
    let clerk = Actor::new("clerk", false);
    let h = holder(&mut conn, "Ada", 0);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(1)),
        &clerk,
    )
    .unwrap();
    let approved = ledger::approve(&mut conn, t.id, &admin).unwrap();

    let mut inflated = approved.clone();
    inflated.shares = Decimal::from(1_000_000);
    let err = ledger::save(&mut conn, &mut inflated, &clerk).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));

    let mut retyped = approved.clone();
    retyped.kind = TransactionType::Bonus;
    assert!(matches!(
        ledger::save(&mut conn, &mut retyped, &admin),
        Err(LedgerError::Validation(_))
    ));

    ledger::complete(&mut conn, t.id, &admin).unwrap();
    assert_eq!(shares(&conn, h), Decimal::from(1));
}

#[test]
fn draft_terms_stay_editable() {
    let mut conn = setup();
    let clerk = Actor::new("clerk", false);
    let h = holder(&mut conn, "Ada", 0);
    let mut t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(1)),
        &clerk,
    )
    .unwrap();
    t.shares = Decimal::from(3);
    ledger::save(&mut conn, &mut t, &clerk).unwrap();
    assert_eq!(ledger::get(&conn, t.id).unwrap().shares, Decimal::from(3));
}

#[test]
fn stale_copy_is_refused() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 0);
    let mut stale = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(10)),
        &admin,
    )
    .unwrap();
    ledger::submit(&mut conn, stale.id, &admin).unwrap();

    stale.notes = Some("late edit".into());
    let err = ledger::save(&mut conn, &mut stale, &admin).unwrap_err();
    assert!(matches!(err, LedgerError::ConcurrentModification(_)));
    assert!(stale.notes.is_some());
    assert_eq!(ledger::get(&conn, stale.id).unwrap().notes, None);
}

#[test]
fn adjustment_needs_an_explicit_direction() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 30);

    let bare = NewTransaction::new(h, TransactionType::Adjustment, Decimal::from(5));
    assert!(matches!(
        ledger::create(&conn, &bare, &admin),
        Err(LedgerError::Validation(_))
    ));

    let mut down = bare.clone();
    down.effect = Some(Effect::Debit);
    let t = ledger::create(&conn, &down, &admin).unwrap();
    ledger::approve(&mut conn, t.id, &admin).unwrap();
    ledger::complete(&mut conn, t.id, &admin).unwrap();
    assert_eq!(shares(&conn, h), Decimal::from(25));

    let mut wrong = NewTransaction::new(h, TransactionType::Buyback, Decimal::from(5));
    wrong.effect = Some(Effect::Credit);
    assert!(matches!(
        ledger::create(&conn, &wrong, &admin),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn neutral_types_leave_balance_alone() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 40);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Dividend, Decimal::from(40)),
        &admin,
    )
    .unwrap();
    assert_eq!(t.effect, Effect::Neutral);
    ledger::submit(&mut conn, t.id, &admin).unwrap();
    ledger::complete(&mut conn, t.id, &admin).unwrap();
    assert_eq!(shares(&conn, h), Decimal::from(40));
}

#[test]
fn buyback_beyond_holding_fails_closed() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 10);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Buyback, Decimal::from(11)),
        &admin,
    )
    .unwrap();
    ledger::approve(&mut conn, t.id, &admin).unwrap();

    let err = ledger::complete(&mut conn, t.id, &admin).unwrap_err();
    assert!(matches!(err, LedgerError::Validation(_)));
    assert_eq!(shares(&conn, h), Decimal::from(10));
    assert_eq!(ledger::get(&conn, t.id).unwrap().status, Status::Approved);
}

#[test]
fn rejects_non_positive_shares_and_negative_price() {
    let conn = {
        let mut c = setup();
        holder(&mut c, "Ada", 0);
        c
    };
    let admin = Actor::system();
    let zero = NewTransaction::new(1, TransactionType::Issue, Decimal::ZERO);
    assert!(matches!(
        ledger::create(&conn, &zero, &admin),
        Err(LedgerError::Validation(_))
    ));
    let mut priced = NewTransaction::new(1, TransactionType::Issue, Decimal::from(3));
    priced.price_per_share = Some(Decimal::from(-1));
    assert!(matches!(
        ledger::create(&conn, &priced, &admin),
        Err(LedgerError::Validation(_))
    ));
}

#[test]
fn total_amount_follows_price() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 0);
    let mut new = NewTransaction::new(h, TransactionType::Purchase, Decimal::from(12));
    new.price_per_share = Some(Decimal::new(250, 2));
    let t = ledger::create(&conn, &new, &admin).unwrap();
    assert_eq!(t.total_amount, Some(Decimal::from(30)));

    let mut t = t;
    t.shares = Decimal::from(4);
    ledger::save(&mut conn, &mut t, &admin).unwrap();
    assert_eq!(
        ledger::get(&conn, t.id).unwrap().total_amount,
        Some(Decimal::from(10))
    );
}

#[test]
fn non_admin_cannot_complete() {
    let mut conn = setup();
    let admin = Actor::system();
    let clerk = Actor::new("clerk", false);
    let h = holder(&mut conn, "Ada", 0);
    let t = ledger::create(
        &conn,
        &NewTransaction::new(h, TransactionType::Issue, Decimal::from(5)),
        &clerk,
    )
    .unwrap();
    ledger::submit(&mut conn, t.id, &clerk).unwrap();

    let err = ledger::complete(&mut conn, t.id, &clerk).unwrap_err();
    assert!(matches!(err, LedgerError::PermissionDenied(_)));
    ledger::complete(&mut conn, t.id, &admin).unwrap();
    assert_eq!(shares(&conn, h), Decimal::from(5));
}

#[test]
fn cache_matches_ledger_after_mixed_activity() {
    let mut conn = setup();
    let admin = Actor::system();
    let h = holder(&mut conn, "Ada", 100);
    for (kind, n, complete) in [
        (TransactionType::Bonus, 10, true),
        (TransactionType::Buyback, 25, true),
        (TransactionType::Rights, 7, false),
        (TransactionType::Split, 100, true),
    ] {
        let t = ledger::create(&conn, &NewTransaction::new(h, kind, Decimal::from(n)), &admin)
            .unwrap();
        ledger::submit(&mut conn, t.id, &admin).unwrap();
        if complete {
            ledger::complete(&mut conn, t.id, &admin).unwrap();
        } else {
            ledger::cancel(&mut conn, t.id, &admin).unwrap();
        }
    }
    assert_eq!(shares(&conn, h), Decimal::from(185));
    assert_eq!(ledger::current_balance(&conn, h).unwrap(), Decimal::from(185));
}

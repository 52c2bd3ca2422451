// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use share_registry::auth::Actor;
use share_registry::commands::{
    doctor, exporter, reports, shareholders as holder_cmd, transactions, transfers as transfer_cmd,
};
use share_registry::workflow::Status;
use share_registry::{cli, db, ledger, shareholders, transfers};

fn setup() -> Connection {
    let mut conn = Connection::open_in_memory().unwrap();
    db::init_schema(&mut conn).unwrap();
    conn
}

fn run(conn: &mut Connection, args: &[&str]) -> anyhow::Result<()> {
    let actor = Actor::system();
    let mut argv = vec!["share-registry"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("shareholder", sub)) => holder_cmd::handle(conn, &actor, sub),
        Some(("tx", sub)) => transactions::handle(conn, &actor, sub),
        Some(("transfer", sub)) => transfer_cmd::handle(conn, &actor, sub),
        Some(("report", sub)) => reports::handle(conn, sub),
        Some(("export", sub)) => exporter::handle(conn, sub),
        Some(("doctor", sub)) => doctor::handle(conn, &actor, sub),
        other => panic!("unexpected command {:?}", other.map(|(n, _)| n)),
    }
}

fn seed(conn: &mut Connection) {
    run(
        conn,
        &["shareholder", "add", "--name", "Ada Lovelace", "--id-number", "A-1", "--shares", "100"],
    )
    .unwrap();
    run(
        conn,
        &["shareholder", "add", "--name", "Grace Hopper", "--id-number", "G-1", "--email", "grace@example.com"],
    )
    .unwrap();
}

#[test]
fn transaction_lifecycle_from_the_command_line() {
    let mut conn = setup();
    seed(&mut conn);
    run(
        &mut conn,
        &["tx", "create", "--shareholder", "G-1", "--type", "purchase", "--shares", "15", "--price", "1.50"],
    )
    .unwrap();
    let id = ledger::list(&conn, &Default::default()).unwrap()[0].id;
    let id = id.to_string();
    run(&mut conn, &["tx", "submit", &id]).unwrap();
    run(&mut conn, &["tx", "complete", &id]).unwrap();
    assert!(run(&mut conn, &["tx", "complete", &id]).is_err());

    let grace = shareholders::get_by_id_number(&conn, "G-1").unwrap();
    assert_eq!(grace.total_shares, Decimal::from(15));

    let report = holder_cmd::holder_report(&conn, "G-1").unwrap();
    assert_eq!(report.ledger_shares, Decimal::from(15));
    assert_eq!(report.transactions.len(), 1);
    assert_eq!(report.transactions[0].total_amount, Some(Decimal::new(2250, 2)));
}

#[test]
fn list_limit_and_status_filter() {
    let mut conn = setup();
    seed(&mut conn);
    for n in ["1", "2", "3"] {
        run(
            &mut conn,
            &["tx", "create", "--shareholder", "A-1", "--type", "BONUS", "--shares", n],
        )
        .unwrap();
    }
    let matches = cli::build_cli().get_matches_from([
        "share-registry",
        "tx",
        "list",
        "--status",
        "draft",
        "--limit",
        "2",
    ]);
    if let Some(("tx", tx_m)) = matches.subcommand() {
        if let Some(("list", list_m)) = tx_m.subcommand() {
            let rows = transactions::query_rows(&conn, list_m).unwrap();
            assert_eq!(rows.len(), 2);
            assert_eq!(rows[0].shares, "3");
            assert!(rows.iter().all(|r| r.status == "draft"));
        } else {
            panic!("no list subcommand");
        }
    } else {
        panic!("no tx subcommand");
    }
}

#[test]
fn unknown_type_and_bad_shares_are_rejected() {
    let mut conn = setup();
    seed(&mut conn);
    assert!(
        run(
            &mut conn,
            &["tx", "create", "--shareholder", "A-1", "--type", "GIFT", "--shares", "1"],
        )
        .is_err()
    );
    assert!(
        run(
            &mut conn,
            &["tx", "create", "--shareholder", "A-1", "--type", "ISSUE", "--shares", "0"],
        )
        .is_err()
    );
    assert!(ledger::list(&conn, &Default::default()).unwrap().len() == 1);
}

#[test]
fn transfer_from_the_command_line() {
    let mut conn = setup();
    seed(&mut conn);
    run(
        &mut conn,
        &["transfer", "create", "--from", "A-1", "--to", "G-1", "--shares", "40"],
    )
    .unwrap();
    let id = transfers::list(&conn, &Default::default()).unwrap()[0].id.to_string();
    run(&mut conn, &["transfer", "approve", &id]).unwrap();
    run(&mut conn, &["transfer", "execute", &id]).unwrap();

    let t = transfers::get(&conn, id.parse().unwrap()).unwrap();
    assert_eq!(t.status, Status::Completed);
    assert_eq!(
        shareholders::get_by_id_number(&conn, "A-1").unwrap().total_shares,
        Decimal::from(60)
    );
    assert!(
        run(
            &mut conn,
            &["transfer", "create", "--from", "A-1", "--to", "A-1", "--shares", "1"],
        )
        .is_err()
    );
}

#[test]
fn dashboard_counts() {
    let mut conn = setup();
    seed(&mut conn);
    run(
        &mut conn,
        &["tx", "create", "--shareholder", "A-1", "--type", "ISSUE", "--shares", "5"],
    )
    .unwrap();
    let d = reports::dashboard(&conn).unwrap();
    assert_eq!(d.total_shareholders, 2);
    assert_eq!(d.active_shareholders, 2);
    assert_eq!(d.total_shares, Decimal::from(100));
    assert_eq!(d.new_shareholders, 2);
    assert_eq!(d.awaiting_approval, 1);
    assert_eq!(d.recent_transactions.len(), 2);
}

#[test]
fn exports_register_and_history() {
    let mut conn = setup();
    seed(&mut conn);
    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("register.csv");
    let json_path = dir.path().join("history.json");

    run(
        &mut conn,
        &["export", "register", "--out", csv_path.to_str().unwrap()],
    )
    .unwrap();
    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(&records[0][0], "A-1");
    assert_eq!(&records[0][2], "100");
    assert_eq!(&records[0][3], "100.00");

    run(
        &mut conn,
        &["export", "transactions", "--format", "json", "--out", json_path.to_str().unwrap()],
    )
    .unwrap();
    let body = std::fs::read_to_string(&json_path).unwrap();
    let items: serde_json::Value = serde_json::from_str(&body).unwrap();
    let items = items.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["type"], "ISSUE");
    assert_eq!(items[0]["shareholder"], "A-1");
    assert_eq!(items[0]["status"], "completed");

    assert!(
        run(
            &mut conn,
            &["export", "register", "--format", "xml", "--out", csv_path.to_str().unwrap()],
        )
        .is_err()
    );
}

#[test]
fn doctor_repairs_drift() {
    let mut conn = setup();
    seed(&mut conn);
    conn.execute(
        "UPDATE shareholders SET total_shares='7' WHERE id_number='G-1'",
        [],
    )
    .unwrap();
    run(&mut conn, &["doctor"]).unwrap();
    assert_eq!(
        shareholders::get_by_id_number(&conn, "G-1").unwrap().total_shares,
        Decimal::from(7)
    );
    run(&mut conn, &["doctor", "--fix"]).unwrap();
    assert_eq!(
        shareholders::get_by_id_number(&conn, "G-1").unwrap().total_shares,
        Decimal::ZERO
    );
}

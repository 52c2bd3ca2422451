// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

use crate::config::{ACTOR_ENV, DB_ENV};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn id_arg() -> Arg {
    Arg::new("id")
        .required(true)
        .value_parser(value_parser!(i64))
        .help("Record id")
}

fn status_commands(cmd: Command, what: &'static str) -> Command {
    let mut cmd = cmd;
    for (name, about) in [
        ("submit", "Submit for approval"),
        ("approve", "Approve (admin)"),
        ("cancel", "Cancel before completion"),
        ("reject", "Reject (admin)"),
        ("reverse", "Mark reversed before completion (admin)"),
    ] {
        cmd = cmd.subcommand(
            Command::new(name)
                .about(format!("{} a {}", about, what))
                .arg(id_arg()),
        );
    }
    cmd
}

pub fn build_cli() -> Command {
    Command::new("share-registry")
        .version(clap::crate_version!())
        .about("Share registry: shareholders, directors, and an approval-gated share ledger")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(DB_ENV)
                .help("Path to the registry database"),
        )
        .arg(
            Arg::new("actor")
                .long("actor")
                .global(true)
                .env(ACTOR_ENV)
                .help("Name recorded as the acting user (defaults to $USER)"),
        )
        .subcommand(Command::new("init").about("Create the database and company record"))
        .subcommand(
            Command::new("company")
                .about("Company profile")
                .subcommand(Command::new("show").about("Show the company profile"))
                .subcommand(
                    Command::new("set")
                        .about("Update the company profile (admin)")
                        .arg(opt("name", "Legal name"))
                        .arg(opt("registration-number", "Registration number"))
                        .arg(opt("tax-id", "Tax identifier"))
                        .arg(opt("email", "Contact email"))
                        .arg(opt("phone", "Contact phone"))
                        .arg(opt("address", "Registered address"))
                        .arg(opt("website", "Website"))
                        .arg(opt("fiscal-year-end", "Fiscal year end as MM-DD")),
                ),
        )
        .subcommand(
            Command::new("shareholder")
                .about("Shareholder registry")
                .subcommand(
                    Command::new("add")
                        .about("Register a shareholder (admin)")
                        .arg(opt("name", "Full name").required(true))
                        .arg(opt(
                            "id-number",
                            "National ID or passport; generated as SH-YYYYMMDD-XXXXXX if omitted",
                        ))
                        .arg(opt("shares", "Opening holding, booked as a completed ISSUE"))
                        .arg(opt("email", "Email address"))
                        .arg(opt("phone", "Phone number"))
                        .arg(opt("address", "Street address"))
                        .arg(opt("city", "City"))
                        .arg(opt("country", "Country"))
                        .arg(opt("postal-code", "Postal code"))
                        .arg(opt("date-of-birth", "YYYY-MM-DD"))
                        .arg(opt("gender", "Gender"))
                        .arg(opt("nationality", "Nationality"))
                        .arg(opt("certificate", "Share certificate number"))
                        .arg(opt("notes", "Free-form notes")),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List shareholders").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include deactivated shareholders"),
                    ),
                ))
                .subcommand(
                    Command::new("search")
                        .about("Find by identifier or name")
                        .arg(Arg::new("query").required(true)),
                )
                .subcommand(json_flags(
                    Command::new("show")
                        .about("Holder report with ledger-recomputed balance")
                        .arg(Arg::new("id_number").required(true)),
                ))
                .subcommand(
                    Command::new("deactivate")
                        .about("Deactivate a shareholder (admin)")
                        .arg(Arg::new("id_number").required(true)),
                ),
        )
        .subcommand(
            Command::new("director")
                .about("Board of directors")
                .subcommand(
                    Command::new("add")
                        .about("Appoint a director (admin)")
                        .arg(opt("name", "Full name").required(true))
                        .arg(opt(
                            "role",
                            "chairman|managing_director|executive_director|non_executive_director|independent_director|company_secretary|other",
                        )
                        .required(true))
                        .arg(opt("appointed", "Appointment date YYYY-MM-DD").required(true))
                        .arg(opt("email", "Email address"))
                        .arg(opt("phone", "Phone number")),
                )
                .subcommand(json_flags(
                    Command::new("list").about("List directors").arg(
                        Arg::new("all")
                            .long("all")
                            .action(ArgAction::SetTrue)
                            .help("Include resigned directors"),
                    ),
                ))
                .subcommand(
                    Command::new("resign")
                        .about("Record a resignation (admin)")
                        .arg(id_arg())
                        .arg(opt("date", "Resignation date YYYY-MM-DD (default today)")),
                ),
        )
        .subcommand(status_commands(
            Command::new("tx")
                .about("Share transactions")
                .subcommand(
                    Command::new("create")
                        .about("Record a draft transaction")
                        .arg(opt("shareholder", "Shareholder identifier").required(true))
                        .arg(opt("type", "ISSUE|PURCHASE|TRANSFER_IN|TRANSFER_OUT|BONUS|RIGHTS|BUYBACK|CONVERSION|ADJUSTMENT|DIVIDEND|SPLIT|OTHER").required(true))
                        .arg(opt("shares", "Number of shares (positive)").required(true))
                        .arg(opt("price", "Price per share"))
                        .arg(opt("date", "Effective date YYYY-MM-DD (default today)"))
                        .arg(opt("effect", "credit|debit, required for ADJUSTMENT"))
                        .arg(opt("reference", "External reference"))
                        .arg(opt("note", "Note")),
                )
                .subcommand(
                    Command::new("complete")
                        .about("Complete a transaction and apply it to the balance (admin)")
                        .arg(id_arg()),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transactions, newest first")
                        .arg(opt("shareholder", "Shareholder identifier"))
                        .arg(opt("status", "Workflow status"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
            "transaction",
        ))
        .subcommand(status_commands(
            Command::new("transfer")
                .about("Share transfers between holders")
                .subcommand(
                    Command::new("create")
                        .about("Record a draft transfer")
                        .arg(opt("from", "Seller identifier").required(true))
                        .arg(opt("to", "Buyer identifier").required(true))
                        .arg(opt("shares", "Number of shares (positive)").required(true))
                        .arg(opt("price", "Price per share"))
                        .arg(opt("date", "Transfer date YYYY-MM-DD (default today)"))
                        .arg(opt("note", "Note")),
                )
                .subcommand(
                    Command::new("execute")
                        .about("Execute a pending or approved transfer (admin)")
                        .arg(id_arg()),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List transfers, newest first")
                        .arg(opt("status", "Workflow status"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )),
            "transfer",
        ))
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(json_flags(
                    Command::new("dashboard").about("Headline figures and recent activity"),
                ))
                .subcommand(json_flags(
                    Command::new("register").about("Share register with ownership percentages"),
                )),
        )
        .subcommand(
            Command::new("export")
                .about("Export data")
                .subcommand(
                    Command::new("register")
                        .about("Export the share register")
                        .arg(opt("format", "csv|json").default_value("csv"))
                        .arg(opt("out", "Output path").required(true)),
                )
                .subcommand(
                    Command::new("transactions")
                        .about("Export the transaction history")
                        .arg(opt("format", "csv|json").default_value("csv"))
                        .arg(opt("out", "Output path").required(true)),
                ),
        )
        .subcommand(
            Command::new("doctor")
                .about("Reconcile cached balances against the ledger")
                .arg(
                    Arg::new("fix")
                        .long("fix")
                        .action(ArgAction::SetTrue)
                        .help("Overwrite mismatched balances with the ledger value (admin)"),
                ),
        )
        .subcommand(
            Command::new("admin")
                .about("Administrators")
                .subcommand(
                    Command::new("grant")
                        .about("Grant administrator rights")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(
                    Command::new("revoke")
                        .about("Revoke administrator rights")
                        .arg(Arg::new("name").required(true)),
                )
                .subcommand(Command::new("list").about("List administrators")),
        )
}

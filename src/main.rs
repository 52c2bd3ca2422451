// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use share_registry::{auth, cli, commands, company, config::Config, db};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let cfg = Config::from_matches(&matches)?;
    let mut conn = db::open_at(&cfg.db_path)?;
    let actor = auth::resolve(&conn, &cfg.actor)?;
    log::debug!("acting as {} (admin: {})", actor.name, actor.is_admin);

    match matches.subcommand() {
        Some(("init", _)) => {
            let c = company::get_or_create(&conn)?;
            println!(
                "Database initialized at {} for '{}'",
                cfg.db_path.display(),
                c.name
            );
        }
        Some(("company", sub)) => commands::company::handle(&conn, &actor, sub)?,
        Some(("shareholder", sub)) => commands::shareholders::handle(&mut conn, &actor, sub)?,
        Some(("director", sub)) => commands::directors::handle(&conn, &actor, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut conn, &actor, sub)?,
        Some(("transfer", sub)) => commands::transfers::handle(&mut conn, &actor, sub)?,
        Some(("report", sub)) => commands::reports::handle(&conn, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", sub)) => commands::doctor::handle(&mut conn, &actor, sub)?,
        Some(("admin", sub)) => commands::admin::handle(&conn, &actor, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Load an optional JSON config, start logging and open the roster store.
//! - Print version and schema state as deterministic `key=value` lines.
//! - List one class roster with the configured page limits.
//!
//! Usage: `classroll_cli [config.json] [roster <class_id> <actor_id> [search]]`

use classroll_core::db::migrations::current_user_version;
use classroll_core::{
    core_version, init_logging, open_db_with_options, ActorId, ClassId, CoreConfig,
    EnrollmentCoordinator, RosterPageRequest, SqliteDirectoryRepository,
    SqliteEnrollmentRepository,
};
use log::info;
use rusqlite::Connection;
use std::process::ExitCode;

const ROSTER_COMMAND: &str = "roster";

#[derive(Debug, PartialEq, Eq)]
struct RosterArgs {
    class_id: ClassId,
    actor_id: ActorId,
    search_term: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    config_path: Option<String>,
    roster: Option<RosterArgs>,
}

fn main() -> ExitCode {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match parse_args(&args).and_then(run) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("classroll error={message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<CliArgs, String> {
    let (config_path, rest) = match args.split_first() {
        Some((first, rest)) if first != ROSTER_COMMAND => (Some(first.clone()), rest),
        _ => (None, args),
    };

    let roster = match rest.split_first() {
        None => None,
        Some((command, params)) if command == ROSTER_COMMAND => {
            let [class_id, actor_id, search @ ..] = params else {
                return Err("usage: roster <class_id> <actor_id> [search]".to_string());
            };
            Some(RosterArgs {
                class_id: class_id
                    .parse()
                    .map_err(|_| format!("invalid class id `{class_id}`"))?,
                actor_id: actor_id
                    .parse()
                    .map_err(|_| format!("invalid actor id `{actor_id}`"))?,
                search_term: (!search.is_empty()).then(|| search.join(" ")),
            })
        }
        Some((other, _)) => return Err(format!("unknown command `{other}`")),
    };

    Ok(CliArgs {
        config_path,
        roster,
    })
}

fn run(args: CliArgs) -> Result<(), String> {
    let config = match args.config_path.as_deref() {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .map_err(|err| format!("cannot read config `{path}`: {err}"))?;
            CoreConfig::from_json_str(&raw)
                .map_err(|err| format!("invalid config `{path}`: {err}"))?
        }
        None => CoreConfig::default(),
    };

    if let Some(log_dir) = config.log_dir.as_deref() {
        let log_dir = log_dir
            .to_str()
            .ok_or_else(|| format!("log_dir `{}` is not valid UTF-8", log_dir.display()))?;
        init_logging(config.log_level, log_dir).map_err(|err| err.to_string())?;
    }

    let conn = open_db_with_options(&config.db_path, config.store_options())
        .map_err(|err| err.to_string())?;

    match args.roster {
        Some(roster) => print_roster(&conn, &config, roster),
        None => print_status(&conn, &config),
    }
}

fn print_status(conn: &Connection, config: &CoreConfig) -> Result<(), String> {
    let schema_version = current_user_version(conn).map_err(|err| err.to_string())?;
    info!(
        "event=cli_status module=cli status=ok schema_version={schema_version} db_path={}",
        config.db_path.display()
    );

    println!("classroll_core version={}", core_version());
    println!("classroll_core db_path={}", config.db_path.display());
    println!("classroll_core schema_version={schema_version}");
    Ok(())
}

fn print_roster(conn: &Connection, config: &CoreConfig, args: RosterArgs) -> Result<(), String> {
    let coordinator = EnrollmentCoordinator::new(
        SqliteDirectoryRepository::new(conn),
        SqliteEnrollmentRepository::new(conn),
    )
    .with_page_limits(config.page_limits());

    let request = RosterPageRequest {
        search_term: args.search_term,
        ..RosterPageRequest::default()
    };
    let result = coordinator
        .get_class_students(args.class_id, args.actor_id, &request)
        .map_err(|err| format!("{} {err}", err.kind()))?;

    println!(
        "class_id={} total_count={} page={} page_size={}",
        args.class_id, result.total_count, result.page, result.page_size
    );
    for row in &result.rows {
        println!(
            "student_id={} nis={} full_name={}",
            row.student_id,
            row.nis.as_deref().unwrap_or("-"),
            row.full_name
        );
    }
    Ok(())
}

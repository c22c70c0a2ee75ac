//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `rollcall_core` linkage with a deterministic probe.
//! - Given a `.toml` config or a database path, print dashboard counts for
//!   both contexts.

use rollcall_core::{
    open_db, Context, ReportService, ReportSettings, RollcallConfig, SqliteAttendanceStore,
    SqliteParticipantRepository, SqliteSessionRepository,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("rollcall_core ping={}", rollcall_core::ping());
    println!("rollcall_core version={}", rollcall_core::core_version());

    let Some(arg) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match run(Path::new(&arg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            log::error!("event=cli_run module=cli status=error error={message}");
            ExitCode::FAILURE
        }
    }
}

fn run(arg: &Path) -> Result<(), String> {
    let (db_path, settings) = resolve_target(arg)?;
    let conn = open_db(&db_path).map_err(|err| err.to_string())?;
    println!("database={}", db_path.display());

    for context in Context::ALL {
        let reports = ReportService::new(
            SqliteParticipantRepository::try_new(&conn, context).map_err(|err| err.to_string())?,
            SqliteSessionRepository::try_new(&conn, context).map_err(|err| err.to_string())?,
            SqliteAttendanceStore::try_new(&conn, context).map_err(|err| err.to_string())?,
            settings,
        );
        let dashboard = reports.dashboard().map_err(|err| err.to_string())?;
        let last = dashboard
            .last_session_date
            .map(|date| date.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} participants={} sessions={} last_session={}",
            context.as_str(),
            dashboard.total_participants,
            dashboard.total_sessions,
            last
        );
    }
    Ok(())
}

fn resolve_target(arg: &Path) -> Result<(PathBuf, ReportSettings), String> {
    if arg.extension().and_then(|ext| ext.to_str()) != Some("toml") {
        return Ok((arg.to_path_buf(), ReportSettings::default()));
    }

    let config = RollcallConfig::load(arg).map_err(|err| err.to_string())?;
    rollcall_core::init_from_config(&config)?;
    let db_path = config
        .database_path
        .clone()
        .ok_or_else(|| format!("`{}` does not set database_path", arg.display()))?;
    Ok((db_path, config.reports))
}

//! Command handlers; one pooled connection per command.

use crate::cli::{AttendanceAction, Cli, Commands, StudentAction, StudentArgs};
use anyhow::Context;
use chrono::Local;
use log::info;
use rollcall_core::{
    init_logging, list_attendance, record_attendance, AdminContext, ConnectionPool,
    ListAttendanceRequest, RecordAttendanceRequest, RollcallConfig, SqliteStudentRepository,
    Student, StudentDirectory, StudentProfile,
};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

/// Runs one command; `version` never touches configuration or the store.
pub fn dispatch(cli: Cli) -> anyhow::Result<Value> {
    let ctx = AdminContext::new(cli.operator);
    match cli.command {
        Commands::Version => Ok(json!({ "version": rollcall_core::core_version() })),
        Commands::Student { action } => {
            let (_, pool) = open_store(cli.config.as_deref(), cli.db)?;
            student(action, &ctx, &pool)
        }
        Commands::Scan { idno, at } => {
            let (_, pool) = open_store(cli.config.as_deref(), cli.db)?;
            let occurred_at = at.unwrap_or_else(|| Local::now().naive_local());
            let response = record_attendance(&pool, &RecordAttendanceRequest { idno }, occurred_at)
                .context("failed to record attendance")?;
            Ok(serde_json::to_value(response)?)
        }
        Commands::Attendance {
            action: AttendanceAction::List { date },
        } => {
            let (config, pool) = open_store(cli.config.as_deref(), cli.db)?;
            let request = ListAttendanceRequest { date };
            let response = list_attendance(&pool, &request, config.recent_limit)
                .context("failed to list attendance")?;
            Ok(serde_json::to_value(response)?)
        }
    }
}

/// Loads configuration, starts file logging when configured and opens the pool.
fn open_store(
    config_file: Option<&Path>,
    db_override: Option<PathBuf>,
) -> anyhow::Result<(RollcallConfig, ConnectionPool)> {
    let mut config =
        RollcallConfig::load_from(config_file).context("failed to load rollcall configuration")?;
    if let Some(db) = db_override {
        config.db_path = db;
    }

    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let pool = ConnectionPool::open(&config.db_path, config.pool_options())
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;
    info!(
        "event=cli_ready module=cli status=ok pool_size={}",
        pool.max_size()
    );
    Ok((config, pool))
}

fn student(
    action: StudentAction,
    ctx: &AdminContext,
    pool: &ConnectionPool,
) -> anyhow::Result<Value> {
    let conn = pool.get()?;
    let directory = StudentDirectory::new(SqliteStudentRepository::try_new(&conn)?);

    let value = match action {
        StudentAction::Add(args) => {
            let (idno, profile) = split_args(args);
            let student = directory
                .register(ctx, &Student::new(idno, profile))
                .context("failed to register student")?;
            json!({ "success": true, "student": student })
        }
        StudentAction::Edit(args) => {
            let (idno, profile) = split_args(args);
            let student = directory
                .update(ctx, &idno, &profile)
                .context("failed to update student")?;
            json!({ "success": true, "student": student })
        }
        StudentAction::Remove { idno } => {
            directory
                .remove(ctx, &idno)
                .context("failed to remove student")?;
            json!({ "success": true, "message": "Student deleted successfully" })
        }
        StudentAction::Show { idno } => {
            let student = directory.lookup(&idno)?;
            json!({ "student": student })
        }
        StudentAction::List => json!({ "students": directory.list()? }),
    };
    Ok(value)
}

fn split_args(args: StudentArgs) -> (String, StudentProfile) {
    let profile = StudentProfile::new(args.lastname, args.firstname, args.course, args.level);
    (args.idno, profile)
}

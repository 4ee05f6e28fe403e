//! Command-line surface.

use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "rollcall", about = "School attendance tracker", version)]
pub struct Cli {
    /// TOML config file (defaults to ./rollcall.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding configuration.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Operator name required by student administration commands.
    #[arg(long, global = true, default_value = "")]
    pub operator: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage the student directory.
    Student {
        #[command(subcommand)]
        action: StudentAction,
    },
    /// Record a scan for a student identifier.
    Scan {
        idno: String,
        /// Local timestamp `YYYY-MM-DDTHH:MM:SS`; defaults to now.
        #[arg(long, value_parser = parse_timestamp)]
        at: Option<NaiveDateTime>,
    },
    /// Attendance reports.
    Attendance {
        #[command(subcommand)]
        action: AttendanceAction,
    },
    /// Print the core version.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum StudentAction {
    /// Register a new student.
    Add(StudentArgs),
    /// Replace name, course and level of a student.
    Edit(StudentArgs),
    /// Delete a student; attendance history is kept.
    Remove { idno: String },
    /// Show one student.
    Show { idno: String },
    /// List all students.
    List,
}

#[derive(Debug, Args)]
pub struct StudentArgs {
    pub idno: String,
    #[arg(long)]
    pub lastname: String,
    #[arg(long)]
    pub firstname: String,
    #[arg(long)]
    pub course: String,
    #[arg(long)]
    pub level: String,
}

#[derive(Debug, Subcommand)]
pub enum AttendanceAction {
    /// List one day, or the most recent records when no date is given.
    List {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn parse_timestamp(value: &str) -> Result<NaiveDateTime, String> {
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| format!("expected YYYY-MM-DDTHH:MM:SS, got `{value}`"))
}

#[cfg(test)]
mod tests {
    use super::{AttendanceAction, Cli, Commands, StudentAction};
    use clap::{CommandFactory, Parser};

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn scan_accepts_both_timestamp_forms() {
        for at in ["2024-01-10T08:00:00", "2024-01-10 08:00:00"] {
            let cli = Cli::try_parse_from(["rollcall", "scan", "2021-001", "--at", at]).unwrap();
            match cli.command {
                Commands::Scan { idno, at } => {
                    assert_eq!(idno, "2021-001");
                    assert_eq!(at.unwrap().to_string(), "2024-01-10 08:00:00");
                }
                other => panic!("unexpected command: {other:?}"),
            }
        }
    }

    #[test]
    fn scan_rejects_date_only_timestamp() {
        assert!(Cli::try_parse_from(["rollcall", "scan", "x", "--at", "2024-01-10"]).is_err());
    }

    #[test]
    fn student_add_requires_every_field() {
        assert!(Cli::try_parse_from([
            "rollcall", "student", "add", "2021-001", "--lastname", "Doe"
        ])
        .is_err());

        let cli = Cli::try_parse_from([
            "rollcall",
            "--operator",
            "registrar",
            "student",
            "add",
            "2021-001",
            "--lastname",
            "Doe",
            "--firstname",
            "Jane",
            "--course",
            "BSCS",
            "--level",
            "3rd Year",
        ])
        .unwrap();
        assert_eq!(cli.operator, "registrar");
        assert!(matches!(
            cli.command,
            Commands::Student {
                action: StudentAction::Add(_)
            }
        ));
    }

    #[test]
    fn attendance_list_parses_optional_date() {
        let args = ["rollcall", "attendance", "list", "--date", "2024-01-10"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Attendance {
                action: AttendanceAction::List { date },
            } => assert_eq!(date.unwrap().to_string(), "2024-01-10"),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

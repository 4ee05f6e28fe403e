use chrono::NaiveDate;
use rollcall_core::db::migrations::latest_version;
use rollcall_core::db::{open_db, open_db_in_memory, DbError};
use rollcall_core::{
    AttendanceRepository, RepoError, SqliteAttendanceRepository, SqliteStudentRepository,
    StudentProfile, StudentRepository,
};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_table_exists(&conn, "students");
    assert_table_exists(&conn, "attendance");
    assert_index_exists(&conn, "idx_attendance_idno_date");
}

#[test]
fn opening_same_database_twice_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("school.db");

    let conn_first = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_first), latest_version());
    drop(conn_first);

    let conn_second = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn_second), latest_version());
    assert_table_exists(&conn_second, "students");
}

#[test]
fn open_db_creates_missing_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db").join("school.db");

    open_db(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn upgrade_from_v1_keeps_earliest_of_duplicate_daily_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(include_str!("../src/db/migrations/0001_init.sql"))
        .unwrap();
    conn.execute_batch(
        "INSERT INTO attendance (idno, lastname, firstname, course, level, time_in, date)
         VALUES
            ('2021-001', 'Doe', 'Jane', 'BSCS', '3rd Year', '2024-01-10 08:00:00', '2024-01-10'),
            ('2021-001', 'Doe', 'Jane', 'BSCS', '3rd Year', '2024-01-10 08:00:01', '2024-01-10'),
            ('2021-001', 'Doe', 'Jane', 'BSCS', '3rd Year', '2024-01-11 08:00:00', '2024-01-11');
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let times: Vec<String> = conn
        .prepare("SELECT time_in FROM attendance ORDER BY id;")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(times, vec!["2024-01-10 08:00:00", "2024-01-11 08:00:00"]);

    let superseded: String = conn
        .query_row("SELECT time_in FROM attendance_superseded;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(superseded, "2024-01-10 08:00:01");
}

#[test]
fn database_from_legacy_app_supports_edit_and_read() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("db").join("school.db");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE students (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idno TEXT NOT NULL UNIQUE,
            lastname TEXT NOT NULL,
            firstname TEXT NOT NULL,
            course TEXT NOT NULL,
            level TEXT NOT NULL
        );
        CREATE TABLE attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idno TEXT NOT NULL,
            lastname TEXT NOT NULL,
            firstname TEXT NOT NULL,
            course TEXT NOT NULL,
            level TEXT NOT NULL,
            time_in TEXT NOT NULL,
            date TEXT NOT NULL
        );
        INSERT INTO students (idno, lastname, firstname, course, level)
        VALUES ('2021-001', 'Doe', 'Jane', 'BSCS', '3rd Year');
        INSERT INTO attendance (idno, lastname, firstname, course, level, time_in, date)
        VALUES ('2021-001', 'Doe', 'Jane', 'BSCS', '3rd Year', '2024-01-10 08:00:00', '2024-01-10');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());

    let students = SqliteStudentRepository::try_new(&conn).unwrap();
    let updated = students
        .update_student(
            "2021-001",
            &StudentProfile::new("Doe", "Jane", "BSIT", "4th Year"),
        )
        .unwrap();
    assert_eq!(updated.profile.course, "BSIT");

    let attendance = SqliteAttendanceRepository::try_new(&conn).unwrap();
    let existing = attendance
        .find_for_date("2021-001", NaiveDate::from_ymd_opt(2024, 1, 10).unwrap())
        .unwrap()
        .expect("legacy row should be readable");
    assert_eq!(existing.snapshot.course, "BSCS");
}

#[test]
fn repositories_reject_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteStudentRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert_eq!(expected_version, latest_version()),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repositories_reject_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE attendance (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            idno TEXT NOT NULL,
            time_in TEXT NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteAttendanceRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "attendance",
            column: "lastname"
        })
    ));
    assert!(matches!(
        SqliteStudentRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("students"))
    ));
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    assert_schema_object(conn, "table", table_name);
}

fn assert_index_exists(conn: &Connection, index_name: &str) {
    assert_schema_object(conn, "index", index_name);
}

fn assert_schema_object(conn: &Connection, kind: &str, name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "{kind} {name} does not exist");
}

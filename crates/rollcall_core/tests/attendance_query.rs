use chrono::{NaiveDate, NaiveDateTime};
use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AttendanceQuery, AttendanceRecorder, SqliteAttendanceRepository, SqliteStudentRepository,
    Student, StudentProfile, StudentRepository,
};
use rusqlite::Connection;

fn at(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").unwrap()
}

fn day(value: &str) -> NaiveDate {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap()
}

fn seed_students(conn: &Connection, count: usize) -> Vec<String> {
    let repo = SqliteStudentRepository::try_new(conn).unwrap();
    (0..count)
        .map(|index| {
            let idno = format!("2021-{index:03}");
            repo.create_student(&Student::new(
                idno.clone(),
                StudentProfile::new("Doe", format!("Student{index}"), "BSCS", "1st Year"),
            ))
            .unwrap();
            idno
        })
        .collect()
}

fn scan(conn: &Connection, idno: &str, occurred_at: &str) {
    AttendanceRecorder::new(
        SqliteStudentRepository::try_new(conn).unwrap(),
        SqliteAttendanceRepository::try_new(conn).unwrap(),
    )
    .record(idno, at(occurred_at))
    .unwrap();
}

fn query(conn: &Connection) -> AttendanceQuery<SqliteAttendanceRepository<'_>> {
    AttendanceQuery::new(SqliteAttendanceRepository::try_new(conn).unwrap())
}

#[test]
fn dated_listing_is_earliest_scan_first() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_students(&conn, 3);
    scan(&conn, &ids[0], "2024-01-10T09:30:00");
    scan(&conn, &ids[1], "2024-01-10T07:45:00");
    scan(&conn, &ids[2], "2024-01-10T08:15:00");
    scan(&conn, &ids[0], "2024-01-11T07:00:00");

    let records = query(&conn).list(Some(day("2024-01-10"))).unwrap();
    let times: Vec<String> = records.iter().map(|record| record.time_of_day()).collect();
    assert_eq!(times, vec!["07:45:00", "08:15:00", "09:30:00"]);
    assert!(records.iter().all(|record| record.date == day("2024-01-10")));
}

#[test]
fn dated_listing_for_empty_day_is_empty() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_students(&conn, 1);
    scan(&conn, &ids[0], "2024-01-10T08:00:00");

    assert!(query(&conn).list(Some(day("2024-01-09"))).unwrap().is_empty());
}

#[test]
fn undated_listing_is_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_students(&conn, 2);
    scan(&conn, &ids[0], "2024-01-10T08:00:00");
    scan(&conn, &ids[1], "2024-01-10T09:00:00");
    scan(&conn, &ids[0], "2024-01-11T07:30:00");

    let records = query(&conn).list(None).unwrap();
    let stamps: Vec<(NaiveDate, String)> = records
        .iter()
        .map(|record| (record.date, record.time_of_day()))
        .collect();
    assert_eq!(
        stamps,
        vec![
            (day("2024-01-11"), "07:30:00".to_string()),
            (day("2024-01-10"), "09:00:00".to_string()),
            (day("2024-01-10"), "08:00:00".to_string()),
        ]
    );
}

#[test]
fn undated_listing_honors_recent_limit() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_students(&conn, 5);
    for (index, idno) in ids.iter().enumerate() {
        scan(&conn, idno, &format!("2024-01-10T08:0{index}:00"));
    }

    let records = query(&conn).with_recent_limit(2).list(None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].time_of_day(), "08:04:00");
    assert_eq!(records[1].time_of_day(), "08:03:00");
}

#[test]
fn recent_limit_is_clamped() {
    let conn = open_db_in_memory().unwrap();
    assert_eq!(query(&conn).recent_limit(), 100);
    assert_eq!(query(&conn).with_recent_limit(0).recent_limit(), 1);
    assert_eq!(query(&conn).with_recent_limit(50_000).recent_limit(), 1000);
}

#[test]
fn listing_reports_snapshot_taken_at_scan_time() {
    let conn = open_db_in_memory().unwrap();
    let ids = seed_students(&conn, 1);
    scan(&conn, &ids[0], "2024-01-10T08:00:00");

    SqliteStudentRepository::try_new(&conn)
        .unwrap()
        .update_student(
            &ids[0],
            &StudentProfile::new("Smith", "Student0", "BSIT", "2nd Year"),
        )
        .unwrap();

    let records = query(&conn).list(Some(day("2024-01-10"))).unwrap();
    assert_eq!(records[0].snapshot.lastname, "Doe");
    assert_eq!(records[0].snapshot.course, "BSCS");
}

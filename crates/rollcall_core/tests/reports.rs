use chrono::NaiveDate;
use rollcall_core::db::open_db_in_memory;
use rollcall_core::service::contact::whatsapp_link_for;
use rollcall_core::{
    AttendanceRecord, AttendanceStore, Context, Lesson, MinistryParticipant, Participant,
    ParticipantId, ParticipantRepository, ReportService, ReportSettings, Session, SessionId,
    SessionRepository, SqliteAttendanceStore, SqliteParticipantRepository,
    SqliteSessionRepository,
};
use rusqlite::Connection;

type SqliteReports<'conn> = ReportService<
    SqliteParticipantRepository<'conn>,
    SqliteSessionRepository<'conn>,
    SqliteAttendanceStore<'conn>,
>;

fn reports(conn: &Connection, settings: ReportSettings) -> SqliteReports<'_> {
    ReportService::new(
        SqliteParticipantRepository::try_new(conn, Context::Ministry).unwrap(),
        SqliteSessionRepository::try_new(conn, Context::Ministry).unwrap(),
        SqliteAttendanceStore::try_new(conn, Context::Ministry).unwrap(),
        settings,
    )
}

fn add_child(conn: &Connection, name: &str, phone: Option<&str>) -> ParticipantId {
    let mut child = MinistryParticipant::new(name);
    child.guardian_contact = phone.map(str::to_string);
    SqliteParticipantRepository::try_new(conn, Context::Ministry)
        .unwrap()
        .create_participant(&Participant::from(child))
        .unwrap()
}

fn add_lesson(conn: &Connection, day: u32, records: &[(ParticipantId, bool)]) -> SessionId {
    let date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
    let id = SqliteSessionRepository::try_new(conn, Context::Ministry)
        .unwrap()
        .create_session(&Session::from(Lesson::new(format!("Aula {day}"), date)))
        .unwrap();
    let records: Vec<AttendanceRecord> = records
        .iter()
        .map(|(participant_id, present)| AttendanceRecord {
            participant_id: *participant_id,
            present: *present,
        })
        .collect();
    SqliteAttendanceStore::try_new(conn, Context::Ministry)
        .unwrap()
        .replace_attendance(id, &records)
        .unwrap();
    id
}

#[test]
fn participant_stats_round_percentages_and_skip_unrecorded() {
    let conn = open_db_in_memory().unwrap();
    let ana = add_child(&conn, "Ana", None);
    let bia = add_child(&conn, "Bia", None);
    add_child(&conn, "Caio", None);

    add_lesson(&conn, 3, &[(ana, true), (bia, false)]);
    add_lesson(&conn, 10, &[(ana, true), (bia, true)]);
    add_lesson(&conn, 17, &[(ana, false), (bia, false)]);

    let stats = reports(&conn, ReportSettings::default())
        .participant_stats()
        .unwrap();
    let rows: Vec<(&str, u32, u32, Option<u32>)> = stats
        .iter()
        .map(|report| {
            (
                report.participant.name(),
                report.presences,
                report.absences,
                report.percentage,
            )
        })
        .collect();
    assert_eq!(rows, vec![("Ana", 2, 1, Some(67)), ("Bia", 1, 2, Some(33))]);
}

#[test]
fn low_attendance_uses_strict_threshold() {
    let conn = open_db_in_memory().unwrap();
    let ana = add_child(&conn, "Ana", None);
    let bia = add_child(&conn, "Bia", None);
    add_lesson(&conn, 3, &[(ana, true), (bia, true)]);
    add_lesson(&conn, 10, &[(ana, false), (bia, false)]);
    add_lesson(&conn, 17, &[(ana, false), (bia, true)]);

    let service = reports(&conn, ReportSettings::default());
    let low: Vec<String> = service
        .low_attendance()
        .unwrap()
        .iter()
        .map(|report| report.participant.name().to_string())
        .collect();
    assert_eq!(low, vec!["Ana"]);

    let strict = reports(
        &conn,
        ReportSettings {
            low_attendance_percent: 67,
            recent_sessions: 10,
        },
    );
    assert_eq!(strict.low_attendance().unwrap().len(), 1);

    let lenient = reports(
        &conn,
        ReportSettings {
            low_attendance_percent: 68,
            recent_sessions: 10,
        },
    );
    assert_eq!(lenient.low_attendance().unwrap().len(), 2);
}

#[test]
fn absent_last_session_skips_sessions_without_records() {
    let conn = open_db_in_memory().unwrap();
    let ana = add_child(&conn, "Ana", Some("(11) 97777-6666"));
    let bia = add_child(&conn, "Bia", None);
    let recorded = add_lesson(&conn, 10, &[(ana, false), (bia, true)]);
    add_lesson(&conn, 17, &[]);

    let report = reports(&conn, ReportSettings::default())
        .absent_last_session()
        .unwrap()
        .unwrap();
    assert_eq!(report.session.id(), recorded);
    assert_eq!(report.absent.len(), 1);
    assert_eq!(report.absent[0].name(), "Ana");

    let link = whatsapp_link_for(&report.absent[0], "55").unwrap();
    assert_eq!(link.path(), "/5511977776666");
}

#[test]
fn absent_last_session_is_none_without_any_record() {
    let conn = open_db_in_memory().unwrap();
    add_child(&conn, "Ana", None);
    add_lesson(&conn, 3, &[]);

    let report = reports(&conn, ReportSettings::default())
        .absent_last_session()
        .unwrap();
    assert!(report.is_none());
}

#[test]
fn recent_sessions_are_limited_and_counted() {
    let conn = open_db_in_memory().unwrap();
    let ana = add_child(&conn, "Ana", None);
    let bia = add_child(&conn, "Bia", None);
    add_lesson(&conn, 3, &[(ana, true), (bia, true)]);
    add_lesson(&conn, 10, &[(ana, true), (bia, false)]);
    add_lesson(&conn, 17, &[(ana, false)]);

    let service = reports(
        &conn,
        ReportSettings {
            low_attendance_percent: 50,
            recent_sessions: 2,
        },
    );
    let recent = service.recent_sessions().unwrap();
    let rows: Vec<(&str, usize, usize, usize)> = recent
        .iter()
        .map(|report| (report.session.title(), report.present, report.absent, report.total))
        .collect();
    assert_eq!(rows, vec![("Aula 17", 0, 1, 1), ("Aula 10", 1, 1, 2)]);
}

#[test]
fn dashboard_counts_roster_and_catalog() {
    let conn = open_db_in_memory().unwrap();
    let empty = reports(&conn, ReportSettings::default()).dashboard().unwrap();
    assert_eq!(empty.total_participants, 0);
    assert_eq!(empty.total_sessions, 0);
    assert_eq!(empty.last_session_date, None);

    add_child(&conn, "Ana", None);
    add_lesson(&conn, 3, &[]);
    add_lesson(&conn, 24, &[]);

    let dashboard = reports(&conn, ReportSettings::default()).dashboard().unwrap();
    assert_eq!(dashboard.context, Context::Ministry);
    assert_eq!(dashboard.total_participants, 1);
    assert_eq!(dashboard.total_sessions, 2);
    assert_eq!(
        dashboard.last_session_date,
        NaiveDate::from_ymd_opt(2024, 3, 24)
    );
}

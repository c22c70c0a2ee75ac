use chrono::{NaiveDate, NaiveTime};
use rollcall_core::db::open_db_in_memory;
use rollcall_core::{
    AttendanceRecord, AttendanceStore, Context, EventType, Lesson, MinistryParticipant,
    Participant, ParticipantRepository, ReceptionEvent, RepoError, ServiceError, Session,
    SessionRepository, SessionService, SqliteAttendanceStore, SqliteParticipantRepository,
    SqliteSessionRepository, ValidationError,
};
use uuid::Uuid;

fn date(month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, month, day).unwrap()
}

#[test]
fn reception_event_roundtrip_keeps_time_and_type() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SessionService::new(SqliteSessionRepository::try_new(&conn, Context::Reception).unwrap());

    let mut event = ReceptionEvent::new("Culto de domingo", date(4, 7), EventType::Service);
    event.start_time = Some(NaiveTime::from_hms_opt(19, 30, 0).unwrap());
    event.leader = Some("Pr. Paulo".to_string());

    let created = service.create_session(&Session::from(event.clone())).unwrap();
    assert_eq!(created, Session::from(event.clone()));

    event.event_type = EventType::SpecialEvent;
    event.title = "Conferência".to_string();
    let updated = service.update_session(&Session::from(event.clone())).unwrap();
    assert_eq!(updated.title(), "Conferência");
    match updated {
        Session::Reception(saved) => assert_eq!(saved.event_type, EventType::SpecialEvent),
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn sessions_are_listed_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SessionService::new(SqliteSessionRepository::try_new(&conn, Context::Ministry).unwrap());

    for (title, day) in [("Aula 2", 10), ("Aula 1", 3), ("Aula 3", 17)] {
        service
            .create_session(&Session::from(Lesson::new(title, date(3, day))))
            .unwrap();
    }

    let titles: Vec<String> = service
        .list_sessions()
        .unwrap()
        .iter()
        .map(|session| session.title().to_string())
        .collect();
    assert_eq!(titles, vec!["Aula 3", "Aula 2", "Aula 1"]);
}

#[test]
fn blank_title_is_rejected() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SessionService::new(SqliteSessionRepository::try_new(&conn, Context::Ministry).unwrap());

    let err = service
        .create_session(&Session::from(Lesson::new("  ", date(3, 3))))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(ValidationError::BlankTitle)));
    assert!(service.list_sessions().unwrap().is_empty());
}

#[test]
fn catalog_rejects_sessions_of_the_other_context() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteSessionRepository::try_new(&conn, Context::Ministry).unwrap();

    let event = ReceptionEvent::new("Reunião", date(3, 5), EventType::Meeting);
    assert!(matches!(
        repo.create_session(&Session::from(event)),
        Err(RepoError::InvalidData(_))
    ));
}

#[test]
fn deleting_session_cascades_to_attendance() {
    let conn = open_db_in_memory().unwrap();
    let sessions = SqliteSessionRepository::try_new(&conn, Context::Ministry).unwrap();
    let participants = SqliteParticipantRepository::try_new(&conn, Context::Ministry).unwrap();
    let store = SqliteAttendanceStore::try_new(&conn, Context::Ministry).unwrap();

    let child = Participant::from(MinistryParticipant::new("Ana"));
    participants.create_participant(&child).unwrap();
    let lesson = Lesson::new("Aula 1", date(3, 3));
    sessions.create_session(&Session::from(lesson.clone())).unwrap();
    store
        .replace_attendance(
            lesson.id,
            &[AttendanceRecord {
                participant_id: child.id(),
                present: false,
            }],
        )
        .unwrap();

    sessions.delete_session(lesson.id).unwrap();
    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM attendance;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
    assert!(sessions.get_session(lesson.id).unwrap().is_none());
}

#[test]
fn missing_session_updates_and_deletes_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service =
        SessionService::new(SqliteSessionRepository::try_new(&conn, Context::Ministry).unwrap());
    let lesson = Lesson::new("Aula fantasma", date(3, 3));

    assert!(matches!(
        service.update_session(&Session::from(lesson.clone())),
        Err(ServiceError::NotFound(id)) if id == lesson.id
    ));
    let missing = Uuid::new_v4();
    assert!(matches!(
        service.delete_session(missing),
        Err(ServiceError::NotFound(id)) if id == missing
    ));
}

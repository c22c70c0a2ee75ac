use rollcall_core::db::migrations::latest_version;
use rollcall_core::db::{open_db, open_db_in_memory, DbError, BUSY_TIMEOUT};
use rollcall_core::{Context, RepoError, SqliteParticipantRepository};
use rusqlite::Connection;

#[test]
fn in_memory_database_has_both_context_schemas() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    for context in Context::ALL {
        let schema = context.schema();
        assert_table_exists(&conn, schema.groups_table);
        assert_table_exists(&conn, schema.participants_table);
        assert_table_exists(&conn, schema.sessions_table);
        assert_table_exists(&conn, schema.attendance_table);
    }
}

#[test]
fn connections_enforce_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);

    let err = conn
        .execute(
            "INSERT INTO attendance (lesson_id, student_id, present)
             VALUES ('missing', 'missing', 1);",
            [],
        )
        .unwrap_err();
    assert!(err.to_string().contains("FOREIGN KEY"));
}

#[test]
fn reopening_file_database_keeps_schema_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rollcall.db");

    let first = open_db(&path).unwrap();
    first
        .execute(
            "INSERT INTO groups (id, name)
             VALUES ('00000000-0000-4000-8000-000000000001', 'Juniores');",
            [],
        )
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let groups: i64 = second
        .query_row("SELECT COUNT(*) FROM groups;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(groups, 1);
}

#[test]
fn newer_schema_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = open_db(&path).unwrap_err().to_string();
    assert!(message.contains("schema version 999"));
    assert!(message.contains("ministry or reception data"));
}

#[test]
fn failing_schema_step_names_itself_and_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("half.db");

    // Ministry schema marked as applied, with a stray reception table that
    // the reception step cannot create over.
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE reception_groups (id TEXT PRIMARY KEY);
         PRAGMA user_version = 1;",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match &err {
        DbError::Migration { version, name, .. } => {
            assert_eq!(*version, 2);
            assert_eq!(*name, "reception");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().starts_with("schema step 2 (reception tables) failed"));
    assert!(std::error::Error::source(&err).is_some());

    let conn = Connection::open(&path).unwrap();
    assert_eq!(schema_version(&conn), 1);
    let members: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = 'reception_members';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(members, 0);
}

#[test]
fn repositories_refuse_unmigrated_connections() {
    let conn = Connection::open_in_memory().unwrap();
    match SqliteParticipantRepository::try_new(&conn, Context::Reception) {
        Err(RepoError::MissingRequiredTable(table)) => assert_eq!(table, "reception_members"),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("repository must not open without its tables"),
    }
}

#[test]
fn busy_timeout_is_five_seconds() {
    assert_eq!(BUSY_TIMEOUT.as_secs(), 5);
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}

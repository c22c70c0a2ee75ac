//! Session catalog contracts and SQLite implementation.
//!
//! # Invariants
//! - Catalog order is `date DESC, id ASC` (newest first).
//! - Deleting a session cascades to its attendance rows.

use crate::model::context::Context;
use crate::model::session::{EventType, Lesson, ReceptionEvent, Session, SessionId};
use crate::repo::{
    date_to_db, ensure_tables, parse_date, parse_optional_uuid, parse_uuid, RepoError, RepoResult,
};
use chrono::NaiveTime;
use rusqlite::{params, Connection, Row};

const LESSON_SELECT_SQL: &str = "SELECT
    id,
    title,
    date,
    teacher,
    notes,
    group_id
FROM lessons";

const EVENT_SELECT_SQL: &str = "SELECT
    id,
    title,
    date,
    start_time,
    event_type,
    leader,
    notes,
    group_id
FROM reception_events";

const TIME_FORMAT: &str = "%H:%M";

/// Session catalog: lessons or events selectable for attendance.
pub trait SessionRepository {
    fn context(&self) -> Context;
    fn create_session(&self, session: &Session) -> RepoResult<SessionId>;
    fn update_session(&self, session: &Session) -> RepoResult<()>;
    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>>;
    /// Newest first.
    fn list_sessions(&self) -> RepoResult<Vec<Session>>;
    fn delete_session(&self, id: SessionId) -> RepoResult<()>;
}

/// SQLite-backed session catalog for one context.
pub struct SqliteSessionRepository<'conn> {
    conn: &'conn Connection,
    context: Context,
}

impl<'conn> SqliteSessionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection, context: Context) -> RepoResult<Self> {
        ensure_tables(conn, &[context.schema().sessions_table])?;
        Ok(Self { conn, context })
    }

    fn ensure_context(&self, session: &Session) -> RepoResult<()> {
        if session.context() != self.context {
            return Err(RepoError::InvalidData(format!(
                "{} catalog does not accept {} sessions",
                self.context.as_str(),
                session.context().as_str()
            )));
        }
        Ok(())
    }

    fn select_sql(&self) -> &'static str {
        match self.context {
            Context::Ministry => LESSON_SELECT_SQL,
            Context::Reception => EVENT_SELECT_SQL,
        }
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<Session> {
        match self.context {
            Context::Ministry => parse_lesson_row(row),
            Context::Reception => parse_event_row(row),
        }
    }
}

impl SessionRepository for SqliteSessionRepository<'_> {
    fn context(&self) -> Context {
        self.context
    }

    fn create_session(&self, session: &Session) -> RepoResult<SessionId> {
        self.ensure_context(session)?;
        session.validate()?;

        match session {
            Session::Ministry(s) => {
                self.conn.execute(
                    "INSERT INTO lessons (id, title, date, teacher, notes, group_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                    params![
                        s.id.to_string(),
                        s.title.trim(),
                        date_to_db(s.date),
                        s.teacher.as_deref(),
                        s.notes.as_deref(),
                        s.group_id.map(|id| id.to_string()),
                    ],
                )?;
            }
            Session::Reception(s) => {
                self.conn.execute(
                    "INSERT INTO reception_events (
                        id,
                        title,
                        date,
                        start_time,
                        event_type,
                        leader,
                        notes,
                        group_id
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
                    params![
                        s.id.to_string(),
                        s.title.trim(),
                        date_to_db(s.date),
                        s.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                        s.event_type.as_code(),
                        s.leader.as_deref(),
                        s.notes.as_deref(),
                        s.group_id.map(|id| id.to_string()),
                    ],
                )?;
            }
        }

        Ok(session.id())
    }

    fn update_session(&self, session: &Session) -> RepoResult<()> {
        self.ensure_context(session)?;
        session.validate()?;

        let changed = match session {
            Session::Ministry(s) => self.conn.execute(
                "UPDATE lessons
                 SET title = ?2, date = ?3, teacher = ?4, notes = ?5, group_id = ?6
                 WHERE id = ?1;",
                params![
                    s.id.to_string(),
                    s.title.trim(),
                    date_to_db(s.date),
                    s.teacher.as_deref(),
                    s.notes.as_deref(),
                    s.group_id.map(|id| id.to_string()),
                ],
            )?,
            Session::Reception(s) => self.conn.execute(
                "UPDATE reception_events
                 SET
                    title = ?2,
                    date = ?3,
                    start_time = ?4,
                    event_type = ?5,
                    leader = ?6,
                    notes = ?7,
                    group_id = ?8
                 WHERE id = ?1;",
                params![
                    s.id.to_string(),
                    s.title.trim(),
                    date_to_db(s.date),
                    s.start_time.map(|t| t.format(TIME_FORMAT).to_string()),
                    s.event_type.as_code(),
                    s.leader.as_deref(),
                    s.notes.as_deref(),
                    s.group_id.map(|id| id.to_string()),
                ],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::NotFound(session.id()));
        }
        Ok(())
    }

    fn get_session(&self, id: SessionId) -> RepoResult<Option<Session>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    fn list_sessions(&self) -> RepoResult<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY date DESC, id ASC;",
            self.select_sql()
        ))?;
        let mut rows = stmt.query([])?;
        let mut sessions = Vec::new();
        while let Some(row) = rows.next()? {
            sessions.push(self.parse_row(row)?);
        }
        Ok(sessions)
    }

    fn delete_session(&self, id: SessionId) -> RepoResult<()> {
        let table = self.context.schema().sessions_table;
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1;"),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

fn parse_lesson_row(row: &Row<'_>) -> RepoResult<Session> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    Ok(Session::Ministry(Lesson {
        id: parse_uuid(&id_text, "lessons.id")?,
        title: row.get("title")?,
        date: parse_date(&date_text, "lessons.date")?,
        teacher: row.get("teacher")?,
        notes: row.get("notes")?,
        group_id: parse_optional_uuid(row.get("group_id")?, "lessons.group_id")?,
    }))
}

fn parse_event_row(row: &Row<'_>) -> RepoResult<Session> {
    let id_text: String = row.get("id")?;
    let date_text: String = row.get("date")?;
    let type_text: String = row.get("event_type")?;
    let event_type = EventType::from_code(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid event type `{type_text}` in reception_events.event_type"
        ))
    })?;
    let start_time = match row.get::<_, Option<String>>("start_time")? {
        Some(text) => Some(NaiveTime::parse_from_str(&text, TIME_FORMAT).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid time `{text}` in reception_events.start_time"
            ))
        })?),
        None => None,
    };

    Ok(Session::Reception(ReceptionEvent {
        id: parse_uuid(&id_text, "reception_events.id")?,
        title: row.get("title")?,
        date: parse_date(&date_text, "reception_events.date")?,
        start_time,
        event_type,
        leader: row.get("leader")?,
        notes: row.get("notes")?,
        group_id: parse_optional_uuid(row.get("group_id")?, "reception_events.group_id")?,
    }))
}

//! Attendance store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Read a session's persisted presence map.
//! - Replace a session's whole record set with all-or-nothing semantics.
//!
//! # Invariants
//! - `replace_attendance` deletes and reinserts inside one `IMMEDIATE`
//!   transaction; readers see either the old set or the new one.
//! - Any failure rolls the transaction back; no partial set is committed.

use crate::model::attendance::{AttendanceRecord, MarkSet};
use crate::model::context::Context;
use crate::model::session::SessionId;
use crate::repo::{bool_to_int, ensure_tables, int_to_bool, parse_uuid, RepoError, RepoResult};
use chrono::Local;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};

/// Attendance persistence for one context.
pub trait AttendanceStore {
    fn context(&self) -> Context;
    /// Persisted presence map for the session (empty when never taken).
    fn get_attendance(&self, session_id: SessionId) -> RepoResult<MarkSet>;
    /// Atomically replaces every record of the session with `records`.
    fn replace_attendance(
        &self,
        session_id: SessionId,
        records: &[AttendanceRecord],
    ) -> RepoResult<()>;
}

/// SQLite-backed attendance store.
pub struct SqliteAttendanceStore<'conn> {
    conn: &'conn Connection,
    context: Context,
}

impl<'conn> SqliteAttendanceStore<'conn> {
    pub fn try_new(conn: &'conn Connection, context: Context) -> RepoResult<Self> {
        let schema = context.schema();
        ensure_tables(conn, &[schema.sessions_table, schema.attendance_table])?;
        Ok(Self { conn, context })
    }
}

impl AttendanceStore for SqliteAttendanceStore<'_> {
    fn context(&self) -> Context {
        self.context
    }

    fn get_attendance(&self, session_id: SessionId) -> RepoResult<MarkSet> {
        let schema = self.context.schema();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {participant} AS participant_id, present
             FROM {table}
             WHERE {session} = ?1;",
            participant = schema.participant_column,
            table = schema.attendance_table,
            session = schema.session_column,
        ))?;
        let column = format!("{}.{}", schema.attendance_table, schema.participant_column);
        let mut rows = stmt.query([session_id.to_string()])?;
        let mut marks = MarkSet::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("participant_id")?;
            let present: i64 = row.get("present")?;
            marks.mark(
                parse_uuid(&id_text, &column)?,
                int_to_bool(present, "present")?,
            );
        }
        Ok(marks)
    }

    fn replace_attendance(
        &self,
        session_id: SessionId,
        records: &[AttendanceRecord],
    ) -> RepoResult<()> {
        let schema = self.context.schema();
        let session_text = session_id.to_string();
        // The repository only holds `&Connection`; nested transactions are
        // never opened on it.
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;

        if !session_exists_in_tx(&tx, schema.sessions_table, &session_text)? {
            return Err(RepoError::NotFound(session_id));
        }

        tx.execute(
            &format!(
                "DELETE FROM {table} WHERE {session} = ?1;",
                table = schema.attendance_table,
                session = schema.session_column,
            ),
            [session_text.as_str()],
        )?;

        match self.context {
            Context::Ministry => {
                let mut insert = tx.prepare(
                    "INSERT INTO attendance (lesson_id, student_id, present)
                     VALUES (?1, ?2, ?3);",
                )?;
                for record in records {
                    insert.execute(params![
                        session_text.as_str(),
                        record.participant_id.to_string(),
                        bool_to_int(record.present),
                    ])?;
                }
            }
            Context::Reception => {
                let check_in = Local::now().format("%H:%M").to_string();
                let mut insert = tx.prepare(
                    "INSERT INTO reception_attendance (event_id, member_id, present, check_in_time)
                     VALUES (?1, ?2, ?3, ?4);",
                )?;
                for record in records {
                    insert.execute(params![
                        session_text.as_str(),
                        record.participant_id.to_string(),
                        bool_to_int(record.present),
                        record.present.then_some(check_in.as_str()),
                    ])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}

fn session_exists_in_tx(
    tx: &Transaction<'_>,
    sessions_table: &str,
    session_id: &str,
) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {sessions_table} WHERE id = ?1);"),
        [session_id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

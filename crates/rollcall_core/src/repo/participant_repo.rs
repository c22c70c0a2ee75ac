//! Roster repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide participant CRUD for one context's backing table.
//! - Supply the roster in stable order and per-participant history counts.
//!
//! # Invariants
//! - Roster order is `full_name COLLATE NOCASE ASC, id ASC`; reconciliation
//!   reports unmarked names in this order.
//! - A repository only accepts the `Participant` variant of its context.

use crate::model::context::Context;
use crate::model::participant::{
    AttendanceStats, MemberType, MinistryParticipant, Participant, ParticipantId,
    ReceptionParticipant, Sex,
};
use crate::repo::{
    date_to_db, ensure_tables, parse_optional_date, parse_optional_uuid, parse_uuid, RepoError,
    RepoResult,
};
use rusqlite::{params, Connection, Row};
use std::collections::HashMap;

const MINISTRY_SELECT_SQL: &str = "SELECT
    id,
    full_name,
    birth_date,
    sex,
    group_id,
    guardian_name,
    guardian_contact,
    notes,
    photo_url
FROM students";

const RECEPTION_SELECT_SQL: &str = "SELECT
    id,
    full_name,
    birth_date,
    sex,
    member_type,
    group_id,
    contact_phone,
    contact_email,
    address,
    notes
FROM reception_members";

/// Roster provider: participant CRUD plus history counters.
pub trait ParticipantRepository {
    fn context(&self) -> Context;
    fn create_participant(&self, participant: &Participant) -> RepoResult<ParticipantId>;
    fn update_participant(&self, participant: &Participant) -> RepoResult<()>;
    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>>;
    /// Deletes the participant and its attendance rows.
    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()>;
    /// Full roster in stable roster order.
    fn list_participants(&self) -> RepoResult<Vec<Participant>>;
    /// Record/presence counts over the `window_sessions` most recent
    /// sessions. Participants without records are absent from the map.
    fn attendance_stats(
        &self,
        window_sessions: u32,
    ) -> RepoResult<HashMap<ParticipantId, AttendanceStats>>;
}

/// SQLite-backed roster for one context.
pub struct SqliteParticipantRepository<'conn> {
    conn: &'conn Connection,
    context: Context,
}

impl<'conn> SqliteParticipantRepository<'conn> {
    pub fn try_new(conn: &'conn Connection, context: Context) -> RepoResult<Self> {
        let schema = context.schema();
        ensure_tables(
            conn,
            &[
                schema.participants_table,
                schema.sessions_table,
                schema.attendance_table,
            ],
        )?;
        Ok(Self { conn, context })
    }

    fn ensure_context(&self, participant: &Participant) -> RepoResult<()> {
        if participant.context() != self.context {
            return Err(RepoError::InvalidData(format!(
                "{} repository does not accept {} participants",
                self.context.as_str(),
                participant.context().as_str()
            )));
        }
        Ok(())
    }

    fn select_sql(&self) -> &'static str {
        match self.context {
            Context::Ministry => MINISTRY_SELECT_SQL,
            Context::Reception => RECEPTION_SELECT_SQL,
        }
    }

    fn parse_row(&self, row: &Row<'_>) -> RepoResult<Participant> {
        match self.context {
            Context::Ministry => parse_ministry_row(row),
            Context::Reception => parse_reception_row(row),
        }
    }
}

impl ParticipantRepository for SqliteParticipantRepository<'_> {
    fn context(&self) -> Context {
        self.context
    }

    fn create_participant(&self, participant: &Participant) -> RepoResult<ParticipantId> {
        self.ensure_context(participant)?;
        participant.validate()?;

        match participant {
            Participant::Ministry(p) => {
                self.conn.execute(
                    "INSERT INTO students (
                        id,
                        full_name,
                        birth_date,
                        sex,
                        group_id,
                        guardian_name,
                        guardian_contact,
                        notes,
                        photo_url
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9);",
                    params![
                        p.id.to_string(),
                        p.full_name.trim(),
                        p.birth_date.map(date_to_db),
                        p.sex.map(Sex::as_code),
                        p.group_id.map(|id| id.to_string()),
                        p.guardian_name.as_deref(),
                        p.guardian_contact.as_deref(),
                        p.notes.as_deref(),
                        p.photo_url.as_deref(),
                    ],
                )?;
            }
            Participant::Reception(p) => {
                self.conn.execute(
                    "INSERT INTO reception_members (
                        id,
                        full_name,
                        birth_date,
                        sex,
                        member_type,
                        group_id,
                        contact_phone,
                        contact_email,
                        address,
                        notes
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                    params![
                        p.id.to_string(),
                        p.full_name.trim(),
                        p.birth_date.map(date_to_db),
                        p.sex.map(Sex::as_code),
                        p.member_type.as_code(),
                        p.group_id.map(|id| id.to_string()),
                        p.contact_phone.as_deref(),
                        p.contact_email.as_deref(),
                        p.address.as_deref(),
                        p.notes.as_deref(),
                    ],
                )?;
            }
        }

        Ok(participant.id())
    }

    fn update_participant(&self, participant: &Participant) -> RepoResult<()> {
        self.ensure_context(participant)?;
        participant.validate()?;

        let changed = match participant {
            Participant::Ministry(p) => self.conn.execute(
                "UPDATE students
                 SET
                    full_name = ?2,
                    birth_date = ?3,
                    sex = ?4,
                    group_id = ?5,
                    guardian_name = ?6,
                    guardian_contact = ?7,
                    notes = ?8,
                    photo_url = ?9
                 WHERE id = ?1;",
                params![
                    p.id.to_string(),
                    p.full_name.trim(),
                    p.birth_date.map(date_to_db),
                    p.sex.map(Sex::as_code),
                    p.group_id.map(|id| id.to_string()),
                    p.guardian_name.as_deref(),
                    p.guardian_contact.as_deref(),
                    p.notes.as_deref(),
                    p.photo_url.as_deref(),
                ],
            )?,
            Participant::Reception(p) => self.conn.execute(
                "UPDATE reception_members
                 SET
                    full_name = ?2,
                    birth_date = ?3,
                    sex = ?4,
                    member_type = ?5,
                    group_id = ?6,
                    contact_phone = ?7,
                    contact_email = ?8,
                    address = ?9,
                    notes = ?10
                 WHERE id = ?1;",
                params![
                    p.id.to_string(),
                    p.full_name.trim(),
                    p.birth_date.map(date_to_db),
                    p.sex.map(Sex::as_code),
                    p.member_type.as_code(),
                    p.group_id.map(|id| id.to_string()),
                    p.contact_phone.as_deref(),
                    p.contact_email.as_deref(),
                    p.address.as_deref(),
                    p.notes.as_deref(),
                ],
            )?,
        };

        if changed == 0 {
            return Err(RepoError::NotFound(participant.id()));
        }
        Ok(())
    }

    fn get_participant(&self, id: ParticipantId) -> RepoResult<Option<Participant>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE id = ?1;", self.select_sql()))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_row(row)?));
        }
        Ok(None)
    }

    fn delete_participant(&self, id: ParticipantId) -> RepoResult<()> {
        let table = self.context.schema().participants_table;
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE id = ?1;"),
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn list_participants(&self) -> RepoResult<Vec<Participant>> {
        let mut stmt = self.conn.prepare(&format!(
            "{} ORDER BY full_name COLLATE NOCASE ASC, id ASC;",
            self.select_sql()
        ))?;
        let mut rows = stmt.query([])?;
        let mut participants = Vec::new();
        while let Some(row) = rows.next()? {
            participants.push(self.parse_row(row)?);
        }
        Ok(participants)
    }

    fn attendance_stats(
        &self,
        window_sessions: u32,
    ) -> RepoResult<HashMap<ParticipantId, AttendanceStats>> {
        let schema = self.context.schema();
        let sql = format!(
            "WITH recent AS (
                SELECT id
                FROM {sessions}
                ORDER BY date DESC, id ASC
                LIMIT ?1
            )
            SELECT
                a.{participant} AS participant_id,
                COUNT(*) AS recorded,
                SUM(a.present) AS presences
            FROM {attendance} a
            WHERE a.{session} IN (SELECT id FROM recent)
            GROUP BY a.{participant};",
            sessions = schema.sessions_table,
            attendance = schema.attendance_table,
            participant = schema.participant_column,
            session = schema.session_column,
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([i64::from(window_sessions)])?;
        let mut stats = HashMap::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("participant_id")?;
            let id = parse_uuid(
                &id_text,
                &format!("{}.{}", schema.attendance_table, schema.participant_column),
            )?;
            let recorded: i64 = row.get("recorded")?;
            let presences: i64 = row.get("presences")?;
            stats.insert(
                id,
                AttendanceStats {
                    sessions_recorded: count_to_u32(recorded)?,
                    presences: count_to_u32(presences)?,
                },
            );
        }
        Ok(stats)
    }
}

fn count_to_u32(value: i64) -> RepoResult<u32> {
    u32::try_from(value)
        .map_err(|_| RepoError::InvalidData(format!("attendance count `{value}` out of range")))
}

fn parse_sex(value: Option<String>, column: &str) -> RepoResult<Option<Sex>> {
    match value {
        Some(text) => Sex::from_code(&text)
            .map(Some)
            .ok_or_else(|| RepoError::InvalidData(format!("invalid sex `{text}` in {column}"))),
        None => Ok(None),
    }
}

fn parse_ministry_row(row: &Row<'_>) -> RepoResult<Participant> {
    let id_text: String = row.get("id")?;
    let participant = MinistryParticipant {
        id: parse_uuid(&id_text, "students.id")?,
        full_name: row.get("full_name")?,
        birth_date: parse_optional_date(row.get("birth_date")?, "students.birth_date")?,
        sex: parse_sex(row.get("sex")?, "students.sex")?,
        group_id: parse_optional_uuid(row.get("group_id")?, "students.group_id")?,
        guardian_name: row.get("guardian_name")?,
        guardian_contact: row.get("guardian_contact")?,
        notes: row.get("notes")?,
        photo_url: row.get("photo_url")?,
    };
    Ok(Participant::Ministry(participant))
}

fn parse_reception_row(row: &Row<'_>) -> RepoResult<Participant> {
    let id_text: String = row.get("id")?;
    let member_type_text: String = row.get("member_type")?;
    let member_type = MemberType::from_code(&member_type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid member type `{member_type_text}` in reception_members.member_type"
        ))
    })?;

    let participant = ReceptionParticipant {
        id: parse_uuid(&id_text, "reception_members.id")?,
        full_name: row.get("full_name")?,
        birth_date: parse_optional_date(row.get("birth_date")?, "reception_members.birth_date")?,
        sex: parse_sex(row.get("sex")?, "reception_members.sex")?,
        member_type,
        group_id: parse_optional_uuid(row.get("group_id")?, "reception_members.group_id")?,
        contact_phone: row.get("contact_phone")?,
        contact_email: row.get("contact_email")?,
        address: row.get("address")?,
        notes: row.get("notes")?,
    };
    Ok(Participant::Reception(participant))
}

//! Group repository contracts and SQLite implementation.

use crate::model::context::Context;
use crate::model::group::{Group, GroupId};
use crate::repo::{ensure_tables, parse_uuid, RepoError, RepoResult};
use rusqlite::{params, Connection};

/// Repository interface for sub-group CRUD.
pub trait GroupRepository {
    fn context(&self) -> Context;
    fn create_group(&self, group: &Group) -> RepoResult<GroupId>;
    /// Groups sorted by name.
    fn list_groups(&self) -> RepoResult<Vec<Group>>;
    /// Removes the group; members and sessions lose their reference.
    fn delete_group(&self, id: GroupId) -> RepoResult<()>;
}

/// SQLite-backed group repository for one context.
pub struct SqliteGroupRepository<'conn> {
    conn: &'conn Connection,
    context: Context,
}

impl<'conn> SqliteGroupRepository<'conn> {
    pub fn try_new(conn: &'conn Connection, context: Context) -> RepoResult<Self> {
        ensure_tables(conn, &[context.schema().groups_table])?;
        Ok(Self { conn, context })
    }
}

impl GroupRepository for SqliteGroupRepository<'_> {
    fn context(&self) -> Context {
        self.context
    }

    fn create_group(&self, group: &Group) -> RepoResult<GroupId> {
        group.validate()?;
        let table = self.context.schema().groups_table;
        self.conn.execute(
            &format!("INSERT INTO {table} (id, name, description) VALUES (?1, ?2, ?3);"),
            params![
                group.id.to_string(),
                group.name.trim(),
                group.description.as_deref()
            ],
        )?;
        Ok(group.id)
    }

    fn list_groups(&self) -> RepoResult<Vec<Group>> {
        let table = self.context.schema().groups_table;
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, name, description FROM {table} ORDER BY name COLLATE NOCASE ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            let id_text: String = row.get("id")?;
            groups.push(Group {
                id: parse_uuid(&id_text, &format!("{table}.id"))?,
                name: row.get("name")?,
                description: row.get("description")?,
            });
        }
        Ok(groups)
    }

    fn delete_group(&self, id: GroupId) -> RepoResult<()> {
        let table = self.context.schema().groups_table;
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

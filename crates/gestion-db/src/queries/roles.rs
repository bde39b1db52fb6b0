use anyhow::Result;

use super::OptionalExt;
use crate::Database;
use crate::models::RoleRow;

impl Database {
    // -- Roles --

    pub fn list_roles(&self) -> Result<Vec<RoleRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT id, name FROM roles ORDER BY id")?;
            let rows = stmt
                .query_map([], |row| Ok(RoleRow { id: row.get(0)?, name: row.get(1)? }))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_role(&self, id: i64) -> Result<Option<RoleRow>> {
        self.with_conn(|conn| {
            conn.query_row("SELECT id, name FROM roles WHERE id = ?1", [id], |row| {
                Ok(RoleRow { id: row.get(0)?, name: row.get(1)? })
            })
            .optional()
        })
    }
}

use anyhow::Result;
use rusqlite::{Connection, Row};

use super::OptionalExt;
use crate::Database;
use crate::models::UserRow;

const USER_COLUMNS: &str =
    "u.id, u.name, u.email, u.password, u.role_id, r.name AS role_name, u.created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role_id: row.get(4)?,
        role_name: row.get(5)?,
        created_at: row.get(6)?,
    })
}

impl Database {
    // -- Users --

    /// Insert a user and, when `company_id` is given, enroll them in that
    /// company within the same transaction. Returns the new user id.
    pub fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role_id: i64,
        company_id: Option<i64>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO users (name, email, password, role_id) VALUES (?1, ?2, ?3, ?4)",
                (name, email, password_hash, role_id),
            )?;
            let user_id = tx.last_insert_rowid();
            if let Some(company_id) = company_id {
                tx.execute(
                    "INSERT INTO user_companies (user_id, company_id) VALUES (?1, ?2)",
                    (user_id, company_id),
                )?;
            }
            tx.commit()?;
            Ok(user_id)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_where(conn, "u.email = ?1", email))
    }

    pub fn get_user(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_where(conn, "u.id = ?1", id))
    }

    pub fn list_users(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 LEFT JOIN roles r ON r.id = u.role_id
                 ORDER BY u.created_at DESC, u.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users who share at least one company with `viewer_id`, plus the viewer.
    pub fn list_users_visible_to(&self, viewer_id: i64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 LEFT JOIN roles r ON r.id = u.role_id
                 WHERE u.id = ?1
                    OR u.id IN (
                        SELECT other.user_id
                        FROM user_companies mine
                        JOIN user_companies other ON other.company_id = mine.company_id
                        WHERE mine.user_id = ?1
                    )
                 ORDER BY u.created_at DESC, u.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([viewer_id], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users holding an administrative role (super admin or company admin).
    pub fn list_admins(&self) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {USER_COLUMNS}
                 FROM users u
                 JOIN roles r ON r.id = u.role_id
                 WHERE u.role_id IN (1, 2)
                 ORDER BY u.name ASC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Update profile fields and, when given, the password hash in one
    /// transaction. Returns false when no user has this id.
    pub fn update_user(
        &self,
        id: i64,
        name: &str,
        email: &str,
        role_id: i64,
        password_hash: Option<&str>,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            if let Some(hash) = password_hash {
                tx.execute("UPDATE users SET password = ?1 WHERE id = ?2", (hash, id))?;
            }
            let changed = tx.execute(
                "UPDATE users SET name = ?1, email = ?2, role_id = ?3 WHERE id = ?4",
                (name, email, role_id, id),
            )?;
            tx.commit()?;
            Ok(changed > 0)
        })
    }

    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    pub fn count_users(&self) -> Result<i64> {
        self.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
    }
}

fn query_user_where<P: rusqlite::ToSql>(
    conn: &Connection,
    predicate: &str,
    param: P,
) -> Result<Option<UserRow>> {
    let sql = format!(
        "SELECT {USER_COLUMNS}
         FROM users u
         LEFT JOIN roles r ON r.id = u.role_id
         WHERE {predicate}"
    );
    let mut stmt = conn.prepare(&sql)?;
    stmt.query_row([param], map_user).optional()
}

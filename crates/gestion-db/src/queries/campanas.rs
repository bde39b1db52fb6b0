use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::{CampanaRow, MemberRow};

fn map_campana(row: &Row<'_>) -> rusqlite::Result<CampanaRow> {
    Ok(CampanaRow {
        id: row.get(0)?,
        company_id: row.get(1)?,
        nombre: row.get(2)?,
        descripcion: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_member(row: &Row<'_>) -> rusqlite::Result<MemberRow> {
    Ok(MemberRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        role_id: row.get(3)?,
        role_name: row.get(4)?,
    })
}

impl Database {
    // -- Campanas --

    pub fn create_campana(
        &self,
        company_id: i64,
        nombre: &str,
        descripcion: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO campanas (company_id, nombre, descripcion) VALUES (?1, ?2, ?3)",
                (company_id, nombre, descripcion),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_campana(&self, id: i64) -> Result<Option<CampanaRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, company_id, nombre, descripcion, created_at FROM campanas WHERE id = ?1",
                [id],
                map_campana,
            )
            .optional()
        })
    }

    pub fn list_campanas(&self) -> Result<Vec<CampanaRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, company_id, nombre, descripcion, created_at
                 FROM campanas
                 ORDER BY created_at DESC, id DESC",
            )?;
            let rows = stmt
                .query_map([], map_campana)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Campaigns of every company `user_id` belongs to.
    pub fn list_campanas_for_user(&self, user_id: i64) -> Result<Vec<CampanaRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT DISTINCT c.id, c.company_id, c.nombre, c.descripcion, c.created_at
                 FROM campanas c
                 JOIN user_companies uc ON uc.company_id = c.company_id
                 WHERE uc.user_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC",
            )?;
            let rows = stmt
                .query_map([user_id], map_campana)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn assign_user_to_campana(&self, campana_id: i64, user_id: i64) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO campana_users (campana_id, user_id) VALUES (?1, ?2)",
                (campana_id, user_id),
            )?;
            Ok(())
        })
    }

    /// Returns false when the user was not assigned to the campaign.
    pub fn remove_user_from_campana(&self, campana_id: i64, user_id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM campana_users WHERE campana_id = ?1 AND user_id = ?2",
                (campana_id, user_id),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn campana_members(&self, campana_id: i64) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.email, u.role_id, r.name
                 FROM campana_users cu
                 JOIN users u ON u.id = cu.user_id
                 LEFT JOIN roles r ON r.id = u.role_id
                 WHERE cu.campana_id = ?1
                 ORDER BY u.name ASC",
            )?;
            let rows = stmt
                .query_map([campana_id], map_member)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Members of the campaign's company who are not assigned to it yet.
    pub fn assignable_users(&self, campana_id: i64) -> Result<Vec<MemberRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT u.id, u.name, u.email, u.role_id, r.name
                 FROM campanas ca
                 JOIN user_companies uc ON uc.company_id = ca.company_id
                 JOIN users u ON u.id = uc.user_id
                 LEFT JOIN roles r ON r.id = u.role_id
                 LEFT JOIN campana_users cu
                   ON cu.user_id = u.id AND cu.campana_id = ca.id
                 WHERE ca.id = ?1
                   AND cu.id IS NULL
                 ORDER BY u.name ASC",
            )?;
            let rows = stmt
                .query_map([campana_id], map_member)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

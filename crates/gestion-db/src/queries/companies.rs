use anyhow::Result;
use rusqlite::Row;

use super::OptionalExt;
use crate::Database;
use crate::models::{CompanyRow, CompanyUpdate};
use gestion_types::models::CompanyStatus;

const COMPANY_COLUMNS: &str = "c.id, c.name, c.ruc, c.description, c.address, c.admin_user_id,
     u.name AS admin_user_name, c.status, c.logo, c.created_at";

fn map_company(row: &Row<'_>) -> rusqlite::Result<CompanyRow> {
    Ok(CompanyRow {
        id: row.get(0)?,
        name: row.get(1)?,
        ruc: row.get(2)?,
        description: row.get(3)?,
        address: row.get(4)?,
        admin_user_id: row.get(5)?,
        admin_user_name: row.get(6)?,
        status: row.get(7)?,
        logo: row.get(8)?,
        created_at: row.get(9)?,
    })
}

impl Database {
    // -- Companies --

    pub fn list_companies(&self) -> Result<Vec<CompanyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS}
                 FROM companies c
                 LEFT JOIN users u ON u.id = c.admin_user_id
                 ORDER BY c.created_at DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_company)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Companies `user_id` is a member of, newest first.
    pub fn list_companies_for_user(&self, user_id: i64) -> Result<Vec<CompanyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS}
                 FROM user_companies uc
                 JOIN companies c ON c.id = uc.company_id
                 LEFT JOIN users u ON u.id = c.admin_user_id
                 WHERE uc.user_id = ?1
                 ORDER BY c.created_at DESC, c.id DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([user_id], map_company)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_company(&self, id: i64) -> Result<Option<CompanyRow>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {COMPANY_COLUMNS}
                 FROM companies c
                 LEFT JOIN users u ON u.id = c.admin_user_id
                 WHERE c.id = ?1"
            );
            conn.query_row(&sql, [id], map_company).optional()
        })
    }

    /// Insert a company administered by `admin_user_id` and enroll the admin
    /// as its first member. Returns the new company id.
    pub fn create_company(
        &self,
        name: &str,
        ruc: &str,
        description: Option<&str>,
        address: &str,
        admin_user_id: i64,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO companies (name, ruc, description, address, admin_user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                (name, ruc, description, address, admin_user_id),
            )?;
            let company_id = tx.last_insert_rowid();
            tx.execute(
                "INSERT INTO user_companies (user_id, company_id) VALUES (?1, ?2)",
                (admin_user_id, company_id),
            )?;
            tx.commit()?;
            Ok(company_id)
        })
    }

    pub fn update_company(&self, id: i64, update: &CompanyUpdate<'_>) -> Result<bool> {
        let mut sql =
            String::from("UPDATE companies SET name = ?1, ruc = ?2, description = ?3, address = ?4");
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = vec![
            Box::new(update.name.to_string()),
            Box::new(update.ruc.to_string()),
            Box::new(update.description.map(str::to_string)),
            Box::new(update.address.to_string()),
        ];

        if let Some(admin_user_id) = update.admin_user_id {
            params.push(Box::new(admin_user_id));
            sql.push_str(&format!(", admin_user_id = ?{}", params.len()));
        }
        if let Some(status) = update.status {
            params.push(Box::new(status.as_str()));
            sql.push_str(&format!(", status = ?{}", params.len()));
        }

        params.push(Box::new(id));
        sql.push_str(&format!(" WHERE id = ?{}", params.len()));

        self.with_conn_mut(|conn| {
            let changed = conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?;
            Ok(changed > 0)
        })
    }

    pub fn set_company_status(&self, id: i64, status: CompanyStatus) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE companies SET status = ?1 WHERE id = ?2",
                (status.as_str(), id),
            )?;
            Ok(changed > 0)
        })
    }

    /// Store a new logo path and return the one it replaced.
    /// Store a new logo path. `None` when the company does not exist,
    /// otherwise the logo it replaced.
    pub fn set_company_logo(&self, id: i64, logo: &str) -> Result<Option<Option<String>>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let Some(previous) = tx
                .query_row("SELECT logo FROM companies WHERE id = ?1", [id], |row| {
                    row.get::<_, Option<String>>(0)
                })
                .optional()?
            else {
                return Ok(None);
            };
            tx.execute("UPDATE companies SET logo = ?1 WHERE id = ?2", (logo, id))?;
            tx.commit()?;
            Ok(Some(previous))
        })
    }

    pub fn delete_company(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM companies WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }
}

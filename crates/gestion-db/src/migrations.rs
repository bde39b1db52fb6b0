use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE roles (
                id      INTEGER PRIMARY KEY,
                name    TEXT NOT NULL UNIQUE
            );

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                role_id     INTEGER NOT NULL REFERENCES roles(id),
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE companies (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                ruc             TEXT NOT NULL,
                description     TEXT,
                address         TEXT NOT NULL,
                admin_user_id   INTEGER REFERENCES users(id) ON DELETE SET NULL,
                status          TEXT NOT NULL DEFAULT 'active'
                                CHECK (status IN ('active', 'inactive')),
                logo            TEXT,
                created_at      TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE user_companies (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                company_id  INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(user_id, company_id)
            );

            CREATE INDEX idx_user_companies_company ON user_companies(company_id);

            CREATE TABLE campanas (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                company_id  INTEGER NOT NULL REFERENCES companies(id) ON DELETE CASCADE,
                nombre      TEXT NOT NULL,
                descripcion TEXT,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX idx_campanas_company ON campanas(company_id, created_at);

            CREATE TABLE campana_users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                campana_id  INTEGER NOT NULL REFERENCES campanas(id) ON DELETE CASCADE,
                user_id     INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL DEFAULT (datetime('now')),
                UNIQUE(campana_id, user_id)
            );

            INSERT INTO roles (id, name) VALUES
                (1, 'super_admin'),
                (2, 'company_admin'),
                (3, 'user');

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}

//! Server configuration, read from the environment (after `.env` is loaded).

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl_minutes: i64,
    /// Optional first super admin, created at startup when the email is unknown.
    pub bootstrap_admin: Option<(String, String)>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let jwt_secret = var("GESTION_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("GESTION_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port = parse_var(&var, "GESTION_PORT", 3000)?;
        let jwt_ttl_minutes = parse_var(&var, "GESTION_JWT_TTL_MINUTES", 60)?;
        if jwt_ttl_minutes <= 0 {
            bail!("GESTION_JWT_TTL_MINUTES must be positive");
        }

        let bootstrap_admin = match (
            var("GESTION_BOOTSTRAP_ADMIN_EMAIL"),
            var("GESTION_BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some((email, password)),
            (None, None) => None,
            _ => bail!(
                "GESTION_BOOTSTRAP_ADMIN_EMAIL and GESTION_BOOTSTRAP_ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Self {
            host: var("GESTION_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: var("GESTION_DB_PATH").unwrap_or_else(|| "gestion.db".into()).into(),
            upload_dir: var("GESTION_UPLOAD_DIR")
                .unwrap_or_else(|| "uploads/logos".into())
                .into(),
            jwt_secret,
            jwt_ttl_minutes,
            bootstrap_admin,
        })
    }
}

fn parse_var<T>(var: impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(name) {
        Some(raw) => raw.parse().with_context(|| format!("invalid value for {name}: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_only_secret_is_set() {
        let config = load(&[("GESTION_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("gestion.db"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads/logos"));
        assert_eq!(config.jwt_ttl_minutes, 60);
        assert!(config.bootstrap_admin.is_none());
    }

    #[test]
    fn missing_or_placeholder_secret_is_rejected() {
        assert!(load(&[]).is_err());
        assert!(load(&[("GESTION_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(load(&[("GESTION_JWT_SECRET", "s3cr3t!"), ("GESTION_PORT", "http")]).is_err());
        assert!(load(&[("GESTION_JWT_SECRET", "s3cr3t!"), ("GESTION_JWT_TTL_MINUTES", "0")]).is_err());
    }

    #[test]
    fn bootstrap_admin_needs_both_vars() {
        let half = load(&[
            ("GESTION_JWT_SECRET", "s3cr3t!"),
            ("GESTION_BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
        ]);
        assert!(half.is_err());

        let full = load(&[
            ("GESTION_JWT_SECRET", "s3cr3t!"),
            ("GESTION_BOOTSTRAP_ADMIN_EMAIL", "root@example.com"),
            ("GESTION_BOOTSTRAP_ADMIN_PASSWORD", "password123"),
        ])
        .unwrap();
        assert_eq!(
            full.bootstrap_admin,
            Some(("root@example.com".to_string(), "password123".to_string()))
        );
    }
}

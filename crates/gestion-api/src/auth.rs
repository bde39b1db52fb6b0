use std::sync::Arc;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use gestion_db::{Database, is_unique_violation};
use gestion_types::api::{
    Claims, LoginRequest, LoginResponse, LoginUser, MessageResponse, RegisterRequest, RegisterResponse,
};
use gestion_types::models::ROLE_USER;

use crate::error::{ApiError, ApiResult};
use crate::extract::ApiJson;
use crate::logos::LogoStorage;

pub const MIN_PASSWORD_LEN: usize = 8;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub jwt: JwtSettings,
    pub logos: LogoStorage,
}

#[derive(Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub ttl: chrono::Duration,
}

impl JwtSettings {
    pub fn new(secret: impl Into<String>, ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            ttl: chrono::Duration::minutes(ttl_minutes),
        }
    }
}

impl AppStateInner {
    /// Run blocking DB work off the async runtime.
    pub async fn query<F, T>(self: &Arc<Self>, f: F) -> ApiResult<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        let value = tokio::task::spawn_blocking(move || f(&state.db)).await??;
        Ok(value)
    }
}

/// Trimmed value of a required text field, or `None` when missing or blank.
pub(crate) fn required(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn normalize_email(email: &str) -> Option<String> {
    let email = email.trim().to_lowercase();
    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.is_empty() || email.contains(char::is_whitespace) {
        return None;
    }
    Some(email)
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created with the user role", body = RegisterResponse),
        (status = 400, description = "Missing fields, short password or email taken", body = MessageResponse),
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(name), Some(email), Some(password)) =
        (required(&req.name), required(&req.email), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    let email = normalize_email(&email).ok_or_else(|| ApiError::bad_request("Invalid email"))?;
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let lookup = email.clone();
    if state.query(move |db| db.get_user_by_email(&lookup)).await?.is_some() {
        return Err(ApiError::bad_request("Email is already registered"));
    }

    let password_hash = hash_password(&password)?;

    let user_email = email.clone();
    let user_id = state
        .query(move |db| db.create_user(&name, &user_email, &password_hash, ROLE_USER, None))
        .await
        .map_err(duplicate_email)?;

    info!("Registered user {} ({})", user_id, email);

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            msg: "User registered successfully".into(),
            hint: "You can now log in".into(),
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token for the account", body = LoginResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (Some(email), Some(password)) = (required(&req.email), req.password.filter(|p| !p.is_empty()))
    else {
        return Err(ApiError::bad_request("Email and password are required"));
    };
    let email = email.to_lowercase();

    let user = state
        .query(move |db| db.get_user_by_email(&email))
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !verify_password(&password, &user.password)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = create_token(&state.jwt, user.id, &user.email, user.role_id)?;

    Ok(Json(LoginResponse {
        msg: "Login successful".into(),
        token,
        user: LoginUser {
            id: user.id,
            name: user.name,
            email: user.email,
            role_id: user.role_id,
        },
    }))
}

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed_hash =
        PasswordHash::new(stored).map_err(|e| anyhow::anyhow!("stored hash is unreadable: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn create_token(jwt: &JwtSettings, user_id: i64, email: &str, role_id: i64) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        role_id,
        exp: (chrono::Utc::now() + jwt.ttl).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt.secret.as_bytes()),
    )?;

    Ok(token)
}

/// Map a UNIQUE(email) failure that slipped past the pre-check to a 400.
pub(crate) fn duplicate_email(err: ApiError) -> ApiError {
    match err {
        ApiError::Internal(e) if is_unique_violation(&e) => {
            ApiError::bad_request("Email is already registered")
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong horse", &hash).unwrap());
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Ana@Example.COM ").as_deref(), Some("ana@example.com"));
        assert_eq!(normalize_email("no-at-sign"), None);
        assert_eq!(normalize_email("@example.com"), None);
        assert_eq!(normalize_email("a b@example.com"), None);
    }

    #[test]
    fn required_trims_and_rejects_blank() {
        assert_eq!(required(&Some("  x ".into())).as_deref(), Some("x"));
        assert_eq!(required(&Some("   ".into())), None);
        assert_eq!(required(&None), None);
    }

    #[test]
    fn token_carries_role_and_subject() {
        let jwt = JwtSettings { secret: "test-secret".into(), ttl: chrono::Duration::minutes(5) };
        let token = create_token(&jwt, 7, "a@example.com", 2).unwrap();
        let data = jsonwebtoken::decode::<Claims>(
            &token,
            &jsonwebtoken::DecodingKey::from_secret(b"test-secret"),
            &jsonwebtoken::Validation::default(),
        )
        .unwrap();
        assert_eq!(data.claims.sub, 7);
        assert_eq!(data.claims.role_id, 2);
        assert_eq!(data.claims.email, "a@example.com");
    }
}

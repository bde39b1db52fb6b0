pub mod auth;
pub mod campanas;
pub mod companies;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod logos;
pub mod memberships;
pub mod middleware;
pub mod openapi;
pub mod roles;
pub mod routes;
pub mod tenancy;
pub mod users;

pub use auth::{AppState, AppStateInner, JwtSettings};
pub use routes::router;

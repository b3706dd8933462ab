//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers resolve the caller's principal from the session, forward to a
//! driving port and map the outcome to JSON. Route registration order lives in
//! [`configure`].

use actix_web::web;

pub mod auth;
pub mod dto;
pub mod error;
pub mod health;
pub mod posts;
pub mod roles;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(users::configure)
        .service(roles::list_roles)
        .configure(posts::configure);
}

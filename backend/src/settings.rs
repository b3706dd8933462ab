//! Application settings loaded via OrthoConfig.
//!
//! Values come from `PROOFBOARD_*` environment variables, an optional
//! configuration file and command-line flags, in OrthoConfig's usual order
//! of precedence. Session cookie settings live in
//! [`crate::inbound::http::session_config`] instead.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{RoleName, RoleNameError};
use crate::outbound::persistence::DEFAULT_MAX_CONNECTIONS;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_GUEST_ROLE: &str = "guest";
const DEFAULT_ADMIN_ROLE: &str = "admin";

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {message}")]
    BindAddr { value: String, message: String },
    /// A configured role name fails validation.
    #[error("invalid {field} {value:?}: {source}")]
    RoleName {
        field: &'static str,
        value: String,
        source: RoleNameError,
    },
}

/// Top-level runtime configuration for the server binary.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "PROOFBOARD")]
pub struct AppSettings {
    /// Socket address the HTTP server binds to.
    pub bind_addr: Option<String>,
    /// PostgreSQL connection string. When absent the in-memory store is used.
    pub database_url: Option<String>,
    /// Name of the role granted to every new user.
    pub guest_role: Option<String>,
    /// Name of the role allowed to manage users.
    pub admin_role: Option<String>,
    /// Create the guest and admin roles at startup when they are missing.
    #[ortho_config(default = false)]
    pub seed_roles: bool,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
}

impl AppSettings {
    /// Return the bind address, falling back to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: raw.to_owned(),
            message: err.to_string(),
        })
    }

    /// Return the guest role name, falling back to `guest`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::RoleName`] for a malformed name.
    pub fn guest_role(&self) -> Result<RoleName, SettingsError> {
        role_name("guest_role", self.guest_role.as_deref(), DEFAULT_GUEST_ROLE)
    }

    /// Return the admin role name, falling back to `admin`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::RoleName`] for a malformed name.
    pub fn admin_role(&self) -> Result<RoleName, SettingsError> {
        role_name("admin_role", self.admin_role.as_deref(), DEFAULT_ADMIN_ROLE)
    }

    /// Return the pool size, falling back to [`DEFAULT_MAX_CONNECTIONS`].
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }
}

fn role_name(
    field: &'static str,
    configured: Option<&str>,
    fallback: &str,
) -> Result<RoleName, SettingsError> {
    let raw = configured.unwrap_or(fallback);
    RoleName::new(raw).map_err(|source| SettingsError::RoleName {
        field,
        value: raw.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    //! Unit tests for settings parsing and fallbacks.

    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 6] = [
        "PROOFBOARD_BIND_ADDR",
        "PROOFBOARD_DATABASE_URL",
        "PROOFBOARD_GUEST_ROLE",
        "PROOFBOARD_ADMIN_ROLE",
        "PROOFBOARD_SEED_ROLES",
        "PROOFBOARD_DB_MAX_CONNECTIONS",
    ];

    fn load_from_empty_args() -> AppSettings {
        AppSettings::load_from_iter([OsString::from("proofboard")]).expect("config should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("default address"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("literal address")
        );
        assert!(settings.database_url.is_none());
        assert!(!settings.seed_roles);
        assert_eq!(settings.guest_role().expect("guest").as_ref(), "guest");
        assert_eq!(settings.admin_role().expect("admin").as_ref(), "admin");
        assert_eq!(settings.db_max_connections(), DEFAULT_MAX_CONNECTIONS);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("PROOFBOARD_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "PROOFBOARD_DATABASE_URL",
                Some("postgres://localhost/proofboard".to_owned()),
            ),
            ("PROOFBOARD_GUEST_ROLE", Some("member".to_owned())),
            ("PROOFBOARD_ADMIN_ROLE", Some("moderator".to_owned())),
            ("PROOFBOARD_SEED_ROLES", Some("true".to_owned())),
            ("PROOFBOARD_DB_MAX_CONNECTIONS", Some("4".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("address").port(),
            9000
        );
        assert_eq!(
            settings.database_url.as_deref(),
            Some("postgres://localhost/proofboard")
        );
        assert_eq!(settings.guest_role().expect("guest").as_ref(), "member");
        assert_eq!(settings.admin_role().expect("admin").as_ref(), "moderator");
        assert!(settings.seed_roles);
        assert_eq!(settings.db_max_connections(), 4);
    }

    #[rstest]
    fn unparsable_bind_address_is_reported() {
        let _guard = lock_env([("PROOFBOARD_BIND_ADDR", Some("not-an-address".to_owned()))]);

        let err = load_from_empty_args()
            .bind_addr()
            .expect_err("address should be rejected");
        assert!(matches!(err, SettingsError::BindAddr { ref value, .. } if value == "not-an-address"));
    }

    #[rstest]
    fn blank_role_name_is_reported() {
        let _guard = lock_env([("PROOFBOARD_GUEST_ROLE", Some("   ".to_owned()))]);

        let err = load_from_empty_args()
            .guest_role()
            .expect_err("blank role should be rejected");
        assert!(matches!(err, SettingsError::RoleName { field: "guest_role", .. }));
    }
}

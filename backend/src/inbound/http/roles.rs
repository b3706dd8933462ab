//! Roles API handler.
//!
//! ```text
//! GET /api/v1/roles
//! ```

use actix_web::{get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::dto::RoleResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// List the seeded roles so admins can look up ids to grant.
#[utoipa::path(
    get,
    path = "/api/v1/roles",
    responses(
        (status = 200, description = "Roles", body = [RoleResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Guest role required", body = ErrorSchema)
    ),
    tags = ["roles"],
    operation_id = "listRoles"
)]
#[get("/roles")]
pub async fn list_roles(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<RoleResponse>>> {
    let principal = current_principal(&state, &session).await?;
    let roles = state.accounts_query.list_roles(principal).await?;
    Ok(web::Json(roles.into_iter().map(Into::into).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Role, RoleId, RoleName, UserId};
    use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use serde_json::Value;

    #[actix_web::test]
    async fn lists_role_names() {
        let alice = UserId::random();
        let mut ports = MockPorts::default().signed_in(alice, &["guest"]);
        ports.accounts_query.expect_list_roles().returning(|_| {
            Ok(["guest", "admin"]
                .into_iter()
                .map(|name| Role::new(RoleId::random(), RoleName::new(name).expect("role")))
                .collect())
        });
        let app = actix_test::init_service(test_app(ports.into_state(), |cfg| {
            cfg.service(list_roles);
        }))
        .await;
        let cookie = session_cookie(&app, alice).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/roles")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        let names: Vec<&str> = body
            .as_array()
            .expect("array")
            .iter()
            .filter_map(|role| role.get("name").and_then(Value::as_str))
            .collect();
        assert_eq!(names, ["guest", "admin"]);
    }
}

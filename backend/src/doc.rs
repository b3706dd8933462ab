//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` endpoint plus the health probes, the
//! error schemas from [`crate::inbound::http::schemas`] and the session cookie
//! security scheme. Swagger UI serves it in debug builds and the
//! `openapi-dump` binary prints it for external tooling.

use crate::inbound::http::dto::{
    CommentResponse, CountResponse, PostDetailResponse, PostResponse, RoleResponse, UserResponse,
};
use crate::inbound::http::posts::{CommentRequest, CreatePostRequest};
use crate::inbound::http::schemas::{ErrorCodeSchema, ErrorSchema};
use crate::inbound::http::users::{LoginRequest, RegisterRequest, UpdateProfileRequest};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Proofboard API",
        description = "Posts with image proofs, comments, likes, validations, follows and roles."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_profile,
        crate::inbound::http::users::delete_self,
        crate::inbound::http::users::list_own_posts,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::count_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::users::list_user_posts,
        crate::inbound::http::users::follow,
        crate::inbound::http::users::unfollow,
        crate::inbound::http::users::grant_role,
        crate::inbound::http::roles::list_roles,
        crate::inbound::http::posts::list_posts,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::posts::add_comment,
        crate::inbound::http::posts::like_post,
        crate::inbound::http::posts::count_likes,
        crate::inbound::http::posts::validate_post,
        crate::inbound::http::posts::list_validators,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        LoginRequest,
        RegisterRequest,
        UpdateProfileRequest,
        CreatePostRequest,
        CommentRequest,
        UserResponse,
        RoleResponse,
        CountResponse,
        PostResponse,
        CommentResponse,
        PostDetailResponse
    )),
    tags(
        (name = "users", description = "Accounts, sessions, follows and role grants"),
        (name = "roles", description = "Seeded roles"),
        (name = "posts", description = "Posts, comments, likes and validations"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

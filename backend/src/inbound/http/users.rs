//! Users API handlers.
//!
//! ```text
//! POST   /api/v1/users                      {"login":"ada","password":"…","username":"Ada"}
//! POST   /api/v1/login                      {"login":"ada","password":"…"}
//! GET    /api/v1/users/me
//! PATCH  /api/v1/users/me
//! DELETE /api/v1/users/me
//! GET    /api/v1/users/me/posts
//! GET    /api/v1/users
//! GET    /api/v1/users/count
//! GET    /api/v1/users/{id}
//! DELETE /api/v1/users/{id}
//! GET    /api/v1/users/{id}/posts
//! PUT    /api/v1/users/{id}/follow
//! DELETE /api/v1/users/{id}/follow
//! PUT    /api/v1/users/{id}/roles/{roleId}
//! ```
//!
//! Register `/users/me` and `/users/count` before `/users/{id}` so the
//! literal segments win.

use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use crate::domain::ports::{ProfileUpdateRequest, RegistrationRequest};
use crate::domain::{DisplayName, LoginCredentials, RoleId, UserId, UserValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::dto::{CountResponse, PostResponse, UserResponse};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field_error, parse_id};

const USER_ID: FieldName = FieldName::new("userId");
const ROLE_ID: FieldName = FieldName::new("roleId");

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "ada@example.org")]
    pub login: String,
    pub password: String,
}

/// Registration body for `POST /api/v1/users`.
#[derive(Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub login: String,
    pub password: String,
    #[schema(example = "Ada Lovelace")]
    pub username: String,
    pub image: Option<String>,
    pub about_me: Option<String>,
}

/// Partial profile edit for `PATCH /api/v1/users/me`.
///
/// Absent fields are left alone; an empty `image` or `aboutMe` clears it.
/// `newPassword` requires `currentPassword`.
#[derive(Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub image: Option<String>,
    pub about_me: Option<String>,
    pub new_password: Option<String>,
    pub current_password: Option<String>,
}

fn user_field_error(error: &UserValidationError) -> crate::domain::Error {
    invalid_field_error(FieldName::new(error.field()), error)
}

fn parse_registration(payload: RegisterRequest) -> ApiResult<RegistrationRequest> {
    let RegisterRequest {
        login: login_name,
        password,
        username,
        image,
        about_me,
    } = payload;
    let credentials = LoginCredentials::try_from_parts(&login_name, &password)
        .map_err(|err| invalid_field_error(FieldName::new(err.field()), &err))?;
    let username = DisplayName::new(username).map_err(|err| user_field_error(&err))?;
    Ok(RegistrationRequest {
        credentials,
        username,
        image,
        about_me,
    })
}

fn parse_profile_update(payload: UpdateProfileRequest) -> ApiResult<ProfileUpdateRequest> {
    let username = payload
        .username
        .map(DisplayName::new)
        .transpose()
        .map_err(|err| user_field_error(&err))?;
    Ok(ProfileUpdateRequest {
        username,
        image: payload.image,
        about_me: payload.about_me,
        new_password: payload.new_password.map(Zeroizing::new),
        current_password: payload.current_password.map(Zeroizing::new),
    })
}

/// Register a new account holding the guest role.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 409, description = "Login already taken", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let request = parse_registration(payload.into_inner())?;
    let user = state.accounts.register(request).await?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let LoginRequest {
        login: login_name,
        password,
    } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&login_name, &password)
        .map_err(|err| invalid_field_error(FieldName::new(err.field()), &err))?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Fetch the signed-in user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts_query.current_user(principal).await?;
    Ok(web::Json(user.into()))
}

/// Edit the signed-in user's profile or password.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 422, description = "Current password did not match", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "updateProfile"
)]
#[patch("/users/me")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let request = parse_profile_update(payload.into_inner())?;
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts.update_profile(principal, request).await?;
    Ok(web::Json(user.into()))
}

/// Delete the signed-in account, its posts and their comments.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me",
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteSelf"
)]
#[delete("/users/me")]
pub async fn delete_self(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let principal = current_principal(&state, &session).await?;
    state.accounts.delete_self(principal).await?;
    session.clear();
    Ok(HttpResponse::NoContent().finish())
}

/// List the signed-in user's posts.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/posts",
    responses(
        (status = 200, description = "Posts, oldest first", body = [PostResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listOwnPosts"
)]
#[get("/users/me/posts")]
pub async fn list_own_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PostResponse>>> {
    let principal = current_principal(&state, &session).await?;
    let posts = state.posts_query.list_posts_for_user(principal, None).await?;
    Ok(web::Json(posts.into_iter().map(Into::into).collect()))
}

/// List every user except the caller.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Guest role required", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let principal = current_principal(&state, &session).await?;
    let users = state.accounts_query.list_users(principal).await?;
    Ok(web::Json(users.into_iter().map(Into::into).collect()))
}

/// Count registered users.
#[utoipa::path(
    get,
    path = "/api/v1/users/count",
    responses(
        (status = 200, description = "User count", body = CountResponse),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "countUsers"
)]
#[get("/users/count")]
pub async fn count_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<CountResponse>> {
    let principal = current_principal(&state, &session).await?;
    let count = state.accounts_query.count_users(principal).await?;
    Ok(web::Json(CountResponse { count }))
}

/// Fetch a user by id.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id: UserId = parse_id(&path, USER_ID)?;
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts_query.get_user(principal, user_id).await?;
    Ok(web::Json(user.into()))
}

/// Delete another user's account; admin only.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id: UserId = parse_id(&path, USER_ID)?;
    let principal = current_principal(&state, &session).await?;
    state.accounts.delete_user(principal, user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// List posts owned by a user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/posts",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Posts, oldest first", body = [PostResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUserPosts"
)]
#[get("/users/{id}/posts")]
pub async fn list_user_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<PostResponse>>> {
    let user_id: UserId = parse_id(&path, USER_ID)?;
    let principal = current_principal(&state, &session).await?;
    let posts = state
        .posts_query
        .list_posts_for_user(principal, Some(user_id))
        .await?;
    Ok(web::Json(posts.into_iter().map(Into::into).collect()))
}

/// Follow a user.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/follow",
    params(("id" = String, Path, description = "User to follow")),
    responses(
        (status = 200, description = "Caller after following", body = UserResponse),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 409, description = "Already following", body = ErrorSchema),
        (status = 422, description = "Cannot follow yourself", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "follow"
)]
#[put("/users/{id}/follow")]
pub async fn follow(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let target: UserId = parse_id(&path, USER_ID)?;
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts.follow(principal, target).await?;
    Ok(web::Json(user.into()))
}

/// Stop following a user; a no-op when not following.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}/follow",
    params(("id" = String, Path, description = "User to unfollow")),
    responses(
        (status = 200, description = "Caller after unfollowing", body = UserResponse),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "unfollow"
)]
#[delete("/users/{id}/follow")]
pub async fn unfollow(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserResponse>> {
    let target: UserId = parse_id(&path, USER_ID)?;
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts.unfollow(principal, target).await?;
    Ok(web::Json(user.into()))
}

/// Grant a role to another user; admin only.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/roles/{roleId}",
    params(
        ("id" = String, Path, description = "User receiving the role"),
        ("roleId" = String, Path, description = "Role to grant")
    ),
    responses(
        (status = 200, description = "User after the grant", body = UserResponse),
        (status = 403, description = "Admin role required", body = ErrorSchema),
        (status = 404, description = "User or role not found", body = ErrorSchema),
        (status = 409, description = "Role already held", body = ErrorSchema),
        (status = 422, description = "Cannot grant a role to yourself", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "grantRole"
)]
#[put("/users/{id}/roles/{roleId}")]
pub async fn grant_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<UserResponse>> {
    let (raw_user, raw_role) = path.into_inner();
    let target: UserId = parse_id(&raw_user, USER_ID)?;
    let role: RoleId = parse_id(&raw_role, ROLE_ID)?;
    let principal = current_principal(&state, &session).await?;
    let user = state.accounts.grant_role(principal, target, role).await?;
    Ok(web::Json(user.into()))
}

/// Register every users route in matching order.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(list_users)
        .service(count_users)
        .service(current_user)
        .service(update_profile)
        .service(delete_self)
        .service(list_own_posts)
        .service(get_user)
        .service(delete_user)
        .service(list_user_posts)
        .service(follow)
        .service(unfollow)
        .service(grant_role);
}

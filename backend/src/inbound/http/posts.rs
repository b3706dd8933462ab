//! Posts API handlers.
//!
//! ```text
//! GET    /api/v1/posts
//! POST   /api/v1/posts                 {"title":"…","description":"…","imageProof":"…"}
//! GET    /api/v1/posts/{id}
//! DELETE /api/v1/posts/{id}
//! POST   /api/v1/posts/{id}/comments   {"description":"…"}
//! PUT    /api/v1/posts/{id}/likes
//! GET    /api/v1/posts/{id}/likes
//! PUT    /api/v1/posts/{id}/validators
//! GET    /api/v1/posts/{id}/validators
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{CommentBody, PostContent, PostId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::current_principal;
use crate::inbound::http::dto::{
    CommentResponse, CountResponse, PostDetailResponse, PostResponse, UserResponse,
};
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_field_error, missing_field_error, parse_id,
};

const POST_ID: FieldName = FieldName::new("postId");

/// Body for `POST /api/v1/posts`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[schema(example = "Finished my first marathon")]
    pub title: Option<String>,
    pub description: Option<String>,
    /// Reference to the image proving the claim.
    #[schema(example = "https://img.example/finish-line.jpg")]
    pub image_proof: Option<String>,
}

/// Body for `POST /api/v1/posts/{id}/comments`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CommentRequest {
    pub description: Option<String>,
}

fn parse_post_content(payload: CreatePostRequest) -> ApiResult<PostContent> {
    let title = payload
        .title
        .ok_or_else(|| missing_field_error(FieldName::new("title")))?;
    let description = payload
        .description
        .ok_or_else(|| missing_field_error(FieldName::new("description")))?;
    let image_proof = payload
        .image_proof
        .ok_or_else(|| missing_field_error(FieldName::new("imageProof")))?;
    PostContent::new(&title, &description, &image_proof)
        .map_err(|err| invalid_field_error(FieldName::new(err.field()), &err))
}

fn parse_comment(payload: CommentRequest) -> ApiResult<CommentBody> {
    let field = FieldName::new("description");
    let text = payload.description.ok_or_else(|| missing_field_error(field))?;
    CommentBody::new(text).map_err(|err| invalid_field_error(field, err))
}

/// List every post, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/posts",
    responses(
        (status = 200, description = "Posts", body = [PostResponse]),
        (status = 401, description = "Unauthenticated", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "listPosts"
)]
#[get("/posts")]
pub async fn list_posts(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<PostResponse>>> {
    let principal = current_principal(&state, &session).await?;
    let posts = state.posts_query.list_posts(principal).await?;
    Ok(web::Json(posts.into_iter().map(Into::into).collect()))
}

/// Publish a post owned by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthenticated", body = ErrorSchema),
        (status = 403, description = "Guest role required", body = ErrorSchema),
        (status = 500, description = "Internal server error", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
#[post("/posts")]
pub async fn create_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let content = parse_post_content(payload.into_inner())?;
    let principal = current_principal(&state, &session).await?;
    let post = state.posts.create_post(principal, content).await?;
    Ok(HttpResponse::Created().json(PostResponse::from(post)))
}

/// Fetch a post with its comments.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post and comments", body = PostDetailResponse),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "getPost"
)]
#[get("/posts/{id}")]
pub async fn get_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PostDetailResponse>> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    let detail = state.posts_query.get_post(principal, post_id).await?;
    Ok(web::Json(detail.into()))
}

/// Delete one of the caller's posts together with its comments.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 403, description = "Not the owner", body = ErrorSchema),
        (status = 404, description = "Not found", body = ErrorSchema),
        (status = 500, description = "Cascade incomplete", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
#[delete("/posts/{id}")]
pub async fn delete_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    state.posts.delete_post(principal, post_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Comment on a post.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = String, Path, description = "Post id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 404, description = "Post not found", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "addComment"
)]
#[post("/posts/{id}/comments")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let body = parse_comment(payload.into_inner())?;
    let principal = current_principal(&state, &session).await?;
    let comment = state.posts.add_comment(principal, post_id, body).await?;
    Ok(HttpResponse::Created().json(CommentResponse::from(comment)))
}

/// Like a post.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}/likes",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post after the like", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorSchema),
        (status = 409, description = "Already liked", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "likePost"
)]
#[put("/posts/{id}/likes")]
pub async fn like_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PostResponse>> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    let post = state.posts.like(principal, post_id).await?;
    Ok(web::Json(post.into()))
}

/// Count likes on a post.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/likes",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Like count", body = CountResponse),
        (status = 404, description = "Post not found", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "countLikes"
)]
#[get("/posts/{id}/likes")]
pub async fn count_likes(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CountResponse>> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    let count = state.posts_query.count_likes(principal, post_id).await?;
    Ok(web::Json(CountResponse { count }))
}

/// Endorse a post as genuine.
#[utoipa::path(
    put,
    path = "/api/v1/posts/{id}/validators",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post after validation", body = PostResponse),
        (status = 404, description = "Post not found", body = ErrorSchema),
        (status = 409, description = "Already validated", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "validatePost"
)]
#[put("/posts/{id}/validators")]
pub async fn validate_post(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<PostResponse>> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    let post = state.posts.validate(principal, post_id).await?;
    Ok(web::Json(post.into()))
}

/// List users who validated a post.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/validators",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Validators in endorsement order", body = [UserResponse]),
        (status = 404, description = "Post not found", body = ErrorSchema)
    ),
    tags = ["posts"],
    operation_id = "listValidators"
)]
#[get("/posts/{id}/validators")]
pub async fn list_validators(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let post_id: PostId = parse_id(&path, POST_ID)?;
    let principal = current_principal(&state, &session).await?;
    let users = state.posts_query.list_validators(principal, post_id).await?;
    Ok(web::Json(users.into_iter().map(Into::into).collect()))
}

/// Register every posts route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_posts)
        .service(create_post)
        .service(get_post)
        .service(delete_post)
        .service(add_comment)
        .service(like_post)
        .service(count_likes)
        .service(validate_post)
        .service(list_validators);
}

//! Response payloads shared by the users, roles and posts handlers.
//!
//! Domain records never leave the adapter directly: the credential hash stays
//! behind and identifiers are rendered as strings.

use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::PostDetail;
use crate::domain::{Comment, EntityId, Post, RelationSet, Role, User};

fn id_strings<T: EntityId>(ids: &RelationSet<T>) -> Vec<String> {
    ids.iter().map(ToString::to_string).collect()
}

/// Public view of a user.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "ada@example.org")]
    pub login: String,
    #[schema(example = "Ada Lovelace")]
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
    pub joined_at: String,
    /// Role ids held by the user.
    pub roles: Vec<String>,
    /// Post ids owned by the user, oldest first.
    pub posts: Vec<String>,
    /// Ids of users this user follows.
    pub follows: Vec<String>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        let profile = user.profile();
        Self {
            id: user.id().to_string(),
            login: user.login().to_string(),
            username: profile.username.to_string(),
            image: profile.image.clone(),
            about_me: profile.about_me.clone(),
            joined_at: profile.joined_at.to_rfc3339(),
            roles: id_strings(user.roles()),
            posts: id_strings(user.posts()),
            follows: id_strings(user.follows()),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    pub id: String,
    #[schema(example = "admin")]
    pub name: String,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            id: role.id().to_string(),
            name: role.name().to_string(),
        }
    }
}

/// Cardinality answer for count endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct CountResponse {
    #[schema(example = 1)]
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image_proof: String,
    pub created_at: String,
    pub owner: String,
    pub likes: Vec<String>,
    pub comments: Vec<String>,
    pub validators: Vec<String>,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        let content = post.content();
        Self {
            id: post.id().to_string(),
            title: content.title().to_owned(),
            description: content.description().to_owned(),
            image_proof: content.image_proof().to_owned(),
            created_at: post.created_at().to_rfc3339(),
            owner: post.owner().to_string(),
            likes: id_strings(post.likes()),
            comments: id_strings(post.comments()),
            validators: id_strings(post.validators()),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub description: String,
    pub author: String,
    pub created_at: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id().to_string(),
            description: comment.description().as_ref().to_owned(),
            author: comment.author().to_string(),
            created_at: comment.created_at().to_rfc3339(),
        }
    }
}

/// A post together with its comments in attachment order.
#[derive(Debug, Serialize, ToSchema)]
pub struct PostDetailResponse {
    pub post: PostResponse,
    pub comments: Vec<CommentResponse>,
}

impl From<PostDetail> for PostDetailResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            post: detail.post.into(),
            comments: detail.comments.into_iter().map(Into::into).collect(),
        }
    }
}

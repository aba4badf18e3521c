use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedViewer, json::Json, query::Query,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use feedgraph_common::{
    model::{
        Id,
        comment::{Comment, CommentContent},
        page::{Page, PageRequest, Pagination},
        post::{Post, PostAuthor, PostContent, PostDetail, PostMarker},
        profile::ProfileMarker,
    },
    policy::Viewer,
};
use feedgraph_db::Store;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_posts)
        .typed_post(create_post)
        .typed_get(get_post)
        .typed_put(update_post)
        .typed_delete(delete_post)
        .typed_get(get_post_comments)
        .typed_post(create_comment)
}

/// The post, if it exists and `viewer` may read it.
pub(super) async fn fetch_readable_post(
    store: &dyn Store,
    viewer: &Viewer,
    id: Id<PostMarker>,
) -> Result<Post> {
    let post = store
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    viewer.ensure_can_read_post(&post)?;

    Ok(post)
}

async fn fetch_modifiable_post(
    store: &dyn Store,
    viewer: &Viewer,
    id: Id<PostMarker>,
) -> Result<Post> {
    let post = store
        .fetch_post(id)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;
    viewer.ensure_can_modify_post(&post)?;

    Ok(post)
}

#[derive(TypedPath)]
#[typed_path("/posts")]
struct PostsPath;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct PostFilter {
    profile: Option<Id<ProfileMarker>>,
}

async fn list_posts(
    PostsPath: PostsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Query(filter): Query<PostFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Post>>> {
    let pagination = Pagination::from(page);
    let listing = store
        .list_posts(&viewer.post_scope(), filter.profile, pagination)
        .await?;

    Ok(Json(Page::new(listing, pagination)))
}

async fn create_post(
    PostsPath: PostsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(post): Json<PostContent>,
) -> Result<(StatusCode, Json<Post>)> {
    let author = PostAuthor {
        user: viewer.user_id(),
        profile: viewer.profile_id(),
    };
    let post = store.create_post(author, &post).await?;
    info!(post = %post.id, slug = %post.slug, "Created post");

    Ok((StatusCode::CREATED, Json(post)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}", rejection(ServerError))]
struct PostPath {
    id: Id<PostMarker>,
}

async fn get_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<Json<PostDetail>> {
    let post = fetch_readable_post(store.as_ref(), &viewer, id).await?;
    let comments = store.fetch_post_comments(id).await?;

    Ok(Json(PostDetail { post, comments }))
}

async fn update_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(content): Json<PostContent>,
) -> Result<Json<Post>> {
    fetch_modifiable_post(store.as_ref(), &viewer, id).await?;

    let post = store
        .update_post(id, &content)
        .await?
        .ok_or(ServerError::PostByIdNotFound(id))?;

    Ok(Json(post))
}

async fn delete_post(
    PostPath { id }: PostPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<StatusCode> {
    fetch_modifiable_post(store.as_ref(), &viewer, id).await?;

    if !store.delete_post(id).await? {
        return Err(ServerError::PostByIdNotFound(id));
    }
    info!(post = %id, "Deleted post");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/comments", rejection(ServerError))]
struct PostCommentsPath {
    id: Id<PostMarker>,
}

async fn get_post_comments(
    PostCommentsPath { id }: PostCommentsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<Json<Vec<Comment>>> {
    fetch_readable_post(store.as_ref(), &viewer, id).await?;

    Ok(Json(store.fetch_post_comments(id).await?))
}

async fn create_comment(
    PostCommentsPath { id }: PostCommentsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(comment): Json<CommentContent>,
) -> Result<(StatusCode, Json<Comment>)> {
    fetch_readable_post(store.as_ref(), &viewer, id).await?;

    let comment = store
        .create_comment(id, viewer.user_id(), &comment)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

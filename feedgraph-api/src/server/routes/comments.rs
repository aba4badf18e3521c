use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedViewer, json::Json, query::Query,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use feedgraph_common::model::{
    Id,
    comment::{Comment, CommentContent, CommentMarker},
    page::{Page, PageRequest, Pagination},
};
use feedgraph_db::Store;
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_get(list_comments)
        .typed_get(get_comment)
        .typed_put(update_comment)
        .typed_delete(delete_comment)
}

#[derive(TypedPath)]
#[typed_path("/comments")]
struct CommentsPath;

async fn list_comments(
    CommentsPath: CommentsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Comment>>> {
    let pagination = Pagination::from(page);
    let listing = store
        .list_comments(&viewer.post_scope(), pagination)
        .await?;

    Ok(Json(Page::new(listing, pagination)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/comments/{id}", rejection(ServerError))]
struct CommentPath {
    id: Id<CommentMarker>,
}

async fn get_comment(
    CommentPath { id }: CommentPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<Json<Comment>> {
    let comment = store
        .fetch_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    let parent = store
        .fetch_post(comment.post)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    viewer.ensure_can_read_comment(&comment, &parent)?;

    Ok(Json(comment))
}

async fn update_comment(
    CommentPath { id }: CommentPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(content): Json<CommentContent>,
) -> Result<Json<Comment>> {
    let comment = store
        .fetch_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    viewer.ensure_can_modify_comment(&comment)?;

    let comment = store
        .update_comment(id, &content)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;

    Ok(Json(comment))
}

async fn delete_comment(
    CommentPath { id }: CommentPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<StatusCode> {
    let comment = store
        .fetch_comment(id)
        .await?
        .ok_or(ServerError::CommentByIdNotFound(id))?;
    viewer.ensure_can_modify_comment(&comment)?;

    if !store.delete_comment(id).await? {
        return Err(ServerError::CommentByIdNotFound(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

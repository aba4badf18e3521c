use crate::server::{
    Result, ServerError, ServerRouter, auth::AuthenticatedViewer, json::Json, query::Query,
    routes::posts::fetch_readable_post,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use feedgraph_common::model::{
    Id,
    post::PostMarker,
    reaction::{CreateReaction, PostLike, ReactedPost, ReactionStatus},
};
use feedgraph_db::Store;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_reaction)
        .typed_get(list_reactions)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/posts/{id}/reactions", rejection(ServerError))]
struct PostReactionsPath {
    id: Id<PostMarker>,
}

async fn create_reaction(
    PostReactionsPath { id }: PostReactionsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(CreateReaction { status }): Json<CreateReaction>,
) -> Result<(StatusCode, Json<PostLike>)> {
    fetch_readable_post(store.as_ref(), &viewer, id).await?;

    let like = store.create_reaction(id, viewer.user_id(), status).await?;
    info!(post = %id, %status, "Recorded reaction");

    Ok((StatusCode::CREATED, Json(like)))
}

#[derive(TypedPath)]
#[typed_path("/reactions")]
struct ReactionsPath;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct ReactionFilter {
    status: Option<ReactionStatus>,
}

async fn list_reactions(
    ReactionsPath: ReactionsPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Query(filter): Query<ReactionFilter>,
) -> Result<Json<Vec<ReactedPost>>> {
    let reactions = store
        .list_reactions(viewer.user_id(), filter.status)
        .await?;

    Ok(Json(reactions))
}

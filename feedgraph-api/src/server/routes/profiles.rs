use crate::server::{
    Result, ServerError, ServerRouter,
    auth::{AuthenticatedUser, AuthenticatedViewer},
    json::Json,
    query::Query,
};
use axum::{extract::State, http::StatusCode};
use axum_extra::routing::{RouterExt, TypedPath};
use feedgraph_common::{
    model::{
        Id,
        page::{Page, PageRequest, Pagination},
        profile::{
            FollowOutcome, Profile, ProfileContent, ProfileDetail, ProfileMarker, ProfileSummary,
            ProfileView,
        },
    },
    policy::ProfileShape,
};
use feedgraph_db::Store;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .typed_post(create_profile)
        .typed_get(list_profiles)
        .typed_get(get_profile)
        .typed_put(update_profile)
        .typed_delete(delete_profile)
        .typed_post(follow_profile)
        .typed_get(get_followers)
        .typed_get(get_following)
}

#[derive(TypedPath)]
#[typed_path("/profiles")]
struct ProfilesPath;

async fn create_profile(
    ProfilesPath: ProfilesPath,
    State(store): State<Arc<dyn Store>>,
    user: AuthenticatedUser,
    Json(profile): Json<ProfileContent>,
) -> Result<(StatusCode, Json<Profile>)> {
    let profile = store.create_profile(user.user_id(), &profile).await?;
    info!(profile = %profile.id, username = %profile.username, "Created profile");

    Ok((StatusCode::CREATED, Json(profile)))
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize)]
struct ProfileFilter {
    search: Option<String>,
}

async fn list_profiles(
    ProfilesPath: ProfilesPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(_viewer): AuthenticatedViewer,
    Query(filter): Query<ProfileFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Profile>>> {
    let pagination = Pagination::from(page);
    let search = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let listing = store.list_profiles(search, pagination).await?;

    Ok(Json(Page::new(listing, pagination)))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}", rejection(ServerError))]
struct ProfilePath {
    id: Id<ProfileMarker>,
}

async fn get_profile(
    ProfilePath { id }: ProfilePath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<Json<ProfileView>> {
    let profile = store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    let followers_count = store.count_followers(id).await?;

    let view = match viewer.context_for(id).profile_shape() {
        ProfileShape::Detail => ProfileView::Detail(ProfileDetail {
            profile,
            followers_count,
            is_following: viewer.follows(id),
            posts: store.fetch_profile_posts(id).await?,
        }),
        ProfileShape::Summary => ProfileView::Summary(ProfileSummary {
            profile,
            followers_count,
        }),
    };

    Ok(Json(view))
}

async fn update_profile(
    ProfilePath { id }: ProfilePath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
    Json(content): Json<ProfileContent>,
) -> Result<Json<Profile>> {
    let profile = store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    viewer.ensure_can_modify_profile(&profile)?;

    let profile = store
        .update_profile(id, &content)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;

    Ok(Json(profile))
}

async fn delete_profile(
    ProfilePath { id }: ProfilePath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<StatusCode> {
    let profile = store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    viewer.ensure_can_modify_profile(&profile)?;

    if !store.delete_profile(id).await? {
        return Err(ServerError::ProfileByIdNotFound(id));
    }
    info!(profile = %id, "Deleted profile");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}/follow", rejection(ServerError))]
struct FollowPath {
    id: Id<ProfileMarker>,
}

async fn follow_profile(
    FollowPath { id }: FollowPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(viewer): AuthenticatedViewer,
) -> Result<Json<FollowOutcome>> {
    viewer.check_follow(id)?;
    store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;
    let follower = store
        .fetch_profile(viewer.profile_id())
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(viewer.profile_id()))?;

    let created = store.follow(viewer.profile_id(), id).await?;
    if created {
        info!(follower = %viewer.profile_id(), target = %id, "Followed profile");
    }
    let is_following = store.is_following(viewer.profile_id(), id).await?;

    Ok(Json(FollowOutcome {
        profile_id: id,
        username: follower.username,
        is_following,
    }))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}/followers", rejection(ServerError))]
struct FollowersPath {
    id: Id<ProfileMarker>,
}

async fn get_followers(
    FollowersPath { id }: FollowersPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(_viewer): AuthenticatedViewer,
) -> Result<Json<Vec<Profile>>> {
    store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;

    Ok(Json(store.fetch_followers(id).await?))
}

#[derive(TypedPath, Deserialize)]
#[typed_path("/profiles/{id}/following", rejection(ServerError))]
struct FollowingPath {
    id: Id<ProfileMarker>,
}

async fn get_following(
    FollowingPath { id }: FollowingPath,
    State(store): State<Arc<dyn Store>>,
    AuthenticatedViewer(_viewer): AuthenticatedViewer,
) -> Result<Json<Vec<Profile>>> {
    store
        .fetch_profile(id)
        .await?
        .ok_or(ServerError::ProfileByIdNotFound(id))?;

    Ok(Json(store.fetch_following(id).await?))
}

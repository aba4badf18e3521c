use crate::server::{Result, ServerRouter, auth::AuthenticatedUser, json::Json};
use axum_extra::routing::{RouterExt, TypedPath};
use feedgraph_common::model::user::Principal;

pub fn routes() -> ServerRouter {
    ServerRouter::new().typed_get(get_current_user)
}

#[derive(TypedPath)]
#[typed_path("/users/me")]
struct CurrentUserPath;

async fn get_current_user(
    CurrentUserPath: CurrentUserPath,
    user: AuthenticatedUser,
) -> Result<Json<Principal>> {
    Ok(Json(user.principal()))
}

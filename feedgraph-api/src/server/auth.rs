use crate::server::ServerError;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::TypedHeader;
use feedgraph_common::{
    model::{
        Id,
        auth::AuthToken,
        user::{Principal, UserMarker},
    },
    policy::{Viewer, require_profile},
};
use feedgraph_db::Store;
use headers::{Authorization, authorization::Bearer};
use std::sync::Arc;
use time::UtcDateTime;
use tracing::debug;

type AuthorizationHeader = TypedHeader<Authorization<Bearer>>;

/// The principal behind a valid bearer token. Does not require a profile.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct AuthenticatedUser {
    principal: Principal,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn principal(self) -> Principal {
        self.principal
    }

    #[must_use]
    pub fn user_id(self) -> Id<UserMarker> {
        self.principal.user.id
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let request_token: AuthToken = AuthorizationHeader::from_request_parts(parts, state)
            .await
            .map_err(ServerError::InvalidAuthorizationHeader)?
            .token()
            .parse()?;

        let token_hash = request_token.hash()?;
        let store = Arc::<dyn Store>::from_ref(state);

        let authentication = store
            .fetch_auth(&token_hash)
            .await?
            .ok_or(ServerError::InvalidToken)?;

        if authentication.user != request_token.user_id
            || authentication.is_expired_at(UtcDateTime::now())
        {
            return Err(ServerError::InvalidToken);
        }

        let principal = store
            .fetch_principal(authentication.user)
            .await?
            .ok_or(ServerError::InvalidToken)?;
        debug!(user = %principal.user.id, "Authenticated request");

        Ok(Self { principal })
    }
}

/// An authenticated principal that has a profile, with its follow set loaded.
/// Rejects principals without a profile with the missing-profile denial.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct AuthenticatedViewer(pub Viewer);

impl<S> FromRequestParts<S> for AuthenticatedViewer
where
    Arc<dyn Store>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let principal = AuthenticatedUser::from_request_parts(parts, state)
            .await?
            .principal();
        let profile_id = require_profile(&principal)?;

        let following = Arc::<dyn Store>::from_ref(state)
            .fetch_following_ids(profile_id)
            .await?;

        Ok(Self(Viewer::new(&principal, following)?))
    }
}

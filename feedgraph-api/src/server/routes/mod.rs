use crate::server::ServerRouter;

mod comments;
mod posts;
mod profiles;
mod reactions;
mod users;

pub fn routes() -> ServerRouter {
    ServerRouter::new()
        .merge(users::routes())
        .merge(profiles::routes())
        .merge(posts::routes())
        .merge(comments::routes())
        .merge(reactions::routes())
}

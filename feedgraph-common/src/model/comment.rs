use crate::{
    model::{
        Id,
        post::PostMarker,
        text::{Body, Username},
        user::UserMarker,
    },
    util::timestamp,
};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CommentMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Comment {
    pub id: Id<CommentMarker>,
    pub post: Id<PostMarker>,
    pub author: Id<UserMarker>,
    /// Username of the author's profile, absent once that profile is gone.
    pub owner: Option<Username>,
    pub content: Body,
    #[serde(rename = "created_time", serialize_with = "timestamp::serialize")]
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CommentContent {
    pub content: Body,
}

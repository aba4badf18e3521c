use crate::{
    model::{
        Id,
        comment::Comment,
        profile::ProfileMarker,
        reaction::ReactionCounts,
        text::{Body, MediaRef, PostTitle, Username},
        user::UserMarker,
    },
    slug::Slug,
    util::timestamp,
};
use serde::{Deserialize, Serialize};
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct PostMarker;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct Post {
    pub id: Id<PostMarker>,
    pub profile: Id<ProfileMarker>,
    pub username: Username,
    pub owner: Id<UserMarker>,
    pub title: PostTitle,
    pub slug: Slug,
    pub content: Body,
    pub image: Option<MediaRef>,
    pub video: Option<MediaRef>,
    #[serde(flatten)]
    pub reactions: ReactionCounts,
    #[serde(rename = "created_time", serialize_with = "timestamp::serialize")]
    pub created_at: UtcDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
}

/// Writable fields of a post. The slug is derived from the title once, at
/// creation, and is not affected by later replacements.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct PostContent {
    pub title: PostTitle,
    pub content: Body,
    #[serde(default)]
    pub image: Option<MediaRef>,
    #[serde(default)]
    pub video: Option<MediaRef>,
}

/// The principal and profile a new post is attributed to.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct PostAuthor {
    pub user: Id<UserMarker>,
    pub profile: Id<ProfileMarker>,
}

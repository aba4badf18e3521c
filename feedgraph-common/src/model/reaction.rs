use crate::{
    model::{
        Id,
        post::PostMarker,
        text::PostTitle,
        user::UserMarker,
    },
    util::timestamp,
};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};
use thiserror::Error;
use time::UtcDateTime;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ReactionMarker;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReactionStatus {
    #[default]
    Like,
    Unlike,
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("Unknown reaction status: {0}")]
pub struct InvalidReactionStatusError(String);

impl ReactionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReactionStatus::Like => "LIKE",
            ReactionStatus::Unlike => "UNLIKE",
        }
    }
}

impl Display for ReactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionStatus {
    type Err = InvalidReactionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(ReactionStatus::Like),
            "UNLIKE" => Ok(ReactionStatus::Unlike),
            other => Err(InvalidReactionStatusError(other.to_owned())),
        }
    }
}

/// A recorded reaction. There is at most one per author and post.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct PostLike {
    pub id: Id<ReactionMarker>,
    pub post: Id<PostMarker>,
    pub author: Id<UserMarker>,
    pub status: ReactionStatus,
    #[serde(rename = "created_time", serialize_with = "timestamp::serialize")]
    pub created_at: UtcDateTime,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct CreateReaction {
    pub status: ReactionStatus,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct ReactionCounts {
    pub likes_count: u64,
    pub unlikes_count: u64,
}

impl ReactionCounts {
    pub fn record(&mut self, status: ReactionStatus) {
        match status {
            ReactionStatus::Like => self.likes_count += 1,
            ReactionStatus::Unlike => self.unlikes_count += 1,
        }
    }
}

/// One of the viewer's own reactions, with enough of the post to list it.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct ReactedPost {
    pub post: Id<PostMarker>,
    pub owner: Id<UserMarker>,
    pub title: PostTitle,
    pub status: ReactionStatus,
}

use crate::model::{
    Id,
    post::Post,
    text::{MediaRef, ProfileField, Username},
    user::UserMarker,
};
use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct ProfileMarker;

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct Profile {
    pub id: Id<ProfileMarker>,
    pub user: Id<UserMarker>,
    pub username: Username,
    pub avatar: Option<MediaRef>,
    pub city: Option<ProfileField>,
    pub birth_date: Option<ProfileField>,
}

/// Writable fields of a profile, used for both creation and replacement.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
pub struct ProfileContent {
    pub username: Username,
    #[serde(default)]
    pub avatar: Option<MediaRef>,
    #[serde(default)]
    pub city: Option<ProfileField>,
    #[serde(default)]
    pub birth_date: Option<ProfileField>,
}

/// What a stranger gets to see of a profile.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct ProfileSummary {
    #[serde(flatten)]
    pub profile: Profile,
    pub followers_count: u64,
}

/// What the owner, followers and staff get to see of a profile.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct ProfileDetail {
    #[serde(flatten)]
    pub profile: Profile,
    pub followers_count: u64,
    pub is_following: bool,
    pub posts: Vec<Post>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
#[serde(untagged)]
pub enum ProfileView {
    Detail(ProfileDetail),
    Summary(ProfileSummary),
}

/// Response to a follow request: the followed profile and the follower's name.
#[derive(Clone, Eq, PartialEq, Debug, Hash, Serialize)]
pub struct FollowOutcome {
    pub profile_id: Id<ProfileMarker>,
    pub username: Username,
    pub is_following: bool,
}

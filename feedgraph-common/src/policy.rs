//! Who may see and change what.
//!
//! Everything here is pure: the store loads the facts (the viewer's principal
//! and follow set, the entity in question) and these functions decide. The
//! store only ever filters by a [`PostScope`] computed here, so list queries
//! and single-item checks cannot disagree.

use crate::model::{
    Id,
    comment::{Comment, CommentMarker},
    post::{Post, PostMarker},
    profile::{Profile, ProfileMarker},
    user::{Principal, UserMarker},
};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum PolicyError {
    #[error("User has no profile. Create a profile first.")]
    MissingProfile,
    #[error("Post {0} is not visible to this profile.")]
    PostNotVisible(Id<PostMarker>),
    #[error("Only the owner may modify post {0}.")]
    NotPostOwner(Id<PostMarker>),
    #[error("Comment {0} is not visible to this profile.")]
    CommentNotVisible(Id<CommentMarker>),
    #[error("Only the author may modify comment {0}.")]
    NotCommentAuthor(Id<CommentMarker>),
    #[error("Only the owner may modify profile {0}.")]
    NotProfileOwner(Id<ProfileMarker>),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash, Error)]
pub enum FollowError {
    #[error("A profile cannot follow itself.")]
    SelfFollow,
}

/// How a viewer relates to a profile. Decides both access to that profile's
/// content and which shape of the profile is returned.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ViewContext {
    Owner,
    Follower,
    Elevated,
    Stranger,
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum ProfileShape {
    Detail,
    Summary,
}

impl ViewContext {
    #[must_use]
    pub fn can_read_content(self) -> bool {
        match self {
            ViewContext::Owner | ViewContext::Follower | ViewContext::Elevated => true,
            ViewContext::Stranger => false,
        }
    }

    #[must_use]
    pub fn profile_shape(self) -> ProfileShape {
        match self {
            ViewContext::Owner | ViewContext::Follower | ViewContext::Elevated => {
                ProfileShape::Detail
            }
            ViewContext::Stranger => ProfileShape::Summary,
        }
    }
}

/// The set of owning profiles whose posts a viewer may read.
#[derive(Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostScope {
    All,
    Profiles(BTreeSet<Id<ProfileMarker>>),
}

impl PostScope {
    #[must_use]
    pub fn contains(&self, profile: Id<ProfileMarker>) -> bool {
        match self {
            PostScope::All => true,
            PostScope::Profiles(profiles) => profiles.contains(&profile),
        }
    }
}

/// A principal that has a profile, with everything needed to decide access.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Viewer {
    user: Id<UserMarker>,
    profile: Id<ProfileMarker>,
    following: BTreeSet<Id<ProfileMarker>>,
    elevated: bool,
}

/// The profile of `principal`, or the distinguished missing-profile denial.
pub fn require_profile(principal: &Principal) -> Result<Id<ProfileMarker>, PolicyError> {
    principal.profile.ok_or(PolicyError::MissingProfile)
}

impl Viewer {
    pub fn new(
        principal: &Principal,
        following: impl IntoIterator<Item = Id<ProfileMarker>>,
    ) -> Result<Self, PolicyError> {
        let profile = require_profile(principal)?;

        Ok(Self {
            user: principal.user.id,
            profile,
            following: following.into_iter().collect(),
            elevated: principal.user.is_staff,
        })
    }

    #[must_use]
    pub fn user_id(&self) -> Id<UserMarker> {
        self.user
    }

    #[must_use]
    pub fn profile_id(&self) -> Id<ProfileMarker> {
        self.profile
    }

    #[must_use]
    pub fn follows(&self, profile: Id<ProfileMarker>) -> bool {
        self.following.contains(&profile)
    }

    #[must_use]
    pub fn context_for(&self, profile: Id<ProfileMarker>) -> ViewContext {
        if profile == self.profile {
            ViewContext::Owner
        } else if self.follows(profile) {
            ViewContext::Follower
        } else if self.elevated {
            ViewContext::Elevated
        } else {
            ViewContext::Stranger
        }
    }

    /// Own profile plus every followed profile, or everything for staff.
    #[must_use]
    pub fn post_scope(&self) -> PostScope {
        if self.elevated {
            return PostScope::All;
        }

        let mut profiles = self.following.clone();
        profiles.insert(self.profile);
        PostScope::Profiles(profiles)
    }

    #[must_use]
    pub fn can_read_post(&self, post: &Post) -> bool {
        self.context_for(post.profile).can_read_content()
    }

    pub fn ensure_can_read_post(&self, post: &Post) -> Result<(), PolicyError> {
        if self.can_read_post(post) {
            Ok(())
        } else {
            Err(PolicyError::PostNotVisible(post.id))
        }
    }

    /// Only the owning principal may update or delete a post. Staff included.
    pub fn ensure_can_modify_post(&self, post: &Post) -> Result<(), PolicyError> {
        if post.owner == self.user {
            Ok(())
        } else {
            Err(PolicyError::NotPostOwner(post.id))
        }
    }

    /// A comment is as visible as the post it belongs to.
    pub fn ensure_can_read_comment(
        &self,
        comment: &Comment,
        parent: &Post,
    ) -> Result<(), PolicyError> {
        debug_assert_eq!(comment.post, parent.id);

        if self.can_read_post(parent) {
            Ok(())
        } else {
            Err(PolicyError::CommentNotVisible(comment.id))
        }
    }

    pub fn ensure_can_modify_comment(&self, comment: &Comment) -> Result<(), PolicyError> {
        if comment.author == self.user {
            Ok(())
        } else {
            Err(PolicyError::NotCommentAuthor(comment.id))
        }
    }

    pub fn ensure_can_modify_profile(&self, profile: &Profile) -> Result<(), PolicyError> {
        if profile.user == self.user {
            Ok(())
        } else {
            Err(PolicyError::NotProfileOwner(profile.id))
        }
    }

    pub fn check_follow(&self, target: Id<ProfileMarker>) -> Result<(), FollowError> {
        if target == self.profile {
            Err(FollowError::SelfFollow)
        } else {
            Ok(())
        }
    }
}

/// Orders a feed newest first. The sort is stable, so posts with equal
/// timestamps keep the order they were passed in, which callers keep as
/// insertion order.
pub fn sort_feed(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

#[cfg(test)]
mod tests {
    use super::{FollowError, PolicyError, PostScope, ProfileShape, ViewContext, Viewer, sort_feed};
    use crate::{
        model::{
            Id,
            comment::Comment,
            post::Post,
            profile::{Profile, ProfileMarker},
            text::{Body, PostTitle, Username},
            user::{Principal, User, UserMarker},
        },
        slug::Slug,
    };
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use time::{Duration, UtcDateTime, macros::utc_datetime};

    const T0: UtcDateTime = utc_datetime!(2026-01-01 00:00);

    fn principal(user: u64, profile: Option<u64>, is_staff: bool) -> Principal {
        Principal {
            user: User {
                id: Id::from(user),
                is_staff,
            },
            profile: profile.map(Id::from),
        }
    }

    fn viewer(user: u64, profile: u64, following: &[u64], is_staff: bool) -> Viewer {
        Viewer::new(
            &principal(user, Some(profile), is_staff),
            following.iter().copied().map(Id::from),
        )
        .unwrap()
    }

    fn post(id: u64, owner: u64, profile: u64, created_at: UtcDateTime) -> Post {
        Post {
            id: Id::from(id),
            profile: Id::from(profile),
            username: Username::new(format!("profile{profile}")).unwrap(),
            owner: Id::from(owner),
            title: PostTitle::new("Title".to_owned()).unwrap(),
            slug: Slug::from_stored(format!("title-{id}")),
            content: Body::new("Content".to_owned()).unwrap(),
            image: None,
            video: None,
            reactions: Default::default(),
            created_at,
        }
    }

    fn comment(id: u64, post: u64, author: u64) -> Comment {
        Comment {
            id: Id::from(id),
            post: Id::from(post),
            author: Id::from(author),
            owner: None,
            content: Body::new("Nice".to_owned()).unwrap(),
            created_at: T0,
        }
    }

    #[test]
    fn missing_profile_is_distinguished() {
        assert_eq!(
            Viewer::new(&principal(1, None, false), []),
            Err(PolicyError::MissingProfile)
        );
        assert_eq!(
            Viewer::new(&principal(1, None, true), []),
            Err(PolicyError::MissingProfile)
        );
    }

    #[test]
    fn view_contexts() {
        let a = viewer(1, 10, &[20], false);
        assert_eq!(a.context_for(Id::from(10)), ViewContext::Owner);
        assert_eq!(a.context_for(Id::from(20)), ViewContext::Follower);
        assert_eq!(a.context_for(Id::from(30)), ViewContext::Stranger);

        let staff = viewer(2, 11, &[20], true);
        assert_eq!(staff.context_for(Id::from(11)), ViewContext::Owner);
        assert_eq!(staff.context_for(Id::from(20)), ViewContext::Follower);
        assert_eq!(staff.context_for(Id::from(30)), ViewContext::Elevated);

        assert_eq!(ViewContext::Stranger.profile_shape(), ProfileShape::Summary);
        assert_eq!(ViewContext::Elevated.profile_shape(), ProfileShape::Detail);
        assert!(!ViewContext::Stranger.can_read_content());
    }

    #[test]
    fn feed_scope_follows_edges() {
        // A(10) follows B(20) and C(30); D(40) is unrelated.
        let a = viewer(1, 10, &[20, 30], false);
        let posts = [
            post(100, 1, 10, T0),
            post(101, 2, 20, T0),
            post(102, 3, 30, T0),
            post(103, 4, 40, T0),
        ];

        let visible: Vec<u64> = posts
            .iter()
            .filter(|post| a.can_read_post(post))
            .map(|post| post.id.into())
            .collect();
        assert_eq!(visible, vec![100, 101, 102]);
        assert_eq!(
            a.ensure_can_read_post(&posts[3]),
            Err(PolicyError::PostNotVisible(Id::from(103)))
        );
    }

    #[test]
    fn staff_scope_is_everything() {
        let staff = viewer(9, 90, &[], true);
        assert_eq!(staff.post_scope(), PostScope::All);
        assert!(staff.can_read_post(&post(1, 4, 40, T0)));
    }

    #[test]
    fn only_owner_modifies_post() {
        let owner = viewer(1, 10, &[], false);
        let follower = viewer(2, 20, &[10], false);
        let staff = viewer(3, 30, &[], true);
        let post = post(100, 1, 10, T0);

        assert_eq!(owner.ensure_can_modify_post(&post), Ok(()));
        assert_eq!(
            follower.ensure_can_modify_post(&post),
            Err(PolicyError::NotPostOwner(post.id))
        );
        assert!(follower.can_read_post(&post));
        assert_eq!(
            staff.ensure_can_modify_post(&post),
            Err(PolicyError::NotPostOwner(post.id))
        );
    }

    #[test]
    fn comments_follow_their_post() {
        let a = viewer(1, 10, &[20], false);
        let followed_post = post(100, 2, 20, T0);
        let foreign_post = post(101, 4, 40, T0);

        let on_followed = comment(500, 100, 4);
        let on_foreign = comment(501, 101, 1);

        assert_eq!(a.ensure_can_read_comment(&on_followed, &followed_post), Ok(()));
        assert_eq!(
            a.ensure_can_read_comment(&on_foreign, &foreign_post),
            Err(PolicyError::CommentNotVisible(Id::from(501)))
        );

        assert_eq!(
            a.ensure_can_modify_comment(&on_followed),
            Err(PolicyError::NotCommentAuthor(Id::from(500)))
        );
        assert_eq!(a.ensure_can_modify_comment(&on_foreign), Ok(()));
    }

    #[test]
    fn profile_modification_and_self_follow() {
        let a = viewer(1, 10, &[], false);
        let own = Profile {
            id: Id::from(10),
            user: Id::<UserMarker>::from(1),
            ..Profile::default()
        };
        let other = Profile {
            id: Id::from(20),
            user: Id::from(2),
            ..Profile::default()
        };

        assert_eq!(a.ensure_can_modify_profile(&own), Ok(()));
        assert_eq!(
            a.ensure_can_modify_profile(&other),
            Err(PolicyError::NotProfileOwner(Id::from(20)))
        );
        assert_eq!(a.check_follow(Id::from(10)), Err(FollowError::SelfFollow));
        assert_eq!(a.check_follow(Id::from(20)), Ok(()));
    }

    #[test]
    fn feed_is_newest_first_and_stable() {
        let mut posts = vec![
            post(1, 1, 10, T0),
            post(2, 1, 10, T0 + Duration::seconds(5)),
            post(3, 1, 10, T0),
            post(4, 1, 10, T0 + Duration::seconds(1)),
        ];
        sort_feed(&mut posts);

        let order: Vec<u64> = posts.iter().map(|post| post.id.into()).collect();
        assert_eq!(order, vec![2, 4, 1, 3]);
    }

    proptest! {
        #[test]
        fn read_set_matches_definition(
            following in proptest::collection::btree_set(0u64..8, 0..8),
            owners in proptest::collection::vec(0u64..8, 0..24),
            is_staff in any::<bool>(),
        ) {
            let me = 0u64;
            let v = Viewer::new(
                &principal(100, Some(me), is_staff),
                following.iter().copied().map(Id::<ProfileMarker>::from),
            )
            .unwrap();
            let scope = v.post_scope();

            for (index, owner) in owners.iter().copied().enumerate() {
                let post = post(index as u64, 200 + owner, owner, T0);
                let expected = owner == me || following.contains(&owner) || is_staff;

                prop_assert_eq!(v.can_read_post(&post), expected);
                prop_assert_eq!(scope.contains(post.profile), expected);
            }
        }
    }

    #[test]
    fn scope_lists_own_and_followed() {
        let a = viewer(1, 10, &[20, 30], false);
        assert_eq!(
            a.post_scope(),
            PostScope::Profiles(BTreeSet::from([
                Id::from(10),
                Id::from(20),
                Id::from(30)
            ]))
        );
    }
}

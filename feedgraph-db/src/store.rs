use async_trait::async_trait;
use feedgraph_common::{
    model::{
        Id, ModelValidationError,
        auth::{Authentication, AuthTokenHash},
        comment::{Comment, CommentContent, CommentMarker},
        page::{Listing, Pagination},
        post::{Post, PostAuthor, PostContent, PostMarker},
        profile::{Profile, ProfileContent, ProfileMarker},
        reaction::{PostLike, ReactedPost, ReactionStatus},
        text::Username,
        user::{Principal, UserMarker},
    },
    policy::PostScope,
};
use thiserror::Error;

pub type Result<T, E = DbError> = std::result::Result<T, E>;

/// How often a post insert recomputes its slug after losing a race.
pub const SLUG_INSERT_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("An object in the database was invalid: {0}")]
    Data(#[from] ModelValidationError),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("User {author} already reacted to post {post}.")]
    DuplicateReaction {
        post: Id<PostMarker>,
        author: Id<UserMarker>,
    },
    #[error("The username {0} is already taken.")]
    UsernameTaken(Username),
    #[error("User {0} already has a profile.")]
    ProfileExists(Id<UserMarker>),
    #[error("Could not claim a unique slug for {0:?}.")]
    SlugContention(String),
    #[error("Referenced {0} no longer exists.")]
    MissingReference(&'static str),
}

impl DbError {
    /// Errors caused by the request conflicting with stored state, as opposed
    /// to the store itself failing.
    #[must_use]
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DbError::DuplicateReaction { .. }
                | DbError::UsernameTaken(_)
                | DbError::ProfileExists(_)
                | DbError::SlugContention(_)
        )
    }
}

/// Profile store and content store behind one interface.
///
/// Methods returning `Option` or `bool` report a missing target that way;
/// uniqueness violations come back as the dedicated [`DbError`] variants and
/// are decided atomically by the store.
#[async_trait]
pub trait Store: Send + Sync {
    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>>;

    async fn fetch_principal(&self, user_id: Id<UserMarker>) -> Result<Option<Principal>>;

    async fn create_profile(
        &self,
        user_id: Id<UserMarker>,
        profile: &ProfileContent,
    ) -> Result<Profile>;

    async fn fetch_profile(&self, profile_id: Id<ProfileMarker>) -> Result<Option<Profile>>;

    async fn update_profile(
        &self,
        profile_id: Id<ProfileMarker>,
        profile: &ProfileContent,
    ) -> Result<Option<Profile>>;

    /// Also removes the profile's posts and every follow edge touching it.
    async fn delete_profile(&self, profile_id: Id<ProfileMarker>) -> Result<bool>;

    /// Ordered by username. `search` matches case-insensitive substrings.
    async fn list_profiles(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Listing<Profile>>;

    async fn fetch_following_ids(
        &self,
        profile_id: Id<ProfileMarker>,
    ) -> Result<Vec<Id<ProfileMarker>>>;

    /// Adds the edge `follower -> target`. Returns whether it was new.
    async fn follow(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool>;

    /// Profiles following `profile_id`, in the order the edges were created.
    async fn fetch_followers(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>>;

    /// Profiles followed by `profile_id`, in the order the edges were created.
    async fn fetch_following(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>>;

    async fn count_followers(&self, profile_id: Id<ProfileMarker>) -> Result<u64>;

    async fn is_following(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool>;

    /// Derives a slug unique across all posts from the title.
    async fn create_post(&self, author: PostAuthor, post: &PostContent) -> Result<Post>;

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>>;

    /// Posts within `scope`, optionally of one profile only, newest first.
    async fn list_posts(
        &self,
        scope: &PostScope,
        profile: Option<Id<ProfileMarker>>,
        pagination: Pagination,
    ) -> Result<Listing<Post>>;

    /// All posts of one profile, newest first.
    async fn fetch_profile_posts(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Post>>;

    /// Replaces title, content and media. The slug stays.
    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        post: &PostContent,
    ) -> Result<Option<Post>>;

    /// Also removes the post's comments and reactions.
    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool>;

    async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        comment: &CommentContent,
    ) -> Result<Comment>;

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>>;

    /// Comments of one post, oldest first.
    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>>;

    /// Comments on posts within `scope`, oldest first.
    async fn list_comments(
        &self,
        scope: &PostScope,
        pagination: Pagination,
    ) -> Result<Listing<Comment>>;

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        comment: &CommentContent,
    ) -> Result<Option<Comment>>;

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool>;

    /// Fails with [`DbError::DuplicateReaction`] if `author` already reacted,
    /// whatever the earlier status was.
    async fn create_reaction(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        status: ReactionStatus,
    ) -> Result<PostLike>;

    /// Reactions of `author`, oldest first, optionally of one status only.
    async fn list_reactions(
        &self,
        author: Id<UserMarker>,
        status: Option<ReactionStatus>,
    ) -> Result<Vec<ReactedPost>>;
}

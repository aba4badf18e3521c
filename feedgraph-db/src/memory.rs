//! In-process [`Store`] used by the router tests.
//!
//! Holds everything in insertion-ordered vectors behind one lock and mirrors
//! the constraints and cascades of the Postgres schema.

use crate::store::{DbError, Result, Store};
use async_trait::async_trait;
use feedgraph_common::{
    model::{
        Id,
        auth::{AuthToken, AuthTokenHash, AuthTokenHashError, Authentication},
        comment::{Comment, CommentContent, CommentMarker},
        page::{Listing, Pagination},
        post::{Post, PostAuthor, PostContent, PostMarker},
        profile::{Profile, ProfileContent, ProfileMarker},
        reaction::{PostLike, ReactedPost, ReactionCounts, ReactionStatus},
        user::{Principal, User, UserMarker},
    },
    policy::{PostScope, sort_feed},
    slug::{slugify, unique_slug},
    snowflake::SnowflakeGenerator,
};
use parking_lot::Mutex;
use time::{Duration, UtcDateTime};

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

#[derive(Debug, Default)]
struct State {
    snowflake_generator: SnowflakeGenerator,
    last_time: Option<UtcDateTime>,
    users: Vec<User>,
    authentications: Vec<Authentication>,
    profiles: Vec<Profile>,
    follows: Vec<(Id<ProfileMarker>, Id<ProfileMarker>)>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    likes: Vec<PostLike>,
}

impl State {
    fn next_id<Marker>(&mut self) -> Id<Marker> {
        self.snowflake_generator.generate().into()
    }

    /// Strictly increasing, so creation order and timestamp order agree.
    fn now(&mut self) -> UtcDateTime {
        let now = UtcDateTime::now();
        let now = match self.last_time {
            Some(last) if now <= last => last + Duration::nanoseconds(1),
            _ => now,
        };
        self.last_time = Some(now);
        now
    }

    fn profile(&self, profile_id: Id<ProfileMarker>) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.id == profile_id)
    }

    fn profile_of_user(&self, user_id: Id<UserMarker>) -> Option<&Profile> {
        self.profiles.iter().find(|profile| profile.user == user_id)
    }

    fn check_username(
        &self,
        profile: &ProfileContent,
        except: Option<Id<ProfileMarker>>,
    ) -> Result<()> {
        let taken = self
            .profiles
            .iter()
            .any(|other| other.username == profile.username && Some(other.id) != except);
        if taken {
            return Err(DbError::UsernameTaken(profile.username.clone()));
        }
        Ok(())
    }

    /// Fills in the fields that are derived from other tables.
    fn hydrate_post(&self, post: &Post) -> Post {
        let mut post = post.clone();
        if let Some(profile) = self.profile(post.profile) {
            post.username = profile.username.clone();
        }
        post.reactions = ReactionCounts::default();
        for like in self.likes.iter().filter(|like| like.post == post.id) {
            post.reactions.record(like.status);
        }
        post
    }

    fn hydrate_comment(&self, comment: &Comment) -> Comment {
        let mut comment = comment.clone();
        comment.owner = self
            .profile_of_user(comment.author)
            .map(|profile| profile.username.clone());
        comment
    }

    /// Newest first, ties in insertion order.
    fn posts_where(&self, mut filter: impl FnMut(&Post) -> bool) -> Vec<Post> {
        let mut posts: Vec<Post> = self
            .posts
            .iter()
            .filter(|post| filter(post))
            .map(|post| self.hydrate_post(post))
            .collect();
        sort_feed(&mut posts);
        posts
    }

    /// Oldest first, ties by id.
    fn comments_where(&self, mut filter: impl FnMut(&Comment) -> bool) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .iter()
            .filter(|comment| filter(comment))
            .map(|comment| self.hydrate_comment(comment))
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        comments
    }

    fn remove_post(&mut self, post_id: Id<PostMarker>) -> bool {
        let before = self.posts.len();
        self.posts.retain(|post| post.id != post_id);
        self.comments.retain(|comment| comment.post != post_id);
        self.likes.retain(|like| like.post != post_id);
        self.posts.len() != before
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account the way the identity provider would.
    pub fn create_user(&self, is_staff: bool) -> User {
        let mut state = self.state.lock();
        let user = User {
            id: state.next_id(),
            is_staff,
        };
        state.users.push(user);
        user
    }

    pub fn insert_authentication(&self, authentication: Authentication) {
        self.state.lock().authentications.push(authentication);
    }

    /// Issues a non-expiring token for `user_id` and stores its hash.
    pub fn issue_token(&self, user_id: Id<UserMarker>) -> Result<AuthToken, AuthTokenHashError> {
        let token = AuthToken::generate_random(user_id);
        let token_hash = token.hash()?;

        let mut state = self.state.lock();
        let created_at = state.now();
        state.authentications.push(Authentication {
            user: user_id,
            token_hash,
            created_at,
            expires_after: None,
        });

        Ok(token)
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let state = self.state.lock();
        Ok(state
            .authentications
            .iter()
            .find(|authentication| authentication.token_hash == *token_hash)
            .cloned())
    }

    async fn fetch_principal(&self, user_id: Id<UserMarker>) -> Result<Option<Principal>> {
        let state = self.state.lock();
        let Some(user) = state.users.iter().find(|user| user.id == user_id) else {
            return Ok(None);
        };

        Ok(Some(Principal {
            user: *user,
            profile: state.profile_of_user(user_id).map(|profile| profile.id),
        }))
    }

    async fn create_profile(
        &self,
        user_id: Id<UserMarker>,
        profile: &ProfileContent,
    ) -> Result<Profile> {
        let mut state = self.state.lock();
        if !state.users.iter().any(|user| user.id == user_id) {
            return Err(DbError::MissingReference("user"));
        }
        if state.profile_of_user(user_id).is_some() {
            return Err(DbError::ProfileExists(user_id));
        }
        state.check_username(profile, None)?;

        let profile = Profile {
            id: state.next_id(),
            user: user_id,
            username: profile.username.clone(),
            avatar: profile.avatar.clone(),
            city: profile.city.clone(),
            birth_date: profile.birth_date.clone(),
        };
        state.profiles.push(profile.clone());

        Ok(profile)
    }

    async fn fetch_profile(&self, profile_id: Id<ProfileMarker>) -> Result<Option<Profile>> {
        Ok(self.state.lock().profile(profile_id).cloned())
    }

    async fn update_profile(
        &self,
        profile_id: Id<ProfileMarker>,
        profile: &ProfileContent,
    ) -> Result<Option<Profile>> {
        let mut state = self.state.lock();
        if state.profile(profile_id).is_none() {
            return Ok(None);
        }
        state.check_username(profile, Some(profile_id))?;

        let Some(stored) = state.profiles.iter_mut().find(|p| p.id == profile_id) else {
            return Ok(None);
        };
        stored.username = profile.username.clone();
        stored.avatar = profile.avatar.clone();
        stored.city = profile.city.clone();
        stored.birth_date = profile.birth_date.clone();

        Ok(Some(stored.clone()))
    }

    async fn delete_profile(&self, profile_id: Id<ProfileMarker>) -> Result<bool> {
        let mut state = self.state.lock();
        if state.profile(profile_id).is_none() {
            return Ok(false);
        }

        let post_ids: Vec<Id<PostMarker>> = state
            .posts
            .iter()
            .filter(|post| post.profile == profile_id)
            .map(|post| post.id)
            .collect();
        for post_id in post_ids {
            state.remove_post(post_id);
        }
        state
            .follows
            .retain(|&(follower, target)| follower != profile_id && target != profile_id);
        state.profiles.retain(|profile| profile.id != profile_id);

        Ok(true)
    }

    async fn list_profiles(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Listing<Profile>> {
        let state = self.state.lock();
        let needle = search.map(str::to_lowercase);

        let mut profiles: Vec<Profile> = state
            .profiles
            .iter()
            .filter(|profile| {
                needle.as_ref().is_none_or(|needle| {
                    profile.username.get().to_lowercase().contains(needle.as_str())
                })
            })
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));

        Ok(Listing::paginate(profiles, pagination))
    }

    async fn fetch_following_ids(
        &self,
        profile_id: Id<ProfileMarker>,
    ) -> Result<Vec<Id<ProfileMarker>>> {
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == profile_id)
            .map(|&(_, target)| target)
            .collect())
    }

    async fn follow(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool> {
        let mut state = self.state.lock();
        if state.profile(follower).is_none() || state.profile(target).is_none() {
            return Err(DbError::MissingReference("profile"));
        }
        if state.follows.contains(&(follower, target)) {
            return Ok(false);
        }

        state.follows.push((follower, target));
        Ok(true)
    }

    async fn fetch_followers(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>> {
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(_, target)| *target == profile_id)
            .filter_map(|&(follower, _)| state.profile(follower).cloned())
            .collect())
    }

    async fn fetch_following(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>> {
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == profile_id)
            .filter_map(|&(_, target)| state.profile(target).cloned())
            .collect())
    }

    async fn count_followers(&self, profile_id: Id<ProfileMarker>) -> Result<u64> {
        let state = self.state.lock();
        Ok(state
            .follows
            .iter()
            .filter(|(_, target)| *target == profile_id)
            .count() as u64)
    }

    async fn is_following(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool> {
        Ok(self.state.lock().follows.contains(&(follower, target)))
    }

    async fn create_post(&self, author: PostAuthor, post: &PostContent) -> Result<Post> {
        let mut state = self.state.lock();
        let Some(profile) = state.profile(author.profile) else {
            return Err(DbError::MissingReference("profile"));
        };
        let username = profile.username.clone();

        let slug = unique_slug(
            &slugify(post.title.get()),
            state.posts.iter().map(|post| post.slug.get()),
        );
        let post = Post {
            id: state.next_id(),
            profile: author.profile,
            username,
            owner: author.user,
            title: post.title.clone(),
            slug,
            content: post.content.clone(),
            image: post.image.clone(),
            video: post.video.clone(),
            reactions: ReactionCounts::default(),
            created_at: state.now(),
        };
        state.posts.push(post.clone());

        Ok(post)
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let state = self.state.lock();
        Ok(state
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| state.hydrate_post(post)))
    }

    async fn list_posts(
        &self,
        scope: &PostScope,
        profile: Option<Id<ProfileMarker>>,
        pagination: Pagination,
    ) -> Result<Listing<Post>> {
        let state = self.state.lock();
        let posts = state.posts_where(|post| {
            scope.contains(post.profile) && profile.is_none_or(|profile| post.profile == profile)
        });

        Ok(Listing::paginate(posts, pagination))
    }

    async fn fetch_profile_posts(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Post>> {
        let state = self.state.lock();
        Ok(state.posts_where(|post| post.profile == profile_id))
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        post: &PostContent,
    ) -> Result<Option<Post>> {
        let mut state = self.state.lock();
        let Some(stored) = state.posts.iter_mut().find(|stored| stored.id == post_id) else {
            return Ok(None);
        };
        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.image = post.image.clone();
        stored.video = post.video.clone();
        let stored = stored.clone();

        Ok(Some(state.hydrate_post(&stored)))
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        Ok(self.state.lock().remove_post(post_id))
    }

    async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        comment: &CommentContent,
    ) -> Result<Comment> {
        let mut state = self.state.lock();
        if !state.posts.iter().any(|post| post.id == post_id) {
            return Err(DbError::MissingReference("post"));
        }

        let comment = Comment {
            id: state.next_id(),
            post: post_id,
            author,
            owner: None,
            content: comment.content.clone(),
            created_at: state.now(),
        };
        state.comments.push(comment.clone());

        Ok(state.hydrate_comment(&comment))
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let state = self.state.lock();
        Ok(state
            .comments
            .iter()
            .find(|comment| comment.id == comment_id)
            .map(|comment| state.hydrate_comment(comment)))
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let state = self.state.lock();
        Ok(state.comments_where(|comment| comment.post == post_id))
    }

    async fn list_comments(
        &self,
        scope: &PostScope,
        pagination: Pagination,
    ) -> Result<Listing<Comment>> {
        let state = self.state.lock();
        let comments = state.comments_where(|comment| {
            state
                .posts
                .iter()
                .find(|post| post.id == comment.post)
                .is_some_and(|post| scope.contains(post.profile))
        });

        Ok(Listing::paginate(comments, pagination))
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        comment: &CommentContent,
    ) -> Result<Option<Comment>> {
        let mut state = self.state.lock();
        let Some(stored) = state
            .comments
            .iter_mut()
            .find(|stored| stored.id == comment_id)
        else {
            return Ok(None);
        };
        stored.content = comment.content.clone();
        let stored = stored.clone();

        Ok(Some(state.hydrate_comment(&stored)))
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.comments.len();
        state.comments.retain(|comment| comment.id != comment_id);
        Ok(state.comments.len() != before)
    }

    async fn create_reaction(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        status: ReactionStatus,
    ) -> Result<PostLike> {
        let mut state = self.state.lock();
        if !state.posts.iter().any(|post| post.id == post_id) {
            return Err(DbError::MissingReference("post"));
        }
        if state
            .likes
            .iter()
            .any(|like| like.post == post_id && like.author == author)
        {
            return Err(DbError::DuplicateReaction {
                post: post_id,
                author,
            });
        }

        let like = PostLike {
            id: state.next_id(),
            post: post_id,
            author,
            status,
            created_at: state.now(),
        };
        state.likes.push(like.clone());

        Ok(like)
    }

    async fn list_reactions(
        &self,
        author: Id<UserMarker>,
        status: Option<ReactionStatus>,
    ) -> Result<Vec<ReactedPost>> {
        let state = self.state.lock();
        Ok(state
            .likes
            .iter()
            .filter(|like| like.author == author)
            .filter(|like| status.is_none_or(|status| like.status == status))
            .filter_map(|like| {
                let post = state.posts.iter().find(|post| post.id == like.post)?;
                Some(ReactedPost {
                    post: post.id,
                    owner: post.owner,
                    title: post.title.clone(),
                    status: like.status,
                })
            })
            .collect())
    }
}

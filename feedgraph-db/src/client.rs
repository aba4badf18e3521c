use crate::{
    record::{
        AuthenticationRecord, CommentRecord, PostLikeRecord, PostRecord, PrincipalRecord,
        ProfileRecord, ReactedPostRecord, to_db_time,
    },
    store::{DbError, Result, SLUG_INSERT_ATTEMPTS, Store},
};
use async_trait::async_trait;
use feedgraph_common::{
    model::{
        Id, ModelValidationError,
        auth::{AuthTokenHash, Authentication},
        comment::{Comment, CommentContent, CommentMarker},
        page::{Listing, Pagination},
        post::{Post, PostAuthor, PostContent, PostMarker},
        profile::{Profile, ProfileContent, ProfileMarker},
        reaction::{PostLike, ReactedPost, ReactionMarker, ReactionStatus},
        user::{Principal, UserMarker},
    },
    policy::PostScope,
    slug::{slugify, unique_slug},
    snowflake::{ProcessId, SnowflakeGenerator, WorkerId},
};
use parking_lot::Mutex;
use sqlx::{PgPool, postgres::PgPoolOptions, query, query_as, query_scalar};
use time::UtcDateTime;
use tracing::{debug, instrument};

/// Every post query selects the same columns, with reaction counts inlined.
macro_rules! select_posts {
    ($($tail:literal)?) => {
        concat!(
            "
            SELECT
                posts.post_snowflake,
                posts.profile_snowflake,
                profiles.username,
                posts.user_snowflake,
                posts.title,
                posts.slug,
                posts.content,
                posts.image,
                posts.video,
                posts.created_at,
                (
                    SELECT COUNT(*) FROM social.post_likes
                    WHERE post_likes.post_snowflake = posts.post_snowflake
                        AND post_likes.status = 'LIKE'
                ) AS likes_count,
                (
                    SELECT COUNT(*) FROM social.post_likes
                    WHERE post_likes.post_snowflake = posts.post_snowflake
                        AND post_likes.status = 'UNLIKE'
                ) AS unlikes_count
            FROM
                social.posts
                JOIN social.profiles ON profiles.profile_snowflake = posts.profile_snowflake
            ",
            $($tail)?
        )
    };
}

macro_rules! select_comments {
    ($($tail:literal)?) => {
        concat!(
            "
            SELECT
                comments.comment_snowflake,
                comments.post_snowflake,
                comments.user_snowflake,
                profiles.username,
                comments.content,
                comments.created_at
            FROM
                social.comments
                LEFT JOIN social.profiles ON profiles.user_snowflake = comments.user_snowflake
            ",
            $($tail)?
        )
    };
}

const PROFILE_COLUMNS: &str = "
    profiles.profile_snowflake,
    profiles.user_snowflake,
    profiles.username,
    profiles.avatar,
    profiles.city,
    profiles.birth_date
";

/// `($1 OR posts.profile_snowflake = ANY($2))` parameters for a scope.
fn scope_params(scope: &PostScope) -> (bool, Vec<i64>) {
    match scope {
        PostScope::All => (true, Vec::new()),
        PostScope::Profiles(profiles) => (false, profiles.iter().map(|id| id.to_db()).collect()),
    }
}

fn page_params(pagination: Pagination) -> (i64, i64) {
    (
        i64::try_from(pagination.limit()).unwrap_or(i64::MAX),
        i64::try_from(pagination.offset()).unwrap_or(i64::MAX),
    )
}

fn total(count: i64) -> Result<u64> {
    u64::try_from(count)
        .map_err(|_| ModelValidationError::NegativeCount(count).into())
}

/// Name of the violated constraint, for unique and foreign key violations.
fn violated_constraint(err: &sqlx::Error) -> Option<(ViolationKind, String)> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    let kind = if db_err.is_unique_violation() {
        ViolationKind::Unique
    } else if db_err.is_foreign_key_violation() {
        ViolationKind::ForeignKey
    } else {
        return None;
    };

    Some((kind, db_err.constraint().unwrap_or_default().to_owned()))
}

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum ViolationKind {
    Unique,
    ForeignKey,
}

fn missing_reference(err: sqlx::Error, what: &'static str) -> DbError {
    match violated_constraint(&err) {
        Some((ViolationKind::ForeignKey, _)) => DbError::MissingReference(what),
        _ => err.into(),
    }
}

/// Postgres-backed store.
pub struct DbClient {
    pool: PgPool,
    snowflake_generator: Mutex<SnowflakeGenerator>,
}

impl DbClient {
    #[must_use]
    pub fn new(pool: PgPool, worker_id: WorkerId, process_id: ProcessId) -> Self {
        let snowflake_generator =
            Mutex::new(SnowflakeGenerator::new(worker_id, process_id));

        Self {
            pool,
            snowflake_generator,
        }
    }

    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        worker_id: WorkerId,
        process_id: ProcessId,
    ) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self::new(pool, worker_id, process_id))
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    fn next_id<Marker>(&self) -> Id<Marker> {
        self.snowflake_generator.lock().generate().into()
    }
}

#[async_trait]
impl Store for DbClient {
    async fn fetch_auth(&self, token_hash: &AuthTokenHash) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                auth_tokens.user_snowflake,
                auth_tokens.token_hash,
                auth_tokens.created_at,
                auth_tokens.expires_after_seconds
            FROM
                users.auth_tokens
            WHERE
                auth_tokens.token_hash = $1
            ",
        )
        .bind(&token_hash.0[..])
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    async fn fetch_principal(&self, user_id: Id<UserMarker>) -> Result<Option<Principal>> {
        let record = query_as::<_, PrincipalRecord>(
            "
            SELECT
                users.user_snowflake,
                users.is_staff,
                profiles.profile_snowflake
            FROM
                users.users
                LEFT JOIN social.profiles ON profiles.user_snowflake = users.user_snowflake
            WHERE
                users.user_snowflake = $1
            ",
        )
        .bind(user_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(Principal::from))
    }

    #[instrument(level = "debug", skip(self, profile), fields(username = %profile.username))]
    async fn create_profile(
        &self,
        user_id: Id<UserMarker>,
        profile: &ProfileContent,
    ) -> Result<Profile> {
        let profile_id = self.next_id::<ProfileMarker>();

        let record = query_as::<_, ProfileRecord>(&format!(
            "
            INSERT INTO social.profiles
                (profile_snowflake, user_snowflake, username, avatar, city, birth_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(profile_id.to_db())
        .bind(user_id.to_db())
        .bind(profile.username.get())
        .bind(profile.avatar.as_ref().map(|avatar| avatar.get()))
        .bind(profile.city.as_ref().map(|city| city.get()))
        .bind(profile.birth_date.as_ref().map(|birth_date| birth_date.get()))
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match violated_constraint(&err) {
            Some((ViolationKind::Unique, constraint)) if constraint == "profiles_user_key" => {
                DbError::ProfileExists(user_id)
            }
            Some((ViolationKind::Unique, _)) => DbError::UsernameTaken(profile.username.clone()),
            Some((ViolationKind::ForeignKey, _)) => DbError::MissingReference("user"),
            None => err.into(),
        })?;

        Ok(record.try_into()?)
    }

    async fn fetch_profile(&self, profile_id: Id<ProfileMarker>) -> Result<Option<Profile>> {
        let record = query_as::<_, ProfileRecord>(&format!(
            "
            SELECT {PROFILE_COLUMNS}
            FROM social.profiles
            WHERE profiles.profile_snowflake = $1
            "
        ))
        .bind(profile_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let profile = record.map(Profile::try_from).transpose()?;
        Ok(profile)
    }

    async fn update_profile(
        &self,
        profile_id: Id<ProfileMarker>,
        profile: &ProfileContent,
    ) -> Result<Option<Profile>> {
        let record = query_as::<_, ProfileRecord>(&format!(
            "
            UPDATE social.profiles
            SET username = $2, avatar = $3, city = $4, birth_date = $5
            WHERE profiles.profile_snowflake = $1
            RETURNING {PROFILE_COLUMNS}
            "
        ))
        .bind(profile_id.to_db())
        .bind(profile.username.get())
        .bind(profile.avatar.as_ref().map(|avatar| avatar.get()))
        .bind(profile.city.as_ref().map(|city| city.get()))
        .bind(profile.birth_date.as_ref().map(|birth_date| birth_date.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| match violated_constraint(&err) {
            Some((ViolationKind::Unique, _)) => DbError::UsernameTaken(profile.username.clone()),
            _ => err.into(),
        })?;

        let profile = record.map(Profile::try_from).transpose()?;
        Ok(profile)
    }

    async fn delete_profile(&self, profile_id: Id<ProfileMarker>) -> Result<bool> {
        let result = query("DELETE FROM social.profiles WHERE profile_snowflake = $1")
            .bind(profile_id.to_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_profiles(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Listing<Profile>> {
        let (limit, offset) = page_params(pagination);

        let records = query_as::<_, ProfileRecord>(&format!(
            "
            SELECT {PROFILE_COLUMNS}
            FROM social.profiles
            WHERE $1::TEXT IS NULL OR strpos(lower(profiles.username), lower($1)) > 0
            ORDER BY profiles.username, profiles.profile_snowflake
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(search)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = query_scalar(
            "
            SELECT COUNT(*)
            FROM social.profiles
            WHERE $1::TEXT IS NULL OR strpos(lower(profiles.username), lower($1)) > 0
            ",
        )
        .bind(search)
        .fetch_one(&self.pool)
        .await?;

        let items = records
            .into_iter()
            .map(Profile::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Listing {
            total: total(count)?,
            items,
        })
    }

    async fn fetch_following_ids(
        &self,
        profile_id: Id<ProfileMarker>,
    ) -> Result<Vec<Id<ProfileMarker>>> {
        let snowflakes: Vec<i64> = query_scalar(
            "
            SELECT follows.target_snowflake
            FROM social.follows
            WHERE follows.follower_snowflake = $1
            ORDER BY follows.edge_sequence
            ",
        )
        .bind(profile_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        Ok(snowflakes.into_iter().map(Id::from_db).collect())
    }

    #[instrument(level = "debug", skip(self))]
    async fn follow(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool> {
        let result = query(
            "
            INSERT INTO social.follows (follower_snowflake, target_snowflake, followed_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (follower_snowflake, target_snowflake) DO NOTHING
            ",
        )
        .bind(follower.to_db())
        .bind(target.to_db())
        .bind(to_db_time(UtcDateTime::now()))
        .execute(&self.pool)
        .await
        .map_err(|err| missing_reference(err, "profile"))?;

        let created = result.rows_affected() > 0;
        debug!(created, "Follow edge stored");
        Ok(created)
    }

    async fn fetch_followers(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>> {
        let records = query_as::<_, ProfileRecord>(&format!(
            "
            SELECT {PROFILE_COLUMNS}
            FROM
                social.follows
                JOIN social.profiles ON profiles.profile_snowflake = follows.follower_snowflake
            WHERE follows.target_snowflake = $1
            ORDER BY follows.edge_sequence
            "
        ))
        .bind(profile_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let profiles = records
            .into_iter()
            .map(Profile::try_from)
            .collect::<Result<_, _>>()?;
        Ok(profiles)
    }

    async fn fetch_following(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Profile>> {
        let records = query_as::<_, ProfileRecord>(&format!(
            "
            SELECT {PROFILE_COLUMNS}
            FROM
                social.follows
                JOIN social.profiles ON profiles.profile_snowflake = follows.target_snowflake
            WHERE follows.follower_snowflake = $1
            ORDER BY follows.edge_sequence
            "
        ))
        .bind(profile_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let profiles = records
            .into_iter()
            .map(Profile::try_from)
            .collect::<Result<_, _>>()?;
        Ok(profiles)
    }

    async fn count_followers(&self, profile_id: Id<ProfileMarker>) -> Result<u64> {
        let count: i64 =
            query_scalar("SELECT COUNT(*) FROM social.follows WHERE target_snowflake = $1")
                .bind(profile_id.to_db())
                .fetch_one(&self.pool)
                .await?;

        total(count)
    }

    async fn is_following(
        &self,
        follower: Id<ProfileMarker>,
        target: Id<ProfileMarker>,
    ) -> Result<bool> {
        let exists: bool = query_scalar(
            "
            SELECT EXISTS(
                SELECT 1 FROM social.follows
                WHERE follower_snowflake = $1 AND target_snowflake = $2
            )
            ",
        )
        .bind(follower.to_db())
        .bind(target.to_db())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(level = "debug", skip(self, post), fields(title = %post.title))]
    async fn create_post(&self, author: PostAuthor, post: &PostContent) -> Result<Post> {
        let base = slugify(post.title.get());

        for attempt in 1..=SLUG_INSERT_ATTEMPTS {
            let taken: Vec<String> = query_scalar(
                "
                SELECT posts.slug
                FROM social.posts
                WHERE posts.slug ~ ('^' || $1 || '(-[0-9]+)?$')
                ",
            )
            .bind(&base)
            .fetch_all(&self.pool)
            .await?;
            let slug = unique_slug(&base, taken.iter().map(String::as_str));
            let post_id = self.next_id::<PostMarker>();

            let inserted: Option<i64> = query_scalar(
                "
                INSERT INTO social.posts (
                    post_snowflake, profile_snowflake, user_snowflake,
                    title, slug, content, image, video, created_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (slug) DO NOTHING
                RETURNING posts.post_snowflake
                ",
            )
            .bind(post_id.to_db())
            .bind(author.profile.to_db())
            .bind(author.user.to_db())
            .bind(post.title.get())
            .bind(slug.get())
            .bind(post.content.get())
            .bind(post.image.as_ref().map(|image| image.get()))
            .bind(post.video.as_ref().map(|video| video.get()))
            .bind(to_db_time(UtcDateTime::now()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| missing_reference(err, "profile"))?;

            if inserted.is_some() {
                return self
                    .fetch_post(post_id)
                    .await?
                    .ok_or(DbError::MissingReference("post"));
            }

            debug!(%slug, attempt, "Slug was claimed concurrently, retrying");
        }

        Err(DbError::SlugContention(base))
    }

    async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let record = query_as::<_, PostRecord>(select_posts!(
            "WHERE posts.post_snowflake = $1"
        ))
        .bind(post_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    async fn list_posts(
        &self,
        scope: &PostScope,
        profile: Option<Id<ProfileMarker>>,
        pagination: Pagination,
    ) -> Result<Listing<Post>> {
        let (all, profiles) = scope_params(scope);
        let profile = profile.map(Id::to_db);
        let (limit, offset) = page_params(pagination);

        let records = query_as::<_, PostRecord>(select_posts!(
            "
            WHERE
                ($1 OR posts.profile_snowflake = ANY($2))
                AND ($3::BIGINT IS NULL OR posts.profile_snowflake = $3)
            ORDER BY posts.created_at DESC, posts.post_snowflake
            LIMIT $4 OFFSET $5
            "
        ))
        .bind(all)
        .bind(&profiles)
        .bind(profile)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = query_scalar(
            "
            SELECT COUNT(*)
            FROM social.posts
            WHERE
                ($1 OR posts.profile_snowflake = ANY($2))
                AND ($3::BIGINT IS NULL OR posts.profile_snowflake = $3)
            ",
        )
        .bind(all)
        .bind(&profiles)
        .bind(profile)
        .fetch_one(&self.pool)
        .await?;

        let items = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Listing {
            total: total(count)?,
            items,
        })
    }

    async fn fetch_profile_posts(&self, profile_id: Id<ProfileMarker>) -> Result<Vec<Post>> {
        let records = query_as::<_, PostRecord>(select_posts!(
            "
            WHERE posts.profile_snowflake = $1
            ORDER BY posts.created_at DESC, posts.post_snowflake
            "
        ))
        .bind(profile_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<_, _>>()?;
        Ok(posts)
    }

    async fn update_post(
        &self,
        post_id: Id<PostMarker>,
        post: &PostContent,
    ) -> Result<Option<Post>> {
        let result = query(
            "
            UPDATE social.posts
            SET title = $2, content = $3, image = $4, video = $5
            WHERE post_snowflake = $1
            ",
        )
        .bind(post_id.to_db())
        .bind(post.title.get())
        .bind(post.content.get())
        .bind(post.image.as_ref().map(|image| image.get()))
        .bind(post.video.as_ref().map(|video| video.get()))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_post(post_id).await
    }

    async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query("DELETE FROM social.posts WHERE post_snowflake = $1")
            .bind(post_id.to_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        comment: &CommentContent,
    ) -> Result<Comment> {
        let comment_id = self.next_id::<CommentMarker>();

        query(
            "
            INSERT INTO social.comments
                (comment_snowflake, post_snowflake, user_snowflake, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(comment_id.to_db())
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(comment.content.get())
        .bind(to_db_time(UtcDateTime::now()))
        .execute(&self.pool)
        .await
        .map_err(|err| missing_reference(err, "post"))?;

        self.fetch_comment(comment_id)
            .await?
            .ok_or(DbError::MissingReference("comment"))
    }

    async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(select_comments!(
            "WHERE comments.comment_snowflake = $1"
        ))
        .bind(comment_id.to_db())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(select_comments!(
            "
            WHERE comments.post_snowflake = $1
            ORDER BY comments.created_at, comments.comment_snowflake
            "
        ))
        .bind(post_id.to_db())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    async fn list_comments(
        &self,
        scope: &PostScope,
        pagination: Pagination,
    ) -> Result<Listing<Comment>> {
        let (all, profiles) = scope_params(scope);
        let (limit, offset) = page_params(pagination);

        let records = query_as::<_, CommentRecord>(select_comments!(
            "
                JOIN social.posts ON posts.post_snowflake = comments.post_snowflake
            WHERE $1 OR posts.profile_snowflake = ANY($2)
            ORDER BY comments.created_at, comments.comment_snowflake
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(all)
        .bind(&profiles)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let count: i64 = query_scalar(
            "
            SELECT COUNT(*)
            FROM
                social.comments
                JOIN social.posts ON posts.post_snowflake = comments.post_snowflake
            WHERE $1 OR posts.profile_snowflake = ANY($2)
            ",
        )
        .bind(all)
        .bind(&profiles)
        .fetch_one(&self.pool)
        .await?;

        let items = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(Listing {
            total: total(count)?,
            items,
        })
    }

    async fn update_comment(
        &self,
        comment_id: Id<CommentMarker>,
        comment: &CommentContent,
    ) -> Result<Option<Comment>> {
        let result = query("UPDATE social.comments SET content = $2 WHERE comment_snowflake = $1")
            .bind(comment_id.to_db())
            .bind(comment.content.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_comment(comment_id).await
    }

    async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let result = query("DELETE FROM social.comments WHERE comment_snowflake = $1")
            .bind(comment_id.to_db())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(level = "debug", skip(self))]
    async fn create_reaction(
        &self,
        post_id: Id<PostMarker>,
        author: Id<UserMarker>,
        status: ReactionStatus,
    ) -> Result<PostLike> {
        let like_id = self.next_id::<ReactionMarker>();

        let record = query_as::<_, PostLikeRecord>(
            "
            INSERT INTO social.post_likes
                (like_snowflake, post_snowflake, user_snowflake, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_snowflake, post_snowflake) DO NOTHING
            RETURNING
                post_likes.like_snowflake,
                post_likes.post_snowflake,
                post_likes.user_snowflake,
                post_likes.status,
                post_likes.created_at
            ",
        )
        .bind(like_id.to_db())
        .bind(post_id.to_db())
        .bind(author.to_db())
        .bind(status.as_str())
        .bind(to_db_time(UtcDateTime::now()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| missing_reference(err, "post"))?
        .ok_or(DbError::DuplicateReaction {
            post: post_id,
            author,
        })?;

        Ok(record.try_into()?)
    }

    async fn list_reactions(
        &self,
        author: Id<UserMarker>,
        status: Option<ReactionStatus>,
    ) -> Result<Vec<ReactedPost>> {
        let records = query_as::<_, ReactedPostRecord>(
            "
            SELECT
                post_likes.post_snowflake,
                posts.user_snowflake,
                posts.title,
                post_likes.status
            FROM
                social.post_likes
                JOIN social.posts ON posts.post_snowflake = post_likes.post_snowflake
            WHERE
                post_likes.user_snowflake = $1
                AND ($2::TEXT IS NULL OR post_likes.status = $2)
            ORDER BY post_likes.created_at, post_likes.like_snowflake
            ",
        )
        .bind(author.to_db())
        .bind(status.map(ReactionStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        let reactions = records
            .into_iter()
            .map(ReactedPost::try_from)
            .collect::<Result<_, _>>()?;
        Ok(reactions)
    }
}

use feedgraph_common::{
    model::{
        Id, ModelValidationError,
        auth::Authentication,
        comment::Comment,
        post::Post,
        profile::Profile,
        reaction::{PostLike, ReactedPost, ReactionCounts},
        text::{Body, MediaRef, PostTitle, ProfileField, Username},
        user::{Principal, User},
    },
    slug::Slug,
};
use sqlx::FromRow;
use time::{Duration, PrimitiveDateTime, UtcDateTime};

pub(crate) fn to_db_time(value: UtcDateTime) -> PrimitiveDateTime {
    PrimitiveDateTime::new(value.date(), value.time())
}

fn optional<T, E>(
    value: Option<String>,
    f: impl FnOnce(String) -> Result<T, E>,
) -> Result<Option<T>, E> {
    value.map(f).transpose()
}

fn count(value: i64) -> Result<u64, ModelValidationError> {
    u64::try_from(value).map_err(|_| ModelValidationError::NegativeCount(value))
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PrincipalRecord {
    pub user_snowflake: i64,
    pub is_staff: bool,
    pub profile_snowflake: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct AuthenticationRecord {
    pub user_snowflake: i64,
    pub token_hash: Vec<u8>,
    pub created_at: PrimitiveDateTime,
    pub expires_after_seconds: Option<i64>,
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, FromRow)]
pub(crate) struct ProfileRecord {
    pub profile_snowflake: i64,
    pub user_snowflake: i64,
    pub username: String,
    pub avatar: Option<String>,
    pub city: Option<String>,
    pub birth_date: Option<String>,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostRecord {
    pub post_snowflake: i64,
    pub profile_snowflake: i64,
    pub username: String,
    pub user_snowflake: i64,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub image: Option<String>,
    pub video: Option<String>,
    pub created_at: PrimitiveDateTime,
    pub likes_count: i64,
    pub unlikes_count: i64,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct CommentRecord {
    pub comment_snowflake: i64,
    pub post_snowflake: i64,
    pub user_snowflake: i64,
    pub username: Option<String>,
    pub content: String,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct PostLikeRecord {
    pub like_snowflake: i64,
    pub post_snowflake: i64,
    pub user_snowflake: i64,
    pub status: String,
    pub created_at: PrimitiveDateTime,
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, FromRow)]
pub(crate) struct ReactedPostRecord {
    pub post_snowflake: i64,
    pub user_snowflake: i64,
    pub title: String,
    pub status: String,
}

impl From<PrincipalRecord> for Principal {
    fn from(value: PrincipalRecord) -> Self {
        Self {
            user: User {
                id: Id::from_db(value.user_snowflake),
                is_staff: value.is_staff,
            },
            profile: value.profile_snowflake.map(Id::from_db),
        }
    }
}

impl TryFrom<AuthenticationRecord> for Authentication {
    type Error = ModelValidationError;

    fn try_from(value: AuthenticationRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            user: Id::from_db(value.user_snowflake),
            token_hash: value.token_hash.into_boxed_slice().try_into()?,
            created_at: value.created_at.as_utc(),
            expires_after: value
                .expires_after_seconds
                .map(|seconds| Duration::seconds(seconds).try_into())
                .transpose()?,
        })
    }
}

impl TryFrom<ProfileRecord> for Profile {
    type Error = ModelValidationError;

    fn try_from(value: ProfileRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.profile_snowflake),
            user: Id::from_db(value.user_snowflake),
            username: Username::new(value.username)?,
            avatar: optional(value.avatar, MediaRef::new)?,
            city: optional(value.city, ProfileField::new)?,
            birth_date: optional(value.birth_date, ProfileField::new)?,
        })
    }
}

impl TryFrom<PostRecord> for Post {
    type Error = ModelValidationError;

    fn try_from(value: PostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.post_snowflake),
            profile: Id::from_db(value.profile_snowflake),
            username: Username::new(value.username)?,
            owner: Id::from_db(value.user_snowflake),
            title: PostTitle::new(value.title)?,
            slug: Slug::from_stored(value.slug),
            content: Body::new(value.content)?,
            image: optional(value.image, MediaRef::new)?,
            video: optional(value.video, MediaRef::new)?,
            reactions: ReactionCounts {
                likes_count: count(value.likes_count)?,
                unlikes_count: count(value.unlikes_count)?,
            },
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<CommentRecord> for Comment {
    type Error = ModelValidationError;

    fn try_from(value: CommentRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.comment_snowflake),
            post: Id::from_db(value.post_snowflake),
            author: Id::from_db(value.user_snowflake),
            owner: optional(value.username, Username::new)?,
            content: Body::new(value.content)?,
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<PostLikeRecord> for PostLike {
    type Error = ModelValidationError;

    fn try_from(value: PostLikeRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Id::from_db(value.like_snowflake),
            post: Id::from_db(value.post_snowflake),
            author: Id::from_db(value.user_snowflake),
            status: value.status.parse()?,
            created_at: value.created_at.as_utc(),
        })
    }
}

impl TryFrom<ReactedPostRecord> for ReactedPost {
    type Error = ModelValidationError;

    fn try_from(value: ReactedPostRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            post: Id::from_db(value.post_snowflake),
            owner: Id::from_db(value.user_snowflake),
            title: PostTitle::new(value.title)?,
            status: value.status.parse()?,
        })
    }
}

use crate::model::{Id, profile::ProfileMarker};
use serde::Serialize;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct UserMarker;

/// An authenticated account as supplied by the identity provider.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct User {
    pub id: Id<UserMarker>,
    pub is_staff: bool,
}

/// A user together with its social identity, if it created one.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Hash, Serialize)]
pub struct Principal {
    pub user: User,
    pub profile: Option<Id<ProfileMarker>>,
}

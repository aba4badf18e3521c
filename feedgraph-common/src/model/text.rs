//! Validated text fields.
//!
//! Every user-supplied string that ends up in a length-limited column goes
//! through one of these newtypes, both when deserialising requests and when
//! reading rows back.

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use thiserror::Error;

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Hash, Error)]
pub enum InvalidTextError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },
    #[error("{field} is longer than {max} characters")]
    TooLong { field: &'static str, max: usize },
}

macro_rules! bounded_text {
    ($(#[$attr:meta])* $name:ident: $field:literal, max = $max:expr, blank = $blank:literal) => {
        $(#[$attr])*
        #[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub const MAX_LEN: usize = $max;

            /// Trims surrounding whitespace, then checks the limits.
            pub fn new(value: String) -> Result<Self, InvalidTextError> {
                let value = match value.trim() {
                    trimmed if trimmed.len() == value.len() => value,
                    trimmed => trimmed.to_owned(),
                };
                if !$blank && value.is_empty() {
                    return Err(InvalidTextError::Blank { field: $field });
                }
                if value.chars().count() > Self::MAX_LEN {
                    return Err(InvalidTextError::TooLong {
                        field: $field,
                        max: Self::MAX_LEN,
                    });
                }

                Ok(Self(value))
            }

            #[must_use]
            pub fn get(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let inner = String::deserialize(deserializer)?;
                Self::new(inner.clone())
                    .map_err(|_| Error::invalid_value(Unexpected::Str(&inner), &stringify!($name)))
            }
        }
    };
}

bounded_text!(
    /// Unique display name of a profile.
    Username: "username", max = 63, blank = false
);
bounded_text!(
    /// Free-form short profile detail, such as the city or birth date.
    ProfileField: "profile field", max = 63, blank = true
);
bounded_text!(PostTitle: "title", max = 255, blank = false);
bounded_text!(Body: "content", max = 65_535, blank = false);
bounded_text!(
    /// Opaque reference handed out by the media store.
    MediaRef: "media reference", max = 1024, blank = false
);

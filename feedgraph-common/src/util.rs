use thiserror::Error;
use time::Duration;

#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug, Default, Hash)]
pub struct PositiveDuration(Duration);

impl PositiveDuration {
    #[must_use]
    pub fn new(duration: Duration) -> Option<Self> {
        duration.is_positive().then_some(Self(duration))
    }

    #[must_use]
    pub fn new_unchecked(duration: Duration) -> Self {
        Self::new(duration).expect("Duration was not positive.")
    }

    #[must_use]
    pub fn get(&self) -> Duration {
        self.0
    }
}

#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Error)]
#[error("The duration is not positive: {0}")]
pub struct NonPositiveDurationError(Duration);

impl TryFrom<Duration> for PositiveDuration {
    type Error = NonPositiveDurationError;

    fn try_from(value: Duration) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(NonPositiveDurationError(value))
    }
}

/// Wire format of every timestamp in responses: `YYYY-MM-DDTHH:MM:SS`, UTC.
pub mod timestamp {
    use serde::{Serializer, ser::Error};
    use time::{UtcDateTime, format_description::BorrowedFormatItem, macros::format_description};

    pub const FORMAT: &[BorrowedFormatItem<'static>] =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

    pub fn serialize<S>(value: &UtcDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let formatted = value.format(FORMAT).map_err(S::Error::custom)?;
        serializer.serialize_str(&formatted)
    }
}

#[cfg(test)]
mod tests {
    use super::{PositiveDuration, timestamp};
    use time::{Duration, macros::utc_datetime};

    #[test]
    fn positive_duration() {
        assert!(PositiveDuration::new(Duration::seconds(1)).is_some());
        assert!(PositiveDuration::new(Duration::ZERO).is_none());
        assert!(PositiveDuration::try_from(Duration::seconds(-5)).is_err());
    }

    #[test]
    fn timestamp_format() {
        let value = utc_datetime!(2023-06-13 13:50:07.25);
        let mut out = Vec::new();
        let mut serializer = serde_json::Serializer::new(&mut out);
        timestamp::serialize(&value, &mut serializer).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "\"2023-06-13T13:50:07\"");
    }
}

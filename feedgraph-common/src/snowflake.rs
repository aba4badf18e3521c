//! Snowflake ids for every stored entity.
//!
//! Layout, most significant bit first: 42 bits of milliseconds since
//! [`EPOCH`], 5 bits worker id, 5 bits process id, 12 bits sequence. Ids from
//! one generator sort by creation time, with the sequence ordering ids created
//! within the same millisecond.
//!
//! See <https://discord.com/developers/docs/reference#snowflakes>

use serde::{
    Deserialize, Deserializer, Serialize,
    de::{Error, Unexpected},
};
use std::fmt::{Display, Formatter};
use time::{Duration, UtcDateTime, macros::utc_datetime};

pub const EPOCH: UtcDateTime = utc_datetime!(2025-01-01 00:00);

const TIMESTAMP_BITS: u32 = 42;
const NODE_BITS: u32 = 5;
const SEQUENCE_BITS: u32 = 12;

const PROCESS_ID_OFFSET: u32 = SEQUENCE_BITS;
const WORKER_ID_OFFSET: u32 = PROCESS_ID_OFFSET + NODE_BITS;
const TIMESTAMP_OFFSET: u32 = WORKER_ID_OFFSET + NODE_BITS;

const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;
const NODE_MASK: u64 = (1 << NODE_BITS) - 1;
const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

macro_rules! node_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize)]
        pub struct $name(u8);

        impl $name {
            #[must_use]
            pub fn new(id: u8) -> Option<Self> {
                (u64::from(id) <= NODE_MASK).then_some(Self(id))
            }

            #[must_use]
            pub fn get(self) -> u8 {
                self.0
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let inner = u8::deserialize(deserializer)?;
                Self::new(inner).ok_or_else(|| {
                    Error::invalid_value(
                        Unexpected::Unsigned(inner.into()),
                        &concat!("a ", stringify!($name), " below 32"),
                    )
                })
            }
        }
    };
}

node_id!(
    /// Distinguishes machines generating ids.
    WorkerId
);
node_id!(
    /// Distinguishes generating processes on one machine.
    ProcessId
);

#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Snowflake(u64);

impl Snowflake {
    #[must_use]
    pub fn new(inner: u64) -> Self {
        Self(inner)
    }

    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }

    #[must_use]
    pub fn created_at(self) -> UtcDateTime {
        EPOCH + Duration::milliseconds((self.0 >> TIMESTAMP_OFFSET).cast_signed())
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn worker_id(self) -> WorkerId {
        WorkerId(((self.0 >> WORKER_ID_OFFSET) & NODE_MASK) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn process_id(self) -> ProcessId {
        ProcessId(((self.0 >> PROCESS_ID_OFFSET) & NODE_MASK) as u8)
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn sequence(self) -> u16 {
        (self.0 & SEQUENCE_MASK) as u16
    }
}

impl Display for Snowflake {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl From<u64> for Snowflake {
    fn from(value: u64) -> Self {
        Self::new(value)
    }
}

impl From<Snowflake> for u64 {
    fn from(value: Snowflake) -> Self {
        value.get()
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Default, Hash)]
pub struct SnowflakeGenerator {
    worker_id: WorkerId,
    process_id: ProcessId,
    sequence: u64,
}

impl SnowflakeGenerator {
    #[must_use]
    pub fn new(worker_id: WorkerId, process_id: ProcessId) -> Self {
        Self {
            worker_id,
            process_id,
            sequence: 0,
        }
    }

    /// Times before [`EPOCH`] get timestamp zero, times past the 42 bit range
    /// the largest timestamp.
    pub fn generate_at(&mut self, time: UtcDateTime) -> Snowflake {
        let millis = (time - EPOCH)
            .whole_milliseconds()
            .clamp(0, i128::from(TIMESTAMP_MASK));
        let millis = u64::try_from(millis).unwrap_or_default();

        let sequence = self.sequence;
        self.sequence = (self.sequence + 1) & SEQUENCE_MASK;

        Snowflake(
            (millis << TIMESTAMP_OFFSET)
                | (u64::from(self.worker_id.0) << WORKER_ID_OFFSET)
                | (u64::from(self.process_id.0) << PROCESS_ID_OFFSET)
                | sequence,
        )
    }

    pub fn generate(&mut self) -> Snowflake {
        self.generate_at(UtcDateTime::now())
    }
}

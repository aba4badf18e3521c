pub mod model;
pub mod policy;
pub mod slug;
pub mod snowflake;
pub mod util;

pub mod client;
#[cfg(any(test, feature = "memory"))]
pub mod memory;
mod record;
pub mod store;

pub use store::{DbError, Result, Store};

//! Storage contracts and backends for the leaderboard service.
//!
//! The service consumes an external ordered-set primitive through the
//! [`RankedStore`] trait and a durable hash primitive through [`HashStore`].
//! [`RedisStore`] is the production backend; [`MemoryStore`] backs tests and
//! local development. [`Registry`] is the durable name → config mapping for
//! scheduled leaderboards.

pub mod backend;
pub mod error;
pub mod memory;
pub mod registry;
pub mod traits;

pub use backend::RedisStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use registry::{Registry, REGISTRY_KEY};
pub use traits::{HashStore, RankedStore, Store};

//! Read-optimized resource cache
//!
//! - [`lazy`]: deferred fields memoized on first read
//! - [`snapshot`]: immutable, revision-stamped copy of a resource
//! - [`revisioned`]: snapshot cache invalidated by revision bumps

pub mod lazy;
pub mod revisioned;
pub mod snapshot;

pub use lazy::LazyField;
pub use revisioned::{CacheStats, SnapshotCache, DEFAULT_MAX_ENTRIES};
pub use snapshot::{Attributes, CachedResource, Revisioned};

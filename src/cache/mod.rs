//! Response cache for air quality lookups
//!
//! This module stores provider payloads keyed by coordinates in a single JSON
//! file. Entries carry the time they were fetched so callers can decide when
//! to refresh them; entries written before timestamps existed are migrated in
//! place on first access.

mod entry;
mod guard;
mod key;
mod store;

pub use entry::{classify, migrate, parse_entry, CacheEntry, CacheRecord, EntryKind};
pub use guard::PersistentCache;
pub use key::CacheKey;
pub use store::{load, save, Cache, CacheError};

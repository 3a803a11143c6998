//! In-memory request cache shared by every view.
//!
//! This module provides an API-agnostic store that:
//! - Keys entries by resource name + ordered parameters
//! - Deduplicates in-flight fetches so one key has at most one request pending
//! - Serves fresh entries without touching the network
//! - Retries failed fetches a configurable number of times
//!
//! Entries live for the lifetime of the process; nothing is persisted.

mod layer;
mod traits;

pub use layer::{QueryCache, QueryOptions};
pub use traits::{FetchResult, QueryKey};

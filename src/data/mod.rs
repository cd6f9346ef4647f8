//! Upstream data: fetching raw series payloads and normalizing them.
//!
//! - `ons`: HTTP client, payload shape checks, memoizing source
//! - `normalize`: payload -> typed `Series`

pub mod normalize;
pub mod ons;

pub use normalize::normalize;
pub use ons::{CachedSource, OnsClient, RawPayload, SeriesSource};

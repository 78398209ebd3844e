//! vqi-builder library interface
//!
//! Builds venue-quality indexes: normalized venue name → best rank, →
//! compact metric record, or → `true` for membership lists. File sources are
//! merged offline; the Clarivate source is listed page by page and enriched
//! per journal through a bounded worker pool.

pub mod clients;
pub mod compact;
pub mod config;
pub mod enrich;
pub mod error;
pub mod index;
pub mod lists;
pub mod normalize;
pub mod output;
pub mod paging;
pub mod pipeline;
pub mod rank;
pub mod sources;
pub mod utils;

pub use crate::error::{BuildError, BuildResult, FetchError};
pub use crate::index::{IndexEntry, IndexSnapshot, MergeIndex};
pub use crate::normalize::normalize_venue_name;
pub use crate::rank::{RankScale, RankValue, Scheme};

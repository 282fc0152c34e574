//! Listing comparison
//!
//! Fetches `ls -lR` output for both roots, removes the parts that are expected
//! to differ (root prefix, dates, times) and reports the lines that remain
//! different after a line-level LCS diff.

pub mod compare;
pub mod normalize;

pub use compare::{diff_listings, Discrepancy, DiscrepancyKind, ListingComparator, ListingDiff};
pub use normalize::normalize_listing;

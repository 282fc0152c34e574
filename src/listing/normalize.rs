//! Listing normalization.
//!
//! Removes the root prefix so entries read root-relative, then strips time
//! (`HH:MM`) and date (`YYYY-MM-DD`) tokens, which always differ between the
//! two trees.

use regex::Regex;
use std::sync::OnceLock;

fn time_pattern() -> &'static Regex {
    static TIME: OnceLock<Regex> = OnceLock::new();
    TIME.get_or_init(|| Regex::new(r"\d\d:\d\d").expect("time pattern is valid"))
}

fn date_pattern() -> &'static Regex {
    static DATE: OnceLock<Regex> = OnceLock::new();
    DATE.get_or_init(|| Regex::new(r"\d\d\d\d-\d\d-\d\d").expect("date pattern is valid"))
}

/// Normalize one raw `ls -lR` listing taken below `root`.
pub fn normalize_listing(listing: &str, root: &str) -> String {
    let relative = strip_root(listing, root);
    let without_time = time_pattern().replace_all(&relative, "");
    date_pattern().replace_all(&without_time, "").into_owned()
}

fn strip_root(listing: &str, root: &str) -> String {
    let root = root.trim_end_matches('/');
    if root.is_empty() {
        return listing.to_owned();
    }
    listing.replace(root, "")
}

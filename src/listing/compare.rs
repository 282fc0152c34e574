//! Line-level listing diff.

use super::normalize::normalize_listing;
use crate::error::StressResult;
use crate::shell::{RemoteCommand, ShellChannel};
use crate::types::PathPair;
use serde::Serialize;
use similar::{Algorithm, ChangeTag, TextDiff};
use std::fmt;
use tracing::{debug, warn};

/// Which side a discrepant line appears on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscrepancyKind {
    /// Present in the plain listing only.
    Removed,
    /// Present in the secure listing only.
    Added,
}

/// One normalized listing line that has no counterpart on the other side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Discrepancy {
    pub kind: DiscrepancyKind,
    pub line: String,
}

impl fmt::Display for Discrepancy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.kind {
            DiscrepancyKind::Removed => '-',
            DiscrepancyKind::Added => '+',
        };
        write!(f, "{} {}", marker, self.line)
    }
}

/// Result of comparing the two trees' listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListingDiff {
    pub discrepancies: Vec<Discrepancy>,
    pub compared_lines: usize,
}

impl ListingDiff {
    pub fn matches(&self) -> bool {
        self.discrepancies.is_empty()
    }
}

/// Diff two already normalized listings line by line.
///
/// Ordering is significant: lines are aligned with an LCS diff and never
/// reordered.
pub fn diff_listings(plain: &str, secure: &str) -> ListingDiff {
    let left: Vec<&str> = plain.lines().collect();
    let right: Vec<&str> = secure.lines().collect();

    let diff = TextDiff::configure()
        .algorithm(Algorithm::Lcs)
        .diff_slices(&left, &right);

    let discrepancies = diff
        .iter_all_changes()
        .filter_map(|change| {
            let kind = match change.tag() {
                ChangeTag::Equal => return None,
                ChangeTag::Delete => DiscrepancyKind::Removed,
                ChangeTag::Insert => DiscrepancyKind::Added,
            };
            Some(Discrepancy {
                kind,
                line: change.value().to_string(),
            })
        })
        .collect();

    ListingDiff {
        discrepancies,
        compared_lines: left.len().max(right.len()),
    }
}

/// Fetches and compares the recursive listings of both roots.
pub struct ListingComparator;

impl ListingComparator {
    /// Compare the trees below `roots.plain` and `roots.secure`.
    pub fn compare<S: ShellChannel + ?Sized>(
        shell: &mut S,
        roots: &PathPair,
    ) -> StressResult<ListingDiff> {
        let plain = Self::fetch(shell, &roots.plain)?;
        let secure = Self::fetch(shell, &roots.secure)?;

        let diff = diff_listings(
            &normalize_listing(&plain, &roots.plain),
            &normalize_listing(&secure, &roots.secure),
        );
        if diff.matches() {
            debug!(lines = diff.compared_lines, "listings match");
        } else {
            warn!(
                discrepancies = diff.discrepancies.len(),
                lines = diff.compared_lines,
                "listings differ"
            );
        }
        Ok(diff)
    }

    fn fetch<S: ShellChannel + ?Sized>(shell: &mut S, root: &str) -> StressResult<String> {
        let output = shell.run(&RemoteCommand::new("ls").arg("-lR").arg(root))?;
        Ok(output.stdout)
    }
}

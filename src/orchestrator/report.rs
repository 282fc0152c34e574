//! Final run report, rendered as text or JSON.

use crate::listing::Discrepancy;
use crate::types::{PathPair, RunCounters};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fmt;

/// Stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    CheckDevice,
    Prepare,
    Build,
    Compare,
    Cleanup,
}

impl Stage {
    /// Label printed on the progress line.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::CheckDevice => "Checking device",
            Stage::Prepare => "Preparing test",
            Stage::Build => "Building file structure",
            Stage::Compare => "Checking",
            Stage::Cleanup => "Cleaning up",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Listings matched and every stage completed.
    Match,
    /// Listings were compared and differ.
    Mismatch,
    /// A stage failed before or instead of a verdict.
    Aborted,
    /// The connectivity check failed; nothing was touched.
    Unreachable,
}

impl Verdict {
    /// Process exit code for this verdict.
    pub fn exit_code(&self) -> i32 {
        match self {
            Verdict::Match => 0,
            Verdict::Mismatch | Verdict::Aborted => 1,
            Verdict::Unreachable => 3,
        }
    }
}

/// Everything observed during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    pub seed: u64,
    pub roots: PathPair,
    pub stages: Vec<StageOutcome>,
    pub counters: RunCounters,
    pub invocations: usize,
    pub registered_targets: usize,
    pub discrepancies: Vec<Discrepancy>,
    pub verdict: Verdict,
}

impl RunReport {
    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Match
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageOutcome> {
        self.stages.iter().find(|o| o.stage == stage)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n\n", "Run Report".bold().underline()));
        out.push_str(&format!("  Started: {}\n", self.started_at));
        out.push_str(&format!("  Finished: {}\n", self.finished_at));
        out.push_str(&format!("  Seed: {}\n", self.seed));
        out.push_str(&format!("  Roots: {}\n\n", self.roots));

        let mut stages = Table::new();
        stages.load_preset(UTF8_BORDERS_ONLY);
        stages.set_header(vec!["Stage", "Status", "Error"]);
        for outcome in &self.stages {
            let status = match outcome.status {
                StageStatus::Done => "DONE",
                StageStatus::Failed => "FAILED",
            };
            stages.add_row(vec![
                outcome.stage.label().to_string(),
                status.to_string(),
                outcome.error.clone().unwrap_or_else(|| "-".to_string()),
            ]);
        }
        out.push_str(&format!("{}\n\n", stages));

        out.push_str(&format!("  Files: {}\n", self.counters.files));
        out.push_str(&format!("  Directories: {}\n", self.counters.directories));
        out.push_str(&format!("  Symlinks: {}\n", self.counters.links));
        out.push_str(&format!("  Link targets registered: {}\n", self.registered_targets));
        out.push_str(&format!("  Top-level passes: {}\n", self.invocations));

        if !self.discrepancies.is_empty() {
            out.push_str(&format!("\n  Discrepancies ({})\n", self.discrepancies.len()));
            for discrepancy in &self.discrepancies {
                out.push_str(&format!("    {}\n", discrepancy));
            }
        }
        out.push_str(&format!("\n  Verdict: {:?}\n", self.verdict));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::DiscrepancyKind;

    fn report(verdict: Verdict) -> RunReport {
        RunReport {
            started_at: "2026-10-17T08:00:00+00:00".to_string(),
            finished_at: "2026-10-17T08:01:00+00:00".to_string(),
            seed: 42,
            roots: PathPair::new("/data/data/testn", "/data/data/teste"),
            stages: vec![
                StageOutcome {
                    stage: Stage::CheckDevice,
                    status: StageStatus::Done,
                    error: None,
                },
                StageOutcome {
                    stage: Stage::Compare,
                    status: StageStatus::Failed,
                    error: None,
                },
            ],
            counters: RunCounters {
                files: 31,
                links: 2,
                directories: 4,
            },
            invocations: 3,
            registered_targets: 5,
            discrepancies: vec![Discrepancy {
                kind: DiscrepancyKind::Removed,
                line: "-rwx------ 1 root root 9   0a0a0a".to_string(),
            }],
            verdict,
        }
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(Verdict::Match.exit_code(), 0);
        assert_eq!(Verdict::Mismatch.exit_code(), 1);
        assert_eq!(Verdict::Aborted.exit_code(), 1);
        assert_eq!(Verdict::Unreachable.exit_code(), 3);
    }

    #[test]
    fn test_json_shape() {
        let json: serde_json::Value =
            serde_json::from_str(&report(Verdict::Mismatch).to_json().unwrap()).unwrap();
        assert_eq!(json["seed"], 42);
        assert_eq!(json["verdict"], "mismatch");
        assert_eq!(json["stages"][0]["stage"], "check_device");
        assert_eq!(json["stages"][1]["status"], "failed");
        assert!(json["stages"][0].get("error").is_none());
        assert_eq!(json["counters"]["files"], 31);
        assert_eq!(json["discrepancies"][0]["kind"], "removed");
    }

    #[test]
    fn test_text_lists_discrepancies() {
        let text = report(Verdict::Mismatch).to_text();
        assert!(text.contains("Seed: 42"));
        assert!(text.contains("Checking device"));
        assert!(text.contains("- -rwx------ 1 root root 9   0a0a0a"));
        assert!(text.contains("Verdict: Mismatch"));
    }

    #[test]
    fn test_stage_lookup() {
        let report = report(Verdict::Match);
        assert!(report.passed());
        assert_eq!(
            report.stage(Stage::Compare).map(|o| o.status),
            Some(StageStatus::Failed)
        );
        assert!(report.stage(Stage::Cleanup).is_none());
    }
}

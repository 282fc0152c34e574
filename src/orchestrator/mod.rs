//! Run orchestration
//!
//! Drives one strictly sequential run over a shell channel:
//! `CheckDevice → Prepare → Build → Compare → Cleanup`. Each stage prints a
//! dotted progress line ending in `DONE` or `FAILED`. A failed device check or
//! preparation ends the run immediately; once the container exists, cleanup
//! always runs.

pub mod device;
pub mod progress;
pub mod report;

pub use progress::Progress;
pub use report::{RunReport, Stage, StageOutcome, StageStatus, Verdict};

use crate::config::StressConfig;
use crate::error::StressResult;
use crate::listing::{Discrepancy, ListingComparator};
use crate::shell::ShellChannel;
use crate::tree::{BuildState, TreeBuilder};
use crate::types::PathPair;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use tracing::{error, info, warn};

/// Runs the stages of one stress pass against a device.
pub struct Orchestrator<'a, S: ShellChannel + ?Sized, W: Write> {
    shell: &'a mut S,
    config: &'a StressConfig,
    progress: Progress<W>,
    seed: u64,
    stages: Vec<StageOutcome>,
}

impl<'a, S: ShellChannel + ?Sized, W: Write> Orchestrator<'a, S, W> {
    pub fn new(
        shell: &'a mut S,
        config: &'a StressConfig,
        progress: Progress<W>,
        seed: u64,
    ) -> Self {
        Orchestrator {
            shell,
            config,
            progress,
            seed,
            stages: Vec::new(),
        }
    }

    /// Execute the run. Stage failures are reported in the returned
    /// [`RunReport`]; only local output errors are returned as `Err`.
    pub fn run(mut self) -> StressResult<RunReport> {
        let started_at = Utc::now().to_rfc3339();
        let roots = PathPair::new(
            self.config.roots.plain.clone(),
            self.config.roots.secure.clone(),
        );
        let mut state = BuildState::new(&self.config.bounds);
        let mut invocations = 0;
        let mut discrepancies = Vec::new();
        info!(seed = self.seed, roots = %roots, "starting run");

        self.progress.begin(Stage::CheckDevice.label())?;
        let reachable = device::check_device(&mut *self.shell);
        if self.conclude(Stage::CheckDevice, reachable)?.is_none() {
            let verdict = Verdict::Unreachable;
            return Ok(self.into_report(started_at, roots, &state, 0, discrepancies, verdict));
        }

        self.progress.begin(Stage::Prepare.label())?;
        let commands = device::prepare_commands(&self.config.roots, &self.config.container);
        let prepared = device::run_all(&mut *self.shell, &commands);
        if self.conclude(Stage::Prepare, prepared)?.is_none() {
            let verdict = Verdict::Aborted;
            return Ok(self.into_report(started_at, roots, &state, 0, discrepancies, verdict));
        }

        self.progress.begin(Stage::Build.label())?;
        state.reset();
        let built = TreeBuilder::new(
            &mut *self.shell,
            StdRng::seed_from_u64(self.seed),
            self.config.bounds.clone(),
        )
        .build(&roots, &mut state);

        let mut verdict = Verdict::Aborted;
        if let Some(passes) = self.conclude(Stage::Build, built)? {
            invocations = passes;
            self.progress.begin(Stage::Compare.label())?;
            match ListingComparator::compare(&mut *self.shell, &roots) {
                Ok(diff) if diff.matches() => {
                    self.progress.done()?;
                    self.push(Stage::Compare, StageStatus::Done, None);
                    verdict = Verdict::Match;
                }
                Ok(diff) => {
                    self.progress.failed()?;
                    for discrepancy in &diff.discrepancies {
                        self.progress.detail(&discrepancy.to_string())?;
                    }
                    let summary = format!("{} discrepant lines", diff.discrepancies.len());
                    self.push(Stage::Compare, StageStatus::Failed, Some(summary));
                    discrepancies = diff.discrepancies;
                    verdict = Verdict::Mismatch;
                }
                Err(e) => {
                    self.conclude::<()>(Stage::Compare, Err(e))?;
                }
            }
        }

        self.progress.begin(Stage::Cleanup.label())?;
        let commands = device::cleanup_commands(&self.config.roots, &self.config.container);
        let cleaned = device::run_best_effort(&mut *self.shell, &commands);
        if self.conclude(Stage::Cleanup, cleaned)?.is_none() && verdict == Verdict::Match {
            verdict = Verdict::Aborted;
        }

        Ok(self.into_report(started_at, roots, &state, invocations, discrepancies, verdict))
    }

    /// Print the stage marker and record the outcome.
    fn conclude<T>(&mut self, stage: Stage, result: StressResult<T>) -> StressResult<Option<T>> {
        match result {
            Ok(value) => {
                self.progress.done()?;
                info!(stage = ?stage, "stage done");
                self.push(stage, StageStatus::Done, None);
                Ok(Some(value))
            }
            Err(e) => {
                self.progress.failed()?;
                self.progress.detail(&e.to_string())?;
                if stage == Stage::Cleanup {
                    warn!(stage = ?stage, error = %e, "stage failed");
                } else {
                    error!(stage = ?stage, error = %e, "stage failed");
                }
                self.push(stage, StageStatus::Failed, Some(e.to_string()));
                Ok(None)
            }
        }
    }

    fn push(&mut self, stage: Stage, status: StageStatus, error: Option<String>) {
        self.stages.push(StageOutcome { stage, status, error });
    }

    fn into_report(
        self,
        started_at: String,
        roots: PathPair,
        state: &BuildState,
        invocations: usize,
        discrepancies: Vec<Discrepancy>,
        verdict: Verdict,
    ) -> RunReport {
        info!(verdict = ?verdict, files = state.counters.files, "run finished");
        RunReport {
            started_at,
            finished_at: Utc::now().to_rfc3339(),
            seed: self.seed,
            roots,
            stages: self.stages,
            counters: state.counters,
            invocations,
            registered_targets: state.registry.len(),
            discrepancies,
            verdict,
        }
    }
}

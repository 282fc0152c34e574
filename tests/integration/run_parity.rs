use efs_stress::config::{BuildBounds, ByteSize, StressConfig};
use efs_stress::orchestrator::{Stage, StageStatus, Verdict};
use efs_stress::shell::{Fault, MemoryShell};
use efs_stress::tooling::cli::{CliContext, ReportFormat};
use efs_stress::tree::{BuildState, TreeBuilder};
use efs_stress::types::PathPair;
use rand::rngs::StdRng;
use rand::SeedableRng;

const PLAIN: &str = "/data/data/testn";
const SECURE: &str = "/data/data/teste";

fn bounds() -> BuildBounds {
    BuildBounds {
        max_level: 3,
        max_files: 5,
        max_links: 8,
        max_size: ByteSize(5000),
        min_files: 10,
    }
}

fn build(seed: u64, bounds: BuildBounds) -> (MemoryShell, BuildState, usize) {
    let mut shell = MemoryShell::new().with_dir(PLAIN).with_dir(SECURE);
    let mut state = BuildState::new(&bounds);
    let roots = PathPair::new(PLAIN, SECURE);
    let invocations = TreeBuilder::new(&mut shell, StdRng::seed_from_u64(seed), bounds)
        .build(&roots, &mut state)
        .unwrap();
    (shell, state, invocations)
}

#[test]
fn both_trees_share_structure_modes_and_sizes() {
    for seed in 0..8 {
        let (shell, state, _) = build(seed, bounds());
        let plain = shell.relative_paths(PLAIN);
        assert_eq!(plain, shell.relative_paths(SECURE), "seed {seed}");
        assert!(state.counters.files >= 10);

        for rel in &plain {
            let p = format!("{PLAIN}/{rel}");
            let s = format!("{SECURE}/{rel}");
            assert_eq!(shell.is_dir(&p), shell.is_dir(&s), "{rel}");
            assert_eq!(shell.file_size(&p), shell.file_size(&s), "{rel}");
            if shell.file_size(&p).is_some() {
                assert_eq!(shell.mode(&p), shell.mode(&s), "{rel}");
                let mode = shell.mode(&p).unwrap();
                assert_eq!(mode & 0o700, 0o700, "{rel}");
                let size = shell.file_size(&p).unwrap();
                assert!((1..5000).contains(&size), "{rel}: {size}");
            }
        }
    }
}

#[test]
fn symlinks_point_at_registered_entries_of_their_own_tree() {
    for seed in 0..8 {
        let (shell, state, _) = build(seed, bounds());
        let links: Vec<String> = shell
            .relative_paths(PLAIN)
            .into_iter()
            .filter(|rel| shell.symlink_target(&format!("{PLAIN}/{rel}")).is_some())
            .collect();
        assert_eq!(links.len(), state.counters.links, "seed {seed}");
        assert!(state.counters.links <= 8);
        assert!(state.registry.len() <= 8);

        for rel in &links {
            let plain_target = shell.symlink_target(&format!("{PLAIN}/{rel}")).unwrap();
            let secure_target = shell.symlink_target(&format!("{SECURE}/{rel}")).unwrap();
            assert!(plain_target.starts_with(PLAIN));
            assert!(secure_target.starts_with(SECURE));
            assert_eq!(plain_target[PLAIN.len()..], secure_target[SECURE.len()..]);
            assert!(shell.contains(plain_target));
            assert!(state
                .registry
                .entries()
                .iter()
                .any(|pair| pair.plain == plain_target && pair.secure == secure_target));
        }
    }
}

#[test]
fn flat_single_entry_levels_create_one_file_per_pass() {
    let bounds = BuildBounds {
        max_level: 0,
        max_files: 1,
        max_links: 0,
        max_size: ByteSize(64),
        min_files: 5,
    };
    let (shell, state, invocations) = build(11, bounds);
    assert_eq!(invocations, 5);
    assert_eq!(state.counters.files, 5);
    assert_eq!(state.counters.directories, 0);
    assert_eq!(state.counters.links, 0);
    assert_eq!(shell.relative_paths(PLAIN).len(), 5);
}

fn small_config() -> StressConfig {
    let mut config = StressConfig::default();
    config.bounds = bounds();
    config
}

#[test]
fn full_run_matches_and_reports_json() {
    let context = CliContext::from_parts(small_config(), 21);
    let mut shell = MemoryShell::new().with_dir("/data/data");
    let mut progress = Vec::new();

    let report = context.execute(&mut shell, &mut progress, false).unwrap();
    assert_eq!(report.verdict, Verdict::Match);
    assert_eq!(report.stages.len(), 5);

    let progress = String::from_utf8(progress).unwrap();
    assert_eq!(progress.matches(" DONE\n").count(), 5);
    assert!(!progress.contains("FAILED"));

    let json = CliContext::render_report(&report, ReportFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["seed"], 21);
    assert_eq!(value["verdict"], "match");
    assert_eq!(value["roots"]["plain"], PLAIN);
    assert!(value["counters"]["files"].as_u64().unwrap() >= 10);
}

#[test]
fn storage_defect_is_reported_as_mismatch() {
    let context = CliContext::from_parts(small_config(), 22);
    let mut shell = MemoryShell::new()
        .with_dir("/data/data")
        .with_fault(Fault::GrowCopies {
            under: SECURE.to_string(),
            extra: 1,
        });
    let mut progress = Vec::new();

    let report = context.execute(&mut shell, &mut progress, false).unwrap();
    assert_eq!(report.verdict, Verdict::Mismatch);
    assert_eq!(report.verdict.exit_code(), 1);
    assert!(!report.discrepancies.is_empty());
    assert_eq!(
        report.stage(Stage::Cleanup).map(|o| o.status),
        Some(StageStatus::Done)
    );

    let progress = String::from_utf8(progress).unwrap();
    assert!(progress.contains("FAILED"));
    assert!(progress.lines().any(|line| line.starts_with("    - ")));
    assert!(progress.lines().any(|line| line.starts_with("    + ")));
    assert!(shell.is_enforcing());
}

#[test]
fn unreachable_device_exits_with_code_three() {
    let context = CliContext::from_parts(small_config(), 23);
    let mut shell = MemoryShell::new().with_dir("/data/data").with_fault(Fault::Offline);

    let report = context.execute(&mut shell, Vec::new(), false).unwrap();
    assert_eq!(report.verdict, Verdict::Unreachable);
    assert_eq!(report.verdict.exit_code(), 3);
    assert_eq!(shell.history().len(), 1);
}

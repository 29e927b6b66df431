use bnk::DecodeOptions;
use bnk::process::{VerifyOutcome, verify};
use std::path::PathBuf;

/// Round-trips every bank under `BNK_CORPUS` (or `test_output/banks`).
#[test]
fn test_bulk_round_trip_corpus() {
    let root_path = std::env::var_os("BNK_CORPUS")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
            path.push("../../test_output/banks");
            path
        });

    if !root_path.exists() {
        println!("Skipping bulk test: corpus not found at {:?}", root_path);
        return;
    }

    println!("Scanning for BNK files in {:?}...", root_path);
    let report = verify(&root_path, &DecodeOptions::default()).unwrap();

    println!("Bulk BNK Round-Trip Results:");
    println!("  Identical:  {}", report.identical());
    println!("  Mismatched: {}", report.mismatched());
    println!("  Failed:     {}", report.failed());

    let problems: Vec<_> = report
        .files
        .iter()
        .filter(|(_, outcome)| *outcome != VerifyOutcome::Identical)
        .collect();
    if !problems.is_empty() {
        println!("\nProblem details (first 10):");
        for (path, outcome) in problems.iter().take(10) {
            println!("  - {:?}: {:?}", path.file_name().unwrap_or_default(), outcome);
        }
    }

    assert!(
        problems.is_empty(),
        "{} of {} banks did not round-trip",
        problems.len(),
        report.files.len()
    );
}

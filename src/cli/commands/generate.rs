use anyhow::Result;
use clap::ArgMatches;
use std::fs;
use std::io;

use twingen::apply::{self, ApplyOutcome};
use twingen::scan::scan;
use twingen::verify::{verify, ProcessFormatter};
use twingen::{rebuild, report, Config, SourceTree, Synthesizer};

/// Full generation path: scan, synthesize the missing twins, rebuild,
/// round-trip verify, then present a diff and apply on confirmation.
///
/// Always exits 0 once the pipeline ran, whether or not the user accepted
/// the result.
pub fn handle_generate(matches: &ArgMatches, config: &Config) -> Result<()> {
    let target_name = matches
        .get_one::<String>("target")
        .expect("target is a required argument");
    let target = config.target(target_name)?;

    let text = fs::read_to_string(&target.path)?;
    let tree = SourceTree::parse(&text)?;
    let scan_result = scan(&tree, &target.impl_type, &config.rules);

    if scan_result.is_complete() {
        report::success("All public methods have corresponding async versions!");
        return Ok(());
    }

    println!();
    report::warning(&format!(
        "Found {} missing async methods:",
        scan_result.missing.len()
    ));
    for base in &scan_result.missing {
        println!("  - {}", config.rules.async_name(base));
    }
    println!();

    let synthesizer = Synthesizer::new(config.rules.clone());
    let synthesized = synthesizer.synthesize_all(&scan_result);
    let rebuilt = rebuild(&tree, &target.impl_type, synthesized);

    let formatter = ProcessFormatter::new(config.formatter.clone());
    let verification = verify(&rebuilt, &target.impl_type, &config.rules, &formatter)?;
    report::info(&format!(
        "Complete missing async methods at {}",
        verification.artifact_path.display()
    ));

    if verification.is_clean() {
        report::success("All missing async methods are generated");
    } else {
        let unresolved = verification
            .still_missing
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ");
        report::warning(&format!(
            "Still missing async methods after generation: {unresolved}"
        ));
    }

    if config.difftool.enabled {
        apply::spawn_difftool(&config.difftool, &target.path, &verification.artifact_path);
    }

    let mut stdin = io::stdin().lock();
    match apply::present_and_apply(&target.path, &verification.artifact_path, &mut stdin)? {
        ApplyOutcome::Applied { backup_path } => {
            report::success(&format!(
                "Applied generated methods to {} (backup at {})",
                target.path.display(),
                backup_path.display()
            ));
        }
        ApplyOutcome::Rejected => {
            report::info("Left the original file untouched.");
        }
    }

    Ok(())
}

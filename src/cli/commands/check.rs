use anyhow::Result;
use clap::ArgMatches;
use std::fs;
use std::process;

use twingen::scan::scan;
use twingen::{report, Config, SourceTree};

/// Standalone completeness check for CI: exit 0 when every public sync
/// method has its async twin, exit 1 otherwise.
pub fn handle_check(matches: &ArgMatches, config: &Config) -> Result<()> {
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

    process::exit(1);
}

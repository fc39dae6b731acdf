//! The diff & apply gate: the only place in the pipeline that mutates the
//! real source file, and only after an explicit confirmation.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::config::DifftoolConfig;
use crate::diff;
use crate::error::Result;
use crate::report;

#[derive(Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied { backup_path: PathBuf },
    Rejected,
}

/// Sibling path the original is copied to before being overwritten:
/// `queue.rs` -> `queue_backup.rs`.
pub fn backup_path_for(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut name = format!("{stem}_backup");
    if let Some(ext) = original.extension() {
        name.push('.');
        name.push_str(&ext.to_string_lossy());
    }
    original.with_file_name(name)
}

/// Print the diff between original and artifact, ask for confirmation, and
/// on a "y" answer back up the original and overwrite it with the artifact.
/// Any other answer leaves the original untouched.
pub fn present_and_apply(
    original_path: &Path,
    artifact_path: &Path,
    input: &mut dyn BufRead,
) -> Result<ApplyOutcome> {
    let original = fs::read_to_string(original_path)?;
    let artifact = fs::read_to_string(artifact_path)?;

    let rendered = diff::unified(&original, &artifact, 3);
    if rendered.is_empty() {
        report::info("Generated file is identical to the original.");
    } else {
        println!("--- {}", original_path.display());
        println!("+++ {}", artifact_path.display());
        print!("{rendered}");
    }

    print!("Apply generated methods to {}? [y/N] ", original_path.display());
    io::stdout().flush()?;

    let mut answer = String::new();
    input.read_line(&mut answer)?;
    let answer = answer.trim();

    if answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes") {
        let backup_path = backup_path_for(original_path);
        fs::copy(original_path, &backup_path)?;
        fs::write(original_path, artifact)?;
        Ok(ApplyOutcome::Applied { backup_path })
    } else {
        Ok(ApplyOutcome::Rejected)
    }
}

/// Spawn the configured diff viewer on the two files for visual inspection.
/// Failures are ignored; the viewer is a convenience, not part of the
/// pipeline.
pub fn spawn_difftool(config: &DifftoolConfig, original: &Path, artifact: &Path) {
    let result = Command::new(&config.program)
        .args(&config.args)
        .arg(original)
        .arg(artifact)
        .status();
    if let Err(e) = result {
        debug!(error = %e, "difftool not available");
    }
}

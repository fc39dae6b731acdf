//! Round-trip verification of a rebuilt tree.
//!
//! The rebuilt tree is serialized to a temp file, run through the external
//! formatter until it reports stability (bounded retries), then reparsed and
//! rescanned. A non-empty missing set after that is a warning, not a
//! failure: a partial artifact is still worth offering for review.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::config::FormatterConfig;
use crate::error::{Result, TwingenError};
use crate::parse::SourceTree;
use crate::rules::RewriteRules;
use crate::scan::scan;

/// Formatting passes attempted before giving up on stability.
pub const MAX_FORMAT_PASSES: usize = 3;

/// Process boundary for the external formatter, kept behind a trait so the
/// verifier stays testable without spawning anything.
pub trait Formatter {
    /// Format the file in place. Returns true once the formatter reports no
    /// further changes.
    fn format(&self, path: &Path) -> Result<bool>;
}

/// Spawns the configured formatter binary on the file.
pub struct ProcessFormatter {
    config: FormatterConfig,
}

impl ProcessFormatter {
    pub fn new(config: FormatterConfig) -> Self {
        Self { config }
    }
}

impl Formatter for ProcessFormatter {
    fn format(&self, path: &Path) -> Result<bool> {
        let before = fs::read(path)?;

        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg(path)
            .output()
            .map_err(|e| {
                TwingenError::Formatter(format!("failed to run {}: {e}", self.config.program))
            })?;

        if !output.status.success() {
            return Err(TwingenError::Formatter(format!(
                "{} exited with {}: {}",
                self.config.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !self.config.stable_marker.is_empty() && stdout.contains(&self.config.stable_marker) {
            return Ok(true);
        }

        // Formatters like rustfmt print nothing; stability shows up as an
        // unchanged file.
        let after = fs::read(path)?;
        Ok(before == after)
    }
}

/// Outcome of round-trip verification. `still_missing` non-empty means the
/// best-effort transform skipped something; the artifact is still usable.
#[derive(Debug)]
pub struct Verification {
    pub artifact_path: PathBuf,
    pub still_missing: std::collections::BTreeSet<String>,
}

impl Verification {
    pub fn is_clean(&self) -> bool {
        self.still_missing.is_empty()
    }
}

/// Serialize, format, reparse, rescan.
pub fn verify(
    rebuilt: &SourceTree,
    target_impl: &str,
    rules: &RewriteRules,
    formatter: &dyn Formatter,
) -> Result<Verification> {
    let source = rebuilt.to_source();

    let mut tmp = tempfile::Builder::new()
        .prefix("twingen-")
        .suffix(".rs")
        .tempfile()?;
    tmp.write_all(source.as_bytes())?;
    tmp.flush()?;

    // Keep the artifact around; the diff gate and the user still need it.
    let (_, artifact_path) = tmp.keep().map_err(|e| TwingenError::Io(e.error))?;
    info!(artifact = %artifact_path.display(), "wrote generated artifact");

    for pass in 0..MAX_FORMAT_PASSES {
        if formatter.format(&artifact_path)? {
            debug!(pass, "formatter reached a fixed point");
            break;
        }
    }

    let formatted = fs::read_to_string(&artifact_path)?;
    let tree = SourceTree::parse(&formatted)?;
    let rescan = scan(&tree, target_impl, rules);

    Ok(Verification {
        artifact_path,
        still_missing: rescan.missing,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rebuild::rebuild;
    use crate::synth::Synthesizer;
    use std::collections::BTreeMap;

    /// Formatter stand-in that touches nothing and reports stability.
    struct NoopFormatter;

    impl Formatter for NoopFormatter {
        fn format(&self, _path: &Path) -> Result<bool> {
            Ok(true)
        }
    }

    /// Formatter stand-in that fails to spawn.
    struct BrokenFormatter;

    impl Formatter for BrokenFormatter {
        fn format(&self, _path: &Path) -> Result<bool> {
            Err(TwingenError::Formatter("missing binary".to_string()))
        }
    }

    const SOURCE: &str = r#"
        impl PgmqQueue {
            pub fn create_queue(&self, queue: &str) {}
        }
    "#;

    #[test]
    fn test_verify_clean_after_full_synthesis() {
        let rules = RewriteRules::default();
        let tree = SourceTree::parse(SOURCE).unwrap();
        let result = scan(&tree, "PgmqQueue", &rules);
        let synthesized = Synthesizer::new(rules.clone()).synthesize_all(&result);
        let rebuilt = rebuild(&tree, "PgmqQueue", synthesized);

        let verification = verify(&rebuilt, "PgmqQueue", &rules, &NoopFormatter).unwrap();

        assert!(verification.is_clean());
        assert!(verification.artifact_path.exists());
        let _ = fs::remove_file(&verification.artifact_path);
    }

    #[test]
    fn test_verify_warns_when_twins_still_missing() {
        let rules = RewriteRules::default();
        let tree = SourceTree::parse(SOURCE).unwrap();
        // Nothing synthesized: the rebuilt tree still owes create_queue_async.
        let rebuilt = rebuild(&tree, "PgmqQueue", BTreeMap::new());

        let verification = verify(&rebuilt, "PgmqQueue", &rules, &NoopFormatter).unwrap();

        assert!(!verification.is_clean());
        assert!(verification.still_missing.contains("create_queue"));
        let _ = fs::remove_file(&verification.artifact_path);
    }

    #[test]
    fn test_formatter_failure_is_fatal() {
        let rules = RewriteRules::default();
        let tree = SourceTree::parse(SOURCE).unwrap();
        let rebuilt = rebuild(&tree, "PgmqQueue", BTreeMap::new());

        let err = verify(&rebuilt, "PgmqQueue", &rules, &BrokenFormatter).unwrap_err();

        assert!(matches!(err, TwingenError::Formatter(_)));
    }
}

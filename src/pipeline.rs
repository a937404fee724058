//! File-level orchestration
//!
//! This module connects the producers to the filesystem:
//! - [`write_scenario`] synthesizes one scenario into a canonical file
//! - [`normalize_file`] converts one raw log into a canonical file
//! - [`TreeNormalizer`] mirrors whole source directories into an output root
//!
//! Every file is built in memory and written through a temporary file that is
//! renamed into place, so a failure never leaves a partial canonical file.

use crate::encoder::{CanonicalEncoder, Precision};
use crate::error::FallTraceError;
use crate::normalizer::{NormalizationReport, Normalizer};
use crate::scenario::{Scenario, ScenarioConfig};
use crate::synthesizer::Synthesizer;
use serde::Serialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Synthesize `config` and write it to `path`. Returns the number of data rows.
pub fn write_scenario(config: &ScenarioConfig, path: &Path) -> Result<usize, FallTraceError> {
    let records = Synthesizer::synthesize(config)?;
    let document = CanonicalEncoder::new(Precision::SYNTHESIZED).encode_document(&records)?;
    write_atomically(path, &document)?;
    info!(scenario = %config.name, rows = records.len(), path = %path.display(), "wrote synthesized trace");
    Ok(records.len())
}

/// Write every built-in scenario into `output_dir` (created if absent)
pub fn write_builtin_scenarios(output_dir: &Path) -> Result<Vec<PathBuf>, FallTraceError> {
    let mut written = Vec::new();
    for scenario in Scenario::ALL {
        let config = scenario.config()?;
        let path = output_dir.join(scenario.file_name());
        write_scenario(&config, &path)?;
        written.push(path);
    }
    Ok(written)
}

/// Normalize the raw log at `source` into a canonical file at `target`
pub fn normalize_file(source: &Path, target: &Path) -> Result<NormalizationReport, FallTraceError> {
    let raw = fs::read(source).map_err(|e| FallTraceError::io(source, e))?;
    let log = Normalizer::normalize(&raw);
    let document = CanonicalEncoder::new(Precision::NORMALIZED).encode_document(&log.records)?;
    write_atomically(target, &document)?;

    let report = log.report;
    if report.rows_skipped() > 0 {
        warn!(
            source = %source.display(),
            skipped = report.rows_skipped(),
            first_line = ?report.first_skipped_line,
            "dropped unusable rows"
        );
    }
    info!(source = %source.display(), target = %target.display(), rows = report.rows_kept, "normalized log");
    Ok(report)
}

fn write_atomically(path: &Path, contents: &str) -> Result<(), FallTraceError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(|e| FallTraceError::io(&parent, e))?;

    let mut file = tempfile::NamedTempFile::new_in(&parent).map_err(|e| FallTraceError::io(&parent, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| FallTraceError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| FallTraceError::io(path, e.error))?;
    Ok(())
}

/// Outcome of one file in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    pub target: PathBuf,
    pub report: NormalizationReport,
}

/// Failure of one file in a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub source: PathBuf,
    pub error: String,
}

/// Summary of a tree normalization run
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub normalized: Vec<FileOutcome>,
    pub failed: Vec<FileFailure>,
    /// Source directories that could not be read, and symlinked directories
    pub skipped_dirs: Vec<PathBuf>,
    /// Files skipped because they already live under the output root
    pub skipped_outputs: Vec<PathBuf>,
}

/// Mirrors raw-log directories into a canonical output tree.
///
/// `fall/sub/a.csv` under a source directory `root/fall` lands at
/// `<output_root>/fall/sub/a.csv`.
pub struct TreeNormalizer {
    source_dirs: Vec<PathBuf>,
    output_root: PathBuf,
}

impl TreeNormalizer {
    pub fn new(source_dirs: Vec<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            source_dirs,
            output_root: output_root.into(),
        }
    }

    /// Normalize every `*.csv` under the source directories.
    ///
    /// Only an unusable output root is fatal; unreadable directories and
    /// failing files are recorded in the report and the batch continues.
    pub fn run(&self) -> Result<BatchReport, FallTraceError> {
        fs::create_dir_all(&self.output_root).map_err(|e| FallTraceError::io(&self.output_root, e))?;
        let output_root = canonical_or_raw(&self.output_root);

        let mut report = BatchReport::default();
        for source_dir in &self.source_dirs {
            if !source_dir.is_dir() {
                warn!(dir = %source_dir.display(), "source directory missing, skipping");
                report.skipped_dirs.push(source_dir.clone());
                continue;
            }

            // Resolved first so `..` components cannot move targets out of the output root
            let source_dir = canonical_or_raw(source_dir);
            let mut files = Vec::new();
            collect_csv_files(&source_dir, &mut files, &mut report.skipped_dirs);

            let base = source_dir.parent().unwrap_or(source_dir.as_path());
            for source in files {
                if canonical_or_raw(&source).starts_with(&output_root) {
                    debug!(file = %source.display(), "already under output root, skipping");
                    report.skipped_outputs.push(source);
                    continue;
                }

                let relative = match source.strip_prefix(base) {
                    Ok(relative) => relative.to_path_buf(),
                    Err(_) => PathBuf::from(source.file_name().unwrap_or_default()),
                };
                let target = self.output_root.join(relative);
                match normalize_file(&source, &target) {
                    Ok(file_report) => report.normalized.push(FileOutcome {
                        source,
                        target,
                        report: file_report,
                    }),
                    Err(e) => {
                        warn!(file = %source.display(), error = %e, "failed to normalize file");
                        report.failed.push(FileFailure {
                            source,
                            error: e.to_string(),
                        });
                    }
                }
            }
        }

        info!(
            normalized = report.normalized.len(),
            failed = report.failed.len(),
            skipped_dirs = report.skipped_dirs.len(),
            "tree normalization finished"
        );
        Ok(report)
    }
}

fn canonical_or_raw(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Recursively collect `*.csv` files in sorted order.
///
/// Symbolic links to directories are not followed; links to files are kept.
fn collect_csv_files(dir: &Path, files: &mut Vec<PathBuf>, skipped_dirs: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "cannot read directory, skipping");
            skipped_dirs.push(dir.to_path_buf());
            return;
        }
    };

    let mut children: Vec<(PathBuf, fs::FileType)> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_type().ok().map(|kind| (entry.path(), kind)))
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));

    for (path, kind) in children {
        if kind.is_dir() {
            collect_csv_files(&path, files, skipped_dirs);
        } else if kind.is_symlink() && path.is_dir() {
            debug!(dir = %path.display(), "symlinked directory, not following");
            skipped_dirs.push(path);
        } else if is_csv(&path) {
            files.push(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::{decode_document, CANONICAL_HEADER};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const RAW_LOG: &str = "Time (s)\tAx\tAy\tAz\tRx\tRy\tRz\n\
0.000\t0.1\t9.8\t0.2\t0.0\t0.0\t0.0\n\
0.010\tbad\t9.8\t0.2\t0.0\t0.0\t0.0\n\
0.020\t0.1\t9.7\t0.2\t180.0\t0.0\t0.0\n";

    fn write_raw(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, RAW_LOG).unwrap();
    }

    #[test]
    fn test_write_scenario_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("fall.csv");
        let config = Scenario::RealFall.config().unwrap();

        let rows = write_scenario(&config, &path).unwrap();
        let text = fs::read_to_string(&path).unwrap();

        assert_eq!(rows, 1000);
        assert_eq!(text.lines().count(), 1001);
        assert!(text.starts_with(CANONICAL_HEADER));
        assert!(decode_document(&text)[440].accel_magnitude > 25.0);
    }

    #[test]
    fn test_builtin_scenarios_written() {
        let dir = TempDir::new().unwrap();
        let written = write_builtin_scenarios(dir.path()).unwrap();

        assert_eq!(written.len(), Scenario::ALL.len());
        assert!(written.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_normalize_file_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("raw.csv");
        let target = dir.path().join("out").join("raw.csv");
        write_raw(&source);

        let report = normalize_file(&source, &target).unwrap();
        let text = fs::read_to_string(&target).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();

        assert_eq!(report.rows_kept, 2);
        assert_eq!(report.skipped_not_numeric, 1);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CANONICAL_HEADER);
        assert!(lines[1].starts_with("0.000\t0.100000\t9.800000\t0.200000\t"));
        assert!(lines[2].contains("\t3.141593\t0.000000\t0.000000\t3.141593"));
    }

    #[test]
    fn test_missing_source_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.csv");

        let result = normalize_file(&dir.path().join("absent.csv"), &target);

        assert!(matches!(result, Err(FallTraceError::Io { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn test_tree_mirrors_relative_paths() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("test-cases");
        write_raw(&root.join("fall").join("curve").join("Fall in a curve.csv"));
        write_raw(&root.join("no_fall").join("walk.CSV"));
        fs::write(root.join("fall").join("notes.txt"), "ignored").unwrap();

        let output_root = root.join("normalized");
        let normalizer = TreeNormalizer::new(
            vec![root.join("fall"), root.join("no_fall"), root.join("missing")],
            &output_root,
        );
        let report = normalizer.run().unwrap();

        assert_eq!(report.normalized.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.skipped_dirs, vec![root.join("missing")]);
        assert!(output_root.join("fall").join("curve").join("Fall in a curve.csv").is_file());
        assert!(output_root.join("no_fall").join("walk.CSV").is_file());
        assert!(!output_root.join("fall").join("notes.txt").exists());
    }

    #[test]
    fn test_tree_skips_files_under_output_root() {
        let dir = TempDir::new().unwrap();
        let source_dir = dir.path().join("fall");
        write_raw(&source_dir.join("a.csv"));

        // Output root nested inside the source tree, holding a previous result
        let output_root = source_dir.join("normalized");
        write_raw(&output_root.join("fall").join("a.csv"));

        let report = TreeNormalizer::new(vec![source_dir.clone()], &output_root)
            .run()
            .unwrap();

        assert_eq!(report.normalized.len(), 1);
        assert_eq!(report.skipped_outputs.len(), 1);
        let text = fs::read_to_string(output_root.join("fall").join("a.csv")).unwrap();
        assert!(text.starts_with(CANONICAL_HEADER));
    }

    #[cfg(unix)]
    #[test]
    fn test_tree_does_not_follow_directory_symlinks() {
        let dir = TempDir::new().unwrap();
        let source_dir = dir.path().join("fall");
        write_raw(&source_dir.join("a.csv"));
        std::os::unix::fs::symlink(&source_dir, source_dir.join("loop")).unwrap();
        std::os::unix::fs::symlink(source_dir.join("a.csv"), source_dir.join("b.csv")).unwrap();

        let output_root = dir.path().join("normalized");
        let report = TreeNormalizer::new(vec![source_dir.clone()], &output_root)
            .run()
            .unwrap();

        assert_eq!(report.normalized.len(), 2);
        assert_eq!(report.skipped_dirs.len(), 1);
        assert!(report.skipped_dirs[0].ends_with("loop"));
        assert!(output_root.join("fall").join("b.csv").is_file());
        assert!(!output_root.join("fall").join("loop").exists());
    }

    #[test]
    fn test_tree_resolves_parent_components() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("data");
        write_raw(&root.join("fall").join("a.csv"));
        fs::create_dir_all(root.join("fall").join("sub")).unwrap();

        let output_root = dir.path().join("out");
        let report = TreeNormalizer::new(vec![root.join("fall").join("sub").join("..")], &output_root)
            .run()
            .unwrap();

        assert_eq!(report.normalized.len(), 1);
        assert!(output_root.join("fall").join("a.csv").is_file());
        assert!(report.normalized[0].target.starts_with(&output_root));
        assert!(!dir.path().join("a.csv").exists());
    }
}

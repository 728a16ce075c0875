use anyhow::{Context, Result, bail};
use matter_requirements::loader::requirement_files;
use matter_requirements::model::DeviceTypeDocument;
use matter_requirements::{Severity, validate_requirement_schema, validate_semantics};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

/// Schema and semantic issues for one requirement file.
#[derive(Debug, Default)]
struct FileIssues {
    errors: Vec<String>,
    warnings: Vec<String>,
}

fn check_file(path: &Path) -> Result<FileIssues> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let mut issues = FileIssues::default();

    if let Err(schema_errors) = validate_requirement_schema(&text) {
        for e in &schema_errors {
            issues.errors.push(format!("schema: {e}"));
        }
    }

    match serde_json::from_str::<DeviceTypeDocument>(&text) {
        Ok(doc) => {
            for issue in validate_semantics(&doc) {
                match issue.severity {
                    Severity::Error => issues.errors.push(issue.to_string()),
                    Severity::Warning => issues.warnings.push(issue.to_string()),
                }
            }
        }
        // The schema pass already reports the structural problem.
        Err(e) => log::debug!("{}: skipping semantic checks: {e}", path.display()),
    }

    Ok(issues)
}

pub fn run_check_requirements(dir: &Path, quiet: bool) -> Result<()> {
    let files = requirement_files(dir).with_context(|| format!("listing {}", dir.display()))?;
    if files.is_empty() {
        bail!("No requirement files (*.json) found in {}", dir.display());
    }
    log::info!("Checking {} requirement files", files.len());

    let results: Vec<(PathBuf, Result<FileIssues>)> =
        files.par_iter().map(|path| (path.clone(), check_file(path))).collect();

    let mut error_count = 0usize;
    let mut unreadable = 0usize;
    for (path, result) in &results {
        match result {
            Ok(issues) => {
                if !quiet {
                    for w in &issues.warnings {
                        eprintln!("{}: {w}", path.display());
                    }
                    for e in &issues.errors {
                        eprintln!("{}: {e}", path.display());
                    }
                }
                error_count += issues.errors.len();
            }
            Err(e) => {
                eprintln!("FAILED {}: {e:#}", path.display());
                unreadable += 1;
            }
        }
    }

    println!(
        "{}: {} files, {} validation error{}",
        dir.display(),
        results.len(),
        error_count,
        if error_count == 1 { "" } else { "s" }
    );

    if unreadable > 0 {
        bail!("{unreadable} of {} files could not be read", results.len());
    }
    if error_count > 0 {
        bail!(
            "{error_count} validation error{} in {}",
            if error_count == 1 { "" } else { "s" },
            dir.display()
        );
    }
    Ok(())
}

use anyhow::{Context, Result, bail};
use matter_conformance::{SnapshotDevice, ValidationReport, check_self_consistency, validate_device_types};
use matter_model::SchemaRegistry;
use matter_requirements::{LoadOptions, load_device_type_requirements_with};
use std::path::Path;

pub fn run_validate_device(snapshot: &Path, schema: &SchemaRegistry) -> Result<()> {
    let mut device = SnapshotDevice::load(snapshot).with_context(|| format!("loading {}", snapshot.display()))?;
    let report = check_self_consistency(&mut device, schema)
        .with_context(|| format!("checking {}", snapshot.display()))?;
    log::info!("{} commands invoked", device.invocations().len());
    finish(snapshot, &report)
}

pub fn run_validate_device_types(device_type_data: &Path, snapshot: &Path, lenient: bool) -> Result<()> {
    let requirements = load_device_type_requirements_with(device_type_data, LoadOptions { lenient })
        .with_context(|| format!("loading requirements from {}", device_type_data.display()))?;
    if requirements.is_empty() {
        bail!("No device-type requirements found in {}", device_type_data.display());
    }

    let mut device = SnapshotDevice::load(snapshot).with_context(|| format!("loading {}", snapshot.display()))?;
    let report = validate_device_types(&mut device, &requirements)
        .with_context(|| format!("checking {}", snapshot.display()))?;
    finish(snapshot, &report)
}

/// Print skips and findings, then a summary line. Fails when anything was found.
fn finish(subject: &Path, report: &ValidationReport) -> Result<()> {
    for skipped in &report.skipped {
        eprintln!("{}: skipped {skipped}", subject.display());
    }

    if report.is_success() {
        println!("{}: conforms", subject.display());
        return Ok(());
    }

    for finding in &report.findings {
        eprintln!("{}: {finding}", subject.display());
    }

    let count = report.findings.len();
    let plural = if count == 1 { "" } else { "s" };
    println!("{}: {count} finding{plural}", subject.display());
    bail!("{count} finding{plural} in {}", subject.display());
}

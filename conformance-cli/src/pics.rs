use anyhow::{Context, Result, bail};
use matter_conformance::{SnapshotDevice, generate_pics};
use matter_pics::{PicsAnnotator, RemapRules, TemplateResolver, pics_report, prepare_output_root};
use matter_requirements::ClusterInfoTable;
use std::path::Path;

pub fn run_generate_pics(
    cluster_data: &Path,
    template_dir: &Path,
    output_root: &Path,
    snapshot: &Path,
    rules: RemapRules,
) -> Result<()> {
    if !template_dir.is_dir() {
        bail!("PICS template directory {} does not exist", template_dir.display());
    }

    let cluster_info =
        ClusterInfoTable::load(cluster_data).with_context(|| format!("loading {}", cluster_data.display()))?;
    let device = SnapshotDevice::load(snapshot).with_context(|| format!("loading {}", snapshot.display()))?;
    let resolver = TemplateResolver::new(template_dir, rules)
        .with_context(|| format!("indexing templates in {}", template_dir.display()))?;
    let annotator = PicsAnnotator::new(resolver);

    prepare_output_root(output_root).with_context(|| format!("preparing {}", output_root.display()))?;
    let generation = generate_pics(device.tree(), &cluster_info, &annotator, output_root)
        .with_context(|| format!("generating PICS from {}", snapshot.display()))?;

    for skipped in &generation.skipped {
        eprintln!("{}: skipped {skipped}", snapshot.display());
    }
    for path in &generation.written {
        println!("{}", path.display());
    }
    println!(
        "{}: {} PICS file{} written, {} skipped",
        output_root.display(),
        generation.written.len(),
        if generation.written.len() == 1 { "" } else { "s" },
        generation.skipped.len()
    );
    Ok(())
}

pub fn run_pics_report(dir: &Path) -> Result<()> {
    let report = pics_report(dir).with_context(|| format!("reading {}", dir.display()))?;
    print!("{report}");

    if !report.unreadable.is_empty() {
        bail!(
            "{} unreadable PICS file{} in {}",
            report.unreadable.len(),
            if report.unreadable.len() == 1 { "" } else { "s" },
            dir.display()
        );
    }
    Ok(())
}

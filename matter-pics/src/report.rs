//! Support listing for a directory of PICS XML files.

use std::fmt;
use std::path::Path;

use crate::error::PicsError;
use crate::resolver::xml_file_names;
use crate::template::{parse_cluster_pics, ClusterPics};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportItem {
    pub item_number: String,
    pub support: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSection {
    /// `usage`, or `<side>/<section>` such as `Server/attributes`.
    pub name: String,
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReport {
    pub file_name: String,
    pub sections: Vec<ReportSection>,
}

impl FileReport {
    fn from_pics(file_name: &str, pics: &ClusterPics) -> Self {
        let mut sections = Vec::new();
        if let Some(usage) = &pics.usage {
            sections.push(ReportSection {
                name: "usage".into(),
                items: usage.items.iter().map(report_item).collect(),
            });
        }
        for side in &pics.sides {
            for (name, list) in side.sections() {
                if let Some(list) = list {
                    sections.push(ReportSection {
                        name: format!("{}/{name}", side.side_type),
                        items: list.items.iter().map(report_item).collect(),
                    });
                }
            }
        }
        Self {
            file_name: file_name.to_string(),
            sections,
        }
    }

    pub fn supported_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.items.iter())
            .filter(|i| i.support == "true")
            .count()
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

fn report_item(item: &crate::template::PicsItem) -> ReportItem {
    ReportItem {
        item_number: item.item_number.trim().to_string(),
        support: item.support.as_deref().unwrap_or("").trim().to_string(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct PicsReport {
    pub files: Vec<FileReport>,
    /// Files that could not be read or parsed, with the reason.
    pub unreadable: Vec<(String, String)>,
}

impl fmt::Display for PicsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{}", file.file_name)?;
            for section in &file.sections {
                writeln!(f, "  [{}]", section.name)?;
                for item in &section.items {
                    writeln!(f, "    {} - {}", item.item_number, item.support)?;
                }
            }
            writeln!(
                f,
                "  {} of {} items supported",
                file.supported_count(),
                file.item_count()
            )?;
        }
        for (name, reason) in &self.unreadable {
            writeln!(f, "{name}: {reason}")?;
        }
        Ok(())
    }
}

/// List every item's support value for each `*.xml` in `dir`, skipping
/// `base.xml`.
pub fn pics_report(dir: &Path) -> Result<PicsReport, PicsError> {
    let mut report = PicsReport::default();
    for file_name in xml_file_names(dir)? {
        if file_name.eq_ignore_ascii_case("base.xml") {
            log::debug!("Ignoring {file_name}");
            continue;
        }
        let path = dir.join(&file_name);
        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| PicsError::io(&path, e))
            .and_then(|text| parse_cluster_pics(&text).map_err(PicsError::from));
        match parsed {
            Ok(pics) => report.files.push(FileReport::from_pics(&file_name, &pics)),
            Err(e) => {
                log::warn!("Could not read {}: {e}", path.display());
                report.unreadable.push((file_name, e.to_string()));
            }
        }
    }
    Ok(report)
}

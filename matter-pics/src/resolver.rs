//! Cluster name -> PICS template file resolution.
//!
//! Resolution order:
//! 1. apply the call site's name remaps;
//! 2. reuse an output file already written for this name in the run;
//! 3. match against the template directory.

use std::path::{Path, PathBuf};

use crate::error::PicsError;

/// Remap table and template match style for a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemapRules {
    /// PICS generator: file name must start with the lookup name.
    #[default]
    Generator,
    /// Device mapping: file name must contain the lookup name.
    DeviceMapper,
}

const DEVICE_MANAGEMENT_CLUSTERS: [&str; 3] = [
    "Basic Information Cluster",
    "Node Operational Credentials Cluster",
    "Network Commissioning Cluster",
];

impl RemapRules {
    /// Template lookup name for a cluster display name.
    pub fn lookup_name(self, cluster_name: &str) -> String {
        match self {
            RemapRules::Generator => {
                if cluster_name.contains("OTA Software Update Provider Cluster") {
                    "OTA Software Update".to_string()
                } else if cluster_name == "On/Off Cluster" {
                    cluster_name.replace('/', "-")
                } else if cluster_name == "Group Key Management Cluster" {
                    "Group Communication".to_string()
                } else if cluster_name == "Node Operational Credentials Cluster"
                    || cluster_name == "Basic Information Cluster"
                {
                    cluster_name.replace("Cluster", "").trim().to_string()
                } else {
                    cluster_name.to_string()
                }
            }
            RemapRules::DeviceMapper => {
                if DEVICE_MANAGEMENT_CLUSTERS.iter().any(|c| cluster_name.contains(c)) {
                    "Device Management".to_string()
                } else if cluster_name.contains("Administrator Commissioning Cluster") {
                    "Multiple Fabrics".to_string()
                } else if cluster_name.contains("On/Off") {
                    cluster_name.replace('/', "-")
                } else {
                    cluster_name.to_string()
                }
            }
        }
    }

    fn template_matches(self, file_name: &str, lookup: &str) -> bool {
        let file = file_name.to_lowercase();
        let lookup = lookup.to_lowercase();
        match self {
            RemapRules::Generator => file.starts_with(&lookup),
            RemapRules::DeviceMapper => file.contains(&lookup),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTemplate {
    /// File to read the base document from.
    pub path: PathBuf,
    /// File name used for the output document.
    pub file_name: String,
    /// True when the base is an output written earlier in the run.
    pub from_output: bool,
}

#[derive(Debug, Clone)]
pub struct TemplateResolver {
    template_dir: PathBuf,
    templates: Vec<String>,
    rules: RemapRules,
}

impl TemplateResolver {
    /// Index the `*.xml` files in `template_dir`.
    pub fn new(template_dir: &Path, rules: RemapRules) -> Result<Self, PicsError> {
        let templates = xml_file_names(template_dir)?;
        log::info!("{} PICS templates in {}", templates.len(), template_dir.display());
        Ok(Self {
            template_dir: template_dir.to_path_buf(),
            templates,
            rules,
        })
    }

    pub fn rules(&self) -> RemapRules {
        self.rules
    }

    pub fn template_names(&self) -> &[String] {
        &self.templates
    }

    /// Find the base document for `cluster_name`, preferring an existing output
    /// in `output_dir`.
    pub fn resolve(&self, cluster_name: &str, output_dir: &Path) -> Result<ResolvedTemplate, PicsError> {
        let lookup = self.rules.lookup_name(cluster_name);

        if output_dir.is_dir() {
            if let Some(existing) = xml_file_names(output_dir)?
                .into_iter()
                .find(|f| f.contains(lookup.as_str()))
            {
                log::debug!("'{cluster_name}' continues from output {existing}");
                return Ok(ResolvedTemplate {
                    path: output_dir.join(&existing),
                    file_name: existing,
                    from_output: true,
                });
            }
        }

        match self
            .templates
            .iter()
            .find(|f| self.rules.template_matches(f, &lookup))
        {
            Some(file) => Ok(ResolvedTemplate {
                path: self.template_dir.join(file),
                file_name: file.clone(),
                from_output: false,
            }),
            None => Err(PicsError::TemplateNotFound {
                cluster: cluster_name.to_string(),
                lookup,
            }),
        }
    }
}

/// Names of `*.xml` files in `dir`, sorted.
pub(crate) fn xml_file_names(dir: &Path) -> Result<Vec<String>, PicsError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PicsError::io(dir, e))? {
        let entry = entry.map_err(|e| PicsError::io(dir, e))?;
        let path = entry.path();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if !path.is_file() || !is_xml {
            continue;
        }
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

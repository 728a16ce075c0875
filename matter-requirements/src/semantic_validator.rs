use crate::model::{ClusterEntry, DeviceTypeDocument, ElementEntry};
use crate::requirement::ElementRequirement;
use matter_model::{parse_hex_id, ElementMarker};
use std::collections::{BTreeMap, BTreeSet};

/// Severity of a semantic validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A semantic validation finding.
#[derive(Debug, Clone)]
pub struct SemanticIssue {
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SemanticIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        if self.path.is_empty() {
            write!(f, "{prefix}: {}", self.message)
        } else {
            write!(f, "{prefix}: {}: {}", self.path, self.message)
        }
    }
}

/// Run all semantic validations on a parsed requirement document.
///
/// Returns a list of issues (errors and warnings). Empty means valid.
pub fn validate_semantics(doc: &DeviceTypeDocument) -> Vec<SemanticIssue> {
    let mut issues = Vec::new();

    validate_device_type_id(doc, &mut issues);
    validate_cluster_uniqueness("server_clusters", &doc.server_clusters, &mut issues);
    validate_cluster_uniqueness("client_clusters", &doc.client_clusters, &mut issues);
    validate_excluded_servers(doc, &mut issues);
    for (i, cluster) in doc.server_clusters.iter().enumerate() {
        validate_cluster_elements(&format!("server_clusters/{i}"), cluster, &mut issues);
    }

    issues
}

fn validate_device_type_id(doc: &DeviceTypeDocument, issues: &mut Vec<SemanticIssue>) {
    if let Err(e) = parse_hex_id(&doc.id) {
        issues.push(SemanticIssue {
            severity: Severity::Error,
            path: "id".into(),
            message: e.to_string(),
        });
    }
}

/// Check that no cluster id is listed twice in the same list.
fn validate_cluster_uniqueness(list_name: &str, clusters: &[ClusterEntry], issues: &mut Vec<SemanticIssue>) {
    let mut seen: BTreeMap<u32, usize> = BTreeMap::new();
    for (i, cluster) in clusters.iter().enumerate() {
        let id = match parse_hex_id(&cluster.id) {
            Ok(id) => id,
            Err(e) => {
                issues.push(SemanticIssue {
                    severity: Severity::Error,
                    path: format!("{list_name}/{i}/id"),
                    message: e.to_string(),
                });
                continue;
            }
        };
        if let Some(prev) = seen.get(&id) {
            issues.push(SemanticIssue {
                severity: Severity::Error,
                path: format!("{list_name}/{i}"),
                message: format!("duplicate cluster {id:#06x} (already listed at index {prev})"),
            });
        } else {
            seen.insert(id, i);
        }
    }
}

/// A cluster cannot be both required and excluded.
fn validate_excluded_servers(doc: &DeviceTypeDocument, issues: &mut Vec<SemanticIssue>) {
    let required: BTreeSet<u32> = doc
        .server_clusters
        .iter()
        .filter_map(|c| parse_hex_id(&c.id).ok())
        .collect();
    for (i, excluded) in doc.excluded_server_clusters.iter().enumerate() {
        match parse_hex_id(&excluded.id) {
            Ok(id) if required.contains(&id) => issues.push(SemanticIssue {
                severity: Severity::Error,
                path: format!("excluded_server_clusters/{i}"),
                message: format!("cluster {id:#06x} is both required and excluded"),
            }),
            Ok(_) => {}
            Err(e) => issues.push(SemanticIssue {
                severity: Severity::Error,
                path: format!("excluded_server_clusters/{i}/id"),
                message: e.to_string(),
            }),
        }
    }
}

fn validate_cluster_elements(path: &str, cluster: &ClusterEntry, issues: &mut Vec<SemanticIssue>) {
    let groups: [(&str, &[ElementEntry], &[ElementEntry], ElementMarker); 3] = [
        (
            "features",
            &cluster.mandatory_features,
            &cluster.excluded_features,
            ElementMarker::Feature,
        ),
        (
            "attributes",
            &cluster.mandatory_attributes,
            &cluster.excluded_attributes,
            ElementMarker::Attribute,
        ),
        (
            "commands",
            &cluster.mandatory_commands,
            &cluster.excluded_commands,
            ElementMarker::Command,
        ),
    ];

    let mut prefixes: BTreeSet<&str> = BTreeSet::new();

    for (kind, mandatory, excluded, marker) in groups {
        let mut mandatory_ids = BTreeSet::new();
        for (list, entries) in [("mandatory", mandatory), ("excluded", excluded)] {
            for (i, entry) in entries.iter().enumerate() {
                let entry_path = format!("{path}/{list}_{kind}/{i}");
                if let Some(prefix) = entry.pics_code.split('.').next() {
                    prefixes.insert(prefix);
                }
                let element = ElementRequirement::from(entry);
                let id = match element.resolve_id(marker) {
                    Ok(id) => id,
                    Err(e) => {
                        issues.push(SemanticIssue {
                            severity: Severity::Error,
                            path: entry_path,
                            message: e.to_string(),
                        });
                        continue;
                    }
                };
                let direction = if marker == ElementMarker::Command {
                    match element.direction() {
                        Ok(d) => Some(d),
                        Err(e) => {
                            issues.push(SemanticIssue {
                                severity: Severity::Error,
                                path: entry_path,
                                message: e.to_string(),
                            });
                            continue;
                        }
                    }
                } else {
                    None
                };
                if list == "mandatory" {
                    mandatory_ids.insert((id, direction));
                } else if mandatory_ids.contains(&(id, direction)) {
                    issues.push(SemanticIssue {
                        severity: Severity::Error,
                        path: entry_path,
                        message: format!("'{}' is both mandatory and excluded", entry.pics_code),
                    });
                }
            }
        }
    }

    if prefixes.len() > 1 {
        let list: Vec<&str> = prefixes.into_iter().collect();
        issues.push(SemanticIssue {
            severity: Severity::Warning,
            path: path.to_string(),
            message: format!("PICS codes use more than one cluster prefix: {}", list.join(", ")),
        });
    }
}

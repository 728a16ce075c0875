//! Device capability -> PICS code collection and annotation.

use matter_model::{
    encode_attribute, encode_command, encode_feature, is_global_attribute, CapabilityTree, ClusterId,
    CommandDirection, EndpointId,
};
use matter_pics::{endpoint_output_dir, AnnotationRequest, PicsAnnotator, PicsError};
use matter_requirements::ClusterInfoTable;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::error::ConformanceError;
use crate::findings::Skipped;

/// Outcome of a PICS generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PicsGeneration {
    /// Every output file written, including re-annotated ones.
    pub written: BTreeSet<PathBuf>,
    pub skipped: Vec<Skipped>,
}

impl PicsGeneration {
    fn skip(&mut self, endpoint: EndpointId, cluster: Option<ClusterId>, reason: String) {
        let skipped = Skipped {
            endpoint: Some(endpoint),
            cluster,
            reason,
        };
        log::warn!("Skipping {skipped}");
        self.skipped.push(skipped);
    }
}

/// Annotate PICS templates for every server and client cluster of every
/// endpoint into `<output_root>/endpoint<N>/`.
///
/// The output root must already be prepared. Clusters without cluster-info
/// entries or templates are skipped; other PICS errors end the run.
pub fn generate_pics(
    tree: &CapabilityTree,
    cluster_info: &ClusterInfoTable,
    annotator: &PicsAnnotator,
    output_root: &Path,
) -> Result<PicsGeneration, ConformanceError> {
    let mut generation = PicsGeneration::default();

    for endpoint in tree.effective_parts_list()? {
        let output_dir = endpoint_output_dir(output_root, endpoint)?;
        log::info!("Endpoint {endpoint} -> {}", output_dir.display());

        let (servers, clients) = match tree
            .declared_server_list(endpoint)
            .and_then(|servers| Ok((servers, tree.declared_client_list(endpoint)?)))
        {
            Ok(lists) => lists,
            Err(e) => {
                generation.skip(endpoint, None, e.to_string());
                continue;
            }
        };

        for cluster in servers {
            let Some(info) = cluster_info.get(cluster) else {
                generation.skip(endpoint, Some(cluster), "cluster not in cluster info table".into());
                continue;
            };
            let request = match server_request(tree, endpoint, cluster, &info.name, &info.pics_code) {
                Ok(request) => request,
                Err(e) => {
                    generation.skip(endpoint, Some(cluster), e.to_string());
                    continue;
                }
            };
            annotate(annotator, &request, &output_dir, endpoint, cluster, &mut generation)?;
        }

        for cluster in clients {
            let Some(info) = cluster_info.get(cluster) else {
                generation.skip(endpoint, Some(cluster), "client cluster not in cluster info table".into());
                continue;
            };
            let request = AnnotationRequest::client(info.name.clone(), info.pics_code.clone());
            annotate(annotator, &request, &output_dir, endpoint, cluster, &mut generation)?;
        }
    }

    Ok(generation)
}

fn annotate(
    annotator: &PicsAnnotator,
    request: &AnnotationRequest,
    output_dir: &Path,
    endpoint: EndpointId,
    cluster: ClusterId,
    generation: &mut PicsGeneration,
) -> Result<(), ConformanceError> {
    match annotator.annotate(request, output_dir) {
        Ok(path) => {
            generation.written.insert(path);
            Ok(())
        }
        Err(e @ PicsError::TemplateNotFound { .. }) => {
            generation.skip(endpoint, Some(cluster), e.to_string());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Server-side codes for one cluster instance: every set FeatureMap bit,
/// every non-global attribute and both command lists.
pub fn server_request(
    tree: &CapabilityTree,
    endpoint: EndpointId,
    cluster: ClusterId,
    name: &str,
    prefix: &str,
) -> Result<AnnotationRequest, matter_model::TreeError> {
    let feature_map = tree.feature_map(endpoint, cluster)?;
    let features = (0u8..32)
        .filter(|bit| feature_map & (1u32 << bit) != 0)
        .map(|bit| encode_feature(prefix, bit));

    let attributes = tree
        .declared_attribute_list(endpoint, cluster)?
        .into_iter()
        .filter(|&id| !is_global_attribute(id))
        .filter_map(|id| match u16::try_from(id) {
            Ok(id) => Some(encode_attribute(prefix, id)),
            Err(_) => {
                log::warn!("Attribute {id:#x} on cluster {cluster:#06x} has no PICS code");
                None
            }
        })
        .collect::<Vec<_>>();

    let accepted = command_codes(
        prefix,
        cluster,
        tree.declared_accepted_commands(endpoint, cluster)?,
        CommandDirection::Accepted,
    );
    let generated = command_codes(
        prefix,
        cluster,
        tree.declared_generated_commands(endpoint, cluster)?,
        CommandDirection::Generated,
    );

    Ok(AnnotationRequest::server(name, prefix)
        .with_features(features)
        .with_attributes(attributes)
        .with_accepted_commands(accepted)
        .with_generated_commands(generated))
}

fn command_codes(prefix: &str, cluster: ClusterId, ids: Vec<u32>, direction: CommandDirection) -> Vec<String> {
    ids.into_iter()
        .filter_map(|id| match u8::try_from(id) {
            Ok(id) => Some(encode_command(prefix, id, direction)),
            Err(_) => {
                log::warn!("{direction} command {id:#x} on cluster {cluster:#06x} has no PICS code");
                None
            }
        })
        .collect()
}

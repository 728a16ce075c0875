pub mod annotator;
pub mod error;
pub mod output;
pub mod report;
pub mod resolver;
pub mod template;

pub use annotator::{annotate_document, AnnotatedDocument, AnnotationRequest, PicsAnnotator};
pub use error::PicsError;
pub use output::{endpoint_output_dir, prepare_output_root};
pub use report::{pics_report, PicsReport};
pub use resolver::{RemapRules, ResolvedTemplate, TemplateResolver};
pub use template::{parse_cluster_pics, ClusterPics};

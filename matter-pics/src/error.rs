use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PicsError {
    #[error("no PICS template found for '{cluster}' (looked up as '{lookup}')")]
    TemplateNotFound { cluster: String, lookup: String },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no <clusterPICS> root element in {0}")]
    MissingRoot(String),
    #[error("malformed PICS document: {0}")]
    Malformed(String),
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("XML deserialization error: {0}")]
    De(#[from] quick_xml::DeError),
    #[error("XML write error: {0}")]
    Write(String),
}

impl PicsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PicsError::Io {
            path: path.into(),
            source,
        }
    }
}

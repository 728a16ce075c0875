pub mod cluster_info;
pub mod loader;
pub mod model;
pub mod requirement;
pub mod semantic_validator;
pub mod validator;

pub use cluster_info::{ClusterInfo, ClusterInfoError, ClusterInfoTable};
pub use loader::{load_device_type_requirements, load_device_type_requirements_with, LoadOptions, RequirementError};
pub use requirement::{ClusterRequirement, DeviceTypeRequirement, ElementRequirement, RequirementSet};
pub use semantic_validator::{validate_semantics, SemanticIssue, Severity};
pub use validator::{validate_requirement_schema, SchemaError};

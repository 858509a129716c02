use indexmap::IndexMap;
use serde::Serialize;

use super::operations::{OperationView, ParameterView};
use super::schema::SchemaNode;
use crate::parse::security::{SecurityRequirement, SecurityScheme};
use crate::parse::spec::Info;

/// `x-ms-parameterized-host` with its parameters resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterizedHostView {
    pub host_template: String,
    pub use_scheme_prefix: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_in_operation: Option<String>,
    pub parameters: Vec<ParameterView>,
}

/// Document-level metadata.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ApiViewGeneral {
    pub swagger: String,
    pub info: Info,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    pub schemes: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub security: Vec<SecurityRequirement>,
    pub security_definitions: IndexMap<String, SecurityScheme>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameterized_host: Option<ParameterizedHostView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swagger_link: Option<String>,
}

/// The API view of one root document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiViewSpec {
    pub file_name: String,
    pub package_name: String,
    pub general: ApiViewGeneral,
    /// Operations grouped by path. Paths are sorted, and operations within a
    /// path are sorted by method.
    pub paths: IndexMap<String, Vec<OperationView>>,
    pub definitions: IndexMap<String, SchemaNode>,
    pub global_parameters: IndexMap<String, ParameterView>,
}

impl ApiViewSpec {
    /// All operations in display order.
    pub fn operations(&self) -> impl Iterator<Item = &OperationView> {
        self.paths.values().flatten()
    }

    pub fn find_operation(&self, operation_id: &str) -> Option<&OperationView> {
        self.operations()
            .find(|op| op.operation_id.as_deref() == Some(operation_id))
    }
}

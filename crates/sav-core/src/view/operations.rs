use indexmap::IndexMap;
use serde::Serialize;

use super::schema::SchemaNode;
use crate::parse::operation::XmsPageable;
use crate::parse::parameter::ParameterLocation;
use crate::parse::response::Header;

/// HTTP method. Declaration order matches the lexical order of the lowercase
/// names, which is the order operations are sorted in within a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "delete",
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Patch => "patch",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
        }
    }
}

/// A resolved operation input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterView {
    pub name: String,
    pub location: ParameterLocation,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Resolved `schema` of a body parameter, or the `items` of an array
    /// parameter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    /// The `$ref` this parameter was reached through, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_path: Option<String>,
}

impl ParameterView {
    pub fn type_format(&self) -> String {
        if let Some(schema) = &self.schema {
            if self.param_type.as_deref() == Some("array") {
                return format!("array<{}>", schema.type_name());
            }
            return schema.type_format();
        }
        let base = self.param_type.as_deref().unwrap_or_default();
        match &self.format {
            Some(format) => format!("{base}/{format}"),
            None => base.to_string(),
        }
    }
}

/// The four parameter buckets of an operation. A parameter lands in exactly
/// one of them, chosen by its location.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OperationParameters {
    pub path: Vec<ParameterView>,
    pub query: Vec<ParameterView>,
    pub header: Vec<ParameterView>,
    pub body: Vec<ParameterView>,
}

impl OperationParameters {
    /// Place a parameter in the bucket for its location. Returns `false`, and
    /// drops the parameter, for locations without a bucket.
    pub fn classify(&mut self, param: ParameterView) -> bool {
        let bucket = match param.location {
            ParameterLocation::Path => &mut self.path,
            ParameterLocation::Query => &mut self.query,
            ParameterLocation::Header => &mut self.header,
            ParameterLocation::Body => &mut self.body,
            ParameterLocation::FormData | ParameterLocation::Unknown => return false,
        };
        bucket.push(param);
        true
    }

    /// Buckets in display order, with their titles.
    pub fn buckets(&self) -> [(&'static str, &[ParameterView]); 4] {
        [
            ("PathParameters", self.path.as_slice()),
            ("QueryParameters", self.query.as_slice()),
            ("HeaderParameters", self.header.as_slice()),
            ("BodyParameters", self.body.as_slice()),
        ]
    }

    pub fn len(&self) -> usize {
        self.path.len() + self.query.len() + self.header.len() + self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A resolved response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseView {
    pub status_code: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaNode>,
    pub headers: IndexMap<String, Header>,
}

/// One method bound to one path, with everything resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationView {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    pub operation_id_prefix: String,
    pub operation_id_action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub consumes: Vec<String>,
    pub produces: Vec<String>,
    pub deprecated: bool,
    pub long_running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pageable: Option<XmsPageable>,
    pub parameters: OperationParameters,
    pub responses: Vec<ResponseView>,
}

/// Split an operationId such as `Pets_Get` into (`Pets`, `Get`).
pub fn split_operation_id(operation_id: &str) -> (String, String) {
    match operation_id.split_once('_') {
        Some((prefix, action)) => (prefix.to_string(), action.to_string()),
        None => (String::new(), operation_id.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, location: ParameterLocation) -> ParameterView {
        ParameterView {
            name: name.to_string(),
            location,
            description: None,
            required: false,
            param_type: Some("string".to_string()),
            format: None,
            schema: None,
            ref_path: None,
        }
    }

    #[test]
    fn test_classify_exclusive() {
        let mut params = OperationParameters::default();
        assert!(params.classify(param("id", ParameterLocation::Path)));
        assert!(params.classify(param("api-version", ParameterLocation::Query)));
        assert!(!params.classify(param("file", ParameterLocation::FormData)));
        assert_eq!(params.path.len(), 1);
        assert_eq!(params.query.len(), 1);
        assert!(params.header.is_empty());
        assert!(params.body.is_empty());
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_method_order_matches_names() {
        let mut methods = vec![HttpMethod::Put, HttpMethod::Get, HttpMethod::Delete];
        methods.sort();
        let names: Vec<&str> = methods.iter().map(|m| m.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_split_operation_id() {
        assert_eq!(
            split_operation_id("Pets_ListByOwner"),
            ("Pets".to_string(), "ListByOwner".to_string())
        );
        assert_eq!(
            split_operation_id("listPets"),
            (String::new(), "listPets".to_string())
        );
    }

    #[test]
    fn test_parameter_type_format() {
        let mut p = param("top", ParameterLocation::Query);
        p.param_type = Some("integer".to_string());
        p.format = Some("int32".to_string());
        assert_eq!(p.type_format(), "integer/int32");
    }
}

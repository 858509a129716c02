use std::path::Path;

use indexmap::IndexMap;
use log::debug;

use crate::error::ResolveError;
use crate::loader::SpecLoader;
use crate::parse::operation::{Operation, PathItem};
use crate::parse::parameter::{ParameterLocation, ParameterOrRef};
use crate::parse::spec::SwaggerSpec;
use crate::resolve::RefResolver;
use crate::view::{
    HttpMethod, OperationParameters, OperationView, ParameterView, split_operation_id,
};

/// Build one [`OperationView`] per path and method of the document.
///
/// The result is keyed by path in sorted order, and each path's operations are
/// sorted by method.
pub fn build_operations<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    spec: &SwaggerSpec,
    spec_path: &Path,
) -> Result<IndexMap<String, Vec<OperationView>>, ResolveError> {
    let mut paths = IndexMap::with_capacity(spec.paths.len());

    for (path, item) in &spec.paths {
        let path_params = resolve_parameter_list(resolver, &item.parameters, spec_path)?;
        let mut operations = Vec::new();
        collect_operations(resolver, path, item, &path_params, spec_path, &mut operations)?;
        if operations.is_empty() {
            debug!("path {path} has no operations");
            continue;
        }
        operations.sort_by_key(|op| op.method);
        paths.insert(path.clone(), operations);
    }

    paths.sort_keys();
    Ok(paths)
}

fn collect_operations<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    path: &str,
    item: &PathItem,
    path_params: &[ParameterView],
    spec_path: &Path,
    out: &mut Vec<OperationView>,
) -> Result<(), ResolveError> {
    macro_rules! add_op {
        ($method:expr, $op:expr) => {
            if let Some(ref op) = $op {
                let view = build_operation(resolver, $method, path, op, path_params, spec_path)?;
                out.push(view);
            }
        };
    }

    add_op!(HttpMethod::Get, item.get);
    add_op!(HttpMethod::Put, item.put);
    add_op!(HttpMethod::Post, item.post);
    add_op!(HttpMethod::Delete, item.delete);
    add_op!(HttpMethod::Options, item.options);
    add_op!(HttpMethod::Head, item.head);
    add_op!(HttpMethod::Patch, item.patch);

    Ok(())
}

fn build_operation<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    method: HttpMethod,
    path: &str,
    op: &Operation,
    path_params: &[ParameterView],
    spec_path: &Path,
) -> Result<OperationView, ResolveError> {
    let own_params = resolve_parameter_list(resolver, &op.parameters, spec_path)?;
    let parameters = classify_parameters(merge_parameters(path_params, own_params));

    let mut responses = Vec::with_capacity(op.responses.len());
    for (status, response) in &op.responses {
        if let Some(view) = resolver.resolve_response(status, response, spec_path)? {
            responses.push(view);
        }
    }

    let (operation_id_prefix, operation_id_action) = op
        .operation_id
        .as_deref()
        .map(split_operation_id)
        .unwrap_or_default();

    Ok(OperationView {
        method,
        path: path.to_string(),
        operation_id: op.operation_id.clone(),
        operation_id_prefix,
        operation_id_action,
        summary: op.summary.clone(),
        description: op.description.clone(),
        tags: op.tags.clone(),
        consumes: op.consumes.clone(),
        produces: op.produces.clone(),
        deprecated: op.deprecated.unwrap_or(false),
        long_running: op.ms_long_running_operation.unwrap_or(false),
        pageable: op.ms_pageable.clone(),
        parameters,
        responses,
    })
}

/// Resolve a parameter list, dropping entries the resolver gave up on.
pub(crate) fn resolve_parameter_list<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    params: &[ParameterOrRef],
    spec_path: &Path,
) -> Result<Vec<ParameterView>, ResolveError> {
    let mut resolved = Vec::with_capacity(params.len());
    for param in params {
        if let Some(view) = resolver.resolve_parameter(param, spec_path)? {
            resolved.push(view);
        }
    }
    Ok(resolved)
}

/// Path-level parameters first; an operation parameter with the same name and
/// location replaces the path-level one in place.
fn merge_parameters(
    path_params: &[ParameterView],
    own_params: Vec<ParameterView>,
) -> Vec<ParameterView> {
    let mut merged: IndexMap<(String, ParameterLocation), ParameterView> = path_params
        .iter()
        .map(|p| ((p.name.clone(), p.location), p.clone()))
        .collect();
    for param in own_params {
        merged.insert((param.name.clone(), param.location), param);
    }
    merged.into_values().collect()
}

fn classify_parameters(params: Vec<ParameterView>) -> OperationParameters {
    let mut buckets = OperationParameters::default();
    for param in params {
        let (name, location) = (param.name.clone(), param.location);
        if !buckets.classify(param) {
            debug!("ignoring {} parameter {name}", location.as_str());
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::parse;
    use crate::resolve::{SchemaCache, UnresolvedRefPolicy};

    fn build(json: &str) -> IndexMap<String, Vec<OperationView>> {
        let spec = parse::from_json(json).unwrap();
        let mut cache = SchemaCache::new();
        let mut loader = MemoryLoader::new();
        let mut resolver = RefResolver::new(&mut cache, &mut loader, UnresolvedRefPolicy::Drop);
        let path = Path::new("spec.json");
        resolver.add_document(path, &spec);
        build_operations(&mut resolver, &spec, path).unwrap()
    }

    #[test]
    fn test_operation_overrides_path_parameter() {
        let paths = build(
            r##"{"swagger": "2.0", "paths": {"/pets/{id}": {
                "parameters": [
                    {"name": "id", "in": "path", "required": true, "type": "string"},
                    {"name": "verbose", "in": "query", "type": "boolean"}
                ],
                "get": {"operationId": "Pets_Get", "parameters": [
                    {"name": "id", "in": "path", "required": true, "type": "integer", "format": "int64"}
                ], "responses": {"200": {"description": "OK"}}}
            }}}"##,
        );
        let op = &paths["/pets/{id}"][0];
        assert_eq!(op.parameters.path.len(), 1);
        assert_eq!(op.parameters.path[0].type_format(), "integer/int64");
        assert_eq!(op.parameters.query[0].name, "verbose");
        assert_eq!(op.operation_id_prefix, "Pets");
        assert_eq!(op.operation_id_action, "Get");
    }

    #[test]
    fn test_sorted_paths_and_methods() {
        let paths = build(
            r##"{"swagger": "2.0", "paths": {
                "/zoo": {"put": {"responses": {}}, "delete": {"responses": {}}, "get": {"responses": {}}},
                "/animals": {"post": {"responses": {}}}
            }}"##,
        );
        let keys: Vec<&str> = paths.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["/animals", "/zoo"]);
        let methods: Vec<HttpMethod> = paths["/zoo"].iter().map(|op| op.method).collect();
        assert_eq!(
            methods,
            vec![HttpMethod::Delete, HttpMethod::Get, HttpMethod::Put]
        );
    }

    #[test]
    fn test_form_data_ignored() {
        let paths = build(
            r##"{"swagger": "2.0", "paths": {"/upload": {"post": {
                "parameters": [
                    {"name": "file", "in": "formData", "type": "file"},
                    {"name": "x-trace", "in": "header", "type": "string"}
                ],
                "responses": {}
            }}}}"##,
        );
        let op = &paths["/upload"][0];
        assert_eq!(op.parameters.len(), 1);
        assert_eq!(op.parameters.header[0].name, "x-trace");
    }

    #[test]
    fn test_response_ref_and_extensions() {
        let paths = build(
            r##"{"swagger": "2.0",
                "responses": {"Error": {"description": "failure", "schema": {"$ref": "#/definitions/Err"}}},
                "definitions": {"Err": {"properties": {"code": {"type": "string"}}}},
                "paths": {"/jobs": {"post": {
                    "x-ms-long-running-operation": true,
                    "x-ms-pageable": {"nextLinkName": "nextLink"},
                    "responses": {
                        "202": {"description": "Accepted", "headers": {"Location": {"type": "string"}}},
                        "default": {"$ref": "#/responses/Error"}
                    }
                }}}
            }"##,
        );
        let op = &paths["/jobs"][0];
        assert!(op.long_running);
        assert_eq!(
            op.pageable.as_ref().and_then(|p| p.next_link_name.as_deref()),
            Some("nextLink")
        );
        assert_eq!(op.responses.len(), 2);
        assert_eq!(op.responses[0].status_code, "202");
        assert!(op.responses[0].headers.contains_key("Location"));
        let error = &op.responses[1];
        assert_eq!(error.description, "failure");
        assert_eq!(
            error.schema.as_ref().and_then(|s| s.ref_name.as_deref()),
            Some("Err")
        );
    }
}

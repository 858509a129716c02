pub mod cache;
pub mod pointer;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, warn};
use serde::Deserialize;

use crate::error::ResolveError;
use crate::loader::{SpecLoader, normalize_path, referenced_path};
use crate::parse::parameter::{Parameter, ParameterOrRef};
use crate::parse::response::{Response, ResponseOrRef};
use crate::parse::schema::{Schema, SchemaOrRef};
use crate::parse::spec::SwaggerSpec;
use crate::view::{
    CompositionKind, ParameterView, ResponseView, SchemaKind, SchemaMeta, SchemaNode,
};

pub use cache::SchemaCache;
use pointer::{RefPointer, RefSection, definition_name};

/// What to do with a `$ref` that cannot be found after in-document, cache and
/// cross-file lookup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedRefPolicy {
    /// Drop the referencing parameter, property or member and keep going.
    #[default]
    Drop,
    /// Abort the pass.
    Fail,
}

/// The definition names on the current resolution path, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefChain(Vec<String>);

impl RefChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves `$ref` pointers across a set of Swagger documents into
/// [`SchemaNode`] trees and [`ParameterView`]s.
///
/// Lookups go in-document first, then through the [`SchemaCache`], then by
/// loading the referenced file through the [`SpecLoader`]. Reference cycles are
/// cut with [`SchemaKind::Reference`] markers.
pub struct RefResolver<'a, L: SpecLoader + ?Sized> {
    cache: &'a mut SchemaCache,
    loader: &'a mut L,
    documents: HashMap<PathBuf, SwaggerSpec>,
    policy: UnresolvedRefPolicy,
}

impl<'a, L: SpecLoader + ?Sized> RefResolver<'a, L> {
    pub fn new(cache: &'a mut SchemaCache, loader: &'a mut L, policy: UnresolvedRefPolicy) -> Self {
        Self {
            cache,
            loader,
            documents: HashMap::new(),
            policy,
        }
    }

    /// Make an already-parsed document available for in-document lookups and
    /// register its definitions and parameters.
    pub fn add_document(&mut self, path: &Path, spec: &SwaggerSpec) {
        let key = normalize_path(path);
        self.cache.register_document(&key, spec);
        self.documents.entry(key).or_insert_with(|| spec.clone());
    }

    pub fn cache(&self) -> &SchemaCache {
        self.cache
    }

    /// Resolve a top-level schema with a fresh reference chain.
    pub fn resolve_root_schema(
        &mut self,
        schema: &SchemaOrRef,
        current_file: &Path,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        self.resolve_schema(schema, current_file, &mut RefChain::new())
    }

    /// Resolve a named definition as its own root, so a self-reference inside it
    /// becomes a marker at the first level.
    pub fn resolve_definition(
        &mut self,
        name: &str,
        schema: &SchemaOrRef,
        current_file: &Path,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        let mut chain = RefChain::new();
        chain.push(name);
        let resolved = self.resolve_schema(schema, current_file, &mut chain)?;
        Ok(resolved.map(|mut node| {
            node.ref_name = Some(name.to_string());
            node
        }))
    }

    /// Fetch a root document, loading and registering it on first use.
    pub fn load_root(&mut self, path: &Path) -> Result<SwaggerSpec, ResolveError> {
        let key = normalize_path(path);
        self.load_document(&key)?;
        Ok(self.documents[&key].clone())
    }

    pub fn resolve_schema(
        &mut self,
        schema: &SchemaOrRef,
        current_file: &Path,
        chain: &mut RefChain,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        match schema {
            SchemaOrRef::Ref { ref_path } => self.resolve_ref(ref_path, current_file, chain),
            SchemaOrRef::Schema(inline) => self
                .resolve_inline(inline, current_file, chain)
                .map(Some),
        }
    }

    fn resolve_ref(
        &mut self,
        ref_path: &str,
        current_file: &Path,
        chain: &mut RefChain,
    ) -> Result<Option<SchemaNode>, ResolveError> {
        let pointer = match RefPointer::parse(ref_path)
            .and_then(|p| p.expect(RefSection::Definitions, ref_path))
        {
            Ok(pointer) => pointer,
            Err(err) => return self.degrade(err),
        };

        if chain.contains(&pointer.name) {
            debug!("cycle on {ref_path}, emitting reference marker");
            return Ok(Some(SchemaNode::reference(pointer.name)));
        }

        let Some((source, target)) = self.lookup_schema(&pointer, current_file)? else {
            return self.degrade(ResolveError::UnresolvedRef(ref_path.to_string()));
        };

        chain.push(pointer.name.clone());
        let resolved = self.resolve_schema(&target, &source, chain);
        chain.pop();

        Ok(resolved?.map(|mut node| {
            node.ref_name = Some(pointer.name);
            node
        }))
    }

    fn resolve_inline(
        &mut self,
        schema: &Schema,
        current_file: &Path,
        chain: &mut RefChain,
    ) -> Result<SchemaNode, ResolveError> {
        let meta = SchemaMeta {
            description: schema.description.clone(),
            format: schema.format.clone(),
            read_only: schema.read_only.unwrap_or(false),
            write_only: schema.write_only.unwrap_or(false),
            nullable: schema.ms_nullable.unwrap_or(false),
            discriminator: schema.discriminator.clone(),
            discriminator_value: schema.discriminator_value.clone(),
        };

        let kind = if let Some((composition, members)) = composition_of(schema) {
            self.resolve_composition(composition, members, schema, current_file, chain)?
        } else if !schema.enum_values.is_empty() {
            SchemaKind::Enum {
                base_type: enum_base_type(schema),
                values: schema.enum_values.clone(),
                ms_enum: schema.ms_enum.clone(),
            }
        } else if let Some(items) = &schema.items {
            let resolved = self.resolve_schema(items, current_file, chain)?;
            let items = resolved.unwrap_or_else(|| unresolved_marker(items));
            SchemaKind::Array {
                items: Box::new(items),
            }
        } else if !schema.properties.is_empty() {
            SchemaKind::Object {
                properties: self.resolve_properties(&schema.properties, current_file, chain)?,
                required: schema.required.clone(),
            }
        } else {
            let type_name = schema.schema_type.map(|t| t.as_str()).unwrap_or_default();
            SchemaKind::Primitive {
                type_name: type_name.to_string(),
            }
        };

        Ok(SchemaNode {
            ref_name: None,
            meta,
            kind,
        })
    }

    fn resolve_properties(
        &mut self,
        properties: &IndexMap<String, SchemaOrRef>,
        current_file: &Path,
        chain: &mut RefChain,
    ) -> Result<IndexMap<String, SchemaNode>, ResolveError> {
        let mut resolved = IndexMap::with_capacity(properties.len());
        for (name, prop) in properties {
            if let Some(node) = self.resolve_schema(prop, current_file, chain)? {
                resolved.insert(name.clone(), node);
            }
        }
        Ok(resolved)
    }

    /// Resolve composition members and, for `allOf`, merge their properties
    /// into one bag. The composing schema's own properties come last.
    fn resolve_composition(
        &mut self,
        composition: CompositionKind,
        members: &[SchemaOrRef],
        schema: &Schema,
        current_file: &Path,
        chain: &mut RefChain,
    ) -> Result<SchemaKind, ResolveError> {
        let mut names = Vec::with_capacity(members.len());
        let mut properties = IndexMap::new();
        let mut required: Vec<String> = Vec::new();

        for member in members {
            let Some(node) = self.resolve_schema(member, current_file, chain)? else {
                continue;
            };
            names.push(node.type_name().to_string());
            if composition != CompositionKind::AllOf {
                continue;
            }
            if let Some((member_props, member_required)) = node.into_properties() {
                properties.extend(member_props);
                for name in member_required {
                    if !required.contains(&name) {
                        required.push(name);
                    }
                }
            }
        }

        properties.extend(self.resolve_properties(&schema.properties, current_file, chain)?);
        for name in &schema.required {
            if !required.contains(name) {
                required.push(name.clone());
            }
        }

        Ok(SchemaKind::Composition {
            composition,
            members: names,
            properties,
            required,
        })
    }

    /// Resolve a parameter, following a `$ref` if needed. Returns `None` when
    /// the parameter was dropped under [`UnresolvedRefPolicy::Drop`].
    pub fn resolve_parameter(
        &mut self,
        param: &ParameterOrRef,
        current_file: &Path,
    ) -> Result<Option<ParameterView>, ResolveError> {
        match param {
            ParameterOrRef::Parameter(parameter) => {
                self.parameter_view(parameter, current_file, None)
            }
            ParameterOrRef::Ref { ref_path } => {
                let pointer = match RefPointer::parse(ref_path)
                    .and_then(|p| p.expect(RefSection::Parameters, ref_path))
                {
                    Ok(pointer) => pointer,
                    Err(err) => return self.degrade(err),
                };
                match self.lookup_parameter(&pointer, current_file)? {
                    Some((source, parameter)) => {
                        self.parameter_view(&parameter, &source, Some(ref_path.clone()))
                    }
                    None => self.degrade(ResolveError::UnresolvedRef(ref_path.clone())),
                }
            }
        }
    }

    fn parameter_view(
        &mut self,
        parameter: &Parameter,
        source: &Path,
        ref_path: Option<String>,
    ) -> Result<Option<ParameterView>, ResolveError> {
        let schema = match (&parameter.schema, &parameter.items) {
            (Some(schema), _) => match self.resolve_root_schema(schema, source)? {
                Some(node) => Some(node),
                // The body schema is gone, so the parameter goes with it.
                None => return Ok(None),
            },
            (None, Some(items)) => self.resolve_root_schema(items, source)?,
            (None, None) => None,
        };

        Ok(Some(ParameterView {
            name: parameter.name.clone(),
            location: parameter.location,
            description: parameter.description.clone(),
            required: parameter.required,
            param_type: parameter.param_type.map(|t| t.as_str().to_string()),
            format: parameter.format.clone(),
            schema,
            ref_path,
        }))
    }

    /// Resolve a response and its schema. The schema always starts from a
    /// fresh reference chain.
    pub fn resolve_response(
        &mut self,
        status_code: &str,
        response: &ResponseOrRef,
        current_file: &Path,
    ) -> Result<Option<ResponseView>, ResolveError> {
        let (source, response) = match response {
            ResponseOrRef::Response(r) => (current_file.to_path_buf(), r.clone()),
            ResponseOrRef::Ref { ref_path } => {
                let pointer = match RefPointer::parse(ref_path)
                    .and_then(|p| p.expect(RefSection::Responses, ref_path))
                {
                    Ok(pointer) => pointer,
                    Err(err) => return self.degrade(err),
                };
                match self.lookup_response(&pointer, current_file)? {
                    Some(found) => found,
                    None => {
                        return self.degrade(ResolveError::UnresolvedRef(ref_path.clone()));
                    }
                }
            }
        };

        let schema = match &response.schema {
            Some(schema) => self.resolve_root_schema(schema, &source)?,
            None => None,
        };

        Ok(Some(ResponseView {
            status_code: status_code.to_string(),
            description: response.description,
            schema,
            headers: response.headers,
        }))
    }

    // Lookup helpers

    fn lookup_schema(
        &mut self,
        pointer: &RefPointer<'_>,
        current_file: &Path,
    ) -> Result<Option<(PathBuf, SchemaOrRef)>, ResolveError> {
        if pointer.file.is_none() {
            let local = self
                .documents
                .get(current_file)
                .and_then(|doc| doc.definitions.get(&pointer.name));
            if let Some(schema) = local {
                return Ok(Some((current_file.to_path_buf(), schema.clone())));
            }
        }

        let cached = |cache: &SchemaCache| {
            cache
                .get_schema(&pointer.name)
                .map(|entry| (entry.source.clone(), entry.schema.clone()))
        };
        if let Some(found) = cached(&*self.cache) {
            return Ok(Some(found));
        }
        if let Some(file) = pointer.file {
            if self.load_document(&referenced_path(current_file, file))? {
                return Ok(cached(&*self.cache));
            }
        }
        Ok(None)
    }

    fn lookup_parameter(
        &mut self,
        pointer: &RefPointer<'_>,
        current_file: &Path,
    ) -> Result<Option<(PathBuf, Parameter)>, ResolveError> {
        if pointer.file.is_none() {
            let local = self
                .documents
                .get(current_file)
                .and_then(|doc| doc.parameters.get(&pointer.name));
            if let Some(parameter) = local {
                return Ok(Some((current_file.to_path_buf(), parameter.clone())));
            }
        }

        let cached = |cache: &SchemaCache| {
            cache
                .get_parameter(&pointer.name)
                .map(|entry| (entry.source.clone(), entry.parameter.clone()))
        };
        if let Some(found) = cached(&*self.cache) {
            return Ok(Some(found));
        }
        if let Some(file) = pointer.file {
            if self.load_document(&referenced_path(current_file, file))? {
                return Ok(cached(&*self.cache));
            }
        }
        Ok(None)
    }

    /// Responses are not cached by name; they are looked up in the document
    /// the pointer names.
    fn lookup_response(
        &mut self,
        pointer: &RefPointer<'_>,
        current_file: &Path,
    ) -> Result<Option<(PathBuf, Response)>, ResolveError> {
        let target = match pointer.file {
            Some(file) => referenced_path(current_file, file),
            None => current_file.to_path_buf(),
        };
        self.load_document(&target)?;
        Ok(self
            .documents
            .get(&target)
            .and_then(|doc| doc.responses.get(&pointer.name))
            .map(|response| (target.clone(), response.clone())))
    }

    /// Load a document through the loader and register it. Returns `false` if
    /// it was already known.
    fn load_document(&mut self, path: &Path) -> Result<bool, ResolveError> {
        if self.documents.contains_key(path) {
            return Ok(false);
        }
        debug!("loading referenced document {}", path.display());
        let spec = self
            .loader
            .load(path)
            .map_err(|source| ResolveError::Load {
                path: path.to_path_buf(),
                source,
            })?;
        self.cache.register_document(path, &spec);
        self.documents.insert(path.to_path_buf(), spec);
        Ok(true)
    }

    fn degrade<T>(&self, err: ResolveError) -> Result<Option<T>, ResolveError> {
        match self.policy {
            UnresolvedRefPolicy::Fail => Err(err),
            UnresolvedRefPolicy::Drop => {
                warn!("{err}; dropping it");
                Ok(None)
            }
        }
    }
}

fn composition_of(schema: &Schema) -> Option<(CompositionKind, &[SchemaOrRef])> {
    if !schema.all_of.is_empty() {
        Some((CompositionKind::AllOf, &schema.all_of))
    } else if !schema.any_of.is_empty() {
        Some((CompositionKind::AnyOf, &schema.any_of))
    } else if !schema.one_of.is_empty() {
        Some((CompositionKind::OneOf, &schema.one_of))
    } else {
        None
    }
}

fn enum_base_type(schema: &Schema) -> String {
    if let Some(t) = schema.schema_type {
        return t.as_str().to_string();
    }
    let inferred = match schema.enum_values.first() {
        Some(serde_json::Value::Number(n)) if n.is_f64() => "number",
        Some(serde_json::Value::Number(_)) => "integer",
        Some(serde_json::Value::Bool(_)) => "boolean",
        _ => "string",
    };
    inferred.to_string()
}

/// Placeholder for array items whose reference was dropped.
fn unresolved_marker(items: &SchemaOrRef) -> SchemaNode {
    match items {
        SchemaOrRef::Ref { ref_path } => SchemaNode::reference(definition_name(ref_path)),
        SchemaOrRef::Schema(_) => SchemaNode::primitive("object"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use crate::parse;

    fn resolve_definition(json: &str, name: &str) -> SchemaNode {
        let spec = parse::from_json(json).unwrap();
        let mut cache = SchemaCache::new();
        let mut loader = MemoryLoader::new();
        let mut resolver = RefResolver::new(&mut cache, &mut loader, UnresolvedRefPolicy::Drop);
        resolver.add_document(Path::new("spec.json"), &spec);
        let reference = SchemaOrRef::Ref {
            ref_path: format!("#/definitions/{name}"),
        };
        resolver
            .resolve_root_schema(&reference, Path::new("spec.json"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_self_reference_becomes_marker() {
        let node = resolve_definition(
            r##"{"swagger": "2.0", "definitions": {
                "Node": {"type": "object", "properties": {"next": {"$ref": "#/definitions/Node"}}}
            }}"##,
            "Node",
        );
        assert_eq!(node.ref_name.as_deref(), Some("Node"));
        let (props, _) = node.properties().unwrap();
        assert_eq!(props["next"], SchemaNode::reference("Node"));
    }

    #[test]
    fn test_mutual_reference_expands_once() {
        let node = resolve_definition(
            r##"{"swagger": "2.0", "definitions": {
                "A": {"properties": {"b": {"$ref": "#/definitions/B"}}},
                "B": {"properties": {"a": {"$ref": "#/definitions/A"}}}
            }}"##,
            "A",
        );
        let (a_props, _) = node.properties().unwrap();
        let b = &a_props["b"];
        assert_eq!(b.ref_name.as_deref(), Some("B"));
        let (b_props, _) = b.properties().unwrap();
        assert!(b_props["a"].is_reference());
    }

    #[test]
    fn test_sibling_reuse_is_expanded() {
        let node = resolve_definition(
            r##"{"swagger": "2.0", "definitions": {
                "Pair": {"properties": {
                    "left": {"$ref": "#/definitions/Leaf"},
                    "right": {"$ref": "#/definitions/Leaf"}
                }},
                "Leaf": {"properties": {"v": {"type": "string"}}}
            }}"##,
            "Pair",
        );
        let (props, _) = node.properties().unwrap();
        assert!(props["left"].has_properties());
        assert!(props["right"].has_properties());
    }

    #[test]
    fn test_all_of_merges_member_properties() {
        let node = resolve_definition(
            r##"{"swagger": "2.0", "definitions": {
                "Animal": {"properties": {"legs": {"type": "integer"}}, "required": ["legs"]},
                "Pet": {"allOf": [
                    {"$ref": "#/definitions/Animal"},
                    {"properties": {"name": {"type": "string"}}}
                ]}
            }}"##,
            "Pet",
        );
        match &node.kind {
            SchemaKind::Composition {
                composition,
                members,
                properties,
                required,
            } => {
                assert_eq!(*composition, CompositionKind::AllOf);
                assert_eq!(members, &vec!["Animal".to_string(), "object".to_string()]);
                let names: Vec<&str> = properties.keys().map(String::as_str).collect();
                assert_eq!(names, vec!["legs", "name"]);
                assert_eq!(required, &vec!["legs".to_string()]);
            }
            other => panic!("expected composition, got {other:?}"),
        }
    }

    #[test]
    fn test_unresolved_property_is_dropped() {
        let node = resolve_definition(
            r##"{"swagger": "2.0", "definitions": {
                "Pet": {"properties": {
                    "name": {"type": "string"},
                    "owner": {"$ref": "#/definitions/Missing"}
                }}
            }}"##,
            "Pet",
        );
        let (props, _) = node.properties().unwrap();
        assert_eq!(props.len(), 1);
        assert!(props.contains_key("name"));
    }

    #[test]
    fn test_unresolved_fails_under_fail_policy() {
        let spec = parse::from_json(
            r##"{"swagger": "2.0", "definitions": {
                "Pet": {"properties": {"owner": {"$ref": "#/definitions/Missing"}}}
            }}"##,
        )
        .unwrap();
        let mut cache = SchemaCache::new();
        let mut loader = MemoryLoader::new();
        let mut resolver = RefResolver::new(&mut cache, &mut loader, UnresolvedRefPolicy::Fail);
        resolver.add_document(Path::new("spec.json"), &spec);
        let err = resolver
            .resolve_root_schema(
                &SchemaOrRef::Ref {
                    ref_path: "#/definitions/Pet".to_string(),
                },
                Path::new("spec.json"),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::UnresolvedRef(r) if r == "#/definitions/Missing"));
    }

    #[test]
    fn test_cross_file_parameter_loads_once() {
        let root = parse::from_json(r##"{"swagger": "2.0", "paths": {}}"##).unwrap();
        let mut loader = MemoryLoader::new().with_file(
            "common/types.json",
            r##"{"swagger": "2.0", "parameters": {
                "ApiVersion": {"name": "api-version", "in": "query", "required": true, "type": "string"},
                "Top": {"name": "$top", "in": "query", "type": "integer", "format": "int32"}
            }}"##,
        );
        let mut cache = SchemaCache::new();
        let mut resolver = RefResolver::new(&mut cache, &mut loader, UnresolvedRefPolicy::Fail);
        resolver.add_document(Path::new("service/api.json"), &root);

        let current = Path::new("service/api.json");
        let version = resolver
            .resolve_parameter(
                &ParameterOrRef::Ref {
                    ref_path: "../common/types.json#/parameters/ApiVersion".to_string(),
                },
                current,
            )
            .unwrap()
            .unwrap();
        assert_eq!(version.name, "api-version");
        assert!(version.required);

        // Already registered by the first load.
        let top = resolver
            .resolve_parameter(
                &ParameterOrRef::Ref {
                    ref_path: "../common/types.json#/parameters/Top".to_string(),
                },
                current,
            )
            .unwrap()
            .unwrap();
        assert_eq!(top.type_format(), "integer/int32");
        assert_eq!(resolver.cache().parameter_count(), 2);
    }

    #[test]
    fn test_missing_referenced_file_is_hard_failure() {
        let root = parse::from_json(r##"{"swagger": "2.0"}"##).unwrap();
        let mut loader = MemoryLoader::new();
        let mut cache = SchemaCache::new();
        let mut resolver = RefResolver::new(&mut cache, &mut loader, UnresolvedRefPolicy::Drop);
        resolver.add_document(Path::new("api.json"), &root);
        let err = resolver
            .resolve_root_schema(
                &SchemaOrRef::Ref {
                    ref_path: "nowhere.json#/definitions/Thing".to_string(),
                },
                Path::new("api.json"),
            )
            .unwrap_err();
        assert!(matches!(err, ResolveError::Load { .. }));
    }
}

use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::{debug, info};

use crate::config::GenerateOptions;
use crate::error::GenerateError;
use crate::loader::{SpecLoader, normalize_path};
use crate::parse::parameter::ParameterOrRef;
use crate::parse::spec::SwaggerSpec;
use crate::resolve::{RefResolver, SchemaCache, UnresolvedRefPolicy};
use crate::view::{ApiViewGeneral, ApiViewSpec, ParameterView, ParameterizedHostView, SchemaNode};

use super::operation_builder::{build_operations, resolve_parameter_list};

/// Build the API view of one already-parsed root document.
///
/// Returns `None` for a document without paths; its definitions and parameters
/// still land in `cache`.
pub fn generate_api_view<L: SpecLoader + ?Sized>(
    spec: &SwaggerSpec,
    spec_path: &Path,
    cache: &mut SchemaCache,
    loader: &mut L,
    options: &GenerateOptions,
) -> Result<Option<ApiViewSpec>, GenerateError> {
    let mut resolver = RefResolver::new(cache, loader, options.unresolved_refs);
    let spec_path = normalize_path(spec_path);
    resolver.add_document(&spec_path, spec);
    build_view(&mut resolver, spec, &spec_path, options)
}

/// Build API views for several root documents sharing one cache and one set of
/// loaded documents. Documents without paths are skipped.
pub fn generate_files<L: SpecLoader + ?Sized>(
    paths: &[PathBuf],
    loader: &mut L,
    options: &GenerateOptions,
) -> Result<Vec<ApiViewSpec>, GenerateError> {
    let mut cache = SchemaCache::new();
    let mut resolver = RefResolver::new(&mut cache, loader, options.unresolved_refs);
    let roots = load_roots(&mut resolver, paths)?;

    let mut views = Vec::with_capacity(roots.len());
    for (spec_path, spec) in &roots {
        match build_view(&mut resolver, spec, spec_path, options)? {
            Some(view) => views.push(view),
            None => debug!("{} has no paths, skipping", spec_path.display()),
        }
    }

    info!(
        "generated {} view(s) from {} input(s), {} definitions cached",
        views.len(),
        paths.len(),
        resolver.cache().schema_count()
    );
    Ok(views)
}

/// Check that every reference reachable from the given documents resolves.
///
/// Unlike [`generate_files`], definitions and global parameters of documents
/// without paths are resolved too, and any unresolved `$ref` is an error.
/// Returns the views of the documents that have paths.
pub fn validate_files<L: SpecLoader + ?Sized>(
    paths: &[PathBuf],
    loader: &mut L,
) -> Result<Vec<ApiViewSpec>, GenerateError> {
    let options = GenerateOptions {
        unresolved_refs: UnresolvedRefPolicy::Fail,
        ..GenerateOptions::default()
    };
    let mut cache = SchemaCache::new();
    let mut resolver = RefResolver::new(&mut cache, loader, options.unresolved_refs);
    let roots = load_roots(&mut resolver, paths)?;

    let mut views = Vec::new();
    for (spec_path, spec) in &roots {
        match build_view(&mut resolver, spec, spec_path, &options)? {
            Some(view) => views.push(view),
            None => {
                let (definitions, parameters) =
                    resolve_components(&mut resolver, spec, spec_path)?;
                info!(
                    "{}: {} definitions, {} global parameters resolved",
                    spec_path.display(),
                    definitions.len(),
                    parameters.len()
                );
            }
        }
    }
    Ok(views)
}

/// Load and register every root before building any view, so that cross-root
/// references hit the cache in input order.
fn load_roots<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    paths: &[PathBuf],
) -> Result<Vec<(PathBuf, SwaggerSpec)>, GenerateError> {
    let mut roots = Vec::with_capacity(paths.len());
    for path in paths {
        let spec_path = normalize_path(path);
        let spec = resolver.load_root(&spec_path)?;
        roots.push((spec_path, spec));
    }
    Ok(roots)
}

/// Resolve a document's definitions and global parameters.
fn resolve_components<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    spec: &SwaggerSpec,
    spec_path: &Path,
) -> Result<(IndexMap<String, SchemaNode>, IndexMap<String, ParameterView>), GenerateError> {
    let mut definitions = IndexMap::with_capacity(spec.definitions.len());
    for (name, schema) in &spec.definitions {
        if let Some(node) = resolver.resolve_definition(name, schema, spec_path)? {
            definitions.insert(name.clone(), node);
        }
    }

    let mut global_parameters = IndexMap::with_capacity(spec.parameters.len());
    for (name, parameter) in &spec.parameters {
        let param = ParameterOrRef::Parameter(Box::new(parameter.clone()));
        if let Some(view) = resolver.resolve_parameter(&param, spec_path)? {
            global_parameters.insert(name.clone(), view);
        }
    }
    Ok((definitions, global_parameters))
}

fn build_view<L: SpecLoader + ?Sized>(
    resolver: &mut RefResolver<'_, L>,
    spec: &SwaggerSpec,
    spec_path: &Path,
    options: &GenerateOptions,
) -> Result<Option<ApiViewSpec>, GenerateError> {
    if spec.paths.is_empty() {
        return Ok(None);
    }

    let parameterized_host = match &spec.ms_parameterized_host {
        Some(host) => Some(ParameterizedHostView {
            host_template: host.host_template.clone(),
            use_scheme_prefix: host.use_scheme_prefix,
            position_in_operation: host.position_in_operation.clone(),
            parameters: resolve_parameter_list(resolver, &host.parameters, spec_path)?,
        }),
        None => None,
    };

    let general = ApiViewGeneral {
        swagger: spec.swagger.clone(),
        info: spec.info.clone(),
        host: spec.host.clone(),
        base_path: spec.base_path.clone(),
        schemes: spec.schemes.clone(),
        consumes: spec.consumes.clone(),
        produces: spec.produces.clone(),
        security: spec.security.clone(),
        security_definitions: spec.security_definitions.clone(),
        parameterized_host,
        swagger_link: options.swagger_link.clone(),
    };

    let paths = build_operations(resolver, spec, spec_path)?;

    let (definitions, global_parameters) = resolve_components(resolver, spec, spec_path)?;

    let file_name = spec_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let package_name = options
        .package_name
        .clone()
        .unwrap_or_else(|| spec.info.title.clone());

    let view = ApiViewSpec {
        file_name,
        package_name,
        general,
        paths,
        definitions,
        global_parameters,
    };
    info!(
        "{}: {} operations, {} definitions, {} global parameters",
        spec_path.display(),
        view.operations().count(),
        view.definitions.len(),
        view.global_parameters.len()
    );
    Ok(Some(view))
}

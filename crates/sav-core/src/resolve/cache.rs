use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use crate::parse::parameter::Parameter;
use crate::parse::schema::SchemaOrRef;
use crate::parse::spec::SwaggerSpec;

/// A named definition and the file it was first registered from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedSchema {
    pub source: PathBuf,
    pub schema: SchemaOrRef,
}

/// A named global parameter and the file it was first registered from.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedParameter {
    pub source: PathBuf,
    pub parameter: Parameter,
}

/// Definitions and global parameters of every document touched by one
/// generation pass, keyed by name.
///
/// Registration is first-wins: once a name is present, later documents that
/// declare the same name are ignored.
#[derive(Debug, Default, Clone)]
pub struct SchemaCache {
    schemas: IndexMap<String, CachedSchema>,
    parameters: IndexMap<String, CachedParameter>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the definition was added.
    pub fn add_schema(&mut self, source: &Path, name: &str, schema: &SchemaOrRef) -> bool {
        if let Some(existing) = self.schemas.get(name) {
            if existing.source != source {
                debug!(
                    "definition {name} from {} shadowed by {}",
                    source.display(),
                    existing.source.display()
                );
            }
            return false;
        }
        self.schemas.insert(
            name.to_string(),
            CachedSchema {
                source: source.to_path_buf(),
                schema: schema.clone(),
            },
        );
        true
    }

    /// Returns `true` if the parameter was added.
    pub fn add_parameter(&mut self, source: &Path, name: &str, parameter: &Parameter) -> bool {
        if let Some(existing) = self.parameters.get(name) {
            if existing.source != source {
                debug!(
                    "parameter {name} from {} shadowed by {}",
                    source.display(),
                    existing.source.display()
                );
            }
            return false;
        }
        self.parameters.insert(
            name.to_string(),
            CachedParameter {
                source: source.to_path_buf(),
                parameter: parameter.clone(),
            },
        );
        true
    }

    /// Register every definition and global parameter of a document. Returns
    /// how many new entries were added.
    pub fn register_document(&mut self, source: &Path, spec: &SwaggerSpec) -> usize {
        let mut added = 0;
        for (name, schema) in &spec.definitions {
            added += usize::from(self.add_schema(source, name, schema));
        }
        for (name, parameter) in &spec.parameters {
            added += usize::from(self.add_parameter(source, name, parameter));
        }
        debug!("registered {added} entries from {}", source.display());
        added
    }

    pub fn get_schema(&self, name: &str) -> Option<&CachedSchema> {
        self.schemas.get(name)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&CachedParameter> {
        self.parameters.get(name)
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::schema::{Schema, SchemaType};

    fn string_schema(description: &str) -> SchemaOrRef {
        SchemaOrRef::Schema(Box::new(Schema {
            schema_type: Some(SchemaType::String),
            description: Some(description.to_string()),
            ..Schema::default()
        }))
    }

    #[test]
    fn test_first_registration_wins() {
        let mut cache = SchemaCache::new();
        assert!(cache.add_schema(Path::new("a.json"), "Widget", &string_schema("first")));
        assert!(!cache.add_schema(Path::new("b.json"), "Widget", &string_schema("second")));

        let entry = cache.get_schema("Widget").unwrap();
        assert_eq!(entry.source, PathBuf::from("a.json"));
        assert_eq!(entry.schema, string_schema("first"));
        assert_eq!(cache.schema_count(), 1);
    }

    #[test]
    fn test_register_document_counts_new_entries() {
        let spec: SwaggerSpec = serde_json::from_str(
            r##"{
                "swagger": "2.0",
                "info": {"title": "t", "version": "1"},
                "definitions": {"A": {"type": "string"}, "B": {"type": "integer"}},
                "parameters": {"P": {"name": "p", "in": "query", "type": "string"}}
            }"##,
        )
        .unwrap();
        let mut cache = SchemaCache::new();
        assert_eq!(cache.register_document(Path::new("x.json"), &spec), 3);
        assert_eq!(cache.register_document(Path::new("y.json"), &spec), 0);
        assert_eq!(cache.parameter_count(), 1);
        assert_eq!(
            cache.get_parameter("P").unwrap().source,
            PathBuf::from("x.json")
        );
    }
}

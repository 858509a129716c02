use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ParseError;
use crate::parse::{self, spec::SwaggerSpec};

/// Source of Swagger documents for a generation pass.
///
/// The resolver calls this synchronously whenever a cross-file `$ref` points at
/// a document it has not seen yet. Implementations may cache; the resolver
/// already asks for each path at most once per pass.
pub trait SpecLoader {
    fn load(&mut self, path: &Path) -> Result<SwaggerSpec, ParseError>;
}

/// Loads documents from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsLoader;

impl SpecLoader for FsLoader {
    fn load(&mut self, path: &Path) -> Result<SwaggerSpec, ParseError> {
        load_spec_file(path)
    }
}

/// Serves documents from memory, keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemoryLoader {
    files: HashMap<PathBuf, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        self.files
            .insert(normalize_path(path.as_ref()), content.into());
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }
}

impl SpecLoader for MemoryLoader {
    fn load(&mut self, path: &Path) -> Result<SwaggerSpec, ParseError> {
        let key = normalize_path(path);
        let content = self.files.get(&key).ok_or_else(|| ParseError::Io {
            path: key.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such document"),
        })?;
        parse_by_extension(&key, content)
    }
}

/// Read and parse a spec file, choosing YAML or JSON by extension.
pub fn load_spec_file(path: &Path) -> Result<SwaggerSpec, ParseError> {
    let content = fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_by_extension(path, &content)
}

fn parse_by_extension(path: &Path, content: &str) -> Result<SwaggerSpec, ParseError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => parse::from_yaml(content),
        _ => parse::from_json(content),
    }
}

/// Resolve the file part of a cross-file `$ref` against the document that
/// contains it. Absolute references are used as-is.
pub fn referenced_path(current_file: &Path, reference: &str) -> PathBuf {
    let reference = Path::new(reference);
    if reference.is_absolute() {
        return normalize_path(reference);
    }
    let base = current_file.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(reference))
}

/// Fold `.` and `..` components without touching the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(
                    out.components().next_back(),
                    Some(Component::Normal(_))
                ) && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("specs/./a/../common.json")),
            PathBuf::from("specs/common.json")
        );
        assert_eq!(
            normalize_path(Path::new("../shared/types.json")),
            PathBuf::from("../shared/types.json")
        );
        assert_eq!(
            normalize_path(Path::new("/root/../etc/x.json")),
            PathBuf::from("/etc/x.json")
        );
    }

    #[test]
    fn test_referenced_path() {
        let current = Path::new("specs/stable/2024-01-01/pets.json");
        assert_eq!(
            referenced_path(current, "../../common/types.json"),
            PathBuf::from("specs/common/types.json")
        );
        assert_eq!(
            referenced_path(current, "./pets-models.json"),
            PathBuf::from("specs/stable/2024-01-01/pets-models.json")
        );
        assert_eq!(
            referenced_path(Path::new("pets.json"), "types.json"),
            PathBuf::from("types.json")
        );
    }

    #[test]
    fn test_memory_loader_missing_file() {
        let mut loader = MemoryLoader::new();
        let err = loader.load(Path::new("missing.json")).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
    }

    #[test]
    fn test_memory_loader_yaml() {
        let mut loader = MemoryLoader::new().with_file(
            "spec.yaml",
            "swagger: \"2.0\"\ninfo:\n  title: T\n  version: \"1\"\npaths: {}\n",
        );
        let spec = loader.load(Path::new("./spec.yaml")).unwrap();
        assert_eq!(spec.info.title, "T");
    }
}

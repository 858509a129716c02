use std::fs;
use std::path::Path;

use serde::Deserialize;

pub use crate::resolve::UnresolvedRefPolicy;

/// Top-level project configuration loaded from `.sav.yaml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SavConfig {
    /// Root Swagger documents, in output order.
    pub inputs: Vec<String>,
    /// Where the code file JSON is written.
    pub output: String,
    /// Package name shown in the view (defaults to the first input's title).
    pub package_name: Option<String>,
    /// Link back to the source document, shown in the General section.
    pub swagger_link: Option<String>,
    pub unresolved_refs: UnresolvedRefPolicy,
}

impl Default for SavConfig {
    fn default() -> Self {
        Self {
            inputs: vec!["swagger.json".to_string()],
            output: "apiview.json".to_string(),
            package_name: None,
            swagger_link: None,
            unresolved_refs: UnresolvedRefPolicy::Drop,
        }
    }
}

impl SavConfig {
    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            package_name: self.package_name.clone(),
            swagger_link: self.swagger_link.clone(),
            unresolved_refs: self.unresolved_refs,
        }
    }
}

/// Settings for one generation pass. Built once and passed by reference to
/// every entry point; nothing mutates it during the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    pub package_name: Option<String>,
    pub swagger_link: Option<String>,
    pub unresolved_refs: UnresolvedRefPolicy,
}

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = ".sav.yaml";

/// Load config from a YAML file. Returns `None` if the file doesn't exist.
pub fn load_config(path: &Path) -> Result<Option<SavConfig>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config: SavConfig = serde_yaml_ng::from_str(&content)
        .map_err(|e| format!("failed to parse config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

/// Generate the default config file content.
pub fn default_config_content() -> &'static str {
    r#"# sav configuration
inputs:
  - swagger.json
  # - specs/stable/2024-01-01/other.json
output: apiview.json

# package_name: Microsoft.Pets      # defaults to the first input's info.title
# swagger_link: https://github.com/you/your-specs/blob/main/swagger.json

unresolved_refs: drop   # drop | fail
"#
}

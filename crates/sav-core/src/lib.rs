pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod parse;
pub mod resolve;
pub mod transform;
pub mod view;

pub use config::GenerateOptions;
pub use loader::{FsLoader, MemoryLoader, SpecLoader};
pub use output::CodeFile;
pub use transform::{generate_api_view, generate_files, validate_files};

pub mod flatten;
pub mod generator;
pub mod operation_builder;

pub use flatten::{Flattened, SerializeContext, flatten};
pub use generator::{generate_api_view, generate_files, validate_files};
pub use operation_builder::build_operations;

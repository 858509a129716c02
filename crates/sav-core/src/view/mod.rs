pub mod operations;
pub mod schema;
pub mod spec;

pub use operations::*;
pub use schema::{CompositionKind, SchemaKind, SchemaMeta, SchemaNode};
pub use spec::{ApiViewGeneral, ApiViewSpec, ParameterizedHostView};

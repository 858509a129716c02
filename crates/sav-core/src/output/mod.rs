pub mod code_file;
pub mod navigation;
pub mod table;
pub mod tokens;

pub use code_file::CodeFile;
pub use navigation::{IteratorPath, Navigable, NavigationItem, TypeKind};
pub use table::TableRow;
pub use tokens::{Token, TokenKind};

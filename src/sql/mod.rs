pub mod identifier;
mod keywords;
pub mod table_name;

pub use identifier::{init, registry, Identifier, IdentifierRegistry, MAX_IDENTIFIER};
pub use table_name::TableName;

use crate::sql::identifier::Identifier;
use std::fmt;

/// Fully-qualified table name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TableName {
    pub database: Identifier,
    pub schema: Identifier,
    pub table: Identifier,
}

impl TableName {
    pub fn new(database: Identifier, schema: Identifier, table: Identifier) -> TableName {
        TableName {
            database,
            schema,
            table,
        }
    }

    /// Key the lock table files this table under, e.g. `table db.public.tbl1`.
    pub fn resource_key(&self) -> String {
        format!("table {}", self)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.table)
    }
}

#[cfg(test)]
mod tests {
    use crate::sql::{Identifier, TableName};

    #[test]
    fn test_resource_key() {
        let name = TableName::new(
            Identifier::new("db", false),
            Identifier::PUBLIC,
            Identifier::new("TBL1", false),
        );
        assert_eq!(name.resource_key(), "table db.public.tbl1");

        let quoted = TableName::new(
            Identifier::new("db", false),
            Identifier::PUBLIC,
            Identifier::new("Tbl1", true),
        );
        assert_eq!(quoted.resource_key(), "table db.public.Tbl1");
        assert_ne!(quoted.resource_key(), name.resource_key());

        let system = TableName::new(
            Identifier::SYSTEM,
            Identifier::INFO,
            Identifier::new("identifiers", false),
        );
        assert_eq!(system.to_string(), "system.info.identifiers");
    }
}

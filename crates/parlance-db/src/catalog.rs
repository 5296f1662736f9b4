//! The fixed set of tables and views the assistant may query.

use parlance_core::{TableKind, TableSpec};

use crate::error::DbError;

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tables: Vec<TableSpec>,
}

impl Catalog {
    pub fn new(tables: Vec<TableSpec>) -> Self {
        Self { tables }
    }

    pub fn get(&self, name: &str) -> Option<&TableSpec> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Look up `name`, failing with [`DbError::UnknownTable`] if absent.
    pub fn require(&self, name: &str) -> Result<&TableSpec, DbError> {
        self.get(name)
            .ok_or_else(|| DbError::UnknownTable(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter().filter(|t| t.kind == TableKind::Table)
    }

    pub fn views(&self) -> impl Iterator<Item = &TableSpec> {
        self.tables.iter().filter(|t| t.kind == TableKind::View)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parlance_core::config::DatabaseConfig;

    #[test]
    fn test_default_catalog_split() {
        let catalog = Catalog::new(DatabaseConfig::default().tables);
        assert_eq!(catalog.tables().count(), 4);
        assert_eq!(catalog.views().count(), 1);
        assert!(catalog.get("orders").is_some());
        assert!(catalog.names().contains(&"monthly_revenue"));
    }

    #[test]
    fn test_require_unknown_table() {
        let catalog = Catalog::new(DatabaseConfig::default().tables);
        let err = catalog.require("pg_shadow").unwrap_err();
        assert!(matches!(err, DbError::UnknownTable(ref n) if n == "pg_shadow"));
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::default();
        assert!(catalog.is_empty());
        assert!(catalog.require("orders").is_err());
    }
}

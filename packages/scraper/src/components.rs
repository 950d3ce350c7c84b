//! Keyed registry of extraction components.
//!
//! Jurisdiction configs name their view, table, row, and form
//! implementations by string key; this registry maps those keys to
//! concrete schemas. Registration happens once at startup in the family
//! modules, and [`ComponentRegistry::validate`] checks every key a
//! config references before any page is fetched, so a typo surfaces as
//! a startup error instead of a mid-scrape failure.

use std::collections::HashMap;

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::form::FormSchema;
use crate::table::{RowSchema, TableSchema};
use crate::views::{DetailSchema, SearchSchema};

/// Registered schemas, one map per component role.
///
/// Re-registering a key replaces the earlier entry, so jurisdiction
/// setup code can override a family default.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    searches: HashMap<String, SearchSchema>,
    details: HashMap<String, DetailSchema>,
    tables: HashMap<String, TableSchema>,
    rows: HashMap<String, RowSchema>,
    forms: HashMap<String, FormSchema>,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_search(&mut self, key: impl Into<String>, schema: SearchSchema) {
        self.searches.insert(key.into(), schema);
    }

    pub fn register_detail(&mut self, key: impl Into<String>, schema: DetailSchema) {
        self.details.insert(key.into(), schema);
    }

    pub fn register_table(&mut self, key: impl Into<String>, schema: TableSchema) {
        self.tables.insert(key.into(), schema);
    }

    pub fn register_row(&mut self, key: impl Into<String>, schema: RowSchema) {
        self.rows.insert(key.into(), schema);
    }

    pub fn register_form(&mut self, key: impl Into<String>, schema: FormSchema) {
        self.forms.insert(key.into(), schema);
    }

    pub fn search(&self, key: &str) -> Result<&SearchSchema> {
        self.searches
            .get(key)
            .ok_or_else(|| unknown("search view", key))
    }

    pub fn detail(&self, key: &str) -> Result<&DetailSchema> {
        self.details
            .get(key)
            .ok_or_else(|| unknown("detail view", key))
    }

    pub fn table(&self, key: &str) -> Result<&TableSchema> {
        self.tables.get(key).ok_or_else(|| unknown("table", key))
    }

    pub fn row(&self, key: &str) -> Result<&RowSchema> {
        self.rows.get(key).ok_or_else(|| unknown("row", key))
    }

    pub fn form(&self, key: &str) -> Result<&FormSchema> {
        self.forms.get(key).ok_or_else(|| unknown("form", key))
    }

    /// Check that every component key a config references resolves.
    ///
    /// A scope's `view` key may name either a search or a detail view,
    /// depending on which side of the scope it configures.
    pub fn validate(&self, config: &Config) -> Result<()> {
        for scope_config in config.scopes.values() {
            if let Some(key) = &scope_config.view {
                if !self.searches.contains_key(key.as_str())
                    && !self.details.contains_key(key.as_str())
                {
                    return Err(unknown("view", key));
                }
            }
            if let Some(key) = &scope_config.table {
                self.table(key)?;
            }
            if let Some(key) = &scope_config.row {
                self.row(key)?;
            }
            if let Some(key) = &scope_config.form {
                self.form(key)?;
            }
        }
        Ok(())
    }
}

fn unknown(role: &'static str, key: &str) -> ScrapeError {
    ScrapeError::UnknownComponent {
        role,
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::FieldSchema;
    use crate::config::{Scope, ScopeConfig};

    #[test]
    fn test_register_and_resolve() {
        let mut registry = ComponentRegistry::new();
        registry.register_row(
            "bills.search_row",
            RowSchema::new(Scope::BillsSearch, FieldSchema::new().with_text("title")),
        );
        assert_eq!(
            registry.row("bills.search_row").unwrap().scope,
            Scope::BillsSearch
        );
    }

    #[test]
    fn test_unknown_key_names_role() {
        let registry = ComponentRegistry::new();
        let err = registry.table("bills.search_table").unwrap_err();
        assert!(err.to_string().contains("table"));
        assert!(err.to_string().contains("bills.search_table"));
    }

    #[test]
    fn test_reregistration_replaces() {
        let mut registry = ComponentRegistry::new();
        registry.register_row(
            "people.search_row",
            RowSchema::new(Scope::PeopleSearch, FieldSchema::new()),
        );
        registry.register_row(
            "people.search_row",
            RowSchema::new(Scope::PeopleDetail, FieldSchema::new()),
        );
        assert_eq!(
            registry.row("people.search_row").unwrap().scope,
            Scope::PeopleDetail
        );
    }

    #[test]
    fn test_validate_flags_dangling_key() {
        let registry = ComponentRegistry::new();
        let config = Config::base("Testville", "https://testville.legistar.com").with_scope(
            Scope::BillsSearch,
            ScopeConfig::new().with_row("bills.search_row"),
        );
        let err = registry.validate(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownComponent { .. }));
    }

    #[test]
    fn test_validate_accepts_registered_keys() {
        let mut registry = ComponentRegistry::new();
        registry.register_row(
            "bills.search_row",
            RowSchema::new(Scope::BillsSearch, FieldSchema::new()),
        );
        let config = Config::base("Testville", "https://testville.legistar.com").with_scope(
            Scope::BillsSearch,
            ScopeConfig::new().with_row("bills.search_row"),
        );
        registry.validate(&config).unwrap();
    }
}

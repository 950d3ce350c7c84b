//! Document families: bills, people, organizations, and events.
//!
//! Each family module registers the view, table, row, and form
//! components its documents are assembled from, and contributes the
//! default scope configuration matching the stock portal template.
//! Jurisdiction presets start from these defaults and override labels,
//! formats, or classification afterwards.

pub(crate) mod bills;
pub(crate) mod events;
pub(crate) mod orgs;
pub(crate) mod people;

use crate::aggregate::{BuildScope, Built, ItemOutcome};
use crate::components::ComponentRegistry;
use crate::config::{Config, Scope};
use crate::error::{Result, ScrapeError};
use crate::table::Table;

/// Create a component registry covering every document family.
#[must_use]
pub fn create_component_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    bills::register(&mut registry);
    people::register(&mut registry);
    orgs::register(&mut registry);
    events::register(&mut registry);

    registry
}

/// Apply every family's default scope configuration to a config.
///
/// Each scope's config is replaced wholesale, so jurisdiction overrides
/// belong after this call.
#[must_use]
pub fn default_scopes(config: Config) -> Config {
    let config = bills::default_scopes(config);
    let config = people::default_scopes(config);
    let config = orgs::default_scopes(config);
    events::default_scopes(config)
}

/// Resolve a component key a scope's config must carry.
pub(crate) fn require_key<'a>(
    key: Option<&'a str>,
    scope: Scope,
    role: &'static str,
) -> Result<&'a str> {
    key.ok_or_else(|| ScrapeError::ScopeUnconfigured {
        scope: scope.to_string(),
        role,
    })
}

/// Walk the results table of an already-fetched detail page into list
/// items, using `row_scope`'s configured table and row components.
///
/// Votes, memberships, org members, and agenda items all ride on this.
pub(crate) fn detail_table_items(
    scope: &BuildScope<'_>,
    row_scope: Scope,
) -> Result<Vec<ItemOutcome>> {
    let Some(page) = scope.page else {
        return Ok(Vec::new());
    };
    let ctx = scope.ctx;
    let sc = ctx.config().scope(row_scope);
    let table_schema = scope
        .components
        .table(require_key(sc.table.as_deref(), row_scope, "table")?)?
        .clone();
    let row_schema = scope
        .components
        .row(require_key(sc.row.as_deref(), row_scope, "row")?)?
        .clone();

    let table = Table::new(ctx, &table_schema, &row_schema);
    let mut items = Vec::new();
    for row in table.rows(page)? {
        let row = row?;
        match row.build_in(ctx, scope.components, &row_schema)? {
            Built::Document(doc) => items.push(ItemOutcome::Item(doc)),
            Built::Skipped => items.push(ItemOutcome::SkipItem),
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_registry_covers_every_family() {
        let registry = create_component_registry();

        assert!(registry.search("bills.search").is_ok());
        assert!(registry.detail("bills.detail").is_ok());
        assert!(registry.detail("bills.action_detail").is_ok());
        assert!(registry.row("bills.vote_row").is_ok());
        assert!(registry.search("people.search").is_ok());
        assert!(registry.row("people.membership_row").is_ok());
        assert!(registry.search("orgs.search").is_ok());
        assert!(registry.search("events.search").is_ok());
        assert!(registry.row("events.agenda_row").is_ok());
    }

    #[test]
    fn test_default_scopes_resolve_against_registry() {
        let registry = create_component_registry();
        let config = default_scopes(Config::base(
            "Testville",
            "https://testville.legistar.com",
        ));

        registry.validate(&config).unwrap();
    }

    #[test]
    fn test_require_key_names_scope_and_role() {
        let err = require_key(None, Scope::BillsActions, "form").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Scope bills.actions does not configure a form component"
        );
    }
}

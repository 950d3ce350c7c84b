//! The organizations family: departments, committees, and boards.
//!
//! Search rows carry the directory columns plus a computed
//! `classification` resolved from the organization type. Most portals
//! render no organization detail link, so `detail_available` defaults
//! off; the detail components stay registered for jurisdictions that
//! turn it on.

use crate::aggregate::{BuildScope, FieldSchema, ScalarOutcome};
use crate::components::ComponentRegistry;
use crate::config::{Config, LabelTable, Scope, ScopeConfig};
use crate::document::Value;
use crate::error::Result;
use crate::families::detail_table_items;
use crate::form::FormSchema;
use crate::table::{RowSchema, TableSchema};
use crate::views::{DetailSchema, SearchSchema};

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register_search(
        "orgs.search",
        SearchSchema::new(Scope::OrgsSearch, "orgs search"),
    );
    registry.register_table("orgs.search_table", TableSchema::new(Scope::OrgsSearch));
    registry.register_row(
        "orgs.search_row",
        RowSchema::new(Scope::OrgsSearch, search_fields()).with_detail_link("name"),
    );
    registry.register_form("orgs.search_form", FormSchema::new(Scope::OrgsSearch));

    registry.register_detail(
        "orgs.detail",
        DetailSchema::new(Scope::OrgsDetail, detail_fields(), "org detail"),
    );
    registry.register_table("orgs.members_table", TableSchema::new(Scope::OrgsDetail));
    registry.register_row(
        "orgs.member_row",
        RowSchema::new(Scope::OrgsDetail, member_fields()),
    );
}

fn search_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("name")
        .with_text("type")
        .with_text("meeting_location")
        .with_text("num_vacancies")
        .with_text("num_members")
        .with_scalar("classification", classification_producer())
        .with_sources("sources")
}

fn detail_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("name")
        .with_text("type")
        .with_text("email")
        .with_text("contact_name")
        .with_text("phone")
        .with_text("website")
        .with_text("address")
        .with_list("members", |scope| {
            detail_table_items(scope, Scope::OrgsDetail)
        })
        .with_sources("sources")
}

fn member_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("person")
        .with_text("role")
        .with_date("start_date")
        .with_date("end_date")
        .with_text("appointed_by")
}

/// Resolve the organization class from the type column. A row without
/// a type cell stays unclassified; an unmapped type string is fatal.
fn classification_producer() -> impl Fn(&BuildScope<'_>) -> Result<ScalarOutcome> {
    |scope| {
        let Some(org_type) = scope.fields.text("type")? else {
            return Ok(ScalarOutcome::Value(Value::Null));
        };
        let class = scope.ctx.config().classification(&org_type)?;
        Ok(ScalarOutcome::Value(Value::Text(class)))
    }
}

pub(crate) fn default_scopes(config: Config) -> Config {
    config
        .with_scope(
            Scope::OrgsSearch,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("name", "Department Name"),
                    ("type", "Type"),
                    ("meeting_location", "Meeting Location"),
                    ("num_vacancies", "Vacancies"),
                    ("num_members", "Members"),
                ]))
                .with_view("orgs.search")
                .with_table("orgs.search_table")
                .with_row("orgs.search_row")
                .with_form("orgs.search_form"),
        )
        .with_scope(
            Scope::OrgsDetail,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("name", "Name"),
                    ("type", "Type"),
                    ("email", "E-mail"),
                    ("contact_name", "Contact name"),
                    ("phone", "Phone"),
                    ("website", "Web site"),
                    ("address", "Address"),
                    ("person", "Person Name"),
                    ("role", "Title"),
                    ("start_date", "Start Date"),
                    ("end_date", "End Date"),
                    ("appointed_by", "Appointed By"),
                ]))
                .with_view("orgs.detail")
                .with_table("orgs.members_table")
                .with_row("orgs.member_row"),
        )
}

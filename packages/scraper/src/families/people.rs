//! The people family: council members and other officials.
//!
//! Search rows carry the directory columns; the detail page adds the
//! name split, the photo, and the committee memberships grid.

use crate::aggregate::FieldSchema;
use crate::components::ComponentRegistry;
use crate::config::{Config, LabelTable, Scope, ScopeConfig};
use crate::families::detail_table_items;
use crate::form::FormSchema;
use crate::table::{RowSchema, TableSchema};
use crate::views::{DetailSchema, SearchSchema};

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register_search(
        "people.search",
        SearchSchema::new(Scope::PeopleSearch, "people search"),
    );
    registry.register_table("people.search_table", TableSchema::new(Scope::PeopleSearch));
    registry.register_row(
        "people.search_row",
        RowSchema::new(Scope::PeopleSearch, search_fields()).with_detail_link("fullname"),
    );
    registry.register_form("people.search_form", FormSchema::new(Scope::PeopleSearch));

    registry.register_detail(
        "people.detail",
        DetailSchema::new(Scope::PeopleDetail, detail_fields(), "person detail"),
    );
    registry.register_table(
        "people.memberships_table",
        TableSchema::new(Scope::PeopleDetail),
    );
    registry.register_row(
        "people.membership_row",
        RowSchema::new(Scope::PeopleDetail, membership_fields()),
    );
}

fn search_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("fullname")
        .with_text("website")
        .with_text("email")
        .with_text("fax")
        .with_text("district")
        .with_text("district_phone")
        .with_text("district_address")
        .with_text("cityhall_phone")
        .with_text("cityhall_address")
        .with_sources("sources")
}

fn detail_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("firstname")
        .with_text("lastname")
        .with_text("website")
        .with_text("email")
        .with_text("notes")
        .with_url("photo")
        .with_list("memberships", |scope| {
            detail_table_items(scope, Scope::PeopleDetail)
        })
        .with_sources("sources")
}

fn membership_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("organization")
        .with_text("role")
        .with_date("start_date")
        .with_date("end_date")
        .with_text("appointed_by")
}

pub(crate) fn default_scopes(config: Config) -> Config {
    config
        .with_scope(
            Scope::PeopleSearch,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("fullname", "Person Name"),
                    ("website", "Web Site"),
                    ("email", "E-mail"),
                    ("fax", "Fax"),
                    ("district", "Ward/Office"),
                    ("district_phone", "Ward Office Phone"),
                    ("district_address", "Ward Office Address"),
                    ("cityhall_phone", "City Hall Phone"),
                    ("cityhall_address", "City Hall Address"),
                ]))
                .with_view("people.search")
                .with_table("people.search_table")
                .with_row("people.search_row")
                .with_form("people.search_form")
                .with_detail_available(),
        )
        .with_scope(
            Scope::PeopleDetail,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("firstname", "First name"),
                    ("lastname", "Last name"),
                    ("website", "Web site"),
                    ("email", "E-mail"),
                    ("notes", "Notes"),
                    ("photo", "Photo"),
                    ("organization", "Department Name"),
                    ("role", "Title"),
                    ("start_date", "Start Date"),
                    ("end_date", "End Date"),
                    ("appointed_by", "Appointed By"),
                ]))
                .with_view("people.detail")
                .with_table("people.memberships_table")
                .with_row("people.membership_row"),
        )
}

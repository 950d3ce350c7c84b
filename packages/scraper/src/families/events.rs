//! The events family: meeting calendar and meeting pages.
//!
//! The calendar search posts time-period and bodies filters with the
//! template's literal ASPX control names. Dates and times render in
//! separate columns, so the `date` field is assembled from both cells
//! before parsing; a missing time cell parses the date at midnight.

use crate::aggregate::{BuildScope, FieldSchema, ScalarOutcome};
use crate::components::ComponentRegistry;
use crate::config::{Config, LabelTable, Scope, ScopeConfig, EVENT_DATETIME_FORMAT};
use crate::document::Value;
use crate::error::Result;
use crate::families::detail_table_items;
use crate::fields::parse_datetime;
use crate::form::FormSchema;
use crate::table::{RowSchema, TableSchema};
use crate::views::{DetailSchema, SearchSchema};

const BODIES_CONTROL: &str = "ctl00$ContentPlaceHolder1$lstBodies";
const TIME_PERIOD_CONTROL: &str = "ctl00$ContentPlaceHolder1$lstYears";
const CLIENTSTATE_CONTROL: &str = "ctl00_ContentPlaceHolder1_lstYears_ClientState";

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register_search(
        "events.search",
        SearchSchema::new(Scope::EventsSearch, "events search"),
    );
    registry.register_table("events.search_table", TableSchema::new(Scope::EventsSearch));
    registry.register_row(
        "events.search_row",
        RowSchema::new(Scope::EventsSearch, search_fields()).with_detail_link("details"),
    );
    registry.register_form("events.search_form", FormSchema::new(Scope::EventsSearch));

    registry.register_detail(
        "events.detail",
        DetailSchema::new(Scope::EventsDetail, detail_fields(), "event detail"),
    );
    registry.register_table("events.agenda_table", TableSchema::new(Scope::EventsAgenda));
    registry.register_row(
        "events.agenda_row",
        RowSchema::new(Scope::EventsAgenda, agenda_fields()).with_detail_link("file_number"),
    );
}

fn search_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("name")
        .with_scalar("date", event_datetime(Scope::EventsSearch))
        .with_text("time")
        .with_text("location")
        .with_text("topic")
        .with_url("agenda")
        .with_url("minutes")
        .with_url("media")
        .with_url("notice")
        .with_sources("sources")
}

fn detail_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("name")
        .with_scalar("date", event_datetime(Scope::EventsDetail))
        .with_text("location")
        .with_url("video")
        .with_list("agenda_items", |scope| {
            detail_table_items(scope, Scope::EventsAgenda)
        })
        .with_sources("sources")
}

fn agenda_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("file_number")
        .with_text("version")
        .with_text("name")
        .with_text("type")
        .with_text("title")
        .with_text("action")
        .with_text("result")
        .with_url("action_details")
        .with_url("transcript")
}

/// Parse the meeting timestamp from the date and time cells. Calendar
/// pages render them as separate columns, so the two are joined before
/// parsing with the scope's datetime format.
fn event_datetime(scope_kind: Scope) -> impl Fn(&BuildScope<'_>) -> Result<ScalarOutcome> {
    move |scope| {
        let Some(date) = scope.fields.text("date")? else {
            return Ok(ScalarOutcome::Value(Value::Null));
        };
        let config = scope.ctx.config();
        let parsed = match scope.fields.text("time")? {
            Some(time) => parse_datetime(
                &format!("{date} {time}"),
                config.datetime_format_for(scope_kind),
                config.utc_offset,
                "date",
            )?,
            None => parse_datetime(&date, &config.datetime_format, config.utc_offset, "date")?,
        };
        Ok(ScalarOutcome::Value(Value::DateTime(parsed)))
    }
}

pub(crate) fn default_scopes(config: Config) -> Config {
    config
        .with_scope(
            Scope::EventsSearch,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("name", "Name"),
                    ("date", "Meeting Date"),
                    ("time", "Meeting Time"),
                    ("location", "Meeting Location"),
                    ("topic", "Meeting Topic"),
                    ("details", "Meeting Details"),
                    ("agenda", "Agenda"),
                    ("minutes", "Minutes"),
                    ("media", "Multimedia"),
                    ("notice", "Notice"),
                ]))
                .with_datetime_format(EVENT_DATETIME_FORMAT)
                .with_view("events.search")
                .with_table("events.search_table")
                .with_row("events.search_row")
                .with_form("events.search_form")
                .with_query_field(BODIES_CONTROL, "All Committees")
                .with_query_field(TIME_PERIOD_CONTROL, "This Year")
                .with_query_field(CLIENTSTATE_CONTROL, r#"{"value":"This Year"}"#)
                .with_detail_available(),
        )
        .with_scope(
            Scope::EventsDetail,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("name", "Name"),
                    ("date", "Date"),
                    ("time", "Time"),
                    ("location", "Meeting location"),
                    ("video", "Meeting video"),
                ]))
                .with_datetime_format(EVENT_DATETIME_FORMAT)
                .with_view("events.detail"),
        )
        .with_scope(
            Scope::EventsAgenda,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("file_number", "File #"),
                    ("version", "Ver."),
                    ("name", "Name"),
                    ("type", "Type"),
                    ("title", "Title"),
                    ("action", "Action"),
                    ("result", "Result"),
                    ("action_details", "Action Details"),
                    ("transcript", "Transcript"),
                ]))
                .with_table("events.agenda_table")
                .with_row("events.agenda_row"),
        )
}

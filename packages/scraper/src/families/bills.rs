//! The bills family: legislation search, bill pages, and the nested
//! actions-and-votes chain.
//!
//! A bill document carries the search-row columns plus, from its own
//! page, sponsors, attachments, and the actions grid. Each action row
//! is enriched from its action detail page when one is linked, and the
//! action detail contributes the roll-call votes table. A bill whose
//! page shows no actions is dropped entirely.

use std::rc::Rc;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::aggregate::{BuildScope, Built, FieldSchema, ItemOutcome};
use crate::components::ComponentRegistry;
use crate::config::{Config, LabelTable, Scope, ScopeConfig};
use crate::document::{Document, Value};
use crate::error::Result;
use crate::families::{detail_table_items, require_key};
use crate::form::{Form, FormSchema};
use crate::media;
use crate::table::{RowSchema, Table, TableRow, TableSchema};
use crate::views::{DetailSchema, DetailView, SearchSchema};

/// Sponsor lists render as one comma-separated string.
static SPONSOR_SPLIT: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)] // The pattern is a literal
    Regex::new(r",\s+").expect("sponsor split pattern")
});

pub(crate) fn register(registry: &mut ComponentRegistry) {
    registry.register_search(
        "bills.search",
        SearchSchema::new(Scope::BillsSearch, "bills search"),
    );
    registry.register_table("bills.search_table", TableSchema::new(Scope::BillsSearch));
    registry.register_row(
        "bills.search_row",
        RowSchema::new(Scope::BillsSearch, search_fields()).with_detail_link("file_number"),
    );
    registry.register_form("bills.search_form", FormSchema::new(Scope::BillsSearch));

    registry.register_detail(
        "bills.detail",
        DetailSchema::new(Scope::BillsDetail, detail_fields(), "bill detail"),
    );
    registry.register_table("bills.actions_table", TableSchema::new(Scope::BillsActions));
    registry.register_row(
        "bills.action_row",
        RowSchema::new(Scope::BillsActions, action_fields()).with_detail_link("action_details"),
    );
    registry.register_form(
        "bills.actions_form",
        FormSchema::new(Scope::BillsActions).with_skip_first_submit(),
    );

    registry.register_detail(
        "bills.action_detail",
        DetailSchema::new(
            Scope::BillsActionDetail,
            action_detail_fields(),
            "bill action detail",
        ),
    );
    registry.register_table(
        "bills.votes_table",
        TableSchema::new(Scope::BillsActionDetail),
    );
    registry.register_row(
        "bills.vote_row",
        RowSchema::new(Scope::BillsActionDetail, vote_fields()),
    );
}

fn search_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("file_number")
        .with_text("law_number")
        .with_text("type")
        .with_text("status")
        .with_date("intro_date")
        .with_date("file_created")
        .with_date("final_action")
        .with_text("title")
        .with_text("name")
        .with_text("version")
        .with_text("sponsor_office")
        .with_sources("sources")
}

fn detail_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("file_number")
        .with_text("law_number")
        .with_text("type")
        .with_text("status")
        .with_text("title")
        .with_text("name")
        .with_text("version")
        .with_date("agenda")
        .with_date("enactment_date")
        .with_date("final_action")
        .with_list("sponsors", sponsors_producer())
        .with_list("documents", media::attachments_producer("attachments"))
        .with_list("actions", actions_producer())
        .with_sources("sources")
}

fn action_fields() -> FieldSchema {
    FieldSchema::new()
        .with_date("date")
        .with_text("organization")
        .with_text("text")
        .with_text("version")
        .with_text("result")
        .with_text("journal_page")
        .with_list("media", media::media_producer())
}

fn action_detail_fields() -> FieldSchema {
    FieldSchema::new()
        .with_text("file_number")
        .with_text("type")
        .with_text("title")
        .with_text("mover")
        .with_text("seconder")
        .with_text("result")
        .with_text("agenda_note")
        .with_text("minutes_note")
        .with_text("action")
        .with_text("action_text")
        .with_list("votes", votes_producer())
        .with_sources("sources")
}

fn vote_fields() -> FieldSchema {
    FieldSchema::new().with_text("person").with_text("vote")
}

/// One `{name}` document per comma-separated sponsor name.
fn sponsors_producer() -> impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    |scope| {
        let Some(text) = scope.fields.text("sponsors")? else {
            return Ok(Vec::new());
        };
        let mut items = Vec::new();
        for name in SPONSOR_SPLIT.split(&text) {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let mut sponsor = Document::new();
            sponsor.insert("name", Value::Text(name.to_string()));
            items.push(ItemOutcome::Item(sponsor));
        }
        Ok(items)
    }
}

/// Walk the actions grid on the bill page. Zero actions abandons the
/// whole bill document.
fn actions_producer() -> impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    |scope| {
        let items = collect_actions(scope)?;
        if items.is_empty() {
            debug!(url = scope.ctx.url(), "bill page shows no actions");
            return Ok(vec![ItemOutcome::SkipDocument]);
        }
        Ok(items)
    }
}

fn collect_actions(scope: &BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    let ctx = scope.ctx;
    let config = ctx.config();
    let sc = config.scope(Scope::BillsActions);
    let table_schema = scope
        .components
        .table(require_key(
            sc.table.as_deref(),
            Scope::BillsActions,
            "table",
        )?)?
        .clone();
    let row_schema = scope
        .components
        .row(require_key(sc.row.as_deref(), Scope::BillsActions, "row")?)?
        .clone();

    let rows = match scope.page {
        // The grid is already on the parsed bill page; fixture runs
        // never post, and a formless config has nothing to post.
        Some(page) if config.test_mode || sc.form.is_none() => {
            let table = Table::new(ctx, &table_schema, &row_schema);
            table.rows(page)?.collect::<Result<Vec<_>>>()?
        }
        _ => {
            let form_key = require_key(sc.form.as_deref(), Scope::BillsActions, "form")?;
            let form_schema = scope.components.form(form_key)?.clone();
            let (first, page_ctx) = Form::new(ctx, &form_schema).first_page()?;
            let table = Table::new(&page_ctx, &table_schema, &row_schema);
            table.rows(&first)?.collect::<Result<Vec<_>>>()?
        }
    };

    let mut items = Vec::with_capacity(rows.len());
    for row in &rows {
        items.push(action_item(scope, row, &row_schema)?);
    }
    Ok(items)
}

/// Build one action row, merging in fields from its action detail page
/// when the row links onward. Detail fields fill gaps only.
fn action_item(
    scope: &BuildScope<'_>,
    row: &TableRow,
    row_schema: &RowSchema,
) -> Result<ItemOutcome> {
    let Built::Document(mut doc) = row.build_in(scope.ctx, scope.components, row_schema)? else {
        return Ok(ItemOutcome::SkipItem);
    };

    let config = scope.ctx.config();
    if config.scope(Scope::BillsActions).detail_available {
        if let Some(url) = row.detail_url(row_schema)? {
            let key = require_key(
                config.scope(Scope::BillsActionDetail).view.as_deref(),
                Scope::BillsActionDetail,
                "view",
            )?;
            let schema = scope.components.detail(key)?.clone();
            let view = DetailView::new(scope.ctx.with_url(url), Rc::clone(scope.components), schema);
            if let Built::Document(detail) = view.build()? {
                doc.merge_missing(detail);
            }
        }
    }
    Ok(ItemOutcome::Item(doc))
}

/// Roll-call rows from the votes grid of an action detail page.
fn votes_producer() -> impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    |scope| detail_table_items(scope, Scope::BillsActionDetail)
}

pub(crate) fn default_scopes(config: Config) -> Config {
    config
        .with_scope(
            Scope::BillsSearch,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("file_number", "File #"),
                    ("law_number", "Law Number"),
                    ("type", "Type"),
                    ("status", "Status"),
                    ("intro_date", "Intro Date"),
                    ("file_created", "File Created"),
                    ("final_action", "Final Action"),
                    ("title", "Title"),
                    ("name", "Name"),
                    ("version", "Version"),
                    ("sponsor_office", "Sponsor Office"),
                ]))
                .with_view("bills.search")
                .with_table("bills.search_table")
                .with_row("bills.search_row")
                .with_form("bills.search_form")
                .with_detail_available(),
        )
        .with_scope(
            Scope::BillsDetail,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("file_number", "File #"),
                    ("law_number", "Law number"),
                    ("type", "Type"),
                    ("status", "Status"),
                    ("title", "Title"),
                    ("name", "Name"),
                    ("version", "Version"),
                    ("agenda", "On agenda"),
                    ("enactment_date", "Enactment date"),
                    ("final_action", "Final action"),
                    ("sponsors", "Sponsors"),
                    ("attachments", "Attachments"),
                ]))
                .with_view("bills.detail"),
        )
        .with_scope(
            Scope::BillsActions,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("date", "Date"),
                    ("organization", "Action By"),
                    ("text", "Action"),
                    ("version", "Ver."),
                    ("result", "Result"),
                    ("journal_page", "Journal Page"),
                    ("action_details", "Action Details"),
                    ("multimedia", "Multimedia"),
                ]))
                .with_table("bills.actions_table")
                .with_row("bills.action_row")
                .with_form("bills.actions_form")
                .with_media_fields(&["multimedia"])
                .with_detail_available(),
        )
        .with_scope(
            Scope::BillsActionDetail,
            ScopeConfig::new()
                .with_labels(LabelTable::from_pairs(&[
                    ("file_number", "File #"),
                    ("type", "Type"),
                    ("title", "Title"),
                    ("mover", "Mover"),
                    ("seconder", "Seconder"),
                    ("result", "Result"),
                    ("agenda_note", "Agenda note"),
                    ("minutes_note", "Minutes note"),
                    ("action", "Action"),
                    ("action_text", "Action text"),
                    ("person", "Person Name"),
                    ("vote", "Vote"),
                ]))
                .with_view("bills.action_detail")
                .with_table("bills.votes_table")
                .with_row("bills.vote_row"),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ScrapeContext;
    use crate::families::create_component_registry;
    use crate::fields::{Cell, FieldMap};
    use crate::http::testing::StaticFetcher;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use scraper::Html;

    const BILL_URL: &str = "https://testville.legistar.com/LegislationDetail.aspx?ID=1";

    fn build_scope_parts() -> (Rc<Config>, Rc<ComponentRegistry>) {
        let config = Rc::new(
            default_scopes(Config::base("Testville", "https://testville.legistar.com"))
                .with_test_mode(),
        );
        let components = Rc::new(create_component_registry());
        (config, components)
    }

    fn sponsors_cell(text: &str) -> IndexMap<String, Cell> {
        let mut cells = IndexMap::new();
        cells.insert(
            "Sponsors".to_string(),
            Cell {
                text: Some(text.to_string()),
                url: None,
                links: Vec::new(),
            },
        );
        cells
    }

    #[test]
    fn test_sponsors_split_on_comma_runs() {
        let (config, components) = build_scope_parts();
        let ctx = ScrapeContext::new(Rc::clone(&config), Rc::new(StaticFetcher::new()));
        let fields = FieldMap::new(
            Rc::clone(&config),
            Scope::BillsDetail,
            sponsors_cell("Moreno, Proco Joe, Dowell, Pat"),
        );
        let scope = BuildScope {
            fields: &fields,
            ctx: &ctx,
            components: &components,
            page: None,
        };

        let items = sponsors_producer()(&scope).unwrap();
        let names: Vec<&str> = items
            .iter()
            .map(|item| match item {
                ItemOutcome::Item(doc) => doc.text("name").unwrap(),
                _ => panic!("expected sponsor items"),
            })
            .collect();
        assert_eq!(names, vec!["Moreno", "Proco Joe", "Dowell", "Pat"]);
    }

    #[test]
    fn test_sponsors_absent_cell_yields_empty_list() {
        let (config, components) = build_scope_parts();
        let ctx = ScrapeContext::new(Rc::clone(&config), Rc::new(StaticFetcher::new()));
        let fields = FieldMap::new(Rc::clone(&config), Scope::BillsDetail, IndexMap::new());
        let scope = BuildScope {
            fields: &fields,
            ctx: &ctx,
            components: &components,
            page: None,
        };

        assert!(sponsors_producer()(&scope).unwrap().is_empty());
    }

    #[test]
    fn test_bill_without_actions_is_skipped() {
        let (config, components) = build_scope_parts();
        let ctx = ScrapeContext::new(Rc::clone(&config), Rc::new(StaticFetcher::new()))
            .with_url(BILL_URL);
        let page = Html::parse_document("<html><body><p>Nothing here.</p></body></html>");
        let fields = FieldMap::new(Rc::clone(&config), Scope::BillsDetail, IndexMap::new());
        let scope = BuildScope {
            fields: &fields,
            ctx: &ctx,
            components: &components,
            page: Some(&page),
        };

        let built = detail_fields().build(&scope).unwrap();
        assert_eq!(built, Built::Skipped);
    }

    #[test]
    fn test_actions_walk_the_grid_on_the_bill_page() {
        let page_html = r#"
            <html><body>
            <table class="rgMasterTable">
              <thead><tr>
                <th>Date</th><th>Ver.</th><th>Action By</th><th>Action</th>
                <th>Result</th><th>Journal Page</th>
              </tr></thead>
              <tbody>
                <tr>
                  <td>5/6/2014</td><td>1</td><td>City Council</td>
                  <td>Referred</td><td></td><td>101</td>
                </tr>
                <tr>
                  <td>6/3/2014</td><td>1</td><td>Committee on Finance</td>
                  <td>Recommended to Pass</td><td>Pass</td><td>250</td>
                </tr>
              </tbody>
            </table>
            </body></html>
        "#;
        let (config, components) = build_scope_parts();
        let ctx = ScrapeContext::new(Rc::clone(&config), Rc::new(StaticFetcher::new()))
            .with_url(BILL_URL);
        let page = Html::parse_document(page_html);
        let fields = FieldMap::new(Rc::clone(&config), Scope::BillsDetail, IndexMap::new());
        let scope = BuildScope {
            fields: &fields,
            ctx: &ctx,
            components: &components,
            page: Some(&page),
        };

        let items = actions_producer()(&scope).unwrap();
        assert_eq!(items.len(), 2);
        let ItemOutcome::Item(second) = &items[1] else {
            panic!("expected action items");
        };
        assert_eq!(second.text("organization"), Some("Committee on Finance"));
        assert_eq!(second.text("text"), Some("Recommended to Pass"));
        assert_eq!(second.text("result"), Some("Pass"));
        // No Action Details column, so nothing was fetched to enrich.
        assert_eq!(second.get("mover"), None);
    }

    #[test]
    fn test_action_enriched_from_detail_page_without_clobbering() {
        let action_url = "https://testville.legistar.com/HistoryDetail.aspx?ID=9";
        let page_html = format!(
            r#"
            <html><body>
            <table class="rgMasterTable">
              <thead><tr>
                <th>Date</th><th>Action By</th><th>Action</th>
                <th>Result</th><th>Action Details</th>
              </tr></thead>
              <tbody>
                <tr>
                  <td>6/3/2014</td><td>City Council</td><td>Passed</td>
                  <td>Pass</td><td><a href="{action_url}">Action details</a></td>
                </tr>
              </tbody>
            </table>
            </body></html>
        "#
        );
        let detail_html = r#"
            <html><body>
            <table>
              <tr><td>Result:</td><td>Fail</td></tr>
              <tr><td>Mover:</td><td>Burke, Edward M.</td></tr>
            </table>
            <table class="rgMasterTable">
              <thead><tr><th>Person Name</th><th>Vote</th></tr></thead>
              <tbody>
                <tr><td>Moreno, Proco Joe</td><td>Yea</td></tr>
                <tr><td>Dowell, Pat</td><td>Nay</td></tr>
              </tbody>
            </table>
            </body></html>
        "#;

        let (config, components) = build_scope_parts();
        let fetcher = StaticFetcher::new().with_page(action_url, detail_html);
        let ctx = ScrapeContext::new(Rc::clone(&config), Rc::new(fetcher)).with_url(BILL_URL);
        let page = Html::parse_document(&page_html);
        let fields = FieldMap::new(Rc::clone(&config), Scope::BillsDetail, IndexMap::new());
        let scope = BuildScope {
            fields: &fields,
            ctx: &ctx,
            components: &components,
            page: Some(&page),
        };

        let items = actions_producer()(&scope).unwrap();
        assert_eq!(items.len(), 1);
        let ItemOutcome::Item(action) = &items[0] else {
            panic!("expected an action item");
        };
        // The row's own result wins over the detail page's.
        assert_eq!(action.text("result"), Some("Pass"));
        assert_eq!(action.text("mover"), Some("Burke, Edward M."));
        let votes = action.list("votes").unwrap();
        assert_eq!(votes.len(), 2);
        assert_eq!(votes[0].text("person"), Some("Moreno, Proco Joe"));
        assert_eq!(votes[1].text("vote"), Some("Nay"));

        // The action detail fetch landed in the bill's provenance.
        let recorded = ctx.source_records();
        assert!(recorded
            .iter()
            .any(|record| record.url == action_url && record.note == "bill action detail"));
    }
}

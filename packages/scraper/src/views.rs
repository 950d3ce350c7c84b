//! Top-level views binding a jurisdiction to its components.
//!
//! A [`Site`] is one jurisdiction's config, component registry, and
//! transport, validated together. Its search views yield one
//! [`RowDocument`] per result row; rows configured with a detail link
//! carry a bound [`DetailView`] that fetches the record's own page and
//! builds the richer document, sharing the row's provenance.

use std::fmt;
use std::rc::Rc;

use scraper::Html;

use crate::aggregate::{BuildScope, Built, FieldSchema};
use crate::components::ComponentRegistry;
use crate::config::{Config, Family, Scope};
use crate::context::ScrapeContext;
use crate::document::Document;
use crate::dom;
use crate::error::{Result, ScrapeError};
use crate::fields::FieldMap;
use crate::form::{Form, FormSchema};
use crate::http::Fetcher;
use crate::table::{RowSchema, Rows, Table, TableRow, TableSchema};

/// Configuration of one search-view component.
#[derive(Debug, Clone)]
pub struct SearchSchema {
    pub scope: Scope,
    /// Provenance note recorded for each result row.
    pub note: String,
}

impl SearchSchema {
    #[must_use]
    pub fn new(scope: Scope, note: impl Into<String>) -> Self {
        Self {
            scope,
            note: note.into(),
        }
    }
}

/// Configuration of one detail-view component.
#[derive(Debug, Clone)]
pub struct DetailSchema {
    pub scope: Scope,
    /// Field rules building the detail document.
    pub fields: FieldSchema,
    /// Provenance note recorded for the fetched page.
    pub note: String,
}

impl DetailSchema {
    #[must_use]
    pub fn new(scope: Scope, fields: FieldSchema, note: impl Into<String>) -> Self {
        Self {
            scope,
            fields,
            note: note.into(),
        }
    }
}

fn unconfigured(scope: Scope, role: &'static str) -> ScrapeError {
    ScrapeError::ScopeUnconfigured {
        scope: scope.to_string(),
        role,
    }
}

/// One jurisdiction bound to its components and transport.
pub struct Site {
    config: Rc<Config>,
    components: Rc<ComponentRegistry>,
    fetcher: Rc<dyn Fetcher>,
}

impl Site {
    /// Validate the config and every component key it references, then
    /// bind. Mistakes surface here, before any page is fetched.
    pub fn new(
        config: Rc<Config>,
        components: Rc<ComponentRegistry>,
        fetcher: Rc<dyn Fetcher>,
    ) -> Result<Self> {
        config.validate()?;
        components.validate(&config)?;
        Ok(Self {
            config,
            components,
            fetcher,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The search view for one document family.
    pub fn search(&self, family: Family) -> Result<SearchView> {
        let scope = family.search_scope();
        let sc = self.config.scope(scope);

        let view_key = sc
            .view
            .as_deref()
            .ok_or_else(|| unconfigured(scope, "search view"))?;
        let search = self.components.search(view_key)?.clone();

        let table_key = sc
            .table
            .as_deref()
            .ok_or_else(|| unconfigured(scope, "table"))?;
        let table = self.components.table(table_key)?.clone();

        let row_key = sc.row.as_deref().ok_or_else(|| unconfigured(scope, "row"))?;
        let row = self.components.row(row_key)?.clone();

        let form = match sc.form.as_deref() {
            Some(key) => Some(self.components.form(key)?.clone()),
            None => None,
        };

        let detail = if sc.detail_available {
            let detail_scope = scope
                .detail_scope()
                .ok_or_else(|| unconfigured(scope, "detail view"))?;
            let key = self
                .config
                .scope(detail_scope)
                .view
                .as_deref()
                .ok_or_else(|| unconfigured(detail_scope, "detail view"))?;
            Some(self.components.detail(key)?.clone())
        } else {
            None
        };

        let url = self.config.tab_url(family)?;
        let ctx =
            ScrapeContext::new(Rc::clone(&self.config), Rc::clone(&self.fetcher)).with_url(url);

        Ok(SearchView {
            ctx,
            components: Rc::clone(&self.components),
            search,
            table,
            row,
            form,
            detail,
        })
    }

    /// A detail view for one known record url.
    pub fn detail(&self, scope: Scope, url: impl Into<String>) -> Result<DetailView> {
        let key = self
            .config
            .scope(scope)
            .view
            .as_deref()
            .ok_or_else(|| unconfigured(scope, "detail view"))?;
        let schema = self.components.detail(key)?.clone();
        let ctx =
            ScrapeContext::new(Rc::clone(&self.config), Rc::clone(&self.fetcher)).with_url(url);
        Ok(DetailView::new(ctx, Rc::clone(&self.components), schema))
    }
}

impl fmt::Debug for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Site")
            .field("jurisdiction", &self.config.name)
            .finish()
    }
}

/// Lazy search over one family's result rows.
#[derive(Debug)]
pub struct SearchView {
    ctx: ScrapeContext,
    components: Rc<ComponentRegistry>,
    search: SearchSchema,
    table: TableSchema,
    row: RowSchema,
    form: Option<FormSchema>,
    detail: Option<DetailSchema>,
}

impl SearchView {
    /// The landing url this view opens.
    #[must_use]
    pub fn url(&self) -> &str {
        self.ctx.url()
    }

    #[must_use]
    pub fn scope(&self) -> Scope {
        self.search.scope
    }

    /// Obtain the first results page and return the lazy document
    /// sequence over every result row, across all result pages.
    pub fn documents(&self) -> Result<SearchDocuments> {
        let (first_page, page_ctx) = self.first_page()?;
        let table = Table::new(&page_ctx, &self.table, &self.row);
        let rows = table.rows(&first_page)?;
        Ok(SearchDocuments {
            rows,
            components: Rc::clone(&self.components),
            row_schema: self.row.clone(),
            note: self.search.note.clone(),
            detail: self.detail.clone(),
            done: false,
        })
    }

    fn first_page(&self) -> Result<(Html, ScrapeContext)> {
        match &self.form {
            Some(schema) => Form::new(&self.ctx, schema).first_page(),
            None => {
                tracing::debug!(url = %self.ctx.url(), "Opening results page");
                let body = self.ctx.fetcher().get(self.ctx.url())?;
                Ok((dom::parse_page(&body), self.ctx.clone()))
            }
        }
    }
}

/// One search result row, built.
///
/// Carries the detail url when the row schema names one, and a bound
/// detail view when the scope configures one. The detail view shares
/// this row's provenance accumulator, so a followed detail document
/// lists both the search page and the detail page.
pub struct RowDocument {
    pub document: Document,
    pub detail_url: Option<String>,
    detail: Option<DetailView>,
}

impl RowDocument {
    /// The bound detail view, when the scope configures one.
    #[must_use]
    pub fn detail(&self) -> Option<&DetailView> {
        self.detail.as_ref()
    }

    /// Follow the detail link and build the richer document.
    pub fn follow(&self) -> Result<Option<Built>> {
        match &self.detail {
            Some(view) => view.build().map(Some),
            None => Ok(None),
        }
    }
}

/// Lazy sequence of built search rows.
pub struct SearchDocuments {
    rows: Rows,
    components: Rc<ComponentRegistry>,
    row_schema: RowSchema,
    note: String,
    detail: Option<DetailSchema>,
    done: bool,
}

impl SearchDocuments {
    /// Build one row; `None` when the row's schema skipped it.
    fn emit(&self, row: &TableRow) -> Result<Option<RowDocument>> {
        let ctx = row.ctx().with_fresh_sources();
        ctx.record_source(&self.note, row.page_url());

        let built = row.build_in(&ctx, &self.components, &self.row_schema)?;
        let Built::Document(document) = built else {
            tracing::debug!(url = %row.page_url(), "Row skipped");
            return Ok(None);
        };

        let detail_url = row.detail_url(&self.row_schema)?;
        let detail = match (&self.detail, &detail_url) {
            (Some(schema), Some(url)) => Some(DetailView::new(
                ctx.with_url(url.clone()),
                Rc::clone(&self.components),
                schema.clone(),
            )),
            _ => None,
        };

        Ok(Some(RowDocument {
            document,
            detail_url,
            detail,
        }))
    }
}

impl Iterator for SearchDocuments {
    type Item = Result<RowDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let row = match self.rows.next() {
                Some(Ok(row)) => row,
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(e));
                }
                None => {
                    self.done = true;
                    return None;
                }
            };
            match self.emit(&row) {
                Ok(Some(doc)) => return Some(Ok(doc)),
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Builds one document from one record's own page.
pub struct DetailView {
    ctx: ScrapeContext,
    components: Rc<ComponentRegistry>,
    schema: DetailSchema,
}

impl DetailView {
    #[must_use]
    pub fn new(ctx: ScrapeContext, components: Rc<ComponentRegistry>, schema: DetailSchema) -> Self {
        Self {
            ctx,
            components,
            schema,
        }
    }

    /// The record url this view fetches.
    #[must_use]
    pub fn url(&self) -> &str {
        self.ctx.url()
    }

    /// Fetch the page and build its document.
    pub fn build(&self) -> Result<Built> {
        let url = self.ctx.url().to_string();
        tracing::debug!(url = %url, scope = %self.schema.scope, "Fetching detail page");
        let body = self.ctx.fetcher().get(&url)?;
        self.ctx.record_source(&self.schema.note, &url);

        let page = dom::parse_page(&body);
        let cells = dom::detail_fields(&page, &url)?;
        let fields = FieldMap::new(self.ctx.config_rc(), self.schema.scope, cells);
        let scope = BuildScope {
            fields: &fields,
            ctx: &self.ctx,
            components: &self.components,
            page: Some(&page),
        };
        self.schema.fields.build(&scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::ScalarOutcome;
    use crate::config::{LabelTable, ScopeConfig};
    use crate::document::Value;
    use crate::http::testing::StaticFetcher;
    use pretty_assertions::assert_eq;

    const TAB_URL: &str = "https://testville.legistar.com/Legislation.aspx";
    const DETAIL_URL: &str = "https://testville.legistar.com/LegislationDetail.aspx?ID=1";

    const RESULTS: &str = r#"
        <html><body>
        <table class="rgMasterTable">
          <thead><tr><th>File #</th><th>Title</th></tr></thead>
          <tbody>
            <tr><td><a href="LegislationDetail.aspx?ID=1">O2014-1</a></td><td>Alley repairs</td></tr>
            <tr><td><a href="LegislationDetail.aspx?ID=2">O2014-2</a></td><td> </td></tr>
          </tbody>
        </table>
        </body></html>
    "#;

    const DETAIL: &str = r#"
        <html><body>
        <table>
          <tr><td>File #:</td><td>O2014-1</td></tr>
          <tr><td>Law number:</td><td>L-77</td></tr>
        </table>
        </body></html>
    "#;

    fn test_config() -> Config {
        Config::base("Testville", "https://testville.legistar.com")
            .with_test_mode()
            .with_scope(
                Scope::BillsSearch,
                ScopeConfig::new()
                    .with_labels(LabelTable::from_pairs(&[
                        ("file_number", "File #"),
                        ("title", "Title"),
                    ]))
                    .with_view("bills.search")
                    .with_table("bills.search_table")
                    .with_row("bills.search_row")
                    .with_detail_available(),
            )
            .with_scope(
                Scope::BillsDetail,
                ScopeConfig::new()
                    .with_labels(LabelTable::from_pairs(&[
                        ("file_number", "File #"),
                        ("law_number", "Law number"),
                    ]))
                    .with_view("bills.detail"),
            )
    }

    fn test_registry() -> ComponentRegistry {
        let mut registry = ComponentRegistry::new();
        registry.register_search(
            "bills.search",
            SearchSchema::new(Scope::BillsSearch, "bills search"),
        );
        registry.register_table("bills.search_table", TableSchema::new(Scope::BillsSearch));
        registry.register_row(
            "bills.search_row",
            RowSchema::new(
                Scope::BillsSearch,
                FieldSchema::new()
                    .with_text("file_number")
                    .with_scalar("gate", |scope| {
                        // Rows without a title are not worth keeping.
                        if scope.fields.text("title")?.is_none() {
                            Ok(ScalarOutcome::SkipDocument)
                        } else {
                            Ok(ScalarOutcome::Value(Value::Null))
                        }
                    })
                    .with_sources("sources"),
            )
            .with_detail_link("file_number"),
        );
        registry.register_detail(
            "bills.detail",
            DetailSchema::new(
                Scope::BillsDetail,
                FieldSchema::new()
                    .with_text("file_number")
                    .with_text("law_number")
                    .with_sources("sources"),
                "bill detail",
            ),
        );
        registry
    }

    fn test_site() -> Site {
        let fetcher = StaticFetcher::new()
            .with_page(TAB_URL, RESULTS)
            .with_page(DETAIL_URL, DETAIL);
        Site::new(
            Rc::new(test_config()),
            Rc::new(test_registry()),
            Rc::new(fetcher),
        )
        .unwrap()
    }

    #[test]
    fn test_site_new_rejects_dangling_key() {
        let config = test_config().with_scope(
            Scope::BillsSearch,
            ScopeConfig::new().with_row("bills.no_such_row"),
        );
        let err = Site::new(
            Rc::new(config),
            Rc::new(test_registry()),
            Rc::new(StaticFetcher::new()),
        )
        .unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownComponent { .. }));
    }

    #[test]
    fn test_search_skips_rows_and_records_provenance() {
        let site = test_site();
        let docs: Vec<_> = site
            .search(Family::Bills)
            .unwrap()
            .documents()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();

        // The titleless second row was skipped, not errored.
        assert_eq!(docs.len(), 1);
        assert_eq!(
            docs[0].document.to_json().unwrap(),
            format!(
                r#"{{"file_number":"O2014-1","gate":null,"sources":[{{"url":"{TAB_URL}","note":"bills search"}}]}}"#
            )
        );
        assert_eq!(docs[0].detail_url.as_deref(), Some(DETAIL_URL));
    }

    #[test]
    fn test_follow_merges_search_and_detail_sources() {
        let site = test_site();
        let doc = site
            .search(Family::Bills)
            .unwrap()
            .documents()
            .unwrap()
            .next()
            .unwrap()
            .unwrap();

        let Built::Document(detail) = doc.follow().unwrap().unwrap() else {
            panic!("expected a detail document");
        };
        assert_eq!(
            detail.to_json().unwrap(),
            format!(
                r#"{{"file_number":"O2014-1","law_number":"L-77","sources":[{{"url":"{TAB_URL}","note":"bills search"}},{{"url":"{DETAIL_URL}","note":"bill detail"}}]}}"#
            )
        );
    }

    #[test]
    fn test_sibling_rows_do_not_share_sources() {
        // Two builds of the same view produce identical documents.
        let site = test_site();
        let first: Vec<_> = site
            .search(Family::Bills)
            .unwrap()
            .documents()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        let second: Vec<_> = site
            .search(Family::Bills)
            .unwrap()
            .documents()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap();
        assert_eq!(
            first[0].document.to_json().unwrap(),
            second[0].document.to_json().unwrap()
        );
    }

    #[test]
    fn test_site_detail_builds_standalone() {
        let site = test_site();
        let view = site.detail(Scope::BillsDetail, DETAIL_URL).unwrap();
        let Built::Document(doc) = view.build().unwrap() else {
            panic!("expected a detail document");
        };
        assert_eq!(doc.text("law_number"), Some("L-77"));
    }

    #[test]
    fn test_search_without_view_key_is_unconfigured() {
        let config = Config::base("Testville", "https://testville.legistar.com");
        let site = Site::new(
            Rc::new(config),
            Rc::new(test_registry()),
            Rc::new(StaticFetcher::new()),
        )
        .unwrap();
        let err = site.search(Family::Bills).unwrap_err();
        assert!(matches!(err, ScrapeError::ScopeUnconfigured { .. }));
    }
}

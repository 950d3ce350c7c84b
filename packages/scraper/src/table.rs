//! Paginated results tables.
//!
//! A [`Table`] walks the repeating results region of a portal page
//! across its result pages, yielding one [`TableRow`] per body row.
//! Pages are fetched only when every row already produced has been
//! consumed; the next page is found through the current-page marker's
//! following sibling anchor, and a page carrying a no-records sentinel
//! ends the sequence.

use std::collections::VecDeque;
use std::rc::Rc;

use scraper::{Html, Selector};

use crate::aggregate::{BuildScope, Built, FieldSchema};
use crate::components::ComponentRegistry;
use crate::config::Scope;
use crate::context::ScrapeContext;
use crate::dom;
use crate::error::Result;
use crate::fields::FieldMap;

/// Configuration of one results-table component.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub scope: Scope,
    /// Selector override for the results region; unset means the
    /// config's portal-wide selector.
    pub results_selector: Option<String>,
}

impl TableSchema {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            results_selector: None,
        }
    }

    /// Builder: override the results-region selector.
    #[must_use]
    pub fn with_results_selector(mut self, selector: impl Into<String>) -> Self {
        self.results_selector = Some(selector.into());
        self
    }
}

/// Configuration of one row component.
#[derive(Debug, Clone)]
pub struct RowSchema {
    pub scope: Scope,
    /// Field rules applied when a row is built into a document.
    pub fields: FieldSchema,
    /// Field key whose first link is the row's detail url.
    pub detail_link: Option<String>,
}

impl RowSchema {
    #[must_use]
    pub fn new(scope: Scope, fields: FieldSchema) -> Self {
        Self {
            scope,
            fields,
            detail_link: None,
        }
    }

    /// Builder: name the field carrying the detail link.
    #[must_use]
    pub fn with_detail_link(mut self, field: impl Into<String>) -> Self {
        self.detail_link = Some(field.into());
        self
    }
}

/// One results row with owned cells.
///
/// The row keeps the context of the page it came from, so provenance
/// and link resolution stay tied to that page even after the walk has
/// moved on. Its [`FieldMap`] is also usable directly, for components
/// that read single cells without building a document.
#[derive(Debug)]
pub struct TableRow {
    ctx: ScrapeContext,
    fields: FieldMap,
}

impl TableRow {
    fn new(ctx: ScrapeContext, fields: FieldMap) -> Self {
        Self { ctx, fields }
    }

    /// The labelled cells of this row.
    #[must_use]
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Context bound to the page this row was extracted from.
    #[must_use]
    pub fn ctx(&self) -> &ScrapeContext {
        &self.ctx
    }

    /// Url of the result page this row came from.
    #[must_use]
    pub fn page_url(&self) -> &str {
        self.ctx.url()
    }

    /// The row's detail url, when its schema names a link field.
    pub fn detail_url(&self, schema: &RowSchema) -> Result<Option<String>> {
        match &schema.detail_link {
            Some(field) => self.fields.url(field),
            None => Ok(None),
        }
    }

    /// Build this row into a document under the given context.
    pub fn build_in(
        &self,
        ctx: &ScrapeContext,
        components: &Rc<ComponentRegistry>,
        schema: &RowSchema,
    ) -> Result<Built> {
        let scope = BuildScope {
            fields: &self.fields,
            ctx,
            components,
            page: None,
        };
        schema.fields.build(&scope)
    }
}

/// Walks one results table across its result pages.
#[derive(Debug)]
pub struct Table {
    ctx: ScrapeContext,
    row_scope: Scope,
    results_selector: String,
}

impl Table {
    /// Bind a table schema to the context its first page was fetched
    /// under. The row schema decides which scope's labels the extracted
    /// cells are read with.
    #[must_use]
    pub fn new(ctx: &ScrapeContext, schema: &TableSchema, rows: &RowSchema) -> Self {
        let results_selector = schema
            .results_selector
            .clone()
            .unwrap_or_else(|| ctx.config().results_table_selector.clone());
        Self {
            ctx: ctx.clone(),
            row_scope: rows.scope,
            results_selector,
        }
    }

    /// Lazy row sequence starting from an already-fetched first page.
    pub fn rows(&self, first_page: &Html) -> Result<Rows> {
        Rows::start(self, first_page)
    }
}

/// Lazy sequence of [`TableRow`]s across result pages.
///
/// Fetch and extraction errors are yielded once, after which the
/// sequence is exhausted.
pub struct Rows {
    ctx: ScrapeContext,
    row_scope: Scope,
    results_selector: Selector,
    marker_selector: Selector,
    sentinels: Vec<String>,
    queue: VecDeque<TableRow>,
    next_url: Option<String>,
    done: bool,
}

impl Rows {
    fn start(table: &Table, first_page: &Html) -> Result<Self> {
        let results_selector = dom::parse_selector(&table.results_selector)?;
        let marker_selector = dom::parse_selector(&table.ctx.config().current_page_selector)?;
        let mut rows = Self {
            ctx: table.ctx.clone(),
            row_scope: table.row_scope,
            results_selector,
            marker_selector,
            sentinels: table.ctx.config().no_records_sentinels.clone(),
            queue: VecDeque::new(),
            next_url: None,
            done: false,
        };
        let first_ctx = rows.ctx.clone();
        rows.ingest(first_page, &first_ctx)?;
        Ok(rows)
    }

    /// Extract one page's rows and the link to the page after it.
    fn ingest(&mut self, doc: &Html, page_ctx: &ScrapeContext) -> Result<()> {
        self.next_url = None;

        if dom::matches_sentinel(doc, &self.sentinels) {
            tracing::debug!(url = %page_ctx.url(), "No-records sentinel, ending walk");
            return Ok(());
        }

        match dom::results_region(doc, &self.results_selector) {
            Some(region) => {
                let headers = dom::header_labels(region)?;
                for cells in dom::body_rows(region, &headers, page_ctx.url())? {
                    self.queue.push_back(TableRow::new(
                        page_ctx.clone(),
                        FieldMap::new(page_ctx.config_rc(), self.row_scope, cells),
                    ));
                }
            }
            None => {
                tracing::warn!(url = %page_ctx.url(), "No results region on page");
            }
        }

        self.next_url = dom::next_page_url(doc, &self.marker_selector, page_ctx.url());
        Ok(())
    }

    /// Fetch the next page, if any. True when a page was ingested.
    fn advance(&mut self) -> Result<bool> {
        let Some(url) = self.next_url.take() else {
            return Ok(false);
        };
        tracing::debug!(url = %url, "Fetching next result page");
        let body = self.ctx.fetcher().get(&url)?;
        let doc = dom::parse_page(&body);
        let page_ctx = self.ctx.with_url(url);
        self.ingest(&doc, &page_ctx)?;
        Ok(true)
    }
}

impl Iterator for Rows {
    type Item = Result<TableRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            if let Some(row) = self.queue.pop_front() {
                return Some(Ok(row));
            }
            match self.advance() {
                Ok(true) => {}
                Ok(false) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, LabelTable, ScopeConfig};
    use crate::http::testing::StaticFetcher;
    use pretty_assertions::assert_eq;

    const PAGE_ONE_URL: &str = "https://testville.legistar.com/Legislation.aspx";
    const PAGE_TWO_URL: &str = "https://testville.legistar.com/Legislation.aspx?Page=2";

    const PAGE_ONE: &str = r#"
        <html><body>
        <table class="rgMasterTable">
          <thead><tr><th>File #</th><th>Title</th></tr></thead>
          <tbody>
            <tr><td><a href="LegislationDetail.aspx?ID=1">O2014-1</a></td><td>Alley repairs</td></tr>
            <tr><td><a href="LegislationDetail.aspx?ID=2">O2014-2</a></td><td>Sidewalk cafe</td></tr>
          </tbody>
        </table>
        <div>
          <a class="rgCurrentPage"><span>1</span></a>
          <a href="Legislation.aspx?Page=2"><span>2</span></a>
        </div>
        </body></html>
    "#;

    const PAGE_TWO: &str = r#"
        <html><body>
        <table class="rgMasterTable">
          <thead><tr><th>File #</th><th>Title</th></tr></thead>
          <tbody>
            <tr><td><a href="LegislationDetail.aspx?ID=3">O2014-3</a></td><td>Honorary street</td></tr>
          </tbody>
        </table>
        <div>
          <a href="Legislation.aspx?Page=1"><span>1</span></a>
          <a class="rgCurrentPage"><span>2</span></a>
        </div>
        </body></html>
    "#;

    fn bills_config() -> Config {
        Config::base("Testville", "https://testville.legistar.com").with_scope(
            Scope::BillsSearch,
            ScopeConfig::new().with_labels(LabelTable::from_pairs(&[
                ("file_number", "File #"),
                ("title", "Title"),
            ])),
        )
    }

    fn walk(fetcher: StaticFetcher, first_page: &str) -> Vec<TableRow> {
        let ctx = ScrapeContext::new(Rc::new(bills_config()), Rc::new(fetcher))
            .with_url(PAGE_ONE_URL);
        let schema = TableSchema::new(Scope::BillsSearch);
        let rows_schema = RowSchema::new(Scope::BillsSearch, FieldSchema::new());
        let table = Table::new(&ctx, &schema, &rows_schema);
        let doc = dom::parse_page(first_page);
        table
            .rows(&doc)
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_walk_follows_next_page_links() {
        let fetcher = StaticFetcher::new().with_page(PAGE_TWO_URL, PAGE_TWO);
        let rows = walk(fetcher, PAGE_ONE);

        assert_eq!(rows.len(), 3);
        let files: Vec<_> = rows
            .iter()
            .map(|r| r.fields().text("file_number").unwrap().unwrap())
            .collect();
        assert_eq!(files, vec!["O2014-1", "O2014-2", "O2014-3"]);
        // Rows remember the page they came from.
        assert_eq!(rows[0].page_url(), PAGE_ONE_URL);
        assert_eq!(rows[2].page_url(), PAGE_TWO_URL);
    }

    #[test]
    fn test_terminal_page_stops_without_fetching() {
        // No canned second page: a fetch attempt would error the walk.
        let rows = walk(StaticFetcher::new(), PAGE_TWO);
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_sentinel_page_is_empty_not_error() {
        let page = "<html><body><span>No records were found</span></body></html>";
        let rows = walk(StaticFetcher::new(), page);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_page_without_region_is_empty() {
        let page = "<html><body><p>layout changed</p></body></html>";
        let rows = walk(StaticFetcher::new(), page);
        assert!(rows.is_empty());
    }

    #[test]
    fn test_fetch_error_is_yielded_once() {
        // Page one links onward but no second page is canned.
        let ctx = ScrapeContext::new(Rc::new(bills_config()), Rc::new(StaticFetcher::new()))
            .with_url(PAGE_ONE_URL);
        let schema = TableSchema::new(Scope::BillsSearch);
        let rows_schema = RowSchema::new(Scope::BillsSearch, FieldSchema::new());
        let table = Table::new(&ctx, &schema, &rows_schema);
        let doc = dom::parse_page(PAGE_ONE);

        let mut rows = table.rows(&doc).unwrap();
        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_ok());
        assert!(rows.next().unwrap().is_err());
        assert!(rows.next().is_none());
    }

    #[test]
    fn test_detail_url_reads_link_field() {
        let fetcher = StaticFetcher::new().with_page(PAGE_TWO_URL, PAGE_TWO);
        let rows = walk(fetcher, PAGE_ONE);
        let schema = RowSchema::new(Scope::BillsSearch, FieldSchema::new())
            .with_detail_link("file_number");

        assert_eq!(
            rows[0].detail_url(&schema).unwrap().as_deref(),
            Some("https://testville.legistar.com/LegislationDetail.aspx?ID=1")
        );
    }

    #[test]
    fn test_build_in_applies_row_schema() {
        let fetcher = StaticFetcher::new().with_page(PAGE_TWO_URL, PAGE_TWO);
        let rows = walk(fetcher, PAGE_ONE);
        let schema = RowSchema::new(
            Scope::BillsSearch,
            FieldSchema::new().with_text("file_number").with_text("title"),
        );
        let components = Rc::new(ComponentRegistry::new());

        let built = rows[0]
            .build_in(rows[0].ctx(), &components, &schema)
            .unwrap();
        let Built::Document(doc) = built else {
            panic!("expected a document");
        };
        assert_eq!(
            doc.to_json().unwrap(),
            r#"{"file_number":"O2014-1","title":"Alley repairs"}"#
        );
    }
}

//! Per-jurisdiction configuration.
//!
//! One [`Config`] describes one Legistar InSite portal: its root url,
//! identifiers, fixed UTC offset, date formats, page-structure selectors,
//! and a [`ScopeConfig`] per extraction scope carrying the scope's label
//! table, component keys, and search-query fields. The portal template is
//! shared across hundreds of sites; a jurisdiction config only overrides
//! what its site renders differently.

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use chrono::FixedOffset;
use indexmap::IndexMap;

use crate::error::{Result, ScrapeError};

/// HTTP request timeout in seconds.
pub const HTTP_TIMEOUT_SECS: u64 = 30;

/// Default date format used by portal tables (`05/06/2014`).
pub const DEFAULT_DATETIME_FORMAT: &str = "%m/%d/%Y";

/// Datetime format used by event listings (`05/06/2014 10:00 AM`).
pub const EVENT_DATETIME_FORMAT: &str = "%m/%d/%Y %I:%M %p";

/// Selector for the repeating results region on search and detail pages.
pub const RESULTS_TABLE_SELECTOR: &str = "table[class*='rgMaster']";

/// Selector for the pagination marker of the current page.
pub const CURRENT_PAGE_SELECTOR: &str = "[class*='rgCurrentPage']";

/// Literal sentinels a portal renders instead of an empty results table.
pub const NO_RECORDS_SENTINELS: &[&str] =
    &["No records were found", "No records to display."];

/// Organization types every portal maps the same way.
const DEFAULT_CLASSIFICATIONS: &[(&str, &str)] = &[
    ("Department", "commission"),
    ("Clerk", "commission"),
    ("Executive Office", "commission"),
    ("Agency", "commission"),
    ("Primary Legislative Body", "legislature"),
    ("Secondary Legislative Body", "legislature"),
    ("City Council", "legislature"),
    ("Board of Supervisors", "legislature"),
];

/// Canonical classification names probed as substrings, in order.
const CLASSIFICATION_SUBSTRINGS: &[&str] =
    &["legislature", "party", "committee", "commission"];

/// Keyword fallback: whole words of the type string mapped to a class.
const CLASSIFICATION_KEYWORDS: &[(&str, &str)] = &[("board", "commission")];

static EMPTY_SCOPE: LazyLock<ScopeConfig> = LazyLock::new(ScopeConfig::default);

/// The zero offset, for configs that never set one.
fn utc() -> FixedOffset {
    #[allow(clippy::expect_used)] // Zero is always a valid offset
    FixedOffset::east_opt(0).expect("zero offset")
}

/// Document family served by one portal tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Bills,
    People,
    Orgs,
    Events,
}

impl Family {
    /// All families, in tab order.
    pub const ALL: [Family; 4] = [Family::Bills, Family::People, Family::Orgs, Family::Events];

    /// Stable lowercase name, as used on the CLI.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Family::Bills => "bills",
            Family::People => "people",
            Family::Orgs => "orgs",
            Family::Events => "events",
        }
    }

    /// The search scope for this family.
    #[must_use]
    pub fn search_scope(self) -> Scope {
        match self {
            Family::Bills => Scope::BillsSearch,
            Family::People => Scope::PeopleSearch,
            Family::Orgs => Scope::OrgsSearch,
            Family::Events => Scope::EventsSearch,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extraction scope: one page region with its own labels and components.
///
/// Search scopes cover result tables, detail scopes cover one record's
/// page, and the bills family has two extra scopes for the nested
/// actions-and-votes chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    BillsSearch,
    BillsDetail,
    /// Action rows of a bill detail page.
    BillsActions,
    /// One action's own page, including its votes table.
    BillsActionDetail,
    PeopleSearch,
    PeopleDetail,
    OrgsSearch,
    OrgsDetail,
    EventsSearch,
    EventsDetail,
    /// Agenda-item rows of an event detail page.
    EventsAgenda,
}

impl Scope {
    /// Stable dotted name for error messages and logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Scope::BillsSearch => "bills.search",
            Scope::BillsDetail => "bills.detail",
            Scope::BillsActions => "bills.actions",
            Scope::BillsActionDetail => "bills.action_detail",
            Scope::PeopleSearch => "people.search",
            Scope::PeopleDetail => "people.detail",
            Scope::OrgsSearch => "orgs.search",
            Scope::OrgsDetail => "orgs.detail",
            Scope::EventsSearch => "events.search",
            Scope::EventsDetail => "events.detail",
            Scope::EventsAgenda => "events.agenda",
        }
    }

    /// The scope a row of this scope links onward to, if rows here carry
    /// detail links. Bounds the recursion at bills → actions → votes.
    #[must_use]
    pub fn detail_scope(self) -> Option<Scope> {
        match self {
            Scope::BillsSearch => Some(Scope::BillsDetail),
            Scope::BillsActions => Some(Scope::BillsActionDetail),
            Scope::PeopleSearch => Some(Scope::PeopleDetail),
            Scope::OrgsSearch => Some(Scope::OrgsDetail),
            Scope::EventsSearch => Some(Scope::EventsDetail),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field key → on-page label for one scope.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: IndexMap<String, String>,
}

impl LabelTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from literal pairs, in declaration order.
    #[must_use]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut table = Self::new();
        for (field, label) in pairs {
            table.set(*field, *label);
        }
        table
    }

    /// Set or replace one field's label.
    pub fn set(&mut self, field: impl Into<String>, label: impl Into<String>) {
        self.labels.insert(field.into(), label.into());
    }

    /// Builder form of [`LabelTable::set`].
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, label: impl Into<String>) -> Self {
        self.set(field, label);
        self
    }

    /// The on-page label for a field key.
    #[must_use]
    pub fn label(&self, field: &str) -> Option<&str> {
        self.labels.get(field).map(String::as_str)
    }

    /// True when no labels are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Configuration for one extraction scope.
#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    /// Label table for this scope's fields.
    pub labels: LabelTable,
    /// Datetime format override; falls back to the config default.
    pub datetime_format: Option<String>,
    /// View component key (search view for search scopes, detail view
    /// for detail scopes).
    pub view: Option<String>,
    /// Results-table component key.
    pub table: Option<String>,
    /// Row component key for the results table.
    pub row: Option<String>,
    /// Search-form component key.
    pub form: Option<String>,
    /// Whether rows of this scope link to a detail page worth following.
    pub detail_available: bool,
    /// Literal ASPX control name → value pairs posted with the search.
    pub query_fields: Vec<(String, String)>,
    /// Row field keys whose cells are media links (video, audio, ...).
    pub media_fields: Vec<String>,
}

impl ScopeConfig {
    /// Create an empty scope config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the label table.
    #[must_use]
    pub fn with_labels(mut self, labels: LabelTable) -> Self {
        self.labels = labels;
        self
    }

    /// Builder: set the datetime format override.
    #[must_use]
    pub fn with_datetime_format(mut self, format: impl Into<String>) -> Self {
        self.datetime_format = Some(format.into());
        self
    }

    /// Builder: set the view component key.
    #[must_use]
    pub fn with_view(mut self, key: impl Into<String>) -> Self {
        self.view = Some(key.into());
        self
    }

    /// Builder: set the table component key.
    #[must_use]
    pub fn with_table(mut self, key: impl Into<String>) -> Self {
        self.table = Some(key.into());
        self
    }

    /// Builder: set the row component key.
    #[must_use]
    pub fn with_row(mut self, key: impl Into<String>) -> Self {
        self.row = Some(key.into());
        self
    }

    /// Builder: set the form component key.
    #[must_use]
    pub fn with_form(mut self, key: impl Into<String>) -> Self {
        self.form = Some(key.into());
        self
    }

    /// Builder: mark rows of this scope as carrying usable detail links.
    #[must_use]
    pub fn with_detail_available(mut self) -> Self {
        self.detail_available = true;
        self
    }

    /// Builder: add one literal query field.
    #[must_use]
    pub fn with_query_field(
        mut self,
        control: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.query_fields.push((control.into(), value.into()));
        self
    }

    /// Builder: set the media field keys.
    #[must_use]
    pub fn with_media_fields(mut self, fields: &[&str]) -> Self {
        self.media_fields = fields.iter().map(|f| (*f).to_string()).collect();
        self
    }
}

/// One jurisdiction's portal configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Display name, e.g. "Chicago".
    pub name: String,
    /// Portal root, e.g. `https://chicago.legistar.com`.
    pub root_url: String,
    /// OCD division identifier, if known.
    pub division_id: Option<String>,
    /// Alias strings the registry also indexes this config under.
    pub nicknames: Vec<String>,
    /// Fixed UTC offset portal timestamps are localized to.
    pub utc_offset: FixedOffset,
    /// Default date format; scopes may override.
    pub datetime_format: String,
    /// Selector for the repeating results region.
    pub results_table_selector: String,
    /// Selector for the current-page pagination marker.
    pub current_page_selector: String,
    /// Sentinels meaning "empty result set".
    pub no_records_sentinels: Vec<String>,
    /// Landing path per family, joined onto `root_url`.
    pub tab_paths: HashMap<Family, String>,
    /// Per-scope configuration.
    pub scopes: HashMap<Scope, ScopeConfig>,
    /// Organization-type → classification overrides for this site.
    pub classification_overrides: HashMap<String, String>,
    /// When set, forms use the GET page as the first results page
    /// without posting. Used for fixture-driven runs.
    pub test_mode: bool,
}

impl Config {
    /// Portal-template defaults with no scopes configured.
    ///
    /// Family modules contribute default scopes; jurisdictions override
    /// entries on top. UTC offset starts at UTC.
    #[must_use]
    pub fn base(name: impl Into<String>, root_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_url: root_url.into(),
            division_id: None,
            nicknames: Vec::new(),
            utc_offset: utc(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            results_table_selector: RESULTS_TABLE_SELECTOR.to_string(),
            current_page_selector: CURRENT_PAGE_SELECTOR.to_string(),
            no_records_sentinels: NO_RECORDS_SENTINELS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            tab_paths: HashMap::from([
                (Family::Bills, "Legislation.aspx".to_string()),
                (Family::People, "People.aspx".to_string()),
                (Family::Orgs, "Departments.aspx".to_string()),
                (Family::Events, "Calendar.aspx".to_string()),
            ]),
            scopes: HashMap::new(),
            classification_overrides: HashMap::new(),
            test_mode: false,
        }
    }

    /// Builder: set the OCD division id.
    #[must_use]
    pub fn with_division_id(mut self, id: impl Into<String>) -> Self {
        self.division_id = Some(id.into());
        self
    }

    /// Builder: add a nickname alias.
    #[must_use]
    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nicknames.push(nickname.into());
        self
    }

    /// Builder: set the fixed UTC offset in whole hours east of UTC
    /// (negative for the Americas).
    #[must_use]
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        if let Some(offset) = FixedOffset::east_opt(hours * 3600) {
            self.utc_offset = offset;
        }
        self
    }

    /// Builder: add one classification override.
    #[must_use]
    pub fn with_classification(
        mut self,
        org_type: impl Into<String>,
        classification: impl Into<String>,
    ) -> Self {
        self.classification_overrides
            .insert(org_type.into(), classification.into());
        self
    }

    /// Builder: replace one scope's configuration.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope, config: ScopeConfig) -> Self {
        self.scopes.insert(scope, config);
        self
    }

    /// Builder: enable fixture test mode.
    #[must_use]
    pub fn with_test_mode(mut self) -> Self {
        self.test_mode = true;
        self
    }

    /// Configuration for a scope; unset scopes read as empty.
    #[must_use]
    pub fn scope(&self, scope: Scope) -> &ScopeConfig {
        self.scopes.get(&scope).unwrap_or(&EMPTY_SCOPE)
    }

    /// Mutable configuration for a scope, created empty if unset.
    pub fn scope_mut(&mut self, scope: Scope) -> &mut ScopeConfig {
        self.scopes.entry(scope).or_default()
    }

    /// The datetime format in effect for a scope.
    #[must_use]
    pub fn datetime_format_for(&self, scope: Scope) -> &str {
        self.scope(scope)
            .datetime_format
            .as_deref()
            .unwrap_or(&self.datetime_format)
    }

    /// Network host of `root_url`, the registry's primary key.
    pub fn host(&self) -> Result<String> {
        let parsed = url::Url::parse(&self.root_url).map_err(|e| ScrapeError::InvalidUrl {
            url: self.root_url.clone(),
            message: e.to_string(),
        })?;
        parsed
            .host_str()
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::InvalidUrl {
                url: self.root_url.clone(),
                message: "no host".to_string(),
            })
    }

    /// Absolute landing url for a family tab.
    pub fn tab_url(&self, family: Family) -> Result<String> {
        let base = url::Url::parse(&self.root_url).map_err(|e| ScrapeError::InvalidUrl {
            url: self.root_url.clone(),
            message: e.to_string(),
        })?;
        let path = self
            .tab_paths
            .get(&family)
            .map(String::as_str)
            .unwrap_or_default();
        let joined = base.join(path).map_err(|e| ScrapeError::InvalidUrl {
            url: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(joined.to_string())
    }

    /// Classify an organization-type string.
    ///
    /// Resolution order: jurisdiction overrides, portal-wide defaults, a
    /// case-insensitive substring probe for the canonical names, then a
    /// whole-word keyword table. No match is a configuration-authoring
    /// error telling the operator to extend the overrides.
    pub fn classification(&self, org_type: &str) -> Result<String> {
        if let Some(class) = self.classification_overrides.get(org_type) {
            return Ok(class.clone());
        }
        if let Some((_, class)) = DEFAULT_CLASSIFICATIONS
            .iter()
            .find(|(ty, _)| *ty == org_type)
        {
            return Ok((*class).to_string());
        }
        let lower = org_type.to_lowercase();
        for canonical in CLASSIFICATION_SUBSTRINGS {
            if lower.contains(canonical) {
                return Ok((*canonical).to_string());
            }
        }
        for word in lower.split_whitespace() {
            for (keyword, class) in CLASSIFICATION_KEYWORDS {
                if word == *keyword {
                    return Ok((*class).to_string());
                }
            }
        }
        Err(ScrapeError::UnmappedClassification {
            org_type: org_type.to_string(),
            jurisdiction: self.name.clone(),
        })
    }

    /// Validate everything checkable without a network: the root url
    /// parses and has a host, and both structural selectors compile.
    pub fn validate(&self) -> Result<()> {
        self.host()?;
        for selector in [&self.results_table_selector, &self.current_page_selector] {
            scraper::Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
                selector: selector.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

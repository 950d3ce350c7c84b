//! Label-addressed field access over extracted cells.
//!
//! A [`FieldMap`] pairs one row's (or one detail page's) cells with the
//! active scope's label table. Lookups are by *field key*; the map
//! translates to the on-page label first. A field key missing from the
//! label table is a configuration-authoring error; a label the page does
//! not render is ordinary absence.

use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use indexmap::IndexMap;

use crate::config::{Config, Scope};
use crate::error::{Result, ScrapeError};

/// An anchor extracted from a cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Link {
    /// Collapsed anchor text, absent for image-only anchors.
    pub text: Option<String>,
    /// Absolutized href, absent for anchors without one.
    pub url: Option<String>,
}

/// One owned table or detail-page cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cell {
    /// Collapsed text, absent when whitespace-only.
    pub text: Option<String>,
    /// First anchor url in the cell.
    pub url: Option<String>,
    /// Every anchor in the cell, in document order.
    pub links: Vec<Link>,
}

/// Parse portal date text with a scope's format string.
///
/// Tries a full datetime parse first, then a date-only parse at
/// midnight. Text that matches neither is a fatal config/format
/// mismatch, not a recoverable absence.
pub(crate) fn parse_datetime(
    text: &str,
    format: &str,
    offset: FixedOffset,
    field: &str,
) -> Result<DateTime<FixedOffset>> {
    let mismatch = || ScrapeError::DateFormat {
        field: field.to_string(),
        text: text.to_string(),
        format: format.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(mismatch)?;

    offset
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(mismatch)
}

/// Scope-aware field lookup over one row's or page's cells.
pub struct FieldMap {
    config: Rc<Config>,
    scope: Scope,
    cells: IndexMap<String, Cell>,
}

impl FieldMap {
    /// Bind extracted cells to a scope's labels.
    #[must_use]
    pub fn new(config: Rc<Config>, scope: Scope, cells: IndexMap<String, Cell>) -> Self {
        Self {
            config,
            scope,
            cells,
        }
    }

    /// The scope these fields belong to.
    #[must_use]
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// True when no cells were extracted at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    fn label(&self, field: &str) -> Result<&str> {
        self.config
            .scope(self.scope)
            .labels
            .label(field)
            .ok_or_else(|| ScrapeError::MissingLabel {
                scope: self.scope.to_string(),
                field: field.to_string(),
            })
    }

    /// The cell under a field's label, if the page rendered it.
    pub fn cell(&self, field: &str) -> Result<Option<&Cell>> {
        let label = self.label(field)?;
        Ok(self.cells.get(label))
    }

    /// Text of a field's cell.
    pub fn text(&self, field: &str) -> Result<Option<String>> {
        Ok(self.cell(field)?.and_then(|c| c.text.clone()))
    }

    /// First anchor url of a field's cell.
    pub fn url(&self, field: &str) -> Result<Option<String>> {
        Ok(self.cell(field)?.and_then(|c| c.url.clone()))
    }

    /// Every anchor of a field's cell; absent cells read as no links.
    pub fn links(&self, field: &str) -> Result<Vec<Link>> {
        Ok(self
            .cell(field)?
            .map(|c| c.links.clone())
            .unwrap_or_default())
    }

    /// Parsed date of a field's cell, localized to the jurisdiction's
    /// UTC offset.
    pub fn date(&self, field: &str) -> Result<Option<DateTime<FixedOffset>>> {
        let Some(text) = self.text(field)? else {
            return Ok(None);
        };
        let format = self.config.datetime_format_for(self.scope);
        parse_datetime(&text, format, self.config.utc_offset, field).map(Some)
    }
}

impl fmt::Debug for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldMap")
            .field("scope", &self.scope)
            .field("labels", &self.cells.keys().collect::<Vec<_>>())
            .finish()
    }
}

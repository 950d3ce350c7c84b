//! DOM helpers over parsed portal pages.
//!
//! Everything here extracts *owned* data (strings, [`Cell`]s) from a
//! borrowed [`Html`] document, so callers never hold references into a
//! page across a fetch. Hrefs are absolutized against the page url at
//! extraction time.

use indexmap::IndexMap;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Result, ScrapeError};
use crate::fields::{Cell, Link};

/// Compile a selector, surfacing bad config as [`ScrapeError::InvalidSelector`].
pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| ScrapeError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parse one fetched page.
#[must_use]
pub(crate) fn parse_page(html: &str) -> Html {
    Html::parse_document(html)
}

/// Collapse runs of whitespace (including non-breaking spaces) to single
/// spaces and trim.
#[must_use]
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Collapsed text content of an element; empty text reads as absent.
#[must_use]
pub(crate) fn element_text(el: ElementRef<'_>) -> Option<String> {
    let text = collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Resolve `href` against the page url.
#[must_use]
pub(crate) fn absolutize(page_url: &str, href: &str) -> Option<String> {
    let base = url::Url::parse(page_url).ok()?;
    match base.join(href) {
        Ok(joined) => Some(joined.to_string()),
        Err(e) => {
            tracing::debug!(href = %href, error = %e, "Could not absolutize href");
            None
        }
    }
}

/// True when the page text contains any of the no-records sentinels.
#[must_use]
pub(crate) fn matches_sentinel(doc: &Html, sentinels: &[String]) -> bool {
    let text = collapse_whitespace(&doc.root_element().text().collect::<Vec<_>>().join(" "));
    sentinels.iter().any(|s| text.contains(s.as_str()))
}

/// First results region matching the configured selector.
#[must_use]
pub(crate) fn results_region<'a>(doc: &'a Html, selector: &Selector) -> Option<ElementRef<'a>> {
    let mut matches = doc.select(selector);
    let first = matches.next();
    if matches.next().is_some() {
        tracing::debug!("Multiple results regions match, using the first");
    }
    first
}

/// Header labels of a results region, in column order.
pub(crate) fn header_labels(region: ElementRef<'_>) -> Result<Vec<String>> {
    let th = parse_selector("th")?;
    Ok(region
        .select(&th)
        .map(|el| element_text(el).unwrap_or_default())
        .collect())
}

fn direct_children<'a>(el: ElementRef<'a>, name: &str) -> Vec<ElementRef<'a>> {
    el.children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == name)
        .collect()
}

/// Extract one owned cell from a `td`.
fn extract_cell(td: ElementRef<'_>, page_url: &str) -> Result<Cell> {
    let anchor = parse_selector("a")?;
    let links: Vec<Link> = td
        .select(&anchor)
        .map(|a| Link {
            text: element_text(a),
            url: a
                .value()
                .attr("href")
                .and_then(|href| absolutize(page_url, href)),
        })
        .collect();
    let mut url = links.iter().find_map(|l| l.url.clone());
    if url.is_none() {
        // Image-only cells (member photos) carry their url in the src.
        let img = parse_selector("img")?;
        url = td
            .select(&img)
            .find_map(|i| i.value().attr("src"))
            .and_then(|src| absolutize(page_url, src));
    }
    Ok(Cell {
        text: element_text(td),
        url,
        links,
    })
}

/// Body rows of a results region as label → cell maps.
///
/// Rows with header cells are skipped, as are rows whose cell count does
/// not match the header count (pager rows, nested layout tables).
pub(crate) fn body_rows(
    region: ElementRef<'_>,
    headers: &[String],
    page_url: &str,
) -> Result<Vec<IndexMap<String, Cell>>> {
    let tr = parse_selector("tr")?;
    let mut rows = Vec::new();

    for row in region.select(&tr) {
        if !direct_children(row, "th").is_empty() {
            continue;
        }
        let tds = direct_children(row, "td");
        if tds.is_empty() {
            continue;
        }
        if tds.len() != headers.len() {
            tracing::debug!(
                cells = tds.len(),
                headers = headers.len(),
                "Skipping row with mismatched cell count"
            );
            continue;
        }

        let mut cells = IndexMap::new();
        for (label, td) in headers.iter().zip(tds) {
            cells.insert(label.clone(), extract_cell(td, page_url)?);
        }
        rows.push(cells);
    }
    Ok(rows)
}

/// Label/value cells of a detail page.
///
/// Detail pages lay fields out as two- or four-column rows of
/// label/value pairs; a trailing `:` on a label is trimmed and the first
/// occurrence of a label wins.
pub(crate) fn detail_fields(doc: &Html, page_url: &str) -> Result<IndexMap<String, Cell>> {
    let tr = parse_selector("tr")?;
    let mut fields = IndexMap::new();

    for row in doc.select(&tr) {
        let tds = direct_children(row, "td");
        if tds.len() != 2 && tds.len() != 4 {
            continue;
        }
        for pair in tds.chunks(2) {
            let [label_td, value_td] = pair else { continue };
            let Some(label) = element_text(*label_td) else {
                continue;
            };
            let label = label.trim_end_matches(':').trim_end().to_string();
            if label.is_empty() {
                continue;
            }
            if !fields.contains_key(&label) {
                fields.insert(label, extract_cell(*value_td, page_url)?);
            }
        }
    }
    Ok(fields)
}

/// Next-page url: the first following-sibling anchor of the current-page
/// marker, if any.
pub(crate) fn next_page_url(
    doc: &Html,
    marker_selector: &Selector,
    page_url: &str,
) -> Option<String> {
    let marker = doc.select(marker_selector).next()?;
    marker
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")
        .and_then(|a| a.value().attr("href"))
        .and_then(|href| absolutize(page_url, href))
}

/// The first form on the page: its absolutized action url and hidden
/// input payload in document order.
pub(crate) fn form_payload(
    doc: &Html,
    page_url: &str,
) -> Result<Option<(String, Vec<(String, String)>)>> {
    let form_sel = parse_selector("form")?;
    let hidden_sel = parse_selector("input[type='hidden']")?;

    let Some(form) = doc.select(&form_sel).next() else {
        return Ok(None);
    };

    let action = form
        .value()
        .attr("action")
        .and_then(|a| absolutize(page_url, a))
        .unwrap_or_else(|| page_url.to_string());

    let hidden = form
        .select(&hidden_sel)
        .filter_map(|input| {
            let name = input.value().attr("name")?;
            let value = input.value().attr("value").unwrap_or_default();
            Some((name.to_string(), value.to_string()))
        })
        .collect();

    Ok(Some((action, hidden)))
}

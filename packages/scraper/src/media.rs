//! Attachment and media link handling.
//!
//! Portal pages link attachments (exhibits, journals, video) without
//! declaring what they are. The content type comes from a HEAD request
//! when the server answers one, with a filename-extension fallback for
//! the common office formats.

use crate::aggregate::{BuildScope, ItemOutcome};
use crate::context::ScrapeContext;
use crate::document::{Document, Value};
use crate::error::Result;
use crate::fields::Link;

const EXTENSION_TYPES: &[(&str, &str)] = &[
    (".pdf", "application/pdf"),
    (".doc", "application/msword"),
    (
        ".docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
];

/// Content type of a linked file: HEAD first, then the extension table.
pub(crate) fn resolve_media_type(ctx: &ScrapeContext, url: &str) -> Result<Option<String>> {
    if let Some(content_type) = ctx.fetcher().head_content_type(url)? {
        return Ok(Some(content_type));
    }
    let lower = url.to_lowercase();
    Ok(EXTENSION_TYPES
        .iter()
        .find(|(ext, _)| lower.ends_with(ext))
        .map(|(_, content_type)| (*content_type).to_string()))
}

/// One `{name, links: [{url, media_type}]}` document for an anchor.
///
/// Anchors without an href carry nothing worth keeping.
pub(crate) fn link_document(ctx: &ScrapeContext, link: &Link) -> Result<Option<Document>> {
    let Some(url) = &link.url else {
        return Ok(None);
    };
    let media_type = resolve_media_type(ctx, url)?;

    let mut inner = Document::new();
    inner.insert("url", Value::from_text(Some(url.clone())));
    inner.insert("media_type", Value::from_text(media_type));

    let mut doc = Document::new();
    doc.insert("name", Value::from_text(link.text.clone()));
    doc.insert("links", Value::List(vec![inner]));
    Ok(Some(doc))
}

/// List producer over one link field: one attachment document per
/// anchor, dropping anchors without urls.
pub(crate) fn attachments_producer(
    field: &'static str,
) -> impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    move |scope| {
        let mut items = Vec::new();
        for link in scope.fields.links(field)? {
            match link_document(scope.ctx, &link)? {
                Some(doc) => items.push(ItemOutcome::Item(doc)),
                None => items.push(ItemOutcome::SkipItem),
            }
        }
        Ok(items)
    }
}

/// List producer over the scope's configured media fields: one media
/// document per linking cell. Cells without an href are dropped, as
/// are media columns the page does not render.
pub(crate) fn media_producer() -> impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> {
    |scope| {
        let media_fields = scope
            .ctx
            .config()
            .scope(scope.fields.scope())
            .media_fields
            .clone();
        let mut items = Vec::new();
        for field in &media_fields {
            let Some(cell) = scope.fields.cell(field)? else {
                continue;
            };
            let link = Link {
                text: cell.text.clone(),
                url: cell.url.clone(),
            };
            match link_document(scope.ctx, &link)? {
                Some(doc) => items.push(ItemOutcome::Item(doc)),
                None => items.push(ItemOutcome::SkipItem),
            }
        }
        Ok(items)
    }
}

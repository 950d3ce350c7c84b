//! Search-form submission.
//!
//! Portal search pages are ASPX forms: the landing page carries hidden
//! state inputs that must be posted back together with the query
//! controls. A [`Form`] performs that dance and hands the first results
//! page to the table walker. Some site templates ignore the first
//! submit entirely; for those, [`FormSchema::with_skip_first_submit`]
//! posts a throwaway round first and re-reads the refreshed state
//! fields from its response.

use scraper::Html;

use crate::config::Scope;
use crate::context::ScrapeContext;
use crate::dom;
use crate::error::{Result, ScrapeError};

/// Configuration of one search-form component.
#[derive(Debug, Clone)]
pub struct FormSchema {
    pub scope: Scope,
    /// Post a throwaway hidden-fields-only submit before the query.
    pub skip_first_submit: bool,
}

impl FormSchema {
    #[must_use]
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            skip_first_submit: false,
        }
    }

    /// Builder: enable the throwaway first submit.
    #[must_use]
    pub fn with_skip_first_submit(mut self) -> Self {
        self.skip_first_submit = true;
        self
    }
}

/// Submits one scope's configured query to obtain a first results page.
#[derive(Debug)]
pub struct Form {
    ctx: ScrapeContext,
    scope: Scope,
    skip_first_submit: bool,
}

impl Form {
    /// Bind a form schema to the context of its landing url.
    #[must_use]
    pub fn new(ctx: &ScrapeContext, schema: &FormSchema) -> Self {
        Self {
            ctx: ctx.clone(),
            scope: schema.scope,
            skip_first_submit: schema.skip_first_submit,
        }
    }

    /// GET the landing page and post the configured query through its
    /// form. Returns the parsed first results page and the context it
    /// was fetched under.
    ///
    /// In test mode the landing page itself is the first results page
    /// and nothing is posted.
    pub fn first_page(&self) -> Result<(Html, ScrapeContext)> {
        let url = self.ctx.url().to_string();
        tracing::debug!(url = %url, scope = %self.scope, "Opening search page");
        let body = self.ctx.fetcher().get(&url)?;
        let doc = dom::parse_page(&body);

        if self.ctx.config().test_mode {
            return Ok((doc, self.ctx.clone()));
        }

        let Some((action, hidden)) = dom::form_payload(&doc, &url)? else {
            return Err(ScrapeError::MissingForm { url });
        };

        let (action, hidden) = if self.skip_first_submit {
            self.throwaway_submit(action, hidden)?
        } else {
            (action, hidden)
        };

        let query = &self.ctx.config().scope(self.scope).query_fields;
        let payload = merge_query(hidden, query);
        tracing::debug!(url = %action, fields = payload.len(), "Submitting search");
        let body = self.ctx.fetcher().post_form(&action, &payload)?;
        let page_ctx = self.ctx.with_url(action);
        Ok((dom::parse_page(&body), page_ctx))
    }

    /// Post the hidden fields alone and re-read the refreshed state
    /// fields from the response.
    fn throwaway_submit(
        &self,
        action: String,
        hidden: Vec<(String, String)>,
    ) -> Result<(String, Vec<(String, String)>)> {
        tracing::debug!(url = %action, "Throwaway first submit");
        let body = self.ctx.fetcher().post_form(&action, &hidden)?;
        let doc = dom::parse_page(&body);
        dom::form_payload(&doc, &action)?.ok_or(ScrapeError::MissingForm { url: action })
    }
}

/// Hidden state fields plus the configured query; a query control
/// replaces a hidden field of the same name.
fn merge_query(
    hidden: Vec<(String, String)>,
    query: &[(String, String)],
) -> Vec<(String, String)> {
    let mut payload: Vec<(String, String)> = hidden
        .into_iter()
        .filter(|(name, _)| !query.iter().any(|(control, _)| control == name))
        .collect();
    payload.extend(query.iter().cloned());
    payload
}

//! Error types for the scraper.
//!
//! One crate-wide error enum, `ScrapeError`, with detailed context for
//! library consumers, plus the `Result` alias used throughout.
//!
//! Skip signals (omit one list item, omit one document) are not errors;
//! they are sum-type returns consumed by the aggregation loop. Everything
//! here stops the run for the current jurisdiction.

use thiserror::Error;

/// Main error type for the scraper library.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// No jurisdiction config matches the requested key.
    #[error("No jurisdiction found for '{key}'. Keys are host names, division ids, and nicknames")]
    ConfigNotFound { key: String },

    /// A config references a component key with no registered schema.
    #[error("No {role} component registered under key '{key}'")]
    UnknownComponent { role: &'static str, key: String },

    /// A scope is missing a component key its view flow requires.
    #[error("Scope {scope} does not configure a {role} component")]
    ScopeUnconfigured { scope: String, role: &'static str },

    /// A configured CSS selector does not parse.
    #[error("Invalid CSS selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    /// A field schema names a field with no label in the scope's table.
    #[error("No label configured for field '{field}' in scope {scope}")]
    MissingLabel { scope: String, field: String },

    /// Date text present but unparsable with the configured format.
    #[error("Date text '{text}' for field '{field}' does not match format '{format}'")]
    DateFormat {
        field: String,
        text: String,
        format: String,
    },

    /// An organization type string with no classification mapping.
    #[error("No classification for organization type '{org_type}' in {jurisdiction}. Add it to the jurisdiction's classification overrides")]
    UnmappedClassification {
        org_type: String,
        jurisdiction: String,
    },

    /// A configured url does not parse or lacks a host.
    #[error("Invalid url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// A search page carries no form element to submit.
    #[error("No form found on search page {url}")]
    MissingForm { url: String },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Retries exhausted while fetching a page.
    #[error("Fetch failed for {url} after {attempts} attempts: {message}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        message: String,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for scraper operations.
pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_not_found_display() {
        let err = ScrapeError::ConfigNotFound {
            key: "atlantis".to_string(),
        };
        assert!(err.to_string().contains("atlantis"));
        assert!(err.to_string().contains("nicknames"));
    }

    #[test]
    fn test_unknown_component_display() {
        let err = ScrapeError::UnknownComponent {
            role: "row",
            key: "bills.search_row".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "No row component registered under key 'bills.search_row'"
        );
    }

    #[test]
    fn test_date_format_display() {
        let err = ScrapeError::DateFormat {
            field: "intro_date".to_string(),
            text: "yesterday".to_string(),
            format: "%m/%d/%Y".to_string(),
        };
        assert!(err.to_string().contains("intro_date"));
        assert!(err.to_string().contains("yesterday"));
        assert!(err.to_string().contains("%m/%d/%Y"));
    }

    #[test]
    fn test_unmapped_classification_display() {
        let err = ScrapeError::UnmappedClassification {
            org_type: "Blue Ribbon Panel".to_string(),
            jurisdiction: "Chicago".to_string(),
        };
        assert!(err.to_string().contains("Blue Ribbon Panel"));
        assert!(err.to_string().contains("classification overrides"));
    }
}

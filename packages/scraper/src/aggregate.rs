//! Declarative document assembly from named field producers.
//!
//! A [`FieldSchema`] lists the fields a document shape carries, in
//! output order. Each field names a [`Producer`]; building runs the
//! producers in declaration order and collects their values into one
//! [`Document`]. Producers signal absence with null values and can
//! veto a whole document with a skip outcome.

use std::fmt;
use std::rc::Rc;

use scraper::Html;

use crate::components::ComponentRegistry;
use crate::context::ScrapeContext;
use crate::document::{Document, Value};
use crate::error::Result;
use crate::fields::FieldMap;

/// Everything a producer may read while contributing its field.
pub struct BuildScope<'a> {
    /// The current row's or page's labelled cells.
    pub fields: &'a FieldMap,
    /// Fetching and provenance state for this build.
    pub ctx: &'a ScrapeContext,
    /// Registered components, for producers that walk nested tables.
    pub components: &'a Rc<ComponentRegistry>,
    /// The parsed page, present for detail builds.
    pub page: Option<&'a Html>,
}

/// Outcome of a scalar producer.
pub enum ScalarOutcome {
    /// The field's value, possibly null.
    Value(Value),
    /// Abandon the enclosing document.
    SkipDocument,
}

/// Outcome of one candidate item inside a list producer.
pub enum ItemOutcome {
    /// Keep this item.
    Item(Document),
    /// Drop this item, keep the list.
    SkipItem,
    /// Abandon the enclosing document.
    SkipDocument,
}

/// Result of building one document.
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    Document(Document),
    Skipped,
}

pub type ScalarProducer = Rc<dyn Fn(&BuildScope<'_>) -> Result<ScalarOutcome>>;
pub type ListProducer = Rc<dyn Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>>>;

/// How one field's value is produced.
#[derive(Clone)]
pub enum Producer {
    /// Cell text under the field's configured label.
    Text,
    /// First anchor url under the field's label.
    Url,
    /// Parsed date under the field's label.
    Date,
    /// Snapshot of the provenance accumulator.
    Sources,
    /// Custom scalar logic.
    Scalar(ScalarProducer),
    /// Custom list logic.
    List(ListProducer),
}

impl fmt::Debug for Producer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Text => "Text",
            Self::Url => "Url",
            Self::Date => "Date",
            Self::Sources => "Sources",
            Self::Scalar(_) => "Scalar",
            Self::List(_) => "List",
        };
        write!(f, "{name}")
    }
}

/// One named field and its producer.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: String,
    pub producer: Producer,
}

/// Ordered field rules describing one document shape.
#[derive(Debug, Clone, Default)]
pub struct FieldSchema {
    rules: Vec<FieldRule>,
}

impl FieldSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_rule(mut self, name: impl Into<String>, producer: Producer) -> Self {
        self.rules.push(FieldRule {
            name: name.into(),
            producer,
        });
        self
    }

    /// Add a text field read from the cell under `name`'s label.
    #[must_use]
    pub fn with_text(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Producer::Text)
    }

    /// Add a url field read from the first anchor under `name`'s label.
    #[must_use]
    pub fn with_url(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Producer::Url)
    }

    /// Add a date field parsed from the cell under `name`'s label.
    #[must_use]
    pub fn with_date(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Producer::Date)
    }

    /// Add the provenance snapshot field.
    #[must_use]
    pub fn with_sources(self, name: impl Into<String>) -> Self {
        self.with_rule(name, Producer::Sources)
    }

    /// Add a field computed by a scalar producer.
    #[must_use]
    pub fn with_scalar(
        self,
        name: impl Into<String>,
        producer: impl Fn(&BuildScope<'_>) -> Result<ScalarOutcome> + 'static,
    ) -> Self {
        self.with_rule(name, Producer::Scalar(Rc::new(producer)))
    }

    /// Add a field computed by a list producer.
    #[must_use]
    pub fn with_list(
        self,
        name: impl Into<String>,
        producer: impl Fn(&BuildScope<'_>) -> Result<Vec<ItemOutcome>> + 'static,
    ) -> Self {
        self.with_rule(name, Producer::List(Rc::new(producer)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Run every producer in declaration order.
    ///
    /// The first skip outcome abandons the document; values produced
    /// before it are discarded.
    pub fn build(&self, scope: &BuildScope<'_>) -> Result<Built> {
        let mut doc = Document::new();
        for rule in &self.rules {
            let name = rule.name.as_str();
            match &rule.producer {
                Producer::Text => {
                    doc.insert(name, Value::from_text(scope.fields.text(name)?));
                }
                Producer::Url => {
                    doc.insert(name, Value::from_text(scope.fields.url(name)?));
                }
                Producer::Date => {
                    let value = match scope.fields.date(name)? {
                        Some(date) => Value::DateTime(date),
                        None => Value::Null,
                    };
                    doc.insert(name, value);
                }
                Producer::Sources => {
                    doc.insert(name, scope.ctx.sources_value());
                }
                Producer::Scalar(produce) => match produce(scope)? {
                    ScalarOutcome::Value(value) => {
                        doc.insert(name, value);
                    }
                    ScalarOutcome::SkipDocument => return Ok(Built::Skipped),
                },
                Producer::List(produce) => {
                    let mut items = Vec::new();
                    for outcome in produce(scope)? {
                        match outcome {
                            ItemOutcome::Item(item) => items.push(item),
                            ItemOutcome::SkipItem => {}
                            ItemOutcome::SkipDocument => return Ok(Built::Skipped),
                        }
                    }
                    doc.insert(name, Value::List(items));
                }
            }
        }
        Ok(Built::Document(doc))
    }
}

//! Jurisdiction registry.
//!
//! Configs are registered explicitly at startup and looked up by host
//! name, OCD division id, or nickname. All three share one key space;
//! first match wins at lookup time, and re-registering a key points it
//! at the most recently registered config.

use std::collections::HashMap;
use std::rc::Rc;

use crate::config::Config;
use crate::error::{Result, ScrapeError};

/// Registered jurisdiction configs and their lookup keys.
#[derive(Debug, Default)]
pub struct JurisdictionRegistry {
    entries: HashMap<String, Rc<Config>>,
    configs: Vec<Rc<Config>>,
}

impl JurisdictionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Index a config under its host, division id, and every nickname.
    ///
    /// Fails when the config's root url has no parseable host, since a
    /// config without its primary key could never be looked up.
    pub fn register(&mut self, config: Config) -> Result<()> {
        let config = Rc::new(config);
        let host = config.host()?;
        tracing::debug!(host = %host, name = %config.name, "Registering jurisdiction");
        self.entries.insert(host, Rc::clone(&config));
        if let Some(id) = &config.division_id {
            self.entries.insert(id.clone(), Rc::clone(&config));
        }
        for nickname in &config.nicknames {
            self.entries.insert(nickname.clone(), Rc::clone(&config));
        }
        self.configs.push(config);
        Ok(())
    }

    /// Look up a config by any of its keys.
    pub fn lookup(&self, key: &str) -> Result<Rc<Config>> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| ScrapeError::ConfigNotFound {
                key: key.to_string(),
            })
    }

    /// Every registered config, in registration order.
    #[must_use]
    pub fn configs(&self) -> &[Rc<Config>] {
        &self.configs
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.configs.len()
    }
}

//! Built-in jurisdiction presets.
//!
//! Each preset starts from the family defaults and overrides only what
//! its portal renders differently. Presets are plain functions; nothing
//! is registered until [`default_registry`] or a caller does so.

use crate::config::{Config, Scope};
use crate::error::Result;
use crate::families;
use crate::registry::JurisdictionRegistry;

/// Chicago City Council.
#[must_use]
pub fn chicago() -> Config {
    families::default_scopes(
        Config::base("Chicago", "https://chicago.legistar.com")
            .with_division_id("ocd-division/country:us/state:il/place:chicago")
            .with_nickname("chicago")
            .with_nickname("windy city")
            .with_utc_offset_hours(-6)
            .with_classification("Joint Committee", "committee"),
    )
}

/// New York City Council.
#[must_use]
pub fn new_york() -> Config {
    let mut config = families::default_scopes(
        Config::base("New York City", "https://legistar.council.nyc.gov")
            .with_division_id("ocd-division/country:us/state:ny/place:new_york")
            .with_nickname("nyc")
            .with_nickname("new york city")
            .with_utc_offset_hours(-5)
            .with_classification("Land Use", "committee")
            .with_classification("Task Force", "commission"),
    );
    // The NYC template titles the column in sentence case.
    config
        .scope_mut(Scope::BillsSearch)
        .labels
        .set("law_number", "Law number");
    config
}

/// Philadelphia City Council.
#[must_use]
pub fn philadelphia() -> Config {
    let mut config = families::default_scopes(
        Config::base("Philadelphia", "https://phila.legistar.com")
            .with_division_id("ocd-division/country:us/state:pa/place:philadelphia")
            .with_nickname("philadelphia")
            .with_nickname("philly")
            .with_utc_offset_hours(-5),
    );
    // Council members sit for districts, not wards.
    let labels = &mut config.scope_mut(Scope::PeopleSearch).labels;
    labels.set("district", "District");
    labels.set("district_phone", "District Office Phone");
    labels.set("district_address", "District Office Address");
    config
}

/// Registry holding every built-in preset.
pub fn default_registry() -> Result<JurisdictionRegistry> {
    let mut registry = JurisdictionRegistry::new();
    registry.register(chicago())?;
    registry.register(new_york())?;
    registry.register(philadelphia())?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::families::create_component_registry;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_presets_validate_against_components() {
        let components = create_component_registry();
        for config in [chicago(), new_york(), philadelphia()] {
            config.validate().unwrap();
            components.validate(&config).unwrap();
        }
    }

    #[test]
    fn test_default_registry_resolves_all_keys() {
        let registry = default_registry().unwrap();
        assert_eq!(registry.len(), 3);

        let by_host = registry.lookup("chicago.legistar.com").unwrap();
        assert_eq!(by_host.name, "Chicago");

        let by_division = registry
            .lookup("ocd-division/country:us/state:ny/place:new_york")
            .unwrap();
        assert_eq!(by_division.name, "New York City");

        let by_nickname = registry.lookup("philly").unwrap();
        assert_eq!(by_nickname.name, "Philadelphia");
    }

    #[test]
    fn test_chicago_classification_override_wins() {
        let config = chicago();
        assert_eq!(
            config.classification("Joint Committee").unwrap(),
            "committee"
        );
        // The defaults still answer for unoverridden types.
        assert_eq!(config.classification("Department").unwrap(), "commission");
    }

    #[test]
    fn test_nyc_label_override_reaches_the_scope_table() {
        let config = new_york();
        assert_eq!(
            config
                .scope(Scope::BillsSearch)
                .labels
                .label("law_number"),
            Some("Law number")
        );
    }
}

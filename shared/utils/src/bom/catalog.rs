//! Part catalog queries
//!
//! The matcher and cost aggregator only ever read the catalog through the
//! `PartCatalog` trait. Every query is restricted to active parts.

use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use solderline_models::{ComponentValue, PartAlternative, PartCatalogEntry};

/// An active alternative for a part, with the recorded compatibility
#[derive(Debug, Clone, Serialize)]
pub struct AlternativeMatch {
    pub part: PartCatalogEntry,
    pub compatibility_score: f64,
}

/// Read-only query interface over the part catalog.
///
/// When several active parts satisfy a query, implementations return the
/// first in ascending manufacturer part number order (then by id).
pub trait PartCatalog {
    fn get(&self, id: Uuid) -> Option<&PartCatalogEntry>;

    /// Exact manufacturer part number match
    fn find_by_manufacturer_part(&self, mpn: &str) -> Option<&PartCatalogEntry>;

    /// Case-insensitive substring of the part name plus exact footprint
    fn find_by_name_and_footprint(&self, value: &str, footprint: &str) -> Option<&PartCatalogEntry>;

    /// Numeric value and unit equality against the specification map
    fn find_by_spec_value(&self, value: &ComponentValue) -> Option<&PartCatalogEntry>;

    /// Active alternatives scoring at least `min_score`, cheapest first
    fn find_alternatives(&self, part_id: Uuid, min_score: f64) -> Vec<AlternativeMatch>;
}

/// Catalog held in memory, loaded once per request
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    parts: Vec<PartCatalogEntry>,
    index: HashMap<Uuid, usize>,
    alternatives: Vec<PartAlternative>,
}

impl InMemoryCatalog {
    pub fn new(mut parts: Vec<PartCatalogEntry>, alternatives: Vec<PartAlternative>) -> Self {
        parts.sort_by(|a, b| {
            a.manufacturer_part_number
                .cmp(&b.manufacturer_part_number)
                .then(a.id.cmp(&b.id))
        });

        let index = parts.iter().enumerate().map(|(i, p)| (p.id, i)).collect();

        Self {
            parts,
            index,
            alternatives,
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[PartCatalogEntry] {
        &self.parts
    }

    fn active(&self) -> impl Iterator<Item = &PartCatalogEntry> {
        self.parts.iter().filter(|p| p.is_active())
    }
}

impl PartCatalog for InMemoryCatalog {
    fn get(&self, id: Uuid) -> Option<&PartCatalogEntry> {
        self.index.get(&id).map(|&i| &self.parts[i])
    }

    fn find_by_manufacturer_part(&self, mpn: &str) -> Option<&PartCatalogEntry> {
        let mpn = mpn.trim();
        if mpn.is_empty() {
            return None;
        }
        self.active().find(|p| p.manufacturer_part_number == mpn)
    }

    fn find_by_name_and_footprint(&self, value: &str, footprint: &str) -> Option<&PartCatalogEntry> {
        let value = value.trim().to_lowercase();
        let footprint = footprint.trim();
        if value.is_empty() || footprint.is_empty() {
            return None;
        }
        self.active()
            .find(|p| p.footprint == footprint && p.name.to_lowercase().contains(&value))
    }

    fn find_by_spec_value(&self, value: &ComponentValue) -> Option<&PartCatalogEntry> {
        self.active().find(|p| p.spec_value().as_ref() == Some(value))
    }

    fn find_alternatives(&self, part_id: Uuid, min_score: f64) -> Vec<AlternativeMatch> {
        let mut matches: Vec<AlternativeMatch> = self
            .alternatives
            .iter()
            .filter(|alt| alt.part_id == part_id && alt.compatibility_score >= min_score)
            .filter_map(|alt| {
                self.get(alt.alternative_id)
                    .filter(|p| p.is_active())
                    .map(|p| AlternativeMatch {
                        part: p.clone(),
                        compatibility_score: alt.compatibility_score,
                    })
            })
            .collect();

        matches.sort_by(|a, b| {
            a.part
                .unit_price
                .cmp(&b.part.unit_price)
                .then(b.compatibility_score.total_cmp(&a.compatibility_score))
                .then(a.part.manufacturer_part_number.cmp(&b.part.manufacturer_part_number))
        });
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use solderline_models::{LifecycleStage, ValueUnit};

    fn catalog() -> (InMemoryCatalog, Uuid, Uuid, Uuid) {
        let base = PartCatalogEntry::new("RC0603-10K", "10k resistor", "0603", dec!(0.02))
            .with_spec_value(ComponentValue::new(dec!(10000), ValueUnit::Ohm));
        let cheap = PartCatalogEntry::new("ERJ-3EKF1002", "10k thick film", "0603", dec!(0.01));
        let retired = PartCatalogEntry::new("OLD-10K", "10k resistor", "0603", dec!(0.001))
            .with_lifecycle(LifecycleStage::Obsolete)
            .with_spec_value(ComponentValue::new(dec!(10000), ValueUnit::Ohm));

        let (base_id, cheap_id, retired_id) = (base.id, cheap.id, retired.id);
        let alternatives = vec![
            PartAlternative::new(base_id, cheap_id, 0.9),
            PartAlternative::new(base_id, retired_id, 0.99),
        ];

        (
            InMemoryCatalog::new(vec![base, cheap, retired], alternatives),
            base_id,
            cheap_id,
            retired_id,
        )
    }

    #[test]
    fn test_queries_skip_inactive_parts() {
        let (catalog, base_id, _, _) = catalog();

        assert!(catalog.find_by_manufacturer_part("OLD-10K").is_none());
        assert_eq!(catalog.find_by_manufacturer_part("RC0603-10K").map(|p| p.id), Some(base_id));

        let value = ComponentValue::new(dec!(10000), ValueUnit::Ohm);
        assert_eq!(catalog.find_by_spec_value(&value).map(|p| p.id), Some(base_id));
    }

    #[test]
    fn test_name_and_footprint_requires_both() {
        let (catalog, _, cheap_id, _) = catalog();

        // ERJ sorts before RC, so the thick film part wins on "10K"
        assert_eq!(catalog.find_by_name_and_footprint("10K", "0603").map(|p| p.id), Some(cheap_id));
        assert!(catalog.find_by_name_and_footprint("10k", "0402").is_none());
        assert!(catalog.find_by_name_and_footprint("", "0603").is_none());
        assert!(catalog.find_by_name_and_footprint("10k", "").is_none());
    }

    #[test]
    fn test_alternatives_are_active_and_scored() {
        let (catalog, base_id, cheap_id, _) = catalog();

        let alternatives = catalog.find_alternatives(base_id, 0.85);
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].part.id, cheap_id);

        assert!(catalog.find_alternatives(base_id, 0.95).is_empty());
        assert!(catalog.find_alternatives(cheap_id, 0.0).is_empty());
    }
}

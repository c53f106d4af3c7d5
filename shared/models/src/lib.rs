//! # Solderline Core Domain Models
//!
//! Domain models for the Solderline electronics-manufacturing back office.
//! All models serialize with serde and validate with the validator crate.
//!
//! ## Key Models
//!
//! - **PartCatalogEntry**: a purchasable/stockable part with price, stock and lifecycle stage
//! - **PartAlternative**: a recorded substitution between two parts with a compatibility score
//! - **BomLineItem**: one placement parsed from a BOM file, before resolution
//! - **ResolvedBomItem**: a line item bound to a part, or explicitly unresolved
//! - **BomSnapshot**: one immutable version of a project's BOM
//! - **Project**: the owner of BOM snapshots
//!
//! Money and component values are `rust_decimal::Decimal`; nothing in this
//! crate uses floating point for prices.

pub mod part;
pub mod bom;
pub mod project;


pub use part::*;
pub use bom::*;
pub use project::*;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use validator::Validate;

    #[test]
    fn test_part_creation() {
        let part = PartCatalogEntry::new("GRM188R71C104KA01", "100nF X7R", "0603", dec!(0.012))
            .with_category("Capacitors")
            .with_stock(4000);

        assert!(part.is_active());
        assert_eq!(part.category.as_deref(), Some("Capacitors"));
        assert_eq!(part.cost_for(10), dec!(0.120));
        assert!(part.validate().is_ok());
    }

    #[test]
    fn test_part_requires_mpn() {
        let part = PartCatalogEntry::new("", "nameless", "0603", dec!(0.01));
        assert!(part.validate().is_err());
    }

    #[test]
    fn test_alternative_score_range() {
        let alt = PartAlternative::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), 0.9);
        assert!(alt.validate().is_ok());

        let alt = PartAlternative::new(uuid::Uuid::new_v4(), uuid::Uuid::new_v4(), 1.5);
        assert!(alt.validate().is_err());
    }

    #[test]
    fn test_line_item_quantity_validation() {
        let item = BomLineItem::new("R1", "10k", "0603").with_quantity(0);
        assert!(item.validate().is_err());
        assert!(BomLineItem::new("R1", "10k", "0603").validate().is_ok());
    }

    #[test]
    fn test_project_creation() {
        let project = Project::new("Motor controller", Some("Acme Robotics".to_string()));
        assert!(project.validate().is_ok());
        assert_eq!(project.name, "Motor controller");
    }
}

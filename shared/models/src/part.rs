//! Part catalog domain models for the Solderline back office.
//!
//! This module defines purchasable/stockable parts, their lifecycle stage,
//! the alternatives recorded between parts, and the electrical value carried
//! in a part's free-form specification map.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// A purchasable/stockable part in the inventory catalog.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct PartCatalogEntry {
    pub id: Uuid,
    #[validate(length(min = 1, max = 100, message = "Manufacturer part number must be between 1 and 100 characters"))]
    pub manufacturer_part_number: String,
    #[validate(length(max = 255))]
    pub manufacturer: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Part name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(max = 100))]
    pub footprint: String,
    pub specifications: HashMap<String, serde_json::Value>,
    #[validate(custom = "validate_unit_price")]
    pub unit_price: Decimal,
    pub on_hand_quantity: u32,
    pub lifecycle_stage: LifecycleStage,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    pub last_time_buy: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Market-availability status of a part.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Active,
    /// Not recommended for new designs.
    Nrnd,
    EolAnnounced,
    Eol,
    Obsolete,
}

/// Urgency label attached to lifecycle suggestions and alerts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Info,
    Medium,
    High,
    Critical,
}

/// A recorded substitution between two catalog parts.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
pub struct PartAlternative {
    pub part_id: Uuid,
    pub alternative_id: Uuid,
    #[validate(range(min = 0.0, max = 1.0, message = "Compatibility score must be between 0.0 and 1.0"))]
    pub compatibility_score: f64,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Physical unit of a parsed component value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ValueUnit {
    Ohm,
    Farad,
    Henry,
}

/// A numeric component value in base units (Ω, F or H).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentValue {
    pub value: Decimal,
    pub unit: ValueUnit,
}

impl Default for PartCatalogEntry {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            manufacturer_part_number: String::new(),
            manufacturer: None,
            name: String::new(),
            footprint: String::new(),
            specifications: HashMap::new(),
            unit_price: Decimal::ZERO,
            on_hand_quantity: 0,
            lifecycle_stage: LifecycleStage::Active,
            category: None,
            last_time_buy: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

fn validate_unit_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ValidationError::new("negative_unit_price"));
    }
    Ok(())
}

impl PartCatalogEntry {
    /// Creates an active part with no stock and an empty specification map
    pub fn new(
        manufacturer_part_number: impl Into<String>,
        name: impl Into<String>,
        footprint: impl Into<String>,
        unit_price: Decimal,
    ) -> Self {
        Self {
            manufacturer_part_number: manufacturer_part_number.into(),
            name: name.into(),
            footprint: footprint.into(),
            unit_price,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_stock(mut self, on_hand_quantity: u32) -> Self {
        self.on_hand_quantity = on_hand_quantity;
        self
    }

    pub fn with_lifecycle(mut self, stage: LifecycleStage) -> Self {
        self.lifecycle_stage = stage;
        self
    }

    pub fn with_last_time_buy(mut self, date: NaiveDate) -> Self {
        self.last_time_buy = Some(date);
        self
    }

    /// Records the electrical value under the `value`/`unit` specification keys.
    ///
    /// The value is stored as a decimal string so it survives JSON round trips
    /// without float rounding.
    pub fn with_spec_value(mut self, value: ComponentValue) -> Self {
        self.specifications.insert(
            "value".to_string(),
            serde_json::Value::String(value.value.normalize().to_string()),
        );
        self.specifications.insert(
            "unit".to_string(),
            serde_json::Value::String(value.unit.symbol().to_string()),
        );
        self
    }

    pub fn is_active(&self) -> bool {
        self.lifecycle_stage.is_active()
    }

    /// Reads the numeric value and unit out of the specification map
    pub fn spec_value(&self) -> Option<ComponentValue> {
        let value = self.specifications.get("value").and_then(decimal_from_json)?;
        let unit = self
            .specifications
            .get("unit")
            .and_then(|u| u.as_str())
            .and_then(ValueUnit::from_symbol)?;
        Some(ComponentValue { value, unit })
    }

    /// Extended cost of `quantity` units at the current unit price
    pub fn cost_for(&self, quantity: u32) -> Decimal {
        self.unit_price * Decimal::from(quantity)
    }
}

/// Parses a JSON number or numeric string into a `Decimal`, accepting
/// scientific notation (`1e-7`).
pub fn decimal_from_json(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => parse_decimal(&n.to_string()),
        serde_json::Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.contains(|c: char| c == 'e' || c == 'E') {
        Decimal::from_scientific(s).ok()
    } else {
        Decimal::from_str(s).ok()
    }
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Nrnd => "nrnd",
            Self::EolAnnounced => "eol_announced",
            Self::Eol => "eol",
            Self::Obsolete => "obsolete",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// End-of-life announced, end-of-life, or obsolete.
    pub fn is_at_risk(&self) -> bool {
        matches!(self, Self::EolAnnounced | Self::Eol | Self::Obsolete)
    }

    /// Urgency of an at-risk stage; `None` for stages that carry no risk.
    pub fn risk_urgency(&self) -> Option<Urgency> {
        match self {
            Self::EolAnnounced => Some(Urgency::Medium),
            Self::Eol => Some(Urgency::High),
            Self::Obsolete => Some(Urgency::Critical),
            Self::Active | Self::Nrnd => None,
        }
    }
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "nrnd" => Ok(Self::Nrnd),
            "eol_announced" => Ok(Self::EolAnnounced),
            "eol" => Ok(Self::Eol),
            "obsolete" => Ok(Self::Obsolete),
            other => Err(format!("Unknown lifecycle stage: {}", other)),
        }
    }
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartAlternative {
    pub fn new(part_id: Uuid, alternative_id: Uuid, compatibility_score: f64) -> Self {
        Self {
            part_id,
            alternative_id,
            compatibility_score,
            notes: None,
        }
    }
}

impl ValueUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Ohm => "Ω",
            Self::Farad => "F",
            Self::Henry => "H",
        }
    }

    /// Accepts the unit symbol or its spelled-out name, ignoring case
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ω" | "ohm" | "ohms" => Some(Self::Ohm),
            "f" | "farad" | "farads" => Some(Self::Farad),
            "h" | "henry" | "henries" => Some(Self::Henry),
            _ => None,
        }
    }
}

impl ComponentValue {
    pub fn new(value: Decimal, unit: ValueUnit) -> Self {
        Self { value, unit }
    }
}

impl fmt::Display for ComponentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value.normalize(), self.unit.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_spec_value_from_string_and_number() {
        let part = PartCatalogEntry::new("RC0603-10K", "10k resistor", "0603", dec!(0.01))
            .with_spec_value(ComponentValue::new(dec!(10000), ValueUnit::Ohm));
        assert_eq!(
            part.spec_value(),
            Some(ComponentValue::new(dec!(10000), ValueUnit::Ohm))
        );

        let mut cap = PartCatalogEntry::new("CL10B104", "100nF cap", "0603", dec!(0.02));
        cap.specifications.insert("value".into(), serde_json::json!(1e-7));
        cap.specifications.insert("unit".into(), serde_json::json!("F"));
        assert_eq!(cap.spec_value().unwrap().value, dec!(0.0000001));
        assert_eq!(cap.spec_value().unwrap().unit, ValueUnit::Farad);
    }

    #[test]
    fn test_spec_value_missing_unit() {
        let mut part = PartCatalogEntry::new("X", "thing", "", dec!(1));
        part.specifications.insert("value".into(), serde_json::json!(10));
        assert!(part.spec_value().is_none());
    }

    #[test]
    fn test_lifecycle_risk() {
        assert!(!LifecycleStage::Active.is_at_risk());
        assert!(!LifecycleStage::Nrnd.is_at_risk());
        assert!(LifecycleStage::EolAnnounced.is_at_risk());
        assert_eq!(LifecycleStage::Obsolete.risk_urgency(), Some(Urgency::Critical));
        assert_eq!("eol_announced".parse::<LifecycleStage>(), Ok(LifecycleStage::EolAnnounced));
        assert!("retired".parse::<LifecycleStage>().is_err());
    }

    #[test]
    fn test_negative_price_fails_validation() {
        let part = PartCatalogEntry::new("NEG-1", "bad", "0402", dec!(-0.5));
        assert!(part.validate().is_err());

        let part = PartCatalogEntry::new("OK-1", "good", "0402", dec!(0.5));
        assert!(part.validate().is_ok());
    }
}
